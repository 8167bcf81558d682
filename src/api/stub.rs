use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

use super::ConcernApi;
use crate::error::ApiError;
use crate::state::data::{Comment, CommentId, Concern, ConcernId, ConcernStatus, NewConcern, Page, Role};

type Queue<T> = Mutex<VecDeque<Result<T, ApiError>>>;

/// In-memory backend with one response queue per operation.
///
/// Every call is recorded in `calls()`; an empty queue answers with a
/// network error so a missing setup fails loudly.
#[derive(Debug, Default)]
pub struct StubApi {
    calls: Mutex<Vec<String>>,
    all: Queue<Vec<Concern>>,
    pages: Queue<Page>,
    locations: Queue<Vec<Concern>>,
    statuses: Queue<Vec<Concern>>,
    searches: Queue<Vec<Concern>>,
    uploads: Queue<Concern>,
    status_updates: Queue<Concern>,
    comment_ids: Queue<CommentId>,
    comment_lists: Queue<Vec<Comment>>,
    comment_deletions: Queue<String>,
    role_changes: Queue<String>,
    marquees: Queue<String>,
}

fn pop<T>(queue: &Queue<T>, operation: &str) -> Result<T, ApiError> {
    queue
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or_else(|| {
            Err(ApiError::Network {
                endpoint: operation.to_owned(),
                message: "stub has no queued response".to_owned(),
            })
        })
}

fn push<T>(queue: &Queue<T>, value: Result<T, ApiError>) {
    queue.lock().unwrap().push_back(value);
}

impl StubApi {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    pub fn push_all(&self, value: Result<Vec<Concern>, ApiError>) {
        push(&self.all, value);
    }

    pub fn push_page(&self, value: Result<Page, ApiError>) {
        push(&self.pages, value);
    }

    pub fn push_location(&self, value: Result<Vec<Concern>, ApiError>) {
        push(&self.locations, value);
    }

    pub fn push_status(&self, value: Result<Vec<Concern>, ApiError>) {
        push(&self.statuses, value);
    }

    pub fn push_search(&self, value: Result<Vec<Concern>, ApiError>) {
        push(&self.searches, value);
    }

    pub fn push_upload(&self, value: Result<Concern, ApiError>) {
        push(&self.uploads, value);
    }

    pub fn push_status_update(&self, value: Result<Concern, ApiError>) {
        push(&self.status_updates, value);
    }

    pub fn push_comment_id(&self, value: Result<CommentId, ApiError>) {
        push(&self.comment_ids, value);
    }

    pub fn push_comments(&self, value: Result<Vec<Comment>, ApiError>) {
        push(&self.comment_lists, value);
    }

    pub fn push_comment_deletion(&self, value: Result<String, ApiError>) {
        push(&self.comment_deletions, value);
    }

    pub fn push_role_change(&self, value: Result<String, ApiError>) {
        push(&self.role_changes, value);
    }

    pub fn push_marquee(&self, value: Result<String, ApiError>) {
        push(&self.marquees, value);
    }
}

#[async_trait]
impl ConcernApi for StubApi {
    async fn fetch_all(&self) -> Result<Vec<Concern>, ApiError> {
        self.record("fetch_all".to_owned());
        pop(&self.all, "concerns/all")
    }

    async fn fetch_page(&self, page: usize, size: usize) -> Result<Page, ApiError> {
        self.record(format!("fetch_page {page} {size}"));
        pop(&self.pages, "concerns/paged")
    }

    async fn by_location(&self, location: &str) -> Result<Vec<Concern>, ApiError> {
        self.record(format!("by_location {location}"));
        pop(&self.locations, "concerns/location")
    }

    async fn by_status(&self, status: ConcernStatus) -> Result<Vec<Concern>, ApiError> {
        self.record(format!("by_status {status}"));
        pop(&self.statuses, "concerns/status")
    }

    async fn search(&self, keyword: &str) -> Result<Vec<Concern>, ApiError> {
        self.record(format!("search {keyword}"));
        pop(&self.searches, "concerns/search")
    }

    async fn upload(&self, concern: &NewConcern) -> Result<Concern, ApiError> {
        self.record(format!("upload {}", concern.title));
        pop(&self.uploads, "concerns/add")
    }

    async fn update_status(&self, id: ConcernId, status: ConcernStatus) -> Result<Concern, ApiError> {
        self.record(format!("update_status {id} {status}"));
        pop(&self.status_updates, "concerns/status")
    }

    async fn add_comment(&self, id: ConcernId, text: &str, role: Role) -> Result<CommentId, ApiError> {
        self.record(format!("add_comment {id} {text} {role}"));
        pop(&self.comment_ids, "concerns/comments")
    }

    async fn fetch_comments(&self, id: ConcernId) -> Result<Vec<Comment>, ApiError> {
        self.record(format!("fetch_comments {id}"));
        pop(&self.comment_lists, "concerns/comments")
    }

    async fn delete_comment(&self, comment_id: CommentId) -> Result<String, ApiError> {
        self.record(format!("delete_comment {comment_id}"));
        pop(&self.comment_deletions, "concerns/comments")
    }

    async fn change_role(&self, email: &str, role: Role) -> Result<String, ApiError> {
        self.record(format!("change_role {email} {role}"));
        pop(&self.role_changes, "user/role")
    }

    async fn marquee(&self, role: Role) -> Result<String, ApiError> {
        self.record(format!("marquee {role}"));
        pop(&self.marquees, "marquee")
    }
}
