/// Concern backend API
///
/// The dashboard only talks to the backend through the `ConcernApi` trait.
/// - `http.rs` is the reqwest implementation used by the application
/// - `stub.rs` is a queued-response fake used by the tests
use async_trait::async_trait;

use crate::error::ApiError;
use crate::state::data::{Comment, CommentId, Concern, ConcernId, ConcernStatus, NewConcern, Page, Role};

pub mod http;
#[cfg(test)]
pub mod stub;

pub use http::HttpConcernApi;

/// Request/response operations of the concern backend
#[async_trait]
pub trait ConcernApi: Send + Sync {
    /// `GET /concerns/all`
    async fn fetch_all(&self) -> Result<Vec<Concern>, ApiError>;

    /// `GET /concerns/paged?page&size`
    async fn fetch_page(&self, page: usize, size: usize) -> Result<Page, ApiError>;

    /// `GET /concerns/location/{location}`, 404 when nothing matches
    async fn by_location(&self, location: &str) -> Result<Vec<Concern>, ApiError>;

    /// `GET /concerns/status/{status}`
    async fn by_status(&self, status: ConcernStatus) -> Result<Vec<Concern>, ApiError>;

    /// `GET /concerns/search?keyword=`
    async fn search(&self, keyword: &str) -> Result<Vec<Concern>, ApiError>;

    /// `POST /concerns/add`
    async fn upload(&self, concern: &NewConcern) -> Result<Concern, ApiError>;

    /// `POST /concerns/{id}/status`, returns the concern as the server stored it
    async fn update_status(&self, id: ConcernId, status: ConcernStatus) -> Result<Concern, ApiError>;

    /// `POST /concerns/{id}/comments`, returns the new comment id
    async fn add_comment(&self, id: ConcernId, text: &str, role: Role) -> Result<CommentId, ApiError>;

    /// `GET /concerns/{id}/comments`
    async fn fetch_comments(&self, id: ConcernId) -> Result<Vec<Comment>, ApiError>;

    /// `DELETE /concerns/comments/{id}`, returns the confirmation text
    async fn delete_comment(&self, comment_id: CommentId) -> Result<String, ApiError>;

    /// `POST /user/role`, returns the confirmation text
    async fn change_role(&self, email: &str, role: Role) -> Result<String, ApiError>;

    /// `GET /marquee?role=`
    async fn marquee(&self, role: Role) -> Result<String, ApiError>;
}
