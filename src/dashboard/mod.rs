/// Dashboard controller
///
/// Ties the store, the resolver, the mutators, the aggregator and the popup
/// together behind the action entry points the UI calls. Every action that
/// needs the backend returns a `Request`; its `Response` comes back through
/// `apply`, which is the only place results touch the state.
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::error::{ApiError, ValidationError};
use crate::state::aggregate::StatusCounts;
use crate::state::data::{CommentId, Concern, ConcernId, ConcernStatus};
use crate::state::mutators::{Confirmation, MutationOutcome, MutationReply, MutationRequest, Mutators, PendingKey};
use crate::state::popup::{Popup, RoleForm, UploadForm};
use crate::state::resolver::{self, Query, QueryIntent, QueryMode, QueryOutcome, QueryPayload, SearchStrategy};
use crate::state::session::Session;
use crate::state::store::{ConcernStore, Generation, ViewWindow};

pub mod request;

pub use request::{Request, Response};

/// Settings the dashboard needs from the config file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardSettings {
    pub page_size: usize,
    pub search: SearchStrategy,
    pub locations: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Error,
}

/// A message surfaced to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
    pub at: DateTime<Utc>,
}

impl Notice {
    fn new(kind: NoticeKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
            at: Utc::now(),
        }
    }
}

pub struct Dashboard {
    session: Session,
    settings: DashboardSettings,
    store: ConcernStore,
    intent: QueryIntent,
    mutators: Mutators,
    counts: StatusCounts,
    popup: Popup,
    upload_pending: bool,
    notice: Option<Notice>,
    banner: Option<String>,
}

impl Dashboard {
    pub fn new(session: Session, settings: DashboardSettings) -> Self {
        Self {
            store: ConcernStore::new(settings.page_size),
            session,
            settings,
            intent: QueryIntent::default(),
            mutators: Mutators::default(),
            counts: StatusCounts::default(),
            popup: Popup::default(),
            upload_pending: false,
            notice: None,
            banner: None,
        }
    }

    // ========== Observations ==========

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn locations(&self) -> &[String] {
        &self.settings.locations
    }

    pub fn window(&self) -> &ViewWindow {
        self.store.window()
    }

    pub fn all_loaded(&self) -> &[Concern] {
        self.store.all_loaded()
    }

    pub fn mode(&self) -> QueryMode {
        self.store.mode()
    }

    pub fn counts(&self) -> &StatusCounts {
        &self.counts
    }

    pub fn search_term(&self) -> &str {
        &self.intent.search_term
    }

    pub fn selected_location(&self) -> Option<&str> {
        self.intent.location.as_deref()
    }

    pub fn selected_status(&self) -> Option<ConcernStatus> {
        self.intent.status
    }

    pub fn draft(&self, id: ConcernId) -> &str {
        self.mutators.draft(id)
    }

    pub fn is_comment_box_open(&self, id: ConcernId) -> bool {
        self.mutators.is_comment_box_open(id)
    }

    /// A mutation for this concern is in flight; its controls should be disabled
    pub fn is_pending(&self, id: ConcernId) -> bool {
        self.mutators.is_pending(&PendingKey::Concern(id))
    }

    pub fn is_role_change_pending(&self) -> bool {
        self.mutators.is_pending(&PendingKey::UserRole)
    }

    pub fn is_upload_pending(&self) -> bool {
        self.upload_pending
    }

    pub fn popup(&self) -> &Popup {
        &self.popup
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// The server's message after a failed query, if the last notice was one
    pub fn error_message(&self) -> Option<&str> {
        self.notice
            .as_ref()
            .filter(|notice| notice.kind == NoticeKind::Error)
            .map(|notice| notice.text.as_str())
    }

    pub fn banner(&self) -> Option<&str> {
        self.banner.as_deref()
    }

    // ========== Queries ==========

    /// Initial load: first page plus the role banner
    pub fn start(&mut self) -> Vec<Request> {
        vec![self.load_page(0), Request::Marquee(self.session.role)]
    }

    fn dispatch(&mut self) -> Request {
        let query = resolver::resolve(&self.intent, self.settings.page_size, self.settings.search);
        let generation = self.store.begin(query.mode());
        info!(?query, ?generation, "dispatching query");
        Request::Query { generation, query }
    }

    /// Browse the unfiltered listing; drops any filter or search
    pub fn load_page(&mut self, page: usize) -> Request {
        self.intent = QueryIntent {
            page,
            ..QueryIntent::default()
        };
        self.dispatch()
    }

    pub fn next_page(&mut self) -> Option<Request> {
        let window = self.store.window();
        if self.store.mode() != QueryMode::AllPaged || window.current_page() + 1 >= window.page_count() {
            return None;
        }
        let next = window.current_page() + 1;
        Some(self.load_page(next))
    }

    pub fn previous_page(&mut self) -> Option<Request> {
        let current = self.store.window().current_page();
        if self.store.mode() != QueryMode::AllPaged || current == 0 {
            return None;
        }
        Some(self.load_page(current - 1))
    }

    pub fn filter_by_location(&mut self, location: String) -> Request {
        self.intent = QueryIntent {
            location: Some(location),
            ..QueryIntent::default()
        };
        self.dispatch()
    }

    pub fn filter_by_status(&mut self, status: ConcernStatus) -> Request {
        self.intent = QueryIntent {
            status: Some(status),
            ..QueryIntent::default()
        };
        self.dispatch()
    }

    pub fn clear_filters(&mut self) -> Request {
        self.load_page(0)
    }

    /// Update the search box. Emptying it while a search is shown reloads page 0.
    pub fn set_search_term(&mut self, term: String) -> Option<Request> {
        let cleared = term.trim().is_empty();
        self.intent.search_term = term;
        let searching = matches!(self.store.mode(), QueryMode::Search | QueryMode::LocalSubstring);
        if cleared && searching {
            return Some(self.load_page(0));
        }
        None
    }

    /// Run the search box. A blank term means the default paged listing.
    pub fn submit_search(&mut self) -> Request {
        self.intent = QueryIntent {
            search_term: std::mem::take(&mut self.intent.search_term),
            ..QueryIntent::default()
        };
        self.dispatch()
    }

    // ========== Per-item mutations ==========

    /// Returns a request loading the concern's comments when the box opens.
    /// Skipped while another update for the concern is in flight.
    pub fn toggle_comment_box(&mut self, id: ConcernId) -> Option<Request> {
        let open = self.mutators.toggle_comment_box(id);
        if !open || !self.store.contains(id) {
            return None;
        }
        if !self.mutators.begin_comment_load(id) {
            debug!(concern = id, "comment load skipped, update in flight");
            return None;
        }
        Some(Request::Comments(id))
    }

    pub fn edit_comment(&mut self, id: ConcernId, text: String) {
        self.mutators.set_draft(id, text);
    }

    pub fn submit_comment(&mut self, id: ConcernId) -> Result<Request, ValidationError> {
        let request = self.mutators.add_comment(&self.session, id);
        self.surface(request).map(Request::Mutation)
    }

    pub fn change_status(&mut self, id: ConcernId, status: ConcernStatus) -> Result<Request, ValidationError> {
        let request = self.mutators.change_status(&self.session, id, status);
        self.surface(request).map(Request::Mutation)
    }

    /// Ask the user first; a declined confirmation sends nothing
    pub fn delete_comment(
        &mut self,
        concern: ConcernId,
        comment: CommentId,
        confirmation: Confirmation,
    ) -> Result<Option<Request>, ValidationError> {
        let request = self
            .mutators
            .delete_comment(&self.session, concern, comment, confirmation);
        self.surface(request).map(|request| request.map(Request::Mutation))
    }

    // ========== Popup ==========

    pub fn open_upload_popup(&mut self) -> bool {
        self.popup.open_upload()
    }

    pub fn open_role_popup(&mut self) -> bool {
        self.popup.open_role()
    }

    pub fn close_popup(&mut self) {
        self.popup.close();
    }

    pub fn upload_form_mut(&mut self) -> Option<&mut UploadForm> {
        self.popup.upload_form_mut()
    }

    pub fn role_form_mut(&mut self) -> Option<&mut RoleForm> {
        self.popup.role_form_mut()
    }

    pub fn submit_upload(&mut self) -> Result<Request, ValidationError> {
        let request = match self.popup.upload_form_mut() {
            None => Err(ValidationError::PopupClosed),
            Some(_) if self.upload_pending => Err(ValidationError::AlreadyPending),
            Some(form) => form.validate(&self.settings.locations),
        };
        let concern = self.surface(request)?;
        self.upload_pending = true;
        Ok(Request::Upload(concern))
    }

    pub fn submit_role_change(&mut self) -> Result<Request, ValidationError> {
        let validated = match self.popup.role_form_mut() {
            Some(form) => form.validate(),
            None => Err(ValidationError::PopupClosed),
        };
        let request = validated.and_then(|(email, role)| self.mutators.change_role(&self.session, email, role));
        self.surface(request).map(Request::Mutation)
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    fn surface<T>(&mut self, result: Result<T, ValidationError>) -> Result<T, ValidationError> {
        if let Err(error) = &result {
            debug!(%error, "rejected before sending");
            self.notice = Some(Notice::new(NoticeKind::Error, error.to_string()));
        }
        result
    }

    // ========== Continuations ==========

    /// Fold a finished request back into the state.
    ///
    /// May return a follow-up request (a successful upload reloads page 0).
    pub fn apply(&mut self, response: Response) -> Option<Request> {
        match response {
            Response::Query {
                generation,
                query,
                result,
            } => {
                self.apply_query(generation, &query, result);
                None
            }
            Response::Mutation { request, result } => {
                self.apply_mutation(&request, result);
                None
            }
            Response::Comments { concern, result } => {
                self.mutators.finish_comment_load(concern);
                match result {
                    Ok(comments) => {
                        self.store
                            .patch_item(concern, |item| item.replace_comments(comments.clone()));
                    }
                    Err(error) => {
                        warn!(concern, %error, "failed to load comments");
                        self.notice = Some(Notice::new(NoticeKind::Error, "Failed to load comments."));
                    }
                }
                None
            }
            Response::Upload(result) => {
                self.upload_pending = false;
                match result {
                    Ok(created) => {
                        info!(id = created.id, "concern submitted");
                        self.popup.close();
                        self.notice = Some(Notice::new(NoticeKind::Info, "Concern submitted."));
                        Some(self.load_page(0))
                    }
                    Err(error) => {
                        warn!(%error, "upload failed");
                        self.notice = Some(Notice::new(NoticeKind::Error, "Upload failed. Please try again."));
                        None
                    }
                }
            }
            Response::Marquee(result) => {
                match result {
                    Ok(text) => self.banner = Some(text).filter(|text| !text.is_empty()),
                    Err(error) => {
                        warn!(%error, "failed to load banner");
                        self.banner = None;
                    }
                }
                None
            }
        }
    }

    fn apply_query(
        &mut self,
        generation: Generation,
        query: &Query,
        result: Result<QueryPayload, ApiError>,
    ) {
        match resolver::apply_result(&mut self.store, generation, query, result) {
            QueryOutcome::Stale => return,
            QueryOutcome::Applied => {
                if self.error_message().is_some() {
                    self.notice = None;
                }
            }
            QueryOutcome::Failed(message) => {
                self.notice = Some(Notice::new(NoticeKind::Error, message));
            }
        }
        self.counts = StatusCounts::from_concerns(self.store.all_loaded());
        self.mutators.retain_loaded(&self.store);
    }

    fn apply_mutation(
        &mut self,
        request: &MutationRequest,
        result: Result<MutationReply, ApiError>,
    ) {
        match self.mutators.complete(&mut self.store, request, result) {
            MutationOutcome::Applied(message) => {
                match request {
                    MutationRequest::ChangeStatus { .. } => {
                        self.counts = StatusCounts::from_concerns(self.store.all_loaded());
                    }
                    MutationRequest::ChangeRole { .. } => self.popup.close(),
                    _ => {}
                }
                if let Some(message) = message {
                    self.notice = Some(Notice::new(NoticeKind::Info, message));
                }
            }
            MutationOutcome::Failed(message) => {
                self.notice = Some(Notice::new(NoticeKind::Error, message));
            }
        }
    }
}
