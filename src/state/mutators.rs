/// Sub-resource Mutators
///
/// Single-item updates (status, comments, user role) that are confirmed by
/// the server and then patched into the store in place, without reloading
/// the collection. Requests are serialized per target: while one is in
/// flight, further mutations for the same concern are rejected.
use std::collections::{HashMap, HashSet};
use tracing::{info, warn};

use super::data::{Comment, CommentId, ConcernId, ConcernStatus, Role};
use super::session::Session;
use super::store::ConcernStore;
use crate::api::ConcernApi;
use crate::error::{ApiError, ValidationError};

/// What a mutation is serialized on
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PendingKey {
    Concern(ConcernId),
    UserRole,
}

/// Explicit user answer to "delete this comment?"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Confirmed,
    Declined,
}

/// A validated mutation ready to be sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationRequest {
    ChangeStatus { concern: ConcernId, requested: ConcernStatus },
    AddComment { concern: ConcernId, text: String, role: Role },
    DeleteComment { concern: ConcernId, comment: CommentId },
    ChangeRole { email: String, role: Role },
}

/// Server confirmation of a mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationReply {
    /// Status the server actually stored
    Status(ConcernStatus),
    CommentCreated(CommentId),
    CommentDeleted(String),
    RoleChanged(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationOutcome {
    /// Applied; carries an optional message for the user
    Applied(Option<String>),
    Failed(String),
}

impl MutationRequest {
    pub fn key(&self) -> PendingKey {
        match self {
            MutationRequest::ChangeStatus { concern, .. }
            | MutationRequest::AddComment { concern, .. }
            | MutationRequest::DeleteComment { concern, .. } => PendingKey::Concern(*concern),
            MutationRequest::ChangeRole { .. } => PendingKey::UserRole,
        }
    }

    pub async fn send(&self, api: &dyn ConcernApi) -> Result<MutationReply, ApiError> {
        match self {
            MutationRequest::ChangeStatus { concern, requested } => api
                .update_status(*concern, *requested)
                .await
                .map(|updated| MutationReply::Status(updated.status)),
            MutationRequest::AddComment { concern, text, role } => api
                .add_comment(*concern, text, *role)
                .await
                .map(MutationReply::CommentCreated),
            MutationRequest::DeleteComment { comment, .. } => api
                .delete_comment(*comment)
                .await
                .map(MutationReply::CommentDeleted),
            MutationRequest::ChangeRole { email, role } => api
                .change_role(email, *role)
                .await
                .map(MutationReply::RoleChanged),
        }
    }

    fn failure_message(&self) -> &'static str {
        match self {
            MutationRequest::ChangeStatus { .. } => "Failed to update the status.",
            MutationRequest::AddComment { .. } => "Failed to add the comment. Please try again.",
            MutationRequest::DeleteComment { .. } => "Failed to delete the comment.",
            MutationRequest::ChangeRole { .. } => "Failed to change the user role.",
        }
    }
}

/// Per-concern UI buffers plus the in-flight set
#[derive(Debug, Default)]
pub struct Mutators {
    drafts: HashMap<ConcernId, String>,
    open_boxes: HashSet<ConcernId>,
    pending: HashSet<PendingKey>,
}

impl Mutators {
    pub fn draft(&self, id: ConcernId) -> &str {
        self.drafts.get(&id).map(String::as_str).unwrap_or("")
    }

    pub fn set_draft(&mut self, id: ConcernId, text: String) {
        self.drafts.insert(id, text);
    }

    /// Flip the comment box; returns whether it is now open
    pub fn toggle_comment_box(&mut self, id: ConcernId) -> bool {
        if self.open_boxes.remove(&id) {
            false
        } else {
            self.open_boxes.insert(id);
            true
        }
    }

    pub fn is_comment_box_open(&self, id: ConcernId) -> bool {
        self.open_boxes.contains(&id)
    }

    pub fn is_pending(&self, key: &PendingKey) -> bool {
        self.pending.contains(key)
    }

    /// Drop transient state of concerns that are no longer loaded
    pub fn retain_loaded(&mut self, store: &ConcernStore) {
        self.drafts.retain(|id, _| store.contains(*id));
        self.open_boxes.retain(|id| store.contains(*id));
    }

    /// Reserve the concern for a comment list reload.
    ///
    /// The reply replaces the whole list, so it holds the same key as the
    /// mutations; returns `false` when one of them is already in flight.
    pub fn begin_comment_load(&mut self, concern: ConcernId) -> bool {
        self.pending.insert(PendingKey::Concern(concern))
    }

    pub fn finish_comment_load(&mut self, concern: ConcernId) {
        self.pending.remove(&PendingKey::Concern(concern));
    }

    fn begin(&mut self, request: MutationRequest) -> Result<MutationRequest, ValidationError> {
        if !self.pending.insert(request.key()) {
            return Err(ValidationError::AlreadyPending);
        }
        Ok(request)
    }

    pub fn change_status(
        &mut self,
        session: &Session,
        concern: ConcernId,
        requested: ConcernStatus,
    ) -> Result<MutationRequest, ValidationError> {
        if !session.role.can_moderate() {
            return Err(ValidationError::NotPermitted("change a concern's status"));
        }
        if !requested.is_assignable() {
            return Err(ValidationError::UnassignableStatus(requested.to_string()));
        }
        self.begin(MutationRequest::ChangeStatus { concern, requested })
    }

    /// Build a comment request from the concern's draft. Blank drafts never leave the client.
    pub fn add_comment(&mut self, session: &Session, concern: ConcernId) -> Result<MutationRequest, ValidationError> {
        if !session.role.can_moderate() {
            return Err(ValidationError::NotPermitted("comment on concerns"));
        }
        let text = self.draft(concern).trim().to_owned();
        if text.is_empty() {
            return Err(ValidationError::EmptyComment);
        }
        self.begin(MutationRequest::AddComment {
            concern,
            text,
            role: session.role,
        })
    }

    /// Declining is a no-op: nothing is sent and nothing changes
    pub fn delete_comment(
        &mut self,
        session: &Session,
        concern: ConcernId,
        comment: CommentId,
        confirmation: Confirmation,
    ) -> Result<Option<MutationRequest>, ValidationError> {
        if confirmation == Confirmation::Declined {
            return Ok(None);
        }
        if !session.role.can_moderate() {
            return Err(ValidationError::NotPermitted("delete comments"));
        }
        self.begin(MutationRequest::DeleteComment { concern, comment }).map(Some)
    }

    pub fn change_role(&mut self, session: &Session, email: String, role: Role) -> Result<MutationRequest, ValidationError> {
        if !session.role.can_manage_roles() {
            return Err(ValidationError::NotPermitted("change user roles"));
        }
        self.begin(MutationRequest::ChangeRole { email, role })
    }

    /// Settle a finished mutation and patch the store on success
    pub fn complete(
        &mut self,
        store: &mut ConcernStore,
        request: &MutationRequest,
        result: Result<MutationReply, ApiError>,
    ) -> MutationOutcome {
        self.pending.remove(&request.key());

        let reply = match result {
            Ok(reply) => reply,
            Err(error) => {
                warn!(?request, %error, "mutation failed");
                return MutationOutcome::Failed(request.failure_message().to_owned());
            }
        };

        match (request, reply) {
            (MutationRequest::ChangeStatus { concern, requested }, MutationReply::Status(confirmed)) => {
                if confirmed != *requested {
                    info!(concern, %requested, %confirmed, "server normalized requested status");
                }
                store.patch_item(*concern, |item| item.status = confirmed);
                MutationOutcome::Applied(None)
            }
            (MutationRequest::AddComment { concern, text, role }, MutationReply::CommentCreated(id)) => {
                store.patch_item(*concern, |item| {
                    item.push_comment(Comment {
                        id,
                        text: text.clone(),
                        author_role: *role,
                    })
                });
                self.drafts.remove(concern);
                MutationOutcome::Applied(None)
            }
            (MutationRequest::DeleteComment { concern, comment }, MutationReply::CommentDeleted(confirmation)) => {
                store.patch_item(*concern, |item| {
                    item.remove_comment(*comment);
                });
                MutationOutcome::Applied(Some(confirmation).filter(|text| !text.is_empty()))
            }
            (MutationRequest::ChangeRole { email, role }, MutationReply::RoleChanged(confirmation)) => {
                info!(%email, %role, "role changed");
                let message = if confirmation.is_empty() {
                    format!("{email} is now {role}.")
                } else {
                    confirmation
                };
                MutationOutcome::Applied(Some(message))
            }
            (request, reply) => {
                warn!(?request, ?reply, "mutation reply does not match its request");
                MutationOutcome::Failed(request.failure_message().to_owned())
            }
        }
    }
}
