/// Shared data structures for the application state
///
/// These structs mirror what the concern backend sends and receives.
/// They are decoded strictly at the API boundary and then flow unchanged
/// between the store, the mutators and the UI layer.
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// Server-assigned concern identifier
pub type ConcernId = i64;

/// Server-assigned comment identifier
pub type CommentId = i64;

/// Workflow status of a concern
///
/// Anything the backend sends that is not one of the three known values
/// (including a missing field) decodes as `Unknown`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConcernStatus {
    Pending,
    InProgress,
    Resolved,
    #[default]
    #[serde(other)]
    Unknown,
}

impl ConcernStatus {
    /// Statuses a moderator may assign
    pub const ASSIGNABLE: [ConcernStatus; 3] = [
        ConcernStatus::Pending,
        ConcernStatus::InProgress,
        ConcernStatus::Resolved,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConcernStatus::Pending => "PENDING",
            ConcernStatus::InProgress => "IN_PROGRESS",
            ConcernStatus::Resolved => "RESOLVED",
            ConcernStatus::Unknown => "UNKNOWN",
        }
    }

    pub fn is_assignable(&self) -> bool {
        !matches!(self, ConcernStatus::Unknown)
    }
}

impl fmt::Display for ConcernStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User role, always normalized to upper case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Role {
    #[default]
    User,
    Moderator,
    Admin,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::User, Role::Moderator, Role::Admin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::Moderator => "MODERATOR",
            Role::Admin => "ADMIN",
        }
    }

    /// Moderators and admins work the concern queue
    pub fn can_moderate(&self) -> bool {
        matches!(self, Role::Moderator | Role::Admin)
    }

    pub fn can_manage_roles(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl FromStr for Role {
    type Err = ValidationError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "USER" => Ok(Role::User),
            "MODERATOR" => Ok(Role::Moderator),
            "ADMIN" => Ok(Role::Admin),
            _ => Err(ValidationError::UnknownRole(raw.trim().to_owned())),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.as_str().to_owned()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A moderation comment attached to exactly one concern
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub id: CommentId,
    /// Comment body
    #[serde(rename = "comment", alias = "text")]
    pub text: String,
    /// Role of the author when the comment was written. Display-only, so an
    /// unrecognized or missing role reads as `User` instead of failing the list.
    #[serde(rename = "userRole", alias = "role", default, deserialize_with = "role_or_user")]
    pub author_role: Role,
}

/// A citizen concern as mirrored from the backend
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Concern {
    pub id: ConcernId,
    pub title: String,
    pub description: String,
    #[serde(rename = "imageUrl", default)]
    pub image_url: Option<String>,
    pub location: String,
    #[serde(default, deserialize_with = "status_or_unknown")]
    pub status: ConcernStatus,
    #[serde(default, deserialize_with = "comments_or_empty")]
    comments: Vec<Comment>,
}

impl Concern {
    pub fn new(id: ConcernId, title: &str, description: &str, location: &str, status: ConcernStatus) -> Self {
        Self {
            id,
            title: title.to_owned(),
            description: description.to_owned(),
            image_url: None,
            location: location.to_owned(),
            status,
            comments: Vec::new(),
        }
    }

    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    /// Derived from the comment list, never stored separately
    pub fn comments_count(&self) -> usize {
        self.comments.len()
    }

    pub fn push_comment(&mut self, comment: Comment) {
        self.comments.push(comment);
    }

    /// Remove a comment by id. Returns whether anything was removed.
    pub fn remove_comment(&mut self, comment_id: CommentId) -> bool {
        let before = self.comments.len();
        self.comments.retain(|comment| comment.id != comment_id);
        self.comments.len() != before
    }

    pub fn replace_comments(&mut self, comments: Vec<Comment>) {
        self.comments = comments;
    }

    /// Case-insensitive substring match over title, description, location and status
    pub fn matches_term(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return true;
        }
        [
            self.title.as_str(),
            self.description.as_str(),
            self.location.as_str(),
            self.status.as_str(),
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(&term))
    }
}

/// Body of `POST /concerns/add`
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct NewConcern {
    pub title: String,
    pub description: String,
    #[serde(rename = "imageUrl", skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub location: String,
}

/// One page of `GET /concerns/paged`
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub content: Vec<Concern>,
    #[serde(rename = "totalElements")]
    pub total_elements: usize,
}

fn status_or_unknown<'de, D>(deserializer: D) -> Result<ConcernStatus, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<ConcernStatus>::deserialize(deserializer)?.unwrap_or_default())
}

fn role_or_user<'de, D>(deserializer: D) -> Result<Role, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|raw| raw.parse().ok()).unwrap_or_default())
}

fn comments_or_empty<'de, D>(deserializer: D) -> Result<Vec<Comment>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Comment>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unrecognized_status_decodes_as_unknown() {
        let concern: Concern = serde_json::from_str(
            r#"{"id":1,"title":"t","description":"d","location":"Harbor","status":"ARCHIVED"}"#,
        )
        .unwrap();
        assert_eq!(concern.status, ConcernStatus::Unknown);

        let concern: Concern =
            serde_json::from_str(r#"{"id":2,"title":"t","description":"d","location":"Harbor","status":null}"#)
                .unwrap();
        assert_eq!(concern.status, ConcernStatus::Unknown);
    }

    #[test]
    fn test_server_comment_count_is_ignored() {
        let concern: Concern = serde_json::from_str(
            r#"{
                "id": 3, "title": "Pothole", "description": "Deep", "location": "Harbor",
                "status": "IN_PROGRESS", "commentsCount": 9,
                "comments": [{"id": 10, "comment": "On it", "userRole": "moderator"}]
            }"#,
        )
        .unwrap();
        assert_eq!(concern.status, ConcernStatus::InProgress);
        assert_eq!(concern.comments_count(), 1);
        assert_eq!(concern.comments()[0].author_role, Role::Moderator);
    }

    #[test]
    fn test_unrecognized_comment_role_keeps_the_list() {
        let concerns: Vec<Concern> = serde_json::from_str(
            r#"[
                {
                    "id": 5, "title": "Noise", "description": "Late night", "location": "Harbor",
                    "status": "PENDING",
                    "comments": [
                        {"id": 11, "comment": "Heard it too", "userRole": "CITIZEN"},
                        {"id": 12, "comment": "Logged", "userRole": null},
                        {"id": 13, "comment": "Patrol sent", "userRole": "admin"}
                    ]
                },
                {"id": 6, "title": "Graffiti", "description": "Wall", "location": "Old Town", "status": "RESOLVED"}
            ]"#,
        )
        .unwrap();

        assert_eq!(concerns.len(), 2);
        let roles: Vec<Role> = concerns[0].comments().iter().map(|c| c.author_role).collect();
        assert_eq!(roles, vec![Role::User, Role::User, Role::Admin]);
    }

    #[test]
    fn test_missing_title_is_rejected() {
        let result = serde_json::from_str::<Concern>(r#"{"id":4,"description":"d","location":"Harbor"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_role_parsing_is_case_insensitive() {
        assert_eq!(" admin ".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("Moderator".parse::<Role>().unwrap(), Role::Moderator);
        assert_eq!(
            "root".parse::<Role>(),
            Err(ValidationError::UnknownRole("root".to_owned()))
        );
    }

    #[test]
    fn test_comment_count_follows_mutations() {
        let mut concern = Concern::new(5, "Streetlight", "Broken", "Harbor", ConcernStatus::Pending);
        concern.push_comment(Comment { id: 1, text: "a".into(), author_role: Role::Admin });
        concern.push_comment(Comment { id: 2, text: "b".into(), author_role: Role::Admin });
        assert_eq!(concern.comments_count(), 2);

        assert!(concern.remove_comment(1));
        assert!(!concern.remove_comment(1));
        assert_eq!(concern.comments_count(), 1);
    }

    #[test]
    fn test_matches_term() {
        let concern = Concern::new(6, "Broken bench", "Park bench cracked", "Riverside", ConcernStatus::Resolved);
        assert!(concern.matches_term("BENCH"));
        assert!(concern.matches_term("riverside"));
        assert!(concern.matches_term("resolved"));
        assert!(!concern.matches_term("pothole"));
    }

    #[test]
    fn test_new_concern_omits_missing_image() {
        let body = serde_json::to_value(NewConcern {
            title: "t".into(),
            description: "d".into(),
            image_url: None,
            location: "Harbor".into(),
        })
        .unwrap();
        assert!(body.get("imageUrl").is_none());
        assert_eq!(body["location"], "Harbor");
    }
}
