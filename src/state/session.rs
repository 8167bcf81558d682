/// Session
///
/// The signed-in user's name, role and bearer token.
use serde::Deserialize;

use super::data::Role;

/// Who is using the dashboard.
///
/// Built once at startup and handed to the dashboard and the HTTP client,
/// never read from ambient storage at call time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Session {
    pub username: String,
    pub role: Role,
    token: Option<String>,
}

impl Session {
    pub fn new(username: &str, role: Role, token: Option<String>) -> Self {
        Self {
            username: username.to_owned(),
            role,
            token: token.filter(|token| !token.trim().is_empty()),
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token.filter(|token| !token.trim().is_empty());
    }

    /// Name shown in the header, falling back to the role
    pub fn display_name(&self) -> &str {
        if self.username.trim().is_empty() {
            self.role.as_str()
        } else {
            &self.username
        }
    }
}
