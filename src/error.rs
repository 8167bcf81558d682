/// Error types shared by the API client, the dashboard state and the config loader
///
/// Everything that can travel inside an iced `Message` is `Clone`, so errors
/// carry rendered strings instead of wrapping `reqwest::Error` directly.
use thiserror::Error;

/// Failures of a remote call against the concern backend
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The request never produced a response (connection refused, timeout, ...)
    #[error("request to {endpoint} failed: {message}")]
    Network { endpoint: String, message: String },

    /// The backend answered with a non-success status other than 404
    #[error("{endpoint} responded with status {status}: {body}")]
    Server {
        endpoint: String,
        status: u16,
        body: String,
    },

    /// The backend answered 404; `message` is the server-provided text
    #[error("{message}")]
    NotFound { message: String },

    /// The response body did not match the expected schema
    #[error("could not decode response from {endpoint}: {message}")]
    Decode { endpoint: String, message: String },
}

/// Client-side rejections. These never reach the network layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Comment cannot be empty.")]
    EmptyComment,

    #[error("{0} is required.")]
    MissingField(&'static str),

    #[error("Unknown location '{0}'.")]
    UnknownLocation(String),

    #[error("Status {0} cannot be assigned.")]
    UnassignableStatus(String),

    #[error("Unknown role '{0}'. Expected one of USER, MODERATOR, ADMIN.")]
    UnknownRole(String),

    #[error("'{0}' is not a valid email address.")]
    InvalidEmail(String),

    #[error("Another update for this item is still in progress.")]
    AlreadyPending,

    #[error("Your role is not allowed to {0}.")]
    NotPermitted(&'static str),

    #[error("No popup is open for this action.")]
    PopupClosed,
}

/// Failures while loading `config.json` and the environment overrides
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("config file '{path}' is malformed: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{0}")]
    Invalid(String),
}
