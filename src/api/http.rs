use async_trait::async_trait;
use reqwest::{header, Client, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

use super::ConcernApi;
use crate::config::ApiConfig;
use crate::error::{ApiError, ConfigError};
use crate::state::data::{Comment, CommentId, Concern, ConcernId, ConcernStatus, NewConcern, Page, Role};
use crate::state::session::Session;

/// reqwest-backed client for the concern backend
#[derive(Clone)]
pub struct HttpConcernApi {
    base_url: String,
    client: Client,
}

impl HttpConcernApi {
    /// Build the client once; the session token becomes a default header
    pub fn new(config: &ApiConfig, session: &Session) -> Result<Self, ConfigError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json, text/plain"));
        if let Some(token) = session.token() {
            let value = header::HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|error| ConfigError::Invalid(format!("session token is not a valid header value: {error}")))?;
            headers.insert(header::AUTHORIZATION, value);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|error| ConfigError::Invalid(format!("failed to build HTTP client: {error}")))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            client,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// `prefix` followed by one percent-encoded path segment
    fn endpoint_with_segment(&self, prefix: &str, segment: &str) -> Result<Url, ApiError> {
        let raw = self.endpoint(prefix);
        let mut url = Url::parse(&raw).map_err(|error| ApiError::Network {
            endpoint: raw.clone(),
            message: format!("invalid URL: {error}"),
        })?;
        url.path_segments_mut()
            .map_err(|_| ApiError::Network {
                endpoint: raw.clone(),
                message: "base URL cannot carry path segments".to_owned(),
            })?
            .push(segment);
        Ok(url)
    }

    /// Send the request and return the body of a successful response
    async fn send(&self, endpoint: &str, request: RequestBuilder) -> Result<String, ApiError> {
        debug!(endpoint, "sending request");
        let response = request.send().await.map_err(|error| ApiError::Network {
            endpoint: endpoint.to_owned(),
            message: error.to_string(),
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|error| ApiError::Network {
            endpoint: endpoint.to_owned(),
            message: format!("failed to read response body: {error}"),
        })?;

        check_status(endpoint, status, body)
    }

    async fn request_json<T: DeserializeOwned>(&self, endpoint: &str, request: RequestBuilder) -> Result<T, ApiError> {
        let body = self.send(endpoint, request).await?;
        decode_json(endpoint, &body)
    }

    async fn request_text(&self, endpoint: &str, request: RequestBuilder) -> Result<String, ApiError> {
        let body = self.send(endpoint, request).await?;
        Ok(body.trim().to_owned())
    }
}

fn check_status(endpoint: &str, status: StatusCode, body: String) -> Result<String, ApiError> {
    if status.is_success() {
        return Ok(body);
    }
    if status == StatusCode::NOT_FOUND {
        return Err(ApiError::NotFound {
            message: not_found_message(&body),
        });
    }
    Err(ApiError::Server {
        endpoint: endpoint.to_owned(),
        status: status.as_u16(),
        body,
    })
}

fn decode_json<T: DeserializeOwned>(endpoint: &str, body: &str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|error| ApiError::Decode {
        endpoint: endpoint.to_owned(),
        message: error.to_string(),
    })
}

/// The `message` field of a 404 body, or the body itself when it is not JSON
fn not_found_message(body: &str) -> String {
    let trimmed = body.trim();
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(trimmed) {
        if let Some(Value::String(message)) = map.get("message") {
            return message.clone();
        }
    }
    if trimmed.is_empty() {
        "Not found".to_owned()
    } else {
        trimmed.to_owned()
    }
}

/// The comment endpoint answers `{"id": n}`, a bare JSON number, or plain text
fn parse_comment_id(endpoint: &str, body: &str) -> Result<CommentId, ApiError> {
    let trimmed = body.trim();
    let parsed = match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Object(map)) => map.get("id").and_then(Value::as_i64),
        Ok(Value::Number(number)) => number.as_i64(),
        Ok(Value::String(text)) => text.trim().parse().ok(),
        _ => trimmed.parse().ok(),
    };
    parsed.ok_or_else(|| ApiError::Decode {
        endpoint: endpoint.to_owned(),
        message: format!("expected a comment id, got '{trimmed}'"),
    })
}

#[async_trait]
impl ConcernApi for HttpConcernApi {
    async fn fetch_all(&self) -> Result<Vec<Concern>, ApiError> {
        let endpoint = self.endpoint("concerns/all");
        let request = self.client.get(&endpoint);
        self.request_json(&endpoint, request).await
    }

    async fn fetch_page(&self, page: usize, size: usize) -> Result<Page, ApiError> {
        let endpoint = self.endpoint("concerns/paged");
        let request = self.client.get(&endpoint).query(&[("page", page), ("size", size)]);
        self.request_json(&endpoint, request).await
    }

    async fn by_location(&self, location: &str) -> Result<Vec<Concern>, ApiError> {
        let url = self.endpoint_with_segment("concerns/location", location)?;
        let endpoint = url.to_string();
        let request = self.client.get(url);
        self.request_json(&endpoint, request).await
    }

    async fn by_status(&self, status: ConcernStatus) -> Result<Vec<Concern>, ApiError> {
        let url = self.endpoint_with_segment("concerns/status", status.as_str())?;
        let endpoint = url.to_string();
        let request = self.client.get(url);
        self.request_json(&endpoint, request).await
    }

    async fn search(&self, keyword: &str) -> Result<Vec<Concern>, ApiError> {
        let endpoint = self.endpoint("concerns/search");
        let request = self.client.get(&endpoint).query(&[("keyword", keyword)]);
        self.request_json(&endpoint, request).await
    }

    async fn upload(&self, concern: &NewConcern) -> Result<Concern, ApiError> {
        let endpoint = self.endpoint("concerns/add");
        let request = self.client.post(&endpoint).json(concern);
        self.request_json(&endpoint, request).await
    }

    async fn update_status(&self, id: ConcernId, status: ConcernStatus) -> Result<Concern, ApiError> {
        let endpoint = self.endpoint(&format!("concerns/{id}/status"));
        let request = self
            .client
            .post(&endpoint)
            .json(&json!({ "status": status.as_str() }));
        self.request_json(&endpoint, request).await
    }

    async fn add_comment(&self, id: ConcernId, text: &str, role: Role) -> Result<CommentId, ApiError> {
        let endpoint = self.endpoint(&format!("concerns/{id}/comments"));
        let request = self.client.post(&endpoint).json(&json!({
            "comment": text,
            "userRole": role.as_str(),
        }));
        let body = self.send(&endpoint, request).await?;
        parse_comment_id(&endpoint, &body)
    }

    async fn fetch_comments(&self, id: ConcernId) -> Result<Vec<Comment>, ApiError> {
        let endpoint = self.endpoint(&format!("concerns/{id}/comments"));
        let request = self.client.get(&endpoint);
        self.request_json(&endpoint, request).await
    }

    async fn delete_comment(&self, comment_id: CommentId) -> Result<String, ApiError> {
        let endpoint = self.endpoint(&format!("concerns/comments/{comment_id}"));
        let request = self.client.delete(&endpoint);
        self.request_text(&endpoint, request).await
    }

    async fn change_role(&self, email: &str, role: Role) -> Result<String, ApiError> {
        let endpoint = self.endpoint("user/role");
        let request = self.client.post(&endpoint).json(&json!({
            "email": email,
            "role": role.as_str(),
        }));
        self.request_text(&endpoint, request).await
    }

    async fn marquee(&self, role: Role) -> Result<String, ApiError> {
        let endpoint = self.endpoint("marquee");
        let request = self.client.get(&endpoint).query(&[("role", role.as_str())]);
        self.request_text(&endpoint, request).await
    }
}
