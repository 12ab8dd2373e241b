//! Requests against the memory server API

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use stellar_domain::constants::{FORGET_PATH, HEALTH_PATH, RECALL_PATH, STATS_PATH, STORE_PATH};
use stellar_domain::{RecallQuery, StorePayload};

use crate::error::{SyncError, SyncResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Delete => "DELETE",
        }
    }
}

/// A request relative to the configured base URL
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: HttpMethod,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
    /// `None` lets the executor apply its default request timeout
    pub timeout: Option<Duration>,
}

impl ApiRequest {
    fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self { method, path: path.into(), query: Vec::new(), body: None, timeout: None }
    }

    pub fn health() -> Self {
        Self::new(HttpMethod::Get, HEALTH_PATH)
    }

    pub fn store(payload: &StorePayload) -> SyncResult<Self> {
        Self::new(HttpMethod::Post, STORE_PATH).with_json(payload)
    }

    /// Only `q` and `limit` go on the wire; `source` is a caller-side hint
    pub fn recall(query: &RecallQuery) -> Self {
        Self::new(HttpMethod::Get, RECALL_PATH)
            .with_query("q", &query.query)
            .with_query("limit", query.limit.to_string())
    }

    pub fn forget(memory_id: &str) -> Self {
        Self::new(HttpMethod::Delete, format!("{FORGET_PATH}/{}", urlencoding::encode(memory_id)))
    }

    pub fn stats() -> Self {
        Self::new(HttpMethod::Get, STATS_PATH)
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn with_json<T: Serialize>(mut self, body: &T) -> SyncResult<Self> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Raw server response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self { status, body: body.into() }
    }

    pub fn json_body(status: u16, value: &serde_json::Value) -> Self {
        Self::new(status, value.to_string())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_rate_limited(&self) -> bool {
        self.status == 429
    }

    /// Decode the body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> SyncResult<T> {
        serde_json::from_slice(&self.body).map_err(|err| {
            SyncError::Decode(format!("status {}: {err}", self.status))
        })
    }
}

#[cfg(test)]
mod tests {
    use stellar_domain::{MessageRole, SiteName, StoreMetadata};

    use super::*;

    #[test]
    fn recall_sends_only_query_and_limit() {
        let request = ApiRequest::recall(&RecallQuery {
            query: "deploy window".into(),
            limit: 5,
            source: Some(SiteName::Gemini),
        });
        assert_eq!(request.method, HttpMethod::Get);
        assert_eq!(request.path, "/api/v1/recall");
        assert_eq!(
            request.query,
            vec![
                ("q".to_string(), "deploy window".to_string()),
                ("limit".to_string(), "5".to_string()),
            ]
        );
    }

    #[test]
    fn forget_encodes_memory_id() {
        let request = ApiRequest::forget("mem/1 2");
        assert_eq!(request.method, HttpMethod::Delete);
        assert_eq!(request.path, "/api/v1/forget/mem%2F1%202");
    }

    #[test]
    fn store_carries_json_body() {
        let payload = StorePayload {
            content: "hello".into(),
            importance: 0.3,
            metadata: StoreMetadata {
                source: SiteName::Chatgpt,
                url: "https://chatgpt.com".into(),
                role: MessageRole::User,
                conversation_id: None,
                timestamp: 10,
            },
        };
        let request = ApiRequest::store(&payload).unwrap();
        let body = request.body.unwrap();
        assert_eq!(body["content"], "hello");
        assert_eq!(body["metadata"]["source"], "chatgpt");
        assert!(request.timeout.is_none());
    }

    #[test]
    fn response_status_helpers() {
        assert!(ApiResponse::new(204, Vec::new()).is_success());
        assert!(!ApiResponse::new(302, Vec::new()).is_success());
        assert!(ApiResponse::new(429, Vec::new()).is_rate_limited());
    }

    #[test]
    fn undecodable_body_is_decode_error() {
        let response = ApiResponse::new(200, "not json");
        let err = response.json::<serde_json::Value>().unwrap_err();
        assert!(matches!(err, SyncError::Decode(_)));
    }
}
