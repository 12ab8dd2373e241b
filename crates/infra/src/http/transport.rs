use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client as ReqwestClient, Method};
use stellar_core::{ApiRequest, ApiResponse, HttpMethod, HttpTransport, SyncError, SyncResult};
use tracing::debug;
use url::Url;

use crate::errors::InfraError;

/// [`HttpTransport`] backed by a shared reqwest client.
///
/// Sends each request exactly once; retry policy lives in the core executor.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: ReqwestClient,
    base_url: Url,
    default_timeout: Duration,
}

impl ReqwestTransport {
    /// Start building a new transport.
    pub fn builder(base_url: impl Into<String>) -> ReqwestTransportBuilder {
        ReqwestTransportBuilder::new(base_url)
    }

    /// Convenience constructor with default configuration.
    pub fn new(base_url: impl Into<String>) -> SyncResult<Self> {
        Self::builder(base_url).build()
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url_for(&self, request: &ApiRequest) -> SyncResult<Url> {
        let mut url = self
            .base_url
            .join(request.path.trim_start_matches('/'))
            .map_err(|err| SyncError::Config(format!("invalid request path {}: {err}", request.path)))?;
        if !request.query.is_empty() {
            url.query_pairs_mut().extend_pairs(request.query.iter());
        }
        Ok(url)
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: &ApiRequest) -> SyncResult<ApiResponse> {
        let url = self.url_for(request)?;
        let method = match request.method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Delete => Method::DELETE,
        };
        let timeout = request.timeout.unwrap_or(self.default_timeout);

        let mut builder = self.client.request(method.clone(), url.clone()).timeout(timeout);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        debug!(%method, %url, timeout_ms, "sending HTTP request");
        let response = builder.send().await.map_err(|err| {
            debug!(%method, %url, error = %err, "HTTP request failed");
            if err.is_timeout() {
                SyncError::Timeout(timeout)
            } else {
                SyncError::from(InfraError::from(err))
            }
        })?;

        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(|err| {
            if err.is_timeout() {
                SyncError::Timeout(timeout)
            } else {
                SyncError::from(InfraError::from(err))
            }
        })?;
        debug!(%method, %url, status, bytes = body.len(), "received HTTP response");

        Ok(ApiResponse::new(status, body.to_vec()))
    }
}

/// Builder for [`ReqwestTransport`].
#[derive(Debug)]
pub struct ReqwestTransportBuilder {
    base_url: String,
    timeout: Duration,
    connect_timeout: Option<Duration>,
    user_agent: Option<String>,
}

impl ReqwestTransportBuilder {
    fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(10),
            connect_timeout: None,
            user_agent: Some(concat!("stellar-sync/", env!("CARGO_PKG_VERSION")).to_string()),
        }
    }

    /// Timeout for requests that carry none of their own
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    pub fn build(self) -> SyncResult<ReqwestTransport> {
        // A trailing slash makes `Url::join` append to the path instead of
        // replacing its last segment.
        let mut base = self.base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base)
            .map_err(|err| SyncError::Config(format!("invalid base URL {}: {err}", self.base_url)))?;

        let mut builder = ReqwestClient::builder().no_proxy();
        if let Some(agent) = self.user_agent {
            builder = builder.user_agent(agent);
        }
        if let Some(connect_timeout) = self.connect_timeout {
            builder = builder.connect_timeout(connect_timeout);
        }
        let client = builder.build().map_err(|err| SyncError::from(InfraError::from(err)))?;

        Ok(ReqwestTransport { client, base_url, default_timeout: self.timeout })
    }
}
