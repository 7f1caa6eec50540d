//! Upstream retrieval of raw workflow text.

use std::collections::HashMap;

use wfsync_core::{SyncConfig, WorkflowName};

/// Result of one retrieval. Neither failure variant stops a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// HTTP 200 with the response body.
    Fetched(String),
    /// HTTP 404.
    NotFound,
    /// Any other status, a network failure, or an unreadable body.
    TransportError { detail: String },
}

/// Source of upstream workflow text.
pub trait Fetcher {
    fn fetch(&self, name: &WorkflowName) -> FetchOutcome;
}

/// In-memory fetcher: known names are fetched, everything else is not found.
impl Fetcher for HashMap<WorkflowName, FetchOutcome> {
    fn fetch(&self, name: &WorkflowName) -> FetchOutcome {
        self.get(name).cloned().unwrap_or(FetchOutcome::NotFound)
    }
}

/// Blocking HTTP fetcher for the raw-content endpoint.
///
/// One agent is shared across requests; every request carries the
/// configured timeout and, when a token is configured, an
/// `Authorization: token <value>` header. No retries.
pub struct HttpFetcher {
    agent: ureq::Agent,
    config: SyncConfig,
}

impl HttpFetcher {
    pub fn new(config: &SyncConfig) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(config.timeout).build();
        Self {
            agent,
            config: config.clone(),
        }
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, name: &WorkflowName) -> FetchOutcome {
        let url = self.config.raw_url(name);
        tracing::info!("downloading from: {url}");

        let mut request = self.agent.get(&url);
        if let Some(token) = self.config.token.as_deref() {
            request = request.set("Authorization", &format!("token {token}"));
        }

        match request.call() {
            Ok(response) if response.status() == 200 => match response.into_string() {
                Ok(text) => FetchOutcome::Fetched(text),
                Err(err) => FetchOutcome::TransportError {
                    detail: format!("failed to read response body: {err}"),
                },
            },
            Ok(response) => status_error(response.status(), response),
            Err(ureq::Error::Status(404, _)) => FetchOutcome::NotFound,
            Err(ureq::Error::Status(code, response)) => status_error(code, response),
            Err(ureq::Error::Transport(transport)) => FetchOutcome::TransportError {
                detail: transport.to_string(),
            },
        }
    }
}

fn status_error(code: u16, response: ureq::Response) -> FetchOutcome {
    let body = response.into_string().unwrap_or_default();
    FetchOutcome::TransportError {
        detail: format!("{code} {}", body.trim_end()),
    }
}
