//! Outbound webhook notifications (e.g. "order approved") with bounded retries.

use std::{
    sync::atomic::{AtomicU32, Ordering},
    time::Duration,
};

use backon::Retryable;
use reqwest::Client;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, error, info, warn};
use url::Url;
use uuid::Uuid;

use super::retry::RetryPolicy;

/// Stands in for null and empty-string fields; some sinks reject missing values.
pub const EMPTY_FIELD_PLACEHOLDER: &str = ".";

const MAX_LOGGED_BODY_CHARS: usize = 500;

#[derive(Debug, Clone, Error)]
pub enum WebhookError {
    #[error("invalid webhook endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },
    #[error("failed to build http client: {0}")]
    Client(String),
}

/// Failure of a single delivery attempt. Always retried while attempts remain.
#[derive(Debug, Clone, Error)]
enum AttemptError {
    #[error("network error: {0}")]
    Transport(String),
    #[error("timeout")]
    Timeout,
    #[error("http {status}: {body}")]
    Status { status: u16, body: String },
}

/// Result of one `deliver` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DeliveryOutcome {
    Delivered { attempts: u32 },
    /// No endpoint configured; nothing was sent.
    NotConfigured,
    Exhausted { attempts: u32, last_error: String },
}

impl DeliveryOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered { .. })
    }

    pub fn attempts(&self) -> u32 {
        match self {
            Self::Delivered { attempts } | Self::Exhausted { attempts, .. } => *attempts,
            Self::NotConfigured => 0,
        }
    }
}

/// Replace null and empty-string values with [`EMPTY_FIELD_PLACEHOLDER`].
///
/// Lossy: a field that was literally "." can no longer be told apart from an
/// empty one. Only top-level fields are rewritten.
pub fn sanitize_payload(payload: &Map<String, Value>) -> Map<String, Value> {
    payload
        .iter()
        .map(|(key, value)| {
            let value = match value {
                Value::Null => Value::String(EMPTY_FIELD_PLACEHOLDER.to_string()),
                Value::String(s) if s.is_empty() => {
                    Value::String(EMPTY_FIELD_PLACEHOLDER.to_string())
                }
                other => other.clone(),
            };
            (key.clone(), value)
        })
        .collect()
}

/// Webhook client. Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct WebhookDispatcher {
    http: Client,
    policy: RetryPolicy,
}

impl WebhookDispatcher {
    pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(10);

    /// `attempt_timeout` bounds each HTTP round trip, not the whole delivery.
    pub fn new(policy: RetryPolicy, attempt_timeout: Duration) -> Result<Self, WebhookError> {
        let http = Client::builder()
            .timeout(attempt_timeout)
            .user_agent(concat!("erp-notifications/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| WebhookError::Client(e.to_string()))?;

        Ok(Self { http, policy })
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// POST `payload` to `endpoint`, retrying on non-2xx responses and
    /// network errors until the policy's attempts run out.
    ///
    /// A missing or blank endpoint is [`DeliveryOutcome::NotConfigured`]. A
    /// malformed endpoint is an error and no request is made.
    pub async fn deliver(
        &self,
        endpoint: Option<&str>,
        payload: &Map<String, Value>,
    ) -> Result<DeliveryOutcome, WebhookError> {
        let Some(endpoint) = endpoint.map(str::trim).filter(|e| !e.is_empty()) else {
            debug!("No webhook endpoint configured, skipping delivery");
            return Ok(DeliveryOutcome::NotConfigured);
        };
        let url = parse_endpoint(endpoint)?;
        let body = sanitize_payload(payload);

        let delivery_id = Uuid::new_v4();
        let host = url.host_str().unwrap_or_default().to_string();
        let attempts = AtomicU32::new(0);
        let max_attempts = self.policy.max_attempts();

        let (url, body, attempts, host) = (&url, &body, &attempts, &host);
        let result = (|| async move {
            let attempt = attempts.fetch_add(1, Ordering::SeqCst) + 1;
            match self.send(url, body).await {
                Ok(()) => Ok(attempt),
                Err(e) => {
                    warn!(
                        delivery_id = %delivery_id,
                        endpoint = %host,
                        attempt,
                        max_attempts,
                        error = %e,
                        "Webhook delivery attempt failed"
                    );
                    Err(e)
                }
            }
        })
        .retry(self.policy.backoff())
        .notify(|_: &AttemptError, dur: Duration| {
            debug!(
                delivery_id = %delivery_id,
                "Retrying webhook delivery after {:.2}s",
                dur.as_secs_f64()
            )
        })
        .await;

        match result {
            Ok(attempt) => {
                info!(
                    delivery_id = %delivery_id,
                    endpoint = %host,
                    attempt,
                    "Webhook delivered"
                );
                Ok(DeliveryOutcome::Delivered { attempts: attempt })
            }
            Err(e) => {
                let attempts = attempts.load(Ordering::SeqCst);
                error!(
                    delivery_id = %delivery_id,
                    endpoint = %host,
                    attempts,
                    error = %e,
                    "Webhook delivery exhausted all attempts"
                );
                Ok(DeliveryOutcome::Exhausted {
                    attempts,
                    last_error: e.to_string(),
                })
            }
        }
    }

    /// Boolean form of [`Self::deliver`] for callers that only show a
    /// success/failure indicator. Misuse (a malformed endpoint) is logged.
    pub async fn notify(&self, endpoint: Option<&str>, payload: &Map<String, Value>) -> bool {
        match self.deliver(endpoint, payload).await {
            Ok(outcome) => outcome.is_delivered(),
            Err(e) => {
                error!(error = %e, "Webhook notification not sent");
                false
            }
        }
    }

    async fn send(&self, url: &Url, body: &Map<String, Value>) -> Result<(), AttemptError> {
        let res = self
            .http
            .post(url.clone())
            .json(body)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = res.status();
        if status.is_success() {
            return Ok(());
        }

        let body = res.text().await.unwrap_or_default();
        Err(AttemptError::Status {
            status: status.as_u16(),
            body: body.chars().take(MAX_LOGGED_BODY_CHARS).collect(),
        })
    }
}

fn parse_endpoint(endpoint: &str) -> Result<Url, WebhookError> {
    let invalid = |reason: String| WebhookError::InvalidEndpoint {
        endpoint: endpoint.to_string(),
        reason,
    };
    let url = Url::parse(endpoint).map_err(|e| invalid(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(invalid(format!("unsupported scheme '{scheme}'"))),
    }
}

fn map_reqwest_error(e: reqwest::Error) -> AttemptError {
    if e.is_timeout() {
        AttemptError::Timeout
    } else {
        AttemptError::Transport(e.to_string())
    }
}
