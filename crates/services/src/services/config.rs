//! Notification settings and per-company endpoint resolution.

use std::{collections::HashMap, path::PathBuf, time::Duration};

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use super::{
    retry::{RetryPolicy, RetryPolicyError},
    webhook::{WebhookDispatcher, WebhookError},
};

pub const WEBHOOK_URL_VAR: &str = "ERP_WEBHOOK_URL";
pub const MAX_ATTEMPTS_VAR: &str = "ERP_WEBHOOK_MAX_ATTEMPTS";
pub const RETRY_INTERVAL_VAR: &str = "ERP_WEBHOOK_RETRY_INTERVAL_MS";
pub const TIMEOUT_VAR: &str = "ERP_WEBHOOK_TIMEOUT_SECS";
pub const TENANT_FILE_VAR: &str = "ERP_TENANT_WEBHOOKS";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} must be a non-negative integer, got '{value}'")]
    InvalidNumber { var: &'static str, value: String },
    #[error("invalid retry policy: {0}")]
    RetryPolicy(#[from] RetryPolicyError),
    #[error("failed to read {}: {source}", path.display())]
    ReadTenantFile {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse tenant webhooks: {0}")]
    ParseTenantFile(#[from] toml::de::Error),
    #[error("invalid company id in tenant webhooks: {0}")]
    InvalidCompanyId(String),
}

/// `[companies]` table mapping company ids to webhook endpoints.
#[derive(Debug, Default, Deserialize)]
struct TenantWebhooks {
    #[serde(default)]
    companies: HashMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct NotificationConfig {
    pub default_endpoint: Option<String>,
    pub retry_policy: RetryPolicy,
    pub attempt_timeout: Duration,
    pub company_endpoints: HashMap<Uuid, String>,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            default_endpoint: None,
            retry_policy: RetryPolicy::default(),
            attempt_timeout: WebhookDispatcher::DEFAULT_ATTEMPT_TIMEOUT,
            company_endpoints: HashMap::new(),
        }
    }
}

impl NotificationConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from any variable source; unset or blank variables take defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let max_attempts = match get(MAX_ATTEMPTS_VAR) {
            Some(v) => parse_number(MAX_ATTEMPTS_VAR, &v)?,
            None => u64::from(defaults.retry_policy.max_attempts()),
        };
        let retry_interval = match get(RETRY_INTERVAL_VAR) {
            Some(v) => Duration::from_millis(parse_number(RETRY_INTERVAL_VAR, &v)?),
            None => defaults.retry_policy.retry_interval(),
        };
        let attempt_timeout = match get(TIMEOUT_VAR) {
            Some(v) => Duration::from_secs(parse_number(TIMEOUT_VAR, &v)?),
            None => defaults.attempt_timeout,
        };
        let max_attempts = u32::try_from(max_attempts).map_err(|_| ConfigError::InvalidNumber {
            var: MAX_ATTEMPTS_VAR,
            value: max_attempts.to_string(),
        })?;

        let company_endpoints = match get(TENANT_FILE_VAR) {
            Some(path) => {
                let path = PathBuf::from(path);
                let content = std::fs::read_to_string(&path)
                    .map_err(|source| ConfigError::ReadTenantFile { path, source })?;
                parse_company_endpoints(&content)?
            }
            None => HashMap::new(),
        };

        Ok(Self {
            default_endpoint: get(WEBHOOK_URL_VAR).map(|v| v.trim().to_string()),
            retry_policy: RetryPolicy::new(max_attempts, retry_interval)?,
            attempt_timeout,
            company_endpoints,
        })
    }

    pub fn dispatcher(&self) -> Result<WebhookDispatcher, WebhookError> {
        WebhookDispatcher::new(self.retry_policy, self.attempt_timeout)
    }
}

fn parse_number(var: &'static str, value: &str) -> Result<u64, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidNumber {
        var,
        value: value.to_string(),
    })
}

fn parse_company_endpoints(content: &str) -> Result<HashMap<Uuid, String>, ConfigError> {
    let file: TenantWebhooks = toml::from_str(content)?;
    file.companies
        .into_iter()
        .map(|(id, endpoint)| {
            let id = Uuid::parse_str(&id).map_err(|_| ConfigError::InvalidCompanyId(id))?;
            Ok((id, endpoint))
        })
        .collect()
}

/// Looks up where a company's notifications go. Backed by the tenant
/// settings store in production.
#[async_trait]
pub trait EndpointResolver: Send + Sync {
    async fn resolve(&self, company_id: Uuid) -> Option<String>;
}

/// Resolver over [`NotificationConfig`]: a company entry wins over the default.
#[derive(Debug, Clone, Default)]
pub struct StaticEndpointResolver {
    default_endpoint: Option<String>,
    company_endpoints: HashMap<Uuid, String>,
}

impl StaticEndpointResolver {
    pub fn from_config(config: &NotificationConfig) -> Self {
        Self {
            default_endpoint: config.default_endpoint.clone(),
            company_endpoints: config.company_endpoints.clone(),
        }
    }
}

#[async_trait]
impl EndpointResolver for StaticEndpointResolver {
    async fn resolve(&self, company_id: Uuid) -> Option<String> {
        let endpoint = self
            .company_endpoints
            .get(&company_id)
            .or(self.default_endpoint.as_ref())
            .cloned();
        debug!(company_id = %company_id, configured = endpoint.is_some(), "Resolved webhook endpoint");
        endpoint
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var: &str| vars.get(var).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = NotificationConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.default_endpoint, None);
        assert_eq!(config.retry_policy, RetryPolicy::default());
        assert_eq!(config.attempt_timeout, Duration::from_secs(10));
        assert!(config.company_endpoints.is_empty());
    }

    #[test]
    fn test_reads_overrides() {
        let config = NotificationConfig::from_lookup(lookup(&[
            (WEBHOOK_URL_VAR, " https://hooks.example.com/erp "),
            (MAX_ATTEMPTS_VAR, "5"),
            (RETRY_INTERVAL_VAR, "250"),
            (TIMEOUT_VAR, "3"),
        ]))
        .unwrap();
        assert_eq!(
            config.default_endpoint.as_deref(),
            Some("https://hooks.example.com/erp")
        );
        assert_eq!(config.retry_policy.max_attempts(), 5);
        assert_eq!(config.retry_policy.retry_interval(), Duration::from_millis(250));
        assert_eq!(config.attempt_timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_rejects_bad_numbers() {
        let err = NotificationConfig::from_lookup(lookup(&[(MAX_ATTEMPTS_VAR, "three")]))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidNumber {
                var: MAX_ATTEMPTS_VAR,
                ..
            }
        ));

        let err = NotificationConfig::from_lookup(lookup(&[(MAX_ATTEMPTS_VAR, "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::RetryPolicy(RetryPolicyError::ZeroAttempts)));
    }

    #[test]
    fn test_loads_company_endpoints_file() {
        let company = Uuid::new_v4();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[companies]\n\"{company}\" = \"https://acme.example.com/hook\"").unwrap();

        let path = file.path().to_string_lossy().to_string();
        let config = NotificationConfig::from_lookup(lookup(&[(TENANT_FILE_VAR, path.as_str())])).unwrap();
        assert_eq!(
            config.company_endpoints.get(&company).map(String::as_str),
            Some("https://acme.example.com/hook")
        );
    }

    #[test]
    fn test_rejects_bad_company_id() {
        let err = parse_company_endpoints("[companies]\nacme = \"https://x\"").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidCompanyId(id) if id == "acme"));
    }

    #[tokio::test]
    async fn test_company_endpoint_wins_over_default() {
        let acme = Uuid::new_v4();
        let config = NotificationConfig {
            default_endpoint: Some("https://default.example.com".to_string()),
            company_endpoints: HashMap::from([(acme, "https://acme.example.com".to_string())]),
            ..NotificationConfig::default()
        };
        let resolver = StaticEndpointResolver::from_config(&config);

        assert_eq!(
            resolver.resolve(acme).await.as_deref(),
            Some("https://acme.example.com")
        );
        assert_eq!(
            resolver.resolve(Uuid::new_v4()).await.as_deref(),
            Some("https://default.example.com")
        );
        assert_eq!(StaticEndpointResolver::default().resolve(acme).await, None);
    }
}
