use std::sync::Arc;

use services::services::{
    config::{EndpointResolver, NotificationConfig, StaticEndpointResolver},
    webhook::{WebhookDispatcher, WebhookError},
};

pub mod error;
pub mod routes;

/// Shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: WebhookDispatcher,
    pub resolver: Arc<dyn EndpointResolver>,
}

impl AppState {
    pub fn new(dispatcher: WebhookDispatcher, resolver: Arc<dyn EndpointResolver>) -> Self {
        Self {
            dispatcher,
            resolver,
        }
    }

    pub fn from_config(config: &NotificationConfig) -> Result<Self, WebhookError> {
        Ok(Self::new(
            config.dispatcher()?,
            Arc::new(StaticEndpointResolver::from_config(config)),
        ))
    }
}
