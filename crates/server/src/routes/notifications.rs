//! Business-event notifications pushed to each company's webhook.

use axum::{
    Json, Router,
    extract::{Path, State},
    response::Json as ResponseJson,
    routing::post,
};
use serde::Serialize;
use serde_json::{Map, Value};
use services::services::webhook::DeliveryOutcome;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{AppState, error::ApiError};

const ORDER_APPROVED_EVENT: &str = "order.approved";

#[derive(Debug, Serialize)]
pub struct NotificationResult {
    pub delivered: bool,
    pub attempts: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl From<DeliveryOutcome> for NotificationResult {
    fn from(outcome: DeliveryOutcome) -> Self {
        let attempts = outcome.attempts();
        match outcome {
            DeliveryOutcome::Delivered { .. } => Self {
                delivered: true,
                attempts,
                reason: None,
            },
            DeliveryOutcome::NotConfigured => Self {
                delivered: false,
                attempts,
                reason: Some("not_configured".to_string()),
            },
            DeliveryOutcome::Exhausted { last_error, .. } => Self {
                delivered: false,
                attempts,
                reason: Some(last_error),
            },
        }
    }
}

/// POST /api/companies/{company_id}/notifications/order-approved
///
/// A failed delivery is still a successful request: the caller decides
/// whether to surface it.
pub async fn notify_order_approved(
    State(state): State<AppState>,
    Path(company_id): Path<Uuid>,
    Json(mut payload): Json<Map<String, Value>>,
) -> Result<ResponseJson<ApiResponse<NotificationResult>>, ApiError> {
    payload
        .entry("event")
        .or_insert_with(|| Value::String(ORDER_APPROVED_EVENT.to_string()));
    payload
        .entry("company_id")
        .or_insert_with(|| Value::String(company_id.to_string()));

    let endpoint = state.resolver.resolve(company_id).await;
    let outcome = state
        .dispatcher
        .deliver(endpoint.as_deref(), &payload)
        .await?;

    Ok(ResponseJson(ApiResponse::success(outcome.into())))
}

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/companies/{company_id}/notifications/order-approved",
        post(notify_order_approved),
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode},
    };
    use serde_json::json;
    use services::services::{
        config::{EndpointResolver, NotificationConfig},
        retry::RetryPolicy,
        webhook::WebhookDispatcher,
    };
    use tower::ServiceExt;

    use super::*;
    use crate::routes;

    struct FixedResolver(&'static str);

    #[async_trait]
    impl EndpointResolver for FixedResolver {
        async fn resolve(&self, _company_id: Uuid) -> Option<String> {
            Some(self.0.to_string())
        }
    }

    async fn post_order_approved(state: AppState, body: Value) -> (StatusCode, Value) {
        let uri = format!(
            "/api/companies/{}/notifications/order-approved",
            Uuid::new_v4()
        );
        let response = routes::router(state)
            .oneshot(
                Request::post(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_unconfigured_company_is_not_an_error() {
        let state = AppState::from_config(&NotificationConfig::default()).unwrap();
        let (status, body) = post_order_approved(state, json!({ "order_id": 12 })).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["data"],
            json!({ "delivered": false, "attempts": 0, "reason": "not_configured" })
        );
    }

    #[tokio::test]
    async fn test_malformed_company_endpoint_is_rejected() {
        let dispatcher = WebhookDispatcher::new(
            RetryPolicy::default(),
            WebhookDispatcher::DEFAULT_ATTEMPT_TIMEOUT,
        )
        .unwrap();
        let state = AppState::new(dispatcher, Arc::new(FixedResolver("not a url")));
        let (status, body) = post_order_approved(state, json!({ "order_id": 12 })).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["success"], json!(false));
    }

    #[test]
    fn test_exhausted_outcome_carries_reason() {
        let result = NotificationResult::from(DeliveryOutcome::Exhausted {
            attempts: 3,
            last_error: "http 503: ".to_string(),
        });
        assert!(!result.delivered);
        assert_eq!(result.attempts, 3);
        assert_eq!(result.reason.as_deref(), Some("http 503: "));
    }
}
