use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use services::services::{recurrence::RecurrenceError, webhook::WebhookError};
use thiserror::Error;
use utils::response::ApiResponse;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Recurrence(#[from] RecurrenceError),
    #[error(transparent)]
    Webhook(#[from] WebhookError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Recurrence(_) => StatusCode::BAD_REQUEST,
            ApiError::Webhook(WebhookError::InvalidEndpoint { .. }) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ApiError::Webhook(WebhookError::Client(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        (status, Json(ApiResponse::<()>::error(self.to_string()))).into_response()
    }
}
