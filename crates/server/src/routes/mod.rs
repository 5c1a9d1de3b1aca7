use axum::{Router, response::Json as ResponseJson, routing::get};
use tower_http::trace::TraceLayer;
use utils::response::ApiResponse;

use crate::AppState;

pub mod financial;
pub mod notifications;

pub async fn health_check() -> ResponseJson<ApiResponse<&'static str>> {
    ResponseJson(ApiResponse::success("OK"))
}

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/health", get(health_check))
        .merge(financial::router())
        .merge(notifications::router());

    Router::new()
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
