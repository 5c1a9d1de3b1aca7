//! Due-date generation for installment and recurring financial entries.

use axum::{Json, Router, response::Json as ResponseJson, routing::post};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use services::services::recurrence::{
    Cadence, ScheduledEntry, generate_installment_dates, generate_recurrence_dates,
    installment_schedule,
};
use utils::response::ApiResponse;

use crate::{AppState, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct InstallmentRequest {
    pub start_date: NaiveDate,
    pub cadence: String,
    pub count: u32,
    #[serde(default)]
    pub total_amount_cents: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct InstallmentPlanResponse {
    pub dates: Vec<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entries: Option<Vec<ScheduledEntry>>,
}

#[derive(Debug, Deserialize)]
pub struct RecurrenceRequest {
    pub start_date: NaiveDate,
    pub cadence: String,
    pub duration_months: u32,
}

/// POST /api/financial/installments
pub async fn generate_installments(
    Json(payload): Json<InstallmentRequest>,
) -> Result<ResponseJson<ApiResponse<InstallmentPlanResponse>>, ApiError> {
    let cadence = Cadence::parse(&payload.cadence)?;

    let response = match payload.total_amount_cents {
        Some(total) => {
            let entries = installment_schedule(payload.start_date, cadence, payload.count, total)?;
            InstallmentPlanResponse {
                dates: entries.iter().map(|e| e.due_date).collect(),
                entries: Some(entries),
            }
        }
        None => InstallmentPlanResponse {
            dates: generate_installment_dates(payload.start_date, cadence, payload.count)?,
            entries: None,
        },
    };

    Ok(ResponseJson(ApiResponse::success(response)))
}

/// POST /api/financial/recurrences
pub async fn generate_recurrences(
    Json(payload): Json<RecurrenceRequest>,
) -> Result<ResponseJson<ApiResponse<Vec<NaiveDate>>>, ApiError> {
    let cadence = Cadence::parse(&payload.cadence)?;
    let dates = generate_recurrence_dates(payload.start_date, cadence, payload.duration_months)?;
    Ok(ResponseJson(ApiResponse::success(dates)))
}

pub fn router() -> Router<AppState> {
    Router::new().nest(
        "/financial",
        Router::new()
            .route("/installments", post(generate_installments))
            .route("/recurrences", post(generate_recurrences)),
    )
}
