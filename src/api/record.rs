//! Working record endpoints.

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use super::{success, ApiResult};
use crate::errors::AppError;
use crate::models::{DiariaRecord, FinanceUpdate, Servant, Trip};
use crate::AppState;

/// Body of `PUT /api/record/report`.
#[derive(Debug, Deserialize)]
pub struct UpdateReportRequest {
    #[serde(default)]
    pub report: String,
}

/// Query of `DELETE /api/record`.
#[derive(Debug, Default, Deserialize)]
pub struct ClearParams {
    pub confirm: Option<String>,
}

/// GET /api/record - Get the working record.
pub async fn get_record(State(state): State<AppState>) -> ApiResult<DiariaRecord> {
    success(state.store.record().await)
}

/// PUT /api/record - Replace the whole working record.
pub async fn replace_record(
    State(state): State<AppState>,
    Json(record): Json<DiariaRecord>,
) -> ApiResult<DiariaRecord> {
    success(state.store.replace_record(record).await?)
}

/// PUT /api/record/servant - Replace the servant block.
pub async fn update_servant(
    State(state): State<AppState>,
    Json(servant): Json<Servant>,
) -> ApiResult<DiariaRecord> {
    success(state.store.update_servant(servant).await?)
}

/// PUT /api/record/trip - Replace the trip block.
pub async fn update_trip(
    State(state): State<AppState>,
    Json(trip): Json<Trip>,
) -> ApiResult<DiariaRecord> {
    success(state.store.update_trip(trip).await?)
}

/// PUT /api/record/finance - Set the unit value and/or quantity.
pub async fn update_finance(
    State(state): State<AppState>,
    Json(update): Json<FinanceUpdate>,
) -> ApiResult<DiariaRecord> {
    success(state.store.update_finance(update).await?)
}

/// PUT /api/record/report - Replace the report text.
pub async fn update_report(
    State(state): State<AppState>,
    Json(request): Json<UpdateReportRequest>,
) -> ApiResult<DiariaRecord> {
    success(state.store.update_report(request.report).await?)
}

/// DELETE /api/record?confirm=true - Clear every field.
pub async fn clear_record(
    State(state): State<AppState>,
    Query(params): Query<ClearParams>,
) -> ApiResult<DiariaRecord> {
    if params.confirm.as_deref() != Some("true") {
        return Err(AppError::ConfirmationRequired(
            "Clearing all fields requires confirm=true".to_string(),
        ));
    }

    success(state.store.clear().await?)
}
