//! Report improvement endpoints.

use axum::extract::State;
use serde::Serialize;

use super::{success, ApiResult};
use crate::models::DiariaRecord;
use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImprovementStatus {
    pub in_progress: bool,
}

/// POST /api/report/improve - Rewrite the report notes in formal language.
///
/// Returns the updated record. When the text service fails, the record comes
/// back with the notes untouched.
pub async fn improve_report(State(state): State<AppState>) -> ApiResult<DiariaRecord> {
    let record = state
        .store
        .improve_report(state.improver.as_ref())
        .await?;
    success(record)
}

/// GET /api/report/improve - Whether an improvement is running.
pub async fn improvement_status(State(state): State<AppState>) -> ApiResult<ImprovementStatus> {
    success(ImprovementStatus {
        in_progress: state.store.is_improving(),
    })
}
