//! History endpoints.

use axum::extract::{Path, State};

use super::{success, ApiResult};
use crate::errors::AppError;
use crate::models::{DiariaRecord, HistoryEntrySummary};
use crate::AppState;

/// GET /api/history - List history entries, most recent first.
pub async fn list_history(State(state): State<AppState>) -> ApiResult<Vec<HistoryEntrySummary>> {
    success(state.store.history().await.summaries())
}

/// GET /api/history/{index} - Get a full history snapshot.
pub async fn get_history_entry(
    State(state): State<AppState>,
    Path(index): Path<String>,
) -> ApiResult<DiariaRecord> {
    let index = parse_index(&index)?;
    success(state.store.history_entry(index).await?)
}

/// POST /api/history/{index}/load - Make a snapshot the working record.
pub async fn load_history_entry(
    State(state): State<AppState>,
    Path(index): Path<String>,
) -> ApiResult<DiariaRecord> {
    let index = parse_index(&index)?;
    let record = state.store.load_from_history(index).await?;
    tracing::info!("Loaded history entry {} into the form", index);
    success(record)
}

fn parse_index(raw: &str) -> Result<usize, AppError> {
    raw.parse()
        .map_err(|_| AppError::BadRequest(format!("Invalid history index: {}", raw)))
}
