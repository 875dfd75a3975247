//! Lending statistics endpoints

use axum::{extract::State, Json};
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::AppResult;

/// Current lending counts and fine totals
#[derive(Serialize, ToSchema)]
pub struct LendingStats {
    pub active_loans: i64,
    pub overdue_loans: i64,
    pub lost_loans: i64,
    pub damaged_loans: i64,
    /// Sum of unpaid penalty amounts
    pub outstanding_fines: Decimal,
    /// Sum of settled penalty amounts
    pub collected_fines: Decimal,
}

/// Get lending statistics
#[utoipa::path(
    get,
    path = "/stats/lending",
    tag = "stats",
    responses(
        (status = 200, description = "Lending statistics", body = LendingStats)
    )
)]
pub async fn get_lending_stats(
    State(state): State<crate::AppState>,
) -> AppResult<Json<LendingStats>> {
    let stats = state.services.stats.get_lending_stats().await?;
    Ok(Json(stats))
}
