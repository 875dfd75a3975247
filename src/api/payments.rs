//! Payments ledger endpoints

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{error::AppResult, models::penalty::PaymentEntry};

use super::PaginatedResponse;

/// Payments list pagination
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct PaymentsQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// List penalties joined with their settlement state, newest first
#[utoipa::path(
    get,
    path = "/payments",
    tag = "payments",
    params(PaymentsQuery),
    responses(
        (status = 200, description = "Paginated payments ledger", body = PaginatedResponse<PaymentEntry>)
    )
)]
pub async fn list_payments(
    State(state): State<crate::AppState>,
    Query(query): Query<PaymentsQuery>,
) -> AppResult<Json<PaginatedResponse<PaymentEntry>>> {
    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(10).clamp(1, 100);

    let (items, total) = state.services.lending.list_payments(page, per_page).await?;

    Ok(Json(PaginatedResponse {
        items,
        total,
        page,
        per_page,
    }))
}
