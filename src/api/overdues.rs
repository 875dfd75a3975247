//! Overdue tracking endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::overdue::{OverdueDetails, OverdueQuery},
};

use super::{PaginatedResponse, StaffActor};

/// Reminder response
#[derive(Serialize, ToSchema)]
pub struct ReminderResponse {
    /// Status message
    pub message: String,
}

/// List overdue records with search and pagination
#[utoipa::path(
    get,
    path = "/overdues",
    tag = "overdues",
    params(OverdueQuery),
    responses(
        (status = 200, description = "Paginated overdue list", body = PaginatedResponse<OverdueDetails>)
    )
)]
pub async fn list_overdues(
    State(state): State<crate::AppState>,
    Query(query): Query<OverdueQuery>,
) -> AppResult<Json<PaginatedResponse<OverdueDetails>>> {
    let (items, total) = state.services.lending.list_overdues(&query).await?;

    Ok(Json(PaginatedResponse {
        items,
        total,
        page: query.page.unwrap_or(1),
        per_page: query.per_page.unwrap_or(10),
    }))
}

/// Send an overdue reminder email to the borrower.
///
/// The email is dispatched in the background; the ledger never waits on SMTP.
#[utoipa::path(
    post,
    path = "/overdues/{loan_id}/remind",
    tag = "overdues",
    params(("loan_id" = i32, Path, description = "Loan ID")),
    responses(
        (status = 202, description = "Reminder queued", body = ReminderResponse),
        (status = 404, description = "Loan or overdue record not found")
    )
)]
pub async fn send_reminder(
    State(state): State<crate::AppState>,
    StaffActor(staff_id): StaffActor,
    Path(loan_id): Path<i32>,
) -> AppResult<(axum::http::StatusCode, Json<ReminderResponse>)> {
    let reminder = state
        .services
        .lending
        .overdue_reminder_data(loan_id)
        .await?;

    state
        .services
        .audit
        .log_action(
            staff_id,
            "Overdue Email Reminder",
            &format!("Sent an overdue email reminder to {}.", reminder.borrower_name),
        )
        .await;

    let email = state.services.email.clone();
    tokio::spawn(async move {
        if let Err(e) = email
            .send_overdue_reminder(
                &reminder.email,
                &reminder.borrower_name,
                &reminder.overdue_books,
                reminder.penalty,
            )
            .await
        {
            tracing::warn!("Overdue reminder for loan {} failed: {}", loan_id, e);
        }
    });

    Ok((
        axum::http::StatusCode::ACCEPTED,
        Json(ReminderResponse {
            message: "Reminder email queued".to_string(),
        }),
    ))
}
