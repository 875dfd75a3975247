//! Loan ledger endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        loan::{IssueLoans, IssueOutcome, LoanDetails, LoanQuery},
        penalty::Payment,
    },
};

use super::{PaginatedResponse, StaffActor};

/// Issue request: one copy of each listed book for the borrower
#[derive(Deserialize, Validate, ToSchema)]
pub struct IssueLoansRequest {
    /// Borrower user ID
    pub borrower_id: i32,
    /// Books to issue, one available copy each
    #[validate(length(min = 1, message = "select at least one book"))]
    pub book_ids: Vec<i32>,
    /// Due date for every issued copy
    pub due_date: DateTime<Utc>,
}

/// Issue response
#[derive(Serialize, ToSchema)]
pub struct IssueResponse {
    /// Status message
    pub message: String,
    #[serde(flatten)]
    pub outcome: IssueOutcome,
}

/// Response for loan mutations carrying the updated loan
#[derive(Serialize, ToSchema)]
pub struct LoanActionResponse {
    /// Outcome keyword: "returned", "renewed", "lost", "damaged"
    pub status: String,
    /// Status message
    pub message: String,
    /// Loan details after the action
    pub loan: LoanDetails,
}

/// Mark-lost request; amount is the manually entered penalty when the
/// market-price lookup cannot resolve one
#[derive(Default, Deserialize, ToSchema)]
pub struct MarkLostRequest {
    pub amount: Option<Decimal>,
}

/// Cashier settlement request
#[derive(Deserialize, Validate, ToSchema)]
pub struct SettlePaymentRequest {
    /// Official receipt number
    #[validate(length(min = 1, max = 50, message = "OR number is required"))]
    pub or_number: String,
}

/// Settlement response
#[derive(Serialize, ToSchema)]
pub struct PaymentResponse {
    /// Status message
    pub message: String,
    pub payment: Payment,
}

/// List loans with search, status filter and pagination
#[utoipa::path(
    get,
    path = "/loans",
    tag = "loans",
    params(LoanQuery),
    responses(
        (status = 200, description = "Paginated loan list", body = PaginatedResponse<LoanDetails>)
    )
)]
pub async fn list_loans(
    State(state): State<crate::AppState>,
    Query(query): Query<LoanQuery>,
) -> AppResult<Json<PaginatedResponse<LoanDetails>>> {
    let (items, total) = state.services.lending.list_loans(&query).await?;

    Ok(Json(PaginatedResponse {
        items,
        total,
        page: query.page.unwrap_or(1),
        per_page: query.per_page.unwrap_or(10),
    }))
}

/// Get one loan with penalties and payment state
#[utoipa::path(
    get,
    path = "/loans/{id}",
    tag = "loans",
    params(("id" = i32, Path, description = "Loan ID")),
    responses(
        (status = 200, description = "Loan details", body = LoanDetails),
        (status = 404, description = "Loan not found")
    )
)]
pub async fn get_loan(
    State(state): State<crate::AppState>,
    Path(loan_id): Path<i32>,
) -> AppResult<Json<LoanDetails>> {
    let details = state.services.lending.get_loan_details(loan_id).await?;
    Ok(Json(details))
}

/// Issue books to a borrower
#[utoipa::path(
    post,
    path = "/loans",
    tag = "loans",
    request_body = IssueLoansRequest,
    responses(
        (status = 201, description = "Books issued", body = IssueResponse),
        (status = 400, description = "Invalid request or past due date"),
        (status = 404, description = "Borrower not found"),
        (status = 422, description = "Borrowing limit or duplicate-book rule violated")
    )
)]
pub async fn issue_loans(
    State(state): State<crate::AppState>,
    StaffActor(staff_id): StaffActor,
    Json(request): Json<IssueLoansRequest>,
) -> AppResult<(StatusCode, Json<IssueResponse>)> {
    request
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let outcome = state
        .services
        .lending
        .issue(
            IssueLoans {
                borrower_id: request.borrower_id,
                book_ids: request.book_ids,
                due_date: request.due_date,
            },
            staff_id,
        )
        .await?;

    let message = format!(
        "{} book(s) issued successfully to {} (now borrowing {}/{})",
        outcome.issued.len(),
        outcome.borrower_name,
        outcome.active_loans,
        state.config.lending.max_active_loans
    );

    Ok((
        StatusCode::CREATED,
        Json(IssueResponse { message, outcome }),
    ))
}

/// Return a borrowed book
#[utoipa::path(
    post,
    path = "/loans/{id}/return",
    tag = "loans",
    params(("id" = i32, Path, description = "Loan ID")),
    responses(
        (status = 200, description = "Book returned", body = LoanActionResponse),
        (status = 404, description = "Loan not found"),
        (status = 409, description = "Already returned")
    )
)]
pub async fn return_loan(
    State(state): State<crate::AppState>,
    StaffActor(staff_id): StaffActor,
    Path(loan_id): Path<i32>,
) -> AppResult<Json<LoanActionResponse>> {
    let loan = state.services.lending.return_loan(loan_id, staff_id).await?;

    Ok(Json(LoanActionResponse {
        status: "returned".to_string(),
        message: "Transaction complete: book successfully returned".to_string(),
        loan,
    }))
}

/// Renew a loan
#[utoipa::path(
    post,
    path = "/loans/{id}/renew",
    tag = "loans",
    params(("id" = i32, Path, description = "Loan ID")),
    responses(
        (status = 200, description = "Loan renewed", body = LoanActionResponse),
        (status = 404, description = "Loan not found"),
        (status = 409, description = "Loan already returned or terminal"),
        (status = 422, description = "Renewal refused: overdue or too many strikes")
    )
)]
pub async fn renew_loan(
    State(state): State<crate::AppState>,
    StaffActor(staff_id): StaffActor,
    Path(loan_id): Path<i32>,
) -> AppResult<Json<LoanActionResponse>> {
    let loan = state.services.lending.renew(loan_id, staff_id).await?;
    let message = format!(
        "The loan has been renewed for {} days",
        state.config.lending.renewal_period_days
    );

    Ok(Json(LoanActionResponse {
        status: "renewed".to_string(),
        message,
        loan,
    }))
}

/// Mark a loan's copy as lost and charge the replacement penalty
#[utoipa::path(
    post,
    path = "/loans/{id}/lost",
    tag = "loans",
    params(("id" = i32, Path, description = "Loan ID")),
    request_body = MarkLostRequest,
    responses(
        (status = 200, description = "Book marked as lost", body = LoanActionResponse),
        (status = 400, description = "Manual penalty amount required"),
        (status = 404, description = "Loan not found"),
        (status = 409, description = "Already returned")
    )
)]
pub async fn mark_lost(
    State(state): State<crate::AppState>,
    StaffActor(staff_id): StaffActor,
    Path(loan_id): Path<i32>,
    body: Option<Json<MarkLostRequest>>,
) -> AppResult<Json<LoanActionResponse>> {
    let amount = body.and_then(|Json(b)| b.amount);
    let loan = state
        .services
        .lending
        .mark_lost(loan_id, amount, staff_id)
        .await?;

    let message = format!(
        "Book marked as lost. Penalty fee {:.2} applied",
        loan.total_penalties
    );
    Ok(Json(LoanActionResponse {
        status: "lost".to_string(),
        message,
        loan,
    }))
}

/// Mark a loan's copy as damaged and charge the flat damage penalty
#[utoipa::path(
    post,
    path = "/loans/{id}/damaged",
    tag = "loans",
    params(("id" = i32, Path, description = "Loan ID")),
    responses(
        (status = 200, description = "Book marked as damaged", body = LoanActionResponse),
        (status = 404, description = "Loan not found"),
        (status = 409, description = "Already returned")
    )
)]
pub async fn mark_damaged(
    State(state): State<crate::AppState>,
    StaffActor(staff_id): StaffActor,
    Path(loan_id): Path<i32>,
) -> AppResult<Json<LoanActionResponse>> {
    let loan = state
        .services
        .lending
        .mark_damaged(loan_id, staff_id)
        .await?;

    Ok(Json(LoanActionResponse {
        status: "damaged".to_string(),
        message: "The book has been marked as damaged; a penalty fee has been applied".to_string(),
        loan,
    }))
}

/// Settle all penalties on a loan against one cashier payment
#[utoipa::path(
    post,
    path = "/loans/{id}/payments",
    tag = "loans",
    params(("id" = i32, Path, description = "Loan ID")),
    request_body = SettlePaymentRequest,
    responses(
        (status = 201, description = "Payment recorded", body = PaymentResponse),
        (status = 404, description = "Loan not found"),
        (status = 409, description = "No penalties to settle")
    )
)]
pub async fn settle_payment(
    State(state): State<crate::AppState>,
    StaffActor(staff_id): StaffActor,
    Path(loan_id): Path<i32>,
    Json(request): Json<SettlePaymentRequest>,
) -> AppResult<(StatusCode, Json<PaymentResponse>)> {
    request
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let payment = state
        .services
        .lending
        .settle_payment(loan_id, &request.or_number, staff_id)
        .await?;

    let message = format!("Payment recorded successfully (OR No. {})", payment.reference);
    Ok((
        StatusCode::CREATED,
        Json(PaymentResponse { message, payment }),
    ))
}

/// Return the book and mark the overdue fine paid in one step
#[utoipa::path(
    post,
    path = "/loans/{id}/return-and-pay",
    tag = "loans",
    params(("id" = i32, Path, description = "Loan ID")),
    responses(
        (status = 200, description = "Book returned and fine settled", body = LoanActionResponse),
        (status = 404, description = "Loan not found"),
        (status = 409, description = "Already returned")
    )
)]
pub async fn return_and_pay(
    State(state): State<crate::AppState>,
    StaffActor(staff_id): StaffActor,
    Path(loan_id): Path<i32>,
) -> AppResult<Json<LoanActionResponse>> {
    let loan = state
        .services
        .lending
        .return_and_pay(loan_id, staff_id)
        .await?;

    Ok(Json(LoanActionResponse {
        status: "returned".to_string(),
        message: "Transaction complete: the book has been returned and the fine marked as paid"
            .to_string(),
        loan,
    }))
}
