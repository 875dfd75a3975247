//! Loan (borrowing transaction) model and related types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

use super::enums::{CopyStatus, LoanStatus};
use super::penalty::Penalty;

/// Loan model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Loan {
    pub id: i32,
    pub borrower_id: i32,
    pub copy_id: i32,
    pub transaction_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub return_date: Option<DateTime<Utc>>,
    pub status: LoanStatus,
}

impl Loan {
    pub fn is_returned(&self) -> bool {
        self.return_date.is_some()
    }
}

/// Loan with full details for display
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoanDetails {
    pub id: i32,
    pub book_title: String,
    pub copy_number: String,
    pub borrower_id: i32,
    pub borrower_name: String,
    pub transaction_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub return_date: Option<DateTime<Utc>>,
    pub status: LoanStatus,
    pub copy_status: CopyStatus,
    /// Sum of all penalty amounts charged against this loan
    pub total_penalties: Decimal,
    pub penalties: Vec<Penalty>,
    /// "Fully Paid", "Partially Paid" or "Unpaid"
    pub payment_status: String,
    /// Official receipt number, when a cashier payment exists
    pub or_number: Option<String>,
}

/// Issue request passed to the ledger
#[derive(Debug, Clone)]
pub struct IssueLoans {
    pub borrower_id: i32,
    pub book_ids: Vec<i32>,
    pub due_date: DateTime<Utc>,
}

/// One successfully issued copy, echoed back to the caller
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct IssuedCopy {
    pub loan_id: i32,
    pub book_id: i32,
    pub book_title: String,
    pub copy_number: String,
}

/// Result of a successful issuance, returned to the caller instead of being
/// stashed in ambient request state
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct IssueOutcome {
    pub issued: Vec<IssuedCopy>,
    pub borrower_name: String,
    /// Loans the borrower now holds, including the ones just issued
    pub active_loans: i64,
}

/// Loan list filters
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct LoanQuery {
    /// Filter by loan status
    pub status: Option<LoanStatus>,
    /// Match against book title, borrower name or OR number
    pub search: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}
