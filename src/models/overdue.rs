//! Overdue record model and related types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

use super::enums::LoanStatus;

/// Derived per-loan overdue counter; at most one row per loan, updated in
/// place by the scanner. OverdueDays is always max(1, days since due date).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Overdue {
    pub id: i32,
    pub loan_id: i32,
    pub overdue_days: i32,
    pub created_at: DateTime<Utc>,
}

/// Overdue row joined with loan/book/borrower context for display
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OverdueDetails {
    pub id: i32,
    pub loan_id: i32,
    pub book_title: String,
    pub copy_number: String,
    pub borrower_name: String,
    pub due_date: DateTime<Utc>,
    pub overdue_days: i32,
    /// Accrued overdue fine, when one has been charged
    pub fine_amount: Option<Decimal>,
    pub loan_status: LoanStatus,
}

/// Overdue list filters
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct OverdueQuery {
    /// Match against borrower name, book title or copy number
    pub search: Option<String>,
    /// Only loans due on this date (YYYY-MM-DD)
    pub due_date: Option<String>,
    /// Only loans at least this many days overdue
    pub min_days: Option<i32>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}
