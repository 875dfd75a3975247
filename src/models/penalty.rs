//! Penalty and payment models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use super::enums::PenaltyReason;

/// A monetary obligation attached to a loan, keyed by (loan, reason)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Penalty {
    pub id: i32,
    pub loan_id: i32,
    pub reason: PenaltyReason,
    pub amount: Decimal,
    pub is_paid: bool,
    pub created_at: DateTime<Utc>,
}

/// Settlement record; immutable once created
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Payment {
    pub id: i32,
    pub loan_id: i32,
    pub borrower_id: i32,
    pub amount: Decimal,
    pub method: String,
    /// Official receipt number
    pub reference: String,
    pub payment_date: DateTime<Utc>,
}

/// One penalty joined with its settlement state, for the payments ledger view
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PaymentEntry {
    pub loan_id: i32,
    pub borrower_id: i32,
    pub borrower_name: String,
    pub reason: PenaltyReason,
    pub amount: Decimal,
    /// Payment method, or "Unpaid"
    pub method: String,
    /// Settlement date, or "Not Paid"
    pub paid_on: String,
}
