//! Shared domain enums
//!
//! Loan, copy and penalty statuses are closed enumerations mapped onto
//! Postgres enum types, so every status comparison in the codebase is an
//! exhaustive match rather than a string equality.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::ToSchema;

// ---------------------------------------------------------------------------
// LoanStatus
// ---------------------------------------------------------------------------

/// Lifecycle state of a loan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "loan_status")]
pub enum LoanStatus {
    /// Copy is out with the borrower, due date not yet breached
    Active,
    /// Promoted by the overdue scanner once the due date + grace has elapsed
    Overdue,
    /// Returned, or closed through settlement
    Completed,
    Lost,
    Damaged,
}

impl LoanStatus {
    /// Terminal states cannot be renewed
    pub fn is_terminal(&self) -> bool {
        matches!(self, LoanStatus::Completed | LoanStatus::Lost | LoanStatus::Damaged)
    }
}

impl FromStr for LoanStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Active" => Ok(LoanStatus::Active),
            "Overdue" => Ok(LoanStatus::Overdue),
            "Completed" => Ok(LoanStatus::Completed),
            "Lost" => Ok(LoanStatus::Lost),
            "Damaged" => Ok(LoanStatus::Damaged),
            other => Err(format!("unknown loan status: {}", other)),
        }
    }
}

impl std::fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            LoanStatus::Active => "Active",
            LoanStatus::Overdue => "Overdue",
            LoanStatus::Completed => "Completed",
            LoanStatus::Lost => "Lost",
            LoanStatus::Damaged => "Damaged",
        };
        write!(f, "{}", label)
    }
}

// ---------------------------------------------------------------------------
// CopyStatus
// ---------------------------------------------------------------------------

/// Shelf state of a physical copy, mirrored from its most recent open loan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "copy_status")]
pub enum CopyStatus {
    Available,
    Borrowed,
    Overdue,
    Lost,
    Damaged,
    Archived,
}

impl FromStr for CopyStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Available" => Ok(CopyStatus::Available),
            "Borrowed" => Ok(CopyStatus::Borrowed),
            "Overdue" => Ok(CopyStatus::Overdue),
            "Lost" => Ok(CopyStatus::Lost),
            "Damaged" => Ok(CopyStatus::Damaged),
            "Archived" => Ok(CopyStatus::Archived),
            other => Err(format!("unknown copy status: {}", other)),
        }
    }
}

impl std::fmt::Display for CopyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            CopyStatus::Available => "Available",
            CopyStatus::Borrowed => "Borrowed",
            CopyStatus::Overdue => "Overdue",
            CopyStatus::Lost => "Lost",
            CopyStatus::Damaged => "Damaged",
            CopyStatus::Archived => "Archived",
        };
        write!(f, "{}", label)
    }
}

// ---------------------------------------------------------------------------
// PenaltyReason
// ---------------------------------------------------------------------------

/// Why a penalty was charged; at most one penalty per reason per loan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "penalty_reason")]
pub enum PenaltyReason {
    Overdue,
    Lost,
    Damaged,
}

impl std::fmt::Display for PenaltyReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            PenaltyReason::Overdue => "Overdue",
            PenaltyReason::Lost => "Lost",
            PenaltyReason::Damaged => "Damaged",
        };
        write!(f, "{}", label)
    }
}

// ---------------------------------------------------------------------------
// UserStatus
// ---------------------------------------------------------------------------

/// Account status codes (stored in users.status)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[repr(i16)]
pub enum UserStatus {
    Inactive = 0,
    Active = 1,
    Suspended = 2,
}

impl From<i16> for UserStatus {
    fn from(v: i16) -> Self {
        match v {
            1 => UserStatus::Active,
            2 => UserStatus::Suspended,
            _ => UserStatus::Inactive,
        }
    }
}

impl From<UserStatus> for i16 {
    fn from(s: UserStatus) -> Self {
        s as i16
    }
}

impl std::fmt::Display for UserStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            UserStatus::Inactive => "Inactive",
            UserStatus::Active => "Active",
            UserStatus::Suspended => "Suspended",
        };
        write!(f, "{}", label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loan_status_round_trips_through_display() {
        for status in [
            LoanStatus::Active,
            LoanStatus::Overdue,
            LoanStatus::Completed,
            LoanStatus::Lost,
            LoanStatus::Damaged,
        ] {
            assert_eq!(status.to_string().parse::<LoanStatus>(), Ok(status));
        }
    }

    #[test]
    fn copy_status_rejects_unknown_labels() {
        assert!("Misplaced".parse::<CopyStatus>().is_err());
    }

    #[test]
    fn terminal_statuses() {
        assert!(LoanStatus::Completed.is_terminal());
        assert!(LoanStatus::Lost.is_terminal());
        assert!(LoanStatus::Damaged.is_terminal());
        assert!(!LoanStatus::Active.is_terminal());
        assert!(!LoanStatus::Overdue.is_terminal());
    }
}
