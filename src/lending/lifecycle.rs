//! Loan lifecycle transition table
//!
//! One place decides which staff action is legal in which loan state. The
//! ledger consults this table before touching the database, so the rules are
//! not re-derived per handler.

use crate::models::enums::LoanStatus;

/// Staff actions that move a loan between states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoanAction {
    Return,
    Renew,
    MarkLost,
    MarkDamaged,
    Settle,
}

impl std::fmt::Display for LoanAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            LoanAction::Return => "return",
            LoanAction::Renew => "renew",
            LoanAction::MarkLost => "mark lost",
            LoanAction::MarkDamaged => "mark damaged",
            LoanAction::Settle => "settle",
        };
        write!(f, "{}", label)
    }
}

/// Why a transition was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionRejection {
    /// The loan already ended with a return or settlement
    AlreadyReturned,
    /// The loan is in a terminal loss/damage state the action cannot leave
    Terminal,
}

/// The transition table: current state x action -> next state, or a rejection.
///
/// Invariants encoded here:
/// - Completed is final for every action except settlement: fines on a loan
///   returned late can still be paid at the cashier afterwards.
/// - Return closes any open loan, including Lost/Damaged ones (the copy
///   handling for those is the ledger's concern, not the table's).
/// - Renew only restarts loans that are still circulating.
/// - Loss and damage may be re-marked (e.g. to re-price a lost book).
/// - Settlement always lands on Completed.
pub fn next_status(
    current: LoanStatus,
    action: LoanAction,
) -> Result<LoanStatus, TransitionRejection> {
    use LoanStatus::*;

    match (current, action) {
        (_, LoanAction::Settle) => Ok(Completed),

        (Completed, _) => Err(TransitionRejection::AlreadyReturned),

        (Active | Overdue | Lost | Damaged, LoanAction::Return) => Ok(Completed),

        (Active | Overdue, LoanAction::Renew) => Ok(Active),
        (Lost | Damaged, LoanAction::Renew) => Err(TransitionRejection::Terminal),

        (Active | Overdue | Lost | Damaged, LoanAction::MarkLost) => Ok(Lost),
        (Active | Overdue | Lost | Damaged, LoanAction::MarkDamaged) => Ok(Damaged),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use LoanStatus::*;

    #[test]
    fn completed_is_final_except_for_settlement() {
        for action in [
            LoanAction::Return,
            LoanAction::Renew,
            LoanAction::MarkLost,
            LoanAction::MarkDamaged,
        ] {
            assert_eq!(
                next_status(Completed, action),
                Err(TransitionRejection::AlreadyReturned)
            );
        }
        // A late return may leave unpaid fines behind; the cashier can still
        // settle them.
        assert_eq!(next_status(Completed, LoanAction::Settle), Ok(Completed));
    }

    #[test]
    fn return_closes_open_loans() {
        for from in [Active, Overdue, Lost, Damaged] {
            assert_eq!(next_status(from, LoanAction::Return), Ok(Completed));
        }
    }

    #[test]
    fn renew_only_from_circulation() {
        assert_eq!(next_status(Active, LoanAction::Renew), Ok(Active));
        assert_eq!(next_status(Overdue, LoanAction::Renew), Ok(Active));
        assert_eq!(
            next_status(Lost, LoanAction::Renew),
            Err(TransitionRejection::Terminal)
        );
        assert_eq!(
            next_status(Damaged, LoanAction::Renew),
            Err(TransitionRejection::Terminal)
        );
    }

    #[test]
    fn loss_and_damage_can_be_remarked() {
        assert_eq!(next_status(Lost, LoanAction::MarkLost), Ok(Lost));
        assert_eq!(next_status(Damaged, LoanAction::MarkLost), Ok(Lost));
        assert_eq!(next_status(Lost, LoanAction::MarkDamaged), Ok(Damaged));
    }

    #[test]
    fn settlement_completes_open_loans() {
        for from in [Active, Overdue, Lost, Damaged] {
            assert_eq!(next_status(from, LoanAction::Settle), Ok(Completed));
        }
    }
}
