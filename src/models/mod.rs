//! Data models for ShelfMaster

pub mod book;
pub mod copy;
pub mod enums;
pub mod loan;
pub mod overdue;
pub mod penalty;
pub mod user;

// Re-export commonly used types
pub use book::Book;
pub use copy::BookCopy;
pub use enums::{CopyStatus, LoanStatus, PenaltyReason, UserStatus};
pub use loan::{Loan, LoanDetails};
pub use overdue::Overdue;
pub use penalty::{Payment, Penalty};
pub use user::User;
