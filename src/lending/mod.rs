//! Pure lending domain logic
//!
//! Everything here is side-effect free: the loan lifecycle transition table,
//! the fine accrual policy, and the clock abstraction that keeps date
//! arithmetic deterministic under test. The service layer owns all I/O.

pub mod clock;
pub mod fines;
pub mod lifecycle;

pub use clock::{Clock, SystemClock};
pub use lifecycle::{next_status, LoanAction, TransitionRejection};
