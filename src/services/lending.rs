//! Loan ledger service
//!
//! The sole authority for moving a loan between states. Every mutation
//! consults the lifecycle transition table, keeps the copy status mirrored,
//! and leaves an audit entry.

use std::sync::Arc;

use chrono::Duration;
use rust_decimal::Decimal;

use crate::{
    config::LendingConfig,
    error::{AppError, AppResult},
    lending::{fines, lifecycle, Clock, LoanAction, TransitionRejection},
    models::{
        enums::{CopyStatus, LoanStatus, PenaltyReason},
        loan::{IssueLoans, IssueOutcome, LoanDetails},
        penalty::Payment,
    },
    repository::Repository,
    services::{audit::AuditService, market_price::MarketPriceResolver},
};

/// Everything needed to address and fill an overdue reminder email
#[derive(Debug, Clone)]
pub struct ReminderData {
    pub email: String,
    pub borrower_name: String,
    pub overdue_books: Vec<String>,
    pub penalty: Option<Decimal>,
}

#[derive(Clone)]
pub struct LendingService {
    repository: Repository,
    audit: AuditService,
    market_price: Arc<dyn MarketPriceResolver>,
    clock: Arc<dyn Clock>,
    config: LendingConfig,
}

impl LendingService {
    pub fn new(
        repository: Repository,
        audit: AuditService,
        market_price: Arc<dyn MarketPriceResolver>,
        clock: Arc<dyn Clock>,
        config: LendingConfig,
    ) -> Self {
        Self {
            repository,
            audit,
            market_price,
            clock,
            config,
        }
    }

    /// List loans with optional status filter, search and pagination
    pub async fn list_loans(
        &self,
        query: &crate::models::loan::LoanQuery,
    ) -> AppResult<(Vec<LoanDetails>, i64)> {
        self.repository.loans.list(query).await
    }

    /// Get one loan with penalties and payment state
    pub async fn get_loan_details(&self, loan_id: i32) -> AppResult<LoanDetails> {
        self.repository.loans.get_details(loan_id).await
    }

    /// List overdue records still past due
    pub async fn list_overdues(
        &self,
        query: &crate::models::overdue::OverdueQuery,
    ) -> AppResult<(Vec<crate::models::overdue::OverdueDetails>, i64)> {
        self.repository.overdues.list(query, self.clock.now()).await
    }

    /// List penalties joined with their settlement state
    pub async fn list_payments(
        &self,
        page: i64,
        per_page: i64,
    ) -> AppResult<(Vec<crate::models::penalty::PaymentEntry>, i64)> {
        self.repository.penalties.list_payments(page, per_page).await
    }

    /// Issue one copy of each requested book to a borrower.
    ///
    /// Checks, in order: due date not in the past, borrower active, borrowing
    /// limit, duplicate-book rule per requested book. All copies issue in one
    /// transaction.
    pub async fn issue(&self, request: IssueLoans, staff_id: i32) -> AppResult<IssueOutcome> {
        if request.book_ids.is_empty() {
            return Err(AppError::Validation(
                "Select a borrower and at least one book".to_string(),
            ));
        }

        let now = self.clock.now();
        if request.due_date.date_naive() < now.date_naive() {
            return Err(AppError::Validation(
                "Due date cannot be earlier than today".to_string(),
            ));
        }

        let borrower = self.repository.users.get_by_id(request.borrower_id).await?;
        if !borrower.can_borrow() {
            return Err(AppError::Validation(
                "Invalid borrower: account is not active".to_string(),
            ));
        }

        let active = self
            .repository
            .loans
            .count_active_for_borrower(borrower.id)
            .await?;
        let requested = request.book_ids.len() as i64;
        if !fines::within_limit(active, requested, self.config.max_active_loans) {
            return Err(AppError::Policy(format!(
                "Borrowing limit reached: a borrower can only have {} active borrowed book(s)",
                self.config.max_active_loans
            )));
        }

        for &book_id in &request.book_ids {
            if self
                .repository
                .loans
                .has_unreturned_loan_of_book(borrower.id, book_id)
                .await?
            {
                return Err(AppError::Policy(format!(
                    "The borrower already has a borrowed copy of this book (book id {})",
                    book_id
                )));
            }
        }

        let issued = self
            .repository
            .loans
            .issue_books(borrower.id, &request.book_ids, request.due_date, now)
            .await?;

        let titles: Vec<String> = issued
            .iter()
            .map(|c| format!("'{}' (Copy #{})", c.book_title, c.copy_number))
            .collect();
        self.audit
            .log_action(
                staff_id,
                "New Transaction",
                &format!(
                    "Issued {} to {}. Due date: {}.",
                    titles.join(", "),
                    borrower.name,
                    request.due_date.format("%B %d, %Y")
                ),
            )
            .await;

        Ok(IssueOutcome {
            active_loans: active + issued.len() as i64,
            borrower_name: borrower.name,
            issued,
        })
    }

    /// Return a borrowed copy.
    ///
    /// The copy goes back to Available unless an unpaid Lost/Damaged penalty
    /// keeps it off the shelf until a separate restore.
    pub async fn return_loan(&self, loan_id: i32, staff_id: i32) -> AppResult<LoanDetails> {
        let loan = self.repository.loans.get_by_id(loan_id).await?;
        self.check_transition(&loan, LoanAction::Return)?;

        let release_copy = !self
            .repository
            .penalties
            .has_open_loss_damage(loan.id)
            .await?;

        let now = self.clock.now();
        self.repository
            .loans
            .apply_return(&loan, now, release_copy)
            .await?;

        let details = self.repository.loans.get_details(loan_id).await?;
        self.audit
            .log_action(
                staff_id,
                "Book Return",
                &format!(
                    "Returned '{}' (Copy #{}) for {}.",
                    details.book_title, details.copy_number, details.borrower_name
                ),
            )
            .await;

        Ok(details)
    }

    /// Renew a loan for the standing renewal period.
    ///
    /// A renewal attempted after the due date is cancelled outright, and
    /// borrowers with too many lost/damaged loans on record may not renew.
    pub async fn renew(&self, loan_id: i32, staff_id: i32) -> AppResult<LoanDetails> {
        let loan = self.repository.loans.get_by_id(loan_id).await?;
        self.check_transition(&loan, LoanAction::Renew)?;

        let now = self.clock.now();
        if loan.due_date < now {
            return Err(AppError::Policy(
                "The loan is overdue; the renewal has been cancelled".to_string(),
            ));
        }

        let strikes = self
            .repository
            .loans
            .count_lost_damaged_for_borrower(loan.borrower_id)
            .await?;
        if strikes >= self.config.max_lost_damaged_strikes {
            return Err(AppError::Policy(format!(
                "Renewal refused: the borrower has {} lost or damaged books on record",
                strikes
            )));
        }

        let new_due_date = now + Duration::days(self.config.renewal_period_days);
        self.repository
            .loans
            .apply_renewal(&loan, new_due_date, now)
            .await?;

        let details = self.repository.loans.get_details(loan_id).await?;
        self.audit
            .log_action(
                staff_id,
                "Book Renew",
                &format!(
                    "Renewed '{}' (Copy #{}) for {} until {}.",
                    details.book_title,
                    details.copy_number,
                    details.borrower_name,
                    new_due_date.format("%B %d, %Y")
                ),
            )
            .await;

        Ok(details)
    }

    /// Mark a loan's copy as lost and charge the replacement penalty.
    ///
    /// The amount comes from the caller when staff entered one manually,
    /// otherwise from the market-price lookup; with neither, the caller is
    /// told to supply one.
    pub async fn mark_lost(
        &self,
        loan_id: i32,
        manual_amount: Option<Decimal>,
        staff_id: i32,
    ) -> AppResult<LoanDetails> {
        let loan = self.repository.loans.get_by_id(loan_id).await?;
        self.check_transition(&loan, LoanAction::MarkLost)?;

        let book = self.repository.loans.get_book_for_loan(loan_id).await?;
        let amount = resolve_lost_amount(
            manual_amount,
            book.isbn.as_deref(),
            self.market_price.as_ref(),
        )
        .await?;

        let now = self.clock.now();
        self.repository
            .loans
            .apply_loss(
                &loan,
                LoanStatus::Lost,
                CopyStatus::Lost,
                PenaltyReason::Lost,
                amount,
                now,
            )
            .await?;

        let details = self.repository.loans.get_details(loan_id).await?;
        self.audit
            .log_action(
                staff_id,
                "Book Marked as Lost",
                &format!(
                    "Marked '{}' (Copy #{}) as lost for {}. Penalty {:.2} applied.",
                    details.book_title, details.copy_number, details.borrower_name, amount
                ),
            )
            .await;

        Ok(details)
    }

    /// Mark a loan's copy as damaged and charge the flat damage penalty
    pub async fn mark_damaged(&self, loan_id: i32, staff_id: i32) -> AppResult<LoanDetails> {
        let loan = self.repository.loans.get_by_id(loan_id).await?;
        self.check_transition(&loan, LoanAction::MarkDamaged)?;

        let amount = Decimal::from(self.config.damage_fine);
        let now = self.clock.now();
        self.repository
            .loans
            .apply_loss(
                &loan,
                LoanStatus::Damaged,
                CopyStatus::Damaged,
                PenaltyReason::Damaged,
                amount,
                now,
            )
            .await?;

        let details = self.repository.loans.get_details(loan_id).await?;
        self.audit
            .log_action(
                staff_id,
                "Book Marked as Damaged",
                &format!(
                    "Marked '{}' (Copy #{}) as damaged for {}. Penalty {:.2} applied.",
                    details.book_title, details.copy_number, details.borrower_name, amount
                ),
            )
            .await;

        Ok(details)
    }

    /// Settle every penalty on a loan against one cashier payment.
    ///
    /// The loan completes; the copy is released only when no loss/damage
    /// penalty exists on it.
    pub async fn settle_payment(
        &self,
        loan_id: i32,
        reference: &str,
        staff_id: i32,
    ) -> AppResult<Payment> {
        if reference.trim().is_empty() {
            return Err(AppError::Validation(
                "An official receipt number is required".to_string(),
            ));
        }

        let loan = self.repository.loans.get_by_id(loan_id).await?;
        self.check_transition(&loan, LoanAction::Settle)?;

        let penalties = self.repository.penalties.list_for_loan(loan_id).await?;
        if penalties.is_empty() {
            return Err(AppError::Conflict(format!(
                "Loan {} has no penalties to settle",
                loan_id
            )));
        }

        let total: Decimal = penalties.iter().map(|p| p.amount).sum();
        let release_copy = !penalties
            .iter()
            .any(|p| matches!(p.reason, PenaltyReason::Lost | PenaltyReason::Damaged));

        let now = self.clock.now();
        let payment = self
            .repository
            .penalties
            .settle(&loan, total, reference, release_copy, now)
            .await?;

        self.audit
            .log_action(
                staff_id,
                "Payment Recorded",
                &format!(
                    "Recorded payment for loan #{} with OR No. {} ({:.2}).",
                    loan_id, reference, total
                ),
            )
            .await;

        Ok(payment)
    }

    /// Overdue-desk shortcut: return the copy and mark the accrued overdue
    /// fine paid in one step, without a cashier payment record.
    pub async fn return_and_pay(&self, loan_id: i32, staff_id: i32) -> AppResult<LoanDetails> {
        let loan = self.repository.loans.get_by_id(loan_id).await?;
        self.check_transition(&loan, LoanAction::Return)?;

        let now = self.clock.now();
        self.repository.loans.return_and_pay(&loan, now).await?;

        let details = self.repository.loans.get_details(loan_id).await?;
        self.audit
            .log_action(
                staff_id,
                "Book Return",
                &format!(
                    "Returned '{}' (Copy #{}) with the overdue fine marked paid for {}.",
                    details.book_title, details.copy_number, details.borrower_name
                ),
            )
            .await;

        Ok(details)
    }

    /// Everything the overdue reminder email needs for one loan.
    ///
    /// Fails with NotFound when the loan has no overdue record; a reminder
    /// only makes sense for a loan the scanner has promoted.
    pub async fn overdue_reminder_data(&self, loan_id: i32) -> AppResult<ReminderData> {
        let details = self.repository.loans.get_details(loan_id).await?;
        self.repository
            .overdues
            .get_for_loan(loan_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("No overdue record for loan {}", loan_id))
            })?;

        let borrower = self.repository.users.get_by_id(details.borrower_id).await?;
        let penalty = details
            .penalties
            .iter()
            .find(|p| p.reason == PenaltyReason::Overdue)
            .map(|p| p.amount);

        Ok(ReminderData {
            email: borrower.email,
            borrower_name: details.borrower_name.clone(),
            overdue_books: vec![format!(
                "{} - due on {}",
                details.book_title,
                details.due_date.format("%B %d, %Y")
            )],
            penalty,
        })
    }

    fn check_transition(
        &self,
        loan: &crate::models::Loan,
        action: LoanAction,
    ) -> AppResult<()> {
        match lifecycle::next_status(loan.status, action) {
            Ok(_) => Ok(()),
            Err(TransitionRejection::AlreadyReturned) => Err(AppError::Conflict(format!(
                "Cannot {} loan {}: the book has already been returned",
                action, loan.id
            ))),
            Err(TransitionRejection::Terminal) => Err(AppError::Conflict(format!(
                "Cannot {} loan {}: the loan is in a terminal {} state",
                action, loan.id, loan.status
            ))),
        }
    }
}

/// Resolve the penalty amount for a lost book: manual entry wins, then the
/// market price by ISBN; with neither, the caller must supply an amount.
async fn resolve_lost_amount(
    manual_amount: Option<Decimal>,
    isbn: Option<&str>,
    resolver: &dyn MarketPriceResolver,
) -> AppResult<Decimal> {
    if let Some(amount) = manual_amount {
        if amount <= Decimal::ZERO {
            return Err(AppError::Validation(
                "Penalty amount must be positive".to_string(),
            ));
        }
        return Ok(amount);
    }

    if let Some(isbn) = isbn {
        match resolver.price_for_isbn(isbn).await {
            Ok(Some(price)) => return Ok(price),
            Ok(None) => {}
            Err(e) => {
                tracing::warn!("Market price lookup failed for ISBN {}: {}", isbn, e);
            }
        }
    }

    Err(AppError::Validation(
        "Market price could not be resolved; a manual penalty amount is required".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::market_price::MockMarketPriceResolver;

    #[tokio::test]
    async fn manual_amount_wins_over_lookup() {
        let mut resolver = MockMarketPriceResolver::new();
        resolver.expect_price_for_isbn().never();

        let amount = resolve_lost_amount(
            Some(Decimal::from(450)),
            Some("978-0000000000"),
            &resolver,
        )
        .await
        .unwrap();
        assert_eq!(amount, Decimal::from(450));
    }

    #[tokio::test]
    async fn market_price_used_when_no_manual_amount() {
        let mut resolver = MockMarketPriceResolver::new();
        resolver
            .expect_price_for_isbn()
            .returning(|_| Ok(Some(Decimal::from(725))));

        let amount = resolve_lost_amount(None, Some("978-0000000000"), &resolver)
            .await
            .unwrap();
        assert_eq!(amount, Decimal::from(725));
    }

    #[tokio::test]
    async fn unresolved_price_requires_manual_entry() {
        let mut resolver = MockMarketPriceResolver::new();
        resolver.expect_price_for_isbn().returning(|_| Ok(None));

        let result = resolve_lost_amount(None, Some("978-0000000000"), &resolver).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn missing_isbn_requires_manual_entry() {
        let resolver = MockMarketPriceResolver::new();
        let result = resolve_lost_amount(None, None, &resolver).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn lookup_failure_falls_back_to_manual_entry() {
        let mut resolver = MockMarketPriceResolver::new();
        resolver
            .expect_price_for_isbn()
            .returning(|_| Err(AppError::Upstream("listing API down".to_string())));

        let result = resolve_lost_amount(None, Some("978-0000000000"), &resolver).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn non_positive_manual_amount_rejected() {
        let resolver = MockMarketPriceResolver::new();
        let result = resolve_lost_amount(Some(Decimal::ZERO), None, &resolver).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
