//! Loans repository for database operations
//!
//! All multi-row mutations (issuance, return, renewal, loss marking) run in a
//! single transaction so a loan and its copy can never disagree on disk.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Pool, Postgres, Row};

use crate::{
    error::{AppError, AppResult},
    models::{
        book::Book,
        enums::{CopyStatus, LoanStatus, PenaltyReason},
        loan::{IssuedCopy, Loan, LoanDetails, LoanQuery},
        penalty::Penalty,
    },
};

#[derive(Clone)]
pub struct LoansRepository {
    pool: Pool<Postgres>,
}

impl LoansRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get loan by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Loan> {
        sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Loan with id {} not found", id)))
    }

    /// Get the book a loan's copy belongs to (for market-price lookups and
    /// reminder emails)
    pub async fn get_book_for_loan(&self, loan_id: i32) -> AppResult<Book> {
        sqlx::query_as::<_, Book>(
            r#"
            SELECT b.*
            FROM loans l
            JOIN copies c ON l.copy_id = c.id
            JOIN books b ON c.book_id = b.id
            WHERE l.id = $1
            "#,
        )
        .bind(loan_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Book for loan {} not found", loan_id)))
    }

    /// Count loans the borrower currently holds in Active state.
    ///
    /// Overdue loans are deliberately not counted; a borrower past due can
    /// still be issued books until the cap on Active loans is hit.
    pub async fn count_active_for_borrower(&self, borrower_id: i32) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM loans WHERE borrower_id = $1 AND status = 'Active' AND return_date IS NULL",
        )
        .bind(borrower_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    /// Count the borrower's historical lost/damaged loans (renewal strikes)
    pub async fn count_lost_damaged_for_borrower(&self, borrower_id: i32) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM loans WHERE borrower_id = $1 AND status IN ('Lost', 'Damaged')",
        )
        .bind(borrower_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    /// Does the borrower already hold an unreturned loan of this book, via any
    /// of its copies?
    pub async fn has_unreturned_loan_of_book(
        &self,
        borrower_id: i32,
        book_id: i32,
    ) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM loans l
                JOIN copies c ON l.copy_id = c.id
                WHERE l.borrower_id = $1 AND c.book_id = $2 AND l.return_date IS NULL
            )
            "#,
        )
        .bind(borrower_id)
        .bind(book_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    /// Issue one copy of each requested book in a single transaction.
    ///
    /// All-or-nothing: if any book has no available copy the whole issuance
    /// rolls back.
    pub async fn issue_books(
        &self,
        borrower_id: i32,
        book_ids: &[i32],
        due_date: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<IssuedCopy>> {
        let mut tx = self.pool.begin().await?;
        let mut issued = Vec::with_capacity(book_ids.len());

        for &book_id in book_ids {
            let copy_row = sqlx::query(
                r#"
                SELECT c.id, c.copy_number, b.title
                FROM copies c
                JOIN books b ON c.book_id = b.id
                WHERE c.book_id = $1 AND c.status = 'Available'
                ORDER BY c.id
                LIMIT 1
                "#,
            )
            .bind(book_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| {
                AppError::Policy(format!("No available copies for book id {}", book_id))
            })?;

            let copy_id: i32 = copy_row.get("id");

            let loan_id: i32 = sqlx::query_scalar(
                r#"
                INSERT INTO loans (borrower_id, copy_id, transaction_date, due_date, status)
                VALUES ($1, $2, $3, $4, 'Active')
                RETURNING id
                "#,
            )
            .bind(borrower_id)
            .bind(copy_id)
            .bind(now)
            .bind(due_date)
            .fetch_one(&mut *tx)
            .await?;

            sqlx::query("UPDATE copies SET status = 'Borrowed', updated_at = $1 WHERE id = $2")
                .bind(now)
                .bind(copy_id)
                .execute(&mut *tx)
                .await?;

            issued.push(IssuedCopy {
                loan_id,
                book_id,
                book_title: copy_row.get("title"),
                copy_number: copy_row.get("copy_number"),
            });
        }

        tx.commit().await?;
        Ok(issued)
    }

    /// Close a loan as returned. The copy is released back to Available only
    /// when `release_copy` is set; loans with open loss/damage penalties leave
    /// the copy in its Lost/Damaged state for a later restore.
    pub async fn apply_return(
        &self,
        loan: &Loan,
        now: DateTime<Utc>,
        release_copy: bool,
    ) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "UPDATE loans SET return_date = $1, status = 'Completed' WHERE id = $2",
        )
        .bind(now)
        .bind(loan.id)
        .execute(&mut *tx)
        .await?;

        if release_copy {
            sqlx::query("UPDATE copies SET status = 'Available', updated_at = $1 WHERE id = $2")
                .bind(now)
                .bind(loan.copy_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Overdue-desk shortcut: return the copy and mark the accrued overdue
    /// fine paid in place, without recording a cashier payment.
    pub async fn return_and_pay(&self, loan: &Loan, now: DateTime<Utc>) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "UPDATE loans SET return_date = $1, status = 'Completed' WHERE id = $2",
        )
        .bind(now)
        .bind(loan.id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("UPDATE copies SET status = 'Available', updated_at = $1 WHERE id = $2")
            .bind(now)
            .bind(loan.copy_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("UPDATE penalties SET is_paid = TRUE WHERE loan_id = $1 AND reason = 'Overdue'")
            .bind(loan.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Restart a loan with a fresh due date
    pub async fn apply_renewal(
        &self,
        loan: &Loan,
        new_due_date: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "UPDATE loans SET due_date = $1, return_date = NULL, status = 'Active' WHERE id = $2",
        )
        .bind(new_due_date)
        .bind(loan.id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("UPDATE copies SET status = 'Borrowed', updated_at = $1 WHERE id = $2")
            .bind(now)
            .bind(loan.copy_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Move a loan (and its copy) into Lost or Damaged and upsert the matching
    /// penalty. Re-marking overwrites the amount and reopens the penalty.
    pub async fn apply_loss(
        &self,
        loan: &Loan,
        loan_status: LoanStatus,
        copy_status: CopyStatus,
        reason: PenaltyReason,
        amount: Decimal,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE loans SET status = $1 WHERE id = $2")
            .bind(loan_status)
            .bind(loan.id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("UPDATE copies SET status = $1, updated_at = $2 WHERE id = $3")
            .bind(copy_status)
            .bind(now)
            .bind(loan.copy_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO penalties (loan_id, reason, amount, is_paid, created_at)
            VALUES ($1, $2, $3, FALSE, $4)
            ON CONFLICT (loan_id, reason)
            DO UPDATE SET amount = EXCLUDED.amount, is_paid = FALSE
            "#,
        )
        .bind(loan.id)
        .bind(reason)
        .bind(amount)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Get one loan with book, borrower and penalty context
    pub async fn get_details(&self, loan_id: i32) -> AppResult<LoanDetails> {
        let row = sqlx::query(&format!("{} WHERE l.id = $1", DETAILS_SELECT))
            .bind(loan_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Loan with id {} not found", loan_id)))?;

        let penalties = self.penalties_for_loans(&[loan_id]).await?;
        Ok(details_from_row(&row, penalties))
    }

    /// List loans with optional status filter, free-text search and pagination
    pub async fn list(&self, query: &LoanQuery) -> AppResult<(Vec<LoanDetails>, i64)> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query.per_page.unwrap_or(10).clamp(1, 100);
        let search = query.search.as_deref().filter(|s| !s.is_empty());

        let filter = r#"
            WHERE ($1::loan_status IS NULL OR l.status = $1)
              AND ($2::text IS NULL
                   OR b.title ILIKE '%' || $2 || '%'
                   OR u.name ILIKE '%' || $2 || '%'
                   OR pay.reference ILIKE '%' || $2 || '%')
        "#;

        let total: i64 = sqlx::query_scalar(&format!(
            r#"
            SELECT COUNT(*)
            FROM loans l
            JOIN copies c ON l.copy_id = c.id
            JOIN books b ON c.book_id = b.id
            JOIN users u ON l.borrower_id = u.id
            LEFT JOIN payments pay ON pay.loan_id = l.id
            {}
            "#,
            filter
        ))
        .bind(query.status)
        .bind(search)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query(&format!(
            "{} {} ORDER BY l.transaction_date DESC LIMIT $3 OFFSET $4",
            DETAILS_SELECT, filter
        ))
        .bind(query.status)
        .bind(search)
        .bind(per_page)
        .bind((page - 1) * per_page)
        .fetch_all(&self.pool)
        .await?;

        let loan_ids: Vec<i32> = rows.iter().map(|r| r.get("id")).collect();
        let penalties = self.penalties_for_loans(&loan_ids).await?;

        let details = rows
            .iter()
            .map(|row| {
                let id: i32 = row.get("id");
                let loan_penalties: Vec<Penalty> = penalties
                    .iter()
                    .filter(|p| p.loan_id == id)
                    .cloned()
                    .collect();
                details_from_row(row, loan_penalties)
            })
            .collect();

        Ok((details, total))
    }

    async fn penalties_for_loans(&self, loan_ids: &[i32]) -> AppResult<Vec<Penalty>> {
        if loan_ids.is_empty() {
            return Ok(Vec::new());
        }
        let penalties = sqlx::query_as::<_, Penalty>(
            "SELECT * FROM penalties WHERE loan_id = ANY($1) ORDER BY created_at",
        )
        .bind(loan_ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(penalties)
    }
}

const DETAILS_SELECT: &str = r#"
    SELECT l.id, l.borrower_id, l.transaction_date, l.due_date, l.return_date, l.status,
           b.title as book_title, c.copy_number, c.status as copy_status,
           u.name as borrower_name, pay.reference as or_number
    FROM loans l
    JOIN copies c ON l.copy_id = c.id
    JOIN books b ON c.book_id = b.id
    JOIN users u ON l.borrower_id = u.id
    LEFT JOIN payments pay ON pay.loan_id = l.id
"#;

fn details_from_row(row: &sqlx::postgres::PgRow, penalties: Vec<Penalty>) -> LoanDetails {
    let total_penalties = penalties.iter().map(|p| p.amount).sum();
    let payment_status = payment_status_label(&penalties);

    LoanDetails {
        id: row.get("id"),
        book_title: row.get("book_title"),
        copy_number: row.get("copy_number"),
        borrower_id: row.get("borrower_id"),
        borrower_name: row.get("borrower_name"),
        transaction_date: row.get("transaction_date"),
        due_date: row.get("due_date"),
        return_date: row.get("return_date"),
        status: row.get("status"),
        copy_status: row.get("copy_status"),
        total_penalties,
        penalties,
        payment_status,
        or_number: row.get("or_number"),
    }
}

fn payment_status_label(penalties: &[Penalty]) -> String {
    if penalties.is_empty() || penalties.iter().all(|p| !p.is_paid) {
        "Unpaid".to_string()
    } else if penalties.iter().all(|p| p.is_paid) {
        "Fully Paid".to_string()
    } else {
        "Partially Paid".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::payment_status_label;
    use crate::models::enums::PenaltyReason;
    use crate::models::penalty::Penalty;
    use chrono::Utc;
    use rust_decimal::Decimal;

    fn penalty(reason: PenaltyReason, amount: i64, is_paid: bool) -> Penalty {
        Penalty {
            id: 0,
            loan_id: 1,
            reason,
            amount: Decimal::from(amount),
            is_paid,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn payment_status_labels() {
        assert_eq!(payment_status_label(&[]), "Unpaid");
        assert_eq!(
            payment_status_label(&[penalty(PenaltyReason::Overdue, 100, false)]),
            "Unpaid"
        );
        assert_eq!(
            payment_status_label(&[
                penalty(PenaltyReason::Overdue, 100, true),
                penalty(PenaltyReason::Damaged, 300, false)
            ]),
            "Partially Paid"
        );
        assert_eq!(
            payment_status_label(&[penalty(PenaltyReason::Overdue, 100, true)]),
            "Fully Paid"
        );
    }
}
