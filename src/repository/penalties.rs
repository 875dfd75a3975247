//! Penalties and payments repository

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Pool, Postgres, Row};

use crate::{
    error::AppResult,
    models::{
        loan::Loan,
        penalty::{Payment, PaymentEntry, Penalty},
    },
};

#[derive(Clone)]
pub struct PenaltiesRepository {
    pool: Pool<Postgres>,
}

impl PenaltiesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// All penalties charged against a loan
    pub async fn list_for_loan(&self, loan_id: i32) -> AppResult<Vec<Penalty>> {
        let penalties = sqlx::query_as::<_, Penalty>(
            "SELECT * FROM penalties WHERE loan_id = $1 ORDER BY created_at",
        )
        .bind(loan_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(penalties)
    }

    /// Is there an unpaid Lost or Damaged penalty on this loan?
    pub async fn has_open_loss_damage(&self, loan_id: i32) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM penalties
                WHERE loan_id = $1 AND reason IN ('Lost', 'Damaged') AND is_paid = FALSE
            )
            "#,
        )
        .bind(loan_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    /// Settle every penalty on a loan against one cashier payment.
    ///
    /// Marks all penalties paid, records the immutable payment row, closes the
    /// loan, and releases the copy unless a loss/damage penalty keeps it off
    /// the shelf. One transaction.
    pub async fn settle(
        &self,
        loan: &Loan,
        total: Decimal,
        reference: &str,
        release_copy: bool,
        now: DateTime<Utc>,
    ) -> AppResult<Payment> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE penalties SET is_paid = TRUE WHERE loan_id = $1")
            .bind(loan.id)
            .execute(&mut *tx)
            .await?;

        let payment = sqlx::query_as::<_, Payment>(
            r#"
            INSERT INTO payments (loan_id, borrower_id, amount, method, reference, payment_date)
            VALUES ($1, $2, $3, 'Cashier', $4, $5)
            RETURNING *
            "#,
        )
        .bind(loan.id)
        .bind(loan.borrower_id)
        .bind(total)
        .bind(reference)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE loans SET status = 'Completed', return_date = $1 WHERE id = $2",
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
        Ok(payment)
    }

    /// Penalties joined with their settlement state, newest first.
    /// Unsettled penalties appear with "Unpaid"/"Not Paid" placeholders.
    pub async fn list_payments(&self, page: i64, per_page: i64) -> AppResult<(Vec<PaymentEntry>, i64)> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM penalties")
            .fetch_one(&self.pool)
            .await?;

        let rows = sqlx::query(
            r#"
            SELECT p.loan_id, p.reason, p.amount,
                   l.borrower_id, u.name as borrower_name,
                   pay.method as method, pay.payment_date
            FROM penalties p
            JOIN loans l ON p.loan_id = l.id
            JOIN users u ON l.borrower_id = u.id
            LEFT JOIN payments pay ON pay.loan_id = p.loan_id
            ORDER BY p.created_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(per_page)
        .bind((page - 1) * per_page)
        .fetch_all(&self.pool)
        .await?;

        let entries = rows
            .iter()
            .map(|row| {
                let method: Option<String> = row.get("method");
                let payment_date: Option<DateTime<Utc>> = row.get("payment_date");
                PaymentEntry {
                    loan_id: row.get("loan_id"),
                    borrower_id: row.get("borrower_id"),
                    borrower_name: row.get("borrower_name"),
                    reason: row.get("reason"),
                    amount: row.get("amount"),
                    method: method.unwrap_or_else(|| "Unpaid".to_string()),
                    paid_on: payment_date
                        .map(|d| d.format("%B %d, %Y").to_string())
                        .unwrap_or_else(|| "Not Paid".to_string()),
                }
            })
            .collect();

        Ok((entries, total))
    }

    /// Outstanding (unpaid) and collected fine totals
    pub async fn fine_totals(&self) -> AppResult<(Decimal, Decimal)> {
        let row = sqlx::query(
            r#"
            SELECT COALESCE(SUM(amount) FILTER (WHERE NOT is_paid), 0) as outstanding,
                   COALESCE(SUM(amount) FILTER (WHERE is_paid), 0) as collected
            FROM penalties
            "#,
        )
        .fetch_one(&self.pool)
        .await?;
        Ok((row.get("outstanding"), row.get("collected")))
    }
}
