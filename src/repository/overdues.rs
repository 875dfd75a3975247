//! Overdues repository: sweep candidate selection and per-loan promotion

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{Pool, Postgres, Row};

use crate::{
    error::AppResult,
    models::{
        copy::BookCopy,
        loan::Loan,
        overdue::{OverdueDetails, OverdueQuery},
    },
};

#[derive(Clone)]
pub struct OverduesRepository {
    pool: Pool<Postgres>,
}

impl OverduesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Loans eligible for promotion: past due by at least `grace_days`, not
    /// returned, and not already in a terminal state.
    pub async fn find_candidates(
        &self,
        now: DateTime<Utc>,
        grace_days: i64,
    ) -> AppResult<Vec<Loan>> {
        let loans = sqlx::query_as::<_, Loan>(
            r#"
            SELECT * FROM loans
            WHERE due_date + $2 * INTERVAL '1 day' <= $1
              AND return_date IS NULL
              AND status NOT IN ('Lost', 'Damaged', 'Completed')
            ORDER BY due_date
            "#,
        )
        .bind(now)
        .bind(grace_days as f64)
        .fetch_all(&self.pool)
        .await?;
        Ok(loans)
    }

    /// Promote one loan to Overdue: flip the loan and its copy, upsert the
    /// overdue-day counter and recompute the overdue fine, all in one
    /// transaction. The penalty's paid flag is never touched here.
    pub async fn promote(
        &self,
        loan: &Loan,
        overdue_days: i64,
        fine_amount: Decimal,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE copies SET status = 'Overdue', updated_at = $1 WHERE id = $2")
            .bind(now)
            .bind(loan.copy_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("UPDATE loans SET status = 'Overdue' WHERE id = $1")
            .bind(loan.id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO overdues (loan_id, overdue_days, created_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (loan_id) DO UPDATE SET overdue_days = EXCLUDED.overdue_days
            "#,
        )
        .bind(loan.id)
        .bind(overdue_days as i32)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO penalties (loan_id, reason, amount, is_paid, created_at)
            VALUES ($1, 'Overdue', $2, FALSE, $3)
            ON CONFLICT (loan_id, reason) DO UPDATE SET amount = EXCLUDED.amount
            "#,
        )
        .bind(loan.id)
        .bind(fine_amount)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// The loan's copy, if the reference still resolves. Promotion skips
    /// loans with a dangling copy reference instead of failing the sweep.
    pub async fn get_copy(&self, copy_id: i32) -> AppResult<Option<BookCopy>> {
        let copy = sqlx::query_as::<_, BookCopy>("SELECT * FROM copies WHERE id = $1")
            .bind(copy_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(copy)
    }

    /// List overdue records still past due, with search and pagination
    pub async fn list(
        &self,
        query: &OverdueQuery,
        now: DateTime<Utc>,
    ) -> AppResult<(Vec<OverdueDetails>, i64)> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query.per_page.unwrap_or(10).clamp(1, 100);
        let search = query.search.as_deref().filter(|s| !s.is_empty());

        // Optional due-date filter, interpreted as a whole calendar day
        let due_range = match query.due_date.as_deref() {
            Some(raw) => {
                let date = raw
                    .parse::<NaiveDate>()
                    .map_err(|_| crate::error::AppError::Validation(
                        format!("Invalid due date filter: {}", raw),
                    ))?;
                let start = date.and_hms_opt(0, 0, 0).unwrap().and_utc();
                Some((start, start + Duration::days(1)))
            }
            None => None,
        };

        let filter = r#"
            WHERE l.due_date < $1
              AND ($2::text IS NULL
                   OR u.name ILIKE '%' || $2 || '%'
                   OR b.title ILIKE '%' || $2 || '%'
                   OR c.copy_number ILIKE '%' || $2 || '%')
              AND ($3::timestamptz IS NULL OR (l.due_date >= $3 AND l.due_date < $4))
              AND ($5::int IS NULL OR o.overdue_days >= $5)
        "#;

        let from = r#"
            FROM overdues o
            JOIN loans l ON o.loan_id = l.id
            JOIN users u ON l.borrower_id = u.id
            JOIN copies c ON l.copy_id = c.id
            JOIN books b ON c.book_id = b.id
        "#;

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) {} {}", from, filter))
            .bind(now)
            .bind(search)
            .bind(due_range.map(|(s, _)| s))
            .bind(due_range.map(|(_, e)| e))
            .bind(query.min_days)
            .fetch_one(&self.pool)
            .await?;

        let rows = sqlx::query(&format!(
            r#"
            SELECT o.id, o.loan_id, o.overdue_days,
                   b.title as book_title, c.copy_number, u.name as borrower_name,
                   l.due_date, l.status as loan_status,
                   (SELECT p.amount FROM penalties p
                    WHERE p.loan_id = l.id AND p.reason = 'Overdue') as fine_amount
            {} {}
            ORDER BY o.overdue_days DESC, l.due_date
            LIMIT $6 OFFSET $7
            "#,
            from, filter
        ))
        .bind(now)
        .bind(search)
        .bind(due_range.map(|(s, _)| s))
        .bind(due_range.map(|(_, e)| e))
        .bind(query.min_days)
        .bind(per_page)
        .bind((page - 1) * per_page)
        .fetch_all(&self.pool)
        .await?;

        let details = rows
            .iter()
            .map(|row| OverdueDetails {
                id: row.get("id"),
                loan_id: row.get("loan_id"),
                book_title: row.get("book_title"),
                copy_number: row.get("copy_number"),
                borrower_name: row.get("borrower_name"),
                due_date: row.get("due_date"),
                overdue_days: row.get("overdue_days"),
                fine_amount: row.get("fine_amount"),
                loan_status: row.get("loan_status"),
            })
            .collect();

        Ok((details, total))
    }

    /// Get the overdue record for a loan, if any
    pub async fn get_for_loan(&self, loan_id: i32) -> AppResult<Option<crate::models::Overdue>> {
        let overdue = sqlx::query_as::<_, crate::models::Overdue>(
            "SELECT * FROM overdues WHERE loan_id = $1",
        )
        .bind(loan_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(overdue)
    }
}
