//! Lending statistics service

use sqlx::Row;

use crate::{api::stats::LendingStats, error::AppResult, repository::Repository};

#[derive(Clone)]
pub struct StatsService {
    repository: Repository,
}

impl StatsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Current lending counts and fine totals
    pub async fn get_lending_stats(&self) -> AppResult<LendingStats> {
        let pool = &self.repository.pool;

        let row = sqlx::query(
            r#"
            SELECT COUNT(*) FILTER (WHERE status = 'Active' AND return_date IS NULL) as active_loans,
                   COUNT(*) FILTER (WHERE status = 'Overdue' AND return_date IS NULL) as overdue_loans,
                   COUNT(*) FILTER (WHERE status = 'Lost') as lost_loans,
                   COUNT(*) FILTER (WHERE status = 'Damaged') as damaged_loans
            FROM loans
            "#,
        )
        .fetch_one(pool)
        .await?;

        let (outstanding_fines, collected_fines) =
            self.repository.penalties.fine_totals().await?;

        Ok(LendingStats {
            active_loans: row.get("active_loans"),
            overdue_loans: row.get("overdue_loans"),
            lost_loans: row.get("lost_loans"),
            damaged_loans: row.get("damaged_loans"),
            outstanding_fines,
            collected_fines,
        })
    }
}
