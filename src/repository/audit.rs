//! Audit log repository

use chrono::Utc;
use sqlx::{Pool, Postgres};

use crate::error::AppResult;

#[derive(Clone)]
pub struct AuditRepository {
    pool: Pool<Postgres>,
}

impl AuditRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Append one audit entry
    pub async fn insert(&self, user_id: i32, action: &str, details: &str) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO audit_logs (user_id, action, details, created_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(user_id)
        .bind(action)
        .bind(details)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
