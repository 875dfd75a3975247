//! Book (catalog title) model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Book model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub isbn: Option<String>,
    pub publication_year: Option<i32>,
    pub is_obsolete: bool,
    pub created_at: DateTime<Utc>,
}
