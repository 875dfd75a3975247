//! Book copy (physical instance) model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use super::enums::CopyStatus;

/// A physical, uniquely numbered copy of a book.
///
/// Its status always mirrors the most recent open loan referencing it; at
/// most one loan may hold a copy in a non-returned state at a time.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BookCopy {
    pub id: i32,
    pub book_id: i32,
    pub copy_number: String,
    pub status: CopyStatus,
    pub archived_at: Option<DateTime<Utc>>,
    pub archive_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
