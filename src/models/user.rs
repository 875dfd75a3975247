//! User (borrower/staff) model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use super::enums::UserStatus;

/// User model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct User {
    pub id: i32,
    pub name: String,
    pub email: String,
    /// Admin, Librarian or Borrower
    pub role: String,
    pub status: i16,
    pub is_archived: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// A borrower may only be issued books while active and not archived
    pub fn can_borrow(&self) -> bool {
        UserStatus::from(self.status) == UserStatus::Active && !self.is_archived
    }
}
