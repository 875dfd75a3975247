//! API handlers for ShelfMaster REST endpoints

pub mod health;
pub mod loans;
pub mod openapi;
pub mod overdues;
pub mod payments;
pub mod stats;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::AppError;

/// Staff member attribution for audit entries, taken from the `x-staff-id`
/// header. Requests without the header are attributed to the system account.
pub struct StaffActor(pub i32);

const STAFF_ID_HEADER: &str = "x-staff-id";
const SYSTEM_ACTOR: i32 = 0;

#[async_trait]
impl<S> FromRequestParts<S> for StaffActor
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(value) = parts.headers.get(STAFF_ID_HEADER) else {
            return Ok(StaffActor(SYSTEM_ACTOR));
        };

        let staff_id = value
            .to_str()
            .ok()
            .and_then(|v| v.parse::<i32>().ok())
            .ok_or_else(|| {
                AppError::Validation(format!("Invalid {} header", STAFF_ID_HEADER))
            })?;

        Ok(StaffActor(staff_id))
    }
}

/// Paginated response wrapper
#[derive(Serialize, ToSchema)]
pub struct PaginatedResponse<T>
where
    T: for<'a> ToSchema<'a>,
{
    /// List of items
    pub items: Vec<T>,
    /// Total number of items
    pub total: i64,
    /// Current page number
    pub page: i64,
    /// Items per page
    pub per_page: i64,
}
