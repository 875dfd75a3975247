//! Repository layer for database operations

pub mod audit;
pub mod loans;
pub mod overdues;
pub mod penalties;
pub mod users;

use sqlx::{Pool, Postgres};

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub users: users::UsersRepository,
    pub loans: loans::LoansRepository,
    pub overdues: overdues::OverduesRepository,
    pub penalties: penalties::PenaltiesRepository,
    pub audit: audit::AuditRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            users: users::UsersRepository::new(pool.clone()),
            loans: loans::LoansRepository::new(pool.clone()),
            overdues: overdues::OverduesRepository::new(pool.clone()),
            penalties: penalties::PenaltiesRepository::new(pool.clone()),
            audit: audit::AuditRepository::new(pool.clone()),
            pool,
        }
    }
}
