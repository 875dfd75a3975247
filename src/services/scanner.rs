//! Overdue scanner
//!
//! A recurring reconciliation sweep: promotes stale active loans to Overdue,
//! materializes the per-loan overdue-day counter and recomputes the overdue
//! fine. Level-triggered, not edge-triggered: amounts are recomputed from the
//! elapsed days on every pass, so running at any frequency never
//! double-charges.

use std::sync::Arc;

use rust_decimal::Decimal;
use thiserror::Error;
use tokio::sync::watch;
use tokio::time::{interval, Duration, MissedTickBehavior};

use crate::{
    config::{LendingConfig, ScannerConfig},
    error::{AppError, AppResult},
    lending::{fines, Clock},
    models::loan::Loan,
    repository::Repository,
};

/// A failure isolated to one loan during a sweep. Logged and skipped; the
/// sweep continues and the loan is retried on the next pass.
#[derive(Debug, Error)]
#[error("loan {loan_id} skipped during sweep: {source}")]
pub struct TransientScanError {
    pub loan_id: i32,
    #[source]
    pub source: AppError,
}

/// Outcome of one sweep
#[derive(Debug, Default, Clone, Copy)]
pub struct SweepReport {
    pub scanned: usize,
    pub promoted: usize,
    pub skipped: usize,
}

pub struct OverdueScanner {
    repository: Repository,
    clock: Arc<dyn Clock>,
    lending: LendingConfig,
    config: ScannerConfig,
}

impl OverdueScanner {
    pub fn new(
        repository: Repository,
        clock: Arc<dyn Clock>,
        lending: LendingConfig,
        config: ScannerConfig,
    ) -> Self {
        Self {
            repository,
            clock,
            lending,
            config,
        }
    }

    /// Run sweeps until the shutdown signal flips.
    ///
    /// The signal is only consulted between sweeps: a sweep that has started
    /// always finishes, so no loan is ever left half-promoted by shutdown.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        tracing::info!(
            "Overdue scanner running (every {}s, {} day(s) grace)",
            self.config.interval_secs,
            self.config.grace_days
        );

        let mut ticker = interval(Duration::from_secs(self.config.interval_secs));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown.changed() => break,
            }

            match self.sweep().await {
                Ok(report) if report.scanned > 0 => {
                    tracing::info!(
                        "Sweep: {} overdue loan(s), {} promoted, {} skipped",
                        report.scanned,
                        report.promoted,
                        report.skipped
                    );
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::error!("Sweep failed: {}", e);
                }
            }

            if *shutdown.borrow() {
                break;
            }
        }

        tracing::info!("Overdue scanner stopped");
    }

    /// One reconciliation pass. Failures are isolated per loan: a loan that
    /// cannot be promoted is logged and skipped, never aborting the sweep.
    pub async fn sweep(&self) -> AppResult<SweepReport> {
        let now = self.clock.now();
        let candidates = self
            .repository
            .overdues
            .find_candidates(now, self.config.grace_days)
            .await?;

        let mut report = SweepReport {
            scanned: candidates.len(),
            ..Default::default()
        };

        for loan in &candidates {
            match self.promote_one(loan, now).await {
                Ok(()) => report.promoted += 1,
                Err(source) => {
                    report.skipped += 1;
                    tracing::warn!(
                        "{}",
                        TransientScanError {
                            loan_id: loan.id,
                            source
                        }
                    );
                }
            }
        }

        Ok(report)
    }

    async fn promote_one(&self, loan: &Loan, now: chrono::DateTime<chrono::Utc>) -> AppResult<()> {
        if self.repository.overdues.get_copy(loan.copy_id).await?.is_none() {
            return Err(AppError::NotFound(format!(
                "Loan {} has no associated copy",
                loan.id
            )));
        }

        let days = fines::overdue_days(now, loan.due_date);
        let fine = fines::overdue_fine(days, Decimal::from(self.lending.overdue_fine_per_day));
        self.repository.overdues.promote(loan, days, fine, now).await
    }
}
