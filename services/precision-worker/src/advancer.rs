//! Precision advancer loop
//!
//! `current` is incremented before each calculation and rolled back on any
//! failure, so the next cycle retries the same level. The state computed for
//! a level whose commit failed is kept and reused by the retry; the counter
//! still goes through the same rollback, which keeps the persisted sequence
//! of levels contiguous.

use std::sync::Arc;

use calculation::PrecisionCalculator;
use persistence::StateStore;
use tracing::{debug, error, info, warn};
use types::errors::{ComputeError, StoreError};
use types::numeric::FixedDecimal;
use types::state::PiState;

use crate::config::WorkerConfig;
use crate::error::WorkerError;

/// What a single cycle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The level was committed.
    Persisted(u32),
    /// The calculation for the level failed; the level will be retried.
    ComputeFailed(u32),
    /// The commit for the level failed; the level will be retried.
    PersistFailed(u32),
    /// The target precision is reached; nothing was done.
    Capped,
}

pub struct Advancer {
    store: Arc<dyn StateStore>,
    calculator: Arc<dyn PrecisionCalculator>,
    radius: FixedDecimal,
    config: WorkerConfig,
    current: u32,
    /// State computed for a level whose commit failed.
    pending: Option<PiState>,
}

impl Advancer {
    /// Create an advancer starting at `current`.
    pub fn new(
        store: Arc<dyn StateStore>,
        calculator: Arc<dyn PrecisionCalculator>,
        config: WorkerConfig,
        current: u32,
    ) -> Self {
        Self {
            store,
            calculator,
            radius: FixedDecimal::from_decimal(config.radius_km),
            config,
            current,
            pending: None,
        }
    }

    /// Create an advancer resuming from the last persisted level.
    ///
    /// Connectivity failures are retried every `connect_retry`; any other
    /// store error is fatal because no safe starting level exists.
    pub async fn resume(
        store: Arc<dyn StateStore>,
        calculator: Arc<dyn PrecisionCalculator>,
        config: WorkerConfig,
    ) -> Result<Self, WorkerError> {
        let current = load_precision_with_retry(store.as_ref(), &config).await?;
        info!(precision = current, max_precision = config.max_precision, "Worker resuming");
        Ok(Self::new(store, calculator, config, current))
    }

    /// Last confirmed precision level.
    pub fn current_precision(&self) -> u32 {
        self.current
    }

    /// Run one cycle without any of the pacing delays.
    pub async fn step(&mut self) -> CycleOutcome {
        if self.current >= self.config.max_precision {
            return CycleOutcome::Capped;
        }

        self.current += 1;
        let precision = self.current;
        debug!(precision, "Attempting calculation");

        let state = match self.pending.take() {
            Some(state) if state.precision == precision => {
                debug!(precision, "Reusing state from failed commit");
                state
            }
            _ => match self.compute(precision).await {
                Ok(state) => state,
                Err(err) => {
                    self.current -= 1;
                    error!(precision, error = %err, "Calculation failed");
                    return CycleOutcome::ComputeFailed(precision);
                }
            },
        };

        match self.store.commit(&state).await {
            Ok(()) => {
                info!(precision, pi = %state.pi, "Precision reached and persisted");
                CycleOutcome::Persisted(precision)
            }
            Err(err) => {
                self.current -= 1;
                warn!(
                    precision,
                    error = %err,
                    transient = err.is_transient(),
                    "Persistence failed, retrying level"
                );
                self.pending = Some(state);
                CycleOutcome::PersistFailed(precision)
            }
        }
    }

    /// Advance until the target precision is reached, applying the pacing,
    /// cooldown and backoff delays between cycles.
    pub async fn run_until_capped(&mut self) {
        loop {
            let delay = match self.step().await {
                CycleOutcome::Persisted(_) => self.config.pace,
                CycleOutcome::ComputeFailed(_) => self.config.compute_cooldown,
                CycleOutcome::PersistFailed(_) => self.config.persist_backoff,
                CycleOutcome::Capped => {
                    info!(
                        max_precision = self.config.max_precision,
                        "Calculation capped, worker is now idle"
                    );
                    return;
                }
            };
            tokio::time::sleep(delay).await;
        }
    }

    /// Stay alive without writing, pinging the store on every wake-up.
    pub async fn idle(&self) {
        loop {
            tokio::time::sleep(self.config.idle_interval).await;
            match self.store.ping().await {
                Ok(()) => debug!(precision = self.current, "Idle heartbeat"),
                Err(err) => warn!(error = %err, "Idle heartbeat failed"),
            }
        }
    }

    /// Advance to the target precision, then idle forever.
    pub async fn run(mut self) {
        self.run_until_capped().await;
        self.idle().await;
    }

    async fn compute(&self, precision: u32) -> Result<PiState, ComputeError> {
        let calculator = Arc::clone(&self.calculator);
        let raw = tokio::task::spawn_blocking(move || calculator.compute(precision))
            .await
            .map_err(|join_err| ComputeError::Panicked(join_err.to_string()))??;

        let value = FixedDecimal::parse(&raw)?;
        if value.scale() < precision {
            return Err(ComputeError::InvalidOutput { precision, output: raw });
        }
        Ok(PiState::from_value(&value, precision, &self.radius))
    }
}

async fn load_precision_with_retry(
    store: &dyn StateStore,
    config: &WorkerConfig,
) -> Result<u32, StoreError> {
    loop {
        match store.load_precision().await {
            Ok(precision) => return Ok(precision.unwrap_or(0)),
            Err(err) if err.is_transient() => {
                warn!(error = %err, "Could not read persisted precision, retrying");
                tokio::time::sleep(config.connect_retry).await;
            }
            Err(err) => {
                error!(error = %err, "Persisted precision is unreadable");
                return Err(err);
            }
        }
    }
}
