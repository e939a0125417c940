//! Worker configuration
//!
//! Every setting can come from a flag or an environment variable and is fixed
//! for the lifetime of the process.

use std::time::Duration;

use clap::Parser;
use rust_decimal::Decimal;
use types::keys::DEFAULT_KEY_PREFIX;
use types::{DEFAULT_MAX_PRECISION, SUN_RADIUS_KM};

use crate::error::WorkerError;

/// Command-line / environment surface of the worker binary.
#[derive(Debug, Clone, Parser)]
#[command(name = "precision-worker", version, about = "Advances pi one digit at a time")]
pub struct WorkerArgs {
    /// Redis connection URL
    #[arg(long, env = "REDIS_URL", default_value = "redis://redis:6379")]
    pub redis_url: String,

    /// Prefix of the state keys and the update channel
    #[arg(long, env = "PI_KEY_PREFIX", default_value = DEFAULT_KEY_PREFIX)]
    pub key_prefix: String,

    /// Precision at which the worker stops advancing
    #[arg(long, env = "PI_MAX_PRECISION", default_value_t = DEFAULT_MAX_PRECISION)]
    pub max_precision: u32,

    /// Radius (km) used for the circumference
    #[arg(long, env = "PI_RADIUS_KM", default_value_t = Decimal::from(SUN_RADIUS_KM))]
    pub radius_km: Decimal,

    /// Delay between store connection attempts at startup
    #[arg(long, env = "PI_CONNECT_RETRY_SECS", default_value_t = 5)]
    pub connect_retry_secs: u64,

    /// Cooldown after a failed calculation
    #[arg(long, env = "PI_COMPUTE_COOLDOWN_SECS", default_value_t = 30)]
    pub compute_cooldown_secs: u64,

    /// Backoff after a failed commit
    #[arg(long, env = "PI_PERSIST_BACKOFF_SECS", default_value_t = 5)]
    pub persist_backoff_secs: u64,

    /// Pause after each successful commit
    #[arg(long, env = "PI_PACE_MILLIS", default_value_t = 1000)]
    pub pace_millis: u64,

    /// Sleep interval once the target precision is reached
    #[arg(long, env = "PI_IDLE_INTERVAL_SECS", default_value_t = 3600)]
    pub idle_interval_secs: u64,

    /// Largest precision the calculator accepts
    #[arg(long, env = "PI_MAX_SUPPORTED_PRECISION", default_value_t = calculation::machin::DEFAULT_MAX_SUPPORTED_PRECISION)]
    pub max_supported_precision: u32,
}

impl WorkerArgs {
    pub fn worker_config(&self) -> Result<WorkerConfig, WorkerError> {
        if self.max_precision > self.max_supported_precision {
            return Err(WorkerError::Config(format!(
                "max precision {} exceeds calculator ceiling {}",
                self.max_precision, self.max_supported_precision
            )));
        }
        if self.radius_km.is_sign_negative() {
            return Err(WorkerError::Config(format!(
                "radius must not be negative, got {}",
                self.radius_km
            )));
        }

        Ok(WorkerConfig {
            max_precision: self.max_precision,
            radius_km: self.radius_km,
            connect_retry: Duration::from_secs(self.connect_retry_secs),
            compute_cooldown: Duration::from_secs(self.compute_cooldown_secs),
            persist_backoff: Duration::from_secs(self.persist_backoff_secs),
            pace: Duration::from_millis(self.pace_millis),
            idle_interval: Duration::from_secs(self.idle_interval_secs),
        })
    }
}

/// Loop settings used by [`crate::Advancer`].
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub max_precision: u32,
    pub radius_km: Decimal,
    pub connect_retry: Duration,
    pub compute_cooldown: Duration,
    pub persist_backoff: Duration,
    pub pace: Duration,
    pub idle_interval: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            max_precision: DEFAULT_MAX_PRECISION,
            radius_km: Decimal::from(SUN_RADIUS_KM),
            connect_retry: Duration::from_secs(5),
            compute_cooldown: Duration::from_secs(30),
            persist_backoff: Duration::from_secs(5),
            pace: Duration::from_secs(1),
            idle_interval: Duration::from_secs(3600),
        }
    }
}
