//! Gateway configuration

use std::net::SocketAddr;
use std::time::Duration;

use axum::http::HeaderValue;
use calculation::machin::DEFAULT_MAX_SUPPORTED_PRECISION;
use clap::Parser;
use precision_worker::WorkerConfig;
use rust_decimal::Decimal;
use thiserror::Error;
use types::keys::DEFAULT_KEY_PREFIX;
use types::numeric::FixedDecimal;
use types::{DEFAULT_MAX_PRECISION, DEFAULT_SESSION_LIMIT, SUN_RADIUS_KM};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid allowed origin {0:?}")]
    Origin(String),

    #[error("stream buffer must hold at least one event")]
    EmptyStreamBuffer,

    #[error("radius must not be negative, got {0}")]
    NegativeRadius(Decimal),

    #[error("max precision {requested} exceeds calculator ceiling {max}")]
    PrecisionCeiling { requested: u32, max: u32 },
}

/// Command-line / environment surface of the gateway binary.
#[derive(Debug, Clone, Parser)]
#[command(name = "gateway", version, about = "Serves the pi snapshot over HTTP and SSE")]
pub struct GatewayArgs {
    /// Address to listen on
    #[arg(long, env = "GATEWAY_BIND", default_value = "0.0.0.0:8000")]
    pub bind: SocketAddr,

    /// Redis connection URL
    #[arg(long, env = "REDIS_URL", default_value = "redis://redis:6379")]
    pub redis_url: String,

    /// Prefix of the state keys and the update channel
    #[arg(long, env = "PI_KEY_PREFIX", default_value = DEFAULT_KEY_PREFIX)]
    pub key_prefix: String,

    /// Concurrent streams allowed per session
    #[arg(long, env = "PI_SESSION_LIMIT", default_value_t = DEFAULT_SESSION_LIMIT)]
    pub session_limit: u32,

    /// How long a stream waits for a notification before checking the client
    #[arg(long, env = "PI_POLL_TIMEOUT_MILLIS", default_value_t = 1000)]
    pub poll_timeout_millis: u64,

    /// Events buffered per stream before the stream task waits on the client
    #[arg(long, env = "PI_STREAM_BUFFER", default_value_t = 16)]
    pub stream_buffer: usize,

    /// Interval of keep-alive comments on idle streams
    #[arg(long, env = "PI_KEEP_ALIVE_SECS", default_value_t = 15)]
    pub keep_alive_secs: u64,

    /// Radius (km) used for the placeholder circumference
    #[arg(long, env = "PI_RADIUS_KM", default_value_t = Decimal::from(SUN_RADIUS_KM))]
    pub radius_km: Decimal,

    /// Origin allowed to call the API with credentials (repeatable)
    #[arg(
        long = "allowed-origin",
        env = "PI_ALLOWED_ORIGINS",
        value_delimiter = ',',
        default_values = ["http://localhost:3000", "http://127.0.0.1:3000"]
    )]
    pub allowed_origins: Vec<String>,

    /// Delay between store connection attempts at startup
    #[arg(long, env = "PI_CONNECT_RETRY_SECS", default_value_t = 5)]
    pub connect_retry_secs: u64,

    /// Use the in-process store and run the precision worker inside the
    /// gateway instead of connecting to Redis
    #[arg(long, env = "PI_MEMORY_STORE")]
    pub memory_store: bool,

    /// Target precision of the in-process worker
    #[arg(long, env = "PI_MAX_PRECISION", default_value_t = DEFAULT_MAX_PRECISION)]
    pub max_precision: u32,

    /// Pause of the in-process worker after each commit
    #[arg(long, env = "PI_PACE_MILLIS", default_value_t = 1000)]
    pub pace_millis: u64,
}

impl GatewayArgs {
    pub fn gateway_config(&self) -> Result<GatewayConfig, ConfigError> {
        if self.stream_buffer == 0 {
            return Err(ConfigError::EmptyStreamBuffer);
        }
        if self.radius_km.is_sign_negative() {
            return Err(ConfigError::NegativeRadius(self.radius_km));
        }

        let allowed_origins = self
            .allowed_origins
            .iter()
            .map(|origin| {
                HeaderValue::from_str(origin).map_err(|_| ConfigError::Origin(origin.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(GatewayConfig {
            session_limit: self.session_limit,
            poll_timeout: Duration::from_millis(self.poll_timeout_millis),
            stream_buffer: self.stream_buffer,
            keep_alive: Duration::from_secs(self.keep_alive_secs),
            radius: FixedDecimal::from_decimal(self.radius_km),
            allowed_origins,
        })
    }

    /// Settings of the in-process worker used with `--memory-store`.
    pub fn worker_config(&self) -> Result<WorkerConfig, ConfigError> {
        if self.max_precision > DEFAULT_MAX_SUPPORTED_PRECISION {
            return Err(ConfigError::PrecisionCeiling {
                requested: self.max_precision,
                max: DEFAULT_MAX_SUPPORTED_PRECISION,
            });
        }
        if self.radius_km.is_sign_negative() {
            return Err(ConfigError::NegativeRadius(self.radius_km));
        }

        Ok(WorkerConfig {
            max_precision: self.max_precision,
            radius_km: self.radius_km,
            connect_retry: Duration::from_secs(self.connect_retry_secs),
            pace: Duration::from_millis(self.pace_millis),
            ..WorkerConfig::default()
        })
    }
}

/// Settings shared by every request handler.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub session_limit: u32,
    pub poll_timeout: Duration,
    pub stream_buffer: usize,
    pub keep_alive: Duration,
    pub radius: FixedDecimal,
    pub allowed_origins: Vec<HeaderValue>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            session_limit: DEFAULT_SESSION_LIMIT,
            poll_timeout: Duration::from_secs(1),
            stream_buffer: 16,
            keep_alive: Duration::from_secs(15),
            radius: FixedDecimal::from_int(SUN_RADIUS_KM),
            allowed_origins: vec![
                HeaderValue::from_static("http://localhost:3000"),
                HeaderValue::from_static("http://127.0.0.1:3000"),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_gateway_config() {
        let args = GatewayArgs::parse_from(["gateway"]);
        let config = args.gateway_config().unwrap();
        let defaults = GatewayConfig::default();

        assert_eq!(args.bind.port(), 8000);
        assert!(!args.memory_store);
        assert_eq!(config.session_limit, defaults.session_limit);
        assert_eq!(config.poll_timeout, defaults.poll_timeout);
        assert_eq!(config.keep_alive, defaults.keep_alive);
        assert_eq!(config.radius, defaults.radius);
        assert_eq!(config.allowed_origins, defaults.allowed_origins);
    }

    #[test]
    fn test_repeated_origins() {
        let args = GatewayArgs::parse_from([
            "gateway",
            "--allowed-origin",
            "https://pi.example",
            "--allowed-origin",
            "https://other.example",
        ]);
        let config = args.gateway_config().unwrap();
        assert_eq!(config.allowed_origins.len(), 2);
        assert_eq!(config.allowed_origins[0], "https://pi.example");
    }

    #[test]
    fn test_embedded_worker_config() {
        let args = GatewayArgs::parse_from([
            "gateway",
            "--memory-store",
            "--max-precision",
            "7",
            "--pace-millis",
            "20",
            "--radius-km",
            "1.5",
        ]);
        assert!(args.memory_store);

        let config = args.worker_config().unwrap();
        assert_eq!(config.max_precision, 7);
        assert_eq!(config.pace, Duration::from_millis(20));
        assert_eq!(config.radius_km.to_string(), "1.5");
        assert_eq!(config.compute_cooldown, WorkerConfig::default().compute_cooldown);
    }

    #[test]
    fn test_embedded_worker_rejects_target_above_ceiling() {
        let args = GatewayArgs::parse_from(["gateway", "--max-precision", "100001"]);
        assert!(matches!(
            args.worker_config(),
            Err(ConfigError::PrecisionCeiling { requested: 100_001, .. })
        ));
    }

    #[test]
    fn test_rejects_empty_stream_buffer() {
        let args = GatewayArgs::parse_from(["gateway", "--stream-buffer", "0"]);
        assert!(matches!(
            args.gateway_config(),
            Err(ConfigError::EmptyStreamBuffer)
        ));
    }
}
