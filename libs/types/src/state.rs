//! Persisted pi state and the client-facing snapshot
//!
//! Invariant: `circumference` is derived from `pi` at the same precision and
//! both are always written together, so a reader never sees a mismatched
//! pair.

use serde::{Deserialize, Serialize};

use crate::errors::NumericError;
use crate::numeric::FixedDecimal;

/// Latest accepted result of the precision worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PiState {
    /// Pi quantized to exactly `precision` fractional digits.
    pub pi: String,
    /// Number of fractional digits `pi` is accurate to.
    pub precision: u32,
    /// `2 * pi * radius`, quantized to the same precision.
    pub circumference: String,
}

impl PiState {
    /// Derive the persisted state from a raw calculator output.
    ///
    /// Pi is quantized to `precision` digits first; the circumference is
    /// computed from that stored value and quantized to the same precision.
    pub fn derive(
        raw_pi: &str,
        precision: u32,
        radius: &FixedDecimal,
    ) -> Result<Self, NumericError> {
        let pi = FixedDecimal::parse(raw_pi)?;
        Ok(Self::from_value(&pi, precision, radius))
    }

    /// Same as [`PiState::derive`] for an already parsed value.
    pub fn from_value(pi: &FixedDecimal, precision: u32, radius: &FixedDecimal) -> Self {
        let pi = pi.quantize(precision);
        let circumference = Self::circumference_of(&pi, precision, radius);

        Self {
            pi: pi.to_string(),
            precision,
            circumference: circumference.to_string(),
        }
    }

    /// `2 * pi * radius` at `precision` fractional digits.
    pub fn circumference_of(
        pi: &FixedDecimal,
        precision: u32,
        radius: &FixedDecimal,
    ) -> FixedDecimal {
        pi.mul_int(2).mul(radius).quantize(precision)
    }

    /// True when `circumference` is exactly what `pi` yields for `radius`
    /// and `pi` carries `precision` fractional digits.
    pub fn is_consistent(&self, radius: &FixedDecimal) -> bool {
        match FixedDecimal::parse(&self.pi) {
            Ok(pi) if pi.scale() == self.precision => {
                Self::circumference_of(&pi, self.precision, radius).to_string()
                    == self.circumference
            }
            _ => false,
        }
    }

    pub fn snapshot(&self) -> PiSnapshot {
        PiSnapshot {
            pi: self.pi.clone(),
            circumference: self.circumference.clone(),
        }
    }
}

/// The `{pi, circumference}` pair pushed to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PiSnapshot {
    pub pi: String,
    pub circumference: String,
}

impl PiSnapshot {
    /// Snapshot served before the worker has persisted anything.
    pub fn placeholder(radius: &FixedDecimal) -> Self {
        Self {
            pi: "3".to_string(),
            circumference: radius.mul_int(2).to_string(),
        }
    }

    /// Snapshot for an optional stored state, falling back to the placeholder.
    pub fn from_stored(state: Option<&PiState>, radius: &FixedDecimal) -> Self {
        state
            .map(PiState::snapshot)
            .unwrap_or_else(|| Self::placeholder(radius))
    }

    /// JSON payload of one stream event.
    pub fn to_json(&self) -> String {
        serde_json::json!({
            "pi": self.pi,
            "circumference": self.circumference,
        })
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SUN_RADIUS_KM;

    const PI_30: &str = "3.141592653589793238462643383279";

    fn radius() -> FixedDecimal {
        FixedDecimal::from_int(SUN_RADIUS_KM)
    }

    #[test]
    fn test_derive_quantizes_both_values() {
        let state = PiState::derive(PI_30, 3, &radius()).unwrap();
        assert_eq!(state.pi, "3.142");
        assert_eq!(state.precision, 3);
        assert_eq!(state.circumference, "4375800.560");
    }

    #[test]
    fn test_derive_precision_zero() {
        let state = PiState::derive("3", 0, &radius()).unwrap();
        assert_eq!(state.pi, "3");
        assert_eq!(state.circumference, "4178040");
    }

    #[test]
    fn test_circumference_follows_stored_pi() {
        let state = PiState::derive(PI_30, 1, &radius()).unwrap();
        assert_eq!(state.pi, "3.1");
        assert_eq!(state.circumference, "4317308.0");

        for precision in 0..=30 {
            let state = PiState::derive(PI_30, precision, &radius()).unwrap();
            let rederived = PiState::derive(&state.pi, precision, &radius()).unwrap();
            assert_eq!(rederived, state);
            assert!(state.is_consistent(&radius()));
        }
    }

    #[test]
    fn test_inconsistent_pair_is_detected() {
        let mut state = PiState::derive(PI_30, 2, &radius()).unwrap();
        assert_eq!(state.circumference, "4373015.20");

        state.circumference = "4375233.26".to_string();
        assert!(!state.is_consistent(&radius()));

        let short = PiState {
            pi: "3.1".to_string(),
            precision: 2,
            circumference: "4317308.00".to_string(),
        };
        assert!(!short.is_consistent(&radius()));
    }

    #[test]
    fn test_fractional_radius_is_quantized() {
        let radius = FixedDecimal::parse("1.25").unwrap();
        let state = PiState::derive(PI_30, 2, &radius).unwrap();
        // 2 * 3.14 * 1.25 = 7.85
        assert_eq!(state.circumference, "7.85");
    }

    #[test]
    fn test_derive_rejects_bad_output() {
        assert!(PiState::derive("3.14e0", 2, &radius()).is_err());
    }

    #[test]
    fn test_placeholder_snapshot() {
        let snapshot = PiSnapshot::placeholder(&radius());
        assert_eq!(snapshot.pi, "3");
        assert_eq!(snapshot.circumference, "1392680");
    }

    #[test]
    fn test_from_stored_prefers_state() {
        let state = PiState::derive(PI_30, 2, &radius()).unwrap();
        let snapshot = PiSnapshot::from_stored(Some(&state), &radius());
        assert_eq!(snapshot.pi, "3.14");

        let empty = PiSnapshot::from_stored(None, &radius());
        assert_eq!(empty, PiSnapshot::placeholder(&radius()));
    }

    #[test]
    fn test_snapshot_json_shape() {
        let snapshot = PiSnapshot {
            pi: "3.14".to_string(),
            circumference: "4375233.26".to_string(),
        };
        let value: serde_json::Value = serde_json::from_str(&snapshot.to_json()).unwrap();
        assert_eq!(value["pi"], "3.14");
        assert_eq!(value["circumference"], "4375233.26");
        assert_eq!(value.as_object().unwrap().len(), 2);
    }
}
