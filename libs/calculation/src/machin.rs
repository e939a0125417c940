//! Machin's formula in big-integer fixed point
//!
//! pi = 16 * atan(1/5) - 4 * atan(1/239)
//!
//! Each arctangent series term is truncated to an integer multiple of
//! 10^-(precision + GUARD_DIGITS). The accumulated truncation error is a few
//! units per term, far below the guard digits.

use num_bigint::{BigInt, BigUint};
use num_traits::Zero;
use tracing::debug;

use types::errors::ComputeError;
use types::numeric::FixedDecimal;

use crate::PrecisionCalculator;

/// Extra digits carried through the series and dropped by the caller.
pub const GUARD_DIGITS: u32 = 20;

/// Default ceiling above which the calculator refuses to run.
pub const DEFAULT_MAX_SUPPORTED_PRECISION: u32 = 100_000;

#[derive(Debug, Clone)]
pub struct MachinPi {
    max_precision: u32,
}

impl MachinPi {
    pub fn new(max_precision: u32) -> Self {
        Self { max_precision }
    }

    pub fn max_precision(&self) -> u32 {
        self.max_precision
    }
}

impl Default for MachinPi {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SUPPORTED_PRECISION)
    }
}

/// atan(1/x) scaled by `unity`.
fn arctan_inv(x: u32, unity: &BigUint) -> BigUint {
    let x_squared = BigUint::from(x) * x;
    let mut term = unity / x;
    let mut sum = term.clone();
    let mut n = 1u32;
    let mut subtract = true;

    loop {
        term /= &x_squared;
        if term.is_zero() {
            break;
        }
        let contribution = &term / (2 * n + 1);
        if subtract {
            sum -= contribution;
        } else {
            sum += contribution;
        }
        subtract = !subtract;
        n += 1;
    }

    sum
}

impl PrecisionCalculator for MachinPi {
    fn compute(&self, precision: u32) -> Result<String, ComputeError> {
        if precision == 0 {
            return Ok("3".to_string());
        }
        if precision > self.max_precision {
            return Err(ComputeError::PrecisionTooLarge {
                requested: precision,
                max: self.max_precision,
            });
        }

        let working = precision + GUARD_DIGITS;
        let unity = BigUint::from(10u32).pow(working);
        let pi = arctan_inv(5, &unity) * 16u32 - arctan_inv(239, &unity) * 4u32;

        let literal = FixedDecimal::new(BigInt::from(pi), working).to_string();
        debug!(precision, digits = literal.len(), "Computed pi");
        Ok(literal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PI_100: &str = "3.1415926535897932384626433832795028841971693993751058209749445923078164062862089986280348253421170679";

    #[test]
    fn test_precision_zero() {
        assert_eq!(MachinPi::default().compute(0).unwrap(), "3");
    }

    #[test]
    fn test_known_digits() {
        let calc = MachinPi::default();
        for precision in [1u32, 2, 10, 50, 100] {
            let raw = calc.compute(precision).unwrap();
            let expected_len = 2 + precision as usize;
            assert_eq!(&raw[..expected_len], &PI_100[..expected_len], "precision {precision}");
        }
    }

    #[test]
    fn test_output_has_guard_digits() {
        let raw = MachinPi::default().compute(5).unwrap();
        let fractional = raw.split_once('.').unwrap().1;
        assert_eq!(fractional.len(), (5 + GUARD_DIGITS) as usize);
    }

    #[test]
    fn test_refuses_above_ceiling() {
        let calc = MachinPi::new(10);
        assert!(calc.compute(10).is_ok());
        assert_eq!(
            calc.compute(11).unwrap_err(),
            ComputeError::PrecisionTooLarge { requested: 11, max: 10 }
        );
    }
}
