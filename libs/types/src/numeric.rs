//! Arbitrary-precision fixed-point decimal
//!
//! `rust_decimal` is exact but stops at 28 significant digits, well short of
//! the precision targets the worker reaches. `FixedDecimal` keeps a big-integer
//! mantissa and a decimal scale, so multiplication is exact at any precision
//! and rounding only happens when explicitly quantizing.
//!
//! Quantization uses round-half-even on the dropped digits.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use num_bigint::{BigInt, BigUint, Sign};
use num_integer::Integer;
use rust_decimal::Decimal;

use crate::errors::NumericError;

/// A signed decimal `mantissa * 10^-scale`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedDecimal {
    mantissa: BigInt,
    scale: u32,
}

fn pow10(exponent: u32) -> BigUint {
    BigUint::from(10u32).pow(exponent)
}

impl FixedDecimal {
    pub fn new(mantissa: BigInt, scale: u32) -> Self {
        Self { mantissa, scale }
    }

    /// Exact integer value with scale 0.
    pub fn from_int(value: i64) -> Self {
        Self::new(BigInt::from(value), 0)
    }

    /// Exact conversion from a `rust_decimal::Decimal`.
    pub fn from_decimal(value: Decimal) -> Self {
        Self::new(BigInt::from(value.mantissa()), value.scale())
    }

    /// Parse a plain decimal literal such as `-12.5`, `3.` or `.25`.
    ///
    /// Exponent notation is rejected.
    pub fn parse(text: &str) -> Result<Self, NumericError> {
        let invalid = || NumericError::Invalid(text.to_string());

        let trimmed = text.trim();
        let (negative, body) = if let Some(rest) = trimmed.strip_prefix('-') {
            (true, rest)
        } else if let Some(rest) = trimmed.strip_prefix('+') {
            (false, rest)
        } else {
            (false, trimmed)
        };

        let (int_part, frac_part) = body.split_once('.').unwrap_or((body, ""));
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(invalid());
        }
        let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
        if !all_digits(int_part) || !all_digits(frac_part) {
            return Err(invalid());
        }

        let scale = u32::try_from(frac_part.len()).map_err(|_| invalid())?;
        let digits = format!("{int_part}{frac_part}");
        let magnitude = BigUint::parse_bytes(digits.as_bytes(), 10).ok_or_else(invalid)?;
        let sign = if negative { Sign::Minus } else { Sign::Plus };

        Ok(Self::new(BigInt::from_biguint(sign, magnitude), scale))
    }

    pub fn mantissa(&self) -> &BigInt {
        &self.mantissa
    }

    /// Number of fractional digits.
    pub fn scale(&self) -> u32 {
        self.scale
    }

    pub fn is_negative(&self) -> bool {
        self.mantissa.sign() == Sign::Minus
    }

    /// Exact product; scales add.
    pub fn mul(&self, other: &FixedDecimal) -> FixedDecimal {
        Self::new(&self.mantissa * &other.mantissa, self.scale + other.scale)
    }

    /// Exact product with an integer factor.
    pub fn mul_int(&self, factor: i64) -> FixedDecimal {
        Self::new(&self.mantissa * factor, self.scale)
    }

    /// Rescale to exactly `scale` fractional digits.
    ///
    /// Widening pads with zeros; narrowing rounds half to even.
    pub fn quantize(&self, scale: u32) -> FixedDecimal {
        if scale >= self.scale {
            let widened = &self.mantissa * BigInt::from(pow10(scale - self.scale));
            return Self::new(widened, scale);
        }

        let divisor = pow10(self.scale - scale);
        let (quotient, remainder) = self.mantissa.magnitude().div_rem(&divisor);
        let round_up = match (&remainder * 2u32).cmp(&divisor) {
            Ordering::Greater => true,
            Ordering::Less => false,
            Ordering::Equal => quotient.is_odd(),
        };
        let quotient = if round_up { quotient + 1u32 } else { quotient };

        Self::new(BigInt::from_biguint(self.mantissa.sign(), quotient), scale)
    }
}

impl FromStr for FixedDecimal {
    type Err = NumericError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for FixedDecimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.mantissa.magnitude().to_str_radix(10);
        let scale = self.scale as usize;

        // Always keep at least one integer digit.
        let padded = if digits.len() <= scale {
            format!("{}{}", "0".repeat(scale + 1 - digits.len()), digits)
        } else {
            digits
        };
        let (int_part, frac_part) = padded.split_at(padded.len() - scale);

        if self.is_negative() {
            write!(f, "-")?;
        }
        if scale == 0 {
            write!(f, "{}", int_part)
        } else {
            write!(f, "{}.{}", int_part, frac_part)
        }
    }
}


// ── Property-Based Tests ────────────────────────────────────────────

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn prop_quantize_within_half_ulp(
            int_part in 0u64..10_000_000,
            frac in "[0-9]{1,60}",
            precision in 0u32..60,
            negative in any::<bool>(),
        ) {
            let literal = format!("{}{}.{}", if negative { "-" } else { "" }, int_part, frac);
            let original = FixedDecimal::parse(&literal).unwrap();
            let quantized = original.quantize(precision);

            prop_assert_eq!(quantized.scale(), precision);

            // Re-parse the printed form and compare at the finer scale.
            let reparsed = FixedDecimal::parse(&quantized.to_string()).unwrap();
            prop_assert_eq!(&reparsed, &quantized);

            let common = original.scale().max(precision);
            let diff = reparsed.quantize(common).mantissa() - original.quantize(common).mantissa();
            let half_ulp = BigInt::from(pow10(common - precision));
            prop_assert!(diff.magnitude() * 2u32 <= *half_ulp.magnitude());
        }

        #[test]
        fn prop_display_roundtrips(text in "-?[0-9]{1,30}(\\.[0-9]{1,30})?") {
            let parsed = FixedDecimal::parse(&text).unwrap();
            let reparsed = FixedDecimal::parse(&parsed.to_string()).unwrap();
            prop_assert_eq!(parsed, reparsed);
        }
    }
}
