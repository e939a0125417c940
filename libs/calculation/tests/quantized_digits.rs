//! Quantized calculator output against reference digits
//!
//! The worker quantizes the raw output to exactly `precision` digits; the
//! result must equal the correctly rounded reference value.

use calculation::{MachinPi, PrecisionCalculator};
use proptest::prelude::*;
use types::numeric::FixedDecimal;

const PI_110: &str = "3.14159265358979323846264338327950288419716939937510582097494459230781640628620899862803482534211706798214808651";

fn reference(precision: u32) -> String {
    FixedDecimal::parse(PI_110).unwrap().quantize(precision).to_string()
}

#[test]
fn test_first_levels() {
    let calc = MachinPi::default();
    let quantized: Vec<String> = (0..=4)
        .map(|p| {
            FixedDecimal::parse(&calc.compute(p).unwrap())
                .unwrap()
                .quantize(p)
                .to_string()
        })
        .collect();
    assert_eq!(quantized, vec!["3", "3.1", "3.14", "3.142", "3.1416"]);
}

proptest! {
    #[test]
    fn prop_matches_reference(precision in 1u32..=100) {
        let raw = MachinPi::default().compute(precision).unwrap();
        let quantized = FixedDecimal::parse(&raw).unwrap().quantize(precision);
        prop_assert_eq!(quantized.to_string(), reference(precision));
    }
}
