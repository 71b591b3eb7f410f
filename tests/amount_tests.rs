//! Unit tests for the amount codec
//!
//! These tests verify that human decimal strings scale to base units with
//! truncation only (never rounding up), that base units format back at the
//! token's display precision, and that malformed input is rejected.

use claim_engine::BaseAmount;
use rust_decimal::Decimal;
use std::str::FromStr;

#[path = "helpers.rs"]
mod test_helpers;
use test_helpers::test_codec;

// ============================================================================
// TO BASE UNITS
// ============================================================================

#[test]
fn one_token_at_six_decimals_scales_to_a_million() {
    let codec = test_codec();
    let base = codec.to_base_units("1.0", "USDC").unwrap();
    assert_eq!(base, BaseAmount(1_000_000));
}

#[test]
fn whole_number_without_fraction_scales() {
    let codec = test_codec();
    assert_eq!(codec.to_base_units("42", "USDC").unwrap(), BaseAmount(42_000_000));
    assert_eq!(codec.to_base_units("500.00", "IDRX").unwrap(), BaseAmount(50_000));
}

#[test]
fn excess_fractional_digits_are_truncated_not_rounded() {
    let codec = test_codec();
    // 1.9999999 at 6 decimals: the 7th digit is dropped, not rounded up
    assert_eq!(
        codec.to_base_units("1.9999999", "USDC").unwrap(),
        BaseAmount(1_999_999)
    );
    // Below one base unit of a 2-decimal token truncates to zero
    assert_eq!(codec.to_base_units("0.001", "IDRX").unwrap(), BaseAmount(0));
}

#[test]
fn surrounding_whitespace_is_tolerated() {
    let codec = test_codec();
    assert_eq!(
        codec.to_base_units("  2.5 ", "USDC").unwrap(),
        BaseAmount(2_500_000)
    );
}

#[test]
fn negative_amounts_are_rejected() {
    let codec = test_codec();
    let err = codec.to_base_units("-1", "USDC").unwrap_err();
    assert!(matches!(err, claim_engine::EngineError::InvalidAmount(_)));
}

#[test]
fn non_numeric_input_is_rejected() {
    let codec = test_codec();
    for bad in ["abc", "1.2.3", "", "1e"] {
        let err = codec.to_base_units(bad, "USDC").unwrap_err();
        assert!(
            matches!(err, claim_engine::EngineError::InvalidAmount(_)),
            "expected InvalidAmount for {bad:?}"
        );
    }
}

#[test]
fn unknown_token_symbol_is_rejected() {
    let codec = test_codec();
    let err = codec.to_base_units("1.0", "DOGE").unwrap_err();
    assert!(matches!(err, claim_engine::EngineError::UnknownToken(_)));
}

// ============================================================================
// TO HUMAN UNITS
// ============================================================================

#[test]
fn base_units_format_at_display_precision() {
    let codec = test_codec();
    assert_eq!(
        codec.to_human_units(BaseAmount(1_000_000), "USDC").unwrap(),
        "1.000000"
    );
    assert_eq!(
        codec.to_human_units(BaseAmount(1_234_567), "USDC").unwrap(),
        "1.234567"
    );
    assert_eq!(codec.to_human_units(BaseAmount(5), "IDRX").unwrap(), "0.05");
    assert_eq!(codec.to_human_units(BaseAmount::ZERO, "USDC").unwrap(), "0.000000");
}

#[test]
fn round_trip_never_inflates_the_amount() {
    let codec = test_codec();
    for input in ["0.1", "1.9999999", "2", "4999.999999", "0.0000001"] {
        let base = codec.to_base_units(input, "USDC").unwrap();
        let human = codec.to_human_units(base, "USDC").unwrap();
        let reparsed = Decimal::from_str(&human).unwrap();
        let original = Decimal::from_str(input).unwrap();
        assert!(
            reparsed <= original,
            "round trip inflated {input}: got {human}"
        );
    }
}

// ============================================================================
// WHOLE UNITS
// ============================================================================

#[test]
fn whole_units_scale_by_token_decimals() {
    let codec = test_codec();
    assert_eq!(codec.whole_units(2, "USDC").unwrap(), BaseAmount(2_000_000));
    assert_eq!(codec.whole_units(5000, "IDRX").unwrap(), BaseAmount(500_000));
}

// ============================================================================
// BASE AMOUNT ARITHMETIC
// ============================================================================

#[test]
fn saturating_sub_clamps_at_zero() {
    assert_eq!(BaseAmount(5).saturating_sub(BaseAmount(10)), BaseAmount::ZERO);
    assert_eq!(BaseAmount(10).saturating_sub(BaseAmount(4)), BaseAmount(6));
}

#[test]
fn checked_sub_reports_underflow() {
    assert_eq!(BaseAmount(5).checked_sub(BaseAmount(10)), None);
    assert_eq!(BaseAmount(10).checked_sub(BaseAmount(4)), Some(BaseAmount(6)));
}
