//! Unit tests for escrow identifier normalization
//!
//! These tests verify that raw identifiers in assorted shapes normalize to
//! the fixed 32-byte width, and that malformed input fails fast with
//! `MalformedEscrowId` instead of reaching a contract call.

use claim_engine::{EngineError, EscrowId};

#[path = "helpers.rs"]
mod test_helpers;
use test_helpers::DUMMY_ESCROW_ID;

#[test]
fn full_width_id_passes_through() {
    let id = EscrowId::parse(DUMMY_ESCROW_ID).unwrap();
    assert_eq!(id.as_hex(), DUMMY_ESCROW_ID);
    assert_eq!(id.word().len(), 64);
}

#[test]
fn missing_prefix_is_added() {
    let id = EscrowId::parse(&DUMMY_ESCROW_ID[2..]).unwrap();
    assert_eq!(id.as_hex(), DUMMY_ESCROW_ID);
}

#[test]
fn short_id_is_padded_with_trailing_zero_bytes() {
    let id = EscrowId::parse("0xabcd").unwrap();
    assert_eq!(
        id.as_hex(),
        "0xabcd000000000000000000000000000000000000000000000000000000000000"
    );
}

#[test]
fn uppercase_hex_is_normalized_to_lowercase() {
    let id = EscrowId::parse("0xABCD").unwrap();
    assert!(id.as_hex().starts_with("0xabcd"));
}

#[test]
fn equal_ids_normalize_identically() {
    let a = EscrowId::parse("0xABCD").unwrap();
    let b = EscrowId::parse("abcd").unwrap();
    assert_eq!(a, b);
}

#[test]
fn empty_id_is_rejected() {
    for raw in ["", "0x"] {
        let err = EscrowId::parse(raw).unwrap_err();
        assert!(
            matches!(err, EngineError::MalformedEscrowId(_)),
            "expected MalformedEscrowId for {raw:?}"
        );
    }
}

#[test]
fn oversized_id_is_rejected() {
    let raw = format!("0x{}", "1".repeat(65));
    let err = EscrowId::parse(&raw).unwrap_err();
    assert!(matches!(err, EngineError::MalformedEscrowId(_)));
}

#[test]
fn non_hex_characters_are_rejected() {
    let err = EscrowId::parse("0xnothex").unwrap_err();
    assert!(matches!(err, EngineError::MalformedEscrowId(_)));
}
