//! Escrow identifier normalization
//!
//! Escrow rooms are keyed by a fixed-width 32-byte identifier. User- and
//! indexer-supplied ids arrive in assorted shapes (with or without a 0x
//! prefix, shorter than the full width); they are normalized here before any
//! contract call. A malformed id fails fast with `MalformedEscrowId` rather
//! than being silently sent on-chain.

use std::fmt;

use crate::error::{EngineError, EngineResult};

/// Fixed identifier width in bytes.
pub const ESCROW_ID_BYTES: usize = 32;

const ESCROW_ID_HEX_CHARS: usize = ESCROW_ID_BYTES * 2;

/// A normalized escrow identifier: `0x` followed by exactly 64 lowercase hex
/// characters. Construction through [`EscrowId::parse`] is the only way to
/// obtain one, so every contract call site holds a well-formed id by type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EscrowId(String);

impl EscrowId {
    /// Normalizes a raw identifier.
    ///
    /// Strips a single `0x` prefix if present, validates the remainder as hex,
    /// and pads with trailing zero bytes up to the fixed 32-byte width.
    ///
    /// # Returns
    ///
    /// * `Ok(EscrowId)` - Normalized identifier
    /// * `Err(EngineError::MalformedEscrowId)` - Empty, too long, or not hex
    pub fn parse(raw: &str) -> EngineResult<Self> {
        let stripped = raw.strip_prefix("0x").unwrap_or(raw);

        if stripped.is_empty() {
            return Err(EngineError::MalformedEscrowId("empty identifier".into()));
        }
        if stripped.len() > ESCROW_ID_HEX_CHARS {
            return Err(EngineError::MalformedEscrowId(format!(
                "{} hex chars exceeds the {ESCROW_ID_BYTES}-byte width",
                stripped.len()
            )));
        }
        if !stripped.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(EngineError::MalformedEscrowId(format!(
                "non-hex characters in {raw:?}"
            )));
        }

        let mut hex = stripped.to_ascii_lowercase();
        while hex.len() < ESCROW_ID_HEX_CHARS {
            hex.push('0');
        }

        Ok(Self(format!("0x{hex}")))
    }

    /// The normalized id with the `0x` prefix.
    pub fn as_hex(&self) -> &str {
        &self.0
    }

    /// The bare 64-char hex word, ready for calldata encoding.
    pub fn word(&self) -> &str {
        &self.0[2..]
    }
}

impl fmt::Display for EscrowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
