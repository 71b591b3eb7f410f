//! Token registry
//!
//! Static mapping from token symbol (or contract address) to decimal precision
//! and display metadata. Loaded once at process start from configuration and
//! immutable afterwards; everything that touches amounts depends on it.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{EngineError, EngineResult};

/// Metadata for a registered token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenDescriptor {
    /// Unique token symbol (e.g., "USDC", "IDRX")
    pub symbol: String,
    /// Token contract address on the configured chain (0x-prefixed hex)
    pub address: String,
    /// Decimal precision (e.g., 6 for USDC, 2 for IDRX)
    pub decimals: u32,
    /// Symbol shown to users (usually the same as `symbol`)
    pub display_symbol: String,
}

/// Immutable symbol -> descriptor lookup table.
#[derive(Debug, Clone)]
pub struct TokenRegistry {
    tokens: HashMap<String, TokenDescriptor>,
}

impl TokenRegistry {
    pub fn new(descriptors: Vec<TokenDescriptor>) -> Self {
        let tokens = descriptors
            .into_iter()
            .map(|d| (d.symbol.clone(), d))
            .collect();
        Self { tokens }
    }

    /// Looks up a descriptor by symbol.
    ///
    /// # Returns
    ///
    /// * `Ok(&TokenDescriptor)` - Registered descriptor
    /// * `Err(EngineError::UnknownToken)` - Symbol is not registered
    pub fn descriptor(&self, symbol: &str) -> EngineResult<&TokenDescriptor> {
        self.tokens
            .get(symbol)
            .ok_or_else(|| EngineError::UnknownToken(symbol.to_string()))
    }

    /// Looks up a descriptor by contract address (case-insensitive hex
    /// comparison, with or without the 0x prefix).
    pub fn descriptor_by_address(&self, address: &str) -> EngineResult<&TokenDescriptor> {
        let needle = address.strip_prefix("0x").unwrap_or(address);
        self.tokens
            .values()
            .find(|d| {
                let candidate = d.address.strip_prefix("0x").unwrap_or(&d.address);
                candidate.eq_ignore_ascii_case(needle)
            })
            .ok_or_else(|| EngineError::UnknownToken(address.to_string()))
    }

    /// Decimal precision for a registered symbol.
    pub fn decimals_for(&self, symbol: &str) -> EngineResult<u32> {
        Ok(self.descriptor(symbol)?.decimals)
    }

    /// All registered symbols.
    pub fn symbols(&self) -> Vec<&str> {
        self.tokens.keys().map(String::as_str).collect()
    }
}
