//! Amount codec
//!
//! Converts between human-entered decimal strings and integer base-unit
//! amounts. Base units and human amounts are distinct types: `BaseAmount`
//! wraps the smallest indivisible integer unit of a token, and the only way
//! between the two representations is through this codec. Excess fractional
//! precision is truncated, never rounded up.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::tokens::TokenRegistry;

/// Integer amount in a token's base units (e.g., 1 USDC = 1_000_000 at 6
/// decimals). Never mixed with human-scale values without conversion.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct BaseAmount(pub u128);

impl BaseAmount {
    pub const ZERO: BaseAmount = BaseAmount(0);

    pub fn value(self) -> u128 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Subtraction clamped at zero. Withdrawn amounts can exceed vested
    /// amounts transiently between reads; the difference is never negative.
    pub fn saturating_sub(self, other: BaseAmount) -> BaseAmount {
        BaseAmount(self.0.saturating_sub(other.0))
    }

    pub fn checked_sub(self, other: BaseAmount) -> Option<BaseAmount> {
        self.0.checked_sub(other.0).map(BaseAmount)
    }
}

impl fmt::Display for BaseAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Codec between human decimal strings and base-unit amounts, backed by the
/// token registry for per-token decimal precision.
#[derive(Debug, Clone)]
pub struct AmountCodec {
    registry: Arc<TokenRegistry>,
}

impl AmountCodec {
    pub fn new(registry: Arc<TokenRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &TokenRegistry {
        &self.registry
    }

    /// Parses a human decimal string and scales it to base units.
    ///
    /// Rejects negative and non-numeric input. Fractional digits beyond the
    /// token's precision are truncated (never rounded up).
    ///
    /// # Returns
    ///
    /// * `Ok(BaseAmount)` - Scaled integer amount
    /// * `Err(EngineError::InvalidAmount)` - Input is not a valid non-negative decimal
    /// * `Err(EngineError::UnknownToken)` - Symbol is not registered
    pub fn to_base_units(&self, human: &str, symbol: &str) -> EngineResult<BaseAmount> {
        let decimals = self.registry.decimals_for(symbol)?;

        let value = Decimal::from_str(human.trim())
            .map_err(|_| EngineError::InvalidAmount(format!("not a decimal number: {human:?}")))?;

        if value.is_sign_negative() {
            return Err(EngineError::InvalidAmount(format!(
                "negative amount: {human}"
            )));
        }

        let truncated = value.trunc_with_scale(decimals);
        let scale = Decimal::from(10u64.pow(decimals));
        let scaled = truncated
            .checked_mul(scale)
            .ok_or_else(|| EngineError::InvalidAmount(format!("amount out of range: {human}")))?;

        scaled
            .trunc()
            .to_u128()
            .map(BaseAmount)
            .ok_or_else(|| EngineError::InvalidAmount(format!("amount out of range: {human}")))
    }

    /// Formats a base-unit amount at the token's canonical display precision.
    ///
    /// Inverse of [`to_base_units`](Self::to_base_units) up to truncation:
    /// re-parsing the output yields a value less than or equal to the original
    /// input, never greater.
    pub fn to_human_units(&self, base: BaseAmount, symbol: &str) -> EngineResult<String> {
        let decimals = self.registry.decimals_for(symbol)?;
        if decimals == 0 {
            return Ok(base.0.to_string());
        }

        let divisor = 10u128.pow(decimals);
        let integral = base.0 / divisor;
        let fractional = base.0 % divisor;
        Ok(format!(
            "{integral}.{fractional:0width$}",
            width = decimals as usize
        ))
    }

    /// Base-unit value of `n` whole human units of a token. Used for the
    /// protocol minimum/maximum claim bounds.
    pub fn whole_units(&self, n: u64, symbol: &str) -> EngineResult<BaseAmount> {
        let decimals = self.registry.decimals_for(symbol)?;
        let scaled = (n as u128)
            .checked_mul(10u128.pow(decimals))
            .ok_or_else(|| EngineError::InvalidAmount(format!("amount out of range: {n}")))?;
        Ok(BaseAmount(scaled))
    }
}
