//! Claim eligibility evaluation
//!
//! Decides whether and how much a receiver may claim right now, combining the
//! receiver's allocation state with the vesting snapshot. All applicable
//! failure reasons are collected rather than short-circuited, so the caller
//! can present every problem at once. The resolved claimable figure produced
//! here is the only source of the final base-unit spend amount; callers never
//! re-derive it.

use serde::{Deserialize, Serialize};

use crate::amount::{AmountCodec, BaseAmount};
use crate::error::{EngineError, EngineResult};
use crate::vesting::VestingStatus;

/// Protocol claim bounds in whole human-readable units of the token.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ClaimLimits {
    /// Minimum claim (default 2 units)
    pub min_claim: u64,
    /// Maximum claim (default 5000 units)
    pub max_claim: u64,
}

impl Default for ClaimLimits {
    fn default() -> Self {
        Self {
            min_claim: 2,
            max_claim: 5000,
        }
    }
}

/// Current allocation state for one (escrow, receiver) pair.
#[derive(Debug, Clone)]
pub struct ReceiverAllocation {
    pub escrow_id: String,
    pub receiver: String,
    pub allocation: BaseAmount,
    pub withdrawn: BaseAmount,
    pub active: bool,
}

/// A receiver's claim request as entered in the UI.
#[derive(Debug, Clone)]
pub struct ClaimRequest {
    pub escrow_id: String,
    pub receiver: String,
    /// Requested amount as a human decimal string; ignored when `claim_all`
    pub amount: String,
    /// Claim the full available balance instead of `amount`
    pub claim_all: bool,
}

/// Outcome of an eligibility evaluation.
#[derive(Debug)]
pub struct EligibilityResult {
    pub eligible: bool,
    /// Resolved claim amount in base units; the figure every later step uses
    pub claimable: BaseAmount,
    /// Amount currently available to claim (vested minus withdrawn)
    pub available: BaseAmount,
    /// Every applicable failure, in rule order; empty when eligible
    pub failures: Vec<EngineError>,
}

/// Evaluates claim requests against allocation state, vesting, and the
/// protocol bounds.
#[derive(Debug, Clone)]
pub struct EligibilityEvaluator {
    codec: AmountCodec,
    limits: ClaimLimits,
}

impl EligibilityEvaluator {
    pub fn new(codec: AmountCodec, limits: ClaimLimits) -> Self {
        Self { codec, limits }
    }

    /// Runs the eligibility rules for one claim request.
    ///
    /// Rules, in order: the room and the allocation must be active; something
    /// must be available to claim; the requested amount must be within the
    /// protocol minimum/maximum and the available balance. The bounds checks
    /// are skipped for claim-all requests, whose amount defaults to the
    /// available balance and satisfies the bounds by construction - except
    /// the protocol minimum, which still applies.
    ///
    /// # Returns
    ///
    /// * `Ok(EligibilityResult)` - Evaluation outcome with all failures collected
    /// * `Err(EngineError)` - The request amount could not be parsed, or the token is unknown
    pub fn evaluate(
        &self,
        room_active: bool,
        allocation: &ReceiverAllocation,
        vesting: Option<&VestingStatus>,
        request: &ClaimRequest,
        token_symbol: &str,
    ) -> EngineResult<EligibilityResult> {
        let descriptor = self.codec.registry().descriptor(token_symbol)?.clone();

        let available = match vesting {
            Some(status) => status.vested.saturating_sub(allocation.withdrawn),
            None => allocation.allocation.saturating_sub(allocation.withdrawn),
        };

        let resolved = if request.claim_all {
            available
        } else {
            self.codec.to_base_units(&request.amount, token_symbol)?
        };

        let min_base = self.codec.whole_units(self.limits.min_claim, token_symbol)?;
        let max_base = self.codec.whole_units(self.limits.max_claim, token_symbol)?;

        let mut failures = Vec::new();

        if !room_active || !allocation.active {
            failures.push(EngineError::NotActive);
        }

        if available.is_zero() {
            failures.push(EngineError::NothingVested);
        }

        if request.claim_all {
            // Bounds hold by construction, except the minimum.
            if resolved < min_base {
                failures.push(EngineError::BelowMinimum {
                    minimum: self.limits.min_claim.to_string(),
                    symbol: descriptor.display_symbol.clone(),
                });
            }
        } else {
            if resolved < min_base {
                failures.push(EngineError::BelowMinimum {
                    minimum: self.limits.min_claim.to_string(),
                    symbol: descriptor.display_symbol.clone(),
                });
            }
            if resolved > max_base {
                failures.push(EngineError::AboveMaximum {
                    limit: self.limits.max_claim.to_string(),
                    symbol: descriptor.display_symbol.clone(),
                });
            } else if resolved > available {
                failures.push(EngineError::AboveMaximum {
                    limit: self.codec.to_human_units(available, token_symbol)?,
                    symbol: descriptor.display_symbol.clone(),
                });
            }
        }

        Ok(EligibilityResult {
            eligible: failures.is_empty(),
            claimable: resolved,
            available,
            failures,
        })
    }
}
