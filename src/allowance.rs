//! Allowance orchestration
//!
//! Given a required spend, reads the owner's current balance and allowance
//! and emits the minimal sequence of on-chain calls needed before the spend
//! can go through. Approvals are for exactly the required amount, never
//! unlimited, which bounds the blast radius if the spender contract is ever
//! compromised. Nothing is cached between calls: other approvals and races
//! can invalidate a previous read, so every plan starts from fresh state.

use tracing::info;

use crate::amount::{AmountCodec, BaseAmount};
use crate::chains::traits::TokenContract;
use crate::error::{EngineError, EngineResult};
use crate::tokens::TokenDescriptor;

/// One step of a spend plan, in execution order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpendStep {
    /// Approve the spender for exactly this amount and wait for confirmation
    /// before proceeding.
    Approve {
        token: String,
        spender: String,
        amount: BaseAmount,
    },
    /// The caller-supplied spend call (top-up, add-receiver), valid only once
    /// every preceding step has confirmed.
    Spend,
}

/// Ordered call sequence satisfying one required spend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpendPlan {
    pub steps: Vec<SpendStep>,
}

impl SpendPlan {
    pub fn approval(&self) -> Option<&SpendStep> {
        self.steps
            .iter()
            .find(|s| matches!(s, SpendStep::Approve { .. }))
    }
}

/// Plans the balance-check, allowance-check, approve, spend sequence for one
/// token.
#[derive(Debug, Clone)]
pub struct AllowanceOrchestrator {
    descriptor: TokenDescriptor,
    codec: AmountCodec,
}

impl AllowanceOrchestrator {
    pub fn new(descriptor: TokenDescriptor, codec: AmountCodec) -> Self {
        Self { descriptor, codec }
    }

    /// Builds the call sequence for a spend of `required` base units.
    ///
    /// Reads the owner's balance first and fails with the shortfall when it
    /// cannot cover the spend; then reads the current allowance and emits an
    /// approval step only when it falls short. A zero required amount yields
    /// an empty plan without touching the chain.
    ///
    /// # Returns
    ///
    /// * `Ok(SpendPlan)` - Steps to execute, ending with the spend
    /// * `Err(EngineError::InsufficientBalance)` - Balance below the required amount
    /// * `Err(EngineError::NetworkUnavailable)` - Balance or allowance read failed
    pub async fn ensure_spendable(
        &self,
        token: &dyn TokenContract,
        owner: &str,
        spender: &str,
        required: BaseAmount,
    ) -> EngineResult<SpendPlan> {
        if required.is_zero() {
            return Ok(SpendPlan { steps: Vec::new() });
        }

        let symbol = &self.descriptor.symbol;

        let balance = token.balance_of(owner).await?;
        if balance < required {
            let shortfall = required.saturating_sub(balance);
            return Err(EngineError::InsufficientBalance {
                shortfall: self.codec.to_human_units(shortfall, symbol)?,
                symbol: self.descriptor.display_symbol.clone(),
            });
        }

        let allowance = token.allowance(owner, spender).await?;
        let mut steps = Vec::new();

        if allowance < required {
            info!(
                "Approval needed for {}: allowance {} < required {}",
                symbol, allowance, required
            );
            steps.push(SpendStep::Approve {
                token: symbol.clone(),
                spender: spender.to_string(),
                amount: required,
            });
        }

        steps.push(SpendStep::Spend);
        Ok(SpendPlan { steps })
    }
}
