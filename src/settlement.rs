//! Claim settlement coordination
//!
//! Top-level orchestrator the UI calls. Drives each claim through the state
//! machine:
//!
//! `Idle -> Evaluating -> AwaitingApproval -> Submitting -> Confirmed | Failed`
//!
//! Every run starts with a fresh eligibility evaluation - stale UI state is
//! never trusted for the final decision. There are no automatic retries: a
//! failure returns control to the caller, who may re-invoke from `Idle`. Once
//! a write has been broadcast the coordinator always waits for a terminal
//! receipt; a broadcast transaction is never silently abandoned.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info};

use crate::allowance::{AllowanceOrchestrator, SpendStep};
use crate::amount::{AmountCodec, BaseAmount};
use crate::chains::traits::{
    ContractCall, EscrowContract, TokenContract, TransactionMonitor, Wallet,
};
use crate::eligibility::{
    ClaimRequest, EligibilityEvaluator, EligibilityResult, ReceiverAllocation,
};
use crate::error::{EngineError, EngineResult};
use crate::reconcile::{unix_now, EscrowReconciler, ReconciledEscrow};
use crate::vesting::vesting_status;

/// States of the claim settlement machine, reported to the caller as progress
/// events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimPhase {
    Idle,
    Evaluating,
    AwaitingApproval,
    Submitting,
    Confirmed,
    Failed,
}

/// Terminal result of a settlement run.
#[derive(Debug)]
pub struct ClaimResult {
    pub success: bool,
    pub tx_hash: Option<String>,
    pub error: Option<EngineError>,
}

impl ClaimResult {
    fn confirmed(tx_hash: String) -> Self {
        Self {
            success: true,
            tx_hash: Some(tx_hash),
            error: None,
        }
    }

    fn failed(error: EngineError) -> Self {
        Self {
            success: false,
            tx_hash: None,
            error: Some(error),
        }
    }
}

/// Orchestrates eligibility evaluation, allowance sequencing, and settlement
/// writes for claims and sender-side escrow operations.
pub struct ClaimSettlementCoordinator {
    reconciler: Arc<EscrowReconciler>,
    wallet: Arc<dyn Wallet>,
    escrow: Arc<dyn EscrowContract>,
    tokens: HashMap<String, Arc<dyn TokenContract>>,
    monitor: Arc<dyn TransactionMonitor>,
    evaluator: EligibilityEvaluator,
    codec: AmountCodec,
    /// Serializes the write path: the approve -> spend sequence for one
    /// settlement must confirm before the next write is issued.
    write_guard: Mutex<()>,
}

impl ClaimSettlementCoordinator {
    pub fn new(
        reconciler: Arc<EscrowReconciler>,
        wallet: Arc<dyn Wallet>,
        escrow: Arc<dyn EscrowContract>,
        tokens: HashMap<String, Arc<dyn TokenContract>>,
        monitor: Arc<dyn TransactionMonitor>,
        evaluator: EligibilityEvaluator,
        codec: AmountCodec,
    ) -> Self {
        Self {
            reconciler,
            wallet,
            escrow,
            tokens,
            monitor,
            evaluator,
            codec,
            write_guard: Mutex::new(()),
        }
    }

    /// Read-only eligibility check for a claim request. No wallet interaction
    /// is required; safe to call while rendering.
    pub async fn evaluate_claim(&self, request: &ClaimRequest) -> EngineResult<EligibilityResult> {
        let (_, result) = self.evaluate_fresh(request).await?;
        Ok(result)
    }

    /// Reconciled records for every escrow the given addresses participate
    /// in. Pass-through to the reconciler for the UI.
    pub async fn reconcile_escrows(
        &self,
        addresses: &[String],
    ) -> EngineResult<Vec<ReconciledEscrow>> {
        self.reconciler.reconcile_escrows(addresses).await
    }

    /// Executes a claim end to end, reporting each state transition through
    /// `on_progress`.
    ///
    /// The withdrawal is funded from escrow custody, so the receiver has no
    /// caller-side token spend: the allowance orchestrator resolves an empty
    /// plan and the machine moves straight from `Evaluating` to `Submitting`.
    pub async fn execute_claim(
        &self,
        request: &ClaimRequest,
        mut on_progress: impl FnMut(ClaimPhase),
    ) -> ClaimResult {
        let _guard = self.write_guard.lock().await;
        on_progress(ClaimPhase::Evaluating);

        let (record, eval) = match self.evaluate_fresh(request).await {
            Ok(pair) => pair,
            Err(e) => return Self::fail(&mut on_progress, e),
        };

        if !eval.eligible {
            let reason = eval
                .failures
                .into_iter()
                .next()
                .unwrap_or(EngineError::NothingVested);
            return Self::fail(&mut on_progress, reason);
        }

        let Some(owner) = self.wallet.address() else {
            return Self::fail(&mut on_progress, EngineError::WalletNotConnected);
        };

        // Claims spend nothing from the receiver's own balance; the
        // orchestrator is still consulted so any future settlement route that
        // does require an approval flows through the same sequence.
        let plan = {
            let orchestrator = AllowanceOrchestrator::new(record.token.clone(), self.codec.clone());
            let Some(token) = self.tokens.get(&record.token.symbol) else {
                return Self::fail(
                    &mut on_progress,
                    EngineError::UnknownToken(record.token.symbol.clone()),
                );
            };
            match orchestrator
                .ensure_spendable(
                    token.as_ref(),
                    &owner,
                    self.escrow.contract_address(),
                    BaseAmount::ZERO,
                )
                .await
            {
                Ok(plan) => plan,
                Err(e) => return Self::fail(&mut on_progress, e),
            }
        };

        let spend_call = match self.escrow.withdraw_call(&record.escrow_id, eval.claimable) {
            Ok(call) => call,
            Err(e) => return Self::fail(&mut on_progress, e),
        };

        match self
            .run_plan(&plan.steps, &record.token.symbol, spend_call, &mut on_progress)
            .await
        {
            Ok(tx_hash) => {
                info!(
                    "Claim confirmed for {} on {}: {}",
                    request.receiver, record.escrow_id, tx_hash
                );
                on_progress(ClaimPhase::Confirmed);
                ClaimResult::confirmed(tx_hash)
            }
            Err(e) => Self::fail(&mut on_progress, e),
        }
    }

    /// Sender-side top-up: deposits `human_amount` of the room's token,
    /// approving the escrow contract first when the current allowance falls
    /// short. This is the path that exercises `AwaitingApproval`.
    pub async fn execute_top_up(
        &self,
        escrow_id: &str,
        human_amount: &str,
        mut on_progress: impl FnMut(ClaimPhase),
    ) -> ClaimResult {
        let _guard = self.write_guard.lock().await;
        on_progress(ClaimPhase::Evaluating);

        let (record, amount) = match self.prepare_spend(escrow_id, human_amount).await {
            Ok(pair) => pair,
            Err(e) => return Self::fail(&mut on_progress, e),
        };
        let spend_call = match self.escrow.top_up_call(&record.escrow_id, amount) {
            Ok(call) => call,
            Err(e) => return Self::fail(&mut on_progress, e),
        };

        self.execute_spend(record, amount, spend_call, &mut on_progress)
            .await
    }

    /// Sender-side add-receiver: allocates `human_amount` of the room's token
    /// to a new receiver, with the same approve -> spend sequencing as top-up.
    pub async fn execute_add_receiver(
        &self,
        escrow_id: &str,
        receiver: &str,
        human_amount: &str,
        mut on_progress: impl FnMut(ClaimPhase),
    ) -> ClaimResult {
        let _guard = self.write_guard.lock().await;
        on_progress(ClaimPhase::Evaluating);

        let (record, amount) = match self.prepare_spend(escrow_id, human_amount).await {
            Ok(pair) => pair,
            Err(e) => return Self::fail(&mut on_progress, e),
        };
        let spend_call = match self
            .escrow
            .add_receiver_call(&record.escrow_id, receiver, amount)
        {
            Ok(call) => call,
            Err(e) => return Self::fail(&mut on_progress, e),
        };

        self.execute_spend(record, amount, spend_call, &mut on_progress)
            .await
    }

    // ------------------------------------------------------------------
    // internals
    // ------------------------------------------------------------------

    /// Fresh reconciliation plus eligibility evaluation for one request.
    async fn evaluate_fresh(
        &self,
        request: &ClaimRequest,
    ) -> EngineResult<(ReconciledEscrow, EligibilityResult)> {
        let record = self.reconciler.reconcile(&request.escrow_id).await?;

        let receiver = record
            .receiver(&request.receiver)
            .ok_or(EngineError::NotActive)?;

        if receiver.detail_unavailable {
            // Refuse to settle from cached-or-zero values.
            return Err(EngineError::NetworkUnavailable(format!(
                "receiver detail unavailable for {}",
                request.receiver
            )));
        }

        let allocation = ReceiverAllocation {
            escrow_id: record.escrow_id.as_hex().to_string(),
            receiver: receiver.address.clone(),
            allocation: receiver.allocation,
            withdrawn: receiver.withdrawn,
            active: receiver.active,
        };

        let vesting = record
            .vesting
            .as_ref()
            .filter(|s| s.enabled)
            .map(|s| vesting_status(s, unix_now()));

        let result = self.evaluator.evaluate(
            record.active,
            &allocation,
            vesting.as_ref(),
            request,
            &record.token.symbol,
        )?;

        Ok((record, result))
    }

    /// Shared preamble for sender-side spends: reconcile the room, check it
    /// is active, parse the amount, and require a connected wallet.
    async fn prepare_spend(
        &self,
        escrow_id: &str,
        human_amount: &str,
    ) -> EngineResult<(ReconciledEscrow, BaseAmount)> {
        let record = self.reconciler.reconcile(escrow_id).await?;

        if !record.active {
            return Err(EngineError::NotActive);
        }

        let amount = self
            .codec
            .to_base_units(human_amount, &record.token.symbol)?;
        if amount.is_zero() {
            return Err(EngineError::InvalidAmount(
                "amount must be greater than zero".to_string(),
            ));
        }

        if self.wallet.address().is_none() {
            return Err(EngineError::WalletNotConnected);
        }

        Ok((record, amount))
    }

    /// Plans and runs a sender-side spend of `amount` against the escrow
    /// contract.
    async fn execute_spend(
        &self,
        record: ReconciledEscrow,
        amount: BaseAmount,
        spend_call: ContractCall,
        on_progress: &mut impl FnMut(ClaimPhase),
    ) -> ClaimResult {
        let owner = match self.wallet.address() {
            Some(owner) => owner,
            None => return Self::fail(on_progress, EngineError::WalletNotConnected),
        };
        let Some(token) = self.tokens.get(&record.token.symbol) else {
            return Self::fail(
                on_progress,
                EngineError::UnknownToken(record.token.symbol.clone()),
            );
        };

        let orchestrator = AllowanceOrchestrator::new(record.token.clone(), self.codec.clone());
        let plan = match orchestrator
            .ensure_spendable(
                token.as_ref(),
                &owner,
                self.escrow.contract_address(),
                amount,
            )
            .await
        {
            Ok(plan) => plan,
            Err(e) => return Self::fail(on_progress, e),
        };

        match self
            .run_plan(&plan.steps, &record.token.symbol, spend_call, on_progress)
            .await
        {
            Ok(tx_hash) => {
                info!("Settlement confirmed on {}: {}", record.escrow_id, tx_hash);
                on_progress(ClaimPhase::Confirmed);
                ClaimResult::confirmed(tx_hash)
            }
            Err(e) => Self::fail(on_progress, e),
        }
    }

    /// Executes a spend plan strictly in order: each approval must confirm
    /// on-chain before the spend is broadcast.
    async fn run_plan(
        &self,
        steps: &[SpendStep],
        token_symbol: &str,
        spend_call: ContractCall,
        on_progress: &mut impl FnMut(ClaimPhase),
    ) -> EngineResult<String> {
        for step in steps {
            if let SpendStep::Approve {
                spender, amount, ..
            } = step
            {
                on_progress(ClaimPhase::AwaitingApproval);
                let token = self
                    .tokens
                    .get(token_symbol)
                    .ok_or_else(|| EngineError::UnknownToken(token_symbol.to_string()))?;
                let call = token.approve_call(spender, *amount)?;

                let tx_hash = self
                    .wallet
                    .sign_and_send(call)
                    .await
                    .map_err(|e| EngineError::ApprovalFailed(e.to_string()))?;
                let outcome = self
                    .monitor
                    .confirm(&tx_hash)
                    .await
                    .map_err(|e| EngineError::ApprovalFailed(e.to_string()))?;
                if !outcome.success {
                    return Err(EngineError::ApprovalFailed(
                        outcome
                            .revert_reason
                            .unwrap_or_else(|| "approval transaction reverted".to_string()),
                    ));
                }
                info!("Approval confirmed: {}", tx_hash);
            }
        }

        on_progress(ClaimPhase::Submitting);
        let tx_hash = self.wallet.sign_and_send(spend_call).await?;
        let outcome = self.monitor.confirm(&tx_hash).await?;

        if !outcome.success {
            return Err(EngineError::WithdrawalReverted(
                outcome
                    .revert_reason
                    .unwrap_or_else(|| "transaction failed".to_string()),
            ));
        }

        Ok(tx_hash)
    }

    fn fail(on_progress: &mut impl FnMut(ClaimPhase), error: EngineError) -> ClaimResult {
        error!("Settlement failed: {}", error);
        on_progress(ClaimPhase::Failed);
        ClaimResult::failed(error)
    }
}
