//! Contract and wallet seams
//!
//! The wallet, the escrow contract, and the ERC20-style token contract are
//! external collaborators. The engine consumes them through these traits so
//! the settlement coordinator can be exercised against mocks and so concrete
//! transports stay swappable per token family.

use async_trait::async_trait;

use crate::amount::BaseAmount;
use crate::error::EngineResult;
use crate::escrow_id::EscrowId;
use crate::vesting::VestingSchedule;

/// A prepared contract invocation, ready to be signed and broadcast by the
/// wallet client. `data` is 0x-prefixed calldata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractCall {
    pub to: String,
    pub data: String,
}

/// Externally-owned wallet client. Must be connected before any write path
/// proceeds; absence is a precondition failure, not a retryable error.
#[async_trait]
pub trait Wallet: Send + Sync {
    /// Connected account address, or `None` when no wallet is connected.
    fn address(&self) -> Option<String>;

    /// Signs and broadcasts a contract call, returning the transaction hash.
    async fn sign_and_send(&self, call: ContractCall) -> EngineResult<String>;
}

/// Escrow room fields as read from the contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EscrowRoomDetails {
    pub sender: String,
    pub token_address: String,
    pub total_allocated: BaseAmount,
    pub total_deposited: BaseAmount,
    pub total_withdrawn: BaseAmount,
    pub available_balance: BaseAmount,
    pub active: bool,
    pub created_at: u64,
    pub last_top_up_at: u64,
    pub receiver_count: u64,
}

/// Per-receiver allocation state as read from the contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiverDetails {
    pub allocation: BaseAmount,
    pub withdrawn: BaseAmount,
    pub active: bool,
}

/// Escrow contract reads and prepared writes. All methods take a normalized
/// [`EscrowId`], so a malformed identifier can never reach the chain.
#[async_trait]
pub trait EscrowContract: Send + Sync {
    async fn get_escrow_details(&self, escrow_id: &EscrowId) -> EngineResult<EscrowRoomDetails>;

    async fn get_escrow_receivers(&self, escrow_id: &EscrowId) -> EngineResult<Vec<String>>;

    async fn get_receiver_details(
        &self,
        escrow_id: &EscrowId,
        receiver: &str,
    ) -> EngineResult<ReceiverDetails>;

    /// Vesting schedule for the room, or `None` when the room has no schedule.
    async fn get_vesting_schedule(
        &self,
        escrow_id: &EscrowId,
    ) -> EngineResult<Option<VestingSchedule>>;

    /// Prepared withdraw call (receiver claims to wallet).
    fn withdraw_call(&self, escrow_id: &EscrowId, amount: BaseAmount) -> EngineResult<ContractCall>;

    /// Prepared top-up call (sender deposits into the room).
    fn top_up_call(&self, escrow_id: &EscrowId, amount: BaseAmount) -> EngineResult<ContractCall>;

    /// Prepared add-receiver call.
    fn add_receiver_call(
        &self,
        escrow_id: &EscrowId,
        receiver: &str,
        allocation: BaseAmount,
    ) -> EngineResult<ContractCall>;

    /// Escrow contract address; the approval spender for sender-side writes.
    fn contract_address(&self) -> &str;
}

/// ERC20-style token contract reads and the prepared approve write.
#[async_trait]
pub trait TokenContract: Send + Sync {
    async fn balance_of(&self, owner: &str) -> EngineResult<BaseAmount>;

    async fn allowance(&self, owner: &str, spender: &str) -> EngineResult<BaseAmount>;

    /// Prepared approval for exactly `amount` (never unlimited).
    fn approve_call(&self, spender: &str, amount: BaseAmount) -> EngineResult<ContractCall>;

    fn token_address(&self) -> &str;
}

/// Terminal outcome of a broadcast transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxOutcome {
    pub success: bool,
    /// Revert reason when the chain exposes one.
    pub revert_reason: Option<String>,
}

/// Waits for a broadcast transaction to reach a terminal state. Once a write
/// has been broadcast it is never abandoned: the engine either observes the
/// receipt or reports the timeout.
#[async_trait]
pub trait TransactionMonitor: Send + Sync {
    async fn confirm(&self, tx_hash: &str) -> EngineResult<TxOutcome>;
}
