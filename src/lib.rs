//! Escrow claim and settlement engine
//!
//! Consolidates the claim logic shared by the dashboard's claim modals,
//! escrow list views, and top-up flows: decimal-precision-safe amount
//! conversion, linear vesting math, claim eligibility, ERC20 allowance
//! sequencing, and reconciliation of indexed state against live contract
//! reads. Stateless library with no UI dependencies.

pub mod allowance;
pub mod amount;
pub mod chains;
pub mod config;
pub mod eligibility;
pub mod error;
pub mod escrow_id;
pub mod indexer;
pub mod reconcile;
pub mod settlement;
pub mod tokens;
pub mod vesting;

// Re-export public types for convenience
pub use allowance::{AllowanceOrchestrator, SpendPlan, SpendStep};
pub use amount::{AmountCodec, BaseAmount};
pub use chains::{
    ContractCall, EscrowContract, EscrowContractClient, EscrowRoomDetails, EvmRpcClient,
    ReceiverDetails, TokenContract, TokenContractClient, TransactionMonitor, TxOutcome, Wallet,
};
pub use config::{ChainConfig, EngineConfig, IndexerConfig, TokenConfig};
pub use eligibility::{
    ClaimLimits, ClaimRequest, EligibilityEvaluator, EligibilityResult, ReceiverAllocation,
};
pub use error::{EngineError, EngineResult};
pub use escrow_id::{EscrowId, ESCROW_ID_BYTES};
pub use indexer::{ApiResponse, EscrowSummary, IndexerClient, ReceiverSummary};
pub use reconcile::{EscrowReconciler, ReconciledEscrow, ReconciledReceiver};
pub use settlement::{ClaimPhase, ClaimResult, ClaimSettlementCoordinator};
pub use tokens::{TokenDescriptor, TokenRegistry};
pub use vesting::{vesting_status, VestingSchedule, VestingStatus};
