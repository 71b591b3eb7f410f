//! Chain access layer
//!
//! Trait seams for the externally-owned wallet and contract clients, plus the
//! JSON-RPC implementations used against EVM-style chains. The engine shares
//! these clients with unrelated UI flows and never assumes exclusive access.

pub mod evm;
pub mod traits;

pub use evm::{EscrowContractClient, EvmRpcClient, TokenContractClient};
pub use traits::{
    ContractCall, EscrowContract, EscrowRoomDetails, ReceiverDetails, TokenContract,
    TransactionMonitor, TxOutcome, Wallet,
};
