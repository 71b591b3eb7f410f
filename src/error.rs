//! Engine error taxonomy
//!
//! Every failure the engine surfaces to a caller carries one of these
//! classifications. Eligibility failures are specific and actionable;
//! transaction failures keep the underlying reason when the chain exposes one.
//! Nothing here is retried automatically - financial operations are never
//! silently re-attempted.

use thiserror::Error;

/// Classified errors for the claim and settlement engine.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Token symbol or address is not present in the registry.
    #[error("Unknown token: {0}")]
    UnknownToken(String),

    /// Human-entered amount is negative, non-numeric, or out of range.
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Escrow identifier could not be normalized to the fixed 32-byte width.
    #[error("Malformed escrow id: {0}")]
    MalformedEscrowId(String),

    /// The escrow room or the receiver's allocation is inactive.
    #[error("Escrow or receiver allocation is not active")]
    NotActive,

    /// No claimable balance: nothing vested, or everything already withdrawn.
    #[error("Nothing available to claim")]
    NothingVested,

    /// Requested amount is below the protocol minimum.
    #[error("Requested amount is below the minimum of {minimum} {symbol}")]
    BelowMinimum { minimum: String, symbol: String },

    /// Requested amount exceeds the protocol maximum or the available balance.
    #[error("Requested amount exceeds {limit} {symbol}")]
    AboveMaximum { limit: String, symbol: String },

    /// Owner's token balance cannot cover the required spend.
    #[error("Insufficient balance: short {shortfall} {symbol}")]
    InsufficientBalance { shortfall: String, symbol: String },

    /// The approval transaction reverted or was rejected.
    #[error("Approval failed: {0}")]
    ApprovalFailed(String),

    /// The settlement write (withdraw, top-up) reverted on-chain.
    #[error("Transaction reverted: {0}")]
    WithdrawalReverted(String),

    /// A write path was entered without a connected wallet. Precondition
    /// failure, not retryable.
    #[error("Wallet is not connected")]
    WalletNotConnected,

    /// Indexer or RPC endpoint unreachable. The reconciler handles indexer
    /// outages internally; this only surfaces when the chain is down too.
    #[error("Network unavailable: {0}")]
    NetworkUnavailable(String),
}

/// Result type alias used throughout the engine.
pub type EngineResult<T> = Result<T, EngineError>;
