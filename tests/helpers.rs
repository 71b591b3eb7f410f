//! Shared test helpers for engine unit tests
//!
//! Provides dummy constants, a canned token registry, and mock
//! implementations of the wallet/contract seams used by the reconciler and
//! settlement tests.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use claim_engine::{
    AmountCodec, BaseAmount, ContractCall, EscrowContract, EscrowId, EscrowRoomDetails,
    EngineError, EngineResult, ReceiverDetails, TokenContract, TokenDescriptor, TokenRegistry,
    TransactionMonitor, TxOutcome, VestingSchedule, Wallet,
};

// ============================================================================
// CONSTANTS
// ============================================================================

/// Dummy escrow identifier (full 32-byte width, 64 hex characters)
pub const DUMMY_ESCROW_ID: &str =
    "0x1111111111111111111111111111111111111111111111111111111111111111";

/// Dummy short escrow identifier (normalized by trailing-zero padding)
pub const DUMMY_ESCROW_ID_SHORT: &str = "0xabcd";

/// Dummy sender address (20 bytes)
pub const DUMMY_SENDER_ADDR: &str = "0x00000000000000000000000000000000000000aa";

/// Dummy receiver address (20 bytes)
pub const DUMMY_RECEIVER_ADDR: &str = "0x00000000000000000000000000000000000000bb";

/// Second dummy receiver address
pub const DUMMY_RECEIVER_ADDR_2: &str = "0x00000000000000000000000000000000000000bc";

/// Dummy USDC token contract address
pub const DUMMY_TOKEN_ADDR_USDC: &str = "0x00000000000000000000000000000000000000c1";

/// Dummy IDRX token contract address
pub const DUMMY_TOKEN_ADDR_IDRX: &str = "0x00000000000000000000000000000000000000c2";

/// Dummy escrow contract address
pub const DUMMY_ESCROW_CONTRACT_ADDR: &str = "0x00000000000000000000000000000000000000ee";

/// Dummy transaction hash
pub const DUMMY_TX_HASH: &str =
    "0x7777777777777777777777777777777777777777777777777777777777777777";

/// An indexer URL nothing listens on; connection fails fast
pub const DEAD_INDEXER_URL: &str = "http://127.0.0.1:1";

// ============================================================================
// REGISTRY / CODEC
// ============================================================================

/// Registry with the two tokens the scenarios use: USDC at 6 decimals and
/// IDRX at 2 decimals.
pub fn test_registry() -> Arc<TokenRegistry> {
    Arc::new(TokenRegistry::new(vec![
        TokenDescriptor {
            symbol: "USDC".to_string(),
            address: DUMMY_TOKEN_ADDR_USDC.to_string(),
            decimals: 6,
            display_symbol: "USDC".to_string(),
        },
        TokenDescriptor {
            symbol: "IDRX".to_string(),
            address: DUMMY_TOKEN_ADDR_IDRX.to_string(),
            decimals: 2,
            display_symbol: "IDRX".to_string(),
        },
    ]))
}

pub fn test_codec() -> AmountCodec {
    AmountCodec::new(test_registry())
}

/// An active USDC room: 1.0 token allocated and deposited, nothing withdrawn.
pub fn usdc_room_details() -> EscrowRoomDetails {
    EscrowRoomDetails {
        sender: DUMMY_SENDER_ADDR.to_string(),
        token_address: DUMMY_TOKEN_ADDR_USDC.to_string(),
        total_allocated: BaseAmount(1_000_000),
        total_deposited: BaseAmount(1_000_000),
        total_withdrawn: BaseAmount(0),
        available_balance: BaseAmount(1_000_000),
        active: true,
        created_at: 1_700_000_000,
        last_top_up_at: 1_700_000_000,
        receiver_count: 1,
    }
}

// ============================================================================
// MOCK ESCROW CONTRACT
// ============================================================================

pub struct MockEscrow {
    /// Room details, or `None` to simulate a failed chain read
    pub details: Option<EscrowRoomDetails>,
    pub receivers: Vec<String>,
    pub receiver_details: HashMap<String, ReceiverDetails>,
    /// Addresses whose detail read should fail
    pub fail_details_for: HashSet<String>,
    pub vesting: Option<VestingSchedule>,
    pub contract_addr: String,
    /// Total read calls issued against this mock
    pub reads: AtomicUsize,
}

impl MockEscrow {
    /// Active USDC room with one receiver holding the full allocation.
    pub fn with_default_room() -> Self {
        let mut receiver_details = HashMap::new();
        receiver_details.insert(
            DUMMY_RECEIVER_ADDR.to_string(),
            ReceiverDetails {
                allocation: BaseAmount(1_000_000),
                withdrawn: BaseAmount(0),
                active: true,
            },
        );

        Self {
            details: Some(usdc_room_details()),
            receivers: vec![DUMMY_RECEIVER_ADDR.to_string()],
            receiver_details,
            fail_details_for: HashSet::new(),
            vesting: None,
            contract_addr: DUMMY_ESCROW_CONTRACT_ADDR.to_string(),
            reads: AtomicUsize::new(0),
        }
    }

    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EscrowContract for MockEscrow {
    async fn get_escrow_details(&self, _escrow_id: &EscrowId) -> EngineResult<EscrowRoomDetails> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.details
            .clone()
            .ok_or_else(|| EngineError::NetworkUnavailable("room read failed".to_string()))
    }

    async fn get_escrow_receivers(&self, _escrow_id: &EscrowId) -> EngineResult<Vec<String>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.receivers.clone())
    }

    async fn get_receiver_details(
        &self,
        _escrow_id: &EscrowId,
        receiver: &str,
    ) -> EngineResult<ReceiverDetails> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_details_for.contains(receiver) {
            return Err(EngineError::NetworkUnavailable(format!(
                "detail read failed for {receiver}"
            )));
        }
        self.receiver_details
            .get(receiver)
            .copied()
            .ok_or_else(|| EngineError::NetworkUnavailable(format!("unknown receiver {receiver}")))
    }

    async fn get_vesting_schedule(
        &self,
        _escrow_id: &EscrowId,
    ) -> EngineResult<Option<VestingSchedule>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.vesting.clone())
    }

    fn withdraw_call(&self, escrow_id: &EscrowId, amount: BaseAmount) -> EngineResult<ContractCall> {
        Ok(ContractCall {
            to: self.contract_addr.clone(),
            data: format!("withdraw:{}:{}", escrow_id.as_hex(), amount.value()),
        })
    }

    fn top_up_call(&self, escrow_id: &EscrowId, amount: BaseAmount) -> EngineResult<ContractCall> {
        Ok(ContractCall {
            to: self.contract_addr.clone(),
            data: format!("topUp:{}:{}", escrow_id.as_hex(), amount.value()),
        })
    }

    fn add_receiver_call(
        &self,
        escrow_id: &EscrowId,
        receiver: &str,
        allocation: BaseAmount,
    ) -> EngineResult<ContractCall> {
        Ok(ContractCall {
            to: self.contract_addr.clone(),
            data: format!(
                "addReceiver:{}:{}:{}",
                escrow_id.as_hex(),
                receiver,
                allocation.value()
            ),
        })
    }

    fn contract_address(&self) -> &str {
        &self.contract_addr
    }
}

// ============================================================================
// MOCK TOKEN CONTRACT
// ============================================================================

pub struct MockToken {
    pub address: String,
    pub balance: BaseAmount,
    pub allowance: BaseAmount,
    pub reads: AtomicUsize,
}

impl MockToken {
    pub fn new(balance: u128, allowance: u128) -> Self {
        Self {
            address: DUMMY_TOKEN_ADDR_USDC.to_string(),
            balance: BaseAmount(balance),
            allowance: BaseAmount(allowance),
            reads: AtomicUsize::new(0),
        }
    }

    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenContract for MockToken {
    async fn balance_of(&self, _owner: &str) -> EngineResult<BaseAmount> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.balance)
    }

    async fn allowance(&self, _owner: &str, _spender: &str) -> EngineResult<BaseAmount> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.allowance)
    }

    fn approve_call(&self, spender: &str, amount: BaseAmount) -> EngineResult<ContractCall> {
        Ok(ContractCall {
            to: self.address.clone(),
            data: format!("approve:{}:{}", spender, amount.value()),
        })
    }

    fn token_address(&self) -> &str {
        &self.address
    }
}

// ============================================================================
// MOCK WALLET / MONITOR
// ============================================================================

pub struct MockWallet {
    pub account: Option<String>,
    /// Calls passed to sign_and_send, in order
    pub sent: Mutex<Vec<ContractCall>>,
    pub reject: bool,
}

impl MockWallet {
    pub fn connected() -> Self {
        Self {
            account: Some(DUMMY_RECEIVER_ADDR.to_string()),
            sent: Mutex::new(Vec::new()),
            reject: false,
        }
    }

    pub fn disconnected() -> Self {
        Self {
            account: None,
            sent: Mutex::new(Vec::new()),
            reject: false,
        }
    }

    pub fn sent_calls(&self) -> Vec<ContractCall> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Wallet for MockWallet {
    fn address(&self) -> Option<String> {
        self.account.clone()
    }

    async fn sign_and_send(&self, call: ContractCall) -> EngineResult<String> {
        if self.reject {
            return Err(EngineError::WithdrawalReverted(
                "rejected in wallet".to_string(),
            ));
        }
        self.sent.lock().unwrap().push(call);
        Ok(DUMMY_TX_HASH.to_string())
    }
}

pub struct MockMonitor {
    pub success: bool,
    pub revert_reason: Option<String>,
}

impl MockMonitor {
    pub fn confirming() -> Self {
        Self {
            success: true,
            revert_reason: None,
        }
    }

    pub fn reverting(reason: &str) -> Self {
        Self {
            success: false,
            revert_reason: Some(reason.to_string()),
        }
    }
}

#[async_trait]
impl TransactionMonitor for MockMonitor {
    async fn confirm(&self, _tx_hash: &str) -> EngineResult<TxOutcome> {
        Ok(TxOutcome {
            success: self.success,
            revert_reason: self.revert_reason.clone(),
        })
    }
}
