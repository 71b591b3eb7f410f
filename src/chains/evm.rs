//! EVM JSON-RPC transport
//!
//! Concrete clients for the escrow and token contracts over plain JSON-RPC:
//! `eth_call` for reads, `eth_getTransactionReceipt` polling for write
//! confirmation. Calldata is built from keccak-hashed function selectors with
//! 32-byte word encoding; responses are decoded by word slicing.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};
use std::time::Duration;
use tracing::warn;

use crate::amount::BaseAmount;
use crate::chains::traits::{
    ContractCall, EscrowContract, EscrowRoomDetails, ReceiverDetails, TokenContract,
    TransactionMonitor, TxOutcome,
};
use crate::error::{EngineError, EngineResult};
use crate::escrow_id::EscrowId;
use crate::vesting::VestingSchedule;

const RPC_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_RECEIPT_ATTEMPTS: u32 = 30;
const DEFAULT_RECEIPT_DELAY: Duration = Duration::from_secs(2);

/// JSON-RPC request wrapper
#[derive(Debug, Serialize)]
struct JsonRpcRequest {
    jsonrpc: String,
    method: String,
    params: Vec<serde_json::Value>,
    id: u64,
}

/// JSON-RPC response wrapper
#[derive(Debug, Deserialize)]
struct JsonRpcResponse<T> {
    result: Option<T>,
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i32,
    message: String,
}

/// Transaction receipt fields the engine cares about.
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionReceipt {
    /// "0x1" on success, "0x0" on revert
    pub status: Option<String>,
}

/// Thin JSON-RPC client shared by the contract clients and the receipt
/// monitor for one chain.
#[derive(Debug, Clone)]
pub struct EvmRpcClient {
    client: Client,
    base_url: String,
    receipt_attempts: u32,
    receipt_delay: Duration,
}

impl EvmRpcClient {
    pub fn new(rpc_url: &str) -> EngineResult<Self> {
        let client = Client::builder()
            .timeout(RPC_TIMEOUT)
            .build()
            .map_err(|e| EngineError::NetworkUnavailable(format!("HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: rpc_url.to_string(),
            receipt_attempts: DEFAULT_RECEIPT_ATTEMPTS,
            receipt_delay: DEFAULT_RECEIPT_DELAY,
        })
    }

    /// Overrides the receipt polling bound (attempts and per-attempt delay).
    pub fn with_receipt_policy(mut self, attempts: u32, delay: Duration) -> Self {
        self.receipt_attempts = attempts;
        self.receipt_delay = delay;
        self
    }

    /// Issues one JSON-RPC call; a `null` result maps to `None`.
    async fn rpc_opt<T: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        params: Vec<serde_json::Value>,
    ) -> EngineResult<Option<T>> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            method: method.to_string(),
            params,
            id: 1,
        };

        let response: JsonRpcResponse<T> = self
            .client
            .post(&self.base_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| EngineError::NetworkUnavailable(format!("{method} request: {e}")))?
            .json()
            .await
            .map_err(|e| EngineError::NetworkUnavailable(format!("{method} response: {e}")))?;

        if let Some(error) = response.error {
            warn!("JSON-RPC error from {}: {} ({})", method, error.message, error.code);
            return Err(EngineError::NetworkUnavailable(format!(
                "{method}: {} ({})",
                error.message, error.code
            )));
        }

        Ok(response.result)
    }

    /// Issues one JSON-RPC call whose result must be present.
    async fn rpc<T: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        params: Vec<serde_json::Value>,
    ) -> EngineResult<T> {
        self.rpc_opt(method, params).await?.ok_or_else(|| {
            EngineError::NetworkUnavailable(format!("{method}: empty result"))
        })
    }

    /// Read-only contract call against the latest block.
    pub async fn eth_call(&self, to: &str, data: &str) -> EngineResult<String> {
        self.rpc(
            "eth_call",
            vec![
                serde_json::json!({ "to": to, "data": data }),
                serde_json::json!("latest"),
            ],
        )
        .await
    }

    pub async fn transaction_receipt(
        &self,
        tx_hash: &str,
    ) -> EngineResult<Option<TransactionReceipt>> {
        self.rpc_opt("eth_getTransactionReceipt", vec![serde_json::json!(tx_hash)])
            .await
    }
}

#[async_trait]
impl TransactionMonitor for EvmRpcClient {
    /// Polls for the receipt of a broadcast transaction with a bounded number
    /// of attempts. A transaction that never surfaces a receipt within the
    /// bound reports `NetworkUnavailable`; it is never silently dropped.
    async fn confirm(&self, tx_hash: &str) -> EngineResult<TxOutcome> {
        for attempt in 0..self.receipt_attempts {
            if attempt > 0 {
                tokio::time::sleep(self.receipt_delay).await;
            }

            match self.transaction_receipt(tx_hash).await {
                Ok(Some(receipt)) => {
                    let success = receipt.status.as_deref() == Some("0x1");
                    return Ok(TxOutcome {
                        success,
                        revert_reason: None,
                    });
                }
                Ok(None) => continue,
                Err(e) => {
                    warn!("Receipt poll failed for {}: {}", tx_hash, e);
                    continue;
                }
            }
        }

        Err(EngineError::NetworkUnavailable(format!(
            "no receipt for {tx_hash} after {} attempts",
            self.receipt_attempts
        )))
    }
}

// ============================================================================
// CALLDATA ENCODING / DECODING
// ============================================================================

/// First 4 bytes of the keccak hash of a function signature, hex encoded.
pub fn selector(signature: &str) -> String {
    let mut hasher = Keccak256::new();
    hasher.update(signature.as_bytes());
    hex::encode(&hasher.finalize()[..4])
}

/// Encodes a uint256 argument as a 32-byte hex word.
pub fn encode_uint(value: u128) -> String {
    format!("{value:064x}")
}

/// Encodes an address argument as a 32-byte hex word (left-padded).
pub fn encode_address(address: &str) -> EngineResult<String> {
    let stripped = address.strip_prefix("0x").unwrap_or(address);
    if stripped.len() != 40 || hex::decode(stripped).is_err() {
        return Err(EngineError::InvalidAmount(format!(
            "not a 20-byte hex address: {address}"
        )));
    }
    Ok(format!("{:0>64}", stripped.to_ascii_lowercase()))
}

fn calldata(signature: &str, words: &[String]) -> String {
    format!("0x{}{}", selector(signature), words.concat())
}

/// Slices the `index`-th 32-byte word out of an eth_call result.
fn word(data: &str, index: usize) -> EngineResult<&str> {
    let stripped = data.strip_prefix("0x").unwrap_or(data);
    let start = index * 64;
    let end = start + 64;
    if stripped.len() < end {
        return Err(EngineError::NetworkUnavailable(format!(
            "eth_call result too short: wanted word {index}, got {} hex chars",
            stripped.len()
        )));
    }
    Ok(&stripped[start..end])
}

fn word_u128(data: &str, index: usize) -> EngineResult<u128> {
    let w = word(data, index)?;
    // uint256 on the wire; amounts beyond u128 are outside supported range
    let (high, low) = w.split_at(32);
    if high.chars().any(|c| c != '0') {
        return Err(EngineError::InvalidAmount(
            "uint256 value exceeds supported range".to_string(),
        ));
    }
    u128::from_str_radix(low, 16)
        .map_err(|e| EngineError::NetworkUnavailable(format!("bad uint word: {e}")))
}

fn word_amount(data: &str, index: usize) -> EngineResult<BaseAmount> {
    Ok(BaseAmount(word_u128(data, index)?))
}

fn word_address(data: &str, index: usize) -> EngineResult<String> {
    let w = word(data, index)?;
    Ok(format!("0x{}", &w[24..]))
}

fn word_bool(data: &str, index: usize) -> EngineResult<bool> {
    Ok(word_u128(data, index)? != 0)
}

// ============================================================================
// ESCROW CONTRACT CLIENT
// ============================================================================

/// Escrow contract client over JSON-RPC.
#[derive(Debug, Clone)]
pub struct EscrowContractClient {
    rpc: EvmRpcClient,
    contract_addr: String,
}

impl EscrowContractClient {
    pub fn new(rpc: EvmRpcClient, contract_addr: &str) -> Self {
        Self {
            rpc,
            contract_addr: contract_addr.to_string(),
        }
    }
}

#[async_trait]
impl EscrowContract for EscrowContractClient {
    async fn get_escrow_details(&self, escrow_id: &EscrowId) -> EngineResult<EscrowRoomDetails> {
        let data = calldata(
            "getEscrowDetails(bytes32)",
            &[escrow_id.word().to_string()],
        );
        let result = self.rpc.eth_call(&self.contract_addr, &data).await?;

        // (sender, token, totalAllocated, totalDeposited, totalWithdrawn,
        //  availableBalance, active, createdAt, lastTopUp, receiverCount)
        Ok(EscrowRoomDetails {
            sender: word_address(&result, 0)?,
            token_address: word_address(&result, 1)?,
            total_allocated: word_amount(&result, 2)?,
            total_deposited: word_amount(&result, 3)?,
            total_withdrawn: word_amount(&result, 4)?,
            available_balance: word_amount(&result, 5)?,
            active: word_bool(&result, 6)?,
            created_at: word_u128(&result, 7)? as u64,
            last_top_up_at: word_u128(&result, 8)? as u64,
            receiver_count: word_u128(&result, 9)? as u64,
        })
    }

    async fn get_escrow_receivers(&self, escrow_id: &EscrowId) -> EngineResult<Vec<String>> {
        let data = calldata(
            "getEscrowReceivers(bytes32)",
            &[escrow_id.word().to_string()],
        );
        let result = self.rpc.eth_call(&self.contract_addr, &data).await?;

        // Dynamic address[]: word 0 is the offset, word 1 the length,
        // addresses follow.
        let len = word_u128(&result, 1)? as usize;
        let mut receivers = Vec::with_capacity(len);
        for i in 0..len {
            receivers.push(word_address(&result, 2 + i)?);
        }
        Ok(receivers)
    }

    async fn get_receiver_details(
        &self,
        escrow_id: &EscrowId,
        receiver: &str,
    ) -> EngineResult<ReceiverDetails> {
        let data = calldata(
            "getReceiverDetails(bytes32,address)",
            &[escrow_id.word().to_string(), encode_address(receiver)?],
        );
        let result = self.rpc.eth_call(&self.contract_addr, &data).await?;

        Ok(ReceiverDetails {
            allocation: word_amount(&result, 0)?,
            withdrawn: word_amount(&result, 1)?,
            active: word_bool(&result, 2)?,
        })
    }

    async fn get_vesting_schedule(
        &self,
        escrow_id: &EscrowId,
    ) -> EngineResult<Option<VestingSchedule>> {
        let data = calldata(
            "getVestingSchedule(bytes32)",
            &[escrow_id.word().to_string()],
        );
        let result = self.rpc.eth_call(&self.contract_addr, &data).await?;

        let enabled = word_bool(&result, 0)?;
        let start = word_u128(&result, 1)? as u64;
        let end = word_u128(&result, 2)? as u64;
        let total = word_amount(&result, 3)?;

        // Rooms created without vesting return an all-zero tuple.
        if !enabled && start == 0 && end == 0 && total.is_zero() {
            return Ok(None);
        }

        Ok(Some(VestingSchedule {
            enabled,
            start,
            end,
            total_vested_eligible: total,
        }))
    }

    fn withdraw_call(&self, escrow_id: &EscrowId, amount: BaseAmount) -> EngineResult<ContractCall> {
        Ok(ContractCall {
            to: self.contract_addr.clone(),
            data: calldata(
                "withdraw(bytes32,uint256)",
                &[escrow_id.word().to_string(), encode_uint(amount.value())],
            ),
        })
    }

    fn top_up_call(&self, escrow_id: &EscrowId, amount: BaseAmount) -> EngineResult<ContractCall> {
        Ok(ContractCall {
            to: self.contract_addr.clone(),
            data: calldata(
                "topUp(bytes32,uint256)",
                &[escrow_id.word().to_string(), encode_uint(amount.value())],
            ),
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
            data: calldata(
                "addReceiver(bytes32,address,uint256)",
                &[
                    escrow_id.word().to_string(),
                    encode_address(receiver)?,
                    encode_uint(allocation.value()),
                ],
            ),
        })
    }

    fn contract_address(&self) -> &str {
        &self.contract_addr
    }
}

// ============================================================================
// TOKEN CONTRACT CLIENT
// ============================================================================

/// ERC20-style token contract client over JSON-RPC.
#[derive(Debug, Clone)]
pub struct TokenContractClient {
    rpc: EvmRpcClient,
    token_addr: String,
}

impl TokenContractClient {
    pub fn new(rpc: EvmRpcClient, token_addr: &str) -> Self {
        Self {
            rpc,
            token_addr: token_addr.to_string(),
        }
    }
}

#[async_trait]
impl TokenContract for TokenContractClient {
    async fn balance_of(&self, owner: &str) -> EngineResult<BaseAmount> {
        let data = calldata("balanceOf(address)", &[encode_address(owner)?]);
        let result = self.rpc.eth_call(&self.token_addr, &data).await?;
        word_amount(&result, 0)
    }

    async fn allowance(&self, owner: &str, spender: &str) -> EngineResult<BaseAmount> {
        let data = calldata(
            "allowance(address,address)",
            &[encode_address(owner)?, encode_address(spender)?],
        );
        let result = self.rpc.eth_call(&self.token_addr, &data).await?;
        word_amount(&result, 0)
    }

    fn approve_call(&self, spender: &str, amount: BaseAmount) -> EngineResult<ContractCall> {
        Ok(ContractCall {
            to: self.token_addr.clone(),
            data: calldata(
                "approve(address,uint256)",
                &[encode_address(spender)?, encode_uint(amount.value())],
            ),
        })
    }

    fn token_address(&self) -> &str {
        &self.token_addr
    }
}
