//! Indexer API client
//!
//! HTTP client for the backend indexer that serves cached escrow summaries
//! keyed by sender or receiver address. The indexer is eventually consistent
//! and never authoritative: live contract reads always win during
//! reconciliation, and an unreachable indexer is handled by falling back to
//! the chain rather than surfacing an error.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::amount::BaseAmount;
use crate::error::{EngineError, EngineResult};
use crate::vesting::VestingSchedule;

const INDEXER_TIMEOUT: Duration = Duration::from_secs(30);

/// Standardized response envelope from the indexer API.
///
/// All endpoints return this format:
/// ```json
/// {
///   "success": true|false,
///   "data": <payload>|null,
///   "error": <message>|null
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Whether the request was successful
    pub success: bool,
    /// Response data (if successful)
    pub data: Option<T>,
    /// Error message (if failed)
    pub error: Option<String>,
}

/// Cached per-receiver state inside an escrow summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiverSummary {
    pub address: String,
    pub allocation: BaseAmount,
    pub withdrawn: BaseAmount,
    pub active: bool,
}

/// Cached escrow room summary from the indexer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscrowSummary {
    pub escrow_id: String,
    pub sender: String,
    /// Human-readable sender name; display-only, not exposed by the contract
    pub sender_name: Option<String>,
    pub token_symbol: String,
    pub total_allocated: BaseAmount,
    pub total_deposited: BaseAmount,
    pub total_withdrawn: BaseAmount,
    pub available_balance: BaseAmount,
    pub active: bool,
    pub created_at: u64,
    pub last_top_up_at: u64,
    pub receiver_count: u64,
    #[serde(default)]
    pub receivers: Vec<ReceiverSummary>,
    #[serde(default)]
    pub vesting: Option<VestingSchedule>,
}

/// HTTP client for the indexer API.
#[derive(Debug, Clone)]
pub struct IndexerClient {
    base_url: String,
    client: Client,
}

impl IndexerClient {
    pub fn new(base_url: impl Into<String>) -> EngineResult<Self> {
        let client = Client::builder()
            .timeout(INDEXER_TIMEOUT)
            .build()
            .map_err(|e| EngineError::NetworkUnavailable(format!("HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.into(),
            client,
        })
    }

    async fn get<T: serde::de::DeserializeOwned>(&self, path: &str) -> EngineResult<T> {
        let url = format!("{}{}", self.base_url, path);

        let response: ApiResponse<T> = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| EngineError::NetworkUnavailable(format!("GET {path}: {e}")))?
            .json()
            .await
            .map_err(|e| EngineError::NetworkUnavailable(format!("GET {path} response: {e}")))?;

        if !response.success {
            return Err(EngineError::NetworkUnavailable(format!(
                "indexer error on {path}: {}",
                response.error.unwrap_or_else(|| "unknown error".to_string())
            )));
        }

        response
            .data
            .ok_or_else(|| EngineError::NetworkUnavailable(format!("{path}: empty data")))
    }

    /// Cached summary for one escrow room.
    pub async fn escrow_summary(&self, escrow_id: &str) -> EngineResult<EscrowSummary> {
        self.get(&format!("/escrows/{escrow_id}")).await
    }

    /// Cached summaries for all rooms opened by a sender.
    pub async fn sender_summaries(&self, address: &str) -> EngineResult<Vec<EscrowSummary>> {
        self.get(&format!("/escrows/sender/{address}")).await
    }

    /// Cached summaries for all rooms where an address is a receiver.
    pub async fn receiver_summaries(&self, address: &str) -> EngineResult<Vec<EscrowSummary>> {
        self.get(&format!("/escrows/receiver/{address}")).await
    }
}
