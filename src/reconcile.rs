//! Escrow state reconciliation
//!
//! Merges indexer-provided escrow summaries with live contract reads into one
//! normalized record. Precedence is explicit: when both sources answer, the
//! on-chain value is authoritative and the indexer only populates display
//! fields the contract does not expose (such as the sender's name). Partial
//! failure never discards the rest - a receiver whose detail read fails is
//! flagged rather than omitted. Records carry a freshness timestamp; callers
//! decide their own staleness tolerance, the engine runs no refresh timer.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::warn;

use crate::amount::BaseAmount;
use crate::chains::traits::EscrowContract;
use crate::error::{EngineError, EngineResult};
use crate::escrow_id::EscrowId;
use crate::indexer::{EscrowSummary, IndexerClient};
use crate::tokens::{TokenDescriptor, TokenRegistry};
use crate::vesting::VestingSchedule;

/// Reconciled per-receiver state.
#[derive(Debug, Clone)]
pub struct ReconciledReceiver {
    pub address: String,
    pub allocation: BaseAmount,
    pub withdrawn: BaseAmount,
    pub active: bool,
    /// The receiver's detail read failed; the values above are cached or zero.
    pub detail_unavailable: bool,
}

/// One escrow room merged from both sources.
#[derive(Debug, Clone)]
pub struct ReconciledEscrow {
    pub escrow_id: EscrowId,
    pub sender: String,
    /// Display-only, from the indexer; contract reads do not expose it
    pub sender_name: Option<String>,
    pub token: TokenDescriptor,
    pub total_allocated: BaseAmount,
    pub total_deposited: BaseAmount,
    pub total_withdrawn: BaseAmount,
    pub available_balance: BaseAmount,
    pub active: bool,
    pub created_at: u64,
    pub last_top_up_at: u64,
    pub receiver_count: u64,
    pub receivers: Vec<ReconciledReceiver>,
    pub vesting: Option<VestingSchedule>,
    /// False when the room fields came from the indexer cache because the
    /// chain read failed
    pub chain_authoritative: bool,
    /// When this record was assembled (Unix timestamp, seconds)
    pub fetched_at: u64,
}

impl ReconciledEscrow {
    /// The reconciled record for one receiver address, if present.
    pub fn receiver(&self, address: &str) -> Option<&ReconciledReceiver> {
        self.receivers
            .iter()
            .find(|r| r.address.eq_ignore_ascii_case(address))
    }
}

pub(crate) fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Reconciles cached and live escrow state.
pub struct EscrowReconciler {
    escrow: Arc<dyn EscrowContract>,
    indexer: IndexerClient,
    registry: Arc<TokenRegistry>,
}

impl EscrowReconciler {
    pub fn new(
        escrow: Arc<dyn EscrowContract>,
        indexer: IndexerClient,
        registry: Arc<TokenRegistry>,
    ) -> Self {
        Self {
            escrow,
            indexer,
            registry,
        }
    }

    /// Reconciles one escrow room into a normalized record.
    ///
    /// The identifier is normalized first; a malformed id fails fast with
    /// `MalformedEscrowId` before any contract call. Room totals, the
    /// receiver list, and per-receiver details are read from the chain, with
    /// the indexer summary as fallback when a read fails. Only when both
    /// sources fail does the error surface.
    pub async fn reconcile(&self, raw_id: &str) -> EngineResult<ReconciledEscrow> {
        let escrow_id = EscrowId::parse(raw_id)?;
        let fetched_at = unix_now();

        // Indexer miss is not an error here; the chain is the authority.
        let summary = match self.indexer.escrow_summary(escrow_id.as_hex()).await {
            Ok(summary) => Some(summary),
            Err(e) => {
                warn!("Indexer unavailable for {}: {}", escrow_id, e);
                None
            }
        };

        let details = match self.escrow.get_escrow_details(&escrow_id).await {
            Ok(details) => details,
            Err(e) => {
                warn!("Chain read failed for {}: {}", escrow_id, e);
                return match summary {
                    Some(summary) => self.from_summary(escrow_id, summary, fetched_at),
                    None => Err(e),
                };
            }
        };

        let token = self
            .registry
            .descriptor_by_address(&details.token_address)?
            .clone();

        // Receiver list: chain first, indexer fallback; either way the
        // per-receiver details still come from the chain where possible.
        let addresses = match self.escrow.get_escrow_receivers(&escrow_id).await {
            Ok(addresses) => addresses,
            Err(e) => {
                warn!("Receiver list read failed for {}: {}", escrow_id, e);
                summary
                    .as_ref()
                    .map(|s| s.receivers.iter().map(|r| r.address.clone()).collect())
                    .unwrap_or_default()
            }
        };

        let mut receivers = Vec::with_capacity(addresses.len());
        for address in &addresses {
            match self.escrow.get_receiver_details(&escrow_id, address).await {
                Ok(detail) => receivers.push(ReconciledReceiver {
                    address: address.clone(),
                    allocation: detail.allocation,
                    withdrawn: detail.withdrawn,
                    active: detail.active,
                    detail_unavailable: false,
                }),
                Err(e) => {
                    warn!("Receiver detail read failed for {address}: {e}");
                    let cached = summary.as_ref().and_then(|s| {
                        s.receivers
                            .iter()
                            .find(|r| r.address.eq_ignore_ascii_case(address))
                    });
                    receivers.push(ReconciledReceiver {
                        address: address.clone(),
                        allocation: cached.map(|c| c.allocation).unwrap_or_default(),
                        withdrawn: cached.map(|c| c.withdrawn).unwrap_or_default(),
                        active: cached.map(|c| c.active).unwrap_or(false),
                        detail_unavailable: true,
                    });
                }
            }
        }

        let vesting = match self.escrow.get_vesting_schedule(&escrow_id).await {
            Ok(vesting) => vesting,
            Err(e) => {
                warn!("Vesting read failed for {}: {}", escrow_id, e);
                summary.as_ref().and_then(|s| s.vesting.clone())
            }
        };

        Ok(ReconciledEscrow {
            escrow_id,
            sender: details.sender,
            sender_name: summary.and_then(|s| s.sender_name),
            token,
            total_allocated: details.total_allocated,
            total_deposited: details.total_deposited,
            total_withdrawn: details.total_withdrawn,
            available_balance: details.available_balance,
            active: details.active,
            created_at: details.created_at,
            last_top_up_at: details.last_top_up_at,
            receiver_count: details.receiver_count,
            receivers,
            vesting,
            chain_authoritative: true,
            fetched_at,
        })
    }

    /// Reconciles every escrow the given addresses participate in, as sender
    /// or as receiver, using the indexer to enumerate rooms (the contract
    /// cannot list rooms by address). Rooms that fail to reconcile
    /// individually are skipped with a warning rather than failing the whole
    /// batch.
    pub async fn reconcile_escrows(
        &self,
        addresses: &[String],
    ) -> EngineResult<Vec<ReconciledEscrow>> {
        let mut seen = HashSet::new();
        let mut records = Vec::new();

        for address in addresses {
            let mut summaries = self.indexer.receiver_summaries(address).await?;
            summaries.extend(self.indexer.sender_summaries(address).await?);

            for summary in summaries {
                // A corrupt cached row must not abort the batch; the indexer
                // is never authoritative.
                let escrow_id = match EscrowId::parse(&summary.escrow_id) {
                    Ok(escrow_id) => escrow_id,
                    Err(e) => {
                        warn!("Skipping cached escrow {:?}: {}", summary.escrow_id, e);
                        continue;
                    }
                };
                if !seen.insert(escrow_id.clone()) {
                    continue;
                }
                match self.reconcile(escrow_id.as_hex()).await {
                    Ok(record) => records.push(record),
                    Err(e) => warn!("Skipping escrow {}: {}", escrow_id, e),
                }
            }
        }

        Ok(records)
    }

    /// Builds a record purely from the indexer summary. Used only when the
    /// chain is unreachable; the record is marked non-authoritative.
    fn from_summary(
        &self,
        escrow_id: EscrowId,
        summary: EscrowSummary,
        fetched_at: u64,
    ) -> EngineResult<ReconciledEscrow> {
        let token = self.registry.descriptor(&summary.token_symbol)?.clone();

        let receivers = summary
            .receivers
            .iter()
            .map(|r| ReconciledReceiver {
                address: r.address.clone(),
                allocation: r.allocation,
                withdrawn: r.withdrawn,
                active: r.active,
                detail_unavailable: false,
            })
            .collect();

        Ok(ReconciledEscrow {
            escrow_id,
            sender: summary.sender,
            sender_name: summary.sender_name,
            token,
            total_allocated: summary.total_allocated,
            total_deposited: summary.total_deposited,
            total_withdrawn: summary.total_withdrawn,
            available_balance: summary.available_balance,
            active: summary.active,
            created_at: summary.created_at,
            last_top_up_at: summary.last_top_up_at,
            receiver_count: summary.receiver_count,
            receivers,
            vesting: summary.vesting,
            chain_authoritative: false,
            fetched_at,
        })
    }
}
