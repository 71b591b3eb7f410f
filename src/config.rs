//! Configuration management
//!
//! Loads and validates the engine configuration: indexer connection, chain
//! settings, the token registry, and the protocol claim limits.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::eligibility::ClaimLimits;
use crate::tokens::{TokenDescriptor, TokenRegistry};

/// Main configuration structure for the claim engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Indexer API connection
    pub indexer: IndexerConfig,
    /// Chain connection and escrow contract
    pub chain: ChainConfig,
    /// Registered tokens (use [[token]] in TOML for multiple)
    #[serde(rename = "token", default)]
    pub tokens: Vec<TokenConfig>,
    /// Protocol claim limits in whole human units
    #[serde(default)]
    pub limits: ClaimLimits,
}

/// Indexer API connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexerConfig {
    /// Indexer base URL (e.g., "http://127.0.0.1:8080")
    pub base_url: String,
}

/// Configuration for the chain hosting the escrow contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    /// Human-readable name for the chain
    pub name: String,
    /// RPC endpoint URL
    pub rpc_url: String,
    /// Unique chain identifier
    pub chain_id: u64,
    /// Address of the escrow contract (0x-prefixed hex)
    pub escrow_contract_addr: String,
}

/// One token registry entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenConfig {
    /// Unique token symbol
    pub symbol: String,
    /// Token contract address (0x-prefixed hex)
    pub address: String,
    /// Decimal precision
    pub decimals: u32,
    /// Symbol shown to users; defaults to `symbol`
    #[serde(default)]
    pub display_symbol: Option<String>,
}

impl EngineConfig {
    /// Loads configuration from a TOML file.
    ///
    /// Uses the provided path, or the `CLAIM_ENGINE_CONFIG_PATH` environment
    /// variable, or `config/engine.toml`.
    ///
    /// # Returns
    ///
    /// * `Ok(EngineConfig)` - Successfully loaded and validated configuration
    /// * `Err(anyhow::Error)` - File missing, parse failure, or validation failure
    pub fn load_from_path(path: Option<&str>) -> anyhow::Result<Self> {
        let config_path = path
            .map(|p| p.to_string())
            .or_else(|| std::env::var("CLAIM_ENGINE_CONFIG_PATH").ok())
            .unwrap_or_else(|| "config/engine.toml".to_string());

        if std::path::Path::new(&config_path).exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: EngineConfig = toml::from_str(&content)?;
            config.validate()?;
            Ok(config)
        } else {
            Err(anyhow::anyhow!(
                "Configuration file '{}' not found. Please copy the template:\n\
                cp config/engine.template.toml config/engine.toml\n\
                Then edit config/engine.toml with your actual values.",
                config_path
            ))
        }
    }

    /// Loads configuration from the default path.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from_path(None)
    }

    /// Validates the configuration for consistency and correctness.
    ///
    /// Checks:
    /// - Indexer and RPC URLs are present
    /// - The escrow contract and every token address are 20-byte hex
    /// - At least one token is registered, with unique symbols
    /// - Decimal precision stays within the supported range
    /// - The claim minimum is positive and below the maximum
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.indexer.base_url.is_empty() {
            return Err(anyhow::anyhow!(
                "Configuration error: indexer.base_url must not be empty"
            ));
        }
        if self.chain.rpc_url.is_empty() {
            return Err(anyhow::anyhow!(
                "Configuration error: chain.rpc_url must not be empty"
            ));
        }

        validate_evm_address(&self.chain.escrow_contract_addr)
            .map_err(|e| anyhow::anyhow!("Invalid escrow_contract_addr: {}", e))?;

        if self.tokens.is_empty() {
            return Err(anyhow::anyhow!(
                "Configuration error: at least one [[token]] must be configured"
            ));
        }

        for i in 0..self.tokens.len() {
            for j in (i + 1)..self.tokens.len() {
                if self.tokens[i].symbol == self.tokens[j].symbol {
                    return Err(anyhow::anyhow!(
                        "Configuration error: duplicate token symbol {}",
                        self.tokens[i].symbol
                    ));
                }
            }
        }

        for token in &self.tokens {
            validate_evm_address(&token.address)
                .map_err(|e| anyhow::anyhow!("Invalid address for token {}: {}", token.symbol, e))?;

            // 10^decimals must fit the codec's u64 scaling factor
            if token.decimals > 18 {
                return Err(anyhow::anyhow!(
                    "Configuration error: token {} has {} decimals, maximum supported is 18",
                    token.symbol,
                    token.decimals
                ));
            }
        }

        if self.limits.min_claim == 0 {
            return Err(anyhow::anyhow!(
                "Configuration error: limits.min_claim must be positive"
            ));
        }
        if self.limits.min_claim >= self.limits.max_claim {
            return Err(anyhow::anyhow!(
                "Configuration error: limits.min_claim {} must be below limits.max_claim {}",
                self.limits.min_claim,
                self.limits.max_claim
            ));
        }

        Ok(())
    }

    /// Builds the immutable token registry from the configured entries.
    pub fn registry(&self) -> Arc<TokenRegistry> {
        let descriptors = self
            .tokens
            .iter()
            .map(|t| TokenDescriptor {
                symbol: t.symbol.clone(),
                address: t.address.clone(),
                decimals: t.decimals,
                display_symbol: t
                    .display_symbol
                    .clone()
                    .unwrap_or_else(|| t.symbol.clone()),
            })
            .collect();
        Arc::new(TokenRegistry::new(descriptors))
    }
}

/// Validates a `0x`-prefixed 20-byte hex address.
fn validate_evm_address(address: &str) -> anyhow::Result<()> {
    let stripped = address
        .strip_prefix("0x")
        .ok_or_else(|| anyhow::anyhow!("address must be a 0x-prefixed hex string"))?;
    let bytes = hex::decode(stripped).map_err(|_| anyhow::anyhow!("invalid hex address"))?;
    if bytes.len() != 20 {
        anyhow::bail!("invalid address length: expected 20 bytes, got {}", bytes.len());
    }
    Ok(())
}
