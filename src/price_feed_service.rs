// src/price_feed_service.rs

use crate::chain_reader::{BlockTag, ChainReader};
use crate::error::OracleError;
use crate::metrics;
use crate::price_sources::{BAtomSource, BEthSource, SnapshotSource};
use crate::rpc_client::{mask_endpoint, ResilientRpcClient};
use crate::rpc_response::JsonRpcResponse;
use crate::settings::{PriceFeedKind, Settings};
use crate::types::conversions::string_to_address;
use crate::types::{PriceSnapshot, ReferenceEntry};
use crate::validator::{CompositePriceValidator, ValidationError};
use arc_swap::ArcSwap;
use futures::future::try_join_all;
use log::{error, info, warn};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Decimal places of a released price.
pub const PRICE_DECIMALS: u32 = 8;

/// Everything one price computation reads. Replaced as a whole, never mutated.
#[derive(Debug, Clone)]
pub struct OracleConfig {
    pub endpoints: Vec<String>,
    pub request_timeout: Duration,
    pub validator: CompositePriceValidator,
    pub source: Arc<dyn SnapshotSource>,
}

impl OracleConfig {
    pub fn new(
        endpoints: Vec<String>,
        request_timeout: Duration,
        validator: CompositePriceValidator,
        source: Arc<dyn SnapshotSource>,
    ) -> Self {
        Self {
            endpoints,
            request_timeout,
            validator,
            source,
        }
    }

    /// Validates settings and builds the configured feed.
    ///
    /// An empty endpoint list is accepted here and reported by the first request.
    pub fn from_settings(settings: &Settings) -> Result<Self, OracleError> {
        for endpoint in &settings.rpc.endpoints {
            url::Url::parse(endpoint).map_err(|e| {
                OracleError::Config(format!("invalid endpoint {}: {}", mask_endpoint(endpoint), e))
            })?;
        }

        let validator = CompositePriceValidator::new(
            settings.guard.deviation_block_offsets.clone(),
            &settings.guard.limits,
        )?;

        let contracts = &settings.contracts;
        let source: Arc<dyn SnapshotSource> = match settings.guard.feed {
            PriceFeedKind::BAtom => Arc::new(BAtomSource::new(string_to_address(
                &contracts.chainlink_atom_usd,
            )?)),
            PriceFeedKind::BEth => {
                let anchor_vault = contracts.anchor_vault.as_deref().ok_or_else(|| {
                    OracleError::Config("contracts.anchor_vault is required for the beth feed".to_string())
                })?;
                Arc::new(BEthSource::new(
                    string_to_address(&contracts.chainlink_eth_usd)?,
                    string_to_address(&contracts.curve_steth_pool)?,
                    string_to_address(anchor_vault)?,
                ))
            }
        };

        Ok(Self::new(
            settings.rpc.endpoints.clone(),
            Duration::from_millis(settings.rpc.request_timeout_ms),
            validator,
            source,
        ))
    }
}

/// Computes the current price of the configured feed and releases it only after
/// validation against bounds and historical deviations.
pub struct PriceFeedService {
    client: ResilientRpcClient,
    config: ArcSwap<OracleConfig>,
}

impl PriceFeedService {
    pub fn new(config: OracleConfig) -> Self {
        Self::with_client(ResilientRpcClient::new(), config)
    }

    pub fn with_client(client: ResilientRpcClient, config: OracleConfig) -> Self {
        Self {
            client,
            config: ArcSwap::from_pointee(config),
        }
    }

    /// Swaps the configuration. Requests already running finish on the old one.
    pub fn reconfigure(&self, config: OracleConfig) {
        info!(
            "Reconfiguring price feed '{}': {} endpoints, offsets {:?}",
            config.source.name(),
            config.endpoints.len(),
            config.validator.deviation_block_offsets()
        );
        self.config.store(Arc::new(config));
    }

    pub fn config(&self) -> Arc<OracleConfig> {
        self.config.load_full()
    }

    /// Current price as a string with 8 decimal places.
    pub async fn current_safe_price(&self) -> Result<String, OracleError> {
        let config = self.config.load_full();
        let reader = ChainReader::new(&self.client, &config.endpoints, config.request_timeout);
        let source = config.source.as_ref();

        let (current, (block_number, references)) = futures::try_join!(
            source.snapshot(&reader, BlockTag::Latest),
            reference_snapshots(&reader, source, config.validator.deviation_block_offsets()),
        )?;

        config.validator.validate(block_number, &current, &references)?;

        let field = source.derived_field();
        let price = current.get(field).ok_or_else(|| ValidationError::ValueIsNaN {
            field,
            value: "undefined".to_string(),
        })?;

        let price = price.to_fixed(PRICE_DECIMALS)?;
        metrics::increment_price_released(source.name());
        info!("Released {} price {} at block {}", source.name(), price, block_number);
        Ok(price)
    }

    /// `currentPrice` answered as a JSON-RPC response.
    pub async fn current_price_response(&self, id: Value) -> JsonRpcResponse {
        match self.current_safe_price().await {
            Ok(price) => JsonRpcResponse::success(id, price),
            Err(err) => {
                if err.is_policy_violation() {
                    warn!("Refusing unsafe price: {}", err);
                } else {
                    error!("currentPrice failed: {}", err);
                }
                JsonRpcResponse::failure(id, err.rpc_error())
            }
        }
    }
}

/// Reads the block number, then one snapshot per offset, concurrently.
/// Entries come back in offset order regardless of completion order.
async fn reference_snapshots(
    reader: &ChainReader<'_>,
    source: &dyn SnapshotSource,
    offsets: &[u64],
) -> Result<(u64, Vec<ReferenceEntry>), OracleError> {
    let block_number = reader.block_number().await?;

    let blocks = offsets
        .iter()
        .map(|offset| {
            block_number
                .checked_sub(*offset)
                .ok_or(OracleError::OffsetBeyondGenesis {
                    block: block_number,
                    offset: *offset,
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let references = try_join_all(blocks.into_iter().map(|block| async move {
        let snapshot: PriceSnapshot = source.snapshot(reader, BlockTag::Number(block)).await?;
        Ok::<_, OracleError>(ReferenceEntry::new(block, snapshot))
    }))
    .await?;

    Ok((block_number, references))
}
