// src/price_sources/batom.rs

use super::SnapshotSource;
use crate::chain_reader::{BlockTag, ChainReader};
use crate::contracts::ContractReader;
use crate::error::OracleError;
use crate::types::{PriceField, PriceSnapshot};
use async_trait::async_trait;
use ethers::types::Address;

pub const CHAINLINK_ANSWER_DECIMALS: u8 = 8;

/// bATOM is priced 1:1 against ATOM, read from the Chainlink ATOM/USD aggregator.
#[derive(Debug, Clone)]
pub struct BAtomSource {
    atom_usd: ContractReader,
}

impl BAtomSource {
    pub fn new(atom_usd_aggregator: Address) -> Self {
        Self {
            atom_usd: ContractReader::chainlink_aggregator(atom_usd_aggregator),
        }
    }

    pub fn atom_usd_aggregator(&self) -> Address {
        self.atom_usd.address()
    }
}

#[async_trait]
impl SnapshotSource for BAtomSource {
    fn name(&self) -> &'static str {
        "batom"
    }

    fn derived_field(&self) -> PriceField {
        PriceField::BAtomPrice
    }

    async fn snapshot(&self, reader: &ChainReader<'_>, block: BlockTag) -> Result<PriceSnapshot, OracleError> {
        let atom_price = self
            .atom_usd
            .call_decimal(reader, "latestAnswer", &[], CHAINLINK_ANSWER_DECIMALS, block)
            .await?;
        log::debug!("ATOM/USD at {}: {}", block, atom_price);

        Ok(PriceSnapshot::new()
            .with(PriceField::AtomPrice, atom_price)
            .with(PriceField::BAtomPrice, atom_price))
    }
}
