// src/price_sources/beth.rs

use super::batom::CHAINLINK_ANSWER_DECIMALS;
use super::SnapshotSource;
use crate::chain_reader::{BlockTag, ChainReader};
use crate::contracts::ContractReader;
use crate::error::OracleError;
use crate::types::{PriceField, PriceSnapshot};
use async_trait::async_trait;
use ethers::abi::Token;
use ethers::types::{Address, U256};

const WEI_DECIMALS: u8 = 18;

// Curve pool coin indices.
const STETH_INDEX: u64 = 1;
const ETH_INDEX: u64 = 0;

/// bETH price: `ethPrice × stEthRate ÷ bEthRate`.
///
/// * `ethPrice`: Chainlink ETH/USD `latestAnswer`, 8 decimals
/// * `stEthRate`: ETH received for 1 stETH on the Curve stETH pool (`get_dy(1, 0, 1e18)`)
/// * `bEthRate`: stETH backing one bETH, from the Anchor vault `get_rate`
#[derive(Debug, Clone)]
pub struct BEthSource {
    eth_usd: ContractReader,
    curve_pool: ContractReader,
    anchor_vault: ContractReader,
}

impl BEthSource {
    pub fn new(eth_usd_aggregator: Address, curve_steth_pool: Address, anchor_vault: Address) -> Self {
        Self {
            eth_usd: ContractReader::chainlink_aggregator(eth_usd_aggregator),
            curve_pool: ContractReader::curve_pool(curve_steth_pool),
            anchor_vault: ContractReader::anchor_vault(anchor_vault),
        }
    }

    fn get_dy_args() -> [Token; 3] {
        [
            Token::Int(U256::from(STETH_INDEX)),
            Token::Int(U256::from(ETH_INDEX)),
            Token::Uint(U256::exp10(WEI_DECIMALS as usize)),
        ]
    }
}

#[async_trait]
impl SnapshotSource for BEthSource {
    fn name(&self) -> &'static str {
        "beth"
    }

    fn derived_field(&self) -> PriceField {
        PriceField::BEthPrice
    }

    async fn snapshot(&self, reader: &ChainReader<'_>, block: BlockTag) -> Result<PriceSnapshot, OracleError> {
        let get_dy_args = Self::get_dy_args();
        let (eth_price, steth_rate, beth_rate) = futures::try_join!(
            self.eth_usd
                .call_decimal(reader, "latestAnswer", &[], CHAINLINK_ANSWER_DECIMALS, block),
            self.curve_pool
                .call_decimal(reader, "get_dy", &get_dy_args, WEI_DECIMALS, block),
            self.anchor_vault
                .call_decimal(reader, "get_rate", &[], WEI_DECIMALS, block),
        )?;

        let beth_price = eth_price.checked_mul(&steth_rate)?.checked_div(&beth_rate)?;
        log::debug!(
            "bETH at {}: eth={} steth={} beth_rate={} -> {}",
            block,
            eth_price,
            steth_rate,
            beth_rate,
            beth_price
        );

        Ok(PriceSnapshot::new()
            .with(PriceField::EthPrice, eth_price)
            .with(PriceField::StEthRate, steth_rate)
            .with(PriceField::BEthRate, beth_rate)
            .with(PriceField::BEthPrice, beth_price))
    }
}
