// Contracts Module - read-only ABIs used by the price sources

pub mod anchor_vault;
pub mod chainlink_aggregator;
pub mod i_curve_pool;

pub use anchor_vault::{IAnchorVault, IANCHORVAULT_ABI};
pub use chainlink_aggregator::{IChainlinkAggregator, ICHAINLINKAGGREGATOR_ABI};
pub use i_curve_pool::{ICurvePool, ICURVEPOOL_ABI};

use crate::chain_reader::{BlockTag, ChainReader};
use crate::decimal::DecimalValue;
use crate::error::OracleError;
use crate::types::conversions::token_to_decimal;
use ethers::abi::{Abi, Token};
use ethers::types::{Address, Bytes};

/// A deployed contract reached through `ChainReader::call`.
#[derive(Debug, Clone, Copy)]
pub struct ContractReader {
    address: Address,
    abi: &'static Abi,
}

impl ContractReader {
    pub fn new(address: Address, abi: &'static Abi) -> Self {
        Self { address, abi }
    }

    pub fn chainlink_aggregator(address: Address) -> Self {
        Self::new(address, &ICHAINLINKAGGREGATOR_ABI)
    }

    pub fn curve_pool(address: Address) -> Self {
        Self::new(address, &ICURVEPOOL_ABI)
    }

    pub fn anchor_vault(address: Address) -> Self {
        Self::new(address, &IANCHORVAULT_ABI)
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn calldata(&self, method: &str, args: &[Token]) -> Result<Bytes, OracleError> {
        let function = self.abi.function(method)?;
        Ok(Bytes::from(function.encode_input(args)?))
    }

    /// Calls `method` at `block` and returns the decoded outputs.
    pub async fn call(
        &self,
        reader: &ChainReader<'_>,
        method: &str,
        args: &[Token],
        block: BlockTag,
    ) -> Result<Vec<Token>, OracleError> {
        let function = self.abi.function(method)?;
        let data = Bytes::from(function.encode_input(args)?);
        let raw = reader.call(self.address, &data, block).await?;
        function.decode_output(&raw).map_err(|e| OracleError::Decode {
            method: method.to_string(),
            reason: format!("{} at {:?} (returned {} bytes)", e, self.address, raw.len()),
        })
    }

    /// Calls a method with a single numeric output and scales it by `10^decimals`.
    pub async fn call_decimal(
        &self,
        reader: &ChainReader<'_>,
        method: &str,
        args: &[Token],
        decimals: u8,
        block: BlockTag,
    ) -> Result<DecimalValue, OracleError> {
        let outputs = self.call(reader, method, args, block).await?;
        let token = outputs.first().ok_or_else(|| OracleError::Decode {
            method: method.to_string(),
            reason: "no outputs".to_string(),
        })?;
        Ok(token_to_decimal(token, decimals)?)
    }
}
