// src/chain_reader.rs

use crate::error::OracleError;
use crate::rpc_client::ResilientRpcClient;
use ethers::types::{Address, Bytes, U64};
use serde::{Serialize, Serializer};
use serde_json::{json, Value};
use std::fmt;
use std::time::Duration;

/// Block a read is pinned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockTag {
    Latest,
    Number(u64),
}

impl fmt::Display for BlockTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockTag::Latest => f.write_str("latest"),
            BlockTag::Number(n) => write!(f, "0x{:x}", n),
        }
    }
}

impl Serialize for BlockTag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Chain reads against one endpoint list, each read going through the fallback client.
///
/// Cheap to build: it borrows the client and endpoint list, so a request can construct one
/// from the configuration it loaded and keep every read on that configuration.
#[derive(Clone, Copy)]
pub struct ChainReader<'a> {
    client: &'a ResilientRpcClient,
    endpoints: &'a [String],
    timeout: Duration,
}

impl<'a> ChainReader<'a> {
    pub fn new(client: &'a ResilientRpcClient, endpoints: &'a [String], timeout: Duration) -> Self {
        Self {
            client,
            endpoints,
            timeout,
        }
    }

    /// `eth_call` with already-encoded calldata; returns the raw return data.
    pub async fn call(&self, to: Address, data: &Bytes, block: BlockTag) -> Result<Bytes, OracleError> {
        let result = self
            .send("eth_call", vec![json!({ "to": to, "data": data }), json!(block)])
            .await?;
        serde_json::from_value::<Bytes>(result.clone()).map_err(|e| OracleError::Decode {
            method: "eth_call".to_string(),
            reason: format!("{} (result: {})", e, result),
        })
    }

    pub async fn block_number(&self) -> Result<u64, OracleError> {
        let result = self.send("eth_blockNumber", vec![]).await?;
        let block = serde_json::from_value::<U64>(result.clone()).map_err(|e| OracleError::Decode {
            method: "eth_blockNumber".to_string(),
            reason: format!("{} (result: {})", e, result),
        })?;
        Ok(block.as_u64())
    }

    async fn send(&self, method: &str, params: Vec<Value>) -> Result<Value, OracleError> {
        let request = self.client.request(method, params);
        Ok(self.client.send(&request, self.endpoints, self.timeout).await?)
    }
}
