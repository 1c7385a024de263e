// src/error.rs

use crate::decimal::DecimalError;
use crate::rpc_client::RpcError;
use crate::rpc_response::JsonRpcErrorObject;
use crate::types::conversions::ConversionError;
use crate::validator::{LimitConfigError, ValidationError};
use thiserror::Error;

/// JSON-RPC error codes produced by the guard.
pub mod error_codes {
    pub const PARSE_ERROR: i64 = -32700;
    pub const INVALID_REQUEST: i64 = -32600;
    pub const METHOD_NOT_FOUND: i64 = -32601;
    pub const INTERNAL_ERROR: i64 = -32603;

    pub const VALUE_TOO_HIGH: i64 = -40001;
    pub const VALUE_TOO_LOW: i64 = -40002;
    pub const DEVIATION_TOO_HIGH: i64 = -40003;
}

#[derive(Debug, Error)]
pub enum OracleError {
    #[error(transparent)]
    Rpc(#[from] RpcError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("invalid limit configuration: {0}")]
    Limits(#[from] LimitConfigError),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to decode {method} result: {reason}")]
    Decode { method: String, reason: String },

    #[error("ABI error: {0}")]
    Abi(String),

    #[error(transparent)]
    Conversion(#[from] ConversionError),

    #[error("arithmetic error: {0}")]
    Decimal(#[from] DecimalError),

    #[error("block offset {offset} reaches before genesis (current block {block})")]
    OffsetBeyondGenesis { block: u64, offset: u64 },
}

impl From<config::ConfigError> for OracleError {
    fn from(err: config::ConfigError) -> Self {
        OracleError::Config(err.to_string())
    }
}

impl From<ethers::abi::Error> for OracleError {
    fn from(err: ethers::abi::Error) -> Self {
        OracleError::Abi(err.to_string())
    }
}

impl OracleError {
    /// Error object sent to JSON-RPC callers.
    ///
    /// Policy violations keep their code, message and data. Everything else is collapsed
    /// into a generic internal error so endpoint URLs and node responses stay in the logs.
    pub fn rpc_error(&self) -> JsonRpcErrorObject {
        match self {
            OracleError::Validation(err) if err.is_policy_violation() => {
                JsonRpcErrorObject::new(err.code(), err.to_string()).with_data(err.data())
            }
            _ => JsonRpcErrorObject::internal(),
        }
    }

    pub fn is_policy_violation(&self) -> bool {
        matches!(self, OracleError::Validation(err) if err.is_policy_violation())
    }
}
