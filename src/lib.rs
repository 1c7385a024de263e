//! # Price Guard
//!
//! Derives a token price from on-chain sources reached over JSON-RPC and releases it only
//! after validating it against configured bounds and against its own value a number of
//! blocks in the past.
//!
//! ## Overview
//!
//! - **Transport**: ordered fallback over several HTTP/WebSocket endpoints with a
//!   per-attempt timeout
//! - **Sources**: snapshot producers for the bATOM and bETH feeds
//! - **Validation**: per-field min/max bounds and deviation limits, exact decimal arithmetic
//! - **Service**: concurrent current and historical reads over one atomically swapped config
//!
//! ## Architecture
//!
//! ### Transport Layer
//! `ResilientRpcClient` sends one JSON-RPC call, trying endpoints in order until one answers.
//! `ChainReader` exposes `eth_call` and `eth_blockNumber` on top of it.
//!
//! ### Source Layer
//! A `SnapshotSource` reads contract values at a block and returns a `PriceSnapshot`
//! holding the derived price and every input it was computed from.
//!
//! ### Validation Layer
//! `CompositePriceValidator` checks each field of the current snapshot with its
//! `AssetLimitValidator`, pairing historical snapshots with deviation limits by position.
//!
//! ### Service Layer
//! `PriceFeedService` orchestrates a `currentPrice` request and maps failures to JSON-RPC
//! error objects.

// Core Types
/// Arbitrary-precision decimals extended with ±∞
pub mod decimal;
/// Price snapshots, field names and ABI conversions
pub mod types;
/// Crate-level error type and JSON-RPC error codes
pub mod error;

// Transport Layer
/// Multi-endpoint JSON-RPC client with ordered fallback
pub mod rpc_client;
/// `eth_call` / `eth_blockNumber` over the fallback client
pub mod chain_reader;
/// Contract ABIs and call helpers
pub mod contracts;

// Source Layer
/// bATOM and bETH snapshot producers
pub mod price_sources;

// Validation Layer
/// Bounds and deviation validators
pub mod validator;

// Service Layer
/// Price computation and release
pub mod price_feed_service;
/// JSON-RPC response envelope
pub mod rpc_response;

// Infrastructure
/// Metrics helpers (no-ops without the `observability` feature)
pub mod metrics;
/// Configuration loading and environment overrides
pub mod settings;
/// Serde helpers shared by configuration and RPC decoding
pub mod serde_helpers;

// Re-exports for convenience
pub use decimal::DecimalValue;
pub use error::OracleError;
pub use price_feed_service::{OracleConfig, PriceFeedService};
pub use rpc_client::ResilientRpcClient;
pub use settings::Settings;
pub use validator::{AssetLimitValidator, CompositePriceValidator};
