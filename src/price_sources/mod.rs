//! # Snapshot Sources
//!
//! A `SnapshotSource` turns on-chain reads into a `PriceSnapshot`: the derived price plus
//! every intermediate value it was computed from. The guard validates the whole snapshot,
//! so a source should expose each input that can move independently (an oracle answer,
//! a pool rate, a vault rate) as its own field.
//!
//! ## Adding a New Feed
//!
//! 1. Add the fields it produces to `PriceField` (and a limits entry in `PriceLimits`)
//! 2. Implement `SnapshotSource`, reading only at the block it is given
//! 3. Add a `PriceFeedKind` variant and build it in `OracleConfig::from_settings`

pub mod batom;
pub mod beth;

pub use batom::BAtomSource;
pub use beth::BEthSource;

use crate::chain_reader::{BlockTag, ChainReader};
use crate::error::OracleError;
use crate::types::{PriceField, PriceSnapshot};
use async_trait::async_trait;
use std::fmt;

/// Producer of price snapshots for one feed.
///
/// # Thread Safety
///
/// Sources are shared behind an `Arc` inside the swapped configuration and queried
/// concurrently for the current block and every reference block.
#[async_trait]
pub trait SnapshotSource: Send + Sync + fmt::Debug {
    /// Feed name used in logs and metrics labels.
    fn name(&self) -> &'static str;

    /// The field released to callers once the snapshot passes validation.
    fn derived_field(&self) -> PriceField;

    /// Reads every field of the snapshot as of `block`.
    ///
    /// # Errors
    ///
    /// Any failed read or decode aborts the whole snapshot. Sources never substitute
    /// defaults for values they could not read.
    async fn snapshot(&self, reader: &ChainReader<'_>, block: BlockTag) -> Result<PriceSnapshot, OracleError>;
}
