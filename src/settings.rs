use crate::serde_helpers::{deserialize_present, deserialize_string_list};
use crate::types::PriceField;
use config::{Config, ConfigError, File, FileFormat};
use serde::Deserialize;
use std::env;
use std::path::Path;
use std::str::FromStr;

pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 5000;

pub const DEFAULT_CHAINLINK_ATOM_USD: &str = "0x736E09DE064A2a461F197643A26bC1ab7Dc4D5D3";
pub const DEFAULT_CHAINLINK_ETH_USD: &str = "0x5f4eC3Df9cbd43714FE2740f5E3616155c5b8419";
pub const DEFAULT_CURVE_STETH_POOL: &str = "0xDC24316b9AE028F1497c275EB9192a3Ea0f67022";

#[derive(Debug, Deserialize, Clone)]
pub struct Rpc {
    #[serde(default, deserialize_with = "deserialize_string_list")]
    pub endpoints: Vec<String>,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_request_timeout_ms() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_MS
}

impl Default for Rpc {
    fn default() -> Self {
        Self {
            endpoints: Vec::new(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

/// Which derived price the guard serves.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PriceFeedKind {
    #[default]
    BAtom,
    BEth,
}

impl FromStr for PriceFeedKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "batom" => Ok(PriceFeedKind::BAtom),
            "beth" => Ok(PriceFeedKind::BEth),
            other => Err(ConfigError::Message(format!("unknown price feed '{}'", other))),
        }
    }
}

/// Raw limits for one field, as written in configuration.
///
/// Values are kept as JSON so that numbers, numeric strings and `"Infinity"` are all
/// accepted and an explicit `null` can be rejected later instead of read as "unset".
/// Unknown keys are rejected: a misspelt bound must not leave the field unconstrained.
/// The lowercase aliases cover camelCase keys read through `config`, which lowercases them.
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct AssetLimitSettings {
    #[serde(
        default,
        alias = "maxValue",
        alias = "maxvalue",
        deserialize_with = "deserialize_present"
    )]
    pub max_value: Option<serde_json::Value>,
    #[serde(
        default,
        alias = "minValue",
        alias = "minvalue",
        deserialize_with = "deserialize_present"
    )]
    pub min_value: Option<serde_json::Value>,
    #[serde(
        default,
        alias = "maxDeviations",
        alias = "maxdeviations",
        alias = "deviations"
    )]
    pub max_deviations: Vec<serde_json::Value>,
}

/// Limits for every `PriceField`. Absent entries are unconstrained.
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PriceLimits {
    #[serde(default)]
    pub atom_price: AssetLimitSettings,
    #[serde(default)]
    pub b_atom_price: AssetLimitSettings,
    #[serde(default)]
    pub eth_price: AssetLimitSettings,
    #[serde(default)]
    pub st_eth_rate: AssetLimitSettings,
    #[serde(default)]
    pub b_eth_rate: AssetLimitSettings,
    #[serde(default)]
    pub b_eth_price: AssetLimitSettings,
}

impl PriceLimits {
    pub fn for_field(&self, field: PriceField) -> &AssetLimitSettings {
        match field {
            PriceField::AtomPrice => &self.atom_price,
            PriceField::BAtomPrice => &self.b_atom_price,
            PriceField::EthPrice => &self.eth_price,
            PriceField::StEthRate => &self.st_eth_rate,
            PriceField::BEthRate => &self.b_eth_rate,
            PriceField::BEthPrice => &self.b_eth_price,
        }
    }

    pub fn for_field_mut(&mut self, field: PriceField) -> &mut AssetLimitSettings {
        match field {
            PriceField::AtomPrice => &mut self.atom_price,
            PriceField::BAtomPrice => &mut self.b_atom_price,
            PriceField::EthPrice => &mut self.eth_price,
            PriceField::StEthRate => &mut self.st_eth_rate,
            PriceField::BEthRate => &mut self.b_eth_rate,
            PriceField::BEthPrice => &mut self.b_eth_price,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct Guard {
    #[serde(default)]
    pub feed: PriceFeedKind,
    #[serde(default)]
    pub deviation_block_offsets: Vec<u64>,
    #[serde(default)]
    pub limits: PriceLimits,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Contracts {
    #[serde(default = "default_chainlink_atom_usd")]
    pub chainlink_atom_usd: String,
    #[serde(default = "default_chainlink_eth_usd")]
    pub chainlink_eth_usd: String,
    #[serde(default = "default_curve_steth_pool")]
    pub curve_steth_pool: String,
    // No default: must be set for the bETH feed.
    #[serde(default)]
    pub anchor_vault: Option<String>,
}

fn default_chainlink_atom_usd() -> String {
    DEFAULT_CHAINLINK_ATOM_USD.to_string()
}
fn default_chainlink_eth_usd() -> String {
    DEFAULT_CHAINLINK_ETH_USD.to_string()
}
fn default_curve_steth_pool() -> String {
    DEFAULT_CURVE_STETH_POOL.to_string()
}

impl Default for Contracts {
    fn default() -> Self {
        Self {
            chainlink_atom_usd: default_chainlink_atom_usd(),
            chainlink_eth_usd: default_chainlink_eth_usd(),
            curve_steth_pool: default_curve_steth_pool(),
            anchor_vault: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Settings {
    #[serde(default)]
    pub rpc: Rpc,
    #[serde(default)]
    pub guard: Guard,
    #[serde(default)]
    pub contracts: Contracts,
}

/// Environment variables holding per-field limits as JSON objects.
pub const LIMIT_ENV_VARS: [(&str, PriceField); 6] = [
    ("ATOM_PRICE_LIMITS", PriceField::AtomPrice),
    ("BATOM_PRICE_LIMITS", PriceField::BAtomPrice),
    ("ETH_PRICE_LIMITS", PriceField::EthPrice),
    ("STETH_RATE_LIMITS", PriceField::StEthRate),
    ("BETH_RATE_LIMITS", PriceField::BEthRate),
    ("BETH_PRICE_LIMITS", PriceField::BEthPrice),
];

impl Settings {
    /// Loads `Config.toml` from the working directory if present, then applies
    /// environment overrides.
    pub fn new() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::with_name("Config.toml").required(false))
            .build()?;
        Self::finish(s, |key| env::var(key).ok())
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_file_with_env(path, |key| env::var(key).ok())
    }

    /// Like [`Settings::from_file`], with overrides taken from `lookup` instead of the
    /// process environment.
    pub fn from_file_with_env<F>(path: impl AsRef<Path>, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let s = Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()?;
        Self::finish(s, lookup)
    }

    /// Parses TOML only. No environment overrides are applied.
    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?
            .try_deserialize()
    }

    fn finish<F>(s: Config, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings: Self = s.try_deserialize()?;
        settings.apply_overrides(lookup)?;
        Ok(settings)
    }

    /// Applies overrides looked up by variable name. Blank values are ignored;
    /// malformed ones are errors.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(raw) = lookup("ETH_RPCS") {
            let list = parse_string_list(&raw);
            if !list.is_empty() {
                self.rpc.endpoints = list;
            }
        }

        if let Some(raw) = lookup("REQUEST_TIMEOUT") {
            self.rpc.request_timeout_ms = raw
                .trim()
                .parse()
                .map_err(|e| ConfigError::Message(format!("REQUEST_TIMEOUT '{}': {}", raw, e)))?;
        }

        if let Some(raw) = lookup("DEVIATION_BLOCK_OFFSETS") {
            self.guard.deviation_block_offsets = serde_json::from_str(raw.trim())
                .map_err(|e| ConfigError::Message(format!("DEVIATION_BLOCK_OFFSETS: {}", e)))?;
        }

        for (key, field) in LIMIT_ENV_VARS {
            if let Some(raw) = lookup(key) {
                let limits: AssetLimitSettings = serde_json::from_str(raw.trim())
                    .map_err(|e| ConfigError::Message(format!("{}: {}", key, e)))?;
                *self.guard.limits.for_field_mut(field) = limits;
            }
        }

        if let Some(raw) = lookup("PRICE_FEED") {
            self.guard.feed = raw.parse()?;
        }

        Ok(())
    }
}

/// Accepts a JSON array (`["a","b"]`), a bracketed list without quotes, or a plain
/// comma-separated string.
fn parse_string_list(input: &str) -> Vec<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return vec![];
    }

    if trimmed.starts_with('[') {
        if let Ok(v) = serde_json::from_str::<Vec<String>>(trimmed) {
            return v;
        }
        let without_brackets = trimmed.trim_start_matches('[').trim_end_matches(']');
        return split_list(without_brackets);
    }

    split_list(trimmed)
}

fn split_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(|s| s.trim().trim_matches('"').trim_matches('\'').to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
