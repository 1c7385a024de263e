use crate::decimal::DecimalValue;
use ethers::abi::Token;
use ethers::types::{Address, I256, U256};
use rust_decimal::Decimal;
use std::str::FromStr;

// Contract answers are fixed-point integers; scale them into human decimals.
pub fn u256_to_decimal(value: U256, decimals: u8) -> Result<Decimal, ConversionError> {
    let value_str = value.to_string();
    let decimal_value = Decimal::from_str(&value_str)
        .map_err(|e| ConversionError::InvalidDecimal(format!("{}: {}", value_str, e)))?;

    let divisor = pow10(decimals)?;
    decimal_value
        .checked_div(divisor)
        .ok_or(ConversionError::Overflow)
}

// Chainlink `latestAnswer` is signed.
pub fn i256_to_decimal(value: I256, decimals: u8) -> Result<Decimal, ConversionError> {
    let value_str = value.to_string();
    let decimal_value = Decimal::from_str(&value_str)
        .map_err(|e| ConversionError::InvalidDecimal(format!("{}: {}", value_str, e)))?;

    let divisor = pow10(decimals)?;
    decimal_value
        .checked_div(divisor)
        .ok_or(ConversionError::Overflow)
}

/// Decodes a single numeric ABI output (int or uint) into a scaled `DecimalValue`.
pub fn token_to_decimal(token: &Token, decimals: u8) -> Result<DecimalValue, ConversionError> {
    match token {
        Token::Uint(raw) => u256_to_decimal(*raw, decimals).map(DecimalValue::Finite),
        Token::Int(raw) => i256_to_decimal(I256::from_raw(*raw), decimals).map(DecimalValue::Finite),
        other => Err(ConversionError::UnexpectedToken(format!("{:?}", other))),
    }
}

pub fn string_to_address(s: &str) -> Result<Address, ConversionError> {
    Address::from_str(s.trim()).map_err(|e| ConversionError::InvalidAddress(format!("{}: {}", s, e)))
}

fn pow10(decimals: u8) -> Result<Decimal, ConversionError> {
    if decimals > 28 {
        return Err(ConversionError::Overflow);
    }
    Ok(Decimal::from_i128_with_scale(10i128.pow(decimals as u32), 0))
}

#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    #[error("Invalid decimal: {0}")]
    InvalidDecimal(String),
    #[error("Overflow in conversion")]
    Overflow,
    #[error("Invalid address: {0}")]
    InvalidAddress(String),
    #[error("Unexpected ABI token: {0}")]
    UnexpectedToken(String),
}
