// src/validator.rs

use crate::decimal::{DecimalInput, DecimalValue};
use crate::error::error_codes;
use crate::metrics;
use crate::settings::{AssetLimitSettings, PriceLimits};
use crate::types::{PriceField, PriceSnapshot, ReferenceEntry};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{json, Value};

const HUNDRED: DecimalValue = DecimalValue::Finite(Decimal::ONE_HUNDRED);

/// A value together with the block it was observed at.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BlockValue {
    pub block: u64,
    pub value: DecimalValue,
}

/// Reasons a price is refused.
///
/// The three policy violations carry their JSON-RPC error code and enough data to
/// reconstruct the decision. `ValueIsNaN` and `MissingReferenceValue` describe broken
/// inputs rather than unsafe prices and are reported as internal errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Value of \"{field}\" is NaN ({value})")]
    ValueIsNaN { field: PriceField, value: String },

    #[error("Reference value for deviation offset #{index} of \"{field}\" was not provided")]
    MissingReferenceValue { field: PriceField, index: usize },

    #[error("Unsafe Price: value of \"{field}\" too high")]
    ValueTooHigh {
        field: PriceField,
        max_value: DecimalValue,
        current_value: DecimalValue,
    },

    #[error("Unsafe Price: value of \"{field}\" too low")]
    ValueTooLow {
        field: PriceField,
        min_value: DecimalValue,
        current_value: DecimalValue,
    },

    #[error("Unsafe Price: Max deviation of \"{field}\" exceeded")]
    MaxDeviationExceeded {
        field: PriceField,
        max_deviation: DecimalValue,
        current_deviation: DecimalValue,
        current: BlockValue,
        reference: BlockValue,
    },
}

impl ValidationError {
    pub fn code(&self) -> i64 {
        match self {
            Self::ValueTooHigh { .. } => error_codes::VALUE_TOO_HIGH,
            Self::ValueTooLow { .. } => error_codes::VALUE_TOO_LOW,
            Self::MaxDeviationExceeded { .. } => error_codes::DEVIATION_TOO_HIGH,
            Self::ValueIsNaN { .. } | Self::MissingReferenceValue { .. } => error_codes::INTERNAL_ERROR,
        }
    }

    /// True for bound and deviation breaches, the failures a caller is allowed to see.
    pub fn is_policy_violation(&self) -> bool {
        matches!(
            self,
            Self::ValueTooHigh { .. } | Self::ValueTooLow { .. } | Self::MaxDeviationExceeded { .. }
        )
    }

    pub fn field(&self) -> PriceField {
        match self {
            Self::ValueIsNaN { field, .. }
            | Self::MissingReferenceValue { field, .. }
            | Self::ValueTooHigh { field, .. }
            | Self::ValueTooLow { field, .. }
            | Self::MaxDeviationExceeded { field, .. } => *field,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::ValueIsNaN { .. } => "value_is_nan",
            Self::MissingReferenceValue { .. } => "missing_reference_value",
            Self::ValueTooHigh { .. } => "value_too_high",
            Self::ValueTooLow { .. } => "value_too_low",
            Self::MaxDeviationExceeded { .. } => "max_deviation_exceeded",
        }
    }

    /// Structured payload of the JSON-RPC error object.
    pub fn data(&self) -> Value {
        match self {
            Self::ValueIsNaN { field, value } => json!({ "field": field, "value": value }),
            Self::MissingReferenceValue { field, index } => json!({ "field": field, "index": index }),
            Self::ValueTooHigh {
                max_value,
                current_value,
                ..
            } => json!({
                "maxValue": max_value,
                "currentValue": current_value,
            }),
            Self::ValueTooLow {
                min_value,
                current_value,
                ..
            } => json!({
                "minValue": min_value,
                "currentValue": current_value,
            }),
            Self::MaxDeviationExceeded {
                max_deviation,
                current_deviation,
                current,
                reference,
                ..
            } => json!({
                "maxDeviation": max_deviation,
                "currentDeviation": current_deviation,
                "currentValue": current,
                "referenceValue": reference,
            }),
        }
    }
}

/// Rejected limit configuration. A validator is never built from one of these.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LimitConfigError {
    #[error("{field}: maxValue is NaN ({raw})")]
    MaxValueIsNaN { field: PriceField, raw: String },
    #[error("{field}: minValue is NaN ({raw})")]
    MinValueIsNaN { field: PriceField, raw: String },
    #[error("{field}: minValue > maxValue ({min_value} > {max_value})")]
    MinAboveMax {
        field: PriceField,
        min_value: DecimalValue,
        max_value: DecimalValue,
    },
    #[error("{field}: maxDeviations contains NaN values (#{index}: {raw})")]
    DeviationIsNaN {
        field: PriceField,
        index: usize,
        raw: String,
    },
    #[error("{field}: maxDeviations contains negative values (#{index}: {value})")]
    NegativeDeviation {
        field: PriceField,
        index: usize,
        value: DecimalValue,
    },
}

/// `|value − reference| / value × 100`.
///
/// Relative to the *current* value, not the reference. A zero current value against a
/// different reference gives `+∞`; results that cannot be represented (0/0, overflow)
/// are also reported as `+∞` so they fail any finite limit.
pub fn deviation_percent(value: &DecimalValue, reference: &DecimalValue) -> DecimalValue {
    value
        .checked_sub(reference)
        .and_then(|diff| diff.abs().checked_div(value))
        .and_then(|ratio| ratio.checked_mul(&HUNDRED))
        .unwrap_or(DecimalValue::PosInfinity)
}

/// Bounds and historical-deviation limits for one field.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetLimitValidator {
    field: PriceField,
    max_value: DecimalValue,
    min_value: DecimalValue,
    max_deviations: Vec<DecimalValue>,
}

impl AssetLimitValidator {
    pub fn new(field: PriceField, settings: &AssetLimitSettings) -> Result<Self, LimitConfigError> {
        let max_value = match &settings.max_value {
            None => DecimalValue::PosInfinity,
            Some(raw) => DecimalValue::from_json(raw).map_err(|_| LimitConfigError::MaxValueIsNaN {
                field,
                raw: raw.to_string(),
            })?,
        };
        let min_value = match &settings.min_value {
            None => DecimalValue::NegInfinity,
            Some(raw) => DecimalValue::from_json(raw).map_err(|_| LimitConfigError::MinValueIsNaN {
                field,
                raw: raw.to_string(),
            })?,
        };
        if min_value > max_value {
            return Err(LimitConfigError::MinAboveMax {
                field,
                min_value,
                max_value,
            });
        }

        let mut max_deviations = Vec::with_capacity(settings.max_deviations.len());
        for (index, raw) in settings.max_deviations.iter().enumerate() {
            let deviation = DecimalValue::from_json(raw).map_err(|_| LimitConfigError::DeviationIsNaN {
                field,
                index,
                raw: raw.to_string(),
            })?;
            if deviation < DecimalValue::ZERO {
                return Err(LimitConfigError::NegativeDeviation {
                    field,
                    index,
                    value: deviation,
                });
            }
            max_deviations.push(deviation);
        }

        Ok(Self {
            field,
            max_value,
            min_value,
            max_deviations,
        })
    }

    /// No bounds and no deviation limits.
    pub fn unconstrained(field: PriceField) -> Self {
        Self {
            field,
            max_value: DecimalValue::PosInfinity,
            min_value: DecimalValue::NegInfinity,
            max_deviations: Vec::new(),
        }
    }

    pub fn field(&self) -> PriceField {
        self.field
    }

    pub fn max_value(&self) -> &DecimalValue {
        &self.max_value
    }

    pub fn min_value(&self) -> &DecimalValue {
        &self.min_value
    }

    pub fn max_deviations(&self) -> &[DecimalValue] {
        &self.max_deviations
    }

    /// Checks `value` (observed at `block_number`) against the bounds, then against each
    /// reference value paired positionally with `max_deviations`. Stops at the first failure.
    pub fn validate<V, R>(
        &self,
        block_number: u64,
        value: V,
        reference_values: &[(u64, R)],
    ) -> Result<(), ValidationError>
    where
        V: DecimalInput,
        R: DecimalInput,
    {
        let value = self.parse(&value)?;
        self.validate_upper_bound(&value)?;
        self.validate_lower_bound(&value)?;
        self.validate_deviations(block_number, &value, reference_values)
    }

    fn parse<V: DecimalInput>(&self, value: &V) -> Result<DecimalValue, ValidationError> {
        value.to_decimal().map_err(|e| ValidationError::ValueIsNaN {
            field: self.field,
            value: e.to_string(),
        })
    }

    fn validate_upper_bound(&self, value: &DecimalValue) -> Result<(), ValidationError> {
        if self.max_value >= *value {
            return Ok(());
        }
        Err(ValidationError::ValueTooHigh {
            field: self.field,
            max_value: self.max_value,
            current_value: *value,
        })
    }

    fn validate_lower_bound(&self, value: &DecimalValue) -> Result<(), ValidationError> {
        if self.min_value <= *value {
            return Ok(());
        }
        Err(ValidationError::ValueTooLow {
            field: self.field,
            min_value: self.min_value,
            current_value: *value,
        })
    }

    fn validate_deviations<R: DecimalInput>(
        &self,
        block_number: u64,
        value: &DecimalValue,
        reference_values: &[(u64, R)],
    ) -> Result<(), ValidationError> {
        let checks = reference_values.len().min(self.max_deviations.len());

        for ((reference_block, raw_reference), max_deviation) in reference_values
            .iter()
            .zip(&self.max_deviations)
            .take(checks)
        {
            let reference = self.parse(raw_reference)?;
            let deviation = deviation_percent(value, &reference);
            if deviation > *max_deviation {
                return Err(ValidationError::MaxDeviationExceeded {
                    field: self.field,
                    max_deviation: *max_deviation,
                    current_deviation: deviation,
                    current: BlockValue {
                        block: block_number,
                        value: *value,
                    },
                    reference: BlockValue {
                        block: *reference_block,
                        value: reference,
                    },
                });
            }
        }
        Ok(())
    }
}

/// One `AssetLimitValidator` per `PriceField`, applied to whole snapshots.
///
/// Also owns the deviation block offsets, since `max_deviations[i]` of every field is
/// meaningful only relative to `deviation_block_offsets[i]`.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositePriceValidator {
    deviation_block_offsets: Vec<u64>,
    // Indexed by `PriceField as usize`, one entry per variant.
    validators: Vec<AssetLimitValidator>,
}

impl Default for CompositePriceValidator {
    fn default() -> Self {
        Self {
            deviation_block_offsets: Vec::new(),
            validators: PriceField::ALL
                .iter()
                .map(|field| AssetLimitValidator::unconstrained(*field))
                .collect(),
        }
    }
}

impl CompositePriceValidator {
    pub fn new(deviation_block_offsets: Vec<u64>, limits: &PriceLimits) -> Result<Self, LimitConfigError> {
        let validators = PriceField::ALL
            .iter()
            .map(|field| AssetLimitValidator::new(*field, limits.for_field(*field)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            deviation_block_offsets,
            validators,
        })
    }

    pub fn deviation_block_offsets(&self) -> &[u64] {
        &self.deviation_block_offsets
    }

    pub fn validator(&self, field: PriceField) -> &AssetLimitValidator {
        &self.validators[field as usize]
    }

    /// Validates every field of `current` in insertion order, fail-fast.
    ///
    /// A reference snapshot lacking a field is compared against the current value itself
    /// (zero deviation). `MissingReferenceValue` is raised only when neither side has it.
    pub fn validate(
        &self,
        current_block: u64,
        current: &PriceSnapshot,
        references: &[ReferenceEntry],
    ) -> Result<(), ValidationError> {
        for field in current.fields() {
            let current_value = current.get(field);

            let mut series = Vec::with_capacity(references.len());
            for (index, entry) in references.iter().enumerate() {
                let value = entry
                    .snapshot
                    .get(field)
                    .or(current_value)
                    .ok_or(ValidationError::MissingReferenceValue { field, index })?;
                series.push((entry.block_number, *value));
            }

            if let Err(err) = self
                .validator(field)
                .validate(current_block, current_value.copied(), &series)
            {
                metrics::increment_validation_failure(field.as_str(), err.kind());
                return Err(err);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLOCK_NUMBER: u64 = 123_456_789;

    fn d(s: &str) -> DecimalValue {
        DecimalValue::parse(s).unwrap()
    }

    fn limits(value: Value) -> AssetLimitSettings {
        serde_json::from_value(value).unwrap()
    }

    fn validator(value: Value) -> AssetLimitValidator {
        AssetLimitValidator::new(PriceField::BAtomPrice, &limits(value)).unwrap()
    }

    const NO_REFERENCES: &[(u64, DecimalValue)] = &[];

    #[test]
    fn constructor_without_config_is_unconstrained() {
        let v = validator(json!({}));
        assert_eq!(v.max_value(), &DecimalValue::PosInfinity);
        assert_eq!(v.min_value(), &DecimalValue::NegInfinity);
        assert!(v.max_deviations().is_empty());
        assert_eq!(v, AssetLimitValidator::unconstrained(PriceField::BAtomPrice));
    }

    #[test]
    fn constructor_with_full_set_of_limits() {
        let v = validator(json!({ "maxDeviations": [0], "maxValue": 1.05, "minValue": "0.95" }));
        assert_eq!(v.max_value(), &d("1.05"));
        assert_eq!(v.min_value(), &d("0.95"));
        assert_eq!(v.max_deviations(), &[DecimalValue::ZERO]);
    }

    #[test]
    fn constructor_accepts_snake_case_keys() {
        let v = validator(json!({ "max_value": 31, "min_value": "30", "max_deviations": [2, 1.5, 0.5] }));
        assert_eq!(v.max_value(), &d("31"));
        assert_eq!(v.max_deviations(), &[d("2"), d("1.5"), d("0.5")]);
    }

    #[test]
    fn constructor_rejects_nan_bounds() {
        let empty = AssetLimitValidator::new(PriceField::BAtomPrice, &limits(json!({ "maxValue": "" })));
        assert!(matches!(empty, Err(LimitConfigError::MaxValueIsNaN { .. })));

        let null = AssetLimitValidator::new(PriceField::BAtomPrice, &limits(json!({ "maxValue": null })));
        assert!(matches!(null, Err(LimitConfigError::MaxValueIsNaN { .. })));

        let min = AssetLimitValidator::new(PriceField::BAtomPrice, &limits(json!({ "minValue": "abc" })));
        assert!(matches!(min, Err(LimitConfigError::MinValueIsNaN { .. })));
    }

    #[test]
    fn constructor_rejects_min_above_max() {
        let result = AssetLimitValidator::new(
            PriceField::BAtomPrice,
            &limits(json!({ "maxValue": 1.1, "minValue": 1.2 })),
        );
        assert!(matches!(result, Err(LimitConfigError::MinAboveMax { .. })));
    }

    #[test]
    fn constructor_rejects_bad_deviations() {
        let nan = AssetLimitValidator::new(
            PriceField::BAtomPrice,
            &limits(json!({ "maxDeviations": [0, "null"] })),
        );
        assert!(matches!(nan, Err(LimitConfigError::DeviationIsNaN { index: 1, .. })));

        let negative = AssetLimitValidator::new(
            PriceField::BAtomPrice,
            &limits(json!({ "maxDeviations": [-0.1] })),
        );
        let err = negative.unwrap_err();
        assert!(matches!(err, LimitConfigError::NegativeDeviation { index: 0, .. }));
        assert!(err.to_string().contains("maxDeviations contains negative values"));
    }

    #[test]
    fn value_on_the_bound_passes_and_just_above_fails() {
        let v = validator(json!({ "maxValue": 30 }));
        v.validate(BLOCK_NUMBER, "30", NO_REFERENCES).unwrap();

        let err = v.validate(BLOCK_NUMBER, "30.0001", NO_REFERENCES).unwrap_err();
        assert_eq!(err.code(), -40001);
        assert_eq!(err.to_string(), "Unsafe Price: value of \"bAtomPrice\" too high");
        assert_eq!(err.data()["maxValue"], json!("30"));
        assert_eq!(err.data()["currentValue"], json!("30.0001"));
    }

    #[test]
    fn value_below_min_fails() {
        let v = validator(json!({ "minValue": 1 }));
        let err = v.validate(BLOCK_NUMBER, "0.95", NO_REFERENCES).unwrap_err();
        assert_eq!(err.code(), -40002);
        assert_eq!(err.to_string(), "Unsafe Price: value of \"bAtomPrice\" too low");
        assert_eq!(
            err.data(),
            json!({ "minValue": "1", "currentValue": "0.95" })
        );
    }

    #[test]
    fn value_inside_bounds_passes() {
        let v = validator(json!({ "maxValue": 31, "minValue": 30 }));
        for value in ["30", "30.5", "31"] {
            v.validate(BLOCK_NUMBER, value, NO_REFERENCES).unwrap();
        }
    }

    #[test]
    fn unparsable_value_is_nan() {
        let v = validator(json!({ "maxValue": 2 }));
        let err = v.validate(BLOCK_NUMBER, None::<&str>, NO_REFERENCES).unwrap_err();
        assert!(matches!(err, ValidationError::ValueIsNaN { .. }));
        assert_eq!(err.code(), -32603);
        assert!(!err.is_policy_violation());
        assert!(v.validate(BLOCK_NUMBER, "", NO_REFERENCES).is_err());
    }

    #[test]
    fn max_deviation_exceeded_reports_both_blocks() {
        let v = validator(json!({ "maxDeviations": [2] }));
        let err = v
            .validate(BLOCK_NUMBER, "1", &[(BLOCK_NUMBER - 1000, d("1.021"))])
            .unwrap_err();
        assert_eq!(err.code(), -40003);
        assert_eq!(err.to_string(), "Unsafe Price: Max deviation of \"bAtomPrice\" exceeded");
        assert_eq!(
            err.data(),
            json!({
                "maxDeviation": "2",
                "currentDeviation": "2.1",
                "currentValue": { "block": BLOCK_NUMBER, "value": "1" },
                "referenceValue": { "block": BLOCK_NUMBER - 1000, "value": "1.021" },
            })
        );
    }

    #[test]
    fn deviation_divides_by_the_current_value() {
        // Relative to the reference this would be 20%; relative to the current value it is 25%.
        assert_eq!(deviation_percent(&d("0.8"), &d("1")), d("25"));
        let v = validator(json!({ "maxDeviations": [24] }));
        assert!(v.validate(BLOCK_NUMBER, "0.8", &[(BLOCK_NUMBER - 1, "1")]).is_err());
        let v = validator(json!({ "maxDeviations": [25] }));
        assert!(v.validate(BLOCK_NUMBER, "0.8", &[(BLOCK_NUMBER - 1, "1")]).is_ok());
    }

    #[test]
    fn zero_value_against_nonzero_reference_is_infinite_deviation() {
        let v = validator(json!({ "maxDeviations": [2] }));
        let err = v
            .validate(BLOCK_NUMBER, "0", &[(BLOCK_NUMBER - 1000, d("0.1"))])
            .unwrap_err();
        match err {
            ValidationError::MaxDeviationExceeded { current_deviation, .. } => {
                assert_eq!(current_deviation, DecimalValue::PosInfinity)
            }
            other => panic!("unexpected error {:?}", other),
        }
        assert_eq!(
            validator(json!({ "maxDeviations": [1000000] }))
                .validate(BLOCK_NUMBER, "0", &[(BLOCK_NUMBER - 1, "0.1")])
                .unwrap_err()
                .data()["currentDeviation"],
            json!("Infinity")
        );
    }

    #[test]
    fn zero_value_against_zero_reference_fails_closed() {
        assert_eq!(deviation_percent(&d("0"), &d("0")), DecimalValue::PosInfinity);

        let v = validator(json!({ "maxDeviations": [1000000] }));
        let err = v
            .validate(BLOCK_NUMBER, "0", &[(BLOCK_NUMBER - 1000, d("0"))])
            .unwrap_err();
        assert_eq!(err.code(), -40003);
        assert_eq!(err.data()["currentDeviation"], json!("Infinity"));
    }

    #[test]
    fn only_min_of_references_and_limits_are_checked() {
        let v = validator(json!({ "maxDeviations": [1] }));
        // The second reference would fail but has no matching limit.
        v.validate(BLOCK_NUMBER, "1", &[(BLOCK_NUMBER - 1, "1.005"), (BLOCK_NUMBER - 2, "5")])
            .unwrap();

        let v = validator(json!({ "maxDeviations": [1, 1, 1] }));
        v.validate(BLOCK_NUMBER, "1", &[(BLOCK_NUMBER - 1, "1.005")]).unwrap();
    }

    #[test]
    fn deviation_checks_stop_at_first_failure() {
        let v = validator(json!({ "maxDeviations": [1, 1] }));
        let err = v
            .validate(BLOCK_NUMBER, "1", &[(10, "1.5"), (20, "3")])
            .unwrap_err();
        assert_eq!(err.data()["referenceValue"]["block"], json!(10));
    }

    fn composite(value: Value) -> CompositePriceValidator {
        let limits: PriceLimits = serde_json::from_value(value).unwrap();
        CompositePriceValidator::new(vec![44800, 6400, 250], &limits).unwrap()
    }

    fn snapshot(atom: &str, batom: &str) -> PriceSnapshot {
        PriceSnapshot::new()
            .with(PriceField::BAtomPrice, d(batom))
            .with(PriceField::AtomPrice, d(atom))
    }

    #[test]
    fn composite_builds_a_validator_for_every_field() {
        let validator = composite(json!({ "atom_price": { "maxValue": 40, "minValue": 25, "maxDeviations": [5, 2.5, 1.5] } }));
        assert_eq!(validator.deviation_block_offsets(), &[44800, 6400, 250]);
        for field in PriceField::ALL {
            assert_eq!(validator.validator(field).field(), field);
        }
        assert_eq!(validator.validator(PriceField::AtomPrice).max_value(), &d("40"));
        assert_eq!(
            validator.validator(PriceField::EthPrice),
            &AssetLimitValidator::unconstrained(PriceField::EthPrice)
        );
    }

    #[test]
    fn composite_rejects_bad_field_config() {
        let limits: PriceLimits =
            serde_json::from_value(json!({ "b_atom_price": { "maxValue": 1, "minValue": 2 } })).unwrap();
        assert!(CompositePriceValidator::new(vec![], &limits).is_err());
    }

    #[test]
    fn composite_passes_valid_snapshot() {
        let validator = composite(json!({
            "b_atom_price": { "maxValue": 30 },
            "atom_price": { "maxValue": 40, "minValue": 17, "maxDeviations": [4] },
        }));
        let references = vec![ReferenceEntry::new(
            BLOCK_NUMBER - 44800,
            PriceSnapshot::new().with(PriceField::AtomPrice, d("30")),
        )];
        validator
            .validate(BLOCK_NUMBER, &snapshot("30", "30"), &references)
            .unwrap();
    }

    #[test]
    fn composite_fails_fast_in_snapshot_order() {
        let validator = composite(json!({
            "b_atom_price": { "maxValue": 25 },
            "atom_price": { "minValue": 31 },
        }));
        let err = validator
            .validate(BLOCK_NUMBER, &snapshot("30", "30"), &[])
            .unwrap_err();
        // bAtomPrice was inserted first, so its failure wins.
        assert_eq!(err.field(), PriceField::BAtomPrice);
        assert_eq!(err.code(), -40001);
    }

    #[test]
    fn missing_reference_field_compares_against_current_value() {
        let validator = composite(json!({ "atom_price": { "maxDeviations": [0, 0, 0] } }));
        let references = vec![
            ReferenceEntry::new(1, PriceSnapshot::new()),
            ReferenceEntry::new(2, PriceSnapshot::new().with(PriceField::BAtomPrice, d("99"))),
            ReferenceEntry::new(3, PriceSnapshot::new()),
        ];
        validator
            .validate(BLOCK_NUMBER, &PriceSnapshot::new().with(PriceField::AtomPrice, d("30")), &references)
            .unwrap();
    }

    #[test]
    fn zero_value_with_missing_reference_fails_closed() {
        let validator = composite(json!({ "atom_price": { "maxDeviations": [100] } }));
        let references = vec![ReferenceEntry::new(1, PriceSnapshot::new())];
        let err = validator
            .validate(BLOCK_NUMBER, &PriceSnapshot::new().with(PriceField::AtomPrice, d("0")), &references)
            .unwrap_err();
        assert!(matches!(
            err,
            ValidationError::MaxDeviationExceeded {
                field: PriceField::AtomPrice,
                current_deviation: DecimalValue::PosInfinity,
                ..
            }
        ));
    }

    #[test]
    fn missing_everywhere_is_missing_reference_value() {
        let validator = composite(json!({}));
        let mut current = PriceSnapshot::new().with(PriceField::EthPrice, d("3000"));
        current.mark_unavailable(PriceField::BEthRate);
        let references = vec![ReferenceEntry::new(1, PriceSnapshot::new())];
        let err = validator.validate(BLOCK_NUMBER, &current, &references).unwrap_err();
        assert_eq!(
            err,
            ValidationError::MissingReferenceValue {
                field: PriceField::BEthRate,
                index: 0
            }
        );
    }

    #[test]
    fn unavailable_current_value_without_references_is_nan() {
        let validator = composite(json!({}));
        let mut current = PriceSnapshot::new();
        current.mark_unavailable(PriceField::BEthRate);
        let err = validator.validate(BLOCK_NUMBER, &current, &[]).unwrap_err();
        assert!(matches!(err, ValidationError::ValueIsNaN { field: PriceField::BEthRate, .. }));
    }

    #[test]
    fn references_pair_positionally_with_deviation_limits() {
        let validator = composite(json!({ "b_atom_price": { "maxDeviations": [2, 1.5, 0.5] } }));
        let current = PriceSnapshot::new().with(PriceField::BAtomPrice, d("100"));
        // 1% off at offset 250 breaches only the third limit.
        let references = vec![
            ReferenceEntry::new(BLOCK_NUMBER - 44800, PriceSnapshot::new().with(PriceField::BAtomPrice, d("100"))),
            ReferenceEntry::new(BLOCK_NUMBER - 6400, PriceSnapshot::new().with(PriceField::BAtomPrice, d("100"))),
            ReferenceEntry::new(BLOCK_NUMBER - 250, PriceSnapshot::new().with(PriceField::BAtomPrice, d("99"))),
        ];
        let err = validator.validate(BLOCK_NUMBER, &current, &references).unwrap_err();
        assert_eq!(err.data()["maxDeviation"], json!("0.5"));
        assert_eq!(err.data()["referenceValue"]["block"], json!(BLOCK_NUMBER - 250));
    }
}
