//! Shared field validators and conversion of `validator` output into the
//! field-error map returned to clients.

use std::borrow::Cow;

use rust_decimal::Decimal;
use validator::{ValidationError, ValidationErrors};

use crate::error::FieldErrors;

/// Maximum length of short free-text fields.
pub const MAX_TEXT_LEN: u64 = 255;

/// Largest amount a `NUMERIC(14, 2)` column holds: 999999999999.99, i.e.
/// the integer 99_999_999_999_999 (0x5AF3_107A_3FFF) at scale 2.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(0x107A_3FFF, 0x5AF3, 0, false, 2);

/// Decimal places stored for amounts and percentages.
pub const MONEY_SCALE: u32 = 2;

/// Amounts (invoice value, PO value, report value) must fit `NUMERIC(14, 2)`:
/// not negative, at most [`MAX_AMOUNT`], at most two decimal places.
pub fn non_negative(value: &Decimal) -> Result<(), ValidationError> {
    if *value < Decimal::ZERO {
        return Err(error("min", "The value must be at least 0."));
    }
    if *value > MAX_AMOUNT {
        return Err(error(
            "max",
            "The value may not be greater than 999,999,999,999.99.",
        ));
    }
    check_scale(value)
}

/// Completion percentages are bounded to `0..=100` with two decimal places.
pub fn percentage(value: &Decimal) -> Result<(), ValidationError> {
    if *value < Decimal::ZERO || *value > Decimal::ONE_HUNDRED {
        return Err(error("between", "The value must be between 0 and 100."));
    }
    check_scale(value)
}

/// Trailing zeros do not count: `1.500` has two decimal places.
fn check_scale(value: &Decimal) -> Result<(), ValidationError> {
    if value.normalize().scale() > MONEY_SCALE {
        return Err(error(
            "scale",
            "The value may not have more than 2 decimal places.",
        ));
    }
    Ok(())
}

fn error(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Borrowed(message));
    err
}

/// Flatten `ValidationErrors` into `field -> [messages]`.
///
/// Nested struct and list errors are not used by any DTO, so only direct
/// field errors are collected.
pub fn field_errors(errors: &ValidationErrors) -> FieldErrors {
    let mut out = FieldErrors::new();
    for (field, errs) in errors.field_errors() {
        let messages = errs
            .iter()
            .map(|e| match &e.message {
                Some(msg) => msg.to_string(),
                None => default_message(&field, e),
            })
            .collect();
        out.insert(field.to_string(), messages);
    }
    out
}

fn default_message(field: &str, error: &ValidationError) -> String {
    let label = field.replace('_', " ");
    match error.code.as_ref() {
        "required" => format!("The {label} field is required."),
        "length" if is_blank(error) => format!("The {label} field is required."),
        "length" => format!("The {label} may not be greater than {MAX_TEXT_LEN} characters."),
        _ => format!("The {label} field is invalid."),
    }
}

/// A `length(min = 1)` failure on an empty string reads as a missing field.
fn is_blank(error: &ValidationError) -> bool {
    error
        .params
        .get("value")
        .and_then(|v| v.as_str())
        .is_some_and(|s| s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Sample {
        #[validate(required, length(min = 1, max = 255))]
        name: Option<String>,
        #[validate(custom(function = "non_negative"))]
        amount: Decimal,
    }

    #[test]
    fn negative_amount_rejected() {
        assert!(non_negative(&Decimal::new(-1, 2)).is_err());
        assert!(non_negative(&Decimal::ZERO).is_ok());
        assert!(non_negative(&Decimal::new(12_50, 2)).is_ok());
    }

    #[test]
    fn amount_must_fit_the_money_column() {
        assert!(non_negative(&MAX_AMOUNT).is_ok());
        assert_eq!(MAX_AMOUNT, Decimal::new(99_999_999_999_999, 2));
        assert!(non_negative(&Decimal::new(10_i64.pow(13), 0)).is_err());
        assert!(non_negative(&(MAX_AMOUNT + Decimal::new(1, 2))).is_err());
    }

    #[test]
    fn amount_scale_is_limited_to_cents() {
        assert!(non_negative(&Decimal::new(12_345, 3)).is_err());
        assert!(non_negative(&Decimal::new(1_500, 3)).is_ok(), "1.500 is 1.50");
        assert!(percentage(&Decimal::new(33_333, 3)).is_err());
        assert!(percentage(&Decimal::new(3_350, 2)).is_ok());
    }

    #[test]
    fn percentage_bounds() {
        assert!(percentage(&Decimal::ZERO).is_ok());
        assert!(percentage(&Decimal::ONE_HUNDRED).is_ok());
        assert!(percentage(&Decimal::new(1001, 1)).is_err());
        assert!(percentage(&Decimal::NEGATIVE_ONE).is_err());
    }

    #[test]
    fn empty_string_reads_as_required() {
        let sample = Sample {
            name: Some(String::new()),
            amount: Decimal::ZERO,
        };
        let fields = field_errors(&sample.validate().unwrap_err());
        assert_eq!(fields["name"], vec!["The name field is required."]);
    }

    #[test]
    fn field_errors_collects_messages_per_field() {
        let sample = Sample {
            name: None,
            amount: Decimal::NEGATIVE_ONE,
        };
        let errors = sample.validate().unwrap_err();
        let fields = field_errors(&errors);

        assert_eq!(fields["name"], vec!["The name field is required."]);
        assert_eq!(fields["amount"], vec!["The value must be at least 0."]);
    }
}
