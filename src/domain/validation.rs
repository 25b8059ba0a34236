//! Field-level input checks shared by the catalog and order rules.
//!
//! Checks accumulate into a [`Validator`] so a request with several bad fields
//! is rejected once, with every problem listed.

use std::sync::LazyLock;

use bigdecimal::{BigDecimal, Zero};
use regex::Regex;
use uuid::Uuid;

use super::errors::{DomainError, FieldError};

static ZIP_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{5}(-\d{4})?$").expect("zip code pattern"));
static SKU: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9-]+$").expect("sku pattern"));
static HTTP_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^https?://.+").expect("url pattern"));

/// Exclusive upper bound of a `NUMERIC(12, 2)` column.
const MAX_AMOUNT: i64 = 10_000_000_000;

#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<FieldError>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `message` against `field` unless `ok` holds.
    pub fn check(&mut self, ok: bool, field: &str, message: &str) -> &mut Self {
        if !ok {
            self.errors.push(FieldError::new(field, message));
        }
        self
    }

    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) -> &mut Self {
        self.errors.push(FieldError::new(field, message));
        self
    }

    pub fn text_length(
        &mut self,
        value: &str,
        field: &str,
        min: usize,
        max: usize,
        message: &str,
    ) -> &mut Self {
        let len = value.trim().chars().count();
        self.check((min..=max).contains(&len), field, message)
    }

    pub fn max_length(&mut self, value: &str, field: &str, max: usize, message: &str) -> &mut Self {
        self.check(value.trim().chars().count() <= max, field, message)
    }

    pub fn non_negative(&mut self, value: &BigDecimal, field: &str, message: &str) -> &mut Self {
        self.check(*value >= BigDecimal::zero(), field, message)
    }

    /// A stored money amount: non-negative, whole cents, within column range.
    /// `message` is used for the sign check; the other two have their own.
    pub fn amount(&mut self, value: &BigDecimal, field: &str, message: &str) -> &mut Self {
        if *value < BigDecimal::zero() {
            return self.push(field, message);
        }
        if !has_cents_precision(value) {
            return self.push(field, "Amount must have at most 2 decimal places");
        }
        self.check(
            *value < BigDecimal::from(MAX_AMOUNT),
            field,
            "Amount is too large",
        )
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn finish(self) -> Result<(), DomainError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(DomainError::Validation(self.errors))
        }
    }
}

pub fn is_zip_code(value: &str) -> bool {
    ZIP_CODE.is_match(value)
}

pub fn is_sku(value: &str) -> bool {
    SKU.is_match(value)
}

/// True when `value` carries no digits beyond the cent.
pub fn has_cents_precision(value: &BigDecimal) -> bool {
    value.with_scale(2) == *value
}

pub fn is_http_url(value: &str) -> bool {
    HTTP_URL.is_match(value)
}

/// Parses a path or query identifier, turning a malformed value into a 400.
pub fn parse_id(raw: &str, field: &str, message: &str) -> Result<Uuid, DomainError> {
    Uuid::parse_str(raw.trim()).map_err(|_| DomainError::invalid_field(field, message))
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn zip_code_accepts_five_and_nine_digit_forms() {
        assert!(is_zip_code("94107"));
        assert!(is_zip_code("94107-1234"));
        assert!(!is_zip_code("9410"));
        assert!(!is_zip_code("94107-12"));
        assert!(!is_zip_code("ABCDE"));
    }

    #[test]
    fn sku_allows_letters_digits_and_hyphens_only() {
        assert!(is_sku("ELEC-001"));
        assert!(!is_sku("ELEC 001"));
        assert!(!is_sku("ELEC_001"));
        assert!(!is_sku(""));
    }

    #[test]
    fn image_url_must_be_http() {
        assert!(is_http_url("https://cdn.example.com/a.png"));
        assert!(is_http_url("http://x"));
        assert!(!is_http_url("ftp://cdn.example.com/a.png"));
    }

    #[test]
    fn validator_collects_all_failures() {
        let mut v = Validator::new();
        v.text_length("a", "name", 2, 100, "too short")
            .non_negative(&BigDecimal::from_str("-1").unwrap(), "price", "negative")
            .check(true, "sku", "never reported");
        match v.finish() {
            Err(DomainError::Validation(errors)) => {
                let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
                assert_eq!(fields, vec!["name", "price"]);
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn amounts_must_fit_the_money_columns() {
        let dec = |s: &str| BigDecimal::from_str(s).unwrap();
        let mut v = Validator::new();
        v.amount(&dec("19.99"), "ok", "negative")
            .amount(&dec("19.5"), "short", "negative")
            .amount(&dec("19.999"), "precise", "negative")
            .amount(&dec("10000000000"), "huge", "negative")
            .amount(&dec("-0.01"), "below", "negative");
        match v.finish() {
            Err(DomainError::Validation(errors)) => {
                let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
                assert_eq!(fields, vec!["precise", "huge", "below"]);
                assert_eq!(errors[0].message, "Amount must have at most 2 decimal places");
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn max_length_counts_trimmed_chars() {
        let mut v = Validator::new();
        v.max_length("  abc  ", "a", 3, "long").max_length("abcd", "b", 3, "long");
        match v.finish() {
            Err(DomainError::Validation(errors)) => assert_eq!(errors[0].field, "b"),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn parse_id_rejects_garbage() {
        let err = parse_id("not-a-uuid", "id", "Invalid order ID").unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert!(parse_id(&Uuid::new_v4().to_string(), "id", "Invalid order ID").is_ok());
    }
}
