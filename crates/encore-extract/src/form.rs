//! URL-encoded form fields and typed conversion out of them.
//!
//! A body such as `Title=Foo&ArtistId=1` is decoded into [`FormFields`], a flat
//! string map. Types that can be built from a form implement
//! [`FromFormFields`] and pull each required field with the typed accessors.
//! The first missing or malformed field fails the whole conversion; there are
//! no partially built values.

use crate::error::{ExtractionError, ExtractionSource};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::str::FromStr;

/// Decoded `application/x-www-form-urlencoded` fields.
///
/// # Example
///
/// ```rust
/// use encore_extract::FormFields;
///
/// let fields = FormFields::parse("q=hello+world&n=1&n=2").unwrap();
/// assert_eq!(fields.get("q"), Some("hello world"));
/// assert_eq!(fields.get("n"), Some("2"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormFields {
    fields: HashMap<String, String>,
}

impl FormFields {
    /// Decodes a form body. When a key repeats, the last occurrence wins.
    ///
    /// # Errors
    ///
    /// Returns an error if the body is not valid URL-encoded text.
    pub fn parse(body: &str) -> Result<Self, ExtractionError> {
        let pairs: Vec<(String, String)> = serde_urlencoded::from_str(body)
            .map_err(|e| ExtractionError::deserialization_failed(ExtractionSource::Form, e.to_string()))?;
        Ok(pairs.into_iter().collect())
    }

    /// Returns a field value, if present.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    /// Returns the number of distinct keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if there are no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns a required string field.
    pub fn required(&self, key: &str) -> Result<&str, ExtractionError> {
        self.get(key)
            .ok_or_else(|| ExtractionError::missing(ExtractionSource::Form, key))
    }

    /// Returns a required base-10 `i32` field.
    pub fn required_i32(&self, key: &str) -> Result<i32, ExtractionError> {
        let raw = self.required(key)?;
        raw.parse::<i32>()
            .map_err(|e| ExtractionError::invalid_type(ExtractionSource::Form, key, e.to_string()))
    }

    /// Returns a required decimal field.
    ///
    /// Only ASCII digits with at most one `.` separator are accepted,
    /// independent of locale: no sign, exponent, grouping, or whitespace.
    pub fn required_decimal(&self, key: &str) -> Result<Decimal, ExtractionError> {
        let raw = self.required(key)?;
        parse_invariant_decimal(raw)
            .ok_or_else(|| ExtractionError::invalid_type(ExtractionSource::Form, key, "expected decimal"))
    }
}

impl FromIterator<(String, String)> for FormFields {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

fn parse_invariant_decimal(raw: &str) -> Option<Decimal> {
    let mut digits = 0usize;
    let mut points = 0usize;
    for c in raw.chars() {
        match c {
            '0'..='9' => digits += 1,
            '.' => points += 1,
            _ => return None,
        }
    }
    if digits == 0 || points > 1 {
        return None;
    }
    Decimal::from_str(raw).ok()
}

/// Types that can be built from decoded form fields.
///
/// # Example
///
/// ```rust
/// use encore_extract::{ExtractionError, FormFields, FromFormFields};
///
/// struct Login {
///     user: String,
///     pin: i32,
/// }
///
/// impl FromFormFields for Login {
///     fn from_form_fields(fields: &FormFields) -> Result<Self, ExtractionError> {
///         Ok(Self {
///             user: fields.required("User")?.to_string(),
///             pin: fields.required_i32("Pin")?,
///         })
///     }
/// }
///
/// let fields = FormFields::parse("User=ann&Pin=1234").unwrap();
/// assert_eq!(Login::from_form_fields(&fields).unwrap().pin, 1234);
/// ```
pub trait FromFormFields: Sized {
    /// Builds `Self` from `fields`, failing on the first missing or malformed field.
    fn from_form_fields(fields: &FormFields) -> Result<Self, ExtractionError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_percent_decoding() {
        let fields = FormFields::parse("ArtUrl=http%3A%2F%2Fx%2Fa.png&Title=A+B%26C").unwrap();
        assert_eq!(fields.get("ArtUrl"), Some("http://x/a.png"));
        assert_eq!(fields.get("Title"), Some("A B&C"));
    }

    #[test]
    fn test_key_without_value_is_empty() {
        let fields = FormFields::parse("a&b=").unwrap();
        assert_eq!(fields.get("a"), Some(""));
        assert_eq!(fields.get("b"), Some(""));
    }

    #[test]
    fn test_required_missing() {
        let fields = FormFields::parse("Title=Foo").unwrap();
        let err = fields.required("Price").unwrap_err();
        assert_eq!(err.field(), Some("Price"));
        assert_eq!(err.error_code(), "MISSING_FIELD");
    }

    #[test]
    fn test_required_i32() {
        let fields =
            FormFields::parse("a=42&b=-7&c=4.2&d=%2B1&e=%201&f=99999999999&g=+1").unwrap();
        assert_eq!(fields.required_i32("a").unwrap(), 42);
        assert_eq!(fields.required_i32("b").unwrap(), -7);
        assert_eq!(fields.required_i32("d").unwrap(), 1);
        assert!(fields.required_i32("c").is_err());
        assert!(fields.required_i32("e").is_err());
        assert!(fields.required_i32("f").is_err());
        // `+` is a space in form encoding
        assert_eq!(fields.get("g"), Some(" 1"));
        assert!(fields.required_i32("g").is_err());
    }

    #[test]
    fn test_required_decimal_invariant() {
        let fields =
            FormFields::parse("a=9.99&b=10&c=9%2C99&d=-1&e=1e3&f=1.2.3&g=.&i=%209.99").unwrap();
        assert_eq!(fields.required_decimal("a").unwrap(), Decimal::new(999, 2));
        assert_eq!(fields.required_decimal("b").unwrap(), Decimal::new(10, 0));
        for key in ["c", "d", "e", "f", "g", "i"] {
            assert!(fields.required_decimal(key).is_err(), "{key} should be rejected");
        }
    }

    fn encode(pairs: &[(String, String)]) -> String {
        serde_urlencoded::to_string(pairs).unwrap()
    }

    proptest! {
        #[test]
        fn prop_every_pair_is_decoded(
            pairs in proptest::collection::vec(("[A-Za-z]{1,8}", "[ -~]{0,12}"), 0..8)
        ) {
            let fields = FormFields::parse(&encode(&pairs)).unwrap();
            let mut expected = HashMap::new();
            for (k, v) in &pairs {
                expected.insert(k.clone(), v.clone());
            }
            prop_assert_eq!(fields.len(), expected.len());
            for (k, v) in &expected {
                prop_assert_eq!(fields.get(k), Some(v.as_str()));
            }
        }

        #[test]
        fn prop_last_duplicate_wins(key in "[a-z]{1,6}", first in "[a-z0-9]{0,6}", last in "[a-z0-9]{0,6}") {
            let body = encode(&[(key.clone(), first), (key.clone(), last.clone())]);
            let fields = FormFields::parse(&body).unwrap();
            prop_assert_eq!(fields.get(&key), Some(last.as_str()));
        }
    }
}
