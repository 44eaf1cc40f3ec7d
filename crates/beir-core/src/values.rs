//! Sex-keyed coefficients.
//!
//! Parameter documents give coefficients either as a single number or as an
//! `{ "M": .., "F": .. }` pair. A member may be `null` or the string `"N/A"`,
//! both meaning "undefined for this sex" (e.g. breast risk in males).

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};

use crate::enums::Sex;

/// A coefficient that is either shared by both sexes or keyed per sex.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum SexDependentValue {
    Scalar(f64),
    BySex {
        #[serde(rename = "M", default, deserialize_with = "lenient_coefficient")]
        male: Option<f64>,
        #[serde(rename = "F", default, deserialize_with = "lenient_coefficient")]
        female: Option<f64>,
    },
}

impl SexDependentValue {
    /// Resolve the coefficient for one sex. `None` means undefined.
    #[must_use]
    pub fn resolve(&self, sex: Sex) -> Option<f64> {
        let value = match *self {
            Self::Scalar(v) => Some(v),
            Self::BySex { male, female } => match sex {
                Sex::Male => male,
                Sex::Female => female,
            },
        };
        value.filter(|v| !v.is_nan())
    }
}

/// Deserialize a number that may be written as `null`, `"N/A"`, or a numeric string.
///
/// # Errors
///
/// Fails on values that are neither numbers, null, nor strings.
pub fn lenient_coefficient<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Number(v)) => Some(v),
        Some(Raw::Text(s)) => s.trim().parse::<f64>().ok().filter(|v| !v.is_nan()),
        None => None,
    })
}

/// Same as [`lenient_coefficient`] for optional `SexDependentValue` fields.
///
/// `null` and `"N/A"` at the top level both collapse to `None`.
///
/// # Errors
///
/// Fails on shapes that are neither a number, a `{M, F}` object, null, nor a string.
pub fn lenient_sex_value<'de, D>(deserializer: D) -> Result<Option<SexDependentValue>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Value(SexDependentValue),
        Text(String),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Value(v)) => Some(v),
        Some(Raw::Text(s)) => s.trim().parse::<f64>().ok().map(SexDependentValue::Scalar),
        None => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[derive(Debug, Deserialize)]
    struct Holder {
        #[serde(default, deserialize_with = "lenient_sex_value")]
        beta: Option<SexDependentValue>,
    }

    #[test]
    fn scalar_resolves_for_both_sexes() {
        let v: SexDependentValue = serde_json::from_str("0.5").unwrap();
        assert_eq!(v.resolve(Sex::Male), Some(0.5));
        assert_eq!(v.resolve(Sex::Female), Some(0.5));
    }

    #[test]
    fn by_sex_with_undefined_member() {
        let v: SexDependentValue = serde_json::from_str(r#"{"M": "N/A", "F": 0.51}"#).unwrap();
        assert_eq!(v.resolve(Sex::Male), None);
        assert_eq!(v.resolve(Sex::Female), Some(0.51));
    }

    #[test]
    fn by_sex_with_missing_member() {
        let v: SexDependentValue = serde_json::from_str(r#"{"M": 0.3}"#).unwrap();
        assert_eq!(v.resolve(Sex::Male), Some(0.3));
        assert_eq!(v.resolve(Sex::Female), None);
    }

    #[test]
    fn optional_field_accepts_null_and_na() {
        let h: Holder = serde_json::from_str(r#"{"beta": null}"#).unwrap();
        assert!(h.beta.is_none());
        let h: Holder = serde_json::from_str(r#"{"beta": "N/A"}"#).unwrap();
        assert!(h.beta.is_none());
        let h: Holder = serde_json::from_str("{}").unwrap();
        assert!(h.beta.is_none());
    }

    #[test]
    fn serializes_back_to_document_shape() {
        let v = SexDependentValue::BySex {
            male: Some(0.27),
            female: Some(0.45),
        };
        assert_eq!(serde_json::to_value(v).unwrap(), serde_json::json!({"M": 0.27, "F": 0.45}));
    }
}
