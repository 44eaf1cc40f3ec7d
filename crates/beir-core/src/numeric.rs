//! Numeric text formats shared by every artifact.
//!
//! Artifacts must be byte-stable across runs and readable by the tools that
//! consumed the legacy outputs, so numbers follow C `printf` conventions:
//! scientific notation with a signed, at least two-digit exponent (`1.50e-02`),
//! and lowercase `nan` / `inf`.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Format `value` as `%.{digits}e`.
#[must_use]
pub fn format_scientific(value: f64, digits: usize) -> String {
    if let Some(special) = special_text(value) {
        return special.to_string();
    }
    let raw = format!("{value:.digits$e}");
    let Some((mantissa, exponent)) = raw.split_once('e') else {
        return raw;
    };
    let (sign, magnitude) = exponent
        .strip_prefix('-')
        .map_or(('+', exponent), |rest| ('-', rest));
    format!("{mantissa}e{sign}{magnitude:0>2}")
}

/// Format `value` as `%.{digits}f`.
#[must_use]
pub fn format_fixed(value: f64, digits: usize) -> String {
    special_text(value).map_or_else(|| format!("{value:.digits$}"), str::to_string)
}

/// Shortest round-trip decimal text, with `.0` kept on integral values.
///
/// Used for scenario keys (`B_1.0`, `A_0.03`) and for coefficients echoed in
/// equation strings.
#[must_use]
pub fn float_repr(value: f64) -> String {
    if let Some(special) = special_text(value) {
        return special.to_string();
    }
    if value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}

/// Permissive numeric normalizer for report text.
///
/// Decimal commas become points and every character outside
/// `[0-9.+-eE]` is dropped. Unparseable input yields `NaN`, never an error.
#[must_use]
pub fn parse_lenient(text: &str) -> f64 {
    let cleaned: String = text
        .trim()
        .replace(',', ".")
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | '+' | '-' | 'e' | 'E'))
        .collect();
    cleaned.parse::<f64>().unwrap_or_else(|_| {
        tracing::debug!(input = text, "unparseable number, using NaN");
        f64::NAN
    })
}

/// Parse a CSV cell: empty means missing.
#[must_use]
pub fn parse_cell(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok()
}

const fn special_text(value: f64) -> Option<&'static str> {
    if value.is_nan() {
        Some("nan")
    } else if value.is_infinite() {
        if value.is_sign_positive() {
            Some("inf")
        } else {
            Some("-inf")
        }
    } else {
        None
    }
}

/// A float carried through the audit log as `%.4e` text.
///
/// Deserializes from either the text form or a bare JSON number, so logs
/// edited by hand or produced by older tools still replay.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct SciValue(pub f64);

impl SciValue {
    pub const DIGITS: usize = 4;

    #[must_use]
    pub const fn get(self) -> f64 {
        self.0
    }
}

impl fmt::Display for SciValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_scientific(self.0, Self::DIGITS))
    }
}

impl From<f64> for SciValue {
    fn from(value: f64) -> Self {
        Self(value)
    }
}

impl Serialize for SciValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SciValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(f64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(v) => Ok(Self(v)),
            Raw::Text(s) => s
                .trim()
                .parse::<f64>()
                .map(Self)
                .map_err(|_| serde::de::Error::custom(format!("not a number: {s}"))),
        }
    }
}

impl JsonSchema for SciValue {
    fn schema_name() -> std::borrow::Cow<'static, str> {
        "SciValue".into()
    }

    fn json_schema(_generator: &mut schemars::SchemaGenerator) -> schemars::Schema {
        schemars::json_schema!({
            "type": ["string", "number"],
            "description": "Floating point value formatted as %.4e"
        })
    }
}
