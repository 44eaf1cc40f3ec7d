//! Untyped view of the risk parameter document.
//!
//! The auditor never shares the engine's typed parameter model. It walks the
//! raw JSON and applies its own defaults: a missing, `null`, or `"N/A"`
//! coefficient reads as 0.

use std::path::Path;

use serde_json::{Map, Value};

use crate::error::AuditError;

pub const DEFAULT_LATENCY: f64 = 5.0;
pub const DEFAULT_DDREF: f64 = 1.0;
pub const DEFAULT_VII_MODEL: &str = "solid";
pub const DEFAULT_V_MODEL: &str = "linear";

/// Reference configurations keyed by organ.
#[derive(Debug, Clone, Default)]
pub struct Reference {
    organs: Map<String, Value>,
}

impl Reference {
    /// Read and schema-validate the document at `path`.
    ///
    /// # Errors
    ///
    /// Returns `AuditError::Parameters` when the file is unreadable, not JSON,
    /// or violates the parameter schema.
    pub fn load(path: &Path) -> Result<Self, AuditError> {
        let document = beir_schema::read_parameter_document(path)?;
        Ok(Self::from_document(&document))
    }

    #[must_use]
    pub fn from_document(document: &Value) -> Self {
        let organs = document
            .get("configurations")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        Self { organs }
    }

    #[must_use]
    pub fn organ(&self, name: &str) -> Option<OrganRef<'_>> {
        self.organs.get(name).map(OrganRef)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.organs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.organs.is_empty()
    }
}

/// One organ entry of the reference document.
#[derive(Debug, Clone, Copy)]
pub struct OrganRef<'a>(&'a Value);

impl<'a> OrganRef<'a> {
    fn block(&self, key: &str) -> Option<&'a Value> {
        self.0.get(key).filter(|v| v.is_object())
    }

    #[must_use]
    pub fn vii_model_type(&self) -> &'a str {
        self.block("beir_vii")
            .and_then(|b| b.get("model_type"))
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_VII_MODEL)
    }

    #[must_use]
    pub fn vii_latency(&self) -> f64 {
        self.block("beir_vii")
            .and_then(|b| b.get("latency"))
            .and_then(number)
            .unwrap_or(DEFAULT_LATENCY)
    }

    #[must_use]
    pub fn vii_ddref(&self) -> f64 {
        self.block("beir_vii")
            .and_then(|b| b.get("ddref"))
            .and_then(number)
            .unwrap_or(DEFAULT_DDREF)
    }

    /// A BEIR VII coefficient; `beta` is resolved per sex.
    #[must_use]
    pub fn vii_param(&self, key: &str, sex_key: &str) -> f64 {
        let value = self
            .block("beir_vii")
            .and_then(|b| b.get("params"))
            .and_then(|p| p.get(key));
        sex_coefficient(value, sex_key)
    }

    #[must_use]
    pub fn v_model_type(&self) -> &'a str {
        self.block("beir_v")
            .and_then(|b| b.get("model_type"))
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_V_MODEL)
    }

    /// Raw BEIR V parameter value.
    #[must_use]
    pub fn v_param(&self, key: &str) -> Option<&'a Value> {
        self.block("beir_v")
            .and_then(|b| b.get("params"))
            .and_then(|p| p.get(key))
    }
}

/// Numeric reading of a JSON value. Numeric strings are accepted, anything
/// else is `None`.
#[must_use]
pub fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| !v.is_nan()),
        _ => None,
    }
}

/// Coefficient with the auditor's defaults: absent or unreadable is 0.
#[must_use]
pub fn coefficient(value: Option<&Value>) -> f64 {
    value.and_then(number).unwrap_or(0.0)
}

/// Like [`coefficient`], resolving `{"M": .., "F": ..}` objects by sex.
#[must_use]
pub fn sex_coefficient(value: Option<&Value>, sex_key: &str) -> f64 {
    match value {
        Some(Value::Object(by_sex)) => coefficient(by_sex.get(sex_key)),
        other => coefficient(other),
    }
}
