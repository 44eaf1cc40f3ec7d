//! Central schema registry.
//!
//! Log payload schemas are generated from `beir-core` types with
//! [`schemars::schema_for!`]; the parameter document schema is hand-written.

use std::collections::HashMap;

use beir_core::trail;
use schemars::schema_for;

use crate::error::SchemaError;
use crate::risk_parameters::risk_parameters_schema;

/// Registry name of the parameter document schema.
pub const RISK_PARAMETERS: &str = "risk_parameters";

/// Central store of every JSON Schema in the pipeline.
pub struct SchemaRegistry {
    schemas: HashMap<&'static str, serde_json::Value>,
}

macro_rules! register {
    ($map:expr, $name:expr, $ty:ty) => {
        $map.insert($name, schema_for!($ty).to_value());
    };
}

impl SchemaRegistry {
    /// Build a registry containing the parameter schema and every log payload schema.
    #[must_use]
    pub fn new() -> Self {
        let mut schemas = HashMap::new();

        schemas.insert(RISK_PARAMETERS, risk_parameters_schema());

        // --- Execution log payloads (6) ---
        register!(schemas, "metadata_header", trail::ExecutionHeader);
        register!(schemas, "stage_log", trail::StageLog);
        register!(schemas, "calc_log", trail::CalcLog);
        register!(schemas, "config_warning", trail::ConfigWarning);
        register!(schemas, "critical_failure", trail::CriticalFailure);
        register!(schemas, "metadata_footer", trail::ExecutionFooter);

        // --- Run configuration (1) ---
        register!(schemas, "run_filters", beir_core::run::RunFilters);

        Self { schemas }
    }

    /// Get a schema by name. Returns `None` if not found.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&serde_json::Value> {
        self.schemas.get(name)
    }

    /// Compile a named schema once, for callers validating many instances.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::NotFound` for unknown names and
    /// `SchemaError::Generation` if the schema does not compile.
    pub fn compile(&self, name: &str) -> Result<jsonschema::Validator, SchemaError> {
        let schema = self
            .get(name)
            .ok_or_else(|| SchemaError::NotFound(name.to_string()))?;
        jsonschema::validator_for(schema).map_err(|e| SchemaError::Generation(format!("{e}")))
    }

    /// Validate a JSON value against a named schema.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::NotFound` if the schema name is unknown, or
    /// `SchemaError::ValidationFailed` carrying every message.
    pub fn validate(&self, name: &str, instance: &serde_json::Value) -> Result<(), SchemaError> {
        let validator = self.compile(name)?;
        check(&validator, instance)
    }

    /// List all registered schema names.
    #[must_use]
    pub fn list(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.schemas.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Number of registered schemas.
    #[must_use]
    pub fn schema_count(&self) -> usize {
        self.schemas.len()
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Run a compiled validator and collect every message.
///
/// # Errors
///
/// Returns `SchemaError::ValidationFailed` when any error is found.
pub fn check(validator: &jsonschema::Validator, instance: &serde_json::Value) -> Result<(), SchemaError> {
    let errors: Vec<String> = validator
        .iter_errors(instance)
        .map(|e| format!("{e}"))
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(SchemaError::ValidationFailed { errors })
    }
}

/// Registry name of the payload schema for an execution-log tag.
#[must_use]
pub fn schema_name_for_tag(tag: &str) -> Option<&'static str> {
    match tag {
        trail::TAG_HEADER => Some("metadata_header"),
        trail::TAG_STAGE => Some("stage_log"),
        trail::TAG_CALC => Some("calc_log"),
        trail::TAG_CONFIG_WARNING => Some("config_warning"),
        trail::TAG_CRITICAL_FAILURE => Some("critical_failure"),
        trail::TAG_FOOTER => Some("metadata_footer"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn registry() -> SchemaRegistry {
        SchemaRegistry::new()
    }

    #[test]
    fn registry_has_expected_count() {
        // 1 parameter document + 6 log payloads + 1 run filters
        assert_eq!(registry().schema_count(), 8);
    }

    #[test]
    fn registry_list_is_sorted() {
        let names = registry().list();
        let mut sorted = names.clone();
        sorted.sort_unstable();
        assert_eq!(names, sorted);
        assert!(names.contains(&RISK_PARAMETERS));
    }

    #[test]
    fn every_log_tag_has_a_schema() {
        let reg = registry();
        for tag in [
            trail::TAG_HEADER,
            trail::TAG_STAGE,
            trail::TAG_CALC,
            trail::TAG_CONFIG_WARNING,
            trail::TAG_CRITICAL_FAILURE,
            trail::TAG_FOOTER,
        ] {
            let name = schema_name_for_tag(tag).unwrap();
            assert!(reg.get(name).is_some(), "missing schema for {tag}");
        }
        assert_eq!(schema_name_for_tag("OTHER"), None);
    }

    #[test]
    fn unknown_schema_name() {
        let err = registry().validate("nope", &json!({})).unwrap_err();
        assert!(matches!(err, SchemaError::NotFound(name) if name == "nope"));
    }

    #[test]
    fn calc_log_schema_rejects_missing_context() {
        let err = registry()
            .validate("calc_log", &json!({"Row_ID": 1, "Status": "SKIPPED"}))
            .unwrap_err();
        assert!(matches!(err, SchemaError::ValidationFailed { .. }));
    }

    #[test]
    fn config_warning_schema_accepts_payload() {
        registry()
            .validate(
                "config_warning",
                &json!({
                    "Row_ID": 3,
                    "Context": "male|spleen",
                    "Status": "SKIPPED",
                    "Reason": "organ not found",
                    "Action": "row skipped"
                }),
            )
            .unwrap();
    }
}
