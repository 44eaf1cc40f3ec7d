//! # beir-schema
//!
//! JSON Schema registry and validation for the dose-to-risk pipeline.
//!
//! This crate provides:
//! - `SchemaRegistry`: central store of every JSON Schema in the system
//! - The hand-written `risk_parameters` schema and fail-fast parameter loading
//! - Line-by-line validation of execution logs against the payload schemas
//!
//! ## Architecture
//!
//! Log payload types are defined in `beir-core` with `#[derive(JsonSchema)]`.
//! The parameter document keeps a hand-written schema because its shapes
//! (number-or-object coefficients, per-model parameter blocks) are looser on
//! the wire than the typed model in `beir_core::params`.

mod error;
mod loader;
mod log_validator;
mod registry;
mod risk_parameters;

pub use error::{ParameterError, SchemaError};
pub use loader::{load_risk_parameters, read_parameter_document, validate_risk_parameters};
pub use log_validator::{LogValidationError, LogValidationReport, validate_execution_log};
pub use registry::{RISK_PARAMETERS, SchemaRegistry, check, schema_name_for_tag};
pub use risk_parameters::risk_parameters_schema;
