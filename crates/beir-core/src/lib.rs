//! # beir-core
//!
//! Core types, wire formats, and error types for the dose-to-risk pipeline.
//!
//! This crate provides the foundational types shared across all `beir-*` crates:
//! - Closed enums for sex, model names, model override, and output metrics
//! - Sex-keyed coefficients (`SexDependentValue`) and the typed risk parameter set
//! - Fixed column layouts of the extraction CSV
//! - Semicolon CSV codec and the dose matrix wire format
//! - Python-compatible numeric formatting for artifact byte-stability
//! - Audit trail envelope (`AuditEvent`) and the injected `AuditSink`
//! - Run stamp, artifact layout, and run filters

pub mod columns;
pub mod csv;
pub mod dose_matrix;
pub mod enums;
pub mod errors;
pub mod numeric;
pub mod params;
pub mod run;
pub mod sink;
pub mod trail;
pub mod values;
