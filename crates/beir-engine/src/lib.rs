//! # beir-engine
//!
//! Risk computation over a transposed dose matrix.
//!
//! For every (sex, organ, scenario) cell the [`dispatch`] state machine
//! checks the dose ceiling, then coefficient availability, then selects a
//! model by dose and calls the matching solver ([`beir_vii`] or [`beir_v`]).
//! Each cell becomes an explicit [`CellOutcome`]; numeric failures are
//! recorded per cell and never abort the run.
//!
//! [`run`] drives a whole computation: it writes the `METADATA_HEADER`, one
//! `CALC_LOG` per cell, the result CSV, and the `METADATA_FOOTER` through an
//! injected [`AuditSink`](beir_core::sink::AuditSink).

pub mod ages;
pub mod beir_v;
pub mod beir_vii;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod integrity;
pub mod outcome;
pub mod report;

pub use ages::Ages;
pub use dispatch::{DOSE_CEILING_MSV, MODEL_THRESHOLD_MSV, evaluate_cell, select_model};
pub use engine::{RiskRequest, RiskSummary, run};
pub use error::{EngineError, SolverError};
pub use outcome::{CellOutcome, Evaluation, SkipReason, Solution};
