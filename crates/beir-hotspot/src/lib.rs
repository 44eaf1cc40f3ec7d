//! # beir-hotspot
//!
//! The two file-producing stages in front of the risk engine:
//!
//! - [`extractor`]: HotSpot text reports → one [`SimulationRecord`] per
//!   downwind distance, written as the extraction CSV.
//! - [`transposer`]: extraction CSV → organ × scenario [`DoseMatrix`].
//!
//! Both stages report per-file progress to an injected
//! [`AuditSink`](beir_core::sink::AuditSink) as `STAGE_LOG` events.
//!
//! [`DoseMatrix`]: beir_core::dose_matrix::DoseMatrix

pub mod error;
pub mod extractor;
pub mod transposer;

pub use error::{ExtractError, TransposeError};
pub use extractor::{Extractor, FieldValue, ReportHeader, SimulationRecord};
pub use transposer::transpose;
