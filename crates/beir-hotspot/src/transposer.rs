//! Long-to-wide reshape of the extraction CSV.
//!
//! Organ columns are every column outside the static layout. The output has
//! one row per organ (sorted by name) and one column per scenario in the
//! cross-product of observed stability classes and distances. A scenario
//! with no observation for an organ is an empty cell.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use beir_core::columns::{DISTANCE_KM, STABILITY_CLASS, is_static};
use beir_core::csv::Table;
use beir_core::dose_matrix::{DoseMatrix, DoseRow, ScenarioKey};
use beir_core::errors::CoreError;
use beir_core::numeric::{float_repr, parse_cell};
use beir_core::sink::AuditSink;
use beir_core::trail::{AuditEvent, StageLog, StageStatus};

use crate::error::TransposeError;

/// Stage name used in `STAGE_LOG` events.
pub const STAGE: &str = "transposition";

/// Read `input_csv`, pivot it, and write the dose matrix to `output_csv`.
///
/// # Errors
///
/// Returns `TransposeError::MissingInput` when the extraction CSV does not
/// exist, plus any [`pivot`] or write error.
pub fn transpose(
    input_csv: &Path,
    output_csv: &Path,
    sink: &mut dyn AuditSink,
) -> Result<DoseMatrix, TransposeError> {
    if !input_csv.is_file() {
        return Err(TransposeError::MissingInput(input_csv.display().to_string()));
    }
    let table = Table::read(input_csv)?;

    let matrix = match pivot(&table) {
        Ok(matrix) => matrix,
        Err(e) => {
            sink.record(&AuditEvent::Stage(StageLog {
                stage: STAGE.into(),
                status: StageStatus::Failed,
                source: input_csv.display().to_string(),
                message: e.to_string(),
                records: None,
            }))?;
            return Err(e);
        }
    };

    if let Some(parent) = output_csv.parent() {
        std::fs::create_dir_all(parent).map_err(CoreError::from)?;
    }
    matrix.write(output_csv)?;
    sink.record(&AuditEvent::Stage(StageLog {
        stage: STAGE.into(),
        status: StageStatus::Ok,
        source: output_csv.display().to_string(),
        message: format!("{} scenarios", matrix.scenarios.len()),
        records: Some(matrix.rows.len()),
    }))?;
    tracing::info!(
        path = %output_csv.display(),
        organs = matrix.rows.len(),
        scenarios = matrix.scenarios.len(),
        "dose matrix written"
    );
    Ok(matrix)
}

/// Pivot an extraction table into a dose matrix.
///
/// Rows lacking a stability class or a parseable distance are skipped with
/// a warning.
///
/// # Errors
///
/// Returns `TransposeError::MissingColumn` when the scenario columns are
/// absent and `TransposeError::Duplicate` when two rows observe the same
/// organ and scenario.
pub fn pivot(table: &Table) -> Result<DoseMatrix, TransposeError> {
    let class_idx = table
        .column(STABILITY_CLASS)
        .ok_or(TransposeError::MissingColumn(STABILITY_CLASS))?;
    let distance_idx = table
        .column(DISTANCE_KM)
        .ok_or(TransposeError::MissingColumn(DISTANCE_KM))?;
    let organ_columns: Vec<(usize, &str)> = table
        .header
        .iter()
        .enumerate()
        .filter(|(_, name)| !is_static(name))
        .map(|(i, name)| (i, name.as_str()))
        .collect();

    let mut classes = BTreeSet::new();
    let mut distances: Vec<f64> = Vec::new();
    let mut observed: BTreeMap<&str, BTreeMap<ScenarioKey, Option<f64>>> = BTreeMap::new();

    for (position, cells) in table.rows.iter().enumerate() {
        let class = cells[class_idx].trim();
        let Some(distance) = parse_cell(&cells[distance_idx]).filter(|d| d.is_finite()) else {
            tracing::warn!(row = position + 1, "skipping row without a distance");
            continue;
        };
        if class.is_empty() {
            tracing::warn!(row = position + 1, "skipping row without a stability class");
            continue;
        }

        classes.insert(class.to_string());
        if !distances.iter().any(|d| d.total_cmp(&distance).is_eq()) {
            distances.push(distance);
        }

        let key = ScenarioKey::new(class, distance);
        for &(idx, organ) in &organ_columns {
            match observed.entry(organ).or_default().entry(key.clone()) {
                Entry::Occupied(_) => {
                    return Err(TransposeError::Duplicate {
                        organ: organ.to_string(),
                        scenario: key.to_string(),
                    });
                }
                Entry::Vacant(slot) => {
                    slot.insert(parse_cell(&cells[idx]));
                }
            }
        }
    }

    distances.sort_by(f64::total_cmp);
    let scenarios: Vec<ScenarioKey> = classes
        .iter()
        .flat_map(|class| distances.iter().map(|d| ScenarioKey::new(class.clone(), *d)))
        .collect();

    let rows = observed
        .into_iter()
        .zip(1u64..)
        .map(|((organ, doses), row_id)| DoseRow {
            row_id,
            organ: organ.to_string(),
            doses: scenarios
                .iter()
                .map(|key| doses.get(key).copied().flatten())
                .collect(),
        })
        .collect();

    tracing::debug!(
        classes = classes.len(),
        distances = distances.iter().map(|d| float_repr(*d)).collect::<Vec<_>>().join(","),
        "pivoted extraction table"
    );
    Ok(DoseMatrix {
        scenarios: scenarios.iter().map(ToString::to_string).collect(),
        rows,
    })
}
