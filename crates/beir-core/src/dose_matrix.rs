//! Organ × scenario dose matrix and its CSV wire format.
//!
//! ```text
//! row_id;organ/stabiliy_class_dose_class_distance_km;A_0.03;A_1.0;B_0.03;...
//! 1;brain;1.20e-03;4.10e-05;;...
//! ```
//!
//! Scenario keys are `{stability_class}_{distance}` where the distance uses
//! the shortest round-trip decimal form. Missing doses are empty cells.

use std::cmp::Ordering;
use std::fmt;
use std::path::Path;

use crate::columns::ROW_ID;
use crate::csv::Table;
use crate::errors::CoreError;
use crate::numeric::{float_repr, format_scientific, parse_cell};

/// Header of the organ identifier column. The spelling is part of the wire
/// format consumed by downstream spreadsheets and must not be corrected.
pub const ORGAN_COLUMN: &str = "organ/stabiliy_class_dose_class_distance_km";

/// Digits after the decimal point for doses written to CSV artifacts.
pub const CSV_DIGITS: usize = 2;

/// One scenario axis value: atmospheric stability class plus downwind distance.
#[derive(Debug, Clone)]
pub struct ScenarioKey {
    pub stability_class: String,
    pub distance_km: f64,
}

impl ScenarioKey {
    #[must_use]
    pub fn new(stability_class: impl Into<String>, distance_km: f64) -> Self {
        Self {
            stability_class: stability_class.into(),
            distance_km,
        }
    }
}

impl fmt::Display for ScenarioKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.stability_class, float_repr(self.distance_km))
    }
}

impl Ord for ScenarioKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.stability_class
            .cmp(&other.stability_class)
            .then_with(|| self.distance_km.total_cmp(&other.distance_km))
    }
}

impl PartialOrd for ScenarioKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for ScenarioKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ScenarioKey {}

/// One organ row of the matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct DoseRow {
    pub row_id: u64,
    pub organ: String,
    /// Dose in Sv per scenario, aligned with [`DoseMatrix::scenarios`].
    pub doses: Vec<Option<f64>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DoseMatrix {
    pub scenarios: Vec<String>,
    pub rows: Vec<DoseRow>,
}

impl DoseMatrix {
    /// Read a transposed matrix from disk.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Io` when unreadable and `CoreError::MalformedCsv`
    /// when the organ column is absent or a `row_id` is not an integer.
    pub fn read(path: &Path) -> Result<Self, CoreError> {
        let table = Table::read(path)?;
        Self::from_table(&table, &path.display().to_string())
    }

    /// Build a matrix from a parsed table. Rows without a `row_id` cell are
    /// numbered by position, starting at 1.
    ///
    /// # Errors
    ///
    /// See [`DoseMatrix::read`].
    pub fn from_table(table: &Table, origin: &str) -> Result<Self, CoreError> {
        let organ_idx = table
            .column(ORGAN_COLUMN)
            .or_else(|| table.column("organ"))
            .ok_or_else(|| CoreError::MalformedCsv {
                path: origin.to_string(),
                line: 1,
                message: format!("missing '{ORGAN_COLUMN}' column"),
            })?;
        let row_id_idx = table.column(ROW_ID);
        let scenario_idx: Vec<usize> = (0..table.header.len())
            .filter(|&i| i != organ_idx && Some(i) != row_id_idx)
            .collect();

        let mut rows = Vec::with_capacity(table.rows.len());
        for (position, cells) in table.rows.iter().enumerate() {
            let fallback = position as u64 + 1;
            let row_id = match row_id_idx.map(|i| cells[i].trim()) {
                None | Some("") => fallback,
                Some(text) => parse_row_id(text).ok_or_else(|| CoreError::MalformedCsv {
                    path: origin.to_string(),
                    line: position + 2,
                    message: format!("row_id '{text}' is not an integer"),
                })?,
            };
            rows.push(DoseRow {
                row_id,
                organ: cells[organ_idx].trim().to_string(),
                doses: scenario_idx.iter().map(|&i| parse_cell(&cells[i])).collect(),
            });
        }

        Ok(Self {
            scenarios: scenario_idx
                .iter()
                .map(|&i| table.header[i].clone())
                .collect(),
            rows,
        })
    }

    /// Render as a table with `%.2e` doses.
    #[must_use]
    pub fn to_table(&self) -> Table {
        let mut header = vec![ROW_ID.to_string(), ORGAN_COLUMN.to_string()];
        header.extend(self.scenarios.iter().cloned());
        let mut table = Table::new(header);
        for row in &self.rows {
            let mut cells = vec![row.row_id.to_string(), row.organ.clone()];
            cells.extend(row.doses.iter().map(|dose| {
                dose.map_or_else(String::new, |d| format_scientific(d, CSV_DIGITS))
            }));
            table.rows.push(cells);
        }
        table
    }

    /// # Errors
    ///
    /// Returns `CoreError::Io` on any write failure.
    pub fn write(&self, path: &Path) -> Result<(), CoreError> {
        self.to_table().write(path)
    }

    #[must_use]
    pub fn organs(&self) -> Vec<&str> {
        self.rows.iter().map(|r| r.organ.as_str()).collect()
    }
}

/// Accepts `3` as well as `3.0`, which spreadsheet round-trips produce.
fn parse_row_id(text: &str) -> Option<u64> {
    text.parse::<u64>().ok().or_else(|| {
        text.parse::<f64>()
            .ok()
            .filter(|v| v.fract() == 0.0 && *v >= 1.0)
            .map(|v| v as u64)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> DoseMatrix {
        DoseMatrix {
            scenarios: vec!["A_0.03".into(), "B_1.0".into()],
            rows: vec![
                DoseRow {
                    row_id: 1,
                    organ: "brain".into(),
                    doses: vec![Some(0.0012), None],
                },
                DoseRow {
                    row_id: 2,
                    organ: "lung".into(),
                    doses: vec![Some(2.5), Some(0.0)],
                },
            ],
        }
    }

    #[test]
    fn scenario_key_label_and_order() {
        let mut keys = vec![
            ScenarioKey::new("B", 0.03),
            ScenarioKey::new("A", 10.0),
            ScenarioKey::new("A", 2.0),
        ];
        keys.sort();
        let labels: Vec<String> = keys.iter().map(ToString::to_string).collect();
        assert_eq!(labels, vec!["A_2.0", "A_10.0", "B_0.03"]);
    }

    #[test]
    fn matrix_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.csv");
        sample().write(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("row_id;organ/stabiliy_class_dose_class_distance_km;A_0.03;B_1.0\n"));
        assert!(text.contains("1;brain;1.20e-03;\n"));

        let back = DoseMatrix::read(&path).unwrap();
        assert_eq!(back, sample());
        assert_eq!(back.organs(), vec!["brain", "lung"]);
    }

    #[test]
    fn missing_row_id_column_numbers_by_position() {
        let input = "organ;A_1.0\nskin;1.00e-01\nlung;\n";
        let table = Table::from_reader(input.as_bytes(), "mem").unwrap();
        let matrix = DoseMatrix::from_table(&table, "mem").unwrap();
        assert_eq!(matrix.rows[1].row_id, 2);
        assert_eq!(matrix.rows[1].doses, vec![None]);
    }

    #[test]
    fn float_row_id_is_accepted() {
        assert_eq!(parse_row_id("3.0"), Some(3));
        assert_eq!(parse_row_id("x"), None);
    }
}
