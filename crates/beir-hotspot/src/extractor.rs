//! HotSpot report extraction.
//!
//! A report is a text preamble of `Label : value unit` lines followed by one
//! block per downwind distance:
//!
//! ```text
//! 0,030      2,5E-01    1,2E+09     8,0E+03    1,0E-03     <00:01>
//!  Skin.............[1,2E-01]  Surface Bone.....[2,0E-01]
//!  ...
//!  Inhalation (Plume Passage)  : 2,0E-01 Sv
//!  Submersion (Plume Passage)  : 1,0E-03 Sv
//!  Ground Shine                : 4,9E-02 Sv
//! ```
//!
//! A block starts at a line whose first token looks like `digits,digits` and
//! runs until the next such line or end of file. Numbers use the locale
//! decimal comma and go through [`parse_lenient`], so malformed values become
//! `NaN` instead of failing the file.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use beir_core::columns::{
    COMPONENT_COLUMNS, HEADER_COLUMNS, TEXT_HEADER_COLUMNS, extraction_header, is_known_organ,
};
use beir_core::csv::Table;
use beir_core::dose_matrix::CSV_DIGITS;
use beir_core::numeric::{format_scientific, parse_lenient};
use beir_core::sink::AuditSink;
use beir_core::trail::{AuditEvent, StageLog, StageStatus};
use regex::Regex;

use crate::error::ExtractError;

/// Stage name used in `STAGE_LOG` events.
pub const STAGE: &str = "extraction";

/// Header field patterns, aligned with [`HEADER_COLUMNS`].
const HEADER_PATTERNS: [(&str, &str); 24] = [
    ("physical_stack_height_m", r"Physical Stack Height\s*:\s*(\S+)\s*m"),
    ("stack_exit_velocity_m_s", r"Stack Exit Velocity\s*:\s*(\S+)\s*m/s"),
    ("stack_diameter_m", r"Stack Diameter\s*:\s*(\S+)\s*m"),
    ("stack_effluent_temp_deg_c", r"Stack Effluent Temp\.\s*:\s*(\S+)\s*deg C"),
    ("air_temperature_deg_c", r"Air Temperature\s*:\s*(\S+)\s*deg C"),
    ("effective_release_height_m", r"Effective Release Height\s*:\s*(\S+)\s*m"),
    ("wind_speed_h=10_m_m_s", r"Wind Speed \(h=10 m\)\s*:\s*(\S+)\s*m/s"),
    ("wind_direction_degrees", r"Wind Direction\s*:\s*([0-9]+,[0-9]+)\s*degrees"),
    (
        "wind_from_the",
        r"Wind Direction\s*:\s*[0-9]+,[0-9]+\s*degrees\s*Wind from the\s*([A-Za-z]+)",
    ),
    ("wind_speed_h=h-eff_m_s", r"Wind Speed \(h=H-eff\)\s*:\s*(\S+)\s*m/s"),
    ("stability_class", r"Stability Class[^:]*:\s*([A-Za-z])"),
    ("receptor_height_m", r"Receptor Height\s*:\s*(\S+)\s*m"),
    ("inversion_layer_height", r"Inversion Layer Height\s*:\s*(\S+)"),
    ("sample_time_min", r"Sample Time\s*:\s*(\S+)\s*min"),
    ("breathing_rate_m3_sec", r"Breathing Rate\s*:\s*(\S+)\s*m3/sec"),
    ("distance_coordinates", r"Distance Coordinates\s*:\s*(\S+)"),
    ("maximum_dose_distance_km_", r"Maximum Dose Distance\s*:\s*(\S+)\s*km"),
    ("maximum_tede_sv", r"Maximum TEDE\s*:\s*(\S+)\s*Sv"),
    ("inner_contour_dose_sv", r"Inner\s*Contour Dose\s*:\s*(\S+)\s*Sv"),
    ("middle_contour_dose_sv", r"Middle\s*Contour Dose\s*:\s*(\S+)\s*Sv"),
    ("outer_contour_dose_sv", r"Outer\s*Contour Dose\s*:\s*(\S+)\s*Sv"),
    ("exceeds_inner_dose_out_to_km", r"Exceeds Inner\s*Dose Out To\s*:\s*(\S+)\s*km"),
    ("exceeds_middle_dose_out_to_km", r"Exceeds Middle\s*Dose Out To\s*:\s*(\S+)\s*km"),
    ("exceeds_outer_dose_out_to_km", r"Exceeds Outer\s*Dose Out To\s*:\s*(\S+)\s*km"),
];

const DATA_LINE: &str = r"^\s*\d+,\d+";
const ORGAN_TOKEN: &str = r"([A-Za-z ]+?)\.+\[(.*?)\]";

/// Positional columns on the first line of a block.
const BLOCK_FIELDS: usize = 6;

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// One extracted header or measurement value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Missing,
    Number(f64),
    Text(String),
}

impl FieldValue {
    #[must_use]
    pub const fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    fn to_cell(&self) -> String {
        match self {
            Self::Missing => String::new(),
            Self::Number(v) => number_cell(Some(*v)),
            Self::Text(s) => s.clone(),
        }
    }
}

/// Document-level values shared by every block of one report.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportHeader {
    values: Vec<FieldValue>,
}

impl ReportHeader {
    /// Value of a header column, `None` for unknown column names.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&FieldValue> {
        HEADER_COLUMNS
            .iter()
            .position(|c| *c == column)
            .and_then(|i| self.values.get(i))
    }
}

/// One row of the extraction CSV: a report header merged with one block.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationRecord {
    /// File name the record was read from.
    pub source: String,
    pub header: ReportHeader,
    pub distance_km: f64,
    pub tede_sv: f64,
    pub air_concentration: f64,
    pub ground_deposition: f64,
    pub ground_shine_rate: f64,
    pub arrival_time: String,
    /// Dose in Sv keyed by organ column name.
    pub organ_doses: BTreeMap<String, f64>,
    /// Inhalation, submersion, ground shine, in [`COMPONENT_COLUMNS`] order.
    pub components: [Option<f64>; 3],
}

impl SimulationRecord {
    #[must_use]
    pub fn stability_class(&self) -> Option<&str> {
        self.header
            .get(beir_core::columns::STABILITY_CLASS)
            .and_then(FieldValue::as_text)
    }

    /// Cells in [`extraction_header`] order.
    #[must_use]
    pub fn to_cells(&self, row_id: u64) -> Vec<String> {
        let mut cells = Vec::with_capacity(extraction_header().len());
        cells.push(row_id.to_string());
        cells.extend(self.header.values.iter().map(FieldValue::to_cell));
        cells.extend(
            [
                self.distance_km,
                self.tede_sv,
                self.air_concentration,
                self.ground_deposition,
                self.ground_shine_rate,
            ]
            .map(|v| number_cell(Some(v))),
        );
        cells.push(self.arrival_time.clone());
        cells.extend(
            beir_core::columns::ORGAN_COLUMNS
                .iter()
                .map(|organ| number_cell(self.organ_doses.get(*organ).copied())),
        );
        cells.extend(self.components.iter().map(|c| number_cell(*c)));
        cells
    }
}

fn number_cell(value: Option<f64>) -> String {
    match value {
        Some(v) if !v.is_nan() => format_scientific(v, CSV_DIGITS),
        _ => String::new(),
    }
}

/// Render records as the extraction table, numbering rows from 1.
#[must_use]
pub fn records_to_table(records: &[SimulationRecord]) -> Table {
    let mut table = Table::new(extraction_header().into_iter().map(String::from).collect());
    table.rows = records
        .iter()
        .zip(1u64..)
        .map(|(record, row_id)| record.to_cells(row_id))
        .collect();
    table
}

// ---------------------------------------------------------------------------
// Extractor
// ---------------------------------------------------------------------------

/// Compiled report patterns. Build once and reuse across files.
#[derive(Debug)]
pub struct Extractor {
    header: Vec<(&'static str, Regex)>,
    data_line: Regex,
    organ_token: Regex,
    summary: Vec<Regex>,
}

impl Extractor {
    /// # Errors
    ///
    /// Returns `ExtractError::Pattern` if a built-in pattern fails to compile.
    pub fn new() -> Result<Self, ExtractError> {
        let compile = |field: &'static str, pattern: &str| {
            Regex::new(pattern).map_err(|source| ExtractError::Pattern { field, source })
        };

        let header = HEADER_PATTERNS
            .iter()
            .map(|(field, pattern)| Ok((*field, compile(field, pattern)?)))
            .collect::<Result<Vec<_>, ExtractError>>()?;
        let summary = COMPONENT_COLUMNS
            .iter()
            .map(|(label, column)| {
                compile(column, &format!(r"{}[^:\n]*:\s*(\S+)", regex::escape(label)))
            })
            .collect::<Result<Vec<_>, ExtractError>>()?;

        Ok(Self {
            header,
            data_line: compile("data_line", DATA_LINE)?,
            organ_token: compile("organ", ORGAN_TOKEN)?,
            summary,
        })
    }

    /// Scan the whole document for the labelled header fields.
    ///
    /// Absent fields are [`FieldValue::Missing`]; numeric fields that fail to
    /// parse are `NaN`.
    #[must_use]
    pub fn parse_header(&self, text: &str) -> ReportHeader {
        let values = self
            .header
            .iter()
            .map(|(field, pattern)| {
                pattern
                    .captures(text)
                    .and_then(|caps| caps.get(1))
                    .map_or(FieldValue::Missing, |m| {
                        let raw = m.as_str().trim();
                        if TEXT_HEADER_COLUMNS.contains(field) {
                            FieldValue::Text(raw.to_string())
                        } else {
                            FieldValue::Number(parse_lenient(raw))
                        }
                    })
            })
            .collect();
        ReportHeader { values }
    }

    /// Parse one report into its records. `source` names the report in
    /// records and errors.
    ///
    /// # Errors
    ///
    /// Returns `ExtractError::MalformedBlock` when a block's first line has
    /// fewer than six columns.
    pub fn parse_report(
        &self,
        text: &str,
        source: &str,
    ) -> Result<Vec<SimulationRecord>, ExtractError> {
        let header = self.parse_header(text);
        let lines: Vec<&str> = text.lines().collect();
        let starts: Vec<usize> = lines
            .iter()
            .enumerate()
            .filter(|(_, line)| self.data_line.is_match(line))
            .map(|(i, _)| i)
            .collect();

        let mut dropped = BTreeSet::new();
        let mut records = Vec::with_capacity(starts.len());
        for (k, &start) in starts.iter().enumerate() {
            let end = starts.get(k + 1).copied().unwrap_or(lines.len());
            let record =
                self.parse_block(&lines[start..end], start + 1, source, &header, &mut dropped)?;
            records.push(record);
        }

        for organ in &dropped {
            tracing::warn!(source, organ, "dropping organ not in the fixed column layout");
        }
        tracing::debug!(source, records = records.len(), "parsed report");
        Ok(records)
    }

    fn parse_block(
        &self,
        block: &[&str],
        line_no: usize,
        source: &str,
        header: &ReportHeader,
        dropped: &mut BTreeSet<String>,
    ) -> Result<SimulationRecord, ExtractError> {
        let tokens: Vec<&str> = block[0].split_whitespace().collect();
        if tokens.len() < BLOCK_FIELDS {
            return Err(ExtractError::MalformedBlock {
                file: source.to_string(),
                line: line_no,
                found: tokens.len(),
            });
        }

        let mut organ_doses = BTreeMap::new();
        let mut summary_from = 1;
        for (offset, line) in block.iter().enumerate().skip(1) {
            if !line.contains('[') {
                continue;
            }
            for caps in self.organ_token.captures_iter(line) {
                let organ = caps[1].trim().to_lowercase().replace(' ', "_");
                if is_known_organ(&organ) {
                    organ_doses.insert(organ, parse_lenient(&caps[2]));
                } else {
                    dropped.insert(organ);
                }
            }
            summary_from = offset + 1;
        }

        // Summary labels are searched in order, each after the previous hit.
        let mut components = [None; 3];
        let mut cursor = summary_from;
        for (slot, pattern) in components.iter_mut().zip(&self.summary) {
            let hit = block
                .iter()
                .enumerate()
                .skip(cursor)
                .find_map(|(i, line)| pattern.captures(line).map(|caps| (i, caps)));
            if let Some((i, caps)) = hit {
                *slot = Some(parse_lenient(&caps[1]));
                cursor = i + 1;
            }
        }

        Ok(SimulationRecord {
            source: source.to_string(),
            header: header.clone(),
            distance_km: parse_lenient(tokens[0]),
            tede_sv: parse_lenient(tokens[1]),
            air_concentration: parse_lenient(tokens[2]),
            ground_deposition: parse_lenient(tokens[3]),
            ground_shine_rate: parse_lenient(tokens[4]),
            arrival_time: tokens[5].trim_matches(['<', '>']).to_string(),
            organ_doses,
            components,
        })
    }

    /// Read and parse one report file. Bytes that are not valid UTF-8 are
    /// replaced rather than rejected.
    ///
    /// # Errors
    ///
    /// Returns `ExtractError::Io` when unreadable, or any
    /// [`Self::parse_report`] error.
    pub fn parse_file(&self, path: &Path) -> Result<Vec<SimulationRecord>, ExtractError> {
        let bytes = fs::read(path)?;
        let text = String::from_utf8_lossy(&bytes);
        let source = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
        self.parse_report(&text, &source)
    }

    /// Extract every `*.txt` report in `input_dir` into `output_csv`.
    ///
    /// A report that fails to parse is logged and skipped; the others are
    /// still extracted. Returns the number of records written.
    ///
    /// # Errors
    ///
    /// Returns `ExtractError::MissingInput` when `input_dir` is not a
    /// directory, `ExtractError::Csv` when the output cannot be written, and
    /// `ExtractError::Trail` when the sink rejects an event.
    pub fn extract_dir(
        &self,
        input_dir: &Path,
        output_csv: &Path,
        sink: &mut dyn AuditSink,
    ) -> Result<usize, ExtractError> {
        let files = report_files(input_dir)?;
        tracing::info!(dir = %input_dir.display(), files = files.len(), "extracting HotSpot reports");

        let mut records = Vec::new();
        for path in &files {
            let source = path.display().to_string();
            match self.parse_file(path) {
                Ok(found) => {
                    sink.record(&stage_event(
                        StageStatus::Ok,
                        &source,
                        "report parsed",
                        Some(found.len()),
                    ))?;
                    records.extend(found);
                }
                Err(e) => {
                    tracing::warn!(file = %source, error = %e, "skipping report");
                    sink.record(&stage_event(StageStatus::Failed, &source, &e.to_string(), None))?;
                }
            }
        }

        if let Some(parent) = output_csv.parent() {
            fs::create_dir_all(parent)?;
        }
        records_to_table(&records).write(output_csv)?;
        sink.record(&stage_event(
            StageStatus::Ok,
            &output_csv.display().to_string(),
            "extraction CSV written",
            Some(records.len()),
        ))?;
        tracing::info!(path = %output_csv.display(), records = records.len(), "extraction CSV written");
        Ok(records.len())
    }
}

/// `*.txt` files of `dir` (extension case-insensitive), sorted by name.
///
/// # Errors
///
/// Returns `ExtractError::MissingInput` when `dir` is not a directory.
pub fn report_files(dir: &Path) -> Result<Vec<PathBuf>, ExtractError> {
    if !dir.is_dir() {
        return Err(ExtractError::MissingInput(dir.display().to_string()));
    }
    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("txt"))
        })
        .collect();
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

fn stage_event(
    status: StageStatus,
    source: &str,
    message: &str,
    records: Option<usize>,
) -> AuditEvent {
    AuditEvent::Stage(StageLog {
        stage: STAGE.into(),
        status,
        source: source.into(),
        message: message.into(),
        records,
    })
}
