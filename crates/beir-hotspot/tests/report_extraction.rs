//! Extraction and transposition over the fixture reports.

use std::path::{Path, PathBuf};

use beir_core::columns::extraction_header;
use beir_core::csv::Table;
use beir_core::dose_matrix::DoseMatrix;
use beir_core::sink::MemoryAuditSink;
use beir_core::trail::{AuditEvent, StageStatus};
use beir_hotspot::{ExtractError, Extractor, FieldValue, TransposeError, transpose};
use pretty_assertions::assert_eq;

fn fixtures() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn stage_statuses(sink: &MemoryAuditSink) -> Vec<(StageStatus, Option<usize>)> {
    sink.events
        .iter()
        .filter_map(|event| match event {
            AuditEvent::Stage(stage) => Some((stage.status, stage.records)),
            _ => None,
        })
        .collect()
}

#[test]
fn parses_full_report_header() {
    let records = Extractor::new()
        .unwrap()
        .parse_file(&fixtures().join("plume_a.txt"))
        .unwrap();
    assert_eq!(records.len(), 2);

    let header = &records[0].header;
    assert_eq!(header.get("physical_stack_height_m"), Some(&FieldValue::Number(10.0)));
    assert_eq!(header.get("wind_from_the"), Some(&FieldValue::Text("W".into())));
    assert_eq!(header.get("inversion_layer_height"), Some(&FieldValue::Text("None".into())));
    assert_eq!(header.get("distance_coordinates"), Some(&FieldValue::Text("All".into())));
    assert_eq!(header.get("exceeds_middle_dose_out_to_km"), Some(&FieldValue::Number(1.2)));
    assert_eq!(header.get("exceeds_outer_dose_out_to_km"), Some(&FieldValue::Number(4.8)));
    assert_eq!(records[0].stability_class(), Some("A"));

    assert_eq!(records[1].distance_km, 1.0);
    assert_eq!(records[1].organ_doses.len(), 23);
    assert_eq!(records[1].organ_doses.get("thyroid"), Some(&0.0031));
    assert_eq!(records[1].components, [Some(0.0024), Some(1.2e-5), Some(5.9e-4)]);
}

#[test]
fn directory_extraction_skips_broken_reports() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out/1_hotspot_extract.csv");
    let mut sink = MemoryAuditSink::new();

    let written = Extractor::new()
        .unwrap()
        .extract_dir(&fixtures(), &output, &mut sink)
        .unwrap();
    assert_eq!(written, 3);

    // broken.txt, plume_a.txt, plume_b.TXT, then the output file
    assert_eq!(
        stage_statuses(&sink),
        vec![
            (StageStatus::Failed, None),
            (StageStatus::Ok, Some(2)),
            (StageStatus::Ok, Some(1)),
            (StageStatus::Ok, Some(3)),
        ]
    );

    let table = Table::read(&output).unwrap();
    let expected: Vec<String> = extraction_header().into_iter().map(String::from).collect();
    assert_eq!(table.header, expected);
    assert_eq!(table.rows.len(), 3);
    let ids: Vec<&str> = table.rows.iter().map(|r| r[0].as_str()).collect();
    assert_eq!(ids, vec!["1", "2", "3"]);

    let lung = table.column("lung").unwrap();
    assert_eq!(table.rows[0][lung], "4.60e-01");
    let uterus = table.column("uterus").unwrap();
    assert_eq!(table.rows[2][uterus], "");
    let class = table.column("stability_class").unwrap();
    assert_eq!(table.rows[2][class], "D");
}

#[test]
fn missing_input_directory_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let err = Extractor::new()
        .unwrap()
        .extract_dir(
            &dir.path().join("absent"),
            &dir.path().join("out.csv"),
            &mut MemoryAuditSink::new(),
        )
        .unwrap_err();
    assert!(matches!(err, ExtractError::MissingInput(_)));
}

#[test]
fn empty_directory_writes_header_only() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("reports");
    std::fs::create_dir(&input).unwrap();
    let output = dir.path().join("extract.csv");

    let written = Extractor::new()
        .unwrap()
        .extract_dir(&input, &output, &mut MemoryAuditSink::new())
        .unwrap();
    assert_eq!(written, 0);
    let text = std::fs::read_to_string(&output).unwrap();
    assert_eq!(text.lines().count(), 1);
    assert!(text.starts_with("row_id;physical_stack_height_m;"));
}

#[test]
fn extraction_then_transposition() {
    let dir = tempfile::tempdir().unwrap();
    let extract = dir.path().join("extract.csv");
    let matrix_path = dir.path().join("matrix.csv");
    let mut sink = MemoryAuditSink::new();

    Extractor::new()
        .unwrap()
        .extract_dir(&fixtures(), &extract, &mut sink)
        .unwrap();
    let matrix = transpose(&extract, &matrix_path, &mut sink).unwrap();

    assert_eq!(matrix.scenarios, vec!["A_0.03", "A_1.0", "D_0.03", "D_1.0"]);
    assert_eq!(matrix.rows.len(), 23);
    assert_eq!(matrix.rows[0].organ, "adrenals");
    assert_eq!(matrix.rows.last().map(|r| r.organ.as_str()), Some("uterus"));
    let ids: Vec<u64> = matrix.rows.iter().map(|r| r.row_id).collect();
    assert_eq!(ids, (1..=23).collect::<Vec<_>>());

    let skin = matrix.rows.iter().find(|r| r.organ == "skin").unwrap();
    assert_eq!(skin.doses, vec![Some(0.12), Some(0.0014), Some(0.04), None]);

    let reread = DoseMatrix::read(&matrix_path).unwrap();
    assert_eq!(reread, matrix);
}

#[test]
fn transposition_requires_extraction_csv() {
    let dir = tempfile::tempdir().unwrap();
    let err = transpose(
        &dir.path().join("missing.csv"),
        &dir.path().join("matrix.csv"),
        &mut MemoryAuditSink::new(),
    )
    .unwrap_err();
    assert!(matches!(err, TransposeError::MissingInput(_)));
}
