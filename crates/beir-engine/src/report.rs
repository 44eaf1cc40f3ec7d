//! Result CSV assembly.
//!
//! Layout: six identification columns, then for each kept scenario
//! `dose_Sv_{s}`, `model_{s}` and the selected metrics `ERR_{s}`, `LAR_{s}`.

use beir_core::csv::Table;
use beir_core::enums::{Metric, Sex};
use beir_core::numeric::{format_fixed, format_scientific};
use beir_core::run::RunFilters;
use beir_core::trail::NOT_AVAILABLE;

use crate::ages::Ages;
use crate::outcome::CellOutcome;

const DIGITS: usize = 2;

pub const ID_COLUMNS: [&str; 6] = [
    "row_id",
    "sex",
    "age_at_exposure",
    "attained_age",
    "hotspot_organ",
    "beir_VII_organ_equivalence",
];

/// One evaluated (sex, organ) row.
#[derive(Debug, Clone)]
pub struct RiskRow {
    pub row_id: u64,
    pub sex: Sex,
    pub organ: String,
    pub equivalence: String,
    /// `(dose_sv, outcome)` per scenario, in scenario order.
    pub cells: Vec<(f64, CellOutcome)>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Tally {
    total: usize,
    ceiling: usize,
}

/// Rows accumulated during a run, with per-scenario ceiling tallies.
#[derive(Debug, Clone)]
pub struct RiskTable {
    scenarios: Vec<String>,
    tallies: Vec<Tally>,
    rows: Vec<RiskRow>,
}

impl RiskTable {
    #[must_use]
    pub fn new(scenarios: Vec<String>) -> Self {
        let tallies = vec![Tally::default(); scenarios.len()];
        Self {
            scenarios,
            tallies,
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, row: RiskRow) {
        for (tally, (_, outcome)) in self.tallies.iter_mut().zip(&row.cells) {
            tally.total += 1;
            if outcome.is_ceiling_skip() {
                tally.ceiling += 1;
            }
        }
        self.rows.push(row);
    }

    #[must_use]
    pub fn rows(&self) -> &[RiskRow] {
        &self.rows
    }

    /// Scenarios whose every evaluated cell hit the dose ceiling.
    #[must_use]
    pub fn saturated(&self) -> Vec<&str> {
        self.scenarios
            .iter()
            .zip(&self.tallies)
            .filter(|(_, t)| t.total > 0 && t.total == t.ceiling)
            .map(|(s, _)| s.as_str())
            .collect()
    }

    /// Render the CSV table under the run's filters.
    #[must_use]
    pub fn to_table(&self, ages: Ages, filters: &RunFilters) -> Table {
        let kept: Vec<usize> = (0..self.scenarios.len())
            .filter(|&i| {
                let t = self.tallies[i];
                filters.show_high_dose || !(t.total > 0 && t.total == t.ceiling)
            })
            .collect();
        let with_err = filters.includes_metric(Metric::Err);
        let with_lar = filters.includes_metric(Metric::Lar);

        let mut header: Vec<String> = ID_COLUMNS.iter().map(|c| (*c).to_string()).collect();
        for &i in &kept {
            let s = &self.scenarios[i];
            header.push(format!("dose_Sv_{s}"));
            header.push(format!("model_{s}"));
            if with_err {
                header.push(format!("ERR_{s}"));
            }
            if with_lar {
                header.push(format!("LAR_{s}"));
            }
        }

        let exposure = format_fixed(ages.exposure.trunc(), 0);
        let attained = format_fixed(ages.attained.trunc(), 0);
        let mut table = Table::new(header);
        for row in &self.rows {
            let mut cells = vec![
                row.row_id.to_string(),
                row.sex.label().to_string(),
                exposure.clone(),
                attained.clone(),
                row.organ.clone(),
                row.equivalence.clone(),
            ];
            for &i in &kept {
                let (dose_sv, outcome) = &row.cells[i];
                let (model, err, lar) = render(outcome);
                cells.push(format_scientific(*dose_sv, DIGITS));
                cells.push(model);
                if with_err {
                    cells.push(err);
                }
                if with_lar {
                    cells.push(lar);
                }
            }
            table.rows.push(cells);
        }
        table
    }
}

fn render(outcome: &CellOutcome) -> (String, String, String) {
    match outcome {
        CellOutcome::Computed(eval) => (
            eval.model.to_string(),
            format_scientific(eval.err, DIGITS),
            format_scientific(eval.lar, DIGITS),
        ),
        CellOutcome::Failed { model, .. } => (
            model.to_string(),
            format_scientific(f64::NAN, DIGITS),
            format_scientific(f64::NAN, DIGITS),
        ),
        CellOutcome::Skipped(_) => (
            NOT_AVAILABLE.to_string(),
            NOT_AVAILABLE.to_string(),
            NOT_AVAILABLE.to_string(),
        ),
    }
}
