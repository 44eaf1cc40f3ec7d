//! Shadow recomputation of BEIR VII and BEIR V risk.
//!
//! This is a second implementation of the engine's formulas, reading every
//! coefficient from the raw reference document. Each step is written to a
//! human-readable trace.

use serde_json::Value;

use crate::reference::{OrganRef, coefficient, number, sex_coefficient};

const LEGACY_YOUNG_AGE: f64 = 20.0;
const LEGACY_YOUNG: [(f64, f64); 2] = [(15.0, 4.885), (25.0, 2.380)];
const LEGACY_ADULT: [(f64, f64); 2] = [(25.0, 2.367), (30.0, 1.638)];
const OPEN_WINDOW: f64 = 999.0;

/// An independently recomputed ERR with its derivation.
#[derive(Debug, Clone, PartialEq)]
pub struct Recalculation {
    pub err: f64,
    pub trace: Vec<String>,
}

impl Recalculation {
    fn zero(mut trace: Vec<String>, why: String) -> Self {
        trace.push(why);
        Self { err: 0.0, trace }
    }
}

/// Recompute a BEIR VII cell.
#[must_use]
pub fn beir_vii(organ: OrganRef<'_>, sex_key: &str, dose: f64, exposure: f64, attained: f64) -> Recalculation {
    let mut trace = Vec::new();
    let model_type = organ.vii_model_type();
    let beta = organ.vii_param("beta", sex_key);
    let gamma = organ.vii_param("gamma", sex_key);
    let eta = organ.vii_param("eta", sex_key);
    let ddref = organ.vii_ddref();
    let latency = organ.vii_latency();
    trace.push(format!(
        "- **Reference parameters**: type={model_type}, beta={beta}, gamma={gamma}, eta={eta}, DDREF={ddref}, latency={latency}"
    ));

    let elapsed = attained - exposure;
    if elapsed < latency {
        return Recalculation::zero(
            trace,
            format!("- Elapsed time ({elapsed}) below latency ({latency}): ERR = 0"),
        );
    }

    let e_star = if exposure < 30.0 {
        (exposure - 30.0) / 10.0
    } else {
        0.0
    };
    trace.push(format!(
        "- **Age terms**: e*={e_star:.2}, exposure={exposure}, attained={attained}, elapsed={elapsed}"
    ));

    if model_type == "leukemia" {
        let theta = organ.vii_param("theta", sex_key);
        let delta = organ.vii_param("delta", sex_key);
        let phi = organ.vii_param("phi", sex_key);
        trace.push(format!("- **Leukemia terms**: theta={theta}, delta={delta}, phi={phi}"));
        if elapsed <= 0.0 {
            return Recalculation::zero(trace, "- Non-positive elapsed time: ERR = 0".into());
        }
        let log_t = (elapsed / 25.0).ln();
        let inner = gamma * e_star + delta * log_t + phi * e_star * log_t;
        let temporal = inner.exp();
        let err = beta * dose * (1.0 + theta * dose) * temporal;
        trace.push(format!("- **Temporal term**: exp({inner:.4}) = {temporal:.4}"));
        trace.push(format!(
            "- **Calculation**: {beta} * {dose:.4} * (1 + {theta} * {dose:.4}) * {temporal:.4} = {err:.6e}"
        ));
        Recalculation { err, trace }
    } else {
        let exp_term = (gamma * e_star).exp();
        let age_term = (attained / 60.0).powf(eta);
        let err = beta * dose * exp_term * age_term / ddref;
        trace.push(format!(
            "- **Calculation**: {beta} * {dose:.4} * {exp_term:.4} * {age_term:.4} / {ddref} = {err:.6e}"
        ));
        Recalculation { err, trace }
    }
}

/// Recompute a BEIR V cell. `sex` is the log label (`male` / `female`).
#[must_use]
pub fn beir_v(organ: OrganRef<'_>, sex: &str, dose: f64, exposure: f64, attained: f64) -> Recalculation {
    let model_type = organ.v_model_type();
    let mut trace = vec![format!("- **Model**: BEIR_V / {model_type}")];
    let elapsed = attained - exposure;
    if elapsed < 0.0 {
        return Recalculation::zero(trace, "- Negative projection time: ERR = 0".into());
    }

    match model_type {
        "leukemia_lq" => {
            let alpha2 = organ.v_param("alpha2").and_then(number).unwrap_or(0.243);
            let alpha3 = organ.v_param("alpha3").and_then(number).unwrap_or(0.271);
            let windows = organ
                .v_param("time_windows")
                .and_then(Value::as_array)
                .filter(|w| !w.is_empty());
            let beta = match windows {
                Some(windows) => window_beta(windows, exposure, elapsed, &mut trace),
                None => {
                    trace.push("- No time windows configured, using the legacy table".into());
                    legacy_beta(exposure, elapsed)
                }
            };
            let Some(beta) = beta else {
                return Recalculation::zero(trace, "- No matching time window: ERR = 0".into());
            };
            let err = (alpha2 * dose + alpha3 * dose.powi(2)) * beta.exp();
            trace.push(format!(
                "- **Calculation**: ({alpha2} * D + {alpha3} * D^2) * exp({beta}) = {err:.6e}"
            ));
            Recalculation { err, trace }
        }
        "breast_age_dependent" => {
            if sex != "female" {
                return Recalculation::zero(trace, "- Male breast: ERR = 0".into());
            }
            let mut coef = organ.v_param("default_coef").and_then(number).unwrap_or(0.1);
            let brackets = organ.v_param("age_brackets").and_then(Value::as_array);
            for bracket in brackets.into_iter().flatten() {
                let max_age = coefficient(bracket.get("max_age"));
                if exposure < max_age {
                    coef = coefficient(bracket.get("coef"));
                    trace.push(format!("- Age bracket < {max_age}: coef={coef}"));
                    break;
                }
            }
            let err = coef * 2.0 * dose;
            trace.push(format!("- **Calculation**: {coef} * 2.0 * {dose} = {err:.6e}"));
            Recalculation { err, trace }
        }
        "thyroid_age_dependent" => {
            let threshold = organ.v_param("threshold_age").and_then(number).unwrap_or(18.0);
            let young = organ.v_param("coef_young").and_then(number).unwrap_or(7.5);
            let adult = organ.v_param("coef_adult").and_then(number).unwrap_or(0.5);
            let coef = if exposure < threshold { young } else { adult };
            trace.push(format!("- Exposure age {exposure} vs threshold {threshold}: coef={coef}"));
            Recalculation {
                err: coef * dose,
                trace,
            }
        }
        linear if linear.contains("linear") => {
            let key = if sex == "male" { "M" } else { "F" };
            let coef = sex_coefficient(organ.v_param("coef"), key);
            trace.push(format!("- Linear coefficient: {coef}"));
            Recalculation {
                err: coef * dose,
                trace,
            }
        }
        other => Recalculation::zero(trace, format!("- Unknown model '{other}': ERR = 0")),
    }
}

fn window_beta(windows: &[Value], exposure: f64, elapsed: f64, trace: &mut Vec<String>) -> Option<f64> {
    let window = windows.iter().find(|w| {
        exposure
            <= w.get("max_age_exposure")
                .and_then(number)
                .unwrap_or(OPEN_WINDOW)
    })?;
    trace.push(format!(
        "- Window found (exposure age <= {})",
        window.get("max_age_exposure").map_or_else(|| "open".to_string(), Value::to_string)
    ));

    let intervals = window.get("intervals").and_then(Value::as_array);
    for interval in intervals.into_iter().flatten() {
        let max_years = coefficient(interval.get("max_years_since"));
        if elapsed <= max_years {
            let beta = coefficient(interval.get("beta"));
            trace.push(format!("- Interval found (elapsed <= {max_years}): beta={beta}"));
            return Some(beta);
        }
    }
    window.get("fallback_beta").and_then(number)
}

fn legacy_beta(exposure: f64, elapsed: f64) -> Option<f64> {
    let table = if exposure <= LEGACY_YOUNG_AGE {
        LEGACY_YOUNG
    } else {
        LEGACY_ADULT
    };
    table
        .iter()
        .find(|(max_years, _)| elapsed <= *max_years)
        .map(|(_, beta)| *beta)
}
