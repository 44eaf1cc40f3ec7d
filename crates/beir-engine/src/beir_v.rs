//! BEIR V (1990) excess relative risk.
//!
//! Each organ carries one closed model variant:
//!
//! | variant                 | ERR                                   |
//! |-------------------------|---------------------------------------|
//! | `leukemia_lq`           | `(a2 * D + a3 * D^2) * exp(beta)`     |
//! | `breast_age_dependent`  | `coef * 2.0 * D` (females only)       |
//! | `thyroid_age_dependent` | `coef * D`                            |
//! | linear family           | `coef * D`                            |
//!
//! Unknown model types evaluate to zero and are flagged. A negative
//! projection time always evaluates to zero.

use beir_core::enums::Sex;
use beir_core::numeric::float_repr;
use beir_core::params::{AgeBracket, BeirVModel, LinearFamily, TimeWindow};
use beir_core::trail::{BeirVTrace, CalcParams};

use crate::ages::Ages;
use crate::error::SolverError;
use crate::outcome::{Solution, UNKNOWN_MODEL_FLAG};

/// Exposure age bounding the first row of the legacy leukemia table.
const LEGACY_YOUNG_EXPOSURE_AGE: f64 = 20.0;

/// `(max years since exposure, beta)` rows of the legacy leukemia table,
/// used when a `leukemia_lq` model carries no time windows.
const LEGACY_YOUNG_WINDOWS: [(f64, f64); 2] = [(15.0, 4.885), (25.0, 2.380)];
const LEGACY_ADULT_WINDOWS: [(f64, f64); 2] = [(25.0, 2.367), (30.0, 1.638)];

/// Multiplier of the breast model.
const BREAST_FACTOR: f64 = 2.0;

/// Model applied when an organ has no BEIR V configuration.
static FALLBACK_MODEL: BeirVModel = BeirVModel::Linear {
    family: LinearFamily::LinearOther,
    coef: None,
};

/// Evaluate the organ's BEIR V model for one dose.
///
/// # Errors
///
/// Returns `SolverError::MissingCoefficient` when a linear model has no
/// coefficient and `SolverError::NonFinite` for non-finite arithmetic.
pub fn solve(
    model: Option<&BeirVModel>,
    sex: Sex,
    dose_sv: f64,
    ages: Ages,
) -> Result<Solution, SolverError> {
    let model = model.unwrap_or(&FALLBACK_MODEL);
    let mut params = BeirVTrace {
        model_type: model.model_type().to_string(),
        ..BeirVTrace::default()
    };

    if ages.elapsed() < 0.0 {
        return Ok(solution(0.0, "ERR = 0 (negative projection time)".into(), params));
    }

    let (err, equation) = match model {
        BeirVModel::LeukemiaLq {
            alpha2,
            alpha3,
            time_windows,
        } => {
            params.alpha2 = Some(*alpha2);
            params.alpha3 = Some(*alpha3);
            match leukemia_beta(time_windows, ages) {
                Some(beta) => {
                    params.beta = Some(beta);
                    let err = (alpha2 * dose_sv + alpha3 * dose_sv.powi(2)) * beta.exp();
                    let equation = format!(
                        "ERR = ({alpha2:.3} * dose_Sv + {alpha3:.3} * dose_Sv^2) * exp({beta:.3})"
                    );
                    (err, equation)
                }
                None => (
                    0.0,
                    "ERR = 0 (leukemia risk time window exceeded)".to_string(),
                ),
            }
        }
        BeirVModel::BreastAgeDependent {
            age_brackets,
            default_coef,
        } => {
            if sex == Sex::Male {
                (
                    0.0,
                    "ERR = 0 (breast model applies to females only)".to_string(),
                )
            } else {
                let coef = breast_coefficient(age_brackets, *default_coef, ages.exposure);
                params.coef = Some(coef);
                (
                    coef * BREAST_FACTOR * dose_sv,
                    format!("ERR = {} * 2.0 * dose_Sv", float_repr(coef)),
                )
            }
        }
        BeirVModel::ThyroidAgeDependent {
            threshold_age,
            coef_young,
            coef_adult,
        } => {
            let coef = if ages.exposure < *threshold_age {
                *coef_young
            } else {
                *coef_adult
            };
            params.coef = Some(coef);
            (coef * dose_sv, format!("ERR = {} * dose_Sv", float_repr(coef)))
        }
        BeirVModel::Linear { coef, .. } => {
            let coef = match coef {
                None => return Err(SolverError::MissingCoefficient("coef")),
                Some(value) => value.resolve(sex).unwrap_or(0.0),
            };
            params.coef = Some(coef);
            (coef * dose_sv, format!("ERR = {} * dose_Sv", float_repr(coef)))
        }
        BeirVModel::Unknown { model_type } => {
            tracing::warn!(model_type = %model_type, "unknown BEIR V model, ERR set to 0");
            return Ok(Solution {
                err: 0.0,
                equation: format!("ERR = 0 (unknown model {model_type})"),
                params: CalcParams::BeirV(params),
                flag: Some(UNKNOWN_MODEL_FLAG),
            });
        }
    };

    if !err.is_finite() {
        return Err(SolverError::NonFinite(format!(
            "{} model gave {err} for dose {dose_sv} Sv",
            model.model_type()
        )));
    }
    Ok(solution(err, equation, params))
}

fn solution(err: f64, equation: String, params: BeirVTrace) -> Solution {
    Solution {
        err,
        equation,
        params: CalcParams::BeirV(params),
        flag: None,
    }
}

/// Beta for the leukemia model: first window whose exposure-age ceiling
/// covers the exposure age, then its first interval covering the elapsed
/// time, else the window's fallback. `None` means no window applies.
fn leukemia_beta(windows: &[TimeWindow], ages: Ages) -> Option<f64> {
    let elapsed = ages.elapsed();
    if windows.is_empty() {
        let table = if ages.exposure <= LEGACY_YOUNG_EXPOSURE_AGE {
            &LEGACY_YOUNG_WINDOWS
        } else {
            &LEGACY_ADULT_WINDOWS
        };
        return table
            .iter()
            .find(|(max_years, _)| elapsed <= *max_years)
            .map(|(_, beta)| *beta);
    }

    let window = windows
        .iter()
        .find(|w| ages.exposure <= w.max_age_exposure)?;
    window
        .intervals
        .iter()
        .find(|i| elapsed <= i.max_years_since)
        .map(|i| i.beta)
        .or(window.fallback_beta)
}

fn breast_coefficient(brackets: &[AgeBracket], default_coef: f64, exposure_age: f64) -> f64 {
    brackets
        .iter()
        .find(|b| exposure_age < b.max_age)
        .map_or(default_coef, |b| b.coef)
}

#[cfg(test)]
mod tests {
    use super::*;
    use beir_core::params::WindowInterval;
    use beir_core::values::SexDependentValue;
    use rstest::rstest;

    fn thyroid() -> BeirVModel {
        BeirVModel::ThyroidAgeDependent {
            threshold_age: 18.0,
            coef_young: 7.5,
            coef_adult: 0.5,
        }
    }

    fn windows() -> Vec<TimeWindow> {
        vec![
            TimeWindow {
                max_age_exposure: 20.0,
                intervals: vec![
                    WindowInterval {
                        max_years_since: 15.0,
                        beta: 4.885,
                    },
                    WindowInterval {
                        max_years_since: 25.0,
                        beta: 2.380,
                    },
                ],
                fallback_beta: None,
            },
            TimeWindow {
                max_age_exposure: 999.0,
                intervals: vec![WindowInterval {
                    max_years_since: 25.0,
                    beta: 2.367,
                }],
                fallback_beta: Some(1.0),
            },
        ]
    }

    #[rstest]
    #[case(10.0, 7.5)]
    #[case(20.0, 0.5)]
    fn thyroid_switches_at_threshold(#[case] exposure: f64, #[case] coef: f64) {
        let solution = solve(Some(&thyroid()), Sex::Female, 0.3, Ages::new(exposure, 60.0)).unwrap();
        assert!((solution.err - coef * 0.3).abs() < 1e-12);
    }

    #[rstest]
    #[case(0.2)]
    #[case(3.9)]
    fn breast_is_zero_for_males(#[case] dose: f64) {
        let model = BeirVModel::BreastAgeDependent {
            age_brackets: vec![AgeBracket {
                max_age: 30.0,
                coef: 0.8,
            }],
            default_coef: 0.1,
        };
        let male = solve(Some(&model), Sex::Male, dose, Ages::new(10.0, 60.0)).unwrap();
        assert_eq!(male.err, 0.0);
        let female = solve(Some(&model), Sex::Female, dose, Ages::new(10.0, 60.0)).unwrap();
        assert!((female.err - 0.8 * 2.0 * dose).abs() < 1e-12);
        assert_eq!(female.equation, "ERR = 0.8 * 2.0 * dose_Sv");
    }

    #[test]
    fn breast_bracket_bound_is_exclusive() {
        let brackets = [AgeBracket {
            max_age: 30.0,
            coef: 0.8,
        }];
        assert_eq!(breast_coefficient(&brackets, 0.1, 29.9), 0.8);
        assert_eq!(breast_coefficient(&brackets, 0.1, 30.0), 0.1);
    }

    #[test]
    fn leukemia_window_selection() {
        assert_eq!(leukemia_beta(&windows(), Ages::new(15.0, 25.0)), Some(4.885));
        assert_eq!(leukemia_beta(&windows(), Ages::new(15.0, 40.0)), Some(2.380));
        // young window has no fallback
        assert_eq!(leukemia_beta(&windows(), Ages::new(15.0, 50.0)), None);
        assert_eq!(leukemia_beta(&windows(), Ages::new(40.0, 80.0)), Some(1.0));
    }

    #[test]
    fn legacy_table_applies_without_windows() {
        assert_eq!(leukemia_beta(&[], Ages::new(20.0, 30.0)), Some(4.885));
        assert_eq!(leukemia_beta(&[], Ages::new(25.0, 54.0)), Some(1.638));
        assert_eq!(leukemia_beta(&[], Ages::new(25.0, 60.0)), None);
    }

    #[test]
    fn leukemia_lq_formula_and_trace() {
        let model = BeirVModel::LeukemiaLq {
            alpha2: 0.243,
            alpha3: 0.271,
            time_windows: windows(),
        };
        let solution = solve(Some(&model), Sex::Male, 0.5, Ages::new(15.0, 25.0)).unwrap();
        let expected = (0.243 * 0.5 + 0.271 * 0.25) * 4.885f64.exp();
        assert!((solution.err - expected).abs() < 1e-12);
        assert_eq!(
            solution.equation,
            "ERR = (0.243 * dose_Sv + 0.271 * dose_Sv^2) * exp(4.885)"
        );
        assert_eq!(
            solution.params,
            CalcParams::BeirV(BeirVTrace {
                model_type: "leukemia_lq".into(),
                alpha2: Some(0.243),
                alpha3: Some(0.271),
                beta: Some(4.885),
                coef: None,
            })
        );
    }

    #[test]
    fn linear_sex_keyed_and_missing() {
        let model = BeirVModel::Linear {
            family: LinearFamily::Linear,
            coef: Some(SexDependentValue::BySex {
                male: Some(0.4),
                female: None,
            }),
        };
        let ages = Ages::new(30.0, 60.0);
        assert!((solve(Some(&model), Sex::Male, 1.0, ages).unwrap().err - 0.4).abs() < 1e-12);
        assert_eq!(solve(Some(&model), Sex::Female, 1.0, ages).unwrap().err, 0.0);

        let err = solve(None, Sex::Male, 1.0, ages).unwrap_err();
        assert_eq!(err, SolverError::MissingCoefficient("coef"));
    }

    #[test]
    fn unknown_model_is_flagged_zero() {
        let model = BeirVModel::Unknown {
            model_type: "exotic".into(),
        };
        let solution = solve(Some(&model), Sex::Female, 1.0, Ages::new(30.0, 60.0)).unwrap();
        assert_eq!(solution.err, 0.0);
        assert_eq!(solution.flag, Some(UNKNOWN_MODEL_FLAG));
    }

    #[test]
    fn negative_projection_is_zero() {
        let solution = solve(Some(&thyroid()), Sex::Male, 1.0, Ages::new(50.0, 40.0)).unwrap();
        assert_eq!(solution.err, 0.0);
        assert_eq!(solution.equation, "ERR = 0 (negative projection time)");
    }
}
