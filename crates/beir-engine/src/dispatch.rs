//! Per-cell state machine: ceiling check, coefficient check, model
//! selection, solve.

use beir_core::enums::{ModelName, ModelOverride, Sex};
use beir_core::params::OrganConfig;
use beir_core::trail::{BeirVTrace, CalcParams};

use crate::ages::Ages;
use crate::error::SolverError;
use crate::outcome::{CellOutcome, Evaluation, SkipReason, Solution};
use crate::{beir_v, beir_vii};

/// Doses at or above this value (mSv) are never evaluated.
pub const DOSE_CEILING_MSV: f64 = 4000.0;

/// Below this dose (mSv) the automatic selection picks BEIR VII.
pub const MODEL_THRESHOLD_MSV: f64 = 100.0;

/// Model for a dose under the given override.
#[must_use]
pub fn select_model(dose_msv: f64, model_override: ModelOverride) -> ModelName {
    model_override.forced().unwrap_or(if dose_msv < MODEL_THRESHOLD_MSV {
        ModelName::BeirVii
    } else {
        ModelName::BeirV
    })
}

/// Evaluate one (sex, organ, dose) cell.
#[must_use]
pub fn evaluate_cell(
    organ: &OrganConfig,
    sex: Sex,
    dose_sv: f64,
    ages: Ages,
    model_override: ModelOverride,
) -> CellOutcome {
    let dose_msv = dose_sv * 1000.0;
    if dose_msv >= DOSE_CEILING_MSV {
        return CellOutcome::Skipped(SkipReason::DoseCeiling { dose_msv });
    }
    let Some(beta) = organ.beta(sex) else {
        return CellOutcome::Skipped(SkipReason::NotApplicableToSex);
    };

    let model = select_model(dose_msv, model_override);
    match solve(organ, model, sex, beta, dose_sv, ages) {
        Ok(Solution {
            err,
            equation,
            params,
            flag,
        }) => {
            let baseline = organ.baseline_incidence.for_sex(sex);
            CellOutcome::Computed(Evaluation {
                model,
                err,
                lar: err * baseline,
                baseline,
                equation,
                params,
                flag,
            })
        }
        Err(error) => {
            tracing::debug!(organ = %organ.hotspot_organ, %sex, %error, "cell failed");
            CellOutcome::Failed {
                model,
                error,
                params: failure_trace(organ, model, beta, ages),
            }
        }
    }
}

fn solve(
    organ: &OrganConfig,
    model: ModelName,
    sex: Sex,
    beta: f64,
    dose_sv: f64,
    ages: Ages,
) -> Result<Solution, SolverError> {
    match model {
        ModelName::BeirVii => {
            // beta resolved, so the BEIR VII block is present
            let config = organ
                .beir_vii
                .as_ref()
                .ok_or(SolverError::MissingCoefficient("beta"))?;
            beir_vii::solve(config, beta, dose_sv, ages)
        }
        ModelName::BeirV => beir_v::solve(organ.beir_v.as_ref(), sex, dose_sv, ages),
    }
}

fn failure_trace(organ: &OrganConfig, model: ModelName, beta: f64, ages: Ages) -> CalcParams {
    match (model, organ.beir_vii.as_ref()) {
        (ModelName::BeirVii, Some(config)) => beir_vii::trace(config, beta, ages),
        _ => CalcParams::BeirV(BeirVTrace {
            model_type: organ
                .beir_v
                .as_ref()
                .map_or("linear_other", |m| m.model_type())
                .to_string(),
            ..BeirVTrace::default()
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beir_core::params::{
        BaselineIncidence, BeirVModel, BeirViiConfig, BeirViiModelType, BeirViiParams,
        LinearFamily,
    };
    use beir_core::values::SexDependentValue;
    use rstest::rstest;

    fn stomach(male_beta: Option<f64>) -> OrganConfig {
        OrganConfig {
            hotspot_organ: "stomach".into(),
            beir_vii_equivalence: Some("stomach".into()),
            baseline_incidence: BaselineIncidence {
                male: 0.0072,
                female: 0.0048,
            },
            beir_vii: Some(BeirViiConfig {
                model_type: BeirViiModelType::Solid,
                latency: 5.0,
                ddref: 1.5,
                params: BeirViiParams {
                    beta: Some(SexDependentValue::BySex {
                        male: male_beta,
                        female: Some(0.48),
                    }),
                    gamma: Some(-0.3),
                    eta: Some(-1.4),
                    ..BeirViiParams::default()
                },
            }),
            beir_v: Some(BeirVModel::Linear {
                family: LinearFamily::LinearDigestive,
                coef: Some(SexDependentValue::Scalar(0.56)),
            }),
        }
    }

    #[rstest]
    #[case(99.9, ModelOverride::Auto, ModelName::BeirVii)]
    #[case(100.0, ModelOverride::Auto, ModelName::BeirV)]
    #[case(10.0, ModelOverride::V, ModelName::BeirV)]
    #[case(2500.0, ModelOverride::Vii, ModelName::BeirVii)]
    fn selection(#[case] dose: f64, #[case] o: ModelOverride, #[case] expected: ModelName) {
        assert_eq!(select_model(dose, o), expected);
    }

    #[test]
    fn ceiling_is_checked_first() {
        let outcome = evaluate_cell(&stomach(None), Sex::Male, 4.0, Ages::new(30.0, 60.0), ModelOverride::Auto);
        assert!(outcome.is_ceiling_skip());
        assert_eq!(outcome.model(), None);
    }

    #[test]
    fn undefined_beta_skips_the_sex() {
        let outcome = evaluate_cell(&stomach(None), Sex::Male, 0.01, Ages::new(30.0, 60.0), ModelOverride::Auto);
        assert_eq!(outcome, CellOutcome::Skipped(SkipReason::NotApplicableToSex));
    }

    #[test]
    fn lar_is_err_times_baseline() {
        let organ = stomach(Some(0.21));
        for (dose, model) in [(0.05, ModelName::BeirVii), (0.5, ModelName::BeirV)] {
            let CellOutcome::Computed(eval) =
                evaluate_cell(&organ, Sex::Male, dose, Ages::new(30.0, 60.0), ModelOverride::Auto)
            else {
                panic!("expected a computed cell");
            };
            assert_eq!(eval.model, model);
            assert_eq!(eval.baseline, 0.0072);
            assert!((eval.lar - eval.err * 0.0072).abs() < 1e-18);
        }
    }

    #[test]
    fn solver_failure_is_recorded() {
        let mut organ = stomach(Some(0.21));
        organ.beir_v = Some(BeirVModel::Linear {
            family: LinearFamily::Linear,
            coef: None,
        });
        let outcome = evaluate_cell(&organ, Sex::Female, 0.2, Ages::new(30.0, 60.0), ModelOverride::Auto);
        match outcome {
            CellOutcome::Failed { model, error, params } => {
                assert_eq!(model, ModelName::BeirV);
                assert_eq!(error, SolverError::MissingCoefficient("coef"));
                assert!(matches!(params, CalcParams::BeirV(ref t) if t.model_type == "linear"));
            }
            other => panic!("unexpected outcome {other:?}"),
        }
    }
}
