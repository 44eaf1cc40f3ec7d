//! BEIR VII (phase 2) excess relative risk.
//!
//! Solid cancers:
//!
//! ```text
//! ERR = beta * D * exp(gamma * e*) * (a / 60)^eta / DDREF
//! ```
//!
//! Leukemia (no DDREF, curvature is in the quadratic term):
//!
//! ```text
//! ERR = beta * D * (1 + theta * D) * exp(gamma * e* + delta * ln(t / 25) + phi * e* * ln(t / 25))
//! ```
//!
//! `a` is attained age, `t` the years since exposure. Cells inside the
//! latency period evaluate to zero.

use beir_core::numeric::{float_repr, format_fixed};
use beir_core::params::{BeirViiConfig, BeirViiModelType};
use beir_core::trail::{BeirViiTrace, CalcParams};

use crate::ages::Ages;
use crate::error::SolverError;
use crate::outcome::Solution;

pub const SOLID_EQUATION: &str =
    "ERR = beta * dose_Sv * exp(gamma * e_star) * (age_after / 60)^eta / ddref";

pub const LEUKEMIA_EQUATION: &str = "ERR = beta * dose_Sv * (1 + theta * dose_Sv) * exp(gamma * e_star + delta * log(time_since_exposure/25) + phi * e_star * log(time_since_exposure/25))";

/// Coefficients echoed into the audit trail.
#[must_use]
pub fn trace(config: &BeirViiConfig, beta: f64, ages: Ages) -> CalcParams {
    let p = &config.params;
    let leukemia = config.model_type == BeirViiModelType::Leukemia;
    CalcParams::BeirVii(BeirViiTrace {
        model_type: config.model_type.as_str().to_string(),
        latency: config.latency,
        ddref: config.ddref,
        gamma: p.gamma.unwrap_or(0.0),
        eta: p.eta.unwrap_or(0.0),
        beta,
        theta: if leukemia { p.theta } else { None },
        delta: if leukemia { p.delta } else { None },
        phi: if leukemia { p.phi } else { None },
        e_star: format_fixed(ages.e_star(), 2),
    })
}

/// Evaluate the organ's BEIR VII model for one dose.
///
/// # Errors
///
/// Returns `SolverError::MissingCoefficient` when a leukemia cell lacks
/// theta, delta, or phi, and `SolverError::NonFinite` when the arithmetic
/// does not produce a finite number.
pub fn solve(
    config: &BeirViiConfig,
    beta: f64,
    dose_sv: f64,
    ages: Ages,
) -> Result<Solution, SolverError> {
    let elapsed = ages.elapsed();
    let params = trace(config, beta, ages);

    if elapsed < config.latency {
        return Ok(Solution {
            err: 0.0,
            equation: format!(
                "ERR = 0 (elapsed time {} < latency {})",
                format_fixed(elapsed, 1),
                float_repr(config.latency)
            ),
            params,
            flag: None,
        });
    }

    let gamma = config.params.gamma.unwrap_or(0.0);
    let e_star = ages.e_star();

    let (err, equation) = match config.model_type {
        BeirViiModelType::Solid => {
            let eta = config.params.eta.unwrap_or(0.0);
            let err = beta
                * dose_sv
                * (gamma * e_star).exp()
                * (ages.attained / 60.0).powf(eta)
                / config.ddref;
            (err, SOLID_EQUATION)
        }
        BeirViiModelType::Leukemia => {
            let theta = config
                .params
                .theta
                .ok_or(SolverError::MissingCoefficient("theta"))?;
            let delta = config
                .params
                .delta
                .ok_or(SolverError::MissingCoefficient("delta"))?;
            let phi = config
                .params
                .phi
                .ok_or(SolverError::MissingCoefficient("phi"))?;
            if elapsed <= 0.0 {
                (0.0, LEUKEMIA_EQUATION)
            } else {
                let log_t = (elapsed / 25.0).ln();
                let exponent = gamma * e_star + delta * log_t + phi * e_star * log_t;
                let err = beta * dose_sv * (1.0 + theta * dose_sv) * exponent.exp();
                (err, LEUKEMIA_EQUATION)
            }
        }
    };

    if !err.is_finite() {
        return Err(SolverError::NonFinite(format!(
            "{} model gave {err} for dose {dose_sv} Sv",
            config.model_type
        )));
    }

    Ok(Solution {
        err,
        equation: equation.to_string(),
        params,
        flag: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use beir_core::params::BeirViiParams;
    use beir_core::values::SexDependentValue;

    fn solid(gamma: f64, eta: f64, ddref: f64) -> BeirViiConfig {
        BeirViiConfig {
            model_type: BeirViiModelType::Solid,
            latency: 5.0,
            ddref,
            params: BeirViiParams {
                beta: Some(SexDependentValue::Scalar(0.5)),
                gamma: Some(gamma),
                eta: Some(eta),
                ..BeirViiParams::default()
            },
        }
    }

    fn leukemia() -> BeirViiConfig {
        BeirViiConfig {
            model_type: BeirViiModelType::Leukemia,
            latency: 2.0,
            ddref: 1.0,
            params: BeirViiParams {
                beta: Some(SexDependentValue::Scalar(1.1)),
                gamma: Some(-0.4),
                eta: None,
                theta: Some(0.87),
                delta: Some(-0.48),
                phi: Some(0.42),
            },
        }
    }

    #[test]
    fn solid_reference_value() {
        let solution = solve(&solid(0.0, 0.0, 1.5), 0.5, 0.05, Ages::new(30.0, 60.0)).unwrap();
        assert!((solution.err - 0.016_666_666).abs() < 1e-8);
        assert_eq!(solution.equation, SOLID_EQUATION);
    }

    #[test]
    fn solid_with_age_terms() {
        let config = solid(-0.3, -1.4, 1.0);
        let ages = Ages::new(10.0, 70.0);
        let expected = 0.5 * 0.02 * (-0.3f64 * -2.0).exp() * (70.0f64 / 60.0).powf(-1.4);
        let solution = solve(&config, 0.5, 0.02, ages).unwrap();
        assert!((solution.err - expected).abs() < 1e-15);
    }

    #[test]
    fn latency_not_reached_is_zero() {
        let solution = solve(&solid(0.0, 0.0, 1.0), 0.5, 0.05, Ages::new(30.0, 33.0)).unwrap();
        assert_eq!(solution.err, 0.0);
        assert_eq!(solution.equation, "ERR = 0 (elapsed time 3.0 < latency 5.0)");
    }

    #[test]
    fn negative_elapsed_is_zero() {
        let solution = solve(&leukemia(), 1.1, 0.05, Ages::new(40.0, 30.0)).unwrap();
        assert_eq!(solution.err, 0.0);
    }

    #[test]
    fn leukemia_formula() {
        let ages = Ages::new(20.0, 45.0);
        let e_star = -1.0;
        let log_t = (25.0f64 / 25.0).ln();
        let expected = 1.1
            * 0.05
            * (1.0 + 0.87 * 0.05)
            * (-0.4 * e_star - 0.48 * log_t + 0.42 * e_star * log_t).exp();
        let solution = solve(&leukemia(), 1.1, 0.05, ages).unwrap();
        assert!((solution.err - expected).abs() < 1e-15);
        assert_eq!(solution.equation, LEUKEMIA_EQUATION);
        match solution.params {
            CalcParams::BeirVii(trace) => {
                assert_eq!(trace.theta, Some(0.87));
                assert_eq!(trace.e_star, "-1.00");
            }
            CalcParams::BeirV(_) => panic!("expected BEIR VII trace"),
        }
    }

    #[test]
    fn leukemia_without_theta_fails() {
        let mut config = leukemia();
        config.params.theta = None;
        let err = solve(&config, 1.1, 0.05, Ages::new(20.0, 45.0)).unwrap_err();
        assert_eq!(err, SolverError::MissingCoefficient("theta"));
    }

    #[test]
    fn non_finite_result_fails() {
        let err = solve(&solid(0.0, 0.0, 0.0), 0.5, 0.05, Ages::new(30.0, 60.0)).unwrap_err();
        assert!(matches!(err, SolverError::NonFinite(_)));
    }

    #[test]
    fn solid_trace_omits_leukemia_terms() {
        let params = trace(&solid(-0.3, -1.4, 1.5), 0.5, Ages::new(40.0, 60.0));
        match params {
            CalcParams::BeirVii(trace) => {
                assert_eq!(trace.theta, None);
                assert_eq!(trace.ddref, 1.5);
                assert_eq!(trace.e_star, "0.00");
            }
            CalcParams::BeirV(_) => panic!("expected BEIR VII trace"),
        }
    }
}
