//! Typed risk parameter set.
//!
//! The document is schema-checked by `beir-schema` before it is deserialized
//! into these types. Model families are closed variants: BEIR VII tags outside
//! `solid`/`leukemia` never reach this point (the schema rejects them), while
//! unknown BEIR V tags are kept as [`BeirVModel::Unknown`] and evaluate to zero.

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;

use crate::enums::Sex;
use crate::values::{SexDependentValue, lenient_coefficient, lenient_sex_value};

pub const DEFAULT_LATENCY_YEARS: f64 = 5.0;
pub const DEFAULT_DDREF: f64 = 1.0;
pub const DEFAULT_ALPHA2: f64 = 0.243;
pub const DEFAULT_ALPHA3: f64 = 0.271;
pub const DEFAULT_BREAST_COEF: f64 = 0.1;
pub const DEFAULT_THYROID_THRESHOLD_AGE: f64 = 18.0;
pub const DEFAULT_THYROID_COEF_YOUNG: f64 = 7.5;
pub const DEFAULT_THYROID_COEF_ADULT: f64 = 0.5;

/// Exposure-age ceiling assumed for a time window that omits one.
pub const OPEN_WINDOW_AGE: f64 = 999.0;

const fn default_latency() -> f64 {
    DEFAULT_LATENCY_YEARS
}

const fn default_ddref() -> f64 {
    DEFAULT_DDREF
}

const fn default_window_age() -> f64 {
    OPEN_WINDOW_AGE
}

/// The whole parameter document.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RiskParameterSet {
    #[serde(rename = "_metadata", default)]
    pub metadata: Option<ParameterMetadata>,
    pub configurations: BTreeMap<String, OrganConfig>,
}

impl RiskParameterSet {
    /// Look up an organ by its dose-matrix name.
    #[must_use]
    pub fn organ(&self, name: &str) -> Option<&OrganConfig> {
        self.configurations.get(name)
    }

    /// Document version from `_metadata`, if present.
    #[must_use]
    pub fn version(&self) -> Option<&str> {
        self.metadata.as_ref().map(|m| m.version.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ParameterMetadata {
    pub version: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub last_update: Option<String>,
}

/// Per-organ configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OrganConfig {
    pub hotspot_organ: String,
    #[serde(rename = "beir_VII_equivalence", default)]
    pub beir_vii_equivalence: Option<String>,
    pub baseline_incidence: BaselineIncidence,
    #[serde(default)]
    pub beir_vii: Option<BeirViiConfig>,
    #[serde(default)]
    pub beir_v: Option<BeirVModel>,
}

impl OrganConfig {
    /// BEIR VII beta for `sex`; `None` when the model does not apply.
    #[must_use]
    pub fn beta(&self, sex: Sex) -> Option<f64> {
        self.beir_vii
            .as_ref()
            .and_then(|vii| vii.params.beta.as_ref())
            .and_then(|beta| beta.resolve(sex))
    }
}

/// Baseline lifetime incidence per sex.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct BaselineIncidence {
    #[serde(rename = "M")]
    pub male: f64,
    #[serde(rename = "F")]
    pub female: f64,
}

impl BaselineIncidence {
    #[must_use]
    pub const fn for_sex(&self, sex: Sex) -> f64 {
        match sex {
            Sex::Male => self.male,
            Sex::Female => self.female,
        }
    }
}

// ---------------------------------------------------------------------------
// BEIR VII
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BeirViiModelType {
    #[default]
    Solid,
    Leukemia,
}

impl BeirViiModelType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Solid => "solid",
            Self::Leukemia => "leukemia",
        }
    }
}

impl fmt::Display for BeirViiModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BeirViiConfig {
    #[serde(default)]
    pub model_type: BeirViiModelType,
    #[serde(default = "default_latency")]
    pub latency: f64,
    #[serde(default = "default_ddref")]
    pub ddref: f64,
    #[serde(default)]
    pub params: BeirViiParams,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BeirViiParams {
    #[serde(default, deserialize_with = "lenient_sex_value")]
    pub beta: Option<SexDependentValue>,
    #[serde(default, deserialize_with = "lenient_coefficient")]
    pub gamma: Option<f64>,
    #[serde(default, deserialize_with = "lenient_coefficient")]
    pub eta: Option<f64>,
    #[serde(default, deserialize_with = "lenient_coefficient")]
    pub theta: Option<f64>,
    #[serde(default, deserialize_with = "lenient_coefficient")]
    pub delta: Option<f64>,
    #[serde(default, deserialize_with = "lenient_coefficient")]
    pub phi: Option<f64>,
}

// ---------------------------------------------------------------------------
// BEIR V
// ---------------------------------------------------------------------------

/// Members of the linear BEIR V family; all share `ERR = coef * dose`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinearFamily {
    Linear,
    LinearDigestive,
    LinearOther,
}

impl LinearFamily {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::LinearDigestive => "linear_digestive",
            Self::LinearOther => "linear_other",
        }
    }
}

/// Exposure-age window of the leukemia linear-quadratic model.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TimeWindow {
    #[serde(default = "default_window_age")]
    pub max_age_exposure: f64,
    #[serde(default)]
    pub intervals: Vec<WindowInterval>,
    #[serde(default)]
    pub fallback_beta: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct WindowInterval {
    pub max_years_since: f64,
    pub beta: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct AgeBracket {
    pub max_age: f64,
    pub coef: f64,
}

/// BEIR V sub-model, one closed variant per formula.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawBeirVConfig")]
pub enum BeirVModel {
    LeukemiaLq {
        alpha2: f64,
        alpha3: f64,
        /// Empty means the built-in window table applies.
        time_windows: Vec<TimeWindow>,
    },
    BreastAgeDependent {
        age_brackets: Vec<AgeBracket>,
        default_coef: f64,
    },
    ThyroidAgeDependent {
        threshold_age: f64,
        coef_young: f64,
        coef_adult: f64,
    },
    Linear {
        family: LinearFamily,
        coef: Option<SexDependentValue>,
    },
    /// Tag not understood by this build; evaluates to zero with a flag.
    Unknown { model_type: String },
}

impl BeirVModel {
    /// Tag as written in the parameter document.
    #[must_use]
    pub fn model_type(&self) -> &str {
        match self {
            Self::LeukemiaLq { .. } => "leukemia_lq",
            Self::BreastAgeDependent { .. } => "breast_age_dependent",
            Self::ThyroidAgeDependent { .. } => "thyroid_age_dependent",
            Self::Linear { family, .. } => family.as_str(),
            Self::Unknown { model_type } => model_type,
        }
    }
}

fn default_beir_v_type() -> String {
    LinearFamily::LinearOther.as_str().to_string()
}

#[derive(Deserialize)]
struct RawBeirVConfig {
    #[serde(default = "default_beir_v_type")]
    model_type: String,
    #[serde(default)]
    params: RawBeirVParams,
}

#[derive(Default, Deserialize)]
struct RawBeirVParams {
    #[serde(default, deserialize_with = "lenient_coefficient")]
    alpha2: Option<f64>,
    #[serde(default, deserialize_with = "lenient_coefficient")]
    alpha3: Option<f64>,
    #[serde(default)]
    time_windows: Vec<TimeWindow>,
    #[serde(default)]
    age_brackets: Vec<AgeBracket>,
    #[serde(default, deserialize_with = "lenient_coefficient")]
    default_coef: Option<f64>,
    #[serde(default, deserialize_with = "lenient_coefficient")]
    threshold_age: Option<f64>,
    #[serde(default, deserialize_with = "lenient_coefficient")]
    coef_young: Option<f64>,
    #[serde(default, deserialize_with = "lenient_coefficient")]
    coef_adult: Option<f64>,
    #[serde(default, deserialize_with = "lenient_sex_value")]
    coef: Option<SexDependentValue>,
}

impl From<RawBeirVConfig> for BeirVModel {
    fn from(raw: RawBeirVConfig) -> Self {
        let p = raw.params;
        match raw.model_type.as_str() {
            "leukemia_lq" => Self::LeukemiaLq {
                alpha2: p.alpha2.unwrap_or(DEFAULT_ALPHA2),
                alpha3: p.alpha3.unwrap_or(DEFAULT_ALPHA3),
                time_windows: p.time_windows,
            },
            "breast_age_dependent" => Self::BreastAgeDependent {
                age_brackets: p.age_brackets,
                default_coef: p.default_coef.unwrap_or(DEFAULT_BREAST_COEF),
            },
            "thyroid_age_dependent" => Self::ThyroidAgeDependent {
                threshold_age: p.threshold_age.unwrap_or(DEFAULT_THYROID_THRESHOLD_AGE),
                coef_young: p.coef_young.unwrap_or(DEFAULT_THYROID_COEF_YOUNG),
                coef_adult: p.coef_adult.unwrap_or(DEFAULT_THYROID_COEF_ADULT),
            },
            "linear" => Self::Linear {
                family: LinearFamily::Linear,
                coef: p.coef,
            },
            "linear_digestive" => Self::Linear {
                family: LinearFamily::LinearDigestive,
                coef: p.coef,
            },
            "linear_other" => Self::Linear {
                family: LinearFamily::LinearOther,
                coef: p.coef,
            },
            _ => {
                tracing::warn!(model_type = %raw.model_type, "unknown BEIR V model type, cells will evaluate to zero");
                Self::Unknown {
                    model_type: raw.model_type,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(json: &str) -> RiskParameterSet {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn organ_defaults_fill_in() {
        let set = parse(
            r#"{
                "configurations": {
                    "lung": {
                        "hotspot_organ": "lung",
                        "baseline_incidence": {"M": 0.07, "F": 0.05},
                        "beir_vii": {"params": {"beta": {"M": 0.32, "F": 1.4}}}
                    }
                }
            }"#,
        );
        let lung = set.organ("lung").unwrap();
        let vii = lung.beir_vii.as_ref().unwrap();
        assert_eq!(vii.model_type, BeirViiModelType::Solid);
        assert_eq!(vii.latency, DEFAULT_LATENCY_YEARS);
        assert_eq!(vii.ddref, DEFAULT_DDREF);
        assert_eq!(vii.params.gamma, None);
        assert_eq!(lung.beta(Sex::Female), Some(1.4));
        assert_eq!(lung.baseline_incidence.for_sex(Sex::Male), 0.07);
        assert!(lung.beir_v.is_none());
        assert!(set.version().is_none());
    }

    #[test]
    fn beta_undefined_for_sex() {
        let set = parse(
            r#"{
                "configurations": {
                    "breast": {
                        "hotspot_organ": "breast",
                        "baseline_incidence": {"M": 0.0, "F": 0.12},
                        "beir_vii": {"params": {"beta": {"M": null, "F": 0.51}}}
                    }
                }
            }"#,
        );
        assert_eq!(set.organ("breast").unwrap().beta(Sex::Male), None);
    }

    #[test]
    fn beir_v_variants_from_tags() {
        let set = parse(
            r#"{
                "_metadata": {"version": "2.0"},
                "configurations": {
                    "red_marrow": {
                        "hotspot_organ": "red_marrow",
                        "baseline_incidence": {"M": 0.01, "F": 0.01},
                        "beir_v": {"model_type": "leukemia_lq", "params": {}}
                    },
                    "thyroid": {
                        "hotspot_organ": "thyroid",
                        "baseline_incidence": {"M": 0.01, "F": 0.02},
                        "beir_v": {"model_type": "thyroid_age_dependent"}
                    },
                    "liver": {
                        "hotspot_organ": "liver",
                        "baseline_incidence": {"M": 0.01, "F": 0.01},
                        "beir_v": {"model_type": "linear_digestive", "params": {"coef": 0.2}}
                    },
                    "skin": {
                        "hotspot_organ": "skin",
                        "baseline_incidence": {"M": 0.01, "F": 0.01},
                        "beir_v": {"model_type": "quadratic_exotic"}
                    }
                }
            }"#,
        );
        assert_eq!(set.version(), Some("2.0"));
        assert_eq!(
            set.organ("red_marrow").unwrap().beir_v,
            Some(BeirVModel::LeukemiaLq {
                alpha2: DEFAULT_ALPHA2,
                alpha3: DEFAULT_ALPHA3,
                time_windows: vec![],
            })
        );
        assert_eq!(
            set.organ("thyroid").unwrap().beir_v,
            Some(BeirVModel::ThyroidAgeDependent {
                threshold_age: 18.0,
                coef_young: 7.5,
                coef_adult: 0.5,
            })
        );
        assert_eq!(
            set.organ("liver").unwrap().beir_v,
            Some(BeirVModel::Linear {
                family: LinearFamily::LinearDigestive,
                coef: Some(SexDependentValue::Scalar(0.2)),
            })
        );
        let skin = set.organ("skin").unwrap().beir_v.as_ref().unwrap();
        assert_eq!(skin.model_type(), "quadratic_exotic");
    }

    #[test]
    fn missing_beir_v_tag_defaults_to_linear_other() {
        let model: BeirVModel = serde_json::from_str(r#"{"params": {"coef": 0.1}}"#).unwrap();
        assert_eq!(model.model_type(), "linear_other");
    }

    #[test]
    fn time_window_defaults() {
        let window: TimeWindow = serde_json::from_str(r#"{"intervals": []}"#).unwrap();
        assert_eq!(window.max_age_exposure, OPEN_WINDOW_AGE);
        assert_eq!(window.fallback_beta, None);
    }
}
