//! Closed enums shared by the engine, the auditor, and the CLI.
//!
//! Every enum carries a `const fn as_str()` returning its wire spelling, a
//! `Display` impl delegating to it, and a `FromStr` impl accepting the same
//! spelling case-insensitively (used by the CLI value parsers).

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// Sex
// ---------------------------------------------------------------------------

/// Biological sex axis of the risk computation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
pub enum Sex {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
}

impl Sex {
    /// Evaluation order of a run: males first, then females.
    pub const ALL: [Self; 2] = [Self::Male, Self::Female];

    /// Key used in the parameter document (`M` / `F`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Male => "M",
            Self::Female => "F",
        }
    }

    /// Label written to the risk CSV and the audit context.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sex {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "m" | "male" => Ok(Self::Male),
            "f" | "female" => Ok(Self::Female),
            other => Err(format!("unknown sex '{other}' (expected M or F)")),
        }
    }
}

// ---------------------------------------------------------------------------
// ModelName
// ---------------------------------------------------------------------------

/// Risk model generation applied to a computed cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum ModelName {
    #[serde(rename = "BEIR_VII")]
    BeirVii,
    #[serde(rename = "BEIR_V")]
    BeirV,
}

impl ModelName {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BeirVii => "BEIR_VII",
            Self::BeirV => "BEIR_V",
        }
    }
}

impl fmt::Display for ModelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BEIR_VII" => Ok(Self::BeirVii),
            "BEIR_V" => Ok(Self::BeirV),
            other => Err(format!("unknown model '{other}'")),
        }
    }
}

// ---------------------------------------------------------------------------
// ModelOverride
// ---------------------------------------------------------------------------

/// Run-wide model selection policy.
///
/// `Auto` applies the dose-threshold rule per cell; the other variants force
/// one branch for the whole run.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum ModelOverride {
    #[default]
    Auto,
    Vii,
    V,
}

impl ModelOverride {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Vii => "vii",
            Self::V => "v",
        }
    }

    /// Forced model, if any.
    #[must_use]
    pub const fn forced(self) -> Option<ModelName> {
        match self {
            Self::Auto => None,
            Self::Vii => Some(ModelName::BeirVii),
            Self::V => Some(ModelName::BeirV),
        }
    }
}

impl fmt::Display for ModelOverride {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelOverride {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "vii" | "beir_vii" => Ok(Self::Vii),
            "v" | "beir_v" => Ok(Self::V),
            other => Err(format!("unknown model override '{other}' (expected auto, vii or v)")),
        }
    }
}

// ---------------------------------------------------------------------------
// Metric
// ---------------------------------------------------------------------------

/// Risk metric columns selectable for the output CSV.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Metric {
    Err,
    Lar,
}

impl Metric {
    pub const ALL: [Self; 2] = [Self::Err, Self::Lar];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Err => "ERR",
            Self::Lar => "LAR",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, <Self as FromStr>::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ERR" => Ok(Metric::Err),
            "LAR" => Ok(Metric::Lar),
            other => Err(format!("unknown metric '{other}' (expected ERR or LAR)")),
        }
    }
}
