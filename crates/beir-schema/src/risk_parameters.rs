//! Schema of the risk parameter document.

use serde_json::{Value, json};

/// JSON Schema (draft 2020-12) for `risk_parameters.json`.
///
/// BEIR VII `model_type` is a closed enum. BEIR V `model_type` stays an open
/// string: unknown tags load and evaluate to zero with a flag.
#[must_use]
pub fn risk_parameters_schema() -> Value {
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "RiskParameters",
        "type": "object",
        "properties": {
            "_metadata": {
                "type": "object",
                "properties": {
                    "version": {"type": "string"},
                    "description": {"type": "string"},
                    "last_update": {"type": "string"}
                },
                "required": ["version"]
            },
            "configurations": {
                "type": "object",
                "additionalProperties": {"$ref": "#/$defs/organ"}
            }
        },
        "required": ["configurations"],
        "$defs": {
            "coefficient": {
                "anyOf": [
                    {"type": "number"},
                    {"type": "null"},
                    {"const": "N/A"}
                ]
            },
            "sexDependent": {
                "anyOf": [
                    {"type": "number"},
                    {
                        "type": "object",
                        "properties": {
                            "M": {"$ref": "#/$defs/coefficient"},
                            "F": {"$ref": "#/$defs/coefficient"}
                        },
                        "additionalProperties": false
                    }
                ]
            },
            "organ": {
                "type": "object",
                "properties": {
                    "hotspot_organ": {"type": "string"},
                    "beir_VII_equivalence": {"type": "string"},
                    "baseline_incidence": {
                        "type": "object",
                        "properties": {
                            "M": {"type": "number"},
                            "F": {"type": "number"}
                        },
                        "required": ["M", "F"]
                    },
                    "beir_vii": {"$ref": "#/$defs/beirVii"},
                    "beir_v": {"$ref": "#/$defs/beirV"}
                },
                "required": ["hotspot_organ", "baseline_incidence"]
            },
            "beirVii": {
                "type": "object",
                "properties": {
                    "model_type": {"enum": ["solid", "leukemia"]},
                    "latency": {"type": "number"},
                    "ddref": {"type": "number", "exclusiveMinimum": 0},
                    "params": {
                        "type": "object",
                        "properties": {
                            "beta": {
                                "anyOf": [
                                    {"$ref": "#/$defs/sexDependent"},
                                    {"type": "null"},
                                    {"const": "N/A"}
                                ]
                            },
                            "gamma": {"$ref": "#/$defs/coefficient"},
                            "eta": {"$ref": "#/$defs/coefficient"},
                            "theta": {"$ref": "#/$defs/coefficient"},
                            "delta": {"$ref": "#/$defs/coefficient"},
                            "phi": {"$ref": "#/$defs/coefficient"}
                        }
                    }
                }
            },
            "beirV": {
                "type": "object",
                "properties": {
                    "model_type": {"type": "string"},
                    "params": {
                        "type": "object",
                        "properties": {
                            "coef": {"$ref": "#/$defs/sexDependent"},
                            "alpha2": {"type": "number"},
                            "alpha3": {"type": "number"},
                            "time_windows": {
                                "type": "array",
                                "items": {
                                    "type": "object",
                                    "properties": {
                                        "max_age_exposure": {"type": "number"},
                                        "intervals": {
                                            "type": "array",
                                            "items": {
                                                "type": "object",
                                                "properties": {
                                                    "max_years_since": {"type": "number"},
                                                    "beta": {"type": "number"}
                                                },
                                                "required": ["max_years_since", "beta"]
                                            }
                                        },
                                        "fallback_beta": {"type": "number"}
                                    },
                                    "required": ["max_age_exposure", "intervals"]
                                }
                            },
                            "age_brackets": {
                                "type": "array",
                                "items": {
                                    "type": "object",
                                    "properties": {
                                        "max_age": {"type": "number"},
                                        "coef": {"type": "number"}
                                    },
                                    "required": ["max_age", "coef"]
                                }
                            },
                            "default_coef": {"type": "number"},
                            "threshold_age": {"type": "number"},
                            "coef_young": {"type": "number"},
                            "coef_adult": {"type": "number"}
                        }
                    }
                }
            }
        }
    })
}
