use std::collections::HashSet;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::constants::{DEFAULT_DAYS_UPPER, DEFAULT_MIN_AGAIN_MULT};
use crate::engine::types::EffectiveParams;
use crate::error::{ConfigError, Warning};

/// One per-deck override record. The record with the empty prefix is the
/// global default and must set every key; other records may set a subset and
/// inherit the rest from less specific matches.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckParams {
    /// Literal prefix of the hierarchical deck path this record applies to.
    /// `"Main"` matches `"Main"`, `"Main::Sub"` and also `"Mainline"`; end
    /// the prefix with the separator to pin a subtree.
    pub deck_path_prefix: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days_upper: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_again_mult: Option<f64>,
}

impl DeckParams {
    pub fn global(days_upper: f64, min_again_mult: f64) -> Self {
        Self {
            deck_path_prefix: String::new(),
            days_upper: Some(days_upper),
            min_again_mult: Some(min_again_mult),
        }
    }

    pub fn is_global(&self) -> bool {
        self.deck_path_prefix.is_empty()
    }
}

static DEFAULT_DECK_PARAMS: Lazy<Vec<DeckParams>> =
    Lazy::new(|| vec![DeckParams::global(DEFAULT_DAYS_UPPER, DEFAULT_MIN_AGAIN_MULT)]);

fn default_true() -> bool {
    true
}

/// Behavior switches where observed deployments legitimately differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyFlags {
    /// Treat relearning cards as review-eligible and dampen them too.
    #[serde(default = "default_true")]
    pub dampen_relearning: bool,
    /// Apply the success-rate-adjusted penalty to the "again" interval.
    #[serde(default = "default_true")]
    pub adjust_again: bool,
}

impl Default for PolicyFlags {
    fn default() -> Self {
        Self {
            dampen_relearning: true,
            adjust_again: true,
        }
    }
}

/// Author-supplied engine configuration. Immutable during a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    #[serde(default = "default_deck_params")]
    pub deck_params: Vec<DeckParams>,
    /// Decks (and their subdecks, by literal prefix) where adjustment is
    /// disabled wholesale.
    #[serde(default)]
    pub skip_deck_prefixes: Vec<String>,
    #[serde(default)]
    pub policy: PolicyFlags,
    /// Key/value pairs stamped into every grade slot's passthrough map on
    /// each review-eligible invocation, for companion tooling to pick up.
    #[serde(default)]
    pub slot_presets: Map<String, Value>,
}

fn default_deck_params() -> Vec<DeckParams> {
    DEFAULT_DECK_PARAMS.clone()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            deck_params: default_deck_params(),
            skip_deck_prefixes: Vec::new(),
            policy: PolicyFlags::default(),
            slot_presets: Map::new(),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen: HashSet<&str> = HashSet::new();
        for record in &self.deck_params {
            if !seen.insert(record.deck_path_prefix.as_str()) {
                return Err(ConfigError::DuplicatePrefix(record.deck_path_prefix.clone()));
            }
            if let Some(value) = record.days_upper {
                if !(value > 0.0) || !value.is_finite() {
                    return Err(ConfigError::NonPositiveDaysUpper {
                        prefix: record.deck_path_prefix.clone(),
                        value,
                    });
                }
            }
            if let Some(value) = record.min_again_mult {
                if !(value >= 0.0) || !value.is_finite() {
                    return Err(ConfigError::InvalidAgainMult {
                        prefix: record.deck_path_prefix.clone(),
                        value,
                    });
                }
            }
        }

        let global = self
            .deck_params
            .iter()
            .find(|record| record.is_global())
            .ok_or(ConfigError::MissingGlobalRecord)?;
        if global.days_upper.is_none() {
            return Err(ConfigError::IncompleteGlobalRecord("daysUpper"));
        }
        if global.min_again_mult.is_none() {
            return Err(ConfigError::IncompleteGlobalRecord("minAgainMult"));
        }
        Ok(())
    }

    pub fn is_deck_skipped(&self, deck_path: &str) -> bool {
        self.skip_deck_prefixes
            .iter()
            .any(|prefix| deck_path.starts_with(prefix.as_str()))
    }
}

/// Resolve the effective parameters for one deck path.
///
/// Records are re-sorted by prefix before merging, so ancestors apply before
/// descendants and the result does not depend on the table's original order.
/// More specific matches overwrite the keys they set; unset keys inherit.
pub fn resolve(deck_path: Option<&str>, configs: &[DeckParams]) -> (EffectiveParams, Vec<Warning>) {
    let mut warnings = Vec::new();

    let mut params = match configs.iter().find(|record| record.is_global()) {
        Some(global) => EffectiveParams {
            days_upper: global.days_upper.unwrap_or(DEFAULT_DAYS_UPPER),
            min_again_mult: global.min_again_mult.unwrap_or(DEFAULT_MIN_AGAIN_MULT),
        },
        None => {
            warnings.push(Warning::MissingGlobalConfig);
            EffectiveParams::default()
        }
    };

    let Some(deck_path) = deck_path else {
        warnings.push(Warning::UnknownDeck);
        return (params, warnings);
    };

    let mut overrides: Vec<&DeckParams> = configs
        .iter()
        .filter(|record| !record.is_global())
        .collect();
    overrides.sort_by(|a, b| a.deck_path_prefix.cmp(&b.deck_path_prefix));

    for record in overrides {
        if deck_path.starts_with(record.deck_path_prefix.as_str()) {
            if let Some(value) = record.days_upper {
                params.days_upper = value;
            }
            if let Some(value) = record.min_again_mult {
                params.min_again_mult = value;
            }
        }
    }

    (params, warnings)
}
