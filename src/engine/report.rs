use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::engine::fuzz::SeedSource;
use crate::engine::types::{EffectiveParams, Grade};
use crate::error::Warning;

/// Why an invocation left every candidate untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SkipReason {
    /// The deck matches the skip list; nothing is touched, seeds included.
    DeckDisabled,
    /// New and learning cards have no review history to dampen.
    NewOrLearning,
    /// Relearning cards excluded by policy.
    RelearningExcluded,
    /// No usable current interval. The refreshed seed chain still persists.
    DegenerateInterval,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AdjustmentOutcome {
    Adjusted,
    Skipped(SkipReason),
}

/// One grade's proposed-versus-committed interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeAdjustment {
    pub grade: Grade,
    pub proposed: f64,
    pub adjusted: f64,
}

/// Structured record of one adjustment pass. Purely observational — hosts
/// may render it for display, the engine never reads it back.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjustmentReport {
    pub outcome: AdjustmentOutcome,
    pub deck_path: Option<String>,
    pub params: Option<EffectiveParams>,
    pub fuzz: Option<f64>,
    pub seed_source: Option<SeedSource>,
    pub grades: Vec<GradeAdjustment>,
    pub warnings: Vec<Warning>,
    pub generated_at: DateTime<Utc>,
}

impl AdjustmentReport {
    pub(crate) fn skipped(deck_path: Option<&str>, reason: SkipReason) -> Self {
        Self {
            outcome: AdjustmentOutcome::Skipped(reason),
            deck_path: deck_path.map(str::to_string),
            params: None,
            fuzz: None,
            seed_source: None,
            grades: Vec::new(),
            warnings: Vec::new(),
            generated_at: Utc::now(),
        }
    }

    pub fn was_adjusted(&self) -> bool {
        self.outcome == AdjustmentOutcome::Adjusted
    }
}
