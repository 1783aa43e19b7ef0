use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::constants::{DEFAULT_DAYS_UPPER, DEFAULT_MIN_AGAIN_MULT};

/// Numeric review data carried by review-shaped states. `scheduled_days` is
/// the only field the engine ever writes back.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewData {
    pub ease_factor: f64,
    pub scheduled_days: f64,
}

/// Scheduling state of one grade as handed over by the upstream scheduler.
///
/// A fixed set of variants instead of the host's nested optional fields;
/// `FilteredRescheduling` wraps the state a card would return to when it
/// leaves a filtered deck.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReviewState {
    New,
    Learning,
    Relearning {
        review: Option<ReviewData>,
    },
    Review(ReviewData),
    #[serde(rename_all = "camelCase")]
    FilteredRescheduling {
        original_state: Box<ReviewState>,
    },
}

impl ReviewState {
    /// No established review history yet, looking through a filtered wrapper.
    pub fn is_new_or_learning(&self) -> bool {
        match self {
            Self::New | Self::Learning => true,
            Self::FilteredRescheduling { original_state } => original_state.is_new_or_learning(),
            _ => false,
        }
    }

    pub fn is_relearning(&self) -> bool {
        match self {
            Self::Relearning { .. } => true,
            Self::FilteredRescheduling { original_state } => original_state.is_relearning(),
            _ => false,
        }
    }

    /// Plain review state (a relearning card is not one).
    pub fn is_review(&self) -> bool {
        match self {
            Self::Review(_) => true,
            Self::FilteredRescheduling { original_state } => original_state.is_review(),
            _ => false,
        }
    }

    /// Review data lookup: `Review` first, then `Relearning`'s embedded
    /// review, then whatever the filtered wrapper's original state yields.
    pub fn review_data(&self) -> Option<&ReviewData> {
        match self {
            Self::Review(data) => Some(data),
            Self::Relearning { review } => review.as_ref(),
            Self::FilteredRescheduling { original_state } => original_state.review_data(),
            _ => None,
        }
    }

    pub fn review_data_mut(&mut self) -> Option<&mut ReviewData> {
        match self {
            Self::Review(data) => Some(data),
            Self::Relearning { review } => review.as_mut(),
            Self::FilteredRescheduling { original_state } => original_state.review_data_mut(),
            _ => None,
        }
    }

    /// Proposed next interval, when review-shaped.
    pub fn scheduled_days(&self) -> Option<f64> {
        self.review_data().map(|data| data.scheduled_days)
    }
}

/// Answer grades, in the scheduler's button order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Grade {
    Again,
    Hard,
    Good,
    Easy,
}

impl Grade {
    pub const ALL: [Grade; 4] = [Grade::Again, Grade::Hard, Grade::Good, Grade::Easy];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Again => "again",
            Self::Hard => "hard",
            Self::Good => "good",
            Self::Easy => "easy",
        }
    }
}

/// The current card state plus the four graded candidate states. Supplied by
/// the upstream scheduler each invocation and mutated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulingStates {
    pub current: ReviewState,
    pub again: ReviewState,
    pub hard: ReviewState,
    pub good: ReviewState,
    pub easy: ReviewState,
}

impl SchedulingStates {
    pub fn candidate(&self, grade: Grade) -> &ReviewState {
        match grade {
            Grade::Again => &self.again,
            Grade::Hard => &self.hard,
            Grade::Good => &self.good,
            Grade::Easy => &self.easy,
        }
    }

    pub fn candidate_mut(&mut self, grade: Grade) -> &mut ReviewState {
        match grade {
            Grade::Again => &mut self.again,
            Grade::Hard => &mut self.hard,
            Grade::Good => &mut self.good,
            Grade::Easy => &mut self.easy,
        }
    }
}

/// One grade's view of the card's persisted key-value blob. Keys the engine
/// does not own round-trip through `extra` untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeSlot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success_rate: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The card-scoped persistence view: `current` is the blob as stored on the
/// card, the four grade slots are what the host persists when the matching
/// answer is chosen.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomDataScope {
    #[serde(default)]
    pub current: GradeSlot,
    #[serde(default)]
    pub again: GradeSlot,
    #[serde(default)]
    pub hard: GradeSlot,
    #[serde(default)]
    pub good: GradeSlot,
    #[serde(default)]
    pub easy: GradeSlot,
}

impl CustomDataScope {
    pub fn slot(&self, grade: Grade) -> &GradeSlot {
        match grade {
            Grade::Again => &self.again,
            Grade::Hard => &self.hard,
            Grade::Good => &self.good,
            Grade::Easy => &self.easy,
        }
    }

    pub fn slot_mut(&mut self, grade: Grade) -> &mut GradeSlot {
        match grade {
            Grade::Again => &mut self.again,
            Grade::Hard => &mut self.hard,
            Grade::Good => &mut self.good,
            Grade::Easy => &mut self.easy,
        }
    }
}

/// Resolved deck parameters for one review event. Derived, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectiveParams {
    pub days_upper: f64,
    pub min_again_mult: f64,
}

impl Default for EffectiveParams {
    fn default() -> Self {
        Self {
            days_upper: DEFAULT_DAYS_UPPER,
            min_again_mult: DEFAULT_MIN_AGAIN_MULT,
        }
    }
}
