use serde::Serialize;
use thiserror::Error;

/// Hard errors from up-front validation of an author-supplied deck table.
/// Never raised during an adjustment pass.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("no global deck record (empty deckPathPrefix) in the table")]
    MissingGlobalRecord,
    #[error("global deck record must set every key, missing: {0}")]
    IncompleteGlobalRecord(&'static str),
    #[error("daysUpper must be > 0 for prefix {prefix:?}, got {value}")]
    NonPositiveDaysUpper { prefix: String, value: f64 },
    #[error("minAgainMult must be finite and >= 0 for prefix {prefix:?}, got {value}")]
    InvalidAgainMult { prefix: String, value: f64 },
    #[error("duplicate deckPathPrefix: {0:?}")]
    DuplicatePrefix(String),
}

/// Non-fatal conditions surfaced through the adjustment report. The engine
/// always continues; worst case the scheduler's proposals stand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[serde(rename_all = "camelCase")]
pub enum Warning {
    #[error("no global deck record found, using built-in defaults")]
    MissingGlobalConfig,
    #[error("deck name unavailable, using global defaults")]
    UnknownDeck,
    #[error("current interval or ease factor is degenerate, proposals left untouched")]
    DegenerateInterval,
}
