/// Fallback base interval ceiling (days) when no global deck record exists.
/// Multiplied by the card's ease factor to get the interval at which growth
/// is fully dampened.
pub const DEFAULT_DAYS_UPPER: f64 = 200.0;

/// Fallback minimum multiplier applied to the current interval when
/// answering "again".
pub const DEFAULT_MIN_AGAIN_MULT: f64 = 0.0;

/// Assumed historical success rate when the card's blob carries none.
pub const DEFAULT_SUCCESS_RATE: f64 = 0.99;

/// Intervals below this many days pass through the fuzz step unchanged.
pub const FUZZ_MIN_IVL: f64 = 2.5;

/// Absolute lower bound (days) of the fuzz band.
pub const FUZZ_FLOOR: f64 = 2.0;

/// Lower edge of the fuzz band, as a fraction of the interval.
pub const FUZZ_BAND_LOW: f64 = 0.95;

/// Upper edge of the fuzz band, as a fraction of the interval.
pub const FUZZ_BAND_HIGH: f64 = 1.05;

/// Seed slots are kept in `[0, SEED_MODULUS)`.
pub const SEED_MODULUS: u32 = 10_000;
