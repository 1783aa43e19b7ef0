use crate::constants::{FUZZ_BAND_HIGH, FUZZ_BAND_LOW, FUZZ_FLOOR, FUZZ_MIN_IVL};

/// Growth multiplier after dampening.
///
/// Blends linearly from the full ease factor (candidate far below the
/// ease-scaled ceiling) down to `sqrt(ease_factor)` (candidate at or past
/// it). The outer `min` keeps floating rounding from ever pushing the blend
/// above the undamped multiplier.
pub fn dampened_multiplier(answer_ivl: f64, ease_factor: f64, days_upper: f64) -> f64 {
    let adj_ceiling = days_upper * ease_factor;
    let ratio = (answer_ivl / adj_ceiling).min(1.0);
    let min_mult = ease_factor.sqrt();
    ease_factor.min(ease_factor * (1.0 - ratio) + min_mult * ratio)
}

/// Dampened pre-fuzz interval for a raw candidate.
///
/// The multiplier applies to the *current* interval, not the candidate, so
/// dampening compounds across repeated reviews; the scheduler's own proposal
/// is the hard upper bound.
pub fn dampen(answer_ivl: f64, cur_ivl: f64, ease_factor: f64, days_upper: f64) -> f64 {
    answer_ivl.min(cur_ivl * dampened_multiplier(answer_ivl, ease_factor, days_upper))
}

/// Randomize an interval inside a small band around it.
///
/// Short intervals pass through untouched. For a review card whose interval
/// grew, the band floor is raised above the current interval so a growth
/// outcome never fuzzes down to a non-growth one.
pub fn apply_fuzz(mod_ivl: f64, cur_ivl: f64, fuzz: f64, review_eligible: bool) -> f64 {
    if mod_ivl < FUZZ_MIN_IVL {
        return mod_ivl;
    }
    let ivl = mod_ivl.round();
    let mut min_ivl = FUZZ_FLOOR.max((ivl * FUZZ_BAND_LOW - 1.0).round());
    let max_ivl = (ivl * FUZZ_BAND_HIGH + 1.0).round();
    if review_eligible && ivl > cur_ivl {
        min_ivl = min_ivl.max(cur_ivl + 1.0);
    }
    (fuzz * (max_ivl - min_ivl + 1.0) + min_ivl).floor()
}

/// Full adjustment for the "good" outcome: dampen, fuzz, round up.
pub fn adjust_good(
    answer_ivl: f64,
    cur_ivl: f64,
    ease_factor: f64,
    days_upper: f64,
    fuzz: f64,
    review_eligible: bool,
) -> f64 {
    let mod_ivl = dampen(answer_ivl, cur_ivl, ease_factor, days_upper);
    apply_fuzz(mod_ivl, cur_ivl, fuzz, review_eligible).ceil()
}
