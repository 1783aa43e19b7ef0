use chrono::Utc;
use tracing::{debug, warn};

use crate::constants::DEFAULT_SUCCESS_RATE;
use crate::engine::config::{self, EngineConfig};
use crate::engine::fuzz::{self, SeedChain};
use crate::engine::report::{AdjustmentOutcome, AdjustmentReport, GradeAdjustment, SkipReason};
use crate::engine::transform;
use crate::engine::types::{CustomDataScope, Grade, SchedulingStates};
use crate::error::{ConfigError, Warning};

/// The four-grade consistency pass over one review event.
///
/// Dampens the "good" proposal, re-derives "again"/"hard"/"easy" against it
/// and the current interval, and rotates the persisted seed chain. All
/// failure modes are non-fatal: the worst case leaves the scheduler's
/// proposals untouched.
pub struct AdjustmentEngine {
    config: EngineConfig,
}

impl AdjustmentEngine {
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Adjust the four candidate states in place.
    ///
    /// `entropy` is only invoked when the persisted seed chain is missing or
    /// malformed; it should return the host's per-event seed when one
    /// exists, else the card's displayed text.
    pub fn adjust(
        &self,
        states: &mut SchedulingStates,
        custom_data: &mut CustomDataScope,
        deck_path: Option<&str>,
        entropy: impl FnOnce() -> String,
    ) -> AdjustmentReport {
        if let Some(path) = deck_path {
            if self.config.is_deck_skipped(path) {
                debug!(deck = path, "adjustment disabled for this deck");
                return AdjustmentReport::skipped(deck_path, SkipReason::DeckDisabled);
            }
        }

        // Dampening needs an established review history.
        if states.current.is_new_or_learning() {
            return AdjustmentReport::skipped(deck_path, SkipReason::NewOrLearning);
        }
        if !self.config.policy.dampen_relearning && states.current.is_relearning() {
            return AdjustmentReport::skipped(deck_path, SkipReason::RelearningExcluded);
        }

        let (params, mut warnings) = config::resolve(deck_path, &self.config.deck_params);
        for warning in &warnings {
            warn!(%warning, "deck parameter resolution");
        }

        self.stamp_slot_presets(custom_data);

        let draw = fuzz::next_fuzz(SeedChain::from_scope(custom_data), entropy);
        draw.chain.write_to(custom_data);
        debug!(fuzz = draw.value, source = ?draw.source, "fuzz drawn");

        let current = states.current.review_data().copied();
        let (cur_fct, cur_ivl) = match current {
            Some(data) if data.scheduled_days > 0.0 => (data.ease_factor, data.scheduled_days),
            _ => {
                warnings.push(Warning::DegenerateInterval);
                return AdjustmentReport {
                    outcome: AdjustmentOutcome::Skipped(SkipReason::DegenerateInterval),
                    deck_path: deck_path.map(str::to_string),
                    params: Some(params),
                    fuzz: Some(draw.value),
                    seed_source: Some(draw.source),
                    grades: Vec::new(),
                    warnings,
                    generated_at: Utc::now(),
                };
            }
        };

        // Ratios are captured from the original candidates before any write.
        let again_ivl = states.again.scheduled_days().filter(|v| *v > 0.0);
        let hard_ivl = states.hard.scheduled_days().filter(|v| *v > 0.0);
        let good_ivl = states.good.scheduled_days().filter(|v| *v > 0.0);
        let easy_ivl = states.easy.scheduled_days().filter(|v| *v > 0.0);

        let again_ratio = again_ivl.map(|v| v / cur_ivl).filter(|m| m.is_finite());
        let hard_cur_mult = hard_ivl.map(|v| v / cur_ivl).filter(|m| m.is_finite());
        let easy_good_mult = match (easy_ivl, good_ivl) {
            (Some(easy), Some(good)) => Some(easy / good).filter(|m| m.is_finite()),
            _ => None,
        };

        let review_eligible = states.current.is_review();

        let good_mod = match good_ivl {
            Some(good) if cur_fct > 0.0 => Some(transform::adjust_good(
                good,
                cur_ivl,
                cur_fct,
                params.days_upper,
                draw.value,
                review_eligible,
            )),
            Some(_) => {
                warnings.push(Warning::DegenerateInterval);
                None
            }
            None => None,
        };

        let again_mod = if self.config.policy.adjust_again {
            again_ratio.map(|ratio| {
                let success_rate = custom_data
                    .current
                    .success_rate
                    .unwrap_or(DEFAULT_SUCCESS_RATE)
                    .clamp(0.0, 1.0);
                // Lower historical success steepens the penalty.
                let mult = (ratio - (1.0 - success_rate)).max(params.min_again_mult);
                (cur_ivl * mult).ceil()
            })
        } else {
            None
        };

        // A "hard" proposal at or above the current interval gets pulled
        // back toward it, the harder the closer it sits to "good".
        let hard_mod = match (hard_ivl, good_ivl, hard_cur_mult) {
            (Some(hard), Some(good), Some(mult)) if mult >= 1.0 => {
                let hard_good_ratio = (hard / good).min(1.0);
                Some((hard * (1.0 - hard_good_ratio) + cur_ivl * hard_good_ratio).ceil())
            }
            _ => None,
        };

        // Easy keeps the scheduler's easy/good spacing against dampened good.
        let easy_mod = match (good_mod, easy_good_mult) {
            (Some(good_mod), Some(mult)) => Some((good_mod * mult).ceil()),
            _ => None,
        };

        let mut grades = Vec::new();
        let updates = [
            (Grade::Again, again_ivl, again_mod),
            (Grade::Hard, hard_ivl, hard_mod),
            (Grade::Good, good_ivl, good_mod),
            (Grade::Easy, easy_ivl, easy_mod),
        ];
        for (grade, proposed, adjusted) in updates {
            let (Some(proposed), Some(adjusted)) = (proposed, adjusted) else {
                continue;
            };
            if let Some(data) = states.candidate_mut(grade).review_data_mut() {
                data.scheduled_days = adjusted;
                debug!(grade = grade.as_str(), proposed, adjusted, "interval adjusted");
                grades.push(GradeAdjustment {
                    grade,
                    proposed,
                    adjusted,
                });
            }
        }

        AdjustmentReport {
            outcome: AdjustmentOutcome::Adjusted,
            deck_path: deck_path.map(str::to_string),
            params: Some(params),
            fuzz: Some(draw.value),
            seed_source: Some(draw.source),
            grades,
            warnings,
            generated_at: Utc::now(),
        }
    }

    fn stamp_slot_presets(&self, custom_data: &mut CustomDataScope) {
        if self.config.slot_presets.is_empty() {
            return;
        }
        for grade in Grade::ALL {
            let slot = custom_data.slot_mut(grade);
            for (key, value) in &self.config.slot_presets {
                slot.extra.insert(key.clone(), value.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::config::{DeckParams, PolicyFlags};
    use crate::engine::types::{ReviewData, ReviewState};

    fn review(ease_factor: f64, scheduled_days: f64) -> ReviewState {
        ReviewState::Review(ReviewData {
            ease_factor,
            scheduled_days,
        })
    }

    fn states(cur_ivl: f64) -> SchedulingStates {
        SchedulingStates {
            current: review(2.5, cur_ivl),
            again: review(2.5, 1.0),
            hard: review(2.5, 110.0),
            good: review(2.5, 220.0),
            easy: review(2.5, 280.0),
        }
    }

    fn engine() -> AdjustmentEngine {
        AdjustmentEngine::new(EngineConfig::default()).unwrap()
    }

    #[test]
    fn new_card_passes_through_untouched() {
        let mut s = states(100.0);
        s.current = ReviewState::New;
        let before = s.clone();
        let mut scope = CustomDataScope::default();
        let report = engine().adjust(&mut s, &mut scope, Some("Main"), || "text".to_string());
        assert_eq!(
            report.outcome,
            AdjustmentOutcome::Skipped(SkipReason::NewOrLearning)
        );
        assert_eq!(s, before);
        assert_eq!(scope, CustomDataScope::default());
    }

    #[test]
    fn relearning_gate_follows_policy() {
        let relearning = ReviewState::Relearning {
            review: Some(ReviewData {
                ease_factor: 2.5,
                scheduled_days: 100.0,
            }),
        };

        let mut s = states(100.0);
        s.current = relearning.clone();
        let report = engine().adjust(
            &mut s,
            &mut CustomDataScope::default(),
            Some("Main"),
            || "text".to_string(),
        );
        assert!(report.was_adjusted());

        let config = EngineConfig {
            policy: PolicyFlags {
                dampen_relearning: false,
                adjust_again: true,
            },
            ..EngineConfig::default()
        };
        let strict = AdjustmentEngine::new(config).unwrap();
        let mut s = states(100.0);
        s.current = relearning;
        let before = s.clone();
        let report = strict.adjust(
            &mut s,
            &mut CustomDataScope::default(),
            Some("Main"),
            || "text".to_string(),
        );
        assert_eq!(
            report.outcome,
            AdjustmentOutcome::Skipped(SkipReason::RelearningExcluded)
        );
        assert_eq!(s, before);
    }

    #[test]
    fn zero_current_interval_mutates_nothing_but_refreshes_seeds() {
        let mut s = states(0.0);
        let before = s.clone();
        let mut scope = CustomDataScope::default();
        let report = engine().adjust(&mut s, &mut scope, Some("Main"), || "text".to_string());
        assert_eq!(
            report.outcome,
            AdjustmentOutcome::Skipped(SkipReason::DegenerateInterval)
        );
        assert!(report.warnings.contains(&Warning::DegenerateInterval));
        assert_eq!(s, before);
        assert!(SeedChain::from_scope(&scope).is_some());
    }

    #[test]
    fn skip_listed_deck_short_circuits_everything() {
        let config = EngineConfig {
            skip_deck_prefixes: vec!["Cram".to_string()],
            ..EngineConfig::default()
        };
        let engine = AdjustmentEngine::new(config).unwrap();
        let mut s = states(100.0);
        let before = s.clone();
        let mut scope = CustomDataScope::default();
        let report = engine.adjust(&mut s, &mut scope, Some("Cram::Exam"), || "t".to_string());
        assert_eq!(
            report.outcome,
            AdjustmentOutcome::Skipped(SkipReason::DeckDisabled)
        );
        assert_eq!(s, before);
        assert_eq!(scope, CustomDataScope::default());
    }

    #[test]
    fn good_is_dampened_within_bounds() {
        let mut s = states(100.0);
        let report = engine().adjust(
            &mut s,
            &mut CustomDataScope::default(),
            Some("Main"),
            || "text".to_string(),
        );
        assert!(report.was_adjusted());
        // pre-fuzz value is ~209.6; the fuzz band around 210 spans [199, 222]
        let good = s.good.scheduled_days().unwrap();
        assert!(good > 100.0);
        assert!((199.0..=222.0).contains(&good));
        assert_eq!(good, good.trunc());
    }

    #[test]
    fn hard_is_pulled_toward_current_when_anomalous() {
        let mut s = states(100.0);
        // hard 110 >= cur 100, hard/good = 0.5
        let report = engine().adjust(
            &mut s,
            &mut CustomDataScope::default(),
            Some("Main"),
            || "text".to_string(),
        );
        assert!(report.was_adjusted());
        let hard = s.hard.scheduled_days().unwrap();
        let expected = (110.0 * 0.5 + 100.0 * 0.5_f64).ceil();
        assert_eq!(hard, expected);
    }

    #[test]
    fn hard_below_current_is_left_alone() {
        let mut s = states(100.0);
        s.hard = review(2.5, 60.0);
        engine().adjust(
            &mut s,
            &mut CustomDataScope::default(),
            Some("Main"),
            || "text".to_string(),
        );
        assert_eq!(s.hard.scheduled_days(), Some(60.0));
    }

    #[test]
    fn easy_preserves_spacing_against_dampened_good() {
        let mut s = states(100.0);
        let easy_good_mult = 280.0 / 220.0;
        engine().adjust(
            &mut s,
            &mut CustomDataScope::default(),
            Some("Main"),
            || "text".to_string(),
        );
        let good = s.good.scheduled_days().unwrap();
        let easy = s.easy.scheduled_days().unwrap();
        assert_eq!(easy, (good * easy_good_mult).ceil());
        assert!(easy > good);
    }

    #[test]
    fn again_uses_success_rate_and_floor() {
        // again/cur = 0.01; default success rate 0.99 -> mult 0.0 -> ceil 0
        let mut s = states(100.0);
        let report = engine().adjust(
            &mut s,
            &mut CustomDataScope::default(),
            Some("Main"),
            || "text".to_string(),
        );
        assert!(report.was_adjusted());
        assert_eq!(s.again.scheduled_days(), Some(0.0));

        // lower stored success rate steepens the penalty floor-side; a
        // configured minAgainMult keeps it above zero
        let config = EngineConfig {
            deck_params: vec![DeckParams::global(200.0, 0.25)],
            ..EngineConfig::default()
        };
        let engine = AdjustmentEngine::new(config).unwrap();
        let mut s = states(100.0);
        let mut scope = CustomDataScope::default();
        scope.current.success_rate = Some(0.5);
        engine.adjust(&mut s, &mut scope, Some("Main"), || "text".to_string());
        // ratio 0.01 - 0.5 < 0.25 floor -> cur * 0.25
        assert_eq!(s.again.scheduled_days(), Some(25.0));
    }

    #[test]
    fn adjust_again_can_be_disabled() {
        let config = EngineConfig {
            policy: PolicyFlags {
                dampen_relearning: true,
                adjust_again: false,
            },
            ..EngineConfig::default()
        };
        let engine = AdjustmentEngine::new(config).unwrap();
        let mut s = states(100.0);
        engine.adjust(
            &mut s,
            &mut CustomDataScope::default(),
            Some("Main"),
            || "text".to_string(),
        );
        assert_eq!(s.again.scheduled_days(), Some(1.0));
    }

    #[test]
    fn slot_presets_are_stamped_on_every_grade() {
        let mut presets = serde_json::Map::new();
        presets.insert("v".to_string(), serde_json::Value::from("review"));
        presets.insert("fc".to_string(), serde_json::Value::from(0));
        let config = EngineConfig {
            slot_presets: presets,
            ..EngineConfig::default()
        };
        let engine = AdjustmentEngine::new(config).unwrap();
        let mut s = states(100.0);
        let mut scope = CustomDataScope::default();
        engine.adjust(&mut s, &mut scope, Some("Main"), || "text".to_string());
        for grade in Grade::ALL {
            let slot = scope.slot(grade);
            assert_eq!(slot.extra.get("v"), Some(&serde_json::Value::from("review")));
            assert_eq!(slot.extra.get("fc"), Some(&serde_json::Value::from(0)));
            assert!(slot.seed.is_some());
        }
    }

    #[test]
    fn reinvocation_with_persisted_chain_is_idempotent() {
        let mut first = states(100.0);
        let mut stored = CustomDataScope::default();
        engine().adjust(&mut first, &mut stored, Some("Main"), || "text".to_string());

        // same pending answer recomputed twice from the same stored blob:
        // identical adjusted intervals and identical refreshed chains
        let mut second = states(100.0);
        let mut scope_a = stored.clone();
        engine().adjust(&mut second, &mut scope_a, Some("Main"), || unreachable!());

        let mut third = states(100.0);
        let mut scope_b = stored.clone();
        engine().adjust(&mut third, &mut scope_b, Some("Main"), || unreachable!());

        assert_eq!(second, third);
        assert_eq!(scope_a, scope_b);
    }
}
