//! Verdict Engine
//!
//! Classifies a single session against its target rep range and the RPE
//! guidelines, and proposes the next working weight. RPE is consulted before
//! reps whenever it was recorded.

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::config::{CoachingConfig, RpeGuidelines};
use crate::models::{RangePosition, RepRange, SessionSummary};

/// Load multiplier when reps fall short of the range
const REPS_BELOW_LOAD_FACTOR: Decimal = dec!(0.9);
/// Assistance multiplier when reps fall short of the range
const REPS_BELOW_ASSIST_FACTOR: Decimal = dec!(1.1);
/// Assistance multiplier when reps overshoot and no RPE was logged
const REPS_ABOVE_ASSIST_FACTOR: Decimal = dec!(0.9);

/// Outcome for one session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "verdict", content = "detail", rename_all = "snake_case")]
pub enum Verdict {
    TooHeavy(Adjustment),
    TooLight(Adjustment),
    Optimal(Rationale),
    InRange,
    NoTarget,
}

/// Why a verdict was reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rationale {
    PeakRpeTooHigh,
    PeakRpeTooLow,
    ProgressionToFailure,
    RpeInTargetZone,
    RepsBelowRange,
    RepsAboveRange,
}

/// Which way the logged weight should move
///
/// For assisted exercises the logged weight is the counterweight, so
/// `Increase` means more help.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadDirection {
    Increase,
    Decrease,
}

/// A recommended weight change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Adjustment {
    pub rationale: Rationale,
    pub direction: LoadDirection,
    /// Next logged weight, rounded to the session's plate increment
    pub suggested_weight: Decimal,
    /// The weight is counterweight assistance
    pub assisted: bool,
}

/// Action implied by a verdict, or observed between two sessions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightAction {
    Increase,
    Decrease,
    Maintain,
}

impl fmt::Display for WeightAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WeightAction::Increase => "increase",
            WeightAction::Decrease => "decrease",
            WeightAction::Maintain => "maintain",
        };
        write!(f, "{}", s)
    }
}

impl Verdict {
    /// Short machine label
    pub fn label(&self) -> &'static str {
        match self {
            Verdict::TooHeavy(_) => "too_heavy",
            Verdict::TooLight(_) => "too_light",
            Verdict::Optimal(_) => "optimal",
            Verdict::InRange => "in_range",
            Verdict::NoTarget => "no_target",
        }
    }

    pub fn adjustment(&self) -> Option<&Adjustment> {
        match self {
            Verdict::TooHeavy(adj) | Verdict::TooLight(adj) => Some(adj),
            _ => None,
        }
    }

    pub fn suggested_weight(&self) -> Option<Decimal> {
        self.adjustment().map(|adj| adj.suggested_weight)
    }

    /// What the next session should do to the logged weight
    ///
    /// Follows the adjustment direction, so a too-heavy assisted lift calls
    /// for more counterweight. `None` when there is no target.
    pub fn optimal_action(&self) -> Option<WeightAction> {
        match self {
            Verdict::TooHeavy(adj) | Verdict::TooLight(adj) => Some(match adj.direction {
                LoadDirection::Increase => WeightAction::Increase,
                LoadDirection::Decrease => WeightAction::Decrease,
            }),
            Verdict::Optimal(_) | Verdict::InRange => Some(WeightAction::Maintain),
            Verdict::NoTarget => None,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Session classifier
#[derive(Debug, Clone)]
pub struct VerdictEngine {
    guidelines: RpeGuidelines,
    default_increment: Decimal,
}

impl VerdictEngine {
    /// Create an engine with the stock guidelines and a 2.5 kg increment
    pub fn new() -> Self {
        VerdictEngine {
            guidelines: RpeGuidelines::default(),
            default_increment: dec!(2.5),
        }
    }

    /// Create an engine from the coaching configuration
    pub fn with_config(config: &CoachingConfig) -> Self {
        VerdictEngine {
            guidelines: config.rpe,
            default_increment: config.default_increment_kg,
        }
    }

    /// Classify a session using the configured rep-range and assistance tables
    pub fn evaluate_with(&self, session: &SessionSummary, config: &CoachingConfig) -> Verdict {
        self.evaluate(
            session,
            config.rep_range(&session.exercise),
            config.is_assisted(&session.exercise),
        )
    }

    /// Classify a session
    pub fn evaluate(
        &self,
        session: &SessionSummary,
        range: Option<RepRange>,
        assisted: bool,
    ) -> Verdict {
        let Some(range) = range else {
            debug!(exercise = %session.exercise, "No rep target configured");
            return Verdict::NoTarget;
        };

        let g = &self.guidelines;
        let verdict = match session.peak_rpe {
            Some(peak) if peak >= g.ceiling => {
                let factor = if assisted { g.increase_factor } else { g.decrease_factor };
                self.too_heavy(session, Rationale::PeakRpeTooHigh, factor, assisted)
            }
            Some(peak) if peak <= g.floor => {
                let factor = if assisted { g.decrease_factor } else { g.increase_factor };
                self.too_light(session, Rationale::PeakRpeTooLow, factor, assisted)
            }
            Some(_) if session.final_rpe.is_some_and(|f| f >= g.decrease_threshold) => {
                Verdict::Optimal(Rationale::ProgressionToFailure)
            }
            Some(peak) if peak >= g.increase_threshold && peak <= g.decrease_threshold => {
                Verdict::Optimal(Rationale::RpeInTargetZone)
            }
            Some(_) => {
                // RPE fell in a gap between the bands
                let above_factor = if assisted { g.decrease_factor } else { g.increase_factor };
                self.by_reps(session, range, assisted, above_factor)
            }
            None => {
                let above_factor = if assisted {
                    REPS_ABOVE_ASSIST_FACTOR
                } else {
                    g.increase_factor
                };
                self.by_reps(session, range, assisted, above_factor)
            }
        };

        debug!(
            exercise = %session.exercise,
            date = %session.date,
            verdict = verdict.label(),
            suggested = ?verdict.suggested_weight(),
            "Session verdict"
        );
        verdict
    }

    fn by_reps(
        &self,
        session: &SessionSummary,
        range: RepRange,
        assisted: bool,
        above_factor: Decimal,
    ) -> Verdict {
        match range.position(session.mean_reps) {
            RangePosition::Below => {
                let factor = if assisted {
                    REPS_BELOW_ASSIST_FACTOR
                } else {
                    REPS_BELOW_LOAD_FACTOR
                };
                self.too_heavy(session, Rationale::RepsBelowRange, factor, assisted)
            }
            RangePosition::Above => {
                self.too_light(session, Rationale::RepsAboveRange, above_factor, assisted)
            }
            RangePosition::Within => Verdict::InRange,
        }
    }

    fn too_heavy(
        &self,
        session: &SessionSummary,
        rationale: Rationale,
        factor: Decimal,
        assisted: bool,
    ) -> Verdict {
        // Easing off an assisted lift means adding counterweight
        let direction = if assisted {
            LoadDirection::Increase
        } else {
            LoadDirection::Decrease
        };
        Verdict::TooHeavy(self.adjust(session, rationale, factor, direction, assisted))
    }

    fn too_light(
        &self,
        session: &SessionSummary,
        rationale: Rationale,
        factor: Decimal,
        assisted: bool,
    ) -> Verdict {
        let direction = if assisted {
            LoadDirection::Decrease
        } else {
            LoadDirection::Increase
        };
        Verdict::TooLight(self.adjust(session, rationale, factor, direction, assisted))
    }

    fn adjust(
        &self,
        session: &SessionSummary,
        rationale: Rationale,
        factor: Decimal,
        direction: LoadDirection,
        assisted: bool,
    ) -> Adjustment {
        let increment = infer_increment(&session.set_weights, self.default_increment);
        Adjustment {
            rationale,
            direction,
            suggested_weight: suggest_weight(session.mean_weight, factor, increment, direction),
            assisted,
        }
    }
}

impl Default for VerdictEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Smallest positive gap between the distinct weights used in a session
pub fn infer_increment(set_weights: &[Decimal], default: Decimal) -> Decimal {
    let mut distinct: Vec<Decimal> = set_weights.iter().map(|w| w.normalize()).collect();
    distinct.sort();
    distinct.dedup();

    distinct
        .windows(2)
        .map(|pair| pair[1] - pair[0])
        .filter(|gap| *gap > Decimal::ZERO)
        .min()
        .unwrap_or(default)
}

/// Scale, round to the increment, and make sure the weight actually moves
pub fn suggest_weight(
    current: Decimal,
    factor: Decimal,
    increment: Decimal,
    direction: LoadDirection,
) -> Decimal {
    let increment = if increment > Decimal::ZERO {
        increment
    } else {
        dec!(2.5)
    };

    let raw = current * factor;
    let mut rounded = (raw / increment)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        * increment;

    // Rounding can land on (or, off-grid, behind) the current weight
    match direction {
        LoadDirection::Increase if rounded <= current => rounded = current + increment,
        LoadDirection::Decrease if rounded >= current => rounded = current - increment,
        _ => {}
    }

    rounded.max(Decimal::ZERO).normalize()
}
