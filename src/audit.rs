//! Decision-Quality Auditor
//!
//! Replays the last few sessions of an exercise and checks whether each
//! weight change followed what the previous session's verdict called for.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::CoachingConfig;
use crate::models::{ExerciseHistory, SessionSummary};
use crate::verdict::{Verdict, VerdictEngine, WeightAction};

/// Sessions replayed per exercise
pub const AUDIT_WINDOW: usize = 5;

/// Minimum sessions for an audit
pub const MIN_AUDIT_SESSIONS: usize = 3;

/// Peak RPE that excuses a pullback when the plan was to hold
const PULLBACK_RPE: Decimal = dec!(9.0);

/// A session together with the verdict it earned
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditedSession {
    pub session: SessionSummary,
    pub verdict: Verdict,
}

/// Judgment of one session-to-session transition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionAuditEntry {
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    /// What the older session's verdict called for
    pub optimal: WeightAction,
    /// What the newer session actually did
    pub actual: WeightAction,
    pub weight_change: Decimal,
    pub good: bool,
    /// A decrease was accepted because of a high peak RPE
    pub rpe_justified: bool,
}

impl DecisionAuditEntry {
    /// Human-readable description of the transition
    pub fn explanation(&self) -> String {
        if self.good {
            if self.rpe_justified {
                format!("{} after high RPE (justified pullback)", past_tense(self.actual))
            } else {
                format!("{} as recommended", past_tense(self.actual))
            }
        } else {
            format!(
                "should have {} but {} instead",
                past_tense(self.optimal),
                past_tense(self.actual)
            )
        }
    }
}

fn past_tense(action: WeightAction) -> &'static str {
    match action {
        WeightAction::Increase => "increased",
        WeightAction::Decrease => "decreased",
        WeightAction::Maintain => "maintained",
    }
}

/// Decision audit of one exercise
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseAudit {
    pub exercise: String,

    /// Audited sessions, newest first
    pub sessions: Vec<AuditedSession>,

    /// Scored transitions, newest first
    pub decisions: Vec<DecisionAuditEntry>,

    pub good_decisions: usize,
    pub missed_opportunities: usize,
    pub total_decisions: usize,

    /// 100 × good / total, 0 when nothing could be scored
    pub efficiency_score: Decimal,
}

impl ExerciseAudit {
    pub fn missed(&self) -> impl Iterator<Item = &DecisionAuditEntry> {
        self.decisions.iter().filter(|d| !d.good)
    }
}

/// Session-to-session auditor
#[derive(Debug, Clone)]
pub struct DecisionAuditor {
    engine: VerdictEngine,
    dead_band: Decimal,
}

impl DecisionAuditor {
    pub fn new() -> Self {
        DecisionAuditor {
            engine: VerdictEngine::new(),
            dead_band: dec!(0.5),
        }
    }

    pub fn with_config(config: &CoachingConfig) -> Self {
        DecisionAuditor {
            engine: VerdictEngine::with_config(config),
            dead_band: config.dead_band_kg,
        }
    }

    /// Classify an observed weight delta
    pub fn actual_action(&self, weight_change: Decimal) -> WeightAction {
        if weight_change > self.dead_band {
            WeightAction::Increase
        } else if weight_change < -self.dead_band {
            WeightAction::Decrease
        } else {
            WeightAction::Maintain
        }
    }

    /// Audit one exercise; `None` with fewer than three sessions
    pub fn audit(&self, history: &ExerciseHistory, config: &CoachingConfig) -> Option<ExerciseAudit> {
        let window = history.recent(AUDIT_WINDOW);
        if window.len() < MIN_AUDIT_SESSIONS {
            return None;
        }

        let sessions: Vec<AuditedSession> = window
            .iter()
            .map(|session| AuditedSession {
                verdict: self.engine.evaluate_with(session, config),
                session: session.clone(),
            })
            .collect();

        // Newest first, so each window pair is (newer, older)
        let decisions: Vec<DecisionAuditEntry> = sessions
            .windows(2)
            .filter_map(|pair| self.judge(&pair[1], &pair[0]))
            .collect();

        let good_decisions = decisions.iter().filter(|d| d.good).count();
        let missed_opportunities = decisions.len() - good_decisions;
        let total_decisions = decisions.len();
        let efficiency_score = if total_decisions > 0 {
            Decimal::from(good_decisions) / Decimal::from(total_decisions) * dec!(100)
        } else {
            Decimal::ZERO
        };

        debug!(
            exercise = %history.exercise,
            good = good_decisions,
            missed = missed_opportunities,
            efficiency = %efficiency_score.round_dp(1),
            "Audited decisions"
        );

        Some(ExerciseAudit {
            exercise: history.exercise.clone(),
            sessions,
            decisions,
            good_decisions,
            missed_opportunities,
            total_decisions,
            efficiency_score,
        })
    }

    /// Audit every exercise with enough history
    pub fn audit_all(
        &self,
        histories: &[ExerciseHistory],
        config: &CoachingConfig,
    ) -> Vec<ExerciseAudit> {
        histories
            .iter()
            .filter_map(|h| self.audit(h, config))
            .collect()
    }

    fn judge(&self, older: &AuditedSession, newer: &AuditedSession) -> Option<DecisionAuditEntry> {
        let optimal = older.verdict.optimal_action()?;
        let weight_change = newer.session.mean_weight - older.session.mean_weight;
        let actual = self.actual_action(weight_change);

        let high_rpe = |s: &SessionSummary| s.peak_rpe.is_some_and(|p| p >= PULLBACK_RPE);

        let (good, rpe_justified) = match (optimal, actual) {
            (WeightAction::Increase, WeightAction::Increase)
            | (WeightAction::Decrease, WeightAction::Decrease)
            | (WeightAction::Maintain, WeightAction::Maintain)
            | (WeightAction::Maintain, WeightAction::Increase) => (true, false),
            (WeightAction::Maintain, WeightAction::Decrease)
                if high_rpe(&older.session) || high_rpe(&newer.session) =>
            {
                (true, true)
            }
            _ => (false, false),
        };

        Some(DecisionAuditEntry {
            from_date: older.session.date,
            to_date: newer.session.date,
            optimal,
            actual,
            weight_change,
            good,
            rpe_justified,
        })
    }
}

impl Default for DecisionAuditor {
    fn default() -> Self {
        Self::new()
    }
}
