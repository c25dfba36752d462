//! Markdown coaching report
//!
//! The only place verdicts are turned into sentences.

use rust_decimal::Decimal;
use std::fmt::{self, Write};

use super::ExportError;
use crate::report::{CoachingReport, LastWorkout};
use crate::verdict::{Adjustment, LoadDirection, Rationale, Verdict};

/// Suggestion for exercises without a rep target
pub const NO_TARGET_SUGGESTION: &str = "add rep target to the rep_ranges table";

/// Exercises shown in the progression section
const PROGRESSION_LIMIT: usize = 8;

/// Audits shown in the evolution section
const EVOLUTION_LIMIT: usize = 6;

/// Weight with at most one decimal place
fn kg(weight: Decimal) -> String {
    format!("{}kg", weight.round_dp(1).normalize())
}

/// Number with an explicit sign and one decimal place
fn signed(value: Decimal) -> String {
    let rounded = value.round_dp(1).normalize();
    if rounded > Decimal::ZERO {
        format!("+{}", rounded)
    } else {
        rounded.to_string()
    }
}

fn rationale_note(rationale: Rationale) -> &'static str {
    match rationale {
        Rationale::PeakRpeTooHigh => "peak RPE too high",
        Rationale::PeakRpeTooLow => "peak RPE too low",
        Rationale::ProgressionToFailure => "final set taken close to failure",
        Rationale::RpeInTargetZone => "RPE in the target zone",
        Rationale::RepsBelowRange => "reps below target range",
        Rationale::RepsAboveRange => "reps above target range",
    }
}

fn adjustment_sentence(adj: &Adjustment) -> String {
    let verb = match (adj.assisted, adj.direction) {
        (false, LoadDirection::Increase) => "increase to",
        (false, LoadDirection::Decrease) => "reduce to",
        (true, LoadDirection::Increase) => "increase assistance to",
        (true, LoadDirection::Decrease) => "reduce assistance to",
    };
    format!(
        "{} {} next time ({})",
        verb,
        kg(adj.suggested_weight),
        rationale_note(adj.rationale)
    )
}

/// Next-session suggestion for a verdict
pub fn suggestion(verdict: &Verdict) -> String {
    match verdict {
        Verdict::TooHeavy(adj) | Verdict::TooLight(adj) => adjustment_sentence(adj),
        Verdict::Optimal(Rationale::ProgressionToFailure) => {
            "progression to failure - maintain this weight".to_string()
        }
        Verdict::Optimal(_) => "perfect - maintain this weight!".to_string(),
        Verdict::InRange => "maintain this weight".to_string(),
        Verdict::NoTarget => NO_TARGET_SUGGESTION.to_string(),
    }
}

/// Short verdict label for tables
pub fn verdict_label(verdict: &Verdict) -> &'static str {
    match verdict {
        Verdict::TooHeavy(_) => "too heavy",
        Verdict::TooLight(_) => "too light",
        Verdict::Optimal(_) => "optimal",
        Verdict::InRange => "in range",
        Verdict::NoTarget => "no target",
    }
}

/// Render the full report
pub fn render(report: &CoachingReport) -> Result<String, ExportError> {
    let mut out = String::new();
    write_report(&mut out, report).map_err(|e| ExportError::Serialization(e.to_string()))?;
    Ok(out)
}

fn write_report(out: &mut String, report: &CoachingReport) -> fmt::Result {
    writeln!(out, "# Hevy Coaching Report")?;
    writeln!(out)?;
    writeln!(
        out,
        "Generated for {} from the last {} days ({} working sets).",
        report.reference_date, report.retention_days, report.total_sets
    )?;

    if report.exercises.is_empty() {
        writeln!(out)?;
        writeln!(out, "No workout data found for analysis.")?;
        return Ok(());
    }

    write_quality(out, report)?;
    write_progression(out, report)?;
    write_evolution(out, report)?;
    write_periodization(out, report)?;
    write_volume(out, report)?;
    write_overview(out, report)?;
    if let Some(last) = &report.last_workout {
        write_last_workout(out, last)?;
        write_recommendations(out, last)?;
    }
    write_next_workout(out, report)?;
    write_exclusions(out, report)?;

    Ok(())
}

fn write_quality(out: &mut String, report: &CoachingReport) -> fmt::Result {
    let Some(quality) = &report.session_quality else {
        return Ok(());
    };

    writeln!(out)?;
    writeln!(out, "## Session Quality")?;
    writeln!(out)?;
    writeln!(
        out,
        "- **Overall Grade**: {} ({}/100)",
        quality.grade,
        quality.overall_score.round()
    )?;
    writeln!(out, "- **Assessment**: {}", quality.grade.description())?;
    writeln!(
        out,
        "- **Progression**: {} progressed, {} maintained, {} regressed",
        quality.progressed, quality.maintained, quality.regressed
    )?;
    writeln!(
        out,
        "- **Intensity Score**: {}/100 (RPE balance)",
        quality.avg_rpe_score.round()
    )?;
    writeln!(
        out,
        "- **Progress Score**: {}/100 (weight progression)",
        quality.avg_progression_score.round()
    )
}

fn write_progression(out: &mut String, report: &CoachingReport) -> fmt::Result {
    let mut records: Vec<_> = report.progressions().collect();
    if records.is_empty() {
        return Ok(());
    }
    records.sort_by(|a, b| {
        let volume = |r: &&crate::progression::ProgressionRecord| {
            r.latest().map(|s| s.total_volume).unwrap_or_default()
        };
        volume(b).cmp(&volume(a))
    });

    writeln!(out)?;
    writeln!(out, "## Exercise Progression")?;

    for record in records.iter().take(PROGRESSION_LIMIT) {
        let Some(latest) = record.latest() else {
            continue;
        };

        let sessions: Vec<String> = record
            .sessions
            .iter()
            .take(3)
            .map(|s| {
                let days_ago = (latest.date - s.date).num_days();
                let age = if days_ago == 0 {
                    "latest".to_string()
                } else {
                    format!("{}d earlier", days_ago)
                };
                format!("{}×{} ({})", kg(s.mean_weight), s.mean_reps.round_dp(1).normalize(), age)
            })
            .collect();

        let trend = if !record.weight_change.is_zero() {
            format!(
                "{}kg ({}%)",
                signed(record.weight_change),
                signed(record.weight_change_pct)
            )
        } else if record.is_stagnant {
            format!("stagnant for {} sessions", record.sessions_count)
        } else {
            "maintained".to_string()
        };

        writeln!(out)?;
        writeln!(out, "**{}**", record.exercise)?;
        writeln!(out, "- Sessions: {}", sessions.join(" → "))?;
        writeln!(out, "- Trend: {}", trend)?;
        if record.sessions_count >= 3 && record.trend_change_pct.abs() >= Decimal::TWO {
            writeln!(
                out,
                "- Overall: {}% over {} sessions",
                signed(record.trend_change_pct),
                record.sessions_count
            )?;
        }
        if record.peak_performance_gap > Decimal::ZERO {
            writeln!(
                out,
                "- {}% below best session in the window",
                record.peak_performance_gap.round_dp(1).normalize()
            )?;
        }
    }
    Ok(())
}

fn write_evolution(out: &mut String, report: &CoachingReport) -> fmt::Result {
    let mut audits: Vec<_> = report.audits().filter(|a| a.total_decisions > 0).collect();
    if audits.is_empty() {
        return Ok(());
    }
    // Worst decision-makers first
    audits.sort_by(|a, b| a.efficiency_score.cmp(&b.efficiency_score));

    writeln!(out)?;
    writeln!(out, "## Decision History")?;

    for audit in audits.iter().take(EVOLUTION_LIMIT) {
        writeln!(out)?;
        writeln!(
            out,
            "**{}**: {}% efficiency ({} of {} decisions good)",
            audit.exercise,
            audit.efficiency_score.round(),
            audit.good_decisions,
            audit.total_decisions
        )?;

        let path: Vec<String> = audit
            .sessions
            .iter()
            .rev()
            .map(|s| format!("{} {}", kg(s.session.mean_weight), verdict_label(&s.verdict)))
            .collect();
        writeln!(out, "- Path: {}", path.join(" → "))?;

        for missed in audit.missed() {
            writeln!(
                out,
                "- {} → {}: {}",
                missed.from_date,
                missed.to_date,
                missed.explanation()
            )?;
        }
    }
    Ok(())
}

fn write_periodization(out: &mut String, report: &CoachingReport) -> fmt::Result {
    let p = &report.periodization;
    if p.total_exercises == 0 {
        return Ok(());
    }

    writeln!(out)?;
    writeln!(out, "## Periodization")?;
    writeln!(out)?;
    writeln!(out, "- **Program Status**: {}", p.status)?;
    writeln!(out, "- **Recommendation**: {}", p.status.recommendation())?;
    writeln!(
        out,
        "- **Plateau Rate**: {}% of {} exercises",
        p.plateau_percentage.round_dp(1).normalize(),
        p.total_exercises
    )?;

    let names = |items: Vec<String>| items.join(", ");
    if !p.progressing.is_empty() {
        writeln!(
            out,
            "- **Progressing**: {}",
            names(p.progressing.iter().map(|e| format!("{} ({}%)", e.name, signed(e.change_pct))).collect())
        )?;
    }
    if !p.smart_adjustments.is_empty() {
        writeln!(
            out,
            "- **Smart Adjustments** (high effort): {}",
            names(p.smart_adjustments.iter().map(|e| format!("{} ({}%)", e.name, signed(e.change_pct))).collect())
        )?;
    }
    if !p.regressing.is_empty() {
        writeln!(
            out,
            "- **Regressing**: {}",
            names(p.regressing.iter().map(|e| format!("{} ({}%)", e.name, signed(e.change_pct))).collect())
        )?;
    }
    if !p.plateaued.is_empty() {
        writeln!(
            out,
            "- **Plateaued**: {}",
            names(p.plateaued.iter().map(|e| e.name.clone()).collect())
        )?;
    }
    if !p.deload_candidates.is_empty() {
        writeln!(out, "- **Deload Candidates**: {}", p.deload_candidates.join(", "))?;
    }
    Ok(())
}

fn write_volume(out: &mut String, report: &CoachingReport) -> fmt::Result {
    let Some(v) = &report.volume_recovery else {
        return Ok(());
    };

    writeln!(out)?;
    writeln!(out, "## Volume & Recovery")?;
    writeln!(out)?;
    writeln!(
        out,
        "- **Volume Trend**: {} ({}% week over week)",
        v.volume_trend,
        signed(v.volume_change_pct)
    )?;
    writeln!(
        out,
        "- **Recovery**: {} ({} days since last workout, {} days between the last two)",
        v.recovery_status, v.days_since_last, v.rest_between_last
    )?;
    writeln!(
        out,
        "- **Average Rest**: {} days across {} training days",
        v.avg_rest_days.round_dp(1).normalize(),
        v.workout_days
    )?;

    if !v.muscle_volume.is_empty() {
        let mut groups: Vec<_> = v.muscle_volume.iter().collect();
        groups.sort_by(|a, b| b.1.cmp(a.1));
        let split: Vec<String> = groups
            .iter()
            .map(|(group, volume)| format!("{} {}", group, kg(**volume)))
            .collect();
        writeln!(out, "- **Muscle Groups**: {}", split.join(", "))?;
    }
    Ok(())
}

fn write_overview(out: &mut String, report: &CoachingReport) -> fmt::Result {
    let Some(o) = &report.overview else {
        return Ok(());
    };

    writeln!(out)?;
    writeln!(out, "## Training Overview")?;
    writeln!(out)?;
    writeln!(out, "- **Period**: {} to {}", o.first_date, o.last_date)?;
    writeln!(
        out,
        "- **Totals**: {} workouts, {} exercises, {} sets, {} lifted",
        o.total_workouts,
        o.total_exercises,
        o.total_sets,
        kg(o.total_volume)
    )?;

    writeln!(out)?;
    writeln!(out, "| Most Frequent | Sessions | Sets |")?;
    writeln!(out, "|---|---|---|")?;
    for e in &o.top_by_frequency {
        writeln!(out, "| {} | {} | {} |", e.exercise, e.sessions, e.total_sets)?;
    }

    writeln!(out)?;
    writeln!(out, "| Highest Volume | Volume |")?;
    writeln!(out, "|---|---|")?;
    for e in &o.top_by_volume {
        writeln!(out, "| {} | {} |", e.exercise, kg(e.total_volume))?;
    }
    Ok(())
}

fn write_last_workout(out: &mut String, last: &LastWorkout) -> fmt::Result {
    writeln!(out)?;
    writeln!(out, "## Last Session: {} ({})", last.title, last.date)?;
    writeln!(out)?;
    writeln!(
        out,
        "{} exercises, {} sets",
        last.exercises.len(),
        last.total_sets
    )?;

    for exercise in &last.exercises {
        let target = exercise
            .rep_range
            .map(|r| format!("target {}", r))
            .unwrap_or_else(|| "no target".to_string());

        writeln!(out)?;
        writeln!(
            out,
            "**{}** ({}, {})",
            exercise.exercise,
            target,
            verdict_label(&exercise.verdict)
        )?;
        for (i, set) in exercise.sets.iter().enumerate() {
            let rpe = set
                .rpe
                .map(|r| format!(" @ RPE {}", r.normalize()))
                .unwrap_or_default();
            writeln!(out, "{}. {} × {}{}", i + 1, kg(set.weight), set.reps, rpe)?;
        }
        writeln!(out, "- Volume: {}", kg(exercise.summary.total_volume))?;
    }
    Ok(())
}

fn write_recommendations(out: &mut String, last: &LastWorkout) -> fmt::Result {
    writeln!(out)?;
    writeln!(out, "## Next Session Recommendations")?;
    writeln!(out)?;
    for exercise in &last.exercises {
        writeln!(
            out,
            "- **{}**: {}",
            exercise.exercise,
            suggestion(&exercise.verdict)
        )?;
    }
    Ok(())
}

fn write_next_workout(out: &mut String, report: &CoachingReport) -> fmt::Result {
    let Some(next) = &report.next_workout else {
        return Ok(());
    };

    writeln!(out)?;
    writeln!(out, "## Next Workout")?;
    writeln!(out)?;
    writeln!(out, "After **{}** ({}), next up: **{}**", next.last_workout, next.last_date, next.name)?;
    if next.is_rest_day {
        writeln!(out, "Take it easy: this is a recovery day.")?;
    }
    Ok(())
}

fn write_exclusions(out: &mut String, report: &CoachingReport) -> fmt::Result {
    if report.exclusions.excluded_sets == 0 {
        return Ok(());
    }
    let names: Vec<&str> = report
        .exclusions
        .exercise_names
        .iter()
        .map(String::as_str)
        .collect();
    writeln!(out)?;
    writeln!(
        out,
        "_Excluded {} non-strength sets: {}_",
        report.exclusions.excluded_sets,
        names.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verdict::Adjustment;
    use rust_decimal_macros::dec;

    #[test]
    fn test_no_target_suggestion_is_fixed() {
        assert_eq!(suggestion(&Verdict::NoTarget), NO_TARGET_SUGGESTION);
    }

    #[test]
    fn test_assisted_sentences_mention_assistance() {
        let verdict = Verdict::TooLight(Adjustment {
            rationale: Rationale::PeakRpeTooLow,
            direction: LoadDirection::Decrease,
            suggested_weight: dec!(37.5),
            assisted: true,
        });
        assert_eq!(
            suggestion(&verdict),
            "reduce assistance to 37.5kg next time (peak RPE too low)"
        );
    }

    #[test]
    fn test_load_sentences() {
        let verdict = Verdict::TooHeavy(Adjustment {
            rationale: Rationale::RepsBelowRange,
            direction: LoadDirection::Decrease,
            suggested_weight: dec!(55.0),
            assisted: false,
        });
        assert_eq!(
            suggestion(&verdict),
            "reduce to 55kg next time (reps below target range)"
        );
    }

    #[test]
    fn test_number_formatting() {
        assert_eq!(kg(dec!(62.50)), "62.5kg");
        assert_eq!(signed(dec!(4.1666)), "+4.2");
        assert_eq!(signed(dec!(-2.04)), "-2");
        assert_eq!(signed(Decimal::ZERO), "0");
    }
}
