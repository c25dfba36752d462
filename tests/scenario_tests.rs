use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use liftcoach::audit::DecisionAuditor;
use liftcoach::export::markdown;
use liftcoach::verdict::{LoadDirection, Rationale};
use liftcoach::{progression, session};
use liftcoach::{CoachingConfig, RepRange, SetRecord, Verdict, VerdictEngine, WeightAction};

/// Coaching scenarios run end to end from raw sets

fn newest() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 9, 30).unwrap()
}

fn config_with(exercise: &str, range: RepRange) -> CoachingConfig {
    let mut config = CoachingConfig::default();
    config.rep_ranges.insert(exercise.to_string(), range);
    config
}

/// Three identical sets per session; `sessions` listed oldest first, three days apart
fn sets(exercise: &str, sessions: &[(Decimal, u32, Option<Decimal>)]) -> Vec<SetRecord> {
    let count = sessions.len() as i64;
    sessions
        .iter()
        .enumerate()
        .flat_map(|(i, &(weight, reps, rpe))| {
            let date = newest() - Duration::days(3 * (count - 1 - i as i64));
            (0..3).map(move |set_index| SetRecord {
                date,
                workout: "Workout".to_string(),
                exercise: exercise.to_string(),
                weight,
                reps,
                rpe,
                set_index,
            })
        })
        .collect()
}

#[test]
fn bench_press_progression_round_trip() {
    let config = config_with("Bench Press", RepRange::new(6, 10));
    let records = sets(
        "Bench Press",
        &[
            (dec!(60), 8, None),
            (dec!(60), 8, None),
            (dec!(60), 8, None),
            (dec!(62.5), 8, None),
        ],
    );

    let histories = session::aggregate_all(&records);
    assert_eq!(histories.len(), 1);
    let history = &histories[0];

    let engine = VerdictEngine::with_config(&config);
    let latest = history.latest().unwrap();
    assert_eq!(engine.evaluate_with(latest, &config), Verdict::InRange);

    let record = progression::track(history).unwrap();
    assert!(!record.is_stagnant);
    assert_eq!(record.weight_change, dec!(2.5));
    assert_eq!(record.weight_change_pct.round_dp(2), dec!(4.17));
    assert_eq!(record.sessions_count, 4);
}

#[test]
fn squat_high_peak_rpe_preempts_rep_range() {
    let config = config_with("Squat", RepRange::new(6, 10));
    let records = sets("Squat", &[(dec!(100), 8, Some(dec!(9.7)))]);

    let histories = session::aggregate_all(&records);
    let latest = histories[0].latest().unwrap();
    let verdict = VerdictEngine::with_config(&config).evaluate_with(latest, &config);

    match verdict {
        Verdict::TooHeavy(adj) => {
            assert_eq!(adj.rationale, Rationale::PeakRpeTooHigh);
            assert_eq!(adj.direction, LoadDirection::Decrease);
            assert!(adj.suggested_weight < dec!(100));
        }
        other => panic!("expected too_heavy, got {}", other),
    }
}

#[test]
fn missing_rep_target_gives_fixed_suggestion() {
    let config = CoachingConfig::default();
    let records = sets("Cable Woodchop", &[(dec!(15), 12, Some(dec!(8)))]);

    let histories = session::aggregate_all(&records);
    let verdict = VerdictEngine::with_config(&config).evaluate_with(histories[0].latest().unwrap(), &config);

    assert_eq!(verdict, Verdict::NoTarget);
    assert_eq!(verdict.suggested_weight(), None);
    assert_eq!(markdown::suggestion(&verdict), markdown::NO_TARGET_SUGGESTION);
}

#[test]
fn assisted_too_light_reduces_assistance() {
    let config = config_with("Assisted Pull Up", RepRange::new(6, 10));
    let records = sets("Assisted Pull Up", &[(dec!(30), 8, Some(dec!(6.5)))]);

    let histories = session::aggregate_all(&records);
    let verdict = VerdictEngine::with_config(&config).evaluate_with(histories[0].latest().unwrap(), &config);

    match &verdict {
        Verdict::TooLight(adj) => {
            assert!(adj.assisted);
            assert_eq!(adj.rationale, Rationale::PeakRpeTooLow);
            assert_eq!(adj.direction, LoadDirection::Decrease);
            assert_eq!(adj.suggested_weight, dec!(27.5));
        }
        other => panic!("expected too_light, got {}", other),
    }
    assert!(markdown::suggestion(&verdict).contains("27.5"));
}

#[test]
fn high_rpe_pullback_is_a_good_decision() {
    let config = config_with("Overhead Press", RepRange::new(6, 10));
    let records = sets(
        "Overhead Press",
        &[
            (dec!(40), 8, Some(dec!(8))),
            (dec!(42.5), 8, Some(dec!(8.5))),
            (dec!(45), 8, Some(dec!(9.6))),
            (dec!(40), 8, Some(dec!(8))),
            (dec!(40), 8, Some(dec!(8.5))),
        ],
    );

    let histories = session::aggregate_all(&records);
    let audit = DecisionAuditor::with_config(&config)
        .audit(&histories[0], &config)
        .unwrap();

    assert_eq!(audit.sessions.len(), 5);
    assert_eq!(audit.total_decisions, 4);

    // Decisions are newest first; the pullback is the second one
    let pullback = &audit.decisions[1];
    assert_eq!(pullback.weight_change, dec!(-5));
    assert_eq!(pullback.optimal, WeightAction::Decrease);
    assert_eq!(pullback.actual, WeightAction::Decrease);
    assert!(pullback.good);
    assert_eq!(audit.missed().count(), audit.missed_opportunities);
}
