use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::logging::LogConfig;
use crate::models::RepRange;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Application metadata
    pub metadata: ConfigMetadata,

    /// Decision-engine parameters and lookup tables
    pub coaching: CoachingConfig,

    /// Workout cycle used to predict the next session
    pub routine: RoutineConfig,

    /// Hevy API settings
    pub api: ApiSettings,

    /// Logging settings
    pub logging: LogConfig,
}

/// Configuration metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigMetadata {
    /// Configuration format version
    pub version: String,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

/// Everything the decision engine reads
///
/// Passed explicitly into every analysis entry point; nothing in the engine
/// consults global tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CoachingConfig {
    /// Weight delta (kg) below which a change counts as "maintained"
    pub dead_band_kg: Decimal,

    /// Rounding step when a session shows no usable increment
    pub default_increment_kg: Decimal,

    /// Days of history kept for analysis
    pub retention_days: u32,

    /// Substrings marking machine-assisted exercises (case-insensitive)
    pub assistance_keywords: Vec<String>,

    /// Substrings marking non-strength entries to drop (case-insensitive)
    pub excluded_exercises: Vec<String>,

    /// RPE thresholds and adjustment factors
    pub rpe: RpeGuidelines,

    /// Exercise name → target rep range
    pub rep_ranges: BTreeMap<String, RepRange>,

    /// Muscle group → exercise-name keywords, for volume breakdowns
    pub muscle_groups: BTreeMap<String, Vec<String>>,
}

/// RPE-based coaching guidelines
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RpeGuidelines {
    /// Peak RPE at or above which a session is optimal
    pub increase_threshold: Decimal,

    /// Final RPE at or above which a session counts as progression to failure
    pub decrease_threshold: Decimal,

    /// Multiplier for a load increase (5%)
    pub increase_factor: Decimal,

    /// Multiplier for a load decrease (5%)
    pub decrease_factor: Decimal,

    /// Peak RPE at or above which the load is too heavy regardless of reps
    pub ceiling: Decimal,

    /// Peak RPE at or below which the load is too light regardless of reps
    pub floor: Decimal,
}

impl Default for RpeGuidelines {
    fn default() -> Self {
        RpeGuidelines {
            increase_threshold: dec!(7.5),
            decrease_threshold: dec!(9.0),
            increase_factor: dec!(1.05),
            decrease_factor: dec!(0.95),
            ceiling: dec!(9.5),
            floor: dec!(7.0),
        }
    }
}

/// Workout cycle configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutineConfig {
    /// Ordered day names of the cycle, rest days included
    pub cycle_pattern: Vec<String>,

    /// Saved routine title → index into `cycle_pattern`
    pub title_mapping: BTreeMap<String, usize>,

    /// Fallback keyword heuristics when the title is not mapped
    pub exercise_patterns: BTreeMap<String, ExercisePattern>,
}

/// Keyword heuristic for guessing which cycle day a workout was
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExercisePattern {
    /// Lower-case keywords matched against exercise names
    pub keywords: Vec<String>,

    /// Cycle index that follows a workout of this kind
    pub next_cycle_day: usize,
}

/// Hevy API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    /// API root
    pub base_url: String,

    /// Days of events to fetch
    pub fetch_days: u32,

    /// Events per page (the API caps this at 10)
    pub page_size: u32,
}

const DEFAULT_REP_RANGES: &[(&str, u32, u32)] = &[
    // Legs
    ("Leg Press Horizontal (Machine)", 10, 12),
    ("Leg Press (Machine)", 10, 12),
    ("Bulgarian Split Squat", 8, 12),
    ("Leg Extension (Machine)", 12, 15),
    ("Leg Curl (Machine)", 12, 15),
    ("Standing Leg Curls", 10, 12),
    ("Calf Raise (Machine)", 15, 20),
    ("Calf Press (Machine)", 12, 15),
    ("Standing Calf Raise", 12, 15),
    ("Hip Abduction (Machine)", 12, 15),
    // Back / pull
    ("Lat Pulldown (Machine)", 10, 12),
    ("Pulldown (Cable)", 10, 12),
    ("Seated Cable Row - V Grip (Cable)", 10, 12),
    ("Seated Row (Machine)", 10, 12),
    ("Cable Row (Cable)", 10, 12),
    ("Barbell Row", 8, 10),
    ("T-Bar Row", 8, 12),
    ("Pull Up", 6, 10),
    ("Assisted Pull Up", 6, 10),
    ("Shrug (Dumbbell)", 10, 15),
    // Chest / push
    ("Bench Press (Barbell)", 6, 10),
    ("Bench Press (Dumbbell)", 8, 12),
    ("Incline Bench Press (Barbell)", 8, 10),
    ("Incline Bench Press (Dumbbell)", 8, 12),
    ("Chest Press (Machine)", 10, 12),
    ("Chest Press - MTS", 8, 12),
    ("Incline Chest Press (Machine)", 8, 12),
    ("Chest Dip (Assisted)", 8, 12),
    ("Seated Dip Machine", 8, 12),
    ("Push Up", 12, 20),
    // Shoulders
    ("Shoulder Press (Dumbbell)", 8, 12),
    ("Shoulder Press (Machine)", 10, 12),
    ("Seated Shoulder Press (Machine)", 8, 12),
    ("Lateral Raise (Dumbbell)", 12, 15),
    ("Lateral Raise (Machine)", 15, 20),
    ("Rear Delt Reverse Fly (Machine)", 12, 15),
    ("Face Pull (Cable)", 15, 20),
    ("Face Pull", 15, 20),
    ("Upright Row", 10, 12),
    // Arms
    ("Bicep Curl (Dumbbell)", 10, 12),
    ("Bicep Curl (Barbell)", 8, 12),
    ("Bicep Curl (Machine)", 10, 12),
    ("Hammer Curl (Dumbbell)", 10, 12),
    ("Hammer Curl (Cable)", 10, 12),
    ("Tricep Extension (Dumbbell)", 10, 12),
    ("Tricep Pushdown (Cable)", 12, 15),
    ("Triceps Rope Pushdown", 10, 12),
    ("Close Grip Bench Press", 8, 10),
    // Core / conditioning (plank and climbers are seconds / reps per side)
    ("Plank", 30, 60),
    ("Crunch", 15, 25),
    ("Russian Twist", 20, 30),
    ("Dead Bug", 10, 15),
    ("Hanging Knee Raise", 12, 15),
    ("Mountain Climber", 20, 30),
    // Compound barbell lifts
    ("Squat (Barbell)", 6, 10),
    ("Deadlift (Barbell)", 5, 8),
    ("Romanian Deadlift", 8, 12),
    ("Romanian Deadlift (Dumbbell)", 8, 12),
    ("Overhead Press (Barbell)", 6, 10),
    // Other
    ("Squat (Bodyweight)", 15, 25),
    ("Chest Fly (Machine)", 12, 15),
];

/// Substring matches, so "Walking" also drops lunge variants named after it
const DEFAULT_EXCLUDED: &[&str] = &[
    "Warm Up",
    "Treadmill",
    "Walking",
    "Running",
    "Elliptical",
    "Bike",
    "Stair Climber",
    "Rest",
    "Stretching",
    "Meditation",
    "Cardio",
];

const DEFAULT_MUSCLE_GROUPS: &[(&str, &[&str])] = &[
    ("legs", &["leg press", "squat", "leg extension", "leg curl", "calf", "bulgarian"]),
    ("chest", &["bench", "chest", "push-up", "dip"]),
    ("back", &["row", "pull", "lat", "deadlift"]),
    ("shoulders", &["shoulder", "press", "raise", "shrug"]),
    ("arms", &["curl", "tricep", "bicep"]),
];

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for AppConfig {
    fn default() -> Self {
        let now = Utc::now();

        AppConfig {
            metadata: ConfigMetadata {
                version: "1.0".to_string(),
                created_at: now,
                updated_at: now,
            },
            coaching: CoachingConfig::default(),
            routine: RoutineConfig::default_cycle(),
            api: ApiSettings::default(),
            logging: LogConfig::default(),
        }
    }
}

impl Default for ConfigMetadata {
    fn default() -> Self {
        let now = Utc::now();
        ConfigMetadata {
            version: "1.0".to_string(),
            created_at: now,
            updated_at: now,
        }
    }
}

impl Default for CoachingConfig {
    fn default() -> Self {
        CoachingConfig {
            dead_band_kg: dec!(0.5),
            default_increment_kg: dec!(2.5),
            retention_days: 90,
            assistance_keywords: to_strings(&["assisted", "assistance"]),
            excluded_exercises: to_strings(DEFAULT_EXCLUDED),
            rpe: RpeGuidelines::default(),
            rep_ranges: DEFAULT_REP_RANGES
                .iter()
                .map(|(name, min, max)| (name.to_string(), RepRange::new(*min, *max)))
                .collect(),
            muscle_groups: DEFAULT_MUSCLE_GROUPS
                .iter()
                .map(|(group, keywords)| (group.to_string(), to_strings(keywords)))
                .collect(),
        }
    }
}

impl Default for ApiSettings {
    fn default() -> Self {
        ApiSettings {
            base_url: "https://api.hevyapp.com".to_string(),
            fetch_days: 30,
            page_size: 10,
        }
    }
}

impl CoachingConfig {
    /// Target rep range for an exercise, if one is configured
    pub fn rep_range(&self, exercise: &str) -> Option<RepRange> {
        self.rep_ranges.get(exercise).copied()
    }

    /// Whether the exercise uses counterweight assistance
    pub fn is_assisted(&self, exercise: &str) -> bool {
        contains_any(exercise, &self.assistance_keywords)
    }

    /// Whether the exercise is a non-strength entry
    pub fn is_excluded(&self, exercise: &str) -> bool {
        contains_any(exercise, &self.excluded_exercises)
    }
}

/// Case-insensitive substring match against a keyword list
pub(crate) fn contains_any(name: &str, keywords: &[String]) -> bool {
    let lower = name.to_lowercase();
    keywords
        .iter()
        .any(|keyword| lower.contains(&keyword.to_lowercase()))
}

impl RoutineConfig {
    /// Six-day upper/lower cycle with two rest days
    pub fn default_cycle() -> Self {
        let cycle_pattern = to_strings(&[
            "Day 1 - Upper (Push)",
            "Day 2 - Lower (Hamstring)",
            "Day 3 - Rest / Treadmill",
            "Day 4 - Upper (Pull)",
            "Day 5 - Lower (Quad)",
            "Day 6 - Rest",
        ]);

        let title_mapping = [
            ("Day 1 - Upper (Push)", 0),
            ("Day 2 - Lower (Hamstring)", 1),
            ("Day 3 - Upper (Pull)", 3),
            ("Day 4 - Lower (Quad)", 4),
        ]
        .iter()
        .map(|(title, idx)| (title.to_string(), *idx))
        .collect();

        let patterns: [(&str, &[&str], usize); 4] = [
            ("upper_push", &["chest", "press", "shoulder", "dip", "tricep", "push"], 1),
            ("lower_hamstring", &["curl", "deadlift", "hamstring", "hip", "glute", "rdl", "sldl"], 2),
            ("upper_pull", &["lat", "pull", "row", "bicep", "chin", "pulldown"], 4),
            ("lower_quad", &["quad", "extension", "squat", "leg press", "lunge", "front squat"], 5),
        ];
        let exercise_patterns = patterns
            .iter()
            .map(|(name, keywords, next)| {
                (
                    name.to_string(),
                    ExercisePattern {
                        keywords: to_strings(keywords),
                        next_cycle_day: *next,
                    },
                )
            })
            .collect();

        RoutineConfig {
            cycle_pattern,
            title_mapping,
            exercise_patterns,
        }
    }
}

/// Configuration management implementation
impl AppConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: AppConfig = toml::from_str(&content)
            .with_context(|| "Failed to parse TOML configuration")?;

        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.metadata.updated_at = Utc::now();

        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }

        let toml_content = toml::to_string_pretty(self)
            .with_context(|| "Failed to serialize configuration to TOML")?;

        fs::write(&path, toml_content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        Ok(())
    }

    /// Get default configuration file path
    pub fn default_config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".liftcoach")
            .join("config.toml")
    }

    /// Load configuration with fallback to defaults
    pub fn load_or_default() -> Self {
        let config_path = Self::default_config_path();

        match Self::load_from_file(&config_path) {
            Ok(config) => config,
            Err(_) => {
                tracing::debug!(path = %config_path.display(), "Config file not found, using defaults");
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::default();
        let toml_str = toml::to_string(&config).unwrap();
        let deserialized: AppConfig = toml::from_str(&toml_str).unwrap();

        assert_eq!(config.metadata.version, deserialized.metadata.version);
        assert_eq!(config.coaching.rep_ranges, deserialized.coaching.rep_ranges);
        assert_eq!(config.coaching.rpe, deserialized.coaching.rpe);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let toml_str = r#"
            [coaching]
            retention_days = 60

            [coaching.rep_ranges]
            "Bench Press (Barbell)" = [5, 8]
        "#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();

        assert_eq!(config.coaching.retention_days, 60);
        assert_eq!(config.coaching.rep_ranges.len(), 1);
        assert_eq!(
            config.coaching.rep_range("Bench Press (Barbell)"),
            Some(RepRange::new(5, 8))
        );
        assert_eq!(config.coaching.rpe, RpeGuidelines::default());
        assert_eq!(config.coaching.dead_band_kg, dec!(0.5));
        assert_eq!(config.api.page_size, 10);
    }

    #[test]
    fn test_keyword_matching_is_case_insensitive() {
        let config = CoachingConfig::default();

        assert!(config.is_assisted("Assisted Pull Up"));
        assert!(config.is_assisted("Chest Dip (Assisted)"));
        assert!(!config.is_assisted("Pull Up"));

        assert!(config.is_excluded("Warm Up"));
        assert!(config.is_excluded("treadmill"));
        assert!(config.is_excluded("Incline Treadmill Walk"));
        assert!(!config.is_excluded("Bench Press (Barbell)"));
    }

    #[test]
    fn test_default_rep_ranges_are_not_excluded() {
        let config = CoachingConfig::default();
        for name in config.rep_ranges.keys() {
            assert!(!config.is_excluded(name), "{} has a range but is excluded", name);
        }
    }

    #[test]
    fn test_missing_rep_range() {
        let config = CoachingConfig::default();
        assert!(config.rep_range("Zercher Carry").is_none());
        assert_eq!(
            config.rep_range("Deadlift (Barbell)"),
            Some(RepRange::new(5, 8))
        );
    }

    #[test]
    fn test_config_file_io() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.toml");

        let mut original = AppConfig::default();
        original.coaching.retention_days = 45;
        original.save_to_file(&config_path).unwrap();

        let loaded = AppConfig::load_from_file(&config_path).unwrap();
        assert_eq!(loaded.coaching.retention_days, 45);
        assert_eq!(loaded.routine.cycle_pattern.len(), 6);
    }
}
