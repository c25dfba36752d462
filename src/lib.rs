// Library interface for liftcoach modules
// This allows integration tests and benchmarks to access the core functionality

pub mod audit;
pub mod config;
pub mod error;
pub mod export;
pub mod hevy;
pub mod import;
pub mod logging;
pub mod models;
pub mod periodization;
pub mod progression;
pub mod quality;
pub mod report;
pub mod routine;
pub mod session;
pub mod verdict;
pub mod volume;

// Re-export commonly used types for convenience
pub use models::*;
pub use audit::{DecisionAuditor, ExerciseAudit};
pub use config::{AppConfig, CoachingConfig, RpeGuidelines};
pub use error::{CoachError, Result};
pub use logging::{LogConfig, LogFormat, LogLevel};
pub use progression::ProgressionRecord;
pub use report::CoachingReport;
pub use verdict::{Verdict, VerdictEngine, WeightAction};
