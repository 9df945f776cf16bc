//! Data models and structures for the speed tester

pub mod config;
pub mod plan;
pub mod report;
pub mod timing;

// Re-export main model types
pub use config::Config;
pub use plan::{PlanEntry, TestPlan};
pub use report::{ClientMetadata, DirectionReport, LatencyReport, SizeReport, SpeedTestReport};
pub use timing::{PhaseDurations, PhaseRecorder, TimingSample};
