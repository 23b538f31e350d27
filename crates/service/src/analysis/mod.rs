//! Rule evaluation, imbalance detection and health scoring

pub mod context;
pub mod engine;
pub mod imbalance;
pub mod rules;
pub mod scoring;

pub use context::{Requirement, Rule, RuleContext};
pub use engine::{AnalysisEngine, RuleRegistry};
pub use imbalance::{ImbalanceDetector, ImbalanceMeasurement};
pub use scoring::{calculate_health_score, category_score};
