//! MSK Health Check Service
//!
//! Core logic: concurrent telemetry collection, rule evaluation, imbalance
//! detection and health scoring.

pub mod analysis;
pub mod collector;

pub use analysis::{
	calculate_health_score, category_score, AnalysisEngine, ImbalanceDetector,
	ImbalanceMeasurement, Requirement, Rule, RuleContext, RuleRegistry,
};
pub use collector::{
	query_with_retry, CollectionOutcome, CollectionStats, CollectorConfig, QueryOutcome,
	QueryReport, RetryPolicy, TelemetryCollector,
};
