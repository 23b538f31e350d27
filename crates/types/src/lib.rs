//! MSK Health Check Types
//!
//! Shared models and traits for the cluster health check.
//! This crate contains the domain models organized by concern: metric series
//! and collections, the cluster descriptor, findings, capacity tables and the
//! telemetry seams.

pub mod cluster;
pub mod constants;
pub mod findings;
pub mod metrics;
pub mod telemetry;

// Re-export chrono and serde_json for convenience
pub use chrono;
pub use serde_json;

// Re-export commonly used types for convenience
pub use cluster::{
	AuthMethod, CapacityClass, ClusterDescriptor, InstanceFamily, LogDestination,
	SoftwareVersion, VersionParseError,
};

pub use constants::{CapacityTable, NetworkLimit, SuppressionThresholds};

pub use findings::{AnalysisResult, Category, Evidence, Finding, Severity};

pub use metrics::{
	names, CollectionError, DataPoint, MetricCatalog, MetricDefinition, MetricLevel,
	MetricSeries, MetricsCollection, MetricsCollectionBuilder, SeriesError, SeriesStatistics,
	Statistic, TimeWindow,
};

pub use telemetry::{
	ClusterDescriptorProvider, DescriptorError, DescriptorResult, Dimension, TelemetryError,
	TelemetryQuery, TelemetryResponse, TelemetryResult, TelemetrySource,
};
