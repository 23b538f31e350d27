//! MSK Health Check Adapters
//!
//! Concrete telemetry sources and cluster descriptor providers.

pub mod snapshot;

pub use mhc_types::{
	ClusterDescriptorProvider, DescriptorError, TelemetryError, TelemetryResult, TelemetrySource,
};
pub use snapshot::{SnapshotError, SnapshotFile, SnapshotSeries, SnapshotTelemetrySource};
