//! Telemetry replay from a JSON snapshot
//!
//! A snapshot holds the cluster descriptor and the raw samples of a previous
//! pull. Queries are answered by metric name and broker id; the query window
//! is not applied, so a snapshot replays the window it was captured for.
//!
//! ```json
//! {
//!   "descriptor": { "cluster_name": "orders", "instance_class": "kafka.m5.large", ... },
//!   "series": [
//!     { "metric": "CpuUser", "entity": 1, "label": "Percent",
//!       "datapoints": [{ "timestamp": "2024-01-01T00:00:00Z", "value": 12.5 }] }
//!   ]
//! }
//! ```

use async_trait::async_trait;
use mhc_types::{
	ClusterDescriptor, ClusterDescriptorProvider, DataPoint, DescriptorError, DescriptorResult,
	TelemetryError, TelemetryQuery, TelemetryResponse, TelemetryResult, TelemetrySource,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum SnapshotError {
	#[error("Failed to read snapshot {path}: {source}")]
	Io {
		path: String,
		#[source]
		source: std::io::Error,
	},

	#[error("Snapshot is not valid JSON: {0}")]
	Json(#[from] serde_json::Error),

	#[error("Snapshot contains two series for metric {metric} and entity {entity:?}")]
	DuplicateSeries { metric: String, entity: Option<u32> },
}

/// One recorded series
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SnapshotSeries {
	pub metric: String,
	/// Broker id; absent for cluster-wide series
	#[serde(default)]
	pub entity: Option<u32>,
	#[serde(default)]
	pub label: String,
	#[serde(default)]
	pub datapoints: Vec<DataPoint>,
}

/// On-disk snapshot layout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotFile {
	pub descriptor: ClusterDescriptor,
	/// Set for serverless clusters, which cannot be analyzed
	#[serde(default)]
	pub serverless: bool,
	#[serde(default)]
	pub series: Vec<SnapshotSeries>,
}

/// Answers telemetry queries and the descriptor from a loaded snapshot
#[derive(Debug, Clone)]
pub struct SnapshotTelemetrySource {
	descriptor: ClusterDescriptor,
	serverless: bool,
	responses: HashMap<(String, Option<u32>), TelemetryResponse>,
}

impl SnapshotTelemetrySource {
	/// Load a snapshot file from disk
	pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
		let path = path.as_ref();
		let raw = std::fs::read_to_string(path).map_err(|source| SnapshotError::Io {
			path: path.display().to_string(),
			source,
		})?;
		let source = Self::from_json(&raw)?;
		info!(
			"Loaded snapshot {} with {} series for cluster {}",
			path.display(),
			source.responses.len(),
			source.descriptor.cluster_name
		);
		Ok(source)
	}

	pub fn from_json(raw: &str) -> Result<Self, SnapshotError> {
		let file: SnapshotFile = serde_json::from_str(raw)?;
		Self::from_snapshot(file)
	}

	pub fn from_snapshot(file: SnapshotFile) -> Result<Self, SnapshotError> {
		let descriptor = file.descriptor;

		let mut responses = HashMap::with_capacity(file.series.len());
		for series in file.series {
			let key = (series.metric, series.entity);
			if responses.contains_key(&key) {
				return Err(SnapshotError::DuplicateSeries {
					metric: key.0,
					entity: key.1,
				});
			}
			responses.insert(key, TelemetryResponse::new(series.label, series.datapoints));
		}

		Ok(Self {
			descriptor,
			serverless: file.serverless,
			responses,
		})
	}

	pub fn descriptor(&self) -> &ClusterDescriptor {
		&self.descriptor
	}

	/// Number of recorded series
	pub fn len(&self) -> usize {
		self.responses.len()
	}

	pub fn is_empty(&self) -> bool {
		self.responses.is_empty()
	}
}

#[async_trait]
impl TelemetrySource for SnapshotTelemetrySource {
	async fn query(&self, query: &TelemetryQuery) -> TelemetryResult<TelemetryResponse> {
		if let Some(cluster) = query.cluster_name() {
			if cluster != self.descriptor.cluster_name {
				return Err(TelemetryError::InvalidQuery {
					metric_name: query.metric_name.clone(),
					reason: format!(
						"snapshot holds cluster {}, not {}",
						self.descriptor.cluster_name, cluster
					),
				});
			}
		}

		let key = (query.metric_name.clone(), query.entity_id());
		match self.responses.get(&key) {
			Some(response) => {
				debug!(
					"Replaying {} datapoints for {} {:?}",
					response.datapoints.len(),
					query.metric_name,
					query.entity_id()
				);
				Ok(response.clone())
			},
			None => Ok(TelemetryResponse::empty()),
		}
	}
}

#[async_trait]
impl ClusterDescriptorProvider for SnapshotTelemetrySource {
	async fn describe_cluster(&self) -> DescriptorResult<ClusterDescriptor> {
		if self.serverless {
			return Err(DescriptorError::UnsupportedServerless {
				cluster: self.descriptor.cluster_name.clone(),
			});
		}
		Ok(self.descriptor.clone())
	}
}
