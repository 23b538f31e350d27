//! Time-series samples and their summary statistics
//!
//! A [`MetricSeries`] is the reduced form of one telemetry query: the samples
//! returned for a single (metric, entity) pair, ordered by timestamp, together
//! with the statistics every rule reads from.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Seconds in a day, used for growth-rate projections
const SECONDS_PER_DAY: f64 = 86_400.0;

/// Errors raised while building a series from raw samples
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SeriesError {
	#[error("Series for {metric_name} has no samples")]
	Empty { metric_name: String },
	#[error("Series for {metric_name} has a non-finite value at {timestamp}")]
	NonFinite {
		metric_name: String,
		timestamp: DateTime<Utc>,
	},
}

/// A single timestamped sample
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct DataPoint {
	pub timestamp: DateTime<Utc>,
	pub value: f64,
}

impl DataPoint {
	pub fn new(timestamp: DateTime<Utc>, value: f64) -> Self {
		Self { timestamp, value }
	}
}

/// Summary statistics of a series
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SeriesStatistics {
	pub min: f64,
	pub max: f64,
	pub mean: f64,
	pub p95: f64,
	pub p99: f64,
}

impl SeriesStatistics {
	/// Compute statistics over a set of values, or `None` when empty
	///
	/// Percentiles use linear interpolation between closest ranks:
	/// `rank = p / 100 * (n - 1)`. For the values `1..=100` this gives
	/// p95 = 95.05 and p99 = 99.01.
	pub fn from_values(values: &[f64]) -> Option<Self> {
		if values.is_empty() {
			return None;
		}

		let mut sorted = values.to_vec();
		sorted.sort_by(|a, b| a.total_cmp(b));

		let sum: f64 = sorted.iter().sum();
		Some(Self {
			min: sorted[0],
			max: sorted[sorted.len() - 1],
			mean: sum / sorted.len() as f64,
			p95: percentile(&sorted, 95.0),
			p99: percentile(&sorted, 99.0),
		})
	}
}

/// Linear-interpolated percentile over ascending values
///
/// `sorted` must be non-empty and ascending; `pct` is clamped to `[0, 100]`.
pub fn percentile(sorted: &[f64], pct: f64) -> f64 {
	match sorted.len() {
		0 => f64::NAN,
		1 => sorted[0],
		n => {
			let rank = pct.clamp(0.0, 100.0) / 100.0 * (n - 1) as f64;
			let lower = rank.floor() as usize;
			let upper = rank.ceil() as usize;
			let fraction = rank - lower as f64;
			sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
		},
	}
}

/// Time-ordered samples for one metric, optionally scoped to one entity
///
/// Immutable once constructed: samples are sorted and statistics computed in
/// [`MetricSeries::new`].
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MetricSeries {
	metric_name: String,
	entity_id: Option<u32>,
	datapoints: Vec<DataPoint>,
	unit: String,
	statistics: SeriesStatistics,
}

impl MetricSeries {
	/// Build a series from unordered samples
	pub fn new(
		metric_name: impl Into<String>,
		entity_id: Option<u32>,
		mut datapoints: Vec<DataPoint>,
		unit: impl Into<String>,
	) -> Result<Self, SeriesError> {
		let metric_name = metric_name.into();

		if let Some(bad) = datapoints.iter().find(|dp| !dp.value.is_finite()) {
			return Err(SeriesError::NonFinite {
				metric_name,
				timestamp: bad.timestamp,
			});
		}

		datapoints.sort_by_key(|dp| dp.timestamp);
		let values: Vec<f64> = datapoints.iter().map(|dp| dp.value).collect();
		let statistics = match SeriesStatistics::from_values(&values) {
			Some(stats) => stats,
			None => return Err(SeriesError::Empty { metric_name }),
		};

		Ok(Self {
			metric_name,
			entity_id,
			datapoints,
			unit: unit.into(),
			statistics,
		})
	}

	/// Convenience constructor for evenly spaced hourly values starting at `start`
	pub fn hourly(
		metric_name: impl Into<String>,
		entity_id: Option<u32>,
		start: DateTime<Utc>,
		values: &[f64],
	) -> Result<Self, SeriesError> {
		let datapoints = values
			.iter()
			.enumerate()
			.map(|(i, value)| DataPoint::new(start + chrono::Duration::hours(i as i64), *value))
			.collect();
		Self::new(metric_name, entity_id, datapoints, "")
	}

	pub fn metric_name(&self) -> &str {
		&self.metric_name
	}

	/// Entity the series belongs to; `None` for cluster-wide series
	pub fn entity_id(&self) -> Option<u32> {
		self.entity_id
	}

	pub fn is_cluster_level(&self) -> bool {
		self.entity_id.is_none()
	}

	pub fn datapoints(&self) -> &[DataPoint] {
		&self.datapoints
	}

	pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
		self.datapoints.iter().map(|dp| dp.value)
	}

	pub fn unit(&self) -> &str {
		&self.unit
	}

	pub fn statistics(&self) -> &SeriesStatistics {
		&self.statistics
	}

	pub fn len(&self) -> usize {
		self.datapoints.len()
	}

	pub fn is_empty(&self) -> bool {
		self.datapoints.is_empty()
	}

	/// Earliest sample value
	pub fn first_value(&self) -> f64 {
		self.datapoints.first().map(|dp| dp.value).unwrap_or(0.0)
	}

	/// Most recent sample value
	pub fn last_value(&self) -> f64 {
		self.datapoints.last().map(|dp| dp.value).unwrap_or(0.0)
	}

	/// Days between the first and last sample
	pub fn elapsed_days(&self) -> f64 {
		match (self.datapoints.first(), self.datapoints.last()) {
			(Some(first), Some(last)) => {
				(last.timestamp - first.timestamp).num_seconds() as f64 / SECONDS_PER_DAY
			},
			_ => 0.0,
		}
	}

	/// Label used in finding titles: "Broker 3" or "cluster"
	pub fn scope_label(&self) -> String {
		match self.entity_id {
			Some(id) => format!("Broker {}", id),
			None => "cluster".to_string(),
		}
	}
}
