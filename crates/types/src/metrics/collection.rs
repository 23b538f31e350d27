//! Window-scoped collection of metric series

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::series::MetricSeries;

/// Half-open time range `[start, end)` covered by a collection
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimeWindow {
	pub start: DateTime<Utc>,
	pub end: DateTime<Utc>,
}

impl TimeWindow {
	pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
		Self { start, end }
	}

	/// Window of `days` whole days ending now
	pub fn last_days(days: u32) -> Self {
		Self::ending_at(Utc::now(), days)
	}

	/// Window of `days` whole days ending at `end`
	pub fn ending_at(end: DateTime<Utc>, days: u32) -> Self {
		Self {
			start: end - Duration::days(i64::from(days)),
			end,
		}
	}

	pub fn duration(&self) -> Duration {
		self.end - self.start
	}

	pub fn contains(&self, timestamp: DateTime<Utc>) -> bool {
		timestamp >= self.start && timestamp < self.end
	}
}

/// Invariant violations when assembling a collection
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CollectionError {
	#[error("Series for '{actual}' cannot be stored under metric '{expected}'")]
	MetricNameMismatch { expected: String, actual: String },
	#[error("Duplicate series for metric '{metric_name}' and entity {entity:?}")]
	DuplicateEntity {
		metric_name: String,
		entity: Option<u32>,
	},
}

/// All series retrieved for one time window
///
/// Every series stored under a metric name carries that name, and entity ids
/// are unique within one metric's set. Sets are kept sorted by entity id
/// (cluster-wide series first) so equality does not depend on the order in
/// which series were added.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MetricsCollection {
	window: TimeWindow,
	metrics: BTreeMap<String, Vec<MetricSeries>>,
	missing: BTreeSet<String>,
}

impl MetricsCollection {
	/// Start assembling a collection for `window`
	pub fn builder(window: TimeWindow) -> MetricsCollectionBuilder {
		MetricsCollectionBuilder {
			collection: Self {
				window,
				metrics: BTreeMap::new(),
				missing: BTreeSet::new(),
			},
		}
	}

	/// Build a collection in one step from per-metric sets and a missing list
	pub fn try_new(
		window: TimeWindow,
		sets: impl IntoIterator<Item = (String, Vec<MetricSeries>)>,
		missing: impl IntoIterator<Item = String>,
	) -> Result<Self, CollectionError> {
		let mut builder = Self::builder(window);
		for (metric_name, series) in sets {
			builder.insert_set(&metric_name, series)?;
		}
		for metric_name in missing {
			builder.mark_missing(metric_name);
		}
		Ok(builder.build())
	}

	/// An empty collection, useful when nothing could be retrieved
	pub fn empty(window: TimeWindow) -> Self {
		Self::builder(window).build()
	}

	pub fn window(&self) -> &TimeWindow {
		&self.window
	}

	/// Metric names that have at least one series
	pub fn metric_names(&self) -> impl Iterator<Item = &str> {
		self.metrics.keys().map(String::as_str)
	}

	pub fn contains(&self, metric_name: &str) -> bool {
		self.metrics
			.get(metric_name)
			.is_some_and(|set| !set.is_empty())
	}

	/// Every series collected for `metric_name`
	pub fn series(&self, metric_name: &str) -> &[MetricSeries] {
		self.metrics
			.get(metric_name)
			.map(Vec::as_slice)
			.unwrap_or(&[])
	}

	/// The cluster-wide series for `metric_name`, if any
	pub fn cluster_series(&self, metric_name: &str) -> Option<&MetricSeries> {
		self.series(metric_name)
			.iter()
			.find(|s| s.is_cluster_level())
	}

	/// The per-entity series for `metric_name`, ordered by entity id
	pub fn entity_series(&self, metric_name: &str) -> Vec<&MetricSeries> {
		self.series(metric_name)
			.iter()
			.filter(|s| !s.is_cluster_level())
			.collect()
	}

	/// The series of one entity for `metric_name`
	pub fn series_for_entity(&self, metric_name: &str, entity_id: u32) -> Option<&MetricSeries> {
		self.series(metric_name)
			.iter()
			.find(|s| s.entity_id() == Some(entity_id))
	}

	/// Metric names for which nothing usable was retrieved
	pub fn missing(&self) -> &BTreeSet<String> {
		&self.missing
	}

	/// Number of metric names with data
	pub fn len(&self) -> usize {
		self.metrics.len()
	}

	pub fn is_empty(&self) -> bool {
		self.metrics.is_empty()
	}

	/// Number of individual series across all metrics
	pub fn total_series(&self) -> usize {
		self.metrics.values().map(Vec::len).sum()
	}
}

/// Builder that enforces the collection invariants
#[derive(Debug)]
pub struct MetricsCollectionBuilder {
	collection: MetricsCollection,
}

impl MetricsCollectionBuilder {
	/// Add one series under its own metric name
	pub fn insert_series(&mut self, series: MetricSeries) -> Result<(), CollectionError> {
		let set = self
			.collection
			.metrics
			.entry(series.metric_name().to_string())
			.or_default();

		if set.iter().any(|s| s.entity_id() == series.entity_id()) {
			return Err(CollectionError::DuplicateEntity {
				metric_name: series.metric_name().to_string(),
				entity: series.entity_id(),
			});
		}

		let position = set.partition_point(|s| s.entity_id() < series.entity_id());
		set.insert(position, series);
		Ok(())
	}

	/// Add a full set of series under `metric_name`
	pub fn insert_set(
		&mut self,
		metric_name: &str,
		series: Vec<MetricSeries>,
	) -> Result<(), CollectionError> {
		if let Some(wrong) = series.iter().find(|s| s.metric_name() != metric_name) {
			return Err(CollectionError::MetricNameMismatch {
				expected: metric_name.to_string(),
				actual: wrong.metric_name().to_string(),
			});
		}
		for s in series {
			self.insert_series(s)?;
		}
		Ok(())
	}

	/// Chainable form of [`insert_series`](Self::insert_series)
	pub fn with_series(mut self, series: MetricSeries) -> Result<Self, CollectionError> {
		self.insert_series(series)?;
		Ok(self)
	}

	/// Record that `metric_name` yielded no usable series
	pub fn mark_missing(&mut self, metric_name: impl Into<String>) {
		self.collection.missing.insert(metric_name.into());
	}

	pub fn build(self) -> MetricsCollection {
		self.collection
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::TimeZone;

	fn window() -> TimeWindow {
		TimeWindow::ending_at(Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap(), 7)
	}

	fn series(name: &str, entity: Option<u32>) -> MetricSeries {
		MetricSeries::hourly(name, entity, window().start, &[1.0, 2.0]).unwrap()
	}

	#[test]
	fn test_window_spans_requested_days() {
		let w = window();
		assert_eq!(w.duration().num_days(), 7);
		assert!(w.contains(w.start));
		assert!(!w.contains(w.end));
	}

	#[test]
	fn test_insertion_order_does_not_matter() {
		let mut a = MetricsCollection::builder(window());
		a.insert_series(series("CpuUser", Some(3))).unwrap();
		a.insert_series(series("CpuUser", Some(1))).unwrap();
		a.insert_series(series("CpuUser", Some(2))).unwrap();

		let mut b = MetricsCollection::builder(window());
		b.insert_series(series("CpuUser", Some(2))).unwrap();
		b.insert_series(series("CpuUser", Some(1))).unwrap();
		b.insert_series(series("CpuUser", Some(3))).unwrap();

		let a = a.build();
		let b = b.build();
		assert_eq!(a, b);
		let ids: Vec<_> = a.entity_series("CpuUser").iter().map(|s| s.entity_id()).collect();
		assert_eq!(ids, vec![Some(1), Some(2), Some(3)]);
	}

	#[test]
	fn test_duplicate_entity_rejected() {
		let mut builder = MetricsCollection::builder(window());
		builder.insert_series(series("CpuUser", Some(1))).unwrap();
		let err = builder.insert_series(series("CpuUser", Some(1))).unwrap_err();
		assert!(matches!(err, CollectionError::DuplicateEntity { .. }));
	}

	#[test]
	fn test_set_with_foreign_metric_rejected() {
		let mut builder = MetricsCollection::builder(window());
		let err = builder
			.insert_set("CpuUser", vec![series("CpuSystem", Some(1))])
			.unwrap_err();
		assert!(matches!(err, CollectionError::MetricNameMismatch { .. }));
	}

	#[test]
	fn test_cluster_and_entity_lookup() {
		let collection = MetricsCollection::builder(window())
			.with_series(series("ClientConnectionCount", None))
			.unwrap()
			.with_series(series("ClientConnectionCount", Some(1)))
			.unwrap()
			.build();

		assert!(collection.cluster_series("ClientConnectionCount").is_some());
		assert_eq!(collection.entity_series("ClientConnectionCount").len(), 1);
		assert!(collection
			.series_for_entity("ClientConnectionCount", 1)
			.is_some());
		assert!(!collection.contains("CpuUser"));
		assert_eq!(collection.total_series(), 2);
	}
}
