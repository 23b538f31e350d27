//! Metric series, collections and the catalog of metrics to retrieve
//!
//! The collector turns catalog entries into queries, reduces each response to a
//! [`MetricSeries`] and groups the results in a [`MetricsCollection`] that the
//! analysis engine reads from.

pub mod catalog;
pub mod collection;
pub mod series;

pub use catalog::{names, MetricCatalog, MetricDefinition, MetricLevel, Statistic, DEFAULT_NAMESPACE};
pub use collection::{CollectionError, MetricsCollection, MetricsCollectionBuilder, TimeWindow};
pub use series::{percentile, DataPoint, MetricSeries, SeriesError, SeriesStatistics};
