//! Concurrent telemetry collection
//!
//! One query is issued per (metric, entity) pair: once for cluster-level
//! metrics and once per broker id in `1..=entity_count` for entity-level ones.
//! Queries run as spawned tasks bounded by a semaphore, retry transient
//! failures with exponential backoff, and append their series to a shared
//! metric-keyed map. The merged collection is independent of completion order.

use dashmap::DashMap;
use futures::future::join_all;
use mhc_types::{
	DataPoint, MetricCatalog, MetricSeries, MetricsCollection, TelemetryError, TelemetryQuery,
	TelemetryResponse, TelemetrySource, TimeWindow,
};
use mhc_types::constants::limits::{
	DEFAULT_BASE_BACKOFF_MS, DEFAULT_MAX_CONCURRENCY, DEFAULT_MAX_RETRIES, DEFAULT_PERIOD_SECONDS,
};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

/// Exponential backoff for a single query
///
/// Attempt `n` (zero-based) that fails transiently is followed by a pause of
/// `base_delay * 2^n` before attempt `n + 1`, up to `max_attempts` attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
	/// Attempts per query, including the first one
	pub max_attempts: u32,
	pub base_delay: Duration,
}

impl Default for RetryPolicy {
	fn default() -> Self {
		Self {
			max_attempts: DEFAULT_MAX_RETRIES,
			base_delay: Duration::from_millis(DEFAULT_BASE_BACKOFF_MS),
		}
	}
}

impl RetryPolicy {
	pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
		Self {
			max_attempts,
			base_delay,
		}
	}

	/// Pause after the failed zero-based attempt `attempt`
	pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
		self.base_delay
			.saturating_mul(2u32.saturating_pow(attempt))
	}
}

/// Collector tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectorConfig {
	/// Queries allowed in flight at once
	pub max_concurrency: usize,
	/// Sampling period requested from the source
	pub period_seconds: u32,
	pub retry: RetryPolicy,
}

impl Default for CollectorConfig {
	fn default() -> Self {
		Self {
			max_concurrency: DEFAULT_MAX_CONCURRENCY,
			period_seconds: DEFAULT_PERIOD_SECONDS,
			retry: RetryPolicy::default(),
		}
	}
}

/// Result of one query after retries
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
	Series(MetricSeries),
	/// The source answered but had no usable samples
	NoData,
	/// A non-transient error, or the last error once attempts ran out
	Failed(TelemetryError),
}

/// Outcome of one query together with how it was reached
#[derive(Debug, Clone, PartialEq)]
pub struct QueryReport {
	pub outcome: QueryOutcome,
	pub attempts: u32,
	/// Pauses taken between attempts, in order
	pub backoff: Vec<Duration>,
}

/// Counters for one collection run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectionStats {
	pub attempted_queries: usize,
	pub collected_series: usize,
	pub empty_queries: usize,
	pub failed_queries: usize,
	/// Extra attempts beyond the first, across all queries
	pub retries: usize,
	pub metric_types_collected: usize,
	pub metric_types_total: usize,
}

/// A collection together with the counters of the run that produced it
#[derive(Debug, Clone)]
pub struct CollectionOutcome {
	pub collection: MetricsCollection,
	pub stats: CollectionStats,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TaskStatus {
	Collected,
	NoData,
	Failed,
}

#[derive(Debug, Clone, Copy)]
struct TaskSummary {
	status: TaskStatus,
	attempts: u32,
}

/// Retrieves every catalog metric for a cluster into a [`MetricsCollection`]
#[derive(Debug, Clone)]
pub struct TelemetryCollector {
	source: Arc<dyn TelemetrySource>,
	config: CollectorConfig,
}

impl TelemetryCollector {
	pub fn new(source: Arc<dyn TelemetrySource>, config: CollectorConfig) -> Self {
		Self { source, config }
	}

	pub fn config(&self) -> &CollectorConfig {
		&self.config
	}

	/// Collect every metric in `catalog` for `window`
	///
	/// Never fails: pairs that could not be retrieved are absent from the
	/// result, and cluster-level metrics without a series are listed as missing.
	pub async fn collect(
		&self,
		window: TimeWindow,
		cluster_name: &str,
		entity_count: u32,
		catalog: &MetricCatalog,
	) -> MetricsCollection {
		self.collect_with_stats(window, cluster_name, entity_count, catalog)
			.await
			.collection
	}

	/// Same as [`collect`](Self::collect), also returning run counters
	pub async fn collect_with_stats(
		&self,
		window: TimeWindow,
		cluster_name: &str,
		entity_count: u32,
		catalog: &MetricCatalog,
	) -> CollectionOutcome {
		info!(
			"Collecting {} metric types for cluster {} ({} brokers) from {} to {}",
			catalog.len(),
			cluster_name,
			entity_count,
			window.start,
			window.end
		);

		let semaphore = Arc::new(Semaphore::new(self.config.max_concurrency.max(1)));
		let accumulated: Arc<DashMap<String, Vec<MetricSeries>>> = Arc::new(DashMap::new());

		let mut keys: Vec<(String, Option<u32>)> = Vec::with_capacity(catalog.query_count(entity_count));
		let mut tasks = Vec::with_capacity(keys.capacity());

		for definition in catalog.iter() {
			let entities: Vec<Option<u32>> = if definition.is_cluster_level() {
				vec![None]
			} else {
				(1..=entity_count).map(Some).collect()
			};

			for entity_id in entities {
				let query = TelemetryQuery::for_metric(
					definition,
					cluster_name,
					entity_id,
					window,
					self.config.period_seconds,
				);
				keys.push((definition.name.clone(), entity_id));

				let source = Arc::clone(&self.source);
				let semaphore = Arc::clone(&semaphore);
				let accumulated = Arc::clone(&accumulated);
				let policy = self.config.retry;

				tasks.push(tokio::spawn(async move {
					let _permit = match semaphore.acquire_owned().await {
						Ok(permit) => permit,
						Err(_) => {
							warn!("Worker pool closed before querying {}", query.metric_name);
							return TaskSummary {
								status: TaskStatus::Failed,
								attempts: 0,
							};
						},
					};

					let report = query_with_retry(source.as_ref(), &query, &policy).await;
					let status = match report.outcome {
						QueryOutcome::Series(series) => {
							debug!(
								"Collected {} ({}): {} data points",
								query.metric_name,
								series.scope_label(),
								series.len()
							);
							accumulated
								.entry(query.metric_name.clone())
								.or_default()
								.push(series);
							TaskStatus::Collected
						},
						QueryOutcome::NoData => TaskStatus::NoData,
						QueryOutcome::Failed(_) => TaskStatus::Failed,
					};

					TaskSummary {
						status,
						attempts: report.attempts,
					}
				}));
			}
		}

		let results = join_all(tasks).await;

		let mut stats = CollectionStats {
			attempted_queries: keys.len(),
			metric_types_total: catalog.len(),
			..CollectionStats::default()
		};
		let mut missing = BTreeSet::new();

		for ((metric_name, entity_id), result) in keys.into_iter().zip(results) {
			let status = match result {
				Ok(summary) => {
					stats.retries += summary.attempts.saturating_sub(1) as usize;
					summary.status
				},
				Err(e) => {
					warn!("Query task for {} {:?} aborted: {}", metric_name, entity_id, e);
					TaskStatus::Failed
				},
			};

			match status {
				TaskStatus::Collected => stats.collected_series += 1,
				TaskStatus::NoData => stats.empty_queries += 1,
				TaskStatus::Failed => stats.failed_queries += 1,
			}

			// Entity-level failures only shrink that metric's set
			if entity_id.is_none() && status != TaskStatus::Collected {
				missing.insert(metric_name);
			}
		}

		let mut builder = MetricsCollection::builder(window);
		let metric_names: Vec<String> = accumulated.iter().map(|e| e.key().clone()).collect();
		for name in metric_names {
			if let Some((name, mut set)) = accumulated.remove(&name) {
				set.sort_by_key(|s| s.entity_id());
				if let Err(e) = builder.insert_set(&name, set) {
					warn!("Dropping series for {}: {}", name, e);
				}
			}
		}
		for name in missing {
			builder.mark_missing(name);
		}
		let collection = builder.build();
		stats.metric_types_collected = collection.len();

		info!(
			"Collected {}/{} metric types ({} series, {} empty, {} failed, {} retries)",
			stats.metric_types_collected,
			stats.metric_types_total,
			stats.collected_series,
			stats.empty_queries,
			stats.failed_queries,
			stats.retries
		);
		if !collection.missing().is_empty() {
			warn!(
				"Missing cluster-level metrics: {}",
				collection
					.missing()
					.iter()
					.cloned()
					.collect::<Vec<_>>()
					.join(", ")
			);
		}

		CollectionOutcome { collection, stats }
	}
}

/// Run one query, retrying transient failures with exponential backoff
///
/// The pause is local to the calling task; other queries keep running.
pub async fn query_with_retry(
	source: &dyn TelemetrySource,
	query: &TelemetryQuery,
	policy: &RetryPolicy,
) -> QueryReport {
	let max_attempts = policy.max_attempts.max(1);
	let mut backoff = Vec::new();
	let mut attempts = 0;

	loop {
		attempts += 1;
		match source.query(query).await {
			Ok(response) => {
				return QueryReport {
					outcome: into_outcome(query, response),
					attempts,
					backoff,
				};
			},
			Err(e) if e.is_transient() && attempts < max_attempts => {
				let delay = policy.delay_for_attempt(attempts - 1);
				warn!(
					"Query for {} {:?} failed (attempt {}/{}): {}; retrying in {:?}",
					query.metric_name,
					query.entity_id(),
					attempts,
					max_attempts,
					e,
					delay
				);
				tokio::time::sleep(delay).await;
				backoff.push(delay);
			},
			Err(e) => {
				warn!(
					"Giving up on {} {:?} after {} attempt(s): {}",
					query.metric_name,
					query.entity_id(),
					attempts,
					e
				);
				return QueryReport {
					outcome: QueryOutcome::Failed(e),
					attempts,
					backoff,
				};
			},
		}
	}
}

fn into_outcome(query: &TelemetryQuery, response: TelemetryResponse) -> QueryOutcome {
	let total = response.datapoints.len();
	let datapoints: Vec<DataPoint> = response
		.datapoints
		.into_iter()
		.filter(|dp| dp.value.is_finite())
		.collect();
	if datapoints.len() < total {
		debug!(
			"Dropped {} non-finite samples from {}",
			total - datapoints.len(),
			query.metric_name
		);
	}
	if datapoints.is_empty() {
		return QueryOutcome::NoData;
	}

	match MetricSeries::new(
		query.metric_name.clone(),
		query.entity_id(),
		datapoints,
		response.label,
	) {
		Ok(series) => QueryOutcome::Series(series),
		Err(e) => {
			debug!("Discarding response for {}: {}", query.metric_name, e);
			QueryOutcome::NoData
		},
	}
}
