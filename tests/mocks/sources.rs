//! Scripted collaborators with call tracking

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use msk_health_check::async_trait::async_trait;
use msk_health_check::models::{DescriptorResult, TelemetryResult};
use msk_health_check::{
	ClusterDescriptor, ClusterDescriptorProvider, DescriptorError, TelemetryError,
	TelemetryQuery, TelemetryResponse, TelemetrySource,
};

use super::fixtures::Fixtures;

type Key = (String, Option<u32>);

fn key(metric: &str, entity: Option<u32>) -> Key {
	(metric.to_string(), entity)
}

/// Telemetry source answering from a script
///
/// Each (metric, entity) pair may carry a queue of errors returned before its
/// response, or a permanent error returned on every call. Pairs without a
/// response answer with an empty result.
#[derive(Debug, Default)]
pub struct ScriptedTelemetrySource {
	responses: HashMap<Key, TelemetryResponse>,
	scripted_failures: Mutex<HashMap<Key, VecDeque<TelemetryError>>>,
	permanent_failures: HashMap<Key, TelemetryError>,
	calls: Mutex<HashMap<Key, usize>>,
	total_calls: AtomicUsize,
	in_flight: AtomicUsize,
	max_in_flight: AtomicUsize,
	delay: Option<Duration>,
}

impl ScriptedTelemetrySource {
	pub fn new() -> Self {
		Self::default()
	}

	/// Answer `metric` for `entity` with hourly samples
	pub fn with_series(mut self, metric: &str, entity: Option<u32>, values: &[f64]) -> Self {
		self.responses
			.insert(key(metric, entity), Fixtures::response(values));
		self
	}

	pub fn with_response(
		mut self,
		metric: &str,
		entity: Option<u32>,
		response: TelemetryResponse,
	) -> Self {
		self.responses.insert(key(metric, entity), response);
		self
	}

	/// Return `errors` in order before the scripted response
	pub fn failing_first(
		self,
		metric: &str,
		entity: Option<u32>,
		errors: Vec<TelemetryError>,
	) -> Self {
		if let Ok(mut failures) = self.scripted_failures.lock() {
			failures.insert(key(metric, entity), errors.into());
		}
		self
	}

	/// Fail every call for the pair with `error`
	pub fn always_failing(mut self, metric: &str, entity: Option<u32>, error: TelemetryError) -> Self {
		self.permanent_failures.insert(key(metric, entity), error);
		self
	}

	/// Hold every query for `delay` before answering
	pub fn with_delay(mut self, delay: Duration) -> Self {
		self.delay = Some(delay);
		self
	}

	pub fn calls_for(&self, metric: &str, entity: Option<u32>) -> usize {
		self.calls
			.lock()
			.map(|calls| calls.get(&key(metric, entity)).copied().unwrap_or(0))
			.unwrap_or(0)
	}

	pub fn total_calls(&self) -> usize {
		self.total_calls.load(Ordering::SeqCst)
	}

	/// Highest number of queries observed in flight at once
	pub fn max_in_flight(&self) -> usize {
		self.max_in_flight.load(Ordering::SeqCst)
	}

	fn answer(&self, pair: &Key) -> TelemetryResult<TelemetryResponse> {
		if let Some(error) = self.permanent_failures.get(pair) {
			return Err(error.clone());
		}
		let scripted = self
			.scripted_failures
			.lock()
			.ok()
			.and_then(|mut failures| failures.get_mut(pair).and_then(VecDeque::pop_front));
		if let Some(error) = scripted {
			return Err(error);
		}
		Ok(self
			.responses
			.get(pair)
			.cloned()
			.unwrap_or_else(TelemetryResponse::empty))
	}
}

#[async_trait]
impl TelemetrySource for ScriptedTelemetrySource {
	async fn query(&self, query: &TelemetryQuery) -> TelemetryResult<TelemetryResponse> {
		let pair = key(&query.metric_name, query.entity_id());
		self.total_calls.fetch_add(1, Ordering::SeqCst);
		if let Ok(mut calls) = self.calls.lock() {
			*calls.entry(pair.clone()).or_insert(0) += 1;
		}

		let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
		self.max_in_flight.fetch_max(current, Ordering::SeqCst);

		if let Some(delay) = self.delay {
			tokio::time::sleep(delay).await;
		}
		let result = self.answer(&pair);

		self.in_flight.fetch_sub(1, Ordering::SeqCst);
		result
	}
}

/// Descriptor provider returning a fixed descriptor or a serverless rejection
#[derive(Debug)]
pub struct FixedDescriptorProvider {
	descriptor: ClusterDescriptor,
	serverless: bool,
	pub calls: AtomicUsize,
}

impl FixedDescriptorProvider {
	pub fn new(descriptor: ClusterDescriptor) -> Self {
		Self {
			descriptor,
			serverless: false,
			calls: AtomicUsize::new(0),
		}
	}

	pub fn serverless(descriptor: ClusterDescriptor) -> Self {
		Self {
			serverless: true,
			..Self::new(descriptor)
		}
	}
}

#[async_trait]
impl ClusterDescriptorProvider for FixedDescriptorProvider {
	async fn describe_cluster(&self) -> DescriptorResult<ClusterDescriptor> {
		self.calls.fetch_add(1, Ordering::SeqCst);
		if self.serverless {
			return Err(DescriptorError::UnsupportedServerless {
				cluster: self.descriptor.cluster_name.clone(),
			});
		}
		Ok(self.descriptor.clone())
	}
}
