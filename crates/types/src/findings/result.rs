use serde::Serialize;

use super::{Category, Finding, Severity};
use crate::cluster::ClusterDescriptor;
use crate::metrics::MetricsCollection;

/// Outcome of one analysis run
///
/// Findings are kept in rule evaluation order. The value is built once and
/// only exposes read access.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
	descriptor: ClusterDescriptor,
	collection: MetricsCollection,
	findings: Vec<Finding>,
	health_score: f64,
}

impl AnalysisResult {
	pub fn new(
		descriptor: ClusterDescriptor,
		collection: MetricsCollection,
		findings: Vec<Finding>,
		health_score: f64,
	) -> Self {
		Self {
			descriptor,
			collection,
			findings,
			health_score,
		}
	}

	pub fn descriptor(&self) -> &ClusterDescriptor {
		&self.descriptor
	}

	pub fn collection(&self) -> &MetricsCollection {
		&self.collection
	}

	pub fn findings(&self) -> &[Finding] {
		&self.findings
	}

	/// Overall score in `[0, 100]`, rounded to one decimal
	pub fn health_score(&self) -> f64 {
		self.health_score
	}

	pub fn findings_with_severity(&self, severity: Severity) -> impl Iterator<Item = &Finding> {
		self.findings.iter().filter(move |f| f.severity == severity)
	}

	pub fn findings_in_category(&self, category: Category) -> impl Iterator<Item = &Finding> {
		self.findings.iter().filter(move |f| f.category == category)
	}

	/// Findings that need attention, most severe first, stable within a severity
	pub fn actionable_findings(&self) -> Vec<&Finding> {
		let mut actionable: Vec<&Finding> =
			self.findings.iter().filter(|f| !f.is_healthy()).collect();
		actionable.sort_by_key(|f| f.severity);
		actionable
	}
}
