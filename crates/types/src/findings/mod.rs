//! Findings produced by rule evaluation

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub mod result;

pub use result::AnalysisResult;

/// Free-form audit trail attached to a finding
pub type Evidence = BTreeMap<String, serde_json::Value>;

/// How serious a finding is
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
	Critical,
	Warning,
	Informational,
	Healthy,
}

impl Severity {
	/// Multiplicative discount applied to a category score per finding
	pub fn discount_factor(&self) -> f64 {
		match self {
			Severity::Critical => 0.60,
			Severity::Warning => 0.85,
			Severity::Informational => 0.95,
			Severity::Healthy => 1.0,
		}
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			Severity::Critical => "critical",
			Severity::Warning => "warning",
			Severity::Informational => "informational",
			Severity::Healthy => "healthy",
		}
	}
}

impl std::fmt::Display for Severity {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Area of concern a finding contributes to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Category {
	Reliability,
	Performance,
	Security,
	Cost,
}

impl Category {
	pub const ALL: [Category; 4] = [
		Category::Reliability,
		Category::Performance,
		Category::Security,
		Category::Cost,
	];

	/// Share of the overall health score; the four weights sum to 1.0
	pub fn weight(&self) -> f64 {
		match self {
			Category::Reliability => 0.35,
			Category::Performance => 0.30,
			Category::Security => 0.20,
			Category::Cost => 0.15,
		}
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			Category::Reliability => "reliability",
			Category::Performance => "performance",
			Category::Security => "security",
			Category::Cost => "cost",
		}
	}
}

impl std::fmt::Display for Category {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

/// One evidence-backed observation about the cluster
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Finding {
	pub metric_name: String,
	pub severity: Severity,
	pub category: Category,
	pub title: String,
	pub description: String,
	pub current_value: Option<f64>,
	pub threshold_value: Option<f64>,
	pub evidence: Evidence,
}

impl Finding {
	pub fn new(
		metric_name: impl Into<String>,
		severity: Severity,
		category: Category,
		title: impl Into<String>,
		description: impl Into<String>,
	) -> Self {
		Self {
			metric_name: metric_name.into(),
			severity,
			category,
			title: title.into(),
			description: description.into(),
			current_value: None,
			threshold_value: None,
			evidence: Evidence::new(),
		}
	}

	pub fn with_current_value(mut self, value: f64) -> Self {
		self.current_value = Some(value);
		self
	}

	pub fn with_threshold(mut self, value: f64) -> Self {
		self.threshold_value = Some(value);
		self
	}

	/// Add one evidence entry; later entries with the same key replace earlier ones
	pub fn with_evidence(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
		self.evidence.insert(key.to_string(), value.into());
		self
	}

	pub fn is_healthy(&self) -> bool {
		self.severity == Severity::Healthy
	}
}
