//! Checks on cluster configuration
//!
//! These read only the descriptor, so they run even when no telemetry was
//! collected.

use crate::analysis::{Requirement, Rule, RuleContext};
use mhc_types::{
	AuthMethod, Category, ClusterDescriptor, Finding, InstanceFamily, Severity, SoftwareVersion,
};
use tracing::warn;

/// Reported metric names for descriptor checks
pub const AUTHENTICATION: &str = "Authentication";
pub const INSTANCE_TYPE: &str = "InstanceType";
pub const KAFKA_VERSION: &str = "KafkaVersion";
pub const AVAILABILITY_ZONES: &str = "AvailabilityZones";
pub const STORAGE_AUTO_SCALING: &str = "StorageAutoScaling";
pub const LOGGING: &str = "Logging";

/// Estimated compute savings from moving to ARM instances
const GRAVITON_SAVINGS_PERCENT: u32 = 20;
/// Minor-version gap at which an upgrade becomes urgent
const VERSION_GAP_CRITICAL: i64 = 5;

#[derive(Debug, Default)]
pub struct AuthenticationRule;

impl Rule for AuthenticationRule {
	fn name(&self) -> &str {
		"authentication"
	}

	fn requirement(&self) -> Requirement {
		Requirement::Descriptor
	}

	fn evaluate(&self, ctx: &RuleContext<'_>) -> Vec<Finding> {
		let descriptor = ctx.descriptor;
		let methods: Vec<&str> = descriptor
			.authentication_methods
			.iter()
			.map(AuthMethod::as_str)
			.collect();
		let mut findings = Vec::new();

		if descriptor.has_auth_method(AuthMethod::Unauthenticated) {
			findings.push(
				Finding::new(
					AUTHENTICATION,
					Severity::Critical,
					Category::Security,
					"Unauthenticated Access Enabled",
					"Cluster allows unauthenticated access. This is a critical security risk.",
				)
				.with_evidence("methods", methods.clone()),
			);
		}

		if methods.len() == 1 {
			findings.push(
				Finding::new(
					AUTHENTICATION,
					Severity::Informational,
					Category::Security,
					"Single Authentication Method",
					"Only one authentication method enabled. Consider enabling multiple methods for flexibility.",
				)
				.with_evidence("methods", methods.clone()),
			);
		}

		if descriptor.has_auth_method(AuthMethod::SaslScram) {
			findings.push(
				Finding::new(
					AUTHENTICATION,
					Severity::Informational,
					Category::Security,
					"SASL/SCRAM Authentication",
					"SASL/SCRAM enabled. Ensure regular credential rotation practices.",
				)
				.with_evidence("methods", methods),
			);
		}

		findings
	}
}

#[derive(Debug, Default)]
pub struct InstanceFamilyRule;

impl Rule for InstanceFamilyRule {
	fn name(&self) -> &str {
		"instance_family"
	}

	fn requirement(&self) -> Requirement {
		Requirement::Descriptor
	}

	fn evaluate(&self, ctx: &RuleContext<'_>) -> Vec<Finding> {
		let instance_class = ctx.descriptor.instance_class.as_str();
		let finding = match ctx.descriptor.instance_family() {
			InstanceFamily::Intel => Finding::new(
				INSTANCE_TYPE,
				Severity::Informational,
				Category::Cost,
				"Graviton Migration Opportunity",
				format!(
					"Cluster uses Intel instances ({}). Migrating to Graviton could save ~{}% on compute costs.",
					instance_class, GRAVITON_SAVINGS_PERCENT
				),
			)
			.with_evidence("savings_percentage", GRAVITON_SAVINGS_PERCENT),
			InstanceFamily::Graviton => Finding::new(
				INSTANCE_TYPE,
				Severity::Healthy,
				Category::Cost,
				"Cost-Optimized Instance Type",
				format!(
					"Cluster uses Graviton instances ({}), which are cost-optimized.",
					instance_class
				),
			),
		};

		vec![finding.with_evidence("instance_type", instance_class)]
	}
}

/// Running broker version against the recommended `major.minor`
///
/// Unparsable versions degrade to one informational finding.
#[derive(Debug, Default)]
pub struct SoftwareVersionRule;

impl Rule for SoftwareVersionRule {
	fn name(&self) -> &str {
		"software_version"
	}

	fn requirement(&self) -> Requirement {
		Requirement::Descriptor
	}

	fn evaluate(&self, ctx: &RuleContext<'_>) -> Vec<Finding> {
		let current_version = ctx.descriptor.software_version.as_str();
		let recommended = ctx.recommended_version;

		let parsed = current_version
			.parse::<SoftwareVersion>()
			.and_then(|current| {
				recommended
					.parse::<SoftwareVersion>()
					.map(|target| (current, target))
			});

		let (current, target) = match parsed {
			Ok(versions) => versions,
			Err(e) => {
				warn!("Could not parse Kafka versions: {}", e);
				return vec![Finding::new(
					KAFKA_VERSION,
					Severity::Informational,
					Category::Reliability,
					"Kafka Version Check",
					format!(
						"Cluster running Kafka {}. AWS recommends {}.x.",
						current_version, recommended
					),
				)
				.with_evidence("current_version", current_version)
				.with_evidence("recommended_version", format!("{}.x", recommended))];
			},
		};

		let gap = current.gap_to(&target);
		let (severity, title, description) = if gap >= VERSION_GAP_CRITICAL {
			(
				Severity::Critical,
				"Kafka Version Severely Outdated",
				format!(
					"Cluster running Kafka {}. AWS recommends version {}.x for latest features and security patches.",
					current_version, target
				),
			)
		} else if gap > 0 {
			(
				Severity::Warning,
				"Kafka Version Upgrade Available",
				format!(
					"Cluster running Kafka {}. AWS recommends upgrading to {}.x for latest features and security patches.",
					current_version, target
				),
			)
		} else if gap == 0 {
			(
				Severity::Healthy,
				"Kafka Version Up-to-Date",
				format!(
					"Cluster running AWS recommended Kafka version {}.",
					current_version
				),
			)
		} else {
			(
				Severity::Informational,
				"Kafka Version Newer Than Recommended",
				format!(
					"Cluster running Kafka {}, which is newer than AWS recommended {}.x.",
					current_version, target
				),
			)
		};

		vec![
			Finding::new(KAFKA_VERSION, severity, Category::Reliability, title, description)
				.with_evidence("current_version", current_version)
				.with_evidence("recommended_version", format!("{}.x", target))
				.with_evidence("version_gap", gap),
		]
	}
}

#[derive(Debug, Default)]
pub struct AvailabilityZoneRule;

impl Rule for AvailabilityZoneRule {
	fn name(&self) -> &str {
		"availability_zones"
	}

	fn requirement(&self) -> Requirement {
		Requirement::Descriptor
	}

	fn evaluate(&self, ctx: &RuleContext<'_>) -> Vec<Finding> {
		let zones = ctx.descriptor.availability_zones;
		let finding = match zones {
			0 | 1 => Finding::new(
				AVAILABILITY_ZONES,
				Severity::Critical,
				Category::Reliability,
				"Single AZ Deployment",
				format!(
					"Cluster deployed in only {} AZ. MSK requires at least 2 AZs for high availability.",
					zones
				),
			)
			.with_threshold(2.0),
			2 => Finding::new(
				AVAILABILITY_ZONES,
				Severity::Warning,
				Category::Reliability,
				"Two AZ Deployment",
				format!(
					"Cluster deployed across {} AZs. For critical/production workloads, 3 AZs is recommended for better fault tolerance.",
					zones
				),
			)
			.with_threshold(3.0),
			_ => Finding::new(
				AVAILABILITY_ZONES,
				Severity::Healthy,
				Category::Reliability,
				"Multi-AZ Deployment",
				format!(
					"Cluster deployed across {} AZs, providing excellent fault tolerance.",
					zones
				),
			)
			.with_threshold(3.0),
		};

		vec![finding
			.with_current_value(f64::from(zones))
			.with_evidence("az_count", zones)]
	}
}

/// Skipped for clusters without provisioned storage
#[derive(Debug, Default)]
pub struct StorageAutoScalingRule;

impl Rule for StorageAutoScalingRule {
	fn name(&self) -> &str {
		"storage_auto_scaling"
	}

	fn requirement(&self) -> Requirement {
		Requirement::Descriptor
	}

	fn applies_to(&self, descriptor: &ClusterDescriptor) -> bool {
		descriptor.capacity_class.has_provisioned_storage()
	}

	fn evaluate(&self, ctx: &RuleContext<'_>) -> Vec<Finding> {
		let enabled = ctx.descriptor.storage_autoscaling_enabled;
		let finding = if enabled {
			Finding::new(
				STORAGE_AUTO_SCALING,
				Severity::Healthy,
				Category::Reliability,
				"Storage Auto-Scaling Enabled",
				"Storage auto-scaling is enabled, providing automatic capacity management.",
			)
		} else {
			Finding::new(
				STORAGE_AUTO_SCALING,
				Severity::Warning,
				Category::Reliability,
				"Storage Auto-Scaling Disabled",
				"Storage auto-scaling is not enabled. Enable it to automatically increase storage capacity and prevent disk space issues.",
			)
		};

		vec![finding.with_evidence("enabled", enabled)]
	}
}

#[derive(Debug, Default)]
pub struct LoggingRule;

impl Rule for LoggingRule {
	fn name(&self) -> &str {
		"logging"
	}

	fn requirement(&self) -> Requirement {
		Requirement::Descriptor
	}

	fn evaluate(&self, ctx: &RuleContext<'_>) -> Vec<Finding> {
		let descriptor = ctx.descriptor;
		let destinations: Vec<String> = descriptor
			.logging_destinations
			.iter()
			.map(ToString::to_string)
			.collect();

		let finding = if descriptor.logging_enabled {
			Finding::new(
				LOGGING,
				Severity::Healthy,
				Category::Security,
				"Logging Enabled",
				format!("Broker logs are being sent to: {}.", destinations.join(", ")),
			)
		} else {
			Finding::new(
				LOGGING,
				Severity::Warning,
				Category::Security,
				"Logging Disabled",
				"Broker logs are not being sent to CloudWatch, S3, or Firehose. Enable logging for production/critical environments for troubleshooting and compliance.",
			)
		};

		vec![finding.with_evidence("destinations", destinations)]
	}
}
