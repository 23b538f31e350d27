//! Run banner logging for the MSK health check
//!
//! Logs service information at startup, the parameters of the run and the
//! outcome of the analysis.

use crate::Settings;
use std::env;
use tracing::info;

/// Logs service information at startup
pub fn log_service_info() {
	// Use the root package name, not the current crate
	let service_name = "msk-health-check";
	let service_version = env!("CARGO_PKG_VERSION");

	info!("=== MSK Health Check Starting ===");
	info!("🚀 Service: {} v{}", service_name, service_version);

	// Log target information
	info!("💻 Platform: {}", env::consts::OS);
	info!("🏗️ Architecture: {}", env::consts::ARCH);

	if let Ok(cwd) = env::current_dir() {
		info!("📁 Working Directory: {}", cwd.display());
	}

	if let Ok(rust_log) = env::var("RUST_LOG") {
		info!("🔧 Log Level: {}", rust_log);
	}

	info!(
		"🕒 Started at: {}",
		chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
	);
}

/// Logs the cluster and collection parameters of one run
pub fn log_run_parameters(cluster_name: &str, entity_count: u32, settings: &Settings) {
	let collection = &settings.collection;
	info!("🎯 Cluster: {} ({} brokers)", cluster_name, entity_count);
	info!(
		"📅 Window: last {} days at {}s resolution",
		collection.days_back, collection.period_seconds
	);
	info!(
		"⚙️ Concurrency: {} queries, {} attempts per query",
		collection.max_concurrency, collection.max_retries
	);
	info!(
		"📋 Recommended version: {}",
		settings.analysis.recommended_version
	);
	match &settings.source.snapshot_path {
		Some(path) => info!("📂 Telemetry source: snapshot {}", path.display()),
		None => info!("📂 Telemetry source: injected"),
	}
}

/// Logs the outcome of an analysis run
pub fn log_analysis_complete(finding_count: usize, actionable_count: usize, health_score: f64) {
	info!("✅ Health check complete");
	info!(
		"📊 {} findings ({} need attention), health score: {:.1}",
		finding_count, actionable_count, health_score
	);
}
