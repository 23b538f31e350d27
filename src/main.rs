//! MSK Health Check
//!
//! Main entry point: runs one health check and prints the result as JSON

use msk_health_check::HealthCheckBuilder;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	// Settings, tracing and the snapshot source all come from configuration
	let result = HealthCheckBuilder::new().run_with_defaults().await?;

	println!("{}", serde_json::to_string_pretty(&result)?);
	Ok(())
}
