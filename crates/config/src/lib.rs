//! MSK Health Check Configuration
//!
//! Configuration management and startup utilities for the cluster health check.

pub mod loader;
pub mod settings;
pub mod startup_logger;

pub use loader::{load_config, load_config_from, ConfigLoadError};
pub use settings::{
	AnalysisSettings, CollectionSettings, ConfigValidationError, LogFormat, LoggingSettings,
	Settings, SourceSettings,
};
pub use startup_logger::{log_analysis_complete, log_run_parameters, log_service_info};
