//! Global limits and defaults for configuration and analysis

/// Default number of days of history to collect
pub const DEFAULT_DAYS_BACK: u32 = 30;

/// Default sampling period requested from the telemetry source, in seconds
pub const DEFAULT_PERIOD_SECONDS: u32 = 3_600; // 1h

/// Default worker-pool bound for concurrent telemetry queries
pub const DEFAULT_MAX_CONCURRENCY: usize = 10;

/// Maximum allowed worker-pool bound
pub const MAX_CONCURRENCY: usize = 256;

/// Default maximum attempts per telemetry query
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Maximum allowed attempts per telemetry query
pub const MAX_RETRIES: u32 = 10;

/// Base backoff delay in milliseconds; attempt `n` waits `base * 2^n`
pub const DEFAULT_BASE_BACKOFF_MS: u64 = 1_000; // 1s

/// Kafka version recommended when no other value is injected
pub const DEFAULT_RECOMMENDED_VERSION: &str = "3.8";

/// Bytes per megabyte used by throughput conversions
pub const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Network imbalance checks are skipped below this average per-broker throughput
pub const DEFAULT_MIN_NETWORK_MB_PER_SEC: f64 = 10.0;

/// Message-rate imbalance checks are skipped below this average rate
pub const DEFAULT_MIN_MESSAGES_PER_SEC: f64 = 100.0;

/// CPU imbalance checks are skipped when the cluster peak stays below this
pub const DEFAULT_MIN_CPU_PERCENT: f64 = 30.0;

/// Network limit used for instance classes missing from the capacity table
pub const DEFAULT_NETWORK_LIMIT_MB_PER_SEC: f64 = 10.0;

/// Per-broker partition limit for unknown instance classes
pub const DEFAULT_PARTITION_LIMIT: u32 = 1_000;

/// Per-broker connection limit for unknown instance classes
pub const DEFAULT_CONNECTION_LIMIT: u32 = 1_000;
