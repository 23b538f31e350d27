//! Centralized mocks and fixtures for testing
//!
//! Scripted telemetry sources and descriptor providers plus fixture builders
//! shared by the integration tests.
#![allow(dead_code)]

pub mod fixtures;
pub mod sources;

// Re-export commonly used items for convenience
#[allow(unused_imports)]
pub use fixtures::Fixtures;
#[allow(unused_imports)]
pub use sources::{FixedDescriptorProvider, ScriptedTelemetrySource};
