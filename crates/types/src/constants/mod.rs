pub mod capacity;
pub mod limits;
pub mod suppression;

pub use capacity::{CapacityTable, NetworkLimit};
pub use suppression::SuppressionThresholds;
