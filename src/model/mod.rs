pub mod artifacts;
pub mod flags;
pub mod intent;
pub mod metrics;
pub mod state;
pub mod stats;
pub mod thresholds;
