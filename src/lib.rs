pub mod capability;
pub mod config;
pub mod error;
pub mod input;
pub mod logging;
pub mod model;
pub mod panels;
pub mod pipeline;
pub mod report;

pub use config::EngineConfig;
pub use error::{FailureKind, InsightError};
pub use model::state::{ChatRequest, ChatResult, HistoryEntry};
pub use pipeline::executor::{InsightEngine, StreamEvent};
