// Core modules
pub mod config;
pub mod engine;
pub mod error;
pub mod execution;
pub mod indicators;
pub mod models;
pub mod persistence;
pub mod strategy;
pub mod summary;

// Re-export commonly used types
pub use engine::{BarReport, Engine};
pub use error::{EngineError, ExecutionError};
pub use models::*;
pub use summary::DailySummary;

// Error handling
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;
