pub mod client;
pub mod models;
pub mod polling;
pub mod processor;

// Re-exports for convenience
pub use client::{ClientError, HttpNodeClient, NodeClient};
pub use models::{normalize_transaction, ParseFieldError, RawBlock, RawTransaction};
pub use polling::{CycleOutcome, EngineState, Indexer, PollError};
