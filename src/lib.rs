pub mod blockchain;
pub mod codec;
pub mod config;
pub mod db;
pub mod models;
pub mod store;
pub mod validation;

#[cfg(test)]
pub mod tests;

// Re-export specific items for convenience
pub use blockchain::{HttpNodeClient, Indexer, NodeClient};
pub use codec::FormatError;
pub use config::Config;
pub use models::{Transaction, Transfer};
pub use store::{AddressIndexStore, Storage, StoreError};
pub use validation::{normalize_address, ValidationError};
