//! traineval-store: record store backends.
//!
//! Implements the `RecordStore` trait over an in-memory dataset, a JSON
//! file, and a PostgREST (Supabase) API.

pub mod config;
pub mod dataset;
pub mod file;
pub mod memory;
pub mod rest;

pub use config::{create_store, load_config_from, StoreConfig, TrainevalConfig};
pub use dataset::Dataset;
pub use file::FileStore;
pub use memory::MemoryStore;
pub use rest::RestStore;
