//! Infrastructure layer - external adapters (database, filesystem, network).
//!
//! This layer handles all I/O operations and external dependencies.

pub mod config;
pub mod local_storage;
pub mod remote;

pub use config::{ensure_config_exists, load_config};
pub use local_storage::LocalStorage;
pub use remote::{HttpRemote, RemoteSource};
