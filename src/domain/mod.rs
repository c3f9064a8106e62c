//! Domain layer - core business logic and types.
//!
//! This layer contains pure domain models and error types
//! without any external dependencies (DB, IO, etc.).

pub mod category;
pub mod error;
pub mod models;
pub mod sync;

pub use category::{derive_categories, filter, pick_random, CategorySelector};
pub use error::{AppError, Result};
pub use models::{Quote, QuoteCollection};
pub use sync::{
    map_remote, AppConfig, RemoteRecord, SyncConfig, SyncPhase, SyncReport, SyncState,
};
