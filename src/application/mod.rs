//! Application layer - use cases and orchestration.
//!
//! This layer contains the quote store, the remote sync cycle and
//! output formatting.

pub mod formatter;
pub mod quote_store;
pub mod sync_service;

pub use formatter::{
    format_categories, format_quote, format_quotes, format_sync_report, format_sync_state,
    OutputFormat,
};
pub use quote_store::QuoteStore;
pub use sync_service::{CycleOutcome, SyncService};
