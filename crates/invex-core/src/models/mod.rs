//! Data models: extraction records, overrides and configuration.

pub mod config;
pub mod invoice;
pub mod overrides;

pub use config::InvexConfig;
pub use invoice::{Column, ExtractionResult, InvoiceFields, ResultBatch};
pub use overrides::{OverrideEntry, Overrides};
