//! Basic cleaning step for a listings dataset.
//!
//! Reads a raw table from an artifact store, drops rows whose `price` is
//! outside an inclusive range, converts `last_review` to a date/time and
//! publishes the result as a new artifact.

pub mod artifact;
pub mod config;
pub mod data;
pub mod error;
pub mod logging;
pub mod pipeline;

pub use config::CleaningConfig;
pub use data::clean::{CleanStats, CleanedTable, PriceBounds, clean};
pub use data::model::{Row, Table, Value};
pub use error::{PipelineError, SchemaError, Stage};
