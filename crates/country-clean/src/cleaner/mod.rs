//! Cleaning stages that run before the key-column passes.
//!
//! - Column name normalization
//! - Text-to-numeric coercion of decorated values
//! - Missing-value policy

mod converters;
mod missing;
mod names;

pub use converters::ValueCoercer;
pub use missing::{FillCounts, MissingValueHandler};
pub use names::{ColumnNameNormalizer, normalize_column_name};
