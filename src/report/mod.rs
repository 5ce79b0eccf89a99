//! Reporting utilities: input tables, risk summaries and attribution tables.

pub mod format;

pub use format::*;
