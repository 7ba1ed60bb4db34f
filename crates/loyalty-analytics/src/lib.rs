//! Analytics aggregation and report export for the loyalty platform.
//!
//! One run fetches members, agents and the tier price table, resolves the
//! cross-references between them, aggregates the current calendar month and
//! writes a multi-sheet workbook:
//!
//! fetch → resolve → filter → aggregate → assemble → write

pub mod aggregate;
pub mod assemble;
pub mod config;
pub mod constants;
pub mod error;
pub mod export;
pub mod fetch;
pub mod pipeline;
pub mod resolve;
pub mod sheet;
pub mod types;
pub mod window;

pub use error::{AssemblyError, Collection, FetchError, ReportError, WriteError};
pub use pipeline::{ReportOptions, ReportOutcome, generate_report, generate_report_at};
