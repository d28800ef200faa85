//! Output module for reporting crawl jobs
//!
//! This module handles:
//! - The `ResultSink` and `StatusHook` interfaces a job reports through
//! - An in-memory sink for library callers and tests
//! - Status logging and terminal summaries for the CLI

mod memory;
mod status;
mod summary;
mod traits;

pub use memory::MemorySink;
pub use status::LogStatusHook;
pub use summary::{format_summary, SummarySink};
pub use traits::{OutputError, OutputResult, ResultSink, StatusHook};
