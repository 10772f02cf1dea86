//! Log processing for cloudscope
//!
//! This crate provides ingestion, parsing, filtering, grouping and the
//! display projection the viewer renders from.

mod error;
mod filter;
pub mod grouping;
mod ingest;
pub mod markers;
mod memo;
mod parser;
mod projection;
mod store;

pub use error::{FilterError, IngestError};
pub use filter::{CompiledFilter, FilterPresets, QuickFilterField};
pub use grouping::{group_logs, group_logs_by_invocation, group_logs_by_stream};
pub use ingest::{load_events, load_file};
pub use memo::{MemoStats, ProjectionMemo};
pub use parser::{LogParser, RawLogEvent};
pub use projection::{Projection, ProjectionInput, compute_display_items};
pub use store::{DEFAULT_CAPACITY, LevelCounts, LogStore};

// Re-export types used in our public API
pub use cloudscope_types::{
    ArcLogEvent, DisplayItem, GroupSection, GroupingMode, LogEvent, LogLevel, SectionKind,
};
