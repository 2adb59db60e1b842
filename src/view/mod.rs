//! Result rendering and visualization engine.
//!
//! # Module structure
//!
//! - [`kind`]: driver type code to semantic column kind
//! - [`stats`]: streaming min/max/mean/variance per numeric column
//! - [`state`]: exclusion set, scale factors, hidden columns, locks
//! - [`snapshot`]: cursor to materialized, immutable result
//! - [`render`]: widths, bar geometry, table and footer layout
//! - [`format`]: number formatting and display-width padding
//! - [`output`]: styled spans, terminal sink, log mirror

pub mod format;
pub mod kind;
pub mod output;
pub mod render;
pub mod snapshot;
pub mod state;
pub mod stats;

pub use kind::{ColumnKind, classify};
pub use output::{AnsiTerminal, BarColor, Output, Span, SpanStyle, TerminalSink};
pub use render::{BarGeometry, MAX_BAR_LEN, RenderSummary, Statistic, layout, render};
pub use snapshot::{Cell, CellValue, ColumnDescriptor, Extrema, Snapshot, materialize};
pub use state::{ExclusionSet, LockTarget, VisualizationState};
pub use stats::RunningStats;
