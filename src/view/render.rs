//! Table layout and bar geometry.
//!
//! [`layout`] turns a [`Snapshot`] plus the current [`VisualizationState`]
//! into styled spans; [`render`] writes them through an [`Output`]. Nothing
//! here mutates the snapshot, so toggling statistics or hiding a column is a
//! pure re-layout.

use std::io;

use tracing::debug;

use super::format::{display_width, format_int, format_real, format_scale, pad_right};
use super::kind::ColumnKind;
use super::output::{BarColor, Output, Span, SpanStyle};
use super::snapshot::{ColumnDescriptor, Snapshot};
use super::state::VisualizationState;
use super::stats::RunningStats;

/// Notice printed instead of a table for an empty result.
pub const EMPTY_RESULT: &str = "\n(0 rows)\n\n";

/// Longest bar drawn, in character cells. Longer bars are clamped.
pub const MAX_BAR_LEN: i64 = 1_000;

/// Statistic rows, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Statistic {
    Min,
    Max,
    Mean,
    StdDev,
    Variance,
    PopulationVariance,
}

impl Statistic {
    pub const ALL: [Statistic; 6] = [
        Self::Min,
        Self::Max,
        Self::Mean,
        Self::StdDev,
        Self::Variance,
        Self::PopulationVariance,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Min => "Min.",
            Self::Max => "Max.",
            Self::Mean => "Mean",
            Self::StdDev => "StDev.",
            Self::Variance => "Var.",
            Self::PopulationVariance => "P.Var.",
        }
    }

    /// Formatted value; min and max of integer columns stay integers.
    pub fn format(self, stats: &RunningStats, kind: ColumnKind) -> String {
        let value = match self {
            Self::Min => stats.min(),
            Self::Max => stats.max(),
            Self::Mean => stats.mean(),
            Self::StdDev => stats.stddev(),
            Self::Variance => stats.variance(),
            Self::PopulationVariance => stats.population_variance(),
        };
        match (self, kind) {
            (Self::Min | Self::Max, ColumnKind::Integer) => format_int(value as i64),
            _ => format_real(value),
        }
    }
}

/// Bar geometry of one visualized column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarGeometry {
    pub interval: f64,
    pub scale: f64,
    /// Subtracted from every bar so the smallest value draws at most `scale`.
    pub correction: i64,
    pub min_len: i64,
    pub max_len: i64,
}

impl BarGeometry {
    /// Geometry for column `idx`, or `None` when it draws no bar (excluded,
    /// no rows, or every value equal).
    pub fn for_column(snapshot: &Snapshot, idx: usize, scale: f64) -> Option<Self> {
        if !snapshot.columns()[idx].is_visualized() {
            return None;
        }
        let interval = snapshot.interval(idx)?;
        if !(interval.is_finite() && interval > 0.0) {
            return None;
        }
        let (min, max) = snapshot.extrema(idx).bounds()?;

        let min_len = raw_len(min, interval, scale);
        let correction = if min_len as f64 > scale {
            min_len - scale.floor() as i64
        } else {
            0
        };
        Some(Self {
            interval,
            scale,
            correction,
            min_len,
            max_len: raw_len(max, interval, scale) - correction,
        })
    }

    /// Bar length for a value of the given magnitude; may be zero or negative.
    pub fn bar_len(&self, magnitude: f64) -> i64 {
        raw_len(magnitude, self.interval, self.scale) - self.correction
    }

    /// Whether column `idx` at `scale` keeps its longest bar within
    /// [`MAX_BAR_LEN`]. Columns without bars always fit.
    pub fn fits(snapshot: &Snapshot, idx: usize, scale: f64) -> bool {
        let Some(geo) = Self::for_column(snapshot, idx, 1.0) else {
            return true;
        };
        let Some((_, max)) = snapshot.extrema(idx).bounds() else {
            return true;
        };
        (max / geo.interval * scale).round() <= MAX_BAR_LEN as f64
    }
}

fn raw_len(magnitude: f64, interval: f64, scale: f64) -> i64 {
    let len = (magnitude / interval * scale).round();
    len.clamp(-(MAX_BAR_LEN as f64), MAX_BAR_LEN as f64) as i64
}

/// Facts about one render, for logging and tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderSummary {
    pub rows: usize,
    pub visible_columns: usize,
    pub total_width: usize,
}

/// Accumulates spans, merging neighbours that share a style.
#[derive(Default)]
struct SpanBuf {
    spans: Vec<Span>,
}

impl SpanBuf {
    fn push(&mut self, text: &str, style: Option<SpanStyle>) {
        if text.is_empty() {
            return;
        }
        match self.spans.last_mut() {
            Some(last) if last.style == style => last.text.push_str(text),
            _ => self.spans.push(Span {
                text: text.to_string(),
                style,
            }),
        }
    }

    fn plain(&mut self, text: &str) {
        self.push(text, None);
    }
}

/// Lay out the table as styled spans.
pub fn layout(
    snapshot: &Snapshot,
    state: &VisualizationState,
    show_stats: bool,
) -> (Vec<Span>, RenderSummary) {
    if snapshot.is_empty() {
        return (vec![Span::plain(EMPTY_RESULT)], RenderSummary::default());
    }

    let columns = snapshot.columns();
    let visible: Vec<usize> = (0..columns.len())
        .filter(|&c| !state.is_hidden(&columns[c].name))
        .collect();

    let geometry: Vec<Option<BarGeometry>> = columns
        .iter()
        .enumerate()
        .map(|(c, col)| BarGeometry::for_column(snapshot, c, state.scale_of(&col.name)))
        .collect();

    let stats_block = show_stats.then(|| statistics_block(snapshot));

    let widths: Vec<usize> = (0..columns.len())
        .map(|c| {
            let mut width = snapshot.data_width(c);
            if let Some(block) = &stats_block {
                for row in block {
                    if let Some(text) = &row[c] {
                        width = width.max(display_width(text));
                    }
                }
            }
            if let Some(geo) = &geometry[c] {
                width = width.max(geo.max_len.max(0) as usize);
            }
            width
        })
        .collect();

    let total_width = visible.iter().map(|&c| widths[c]).sum::<usize>() + visible.len() + 1;
    let rule = format!("{}\n", "-".repeat(total_width));

    let mut buf = SpanBuf::default();
    buf.plain("\n");
    buf.plain(&rule);

    buf.plain("|");
    for &c in &visible {
        buf.plain(&pad_right(&columns[c].name, widths[c]));
        buf.plain("|");
    }
    buf.plain("\n");
    buf.plain(&rule);

    for row in snapshot.rows() {
        buf.plain("|");
        let mut bar_index = 0;
        for &c in &visible {
            let cell = &row[c];
            match (&geometry[c], cell.value.magnitude()) {
                (Some(geo), Some(magnitude)) => {
                    let color = BarColor::nth(bar_index);
                    bar_index += 1;
                    push_bar_cell(&mut buf, &cell.display, geo.bar_len(magnitude), widths[c], color);
                }
                _ => {
                    if columns[c].is_visualized() {
                        bar_index += 1;
                    }
                    buf.plain(&pad_right(&cell.display, widths[c]));
                }
            }
            buf.plain("|");
        }
        buf.plain("\n");
    }
    buf.plain(&rule);

    buf.plain("|");
    for &c in &visible {
        let text = if columns[c].excluded {
            " ".to_string()
        } else {
            format_scale(state.scale_of(&columns[c].name))
        };
        buf.plain(&pad_right(&text, widths[c]));
        buf.plain("|");
    }
    buf.plain(" Scale\n");
    buf.plain(&rule);

    if let Some(block) = &stats_block {
        for (stat, row) in Statistic::ALL.iter().zip(block) {
            buf.plain("|");
            for &c in &visible {
                let text = row[c].as_deref().unwrap_or(" ");
                buf.plain(&pad_right(text, widths[c]));
                buf.plain("|");
            }
            buf.plain(&format!(" {}\n", stat.label()));
        }
        buf.plain(&rule);
    }

    buf.push(&footer(snapshot.row_count(), state), Some(SpanStyle::Status));
    buf.plain("\n\n");

    let summary = RenderSummary {
        rows: snapshot.row_count(),
        visible_columns: visible.len(),
        total_width,
    };
    (buf.spans, summary)
}

/// Lay out and write the table, then flush both sinks.
pub fn render(
    snapshot: &Snapshot,
    state: &VisualizationState,
    show_stats: bool,
    out: &mut Output,
) -> io::Result<RenderSummary> {
    let (spans, summary) = layout(snapshot, state, show_stats);
    out.spans(&spans)?;
    out.flush()?;
    debug!(
        rows = summary.rows,
        columns = summary.visible_columns,
        width = summary.total_width,
        show_stats,
        "rendered result"
    );
    Ok(summary)
}

/// Highlight the first `bar_len` cells of `text`, extending with highlighted
/// blanks past its end, then pad to `width`.
fn push_bar_cell(buf: &mut SpanBuf, text: &str, bar_len: i64, width: usize, color: BarColor) {
    let style = Some(SpanStyle::Bar(color));
    let text_len = text.chars().count();
    let bar = bar_len.max(0) as usize;

    let split = text
        .char_indices()
        .nth(bar)
        .map(|(pos, _)| pos)
        .unwrap_or(text.len());
    buf.push(&text[..split], style);
    buf.plain(&text[split..]);
    if bar > text_len {
        buf.push(&" ".repeat(bar - text_len), style);
    }
    buf.plain(&" ".repeat(width.saturating_sub(bar.max(text_len))));
}

/// `[statistic][column]` formatted values; `None` for columns without stats.
fn statistics_block(snapshot: &Snapshot) -> Vec<Vec<Option<String>>> {
    Statistic::ALL
        .iter()
        .map(|stat| {
            snapshot
                .columns()
                .iter()
                .enumerate()
                .map(|(c, col): (usize, &ColumnDescriptor)| {
                    snapshot
                        .stats(c)
                        .filter(|s| !s.is_empty())
                        .map(|s| stat.format(s, col.kind))
                })
                .collect()
        })
        .collect()
}

/// Status line: row count, locks, stats mode, hidden columns.
pub fn footer(rows: usize, state: &VisualizationState) -> String {
    let mut parts = vec![if rows == 1 {
        "(1 row)".to_string()
    } else {
        format!("({rows} rows)")
    }];
    if state.scale_locked() {
        parts.push("Scale Locked".to_string());
    }
    parts.push(if state.stats_on() { "Stats On" } else { "Stats Off" }.to_string());
    if state.hidden_locked() {
        parts.push("Hidden Locked".to_string());
    }
    if state.hidden_count() > 0 {
        let names: Vec<&str> = state.hidden().collect();
        parts.push(format!("Hidden Column(s): [{}]", names.join(", ")));
    }
    parts.join(" | ")
}
