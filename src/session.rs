//! Interactive session: the last result, the visualization state, and the
//! commands that change them.
//!
//! A query string is executed only when it differs from the previous one;
//! otherwise the cached snapshot is rendered again. Every state command ends
//! with such a re-render.

use std::io;

use tracing::{debug, info, warn};

use crate::command::{Command, CommandError, StatsMode};
use crate::source::QueryExecutor;
use crate::view::{
    BarGeometry, ExclusionSet, LockTarget, MAX_BAR_LEN, Output, RenderSummary, Snapshot,
    VisualizationState, materialize, render,
};

/// Whether the caller should keep reading input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct Session {
    executor: Box<dyn QueryExecutor>,
    exclusions: ExclusionSet,
    state: VisualizationState,
    snapshot: Option<Snapshot>,
    last_sql: Option<String>,
    out: Output,
}

impl Session {
    pub fn new(
        executor: Box<dyn QueryExecutor>,
        exclusions: ExclusionSet,
        state: VisualizationState,
        out: Output,
    ) -> Self {
        Self {
            executor,
            exclusions,
            state,
            snapshot: None,
            last_sql: None,
            out,
        }
    }

    pub fn state(&self) -> &VisualizationState {
        &self.state
    }

    pub fn exclusions(&self) -> &ExclusionSet {
        &self.exclusions
    }

    pub fn snapshot(&self) -> Option<&Snapshot> {
        self.snapshot.as_ref()
    }

    pub fn last_sql(&self) -> Option<&str> {
        self.last_sql.as_deref()
    }

    /// What the executor is connected to.
    pub fn source(&self) -> String {
        self.executor.describe()
    }

    /// Print a one-line message to the terminal and the log.
    pub fn notice(&mut self, message: &str) -> io::Result<()> {
        self.out.println(message)?;
        self.out.flush()
    }

    /// Parse and apply one input line.
    ///
    /// A malformed command prints one error line and re-renders the last
    /// result unchanged.
    pub fn handle_line(&mut self, line: &str) -> io::Result<Flow> {
        match Command::parse(line) {
            Ok(Some(command)) => self.apply(command),
            Ok(None) => Ok(Flow::Continue),
            Err(err) => {
                self.report(&err)?;
                self.rerender(false)?;
                Ok(Flow::Continue)
            }
        }
    }

    pub fn apply(&mut self, command: Command) -> io::Result<Flow> {
        debug!(?command, "applying command");
        match command {
            Command::Comment(text) => self.comment(&text)?,
            Command::Query(sql) => self.query(&sql, false)?,
            Command::Scale { column, factor } => self.set_scale(column.as_deref(), factor)?,
            Command::Lock(Some(target)) => self.lock(target)?,
            Command::Unlock(Some(target)) => self.unlock(target)?,
            Command::Lock(None) | Command::Unlock(None) => {}
            Command::Hide(names) => self.hide(&names)?,
            Command::Unhide(names) => self.unhide(&names)?,
            Command::UnhideAll => self.unhide_all()?,
            Command::Stats(mode) => self.stats(mode)?,
            Command::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    /// Execute `sql` if it is new, then render.
    ///
    /// A failing query prints its message and leaves the previous result,
    /// `last_sql` and all visualization state untouched.
    pub fn query(&mut self, sql: &str, show_stats: bool) -> io::Result<()> {
        let sql = sql.trim();
        if sql.is_empty() {
            return Ok(());
        }
        if self.last_sql.as_deref() != Some(sql) {
            self.out.log_line(sql)?;
            info!(sql, "executing query");
            let result = self.executor.execute(sql).and_then(|mut cursor| {
                materialize(cursor.as_mut(), &mut self.exclusions, &mut self.state)
            });
            match result {
                Ok(snapshot) => {
                    info!(rows = snapshot.row_count(), "query materialized");
                    self.snapshot = Some(snapshot);
                    self.last_sql = Some(sql.to_string());
                }
                Err(err) => {
                    warn!(sql, error = %err, "query failed");
                    return self.notice(&err.to_string());
                }
            }
        }
        self.rerender(show_stats).map(|_| ())
    }

    /// Render the cached result; no-op before the first successful query.
    pub fn rerender(&mut self, show_stats: bool) -> io::Result<Option<RenderSummary>> {
        let Some(snapshot) = self.snapshot.as_ref() else {
            return Ok(None);
        };
        let show_stats = show_stats || self.state.stats_on();
        render(snapshot, &self.state, show_stats, &mut self.out).map(Some)
    }

    /// Log a `//` comment with a dash rule under it.
    pub fn comment(&mut self, text: &str) -> io::Result<()> {
        self.out.log_line(text)?;
        self.out.log_line(&"-".repeat(text.chars().count()))?;
        self.out.log_line("")?;
        self.out.flush()
    }

    /// Apply a scale factor to one column or to all of them.
    ///
    /// A factor that would draw a bar longer than [`MAX_BAR_LEN`] for the
    /// current result is refused without changing anything.
    pub fn set_scale(&mut self, column: Option<&str>, factor: f64) -> io::Result<()> {
        if !self.scale_fits(column, factor) {
            self.notice(&format!(
                "Scale factor {factor} is too large: bars would exceed {MAX_BAR_LEN} characters"
            ))?;
            return self.rerender(false).map(|_| ());
        }
        match column {
            None => self.state.set_scale_all(factor),
            Some(name) => {
                if !self.state.set_scale(name, factor) {
                    self.notice(&format!("Column {name} cannot be scaled"))?;
                }
            }
        }
        self.rerender(false).map(|_| ())
    }

    pub fn hide(&mut self, names: &[String]) -> io::Result<()> {
        for name in names {
            if self.is_known_column(name) {
                self.state.hide(name);
            } else {
                self.notice(&format!("No such column: {name}"))?;
            }
        }
        self.rerender(false).map(|_| ())
    }

    pub fn unhide(&mut self, names: &[String]) -> io::Result<()> {
        for name in names {
            self.state.unhide(name);
        }
        self.rerender(false).map(|_| ())
    }

    pub fn unhide_all(&mut self) -> io::Result<()> {
        self.state.unhide_all();
        self.rerender(false).map(|_| ())
    }

    pub fn lock(&mut self, target: LockTarget) -> io::Result<()> {
        self.state.lock(target);
        let message = match target {
            LockTarget::Scale => {
                "Scale is locked. It will remain the same across query changes until the column names change (or use \"unlock scale\")"
            }
            LockTarget::Hidden => {
                "Hidden columns are locked. They will stay hidden across query changes until the column names change (or use \"unlock hidden\")"
            }
        };
        self.out.println(message)?;
        self.out.println("")?;
        self.rerender(false).map(|_| ())
    }

    pub fn unlock(&mut self, target: LockTarget) -> io::Result<()> {
        self.state.unlock(target);
        let message = match target {
            LockTarget::Scale => "Scale is unlocked",
            LockTarget::Hidden => "Hidden columns are unlocked",
        };
        self.out.println(message)?;
        self.out.println("")?;
        self.rerender(false).map(|_| ())
    }

    pub fn stats(&mut self, mode: StatsMode) -> io::Result<()> {
        let show = match mode {
            StatsMode::Once => true,
            StatsMode::On => {
                self.state.set_stats_on(true);
                true
            }
            StatsMode::Off => {
                self.state.set_stats_on(false);
                false
            }
        };
        self.rerender(show).map(|_| ())
    }

    /// Flush both sinks.
    pub fn shutdown(&mut self) -> io::Result<()> {
        debug!("session shutting down");
        self.out.flush()
    }

    fn report(&mut self, err: &CommandError) -> io::Result<()> {
        debug!(error = %err, "rejected command");
        self.notice(&err.to_string())
    }

    fn scale_fits(&self, column: Option<&str>, factor: f64) -> bool {
        let Some(snapshot) = &self.snapshot else {
            return true;
        };
        match column {
            Some(name) => snapshot
                .column_index(name)
                .is_none_or(|idx| BarGeometry::fits(snapshot, idx, factor)),
            None => (0..snapshot.columns().len()).all(|idx| BarGeometry::fits(snapshot, idx, factor)),
        }
    }

    fn is_known_column(&self, name: &str) -> bool {
        match &self.snapshot {
            Some(snapshot) => snapshot.column_index(name).is_some(),
            None => true,
        }
    }
}
