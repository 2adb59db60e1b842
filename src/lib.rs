//! sqlvis: a terminal viewer for SQL results.
//!
//! Query output is drawn as an aligned table in which every numeric column
//! carries an inline proportional bar. Statistics, per-column scaling,
//! hidden columns and locks are driven by short commands typed between
//! queries.
//!
//! - [`source`]: query executor interface and the SQLite backend
//! - [`view`]: classification, statistics, materialization, rendering
//! - [`session`]: last result, visualization state, command handling
//! - [`command`]: input line parsing
//! - [`repl`]: the read loop
//! - [`config`] / [`logging`]: ambient setup

pub mod command;
pub mod config;
pub mod logging;
pub mod repl;
pub mod session;
pub mod source;
pub mod view;

use std::fs::OpenOptions;
use std::io::{self, BufWriter};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use crate::config::ViewerConfig;
use crate::session::{Flow, Session};
use crate::source::{QueryExecutor, SqliteExecutor};
use crate::view::{AnsiTerminal, ExclusionSet, Output, VisualizationState};

/// Command-line arguments.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "sqlvis",
    version,
    about = "Render SQL query results as tables with inline bars and statistics"
)]
pub struct Cli {
    /// SQLite database file (defaults to the config value, else in-memory)
    #[arg(long, env = "SQLVIS_DB")]
    pub db: Option<PathBuf>,

    /// Config file (defaults to ./sqlvis.toml, then the user config dir)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Append the session transcript to this file
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Columns never visualized; repeatable or comma-separated
    #[arg(long, value_name = "COLUMN")]
    pub exclude: Vec<String>,

    /// Show statistics on every render
    #[arg(long)]
    pub stats: bool,

    /// Disable colours
    #[arg(long)]
    pub no_color: bool,

    /// Run these commands, then exit unless --interactive is given
    #[arg(short = 'e', long = "execute", value_name = "COMMAND")]
    pub execute: Vec<String>,

    /// Keep reading commands after --execute
    #[arg(short, long)]
    pub interactive: bool,

    /// Write diagnostics to this file instead of stderr
    #[arg(long)]
    pub trace_file: Option<PathBuf>,
}

impl Cli {
    /// Fold command-line overrides into the loaded configuration.
    pub fn apply_overrides(&self, config: &mut ViewerConfig) {
        if let Some(db) = &self.db {
            config.database = Some(db.clone());
        }
        if let Some(log) = &self.log_file {
            config.log_file = log.clone();
        }
        config.add_excludes(self.exclude.as_slice());
        if self.stats {
            config.stats_on = true;
        }
        if self.no_color {
            config.color = false;
        }
    }
}

/// Open the executor named by the configuration.
pub fn open_executor(config: &ViewerConfig) -> Result<Box<dyn QueryExecutor>> {
    let executor = match &config.database {
        Some(path) => SqliteExecutor::open(path)?,
        None => SqliteExecutor::open_in_memory()?,
    };
    Ok(Box::new(executor))
}

/// Open the transcript file for appending. Failure here is fatal.
pub fn open_log(config: &ViewerConfig) -> Result<Box<dyn io::Write>> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_file)
        .with_context(|| format!("opening query log {}", config.log_file.display()))?;
    Ok(Box::new(BufWriter::new(file)))
}

/// Build a session from configuration.
pub fn build_session(config: &ViewerConfig) -> Result<Session> {
    let log = open_log(config)?;
    let colors = config.color && console::colors_enabled();
    let out = Output::new(Box::new(AnsiTerminal::stdout(colors)), log);
    let executor = open_executor(config)?;
    Ok(Session::new(
        executor,
        ExclusionSet::new(&config.exclude),
        VisualizationState::new(config.stats_on),
        out,
    ))
}

/// Entry point used by the binary.
pub fn run(cli: Cli) -> Result<()> {
    let _guard = logging::init(cli.trace_file.as_deref())?;

    let (mut config, origin) = ViewerConfig::load(cli.config.as_deref())?;
    cli.apply_overrides(&mut config);
    config.validate()?;
    info!(?origin, ?config, "configuration resolved");

    let mut session = build_session(&config)?;

    if !cli.execute.is_empty() {
        let flow = repl::run_commands(&mut session, cli.execute.as_slice());
        let flow = match flow {
            Ok(flow) => flow,
            Err(err) => {
                session.shutdown().ok();
                return Err(err).context("writing output");
            }
        };
        if flow == Flow::Quit || !cli.interactive {
            session.shutdown().context("flushing output")?;
            return Ok(());
        }
    }

    let attended = console::user_attended();
    if attended {
        println!("Connected to {}", session.source());
    }
    let stdin = io::stdin();
    repl::run(
        &mut session,
        stdin.lock(),
        attended.then_some("sqlvis> "),
    )
    .context("flushing output")
}
