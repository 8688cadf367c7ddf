//! Log output of the haul binary. Migrations are driven by an orchestrator
//! that usually collects our stderr, so text goes there by default; `--log`
//! sends records to a file that is appended to across the source and
//! destination invocations of one migration.
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use tracing::{Level, Subscriber};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

const DEFAULT_LOG_LEVEL: Level = if cfg!(debug_assertions) {
    Level::DEBUG
} else {
    Level::INFO
};

const JOURNALD_IDENTIFIER: &str = "haul";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LogFormat {
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => bail!("unknown log format {other:?}, expected 'text' or 'json'"),
        }
    }
}

/// Logging choices taken from the global command line flags.
#[derive(Debug, Default)]
pub struct LogOptions {
    pub debug: bool,
    pub level: Option<String>,
    pub file: Option<PathBuf>,
    pub format: Option<String>,
    pub journald: bool,
}

impl From<&crate::GlobalOpts> for LogOptions {
    fn from(global: &crate::GlobalOpts) -> Self {
        Self {
            debug: global.debug,
            level: global.log_level.clone(),
            file: global.log.clone(),
            format: global.log_format.clone(),
            journald: global.systemd_log,
        }
    }
}

impl LogOptions {
    /// An explicit `--log-level` wins over `--debug`.
    fn level(&self) -> Result<Level> {
        match (&self.level, self.debug) {
            (Some(level), _) => {
                Level::from_str(level).with_context(|| format!("invalid log level {level:?}"))
            }
            (None, true) => Ok(Level::DEBUG),
            (None, false) => Ok(DEFAULT_LOG_LEVEL),
        }
    }

    fn format(&self) -> Result<LogFormat> {
        self.format
            .as_deref()
            .map_or(Ok(LogFormat::Text), LogFormat::from_str)
    }

    fn writer(&self) -> Result<BoxMakeWriter> {
        match &self.file {
            None => Ok(BoxMakeWriter::new(std::io::stderr)),
            Some(path) => {
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .with_context(|| format!("failed to open log file {path:?}"))?;
                Ok(BoxMakeWriter::new(file))
            }
        }
    }
}

fn fmt_layer<S>(
    format: LogFormat,
    writer: BoxMakeWriter,
    ansi: bool,
) -> Box<dyn Layer<S> + Send + Sync>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    match format {
        LogFormat::Text => tracing_subscriber::fmt::layer()
            .without_time()
            .with_ansi(ansi)
            .with_writer(writer)
            .boxed(),
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_span_list(false)
            .with_writer(writer)
            .boxed(),
    }
}

pub fn init(options: LogOptions) -> Result<()> {
    let level = options.level()?;
    let format = options.format()?;
    let writer = options.writer()?;

    let journald = if options.journald {
        match tracing_journald::layer() {
            Ok(layer) => Some(layer.with_syslog_identifier(JOURNALD_IDENTIFIER.to_owned())),
            Err(err) => {
                eprintln!("journald logging unavailable: {err}");
                None
            }
        }
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(LevelFilter::from_level(level))
        .with(journald)
        .with(fmt_layer(format, writer, options.file.is_none()))
        .try_init()
        .context("failed to install log subscriber")
}
