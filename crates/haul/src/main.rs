//! # haul
//! Moves a running container to another host. Each subcommand runs one
//! step of the source or destination lifecycle and prints its result as
//! JSON, so a migration orchestrator can drive the driver from a shell.
mod commands;
mod observability;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use libhaul::driver::DriverKind;
use libhaul::host::HostType;

#[derive(Parser, Debug)]
#[clap(version, author = env!("CARGO_PKG_AUTHORS"))]
struct Opts {
    #[clap(flatten)]
    global: GlobalOpts,

    #[clap(subcommand)]
    subcmd: SubCommand,
}

#[derive(Parser, Debug)]
struct GlobalOpts {
    /// set the log file to write haul logs to (default is '/dev/stderr')
    #[clap(short, long, overrides_with("log"))]
    log: Option<PathBuf>,
    /// change log level to debug, but the `log-level` flag takes precedence
    #[clap(long)]
    debug: bool,
    /// set the log level (default is 'debug' in debug builds, 'info' otherwise)
    #[clap(long)]
    log_level: Option<String>,
    /// set the log format ('text' (default), or 'json') (default: "text")
    #[clap(long)]
    log_format: Option<String>,
    /// also send logs to journald
    #[clap(long)]
    systemd_log: bool,
    /// JSON file overriding the runtime layout and diagnostic log paths
    #[clap(short, long)]
    config: Option<PathBuf>,
    /// container type of the migrated container
    #[clap(long = "type", default_value = "docker")]
    kind: DriverKind,
}

#[derive(Parser, Debug)]
enum SubCommand {
    Resolve(commands::resolve::Resolve),
    Fs(commands::fs::Fs),
    MetaImages(commands::meta_images::MetaImages),
    Dump(commands::dump::Dump),
    Restore(commands::restore::Restore),
}

fn main() -> Result<()> {
    let opts = Opts::parse();

    if let Err(err) = observability::init(observability::LogOptions::from(&opts.global)) {
        eprintln!("log init failed: {err:?}");
    }

    tracing::debug!(args = ?std::env::args_os().collect::<Vec<_>>(), "started");
    let config = commands::load_config(opts.global.config.as_deref())?;
    let driver_opts = commands::DriverOpts {
        kind: opts.global.kind,
        config,
        host: HostType::Linux,
    };

    match opts.subcmd {
        SubCommand::Resolve(args) => {
            commands::print(&commands::resolve::resolve(args, driver_opts)?)
        }
        SubCommand::Fs(args) => commands::print(&commands::fs::fs(args, driver_opts)?),
        SubCommand::MetaImages(args) => {
            commands::print(&commands::meta_images::meta_images(args, driver_opts)?)
        }
        SubCommand::Dump(args) => commands::print(&commands::dump::dump(args, driver_opts)?),
        SubCommand::Restore(args) => {
            commands::print(&commands::restore::restore(args, driver_opts)?)
        }
    }
}
