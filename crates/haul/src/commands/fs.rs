//! Prints the subtrees the filesystem hauler has to copy
use anyhow::{Context, Result};
use clap::Parser;
use libhaul::fs::SubtreeTransfer;

use super::DriverOpts;

/// Declare the filesystem subtrees of a container for transfer
#[derive(Parser, Debug)]
pub struct Fs {
    #[clap(required = true)]
    pub container_id: String,
}

pub fn fs(args: Fs, opts: DriverOpts) -> Result<SubtreeTransfer> {
    let mut driver = opts.source(&args.container_id)?;
    driver
        .filesystem()
        .with_context(|| format!("failed to declare filesystem of {}", args.container_id))
}
