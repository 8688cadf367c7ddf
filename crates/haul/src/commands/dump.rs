//! Final dump on the source host
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use libhaul::fs::SubtreeTransfer;
use libhaul::meta::MetaImageEntry;
use libhaul::tool::ToolOutcome;
use serde::Serialize;

use super::DriverOpts;

/// Checkpoint a container and print what has to be shipped to the destination
#[derive(Parser, Debug)]
pub struct Dump {
    #[clap(required = true)]
    pub container_id: String,
    /// Pid of the container's root task
    #[clap(long)]
    pub pid: i32,
    /// Directory the checkpoint image is written to
    #[clap(long, default_value = "checkpoint")]
    pub image_dir: PathBuf,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct DumpOutput {
    pub filesystem: SubtreeTransfer,
    pub outcome: ToolOutcome,
    pub meta_images: Vec<MetaImageEntry>,
}

pub fn dump(args: Dump, opts: DriverOpts) -> Result<DumpOutput> {
    tracing::debug!("start dumping container {}", args.container_id);
    let mut driver = opts.source(&args.container_id)?;

    let filesystem = driver.filesystem()?;
    let outcome = driver
        .final_dump(args.pid, &args.image_dir)
        .with_context(|| format!("failed to checkpoint container {}", args.container_id))?;
    let meta_images = driver.meta_images(&args.image_dir)?;

    Ok(DumpOutput {
        filesystem,
        outcome,
        meta_images,
    })
}
