//! Meta-image placement and restore on the destination host
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use libhaul::container::Resolved;
use libhaul::tool::ToolOutcome;
use serde::Serialize;

use super::DriverOpts;

/// Rebuild runtime state from received meta-images and restore a container
#[derive(Parser, Debug)]
pub struct Restore {
    #[clap(required = true)]
    pub container_id: String,
    /// Directory holding the received checkpoint image
    #[clap(long, default_value = "checkpoint")]
    pub image_dir: PathBuf,
    /// Directory holding the received meta-images (default is the image directory)
    #[clap(long)]
    pub meta_dir: Option<PathBuf>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RestoreOutput {
    pub container: Option<Resolved>,
    pub outcome: ToolOutcome,
}

pub fn restore(args: Restore, opts: DriverOpts) -> Result<RestoreOutput> {
    tracing::debug!("start restoring container {}", args.container_id);
    let mut driver = opts.create(&args.container_id)?;
    driver.init_destination()?;

    let meta_dir = args.meta_dir.as_ref().unwrap_or(&args.image_dir);
    driver
        .put_meta_images(meta_dir)
        .with_context(|| format!("failed to apply meta images from {meta_dir:?}"))?;
    let outcome = driver
        .final_restore(&args.image_dir)
        .with_context(|| format!("failed to restore container {}", args.container_id))?;

    Ok(RestoreOutput {
        container: driver.container().cloned(),
        outcome,
    })
}
