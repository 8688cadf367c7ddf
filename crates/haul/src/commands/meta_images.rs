//! Lists the runtime files that have to travel with the checkpoint image
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use libhaul::meta::MetaImageEntry;

use super::DriverOpts;

/// Print the meta-images to bundle with a checkpoint image
#[derive(Parser, Debug)]
pub struct MetaImages {
    #[clap(required = true)]
    pub container_id: String,
    /// Checkpoint image directory the meta-images are bundled with
    #[clap(long, default_value = "checkpoint")]
    pub image_dir: PathBuf,
}

pub fn meta_images(args: MetaImages, opts: DriverOpts) -> Result<Vec<MetaImageEntry>> {
    let driver = opts.source(&args.container_id)?;
    driver
        .meta_images(&args.image_dir)
        .with_context(|| format!("failed to collect meta images of {}", args.container_id))
}
