use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use libhaul::config::HaulConfig;
use libhaul::driver::{DriverKind, MigrationDriver};
use libhaul::host::HostType;
use serde::Serialize;

pub mod dump;
pub mod fs;
pub mod meta_images;
pub mod resolve;
pub mod restore;

pub fn load_config(path: Option<&Path>) -> Result<HaulConfig> {
    match path {
        Some(path) => {
            HaulConfig::load(path).with_context(|| format!("failed to load config {path:?}"))
        }
        None => Ok(HaulConfig::default()),
    }
}

pub fn print<T: Serialize>(output: &T) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, output).context("failed to encode output")?;
    writeln!(stdout)?;
    Ok(())
}

/// Everything needed to build a driver, shared by all subcommands.
pub struct DriverOpts {
    pub kind: DriverKind,
    pub config: HaulConfig,
    pub host: HostType,
}

impl DriverOpts {
    fn create(self, container_id: &str) -> Result<Box<dyn MigrationDriver>> {
        self.kind
            .create_driver(container_id, self.config, self.host)
            .with_context(|| format!("failed to create driver for container {container_id}"))
    }

    fn source(self, container_id: &str) -> Result<Box<dyn MigrationDriver>> {
        let mut driver = self.create(container_id)?;
        driver
            .init_source()
            .with_context(|| format!("failed to initialize source for container {container_id}"))?;
        Ok(driver)
    }
}
