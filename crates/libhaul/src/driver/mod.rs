//! The interface a migration orchestrator drives, one implementation per
//! container type
use std::path::Path;
use std::str::FromStr;

use crate::config::HaulConfig;
use crate::container::Resolved;
use crate::error::Result;
use crate::fs::{FsReceiver, SubtreeTransfer};
use crate::host::HostType;
use crate::meta::MetaImageEntry;
use crate::tool::{ToolCommand, ToolOutcome};

pub mod docker;
pub mod phase;

pub use docker::DockerDriver;
pub use phase::{DestinationPhase, Phase, SourcePhase};

/// Capability set of a container-type driver. Source side:
/// `init_source`, `filesystem`, `final_dump`, `meta_images`. Destination
/// side: `init_destination`, `put_meta_images`, `final_restore`.
pub trait MigrationDriver {
    fn init_source(&mut self) -> Result<()>;
    fn init_destination(&mut self) -> Result<()>;
    /// Adds container-type specific options to a checkpoint request before
    /// it is run.
    fn adjust_checkpoint_request(&self, _request: &mut ToolCommand) {}
    /// Subtrees the hauler must copy to the destination.
    fn filesystem(&mut self) -> Result<SubtreeTransfer>;
    /// Destination-side placement for the hauler; `None` lands data at the
    /// source paths.
    fn filesystem_receiver(&self) -> Option<FsReceiver>;
    /// Undoes any mount setup made for the migration.
    fn umount(&mut self) -> Result<()> {
        Ok(())
    }
    fn meta_images(&self, archive_dir: &Path) -> Result<Vec<MetaImageEntry>>;
    fn put_meta_images(&mut self, received_dir: &Path) -> Result<()>;
    fn final_dump(&mut self, pid: i32, image_dir: &Path) -> Result<ToolOutcome>;
    fn final_restore(&mut self, image_dir: &Path) -> Result<ToolOutcome>;
    /// Whether iterative pre-dump passes are supported.
    fn can_pre_dump(&self) -> bool;
    /// Whether the final dump needs a page server running alongside it.
    fn dump_needs_page_server(&self) -> bool;
    fn phase(&self) -> Phase;
    fn container(&self) -> Option<&Resolved>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DriverKind {
    #[default]
    Docker,
}

#[derive(Debug, thiserror::Error)]
#[error("unknown container type {0:?}")]
pub struct UnknownDriverKind(String);

impl FromStr for DriverKind {
    type Err = UnknownDriverKind;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "docker" => Ok(DriverKind::Docker),
            other => Err(UnknownDriverKind(other.to_owned())),
        }
    }
}

impl DriverKind {
    pub fn create_driver(
        &self,
        container_id: &str,
        config: HaulConfig,
        host: HostType,
    ) -> Result<Box<dyn MigrationDriver>> {
        match self {
            DriverKind::Docker => Ok(Box::new(DockerDriver::new(container_id, config, host)?)),
        }
    }
}
