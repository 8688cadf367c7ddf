//! Filesystem domains of a container and the transfer handle handed to the
//! external hauler.
use std::fmt::Display;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::container::ContainerPaths;

/// Subtrees a container's state is spread over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MigrationDomain {
    Rootfs,
    Config,
    RuntimeMeta,
}

/// How the bytes of a domain reach the destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferRole {
    /// Pushed by the filesystem hauler, possibly in several passes while
    /// the container keeps running
    BulkSync,
    /// Point-in-time files carried inside the checkpoint image
    MetaImage,
}

/// Where a domain ends up on the destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    SamePath,
    /// Rebuilt from meta-images once the destination knows the full id
    Reconstructed,
}

impl MigrationDomain {
    /// Domains synchronized by the hauler, in transfer order.
    pub const SYNCED: [MigrationDomain; 2] = [MigrationDomain::Rootfs, MigrationDomain::Config];

    pub fn transfer_role(&self) -> TransferRole {
        match self {
            MigrationDomain::Rootfs | MigrationDomain::Config => TransferRole::BulkSync,
            MigrationDomain::RuntimeMeta => TransferRole::MetaImage,
        }
    }

    pub fn placement(&self) -> Placement {
        match self.transfer_role() {
            TransferRole::BulkSync => Placement::SamePath,
            TransferRole::MetaImage => Placement::Reconstructed,
        }
    }
}

impl Display for MigrationDomain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let print = match *self {
            Self::Rootfs => "rootfs",
            Self::Config => "config",
            Self::RuntimeMeta => "runtime-meta",
        };

        write!(f, "{print}")
    }
}

/// Ordered set of subtrees the external hauler has to copy. The driver
/// only declares it; executing the copy belongs to the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubtreeTransfer {
    subtrees: Vec<PathBuf>,
}

impl SubtreeTransfer {
    pub fn for_paths(paths: &ContainerPaths) -> Self {
        let subtrees = MigrationDomain::SYNCED
            .iter()
            .map(|domain| paths.domain(*domain).to_path_buf())
            .collect();
        Self { subtrees }
    }

    pub fn subtrees(&self) -> &[PathBuf] {
        &self.subtrees
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.subtrees.iter().any(|p| p == path)
    }
}

/// Destination-side placement for the hauler, for container types whose
/// subtrees must land somewhere other than their source paths. Drivers that
/// land data at the source paths (docker) return `None` instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FsReceiver {
    target_root: PathBuf,
}

impl FsReceiver {
    pub fn new<P: Into<PathBuf>>(target_root: P) -> Self {
        Self {
            target_root: target_root.into(),
        }
    }

    pub fn target_root(&self) -> &Path {
        &self.target_root
    }

    /// Where a source subtree is placed on the destination: the same path,
    /// re-rooted under `target_root`.
    pub fn placement(&self, subtree: &Path) -> PathBuf {
        let relative = subtree.strip_prefix("/").unwrap_or(subtree);
        self.target_root.join(relative)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HaulConfig;
    use crate::container::{ContainerId, ContainerPaths};

    #[test]
    fn test_transfer_covers_rootfs_then_config() {
        let id = ContainerId::from_meta("abc123def".to_owned());
        let paths = ContainerPaths::derive(&HaulConfig::default(), &id);
        let transfer = SubtreeTransfer::for_paths(&paths);

        assert_eq!(
            transfer.subtrees(),
            &[paths.rootfs().to_path_buf(), paths.config_dir().to_path_buf()]
        );
        assert!(!transfer.contains(paths.runtime_meta_dir()));
    }

    #[test]
    fn test_receiver_reroots_transfer() {
        let id = ContainerId::from_meta("abc123def".to_owned());
        let paths = ContainerPaths::derive(&HaulConfig::default(), &id);
        let transfer = SubtreeTransfer::for_paths(&paths);
        let receiver = FsReceiver::new("/srv/restore");

        let placed: Vec<PathBuf> = transfer
            .subtrees()
            .iter()
            .map(|subtree| receiver.placement(subtree))
            .collect();
        assert_eq!(
            placed,
            vec![
                PathBuf::from("/srv/restore/var/lib/docker/aufs/mnt/abc123def"),
                PathBuf::from("/srv/restore/var/lib/docker/containers/abc123def"),
            ]
        );
        assert_eq!(receiver.target_root(), Path::new("/srv/restore"));
    }

    #[test]
    fn test_domain_roles() {
        assert_eq!(MigrationDomain::Rootfs.placement(), Placement::SamePath);
        assert_eq!(MigrationDomain::Config.transfer_role(), TransferRole::BulkSync);
        assert_eq!(
            MigrationDomain::RuntimeMeta.transfer_role(),
            TransferRole::MetaImage
        );
        assert_eq!(
            MigrationDomain::RuntimeMeta.placement(),
            Placement::Reconstructed
        );
    }
}
