use std::path::{Path, PathBuf};

use serde::Serialize;

use super::id::ContainerId;
use crate::config::HaulConfig;
use crate::fs::MigrationDomain;

/// On-disk locations of one container, derived from its resolved id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerPaths {
    rootfs: PathBuf,
    config_dir: PathBuf,
    runtime_meta_dir: PathBuf,
}

impl ContainerPaths {
    pub fn derive(config: &HaulConfig, id: &ContainerId) -> Self {
        Self {
            rootfs: config.rootfs_root().join(id.as_str()),
            config_dir: config.containers_root().join(id.as_str()),
            runtime_meta_dir: config.run_meta_root.join(id.as_str()),
        }
    }

    pub fn rootfs(&self) -> &Path {
        &self.rootfs
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn runtime_meta_dir(&self) -> &Path {
        &self.runtime_meta_dir
    }

    pub fn domain(&self, domain: MigrationDomain) -> &Path {
        match domain {
            MigrationDomain::Rootfs => self.rootfs(),
            MigrationDomain::Config => self.config_dir(),
            MigrationDomain::RuntimeMeta => self.runtime_meta_dir(),
        }
    }
}
