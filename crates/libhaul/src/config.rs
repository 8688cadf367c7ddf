//! Host-specific layout of the container runtime and of the driver's own
//! diagnostic files.
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to open config file {path:?}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config file {path:?}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("failed to write config file {path:?}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{0} must be greater than zero")]
    ZeroInterval(&'static str),
}

type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HaulConfig {
    /// Runtime binary providing the checkpoint, restore and daemon verbs
    pub docker_bin: PathBuf,
    /// Persistent storage root of the runtime (rootfs layers and configs)
    pub storage_root: PathBuf,
    /// Storage driver, both a directory under `storage_root` and the
    /// value passed to the daemon with `-s`
    pub storage_driver: String,
    /// Root of the per-container runtime bookkeeping directories
    pub run_meta_root: PathBuf,
    pub checkpoint_log: PathBuf,
    pub restore_log: PathBuf,
    /// Socket the restarted daemon listens on once it is ready
    pub daemon_socket: PathBuf,
    pub daemon_ready_timeout_ms: u64,
    pub poll_interval_ms: u64,
}

impl Default for HaulConfig {
    fn default() -> Self {
        Self {
            docker_bin: PathBuf::from("/usr/bin/docker"),
            storage_root: PathBuf::from("/var/lib/docker"),
            storage_driver: "aufs".to_owned(),
            run_meta_root: PathBuf::from("/var/run/docker/execdriver/native"),
            checkpoint_log: PathBuf::from("/tmp/docker_checkpoint.log"),
            restore_log: PathBuf::from("/tmp/docker_restore.log"),
            daemon_socket: PathBuf::from("/var/run/docker.sock"),
            daemon_ready_timeout_ms: 10_000,
            poll_interval_ms: 100,
        }
    }
}

impl HaulConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = fs::File::open(path).map_err(|err| {
            tracing::error!(?path, %err, "failed to open config file");
            ConfigError::Open {
                path: path.to_owned(),
                source: err,
            }
        })?;
        let config: Self = serde_json::from_reader(&file).map_err(|err| {
            tracing::error!(?path, %err, "failed to parse config file");
            ConfigError::Parse {
                path: path.to_owned(),
                source: err,
            }
        })?;
        config.validate()?;

        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let file = fs::File::create(path).map_err(|err| ConfigError::Write {
            path: path.to_owned(),
            source: err,
        })?;
        serde_json::to_writer_pretty(&file, self).map_err(|err| ConfigError::Write {
            path: path.to_owned(),
            source: err.into(),
        })?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.daemon_ready_timeout_ms == 0 {
            return Err(ConfigError::ZeroInterval("daemonReadyTimeoutMs"));
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::ZeroInterval("pollIntervalMs"));
        }
        Ok(())
    }

    /// Directory holding one entry per container, named by full id. This is
    /// what short ids are resolved against.
    pub fn containers_root(&self) -> PathBuf {
        self.storage_root.join("containers")
    }

    pub fn rootfs_root(&self) -> PathBuf {
        self.storage_root.join(&self.storage_driver).join("mnt")
    }

    pub fn daemon_ready_timeout(&self) -> Duration {
        Duration::from_millis(self.daemon_ready_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;

    use super::*;

    #[test]
    fn test_default_layout() {
        let config = HaulConfig::default();
        assert_eq!(
            config.containers_root(),
            PathBuf::from("/var/lib/docker/containers")
        );
        assert_eq!(config.rootfs_root(), PathBuf::from("/var/lib/docker/aufs/mnt"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_partial_config() -> Result<()> {
        let tmp = tempfile::tempdir()?;
        let path = tmp.path().join("haul.json");
        fs::write(
            &path,
            r#"{"storageRoot": "/srv/docker", "storageDriver": "overlay2"}"#,
        )?;

        let config = HaulConfig::load(&path)?;
        assert_eq!(config.storage_root, PathBuf::from("/srv/docker"));
        assert_eq!(config.rootfs_root(), PathBuf::from("/srv/docker/overlay2/mnt"));
        assert_eq!(config.docker_bin, HaulConfig::default().docker_bin);
        Ok(())
    }

    #[test]
    fn test_save_and_load() -> Result<()> {
        let tmp = tempfile::tempdir()?;
        let path = tmp.path().join("haul.json");
        let config = HaulConfig {
            daemon_ready_timeout_ms: 500,
            ..Default::default()
        };
        config.save(&path)?;
        assert_eq!(HaulConfig::load(&path)?, config);
        Ok(())
    }

    #[test]
    fn test_save_write_failure() {
        // Opening succeeds, every write fails with ENOSPC.
        assert!(matches!(
            HaulConfig::default().save("/dev/full"),
            Err(ConfigError::Write { .. })
        ));
    }

    #[test]
    fn test_zero_poll_interval_rejected() -> Result<()> {
        let tmp = tempfile::tempdir()?;
        let path = tmp.path().join("haul.json");
        fs::write(&path, r#"{"pollIntervalMs": 0}"#)?;

        assert!(matches!(
            HaulConfig::load(&path),
            Err(ConfigError::ZeroInterval(_))
        ));
        Ok(())
    }

    #[test]
    fn test_unparsable_config() -> Result<()> {
        let tmp = tempfile::tempdir()?;
        let path = tmp.path().join("haul.json");
        fs::write(&path, "not json")?;

        assert!(matches!(
            HaulConfig::load(&path),
            Err(ConfigError::Parse { .. })
        ));
        Ok(())
    }
}
