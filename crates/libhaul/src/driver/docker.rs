//! Driver for containers managed by a docker daemon with checkpoint support
use std::path::Path;

use tracing::instrument;

use super::{DestinationPhase, MigrationDriver, Phase, SourcePhase};
use crate::config::HaulConfig;
use crate::container::{Resolved, ShortId};
use crate::delegate::CheckpointDelegate;
use crate::error::{HaulError, Result};
use crate::fs::{FsReceiver, SubtreeTransfer};
use crate::host::{Host, HostType};
use crate::meta::{self, MetaImageEntry};
use crate::tool::ToolOutcome;

pub struct DockerDriver {
    short_id: ShortId,
    config: HaulConfig,
    host: Box<dyn Host>,
    resolved: Option<Resolved>,
    phase: Phase,
}

impl DockerDriver {
    pub fn new(container_id: &str, config: HaulConfig, host: HostType) -> Result<Self> {
        Ok(Self {
            short_id: ShortId::new(container_id)?,
            config,
            host: host.create_host(),
            resolved: None,
            phase: Phase::Uninitialized,
        })
    }

    pub fn short_id(&self) -> &ShortId {
        &self.short_id
    }

    pub fn host(&self) -> &dyn Host {
        self.host.as_ref()
    }

    fn ensure(&self, operation: &'static str, allowed: bool) -> Result<()> {
        if allowed {
            Ok(())
        } else {
            tracing::error!(operation, phase = %self.phase, "invalid driver transition");
            Err(HaulError::InvalidTransition {
                operation,
                phase: self.phase,
            })
        }
    }

    fn resolved_for(&self, operation: &'static str) -> Result<&Resolved> {
        self.resolved.as_ref().ok_or(HaulError::InvalidTransition {
            operation,
            phase: self.phase,
        })
    }

    fn log_paths(resolved: &Resolved) {
        tracing::info!(rootfs = ?resolved.paths.rootfs(), "container rootfs");
        tracing::info!(config = ?resolved.paths.config_dir(), "container config");
        tracing::info!(meta = ?resolved.paths.runtime_meta_dir(), "container meta");
    }
}

impl MigrationDriver for DockerDriver {
    #[instrument(level = "debug", skip(self), fields(id = %self.short_id))]
    fn init_source(&mut self) -> Result<()> {
        self.ensure("init_source", self.phase == Phase::Uninitialized)?;

        let id = self.short_id.resolve(self.config.containers_root())?;
        let resolved = Resolved::new(&self.config, id);
        Self::log_paths(&resolved);

        self.resolved = Some(resolved);
        self.phase = Phase::Source(SourcePhase::Ready);
        Ok(())
    }

    fn init_destination(&mut self) -> Result<()> {
        self.ensure("init_destination", self.phase == Phase::Uninitialized)?;
        // The full id is only known once the meta state has arrived.
        self.phase = Phase::Destination(DestinationPhase::AwaitingMetaState);
        Ok(())
    }

    fn filesystem(&mut self) -> Result<SubtreeTransfer> {
        self.ensure("filesystem", self.phase.can_declare_filesystem())?;
        let transfer = SubtreeTransfer::for_paths(&self.resolved_for("filesystem")?.paths);
        tracing::debug!(subtrees = ?transfer.subtrees(), "declared filesystem transfer");

        self.phase = Phase::Source(SourcePhase::FilesystemDeclared);
        Ok(transfer)
    }

    fn filesystem_receiver(&self) -> Option<FsReceiver> {
        None
    }

    fn meta_images(&self, archive_dir: &Path) -> Result<Vec<MetaImageEntry>> {
        self.ensure("meta_images", self.phase.can_declare_meta_images())?;
        let resolved = self.resolved_for("meta_images")?;
        Ok(meta::collect_meta_images(resolved, archive_dir))
    }

    #[instrument(level = "debug", skip(self))]
    fn put_meta_images(&mut self, received_dir: &Path) -> Result<()> {
        self.ensure("put_meta_images", self.phase.can_apply_meta_images())?;

        let resolved = meta::apply_meta_images(&self.config, received_dir)?;
        Self::log_paths(&resolved);

        self.resolved = Some(resolved);
        self.phase = Phase::Destination(DestinationPhase::Ready);
        Ok(())
    }

    fn final_dump(&mut self, pid: i32, image_dir: &Path) -> Result<ToolOutcome> {
        self.ensure("final_dump", self.phase.can_dump())?;
        let resolved = self.resolved_for("final_dump")?;

        let delegate = CheckpointDelegate::new(&self.config, self.host.as_ref());
        let mut request = delegate.checkpoint_command(&resolved.id, image_dir);
        self.adjust_checkpoint_request(&mut request);

        let result = delegate.dump(&resolved.id, pid, &request);
        self.phase = Phase::Source(match result {
            Ok(_) => SourcePhase::Dumped,
            Err(_) => SourcePhase::DumpFailed,
        });
        result
    }

    fn final_restore(&mut self, image_dir: &Path) -> Result<ToolOutcome> {
        self.ensure("final_restore", self.phase.can_restore())?;
        let resolved = self.resolved_for("final_restore")?;

        let delegate = CheckpointDelegate::new(&self.config, self.host.as_ref());
        let result = delegate.restore(&resolved.id, image_dir);
        self.phase = Phase::Destination(match result {
            Ok(_) => DestinationPhase::Restored,
            Err(_) => DestinationPhase::RestoreFailed,
        });
        result
    }

    fn can_pre_dump(&self) -> bool {
        // The runtime's checkpoint verb has no page-server integration.
        false
    }

    fn dump_needs_page_server(&self) -> bool {
        false
    }

    fn phase(&self) -> Phase {
        self.phase
    }

    fn container(&self) -> Option<&Resolved> {
        self.resolved.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use anyhow::Result;

    use super::*;
    use crate::host::test::TestHelperHost;
    use crate::tool::ToolVerb;

    struct Env {
        _tmp: tempfile::TempDir,
        config: HaulConfig,
        images: PathBuf,
    }

    fn env(containers: &[&str]) -> Result<Env> {
        let tmp = tempfile::tempdir()?;
        let config = HaulConfig {
            storage_root: tmp.path().join("lib"),
            run_meta_root: tmp.path().join("run"),
            checkpoint_log: tmp.path().join("checkpoint.log"),
            restore_log: tmp.path().join("restore.log"),
            daemon_ready_timeout_ms: 50,
            poll_interval_ms: 1,
            ..Default::default()
        };
        for container in containers {
            fs::create_dir_all(config.containers_root().join(container))?;
        }
        let images = tmp.path().join("images");
        fs::create_dir(&images)?;
        Ok(Env {
            _tmp: tmp,
            config,
            images,
        })
    }

    fn test_host(driver: &DockerDriver) -> &TestHelperHost {
        driver
            .host()
            .as_any()
            .downcast_ref::<TestHelperHost>()
            .unwrap()
    }

    #[test]
    fn test_init_source_resolves_paths() -> Result<()> {
        let env = env(&["abc123def"])?;
        let mut driver = DockerDriver::new("abc", env.config.clone(), HostType::Test)?;
        driver.init_source()?;

        let resolved = driver.container().unwrap();
        assert_eq!(resolved.id.as_str(), "abc123def");
        assert_eq!(
            resolved.paths.rootfs(),
            env.config.storage_root.join("aufs/mnt/abc123def")
        );
        assert_eq!(
            resolved.paths.config_dir(),
            env.config.storage_root.join("containers/abc123def")
        );
        assert_eq!(
            resolved.paths.runtime_meta_dir(),
            env.config.run_meta_root.join("abc123def")
        );
        assert_eq!(driver.phase(), Phase::Source(SourcePhase::Ready));
        Ok(())
    }

    #[test]
    fn test_init_source_unresolvable() -> Result<()> {
        let env = env(&["def456"])?;
        let mut driver = DockerDriver::new("abc", env.config.clone(), HostType::Test)?;

        assert!(matches!(
            driver.init_source(),
            Err(HaulError::AmbiguousOrMissingIdentifier { matches: 0, .. })
        ));
        assert_eq!(driver.phase(), Phase::Uninitialized);
        assert!(driver.container().is_none());
        Ok(())
    }

    #[test]
    fn test_dump_requires_filesystem_declaration() -> Result<()> {
        let env = env(&["abc123def"])?;
        let mut driver = DockerDriver::new("abc", env.config.clone(), HostType::Test)?;
        driver.init_source()?;

        let err = driver.final_dump(4242, &env.images).unwrap_err();
        assert!(matches!(
            err,
            HaulError::InvalidTransition {
                operation: "final_dump",
                phase: Phase::Source(SourcePhase::Ready)
            }
        ));
        assert!(test_host(&driver).get_calls().is_empty());
        Ok(())
    }

    #[test]
    fn test_source_lifecycle() -> Result<()> {
        let env = env(&["abc123def"])?;
        let mut driver = DockerDriver::new("abc", env.config.clone(), HostType::Test)?;
        driver.init_source()?;

        let transfer = driver.filesystem()?;
        assert_eq!(transfer.subtrees().len(), 2);
        // Pre-copy passes may ask again.
        assert_eq!(driver.filesystem()?, transfer);

        let outcome = driver.final_dump(4242, &env.images)?;
        assert!(outcome.success());
        assert_eq!(driver.phase(), Phase::Source(SourcePhase::Dumped));

        let images = driver.meta_images(&env.images)?;
        assert_eq!(images[0].archive_name, "state.json");
        assert_eq!(images[1].source, env.images.join("descriptors.json"));

        let runs = test_host(&driver).get_run_commands();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].verb(), ToolVerb::Checkpoint);
        assert_eq!(runs[0].target(), Some("abc123def"));
        Ok(())
    }

    #[test]
    fn test_failed_dump_is_terminal() -> Result<()> {
        let env = env(&["abc123def"])?;
        let mut driver = DockerDriver::new("abc", env.config.clone(), HostType::Test)?;
        test_host(&driver).set_exit_code(ToolVerb::Checkpoint, Some(1));
        driver.init_source()?;
        driver.filesystem()?;

        let err = driver.final_dump(4242, &env.images).unwrap_err();
        assert!(matches!(
            err,
            HaulError::CheckpointFailed { ref log, .. } if *log == env.config.checkpoint_log
        ));
        assert_eq!(driver.phase(), Phase::Source(SourcePhase::DumpFailed));
        assert!(driver.filesystem().is_err());
        assert!(driver.meta_images(&env.images).is_err());
        assert!(driver.final_dump(4242, &env.images).is_err());
        assert_eq!(test_host(&driver).get_run_commands().len(), 1);
        Ok(())
    }

    #[test]
    fn test_destination_lifecycle() -> Result<()> {
        let env = env(&[])?;
        fs::write(env.images.join("state.json"), r#"{"id": "xyz789"}"#)?;
        let mut driver = DockerDriver::new("xyz", env.config.clone(), HostType::Test)?;

        driver.init_destination()?;
        assert!(driver.container().is_none());
        assert!(driver.filesystem_receiver().is_none());
        assert!(driver.final_restore(&env.images).is_err());

        driver.put_meta_images(&env.images)?;
        let meta_dir = env.config.run_meta_root.join("xyz789");
        assert!(meta_dir.join("state.json").exists());
        assert_eq!(driver.phase(), Phase::Destination(DestinationPhase::Ready));

        test_host(&driver).watch_path(&meta_dir.join("state.json"));
        driver.final_restore(&env.images)?;
        assert_eq!(driver.phase(), Phase::Destination(DestinationPhase::Restored));
        assert_eq!(test_host(&driver).get_watched_at_runs(), vec![true]);
        Ok(())
    }

    #[test]
    fn test_corrupt_meta_state_keeps_waiting() -> Result<()> {
        let env = env(&[])?;
        fs::write(env.images.join("state.json"), "{}")?;
        let mut driver = DockerDriver::new("xyz", env.config.clone(), HostType::Test)?;
        driver.init_destination()?;

        assert!(matches!(
            driver.put_meta_images(&env.images),
            Err(HaulError::CorruptMetaState { .. })
        ));
        assert_eq!(
            driver.phase(),
            Phase::Destination(DestinationPhase::AwaitingMetaState)
        );
        Ok(())
    }

    #[test]
    fn test_sides_do_not_mix() -> Result<()> {
        let env = env(&["abc123def"])?;
        let mut driver = DockerDriver::new("abc", env.config.clone(), HostType::Test)?;
        driver.init_destination()?;

        assert!(driver.init_source().is_err());
        assert!(driver.filesystem().is_err());
        assert!(driver.meta_images(&env.images).is_err());
        assert!(driver.umount().is_ok());
        Ok(())
    }
}
