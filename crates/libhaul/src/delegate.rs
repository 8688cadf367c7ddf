//! Drives the runtime's own checkpoint and restore verbs. Process state is
//! never touched directly; only the external tool's exit status matters.
use std::cell::RefCell;
use std::fs::File;
use std::path::Path;

use tracing::instrument;

use crate::config::HaulConfig;
use crate::container::ContainerId;
use crate::error::{HaulError, Result};
use crate::host::Host;
use crate::readiness::{Poll, ReadinessCheck, SocketReadiness};
use crate::tool::{ToolCommand, ToolOutcome, ToolVerb};

pub struct CheckpointDelegate<'a> {
    config: &'a HaulConfig,
    host: &'a dyn Host,
}

impl<'a> CheckpointDelegate<'a> {
    pub fn new(config: &'a HaulConfig, host: &'a dyn Host) -> Self {
        Self { config, host }
    }

    pub fn checkpoint_command(&self, id: &ContainerId, image_dir: &Path) -> ToolCommand {
        ToolCommand::new(&self.config.docker_bin, ToolVerb::Checkpoint)
            .with_image_dir(image_dir)
            .with_target(id)
    }

    pub fn restore_command(&self, id: &ContainerId, image_dir: &Path) -> ToolCommand {
        ToolCommand::new(&self.config.docker_bin, ToolVerb::Restore)
            .with_image_dir(image_dir)
            .with_target(id)
    }

    pub fn daemon_command(&self) -> ToolCommand {
        ToolCommand::new(&self.config.docker_bin, ToolVerb::Daemon)
            .with_flag("-s")
            .with_flag(&self.config.storage_driver)
    }

    /// Runs a prepared checkpoint command for the container whose root task
    /// is `pid`.
    #[instrument(level = "debug", skip(self, cmd))]
    pub fn dump(&self, id: &ContainerId, pid: i32, cmd: &ToolCommand) -> Result<ToolOutcome> {
        tracing::info!(%id, pid, "checkpointing container");
        let log_path = &self.config.checkpoint_log;
        let log = create_log(log_path)?;

        let outcome = ToolOutcome {
            exit_code: self.host.run(cmd, &log)?,
            log: log_path.to_owned(),
        };
        if !outcome.success() {
            tracing::error!(%id, exit_code = ?outcome.exit_code, log = ?log_path, "checkpoint failed");
            return Err(HaulError::CheckpointFailed {
                id: id.to_string(),
                exit_code: outcome.exit_code,
                log: outcome.log,
            });
        }

        tracing::info!(%id, "container checkpointed");
        Ok(outcome)
    }

    /// Restarts the runtime daemon so it picks up the transferred state,
    /// then restores the container from `image_dir`.
    #[instrument(level = "debug", skip(self))]
    pub fn restore(&self, id: &ContainerId, image_dir: &Path) -> Result<ToolOutcome> {
        let log_path = &self.config.restore_log;
        let log = create_log(log_path)?;

        self.restart_daemon(&log)?;

        tracing::info!(%id, "restoring container");
        let outcome = ToolOutcome {
            exit_code: self.host.run(&self.restore_command(id, image_dir), &log)?,
            log: log_path.to_owned(),
        };
        if !outcome.success() {
            tracing::error!(%id, exit_code = ?outcome.exit_code, log = ?log_path, "restore failed");
            return Err(HaulError::RestoreFailed {
                id: id.to_string(),
                exit_code: outcome.exit_code,
                log: outcome.log,
            });
        }

        tracing::info!(%id, "container restored");
        Ok(outcome)
    }

    /// Kills every running instance of the daemon, starts a new one and
    /// waits until it accepts connections. Killing is unconditional.
    fn restart_daemon(&self, log: &File) -> Result<()> {
        let program = &self.config.docker_bin;
        let poll = Poll::new(
            self.config.daemon_ready_timeout(),
            self.config.poll_interval(),
        );

        let stale = self.host.find_processes(program)?;
        if !stale.is_empty() {
            for pid in &stale {
                tracing::warn!(pid, ?program, "killing running daemon");
                self.host.kill(*pid)?;
            }

            // A surviving daemon would answer the readiness probe itself.
            let listing_error = RefCell::new(None);
            let waited = {
                let gone = || match self.host.find_processes(program) {
                    Ok(pids) => pids.iter().all(|pid| !stale.contains(pid)),
                    Err(err) => {
                        *listing_error.borrow_mut() = Some(err);
                        true
                    }
                };
                poll.wait(&gone)
            };
            if let Some(err) = listing_error.into_inner() {
                tracing::error!(%err, "failed to list daemon processes");
                return Err(err.into());
            }
            if let Err(waited) = waited {
                tracing::error!(?stale, ?waited, "daemon did not exit after SIGKILL");
                return Err(HaulError::StaleDaemon { pids: stale });
            }
        }

        let pid = self.host.spawn_detached(&self.daemon_command(), log)?;
        tracing::debug!(pid, "daemon started");

        let socket = &self.config.daemon_socket;
        let ready = SocketReadiness::new(self.host, socket);
        match poll.wait(&ready as &dyn ReadinessCheck) {
            Ok(waited) => {
                tracing::debug!(?socket, ?waited, "daemon is ready");
                Ok(())
            }
            Err(waited) => {
                tracing::error!(?socket, ?waited, "daemon did not become ready");
                Err(HaulError::DaemonNotReady {
                    socket: socket.to_owned(),
                    waited,
                    log: self.config.restore_log.to_owned(),
                })
            }
        }
    }
}

fn create_log(path: &Path) -> Result<File> {
    File::create(path).map_err(|err| {
        tracing::error!(?path, %err, "failed to create diagnostic log");
        HaulError::io("create log", path, err)
    })
}
