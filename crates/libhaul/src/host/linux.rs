//! Implements Host for Linux systems
use std::any::Any;
use std::fs::{self, File};
use std::os::unix::net::UnixStream;
use std::os::unix::process::CommandExt;
use std::path::Path;
use std::process::{Command, Stdio};

use nix::errno::Errno;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;

use super::{Host, HostError, Result};
use crate::tool::ToolCommand;

/// Empty structure to implement Host trait for
#[derive(Clone, Copy)]
pub struct LinuxHost;

impl LinuxHost {
    fn command(cmd: &ToolCommand, log: &File) -> Result<Command> {
        let stdout = log.try_clone().map_err(HostError::LogHandle)?;
        let stderr = log.try_clone().map_err(HostError::LogHandle)?;

        let mut command = Command::new(cmd.program());
        command
            .args(cmd.args())
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(stderr);
        Ok(command)
    }
}

impl Host for LinuxHost {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn run(&self, cmd: &ToolCommand, log: &File) -> Result<Option<i32>> {
        tracing::debug!(program = ?cmd.program(), args = ?cmd.args(), "run");
        let status = Self::command(cmd, log)?
            .status()
            .map_err(|err| HostError::Exec {
                program: cmd.program().to_owned(),
                source: err,
            })?;
        Ok(status.code())
    }

    fn spawn_detached(&self, cmd: &ToolCommand, log: &File) -> Result<i32> {
        tracing::debug!(program = ?cmd.program(), args = ?cmd.args(), "spawn");
        // Own process group, so signals aimed at us do not reach the child.
        let child = Self::command(cmd, log)?
            .process_group(0)
            .spawn()
            .map_err(|err| HostError::Exec {
                program: cmd.program().to_owned(),
                source: err,
            })?;
        Ok(child.id() as i32)
    }

    fn find_processes(&self, program: &Path) -> Result<Vec<i32>> {
        let own = std::process::id() as i32;
        // /proc/<pid>/exe is always the resolved binary, while `program` may
        // be a symlink to a versioned install.
        let canonical = fs::canonicalize(program).ok();
        let is_program =
            |path: &Path| path == program || canonical.as_deref().is_some_and(|c| c == path);

        let mut pids = Vec::new();
        for process in procfs::process::all_processes().map_err(HostError::ListProcesses)? {
            // Processes may exit while we are walking /proc.
            let Ok(process) = process else {
                continue;
            };
            if process.pid() == own {
                continue;
            }
            let by_exe = process.exe().is_ok_and(|exe| is_program(exe.as_path()));
            let matched = by_exe
                || process
                    .cmdline()
                    .ok()
                    .and_then(|cmdline| cmdline.into_iter().next())
                    .is_some_and(|arg0| is_program(Path::new(&arg0)));
            if matched {
                pids.push(process.pid());
            }
        }
        Ok(pids)
    }

    fn kill(&self, pid: i32) -> Result<()> {
        match signal::kill(Pid::from_raw(pid), Signal::SIGKILL) {
            Ok(()) | Err(Errno::ESRCH) => Ok(()),
            Err(errno) => Err(HostError::Kill { pid, errno }),
        }
    }

    fn probe_socket(&self, socket: &Path) -> bool {
        UnixStream::connect(socket).is_ok()
    }
}
