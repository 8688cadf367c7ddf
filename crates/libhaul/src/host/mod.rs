//! Contains a wrapper of the host operations the driver needs, so that the
//! lifecycle can be exercised in unit tests without touching real
//! processes

pub mod linux;
#[allow(clippy::module_inception)]
pub mod host;

pub use host::{Host, HostType};

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("failed to execute {program:?}")]
    Exec {
        program: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to duplicate log file handle")]
    LogHandle(#[source] std::io::Error),
    #[error("failed to list processes")]
    ListProcesses(#[source] procfs::ProcError),
    #[error("failed to kill process {pid}: {errno}")]
    Kill {
        pid: i32,
        errno: nix::errno::Errno,
    },
}

type Result<T> = std::result::Result<T, HostError>;
