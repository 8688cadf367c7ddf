use std::path::PathBuf;
use std::time::Duration;

use crate::container::id::MIN_ID_LEN;
use crate::driver::Phase;
use crate::host::HostError;
use crate::meta::MetaStateError;

#[derive(Debug, thiserror::Error)]
pub enum HaulError {
    #[error("container id {0:?} is invalid, it must be at least {min} characters long", min = MIN_ID_LEN)]
    InvalidIdentifier(String),
    #[error("container id prefix {prefix:?} matched {matches} entries in {root:?}, expected exactly one")]
    AmbiguousOrMissingIdentifier {
        prefix: String,
        root: PathBuf,
        matches: usize,
    },
    #[error("checkpoint of container {id} failed with exit code {exit_code:?}, see {log:?}")]
    CheckpointFailed {
        id: String,
        exit_code: Option<i32>,
        log: PathBuf,
    },
    #[error("restore of container {id} failed with exit code {exit_code:?}, see {log:?}")]
    RestoreFailed {
        id: String,
        exit_code: Option<i32>,
        log: PathBuf,
    },
    #[error("corrupt meta state {path:?}")]
    CorruptMetaState {
        path: PathBuf,
        #[source]
        source: MetaStateError,
    },
    #[error("runtime meta directory {0:?} already exists on the destination")]
    DestinationConflict(PathBuf),
    #[error("runtime daemon did not answer on {socket:?} within {waited:?}, see {log:?}")]
    DaemonNotReady {
        socket: PathBuf,
        waited: Duration,
        log: PathBuf,
    },
    #[error("runtime daemon processes {pids:?} are still running after SIGKILL")]
    StaleDaemon { pids: Vec<i32> },
    #[error("{operation} is not allowed while the driver is {phase}")]
    InvalidTransition {
        operation: &'static str,
        phase: Phase,
    },
    #[error("failed to {op} {path:?}")]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Host(#[from] HostError),
}

impl HaulError {
    pub(crate) fn io(op: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        HaulError::Io {
            op,
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, HaulError>;
