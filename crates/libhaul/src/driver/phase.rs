//! Where a driver is in its lifecycle
use std::fmt::Display;

use serde::Serialize;

#[derive(Serialize, Debug, Copy, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum SourcePhase {
    // Full id resolved and paths derived
    #[default]
    Ready,
    // Subtrees handed out for transfer
    FilesystemDeclared,
    Dumped,
    DumpFailed,
}

#[derive(Serialize, Debug, Copy, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum DestinationPhase {
    #[default]
    AwaitingMetaState,
    // Full id learned from the meta state and runtime-meta materialized
    Ready,
    Restored,
    RestoreFailed,
}

#[derive(Serialize, Debug, Copy, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase", tag = "side", content = "phase")]
pub enum Phase {
    #[default]
    Uninitialized,
    Source(SourcePhase),
    Destination(DestinationPhase),
}

impl Phase {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Phase::Source(SourcePhase::Dumped | SourcePhase::DumpFailed)
                | Phase::Destination(DestinationPhase::Restored | DestinationPhase::RestoreFailed)
        )
    }

    pub fn can_declare_filesystem(&self) -> bool {
        matches!(
            self,
            Phase::Source(SourcePhase::Ready | SourcePhase::FilesystemDeclared)
        )
    }

    pub fn can_declare_meta_images(&self) -> bool {
        matches!(
            self,
            Phase::Source(
                SourcePhase::Ready | SourcePhase::FilesystemDeclared | SourcePhase::Dumped
            )
        )
    }

    pub fn can_dump(&self) -> bool {
        matches!(self, Phase::Source(SourcePhase::FilesystemDeclared))
    }

    pub fn can_apply_meta_images(&self) -> bool {
        matches!(self, Phase::Destination(DestinationPhase::AwaitingMetaState))
    }

    pub fn can_restore(&self) -> bool {
        matches!(self, Phase::Destination(DestinationPhase::Ready))
    }
}

impl Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let print = match *self {
            Self::Uninitialized => "uninitialized",
            Self::Source(SourcePhase::Ready) => "source ready",
            Self::Source(SourcePhase::FilesystemDeclared) => "filesystem declared",
            Self::Source(SourcePhase::Dumped) => "dumped",
            Self::Source(SourcePhase::DumpFailed) => "dump failed",
            Self::Destination(DestinationPhase::AwaitingMetaState) => "awaiting meta state",
            Self::Destination(DestinationPhase::Ready) => "destination ready",
            Self::Destination(DestinationPhase::Restored) => "restored",
            Self::Destination(DestinationPhase::RestoreFailed) => "restore failed",
        };

        write!(f, "{print}")
    }
}
