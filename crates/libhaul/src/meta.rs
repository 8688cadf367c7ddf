//! Meta-images: runtime bookkeeping files that travel inside the checkpoint
//! image so the destination can rebuild the runtime's view of the container.
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::instrument;

use crate::config::HaulConfig;
use crate::container::{ContainerId, Resolved};
use crate::error::{HaulError, Result};

/// Runtime state file, kept in the runtime-meta directory of a container.
pub const STATE_FILE: &str = "state.json";
/// Written by the checkpoint tool into the image directory; records where
/// the container's stdio pointed at checkpoint time.
pub const DESCRIPTORS_FILE: &str = "descriptors.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaImageEntry {
    pub source: PathBuf,
    /// Stable name under which the file is stored next to the image and
    /// looked up again on the destination
    pub archive_name: String,
}

impl MetaImageEntry {
    fn new(source: PathBuf, archive_name: &str) -> Self {
        Self {
            source,
            archive_name: archive_name.to_owned(),
        }
    }
}

/// Meta-images the orchestrator must copy next to the checkpoint image in
/// `archive_dir`. Only declares them, nothing is read here.
pub fn collect_meta_images(resolved: &Resolved, archive_dir: &Path) -> Vec<MetaImageEntry> {
    vec![
        MetaImageEntry::new(
            resolved.paths.runtime_meta_dir().join(STATE_FILE),
            STATE_FILE,
        ),
        MetaImageEntry::new(archive_dir.join(DESCRIPTORS_FILE), DESCRIPTORS_FILE),
    ]
}

#[derive(Debug, thiserror::Error)]
pub enum MetaStateError {
    #[error("failed to read state file")]
    Read(#[source] std::io::Error),
    #[error("failed to parse state file")]
    Parse(#[source] serde_json::Error),
    #[error("state file has no string id field")]
    MissingId,
    #[error("state file id {0:?} is not a valid container id")]
    InvalidId(String),
}

/// The parts of a transferred runtime state file the driver relies on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaState {
    id: ContainerId,
}

impl MetaState {
    pub fn load(received_dir: &Path) -> Result<Self> {
        let path = received_dir.join(STATE_FILE);
        Self::parse(&path).map_err(|err| {
            tracing::error!(?path, %err, "received meta state is unusable");
            HaulError::CorruptMetaState { path, source: err }
        })
    }

    fn parse(path: &Path) -> std::result::Result<Self, MetaStateError> {
        let data = fs::read(path).map_err(MetaStateError::Read)?;
        let value: serde_json::Value = serde_json::from_slice(&data).map_err(MetaStateError::Parse)?;
        let id = value
            .get("id")
            .and_then(serde_json::Value::as_str)
            .ok_or(MetaStateError::MissingId)?;

        // The id becomes a path component on this host.
        if id.is_empty() || id == "." || id == ".." || id.contains('/') || id.contains('\0') {
            return Err(MetaStateError::InvalidId(id.to_owned()));
        }

        Ok(Self {
            id: ContainerId::from_meta(id.to_owned()),
        })
    }

    pub fn id(&self) -> &ContainerId {
        &self.id
    }
}

/// Adopts the id found in the received state file and materializes the
/// runtime-meta directory for it. The directory only ever appears fully
/// populated: it is assembled in a staging sibling and renamed into place.
#[instrument(level = "debug", skip(config))]
pub fn apply_meta_images(config: &HaulConfig, received_dir: &Path) -> Result<Resolved> {
    let state = MetaState::load(received_dir)?;
    let resolved = Resolved::new(config, state.id().clone());
    let target = resolved.paths.runtime_meta_dir();

    match fs::symlink_metadata(target) {
        Ok(_) => {
            tracing::error!(?target, "runtime meta directory already exists");
            return Err(HaulError::DestinationConflict(target.to_owned()));
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => return Err(HaulError::io("inspect", target, err)),
    }

    let parent = target.parent().unwrap_or(&config.run_meta_root);
    fs::create_dir_all(parent).map_err(|err| HaulError::io("create", parent, err))?;

    let staging = parent.join(format!(".{}.staging", resolved.id));
    if staging.exists() {
        tracing::warn!(?staging, "removing leftover staging directory");
        fs::remove_dir_all(&staging).map_err(|err| HaulError::io("remove", &staging, err))?;
    }
    fs::create_dir(&staging).map_err(|err| HaulError::io("create", &staging, err))?;
    let staging = scopeguard::guard(staging, |staging| {
        if let Err(err) = fs::remove_dir_all(&staging) {
            tracing::warn!(?staging, %err, "failed to clean up staging directory");
        }
    });

    let source = received_dir.join(STATE_FILE);
    fs::copy(&source, staging.join(STATE_FILE))
        .map_err(|err| HaulError::io("copy", &source, err))?;
    fs::rename(&*staging, target).map_err(|err| HaulError::io("rename", &*staging, err))?;
    scopeguard::ScopeGuard::into_inner(staging);

    tracing::info!(id = %resolved.id, ?target, "runtime meta directory created");
    Ok(resolved)
}
