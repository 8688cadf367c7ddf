//! Container identity in two phases: a user-supplied `ShortId` and the
//! `ContainerId` it resolves to on a given host.
use std::fmt::Display;
use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::error::{HaulError, Result};

/// Shortest prefix accepted for resolution.
pub const MIN_ID_LEN: usize = 3;

/// A (possibly partial) container id as supplied by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortId(String);

impl ShortId {
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.chars().count() < MIN_ID_LEN {
            return Err(HaulError::InvalidIdentifier(id));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Finds the single entry of `metadata_root` whose name starts with this
    /// prefix.
    #[tracing::instrument(level = "debug", skip(metadata_root), fields(root = ?metadata_root.as_ref()))]
    pub fn resolve<P: AsRef<Path>>(&self, metadata_root: P) -> Result<ContainerId> {
        let root = metadata_root.as_ref();
        let entries =
            fs::read_dir(root).map_err(|err| HaulError::io("list container metadata", root, err))?;

        let mut matches = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|err| HaulError::io("list container metadata", root, err))?;
            // Entries that are not valid UTF-8 cannot be container ids.
            if let Some(name) = entry.file_name().to_str() {
                if name.starts_with(self.as_str()) {
                    matches.push(name.to_owned());
                }
            }
        }

        match matches.len() {
            1 => {
                let full = matches.remove(0);
                tracing::debug!(short = %self, full = %full, "resolved container id");
                Ok(ContainerId(full))
            }
            n => {
                tracing::error!(short = %self, matches = ?matches, "cannot resolve container id");
                Err(HaulError::AmbiguousOrMissingIdentifier {
                    prefix: self.0.clone(),
                    root: root.to_owned(),
                    matches: n,
                })
            }
        }
    }
}

impl Display for ShortId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The full, host-unique id of a container. Only obtainable by resolving a
/// `ShortId` or from transferred runtime metadata.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ContainerId(String);

impl ContainerId {
    pub(crate) fn from_meta(id: String) -> Self {
        Self(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ContainerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use quickcheck::quickcheck;

    use super::*;

    fn metadata_root(entries: &[&str]) -> Result<tempfile::TempDir> {
        let tmp = tempfile::tempdir()?;
        for entry in entries {
            fs::create_dir(tmp.path().join(entry))?;
        }
        Ok(tmp)
    }

    #[test]
    fn test_short_id_too_short() {
        for id in ["", "a", "ab"] {
            assert!(matches!(
                ShortId::new(id),
                Err(HaulError::InvalidIdentifier(_))
            ));
        }
        assert!(ShortId::new("abc").is_ok());
    }

    quickcheck! {
        fn prop_short_ids_rejected_before_listing(id: String) -> bool {
            let short: String = id.chars().take(MIN_ID_LEN - 1).collect();
            // The root does not exist, so any listing would fail with Io.
            let resolved = ShortId::new(short)
                .and_then(|short| short.resolve("/nonexistent/haul/containers"));
            matches!(resolved, Err(HaulError::InvalidIdentifier(_)))
        }
    }

    #[test]
    fn test_resolve_unique_prefix() -> Result<()> {
        let root = metadata_root(&["abc123def", "fff000"])?;
        let id = ShortId::new("abc")?.resolve(root.path())?;
        assert_eq!(id.as_str(), "abc123def");
        Ok(())
    }

    #[test]
    fn test_resolve_full_id() -> Result<()> {
        let root = metadata_root(&["abc123def"])?;
        let id = ShortId::new("abc123def")?.resolve(root.path())?;
        assert_eq!(id.as_str(), "abc123def");
        Ok(())
    }

    #[test]
    fn test_resolve_prefix_only_matches_start() -> Result<()> {
        let root = metadata_root(&["123abc"])?;
        let err = ShortId::new("abc")?.resolve(root.path()).unwrap_err();
        assert!(matches!(
            err,
            HaulError::AmbiguousOrMissingIdentifier { matches: 0, .. }
        ));
        Ok(())
    }

    #[test]
    fn test_resolve_ambiguous() -> Result<()> {
        let root = metadata_root(&["abc123", "abc456", "def789"])?;
        let err = ShortId::new("abc")?.resolve(root.path()).unwrap_err();
        assert!(matches!(
            err,
            HaulError::AmbiguousOrMissingIdentifier { matches: 2, .. }
        ));
        Ok(())
    }

    #[test]
    fn test_resolve_missing_root() -> Result<()> {
        let tmp = tempfile::tempdir()?;
        let err = ShortId::new("abc")?
            .resolve(tmp.path().join("containers"))
            .unwrap_err();
        assert!(matches!(err, HaulError::Io { .. }));
        Ok(())
    }
}
