//! Identity of the container being migrated and the paths derived from it
pub mod id;
pub mod paths;

pub use id::{ContainerId, ShortId};
pub use paths::ContainerPaths;

use serde::Serialize;

/// A resolved identity together with the paths derived from it. Paths are
/// never computed for an unresolved id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolved {
    pub id: ContainerId,
    pub paths: ContainerPaths,
}

impl Resolved {
    pub fn new(config: &crate::config::HaulConfig, id: ContainerId) -> Self {
        let paths = ContainerPaths::derive(config, &id);
        Self { id, paths }
    }
}
