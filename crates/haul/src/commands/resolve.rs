//! Resolves a short container id and shows where its state lives
use anyhow::{Context, Result};
use clap::Parser;
use libhaul::container::Resolved;
use serde::Serialize;

use super::DriverOpts;

/// Resolve a container id and print its paths and migration capabilities
#[derive(Parser, Debug)]
pub struct Resolve {
    #[clap(required = true)]
    pub container_id: String,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ResolveOutput {
    pub container: Resolved,
    pub can_pre_dump: bool,
    pub dump_needs_page_server: bool,
}

pub fn resolve(args: Resolve, opts: DriverOpts) -> Result<ResolveOutput> {
    let driver = opts.source(&args.container_id)?;
    let container = driver
        .container()
        .cloned()
        .context("driver has no resolved container after init")?;

    Ok(ResolveOutput {
        container,
        can_pre_dump: driver.can_pre_dump(),
        dump_needs_page_server: driver.dump_needs_page_server(),
    })
}

#[cfg(test)]
mod tests {
    use anyhow::Result;

    use super::*;
    use crate::commands::test_utils;

    #[test]
    fn test_resolve() -> Result<()> {
        let tmp = tempfile::tempdir()?;
        let opts = test_utils::opts(tmp.path());
        test_utils::add_container(&opts.config, "abc123def")?;
        let rootfs = opts.config.rootfs_root().join("abc123def");

        let output = resolve(
            Resolve {
                container_id: "abc".to_owned(),
            },
            opts,
        )?;
        assert_eq!(output.container.id.as_str(), "abc123def");
        assert_eq!(output.container.paths.rootfs(), rootfs);
        assert!(!output.can_pre_dump);
        assert!(!output.dump_needs_page_server);

        let json = serde_json::to_value(&output)?;
        assert_eq!(json["container"]["id"], "abc123def");
        Ok(())
    }

    #[test]
    fn test_resolve_short_id() -> Result<()> {
        let tmp = tempfile::tempdir()?;
        let err = resolve(
            Resolve {
                container_id: "ab".to_owned(),
            },
            test_utils::opts(tmp.path()),
        )
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<libhaul::HaulError>(),
            Some(libhaul::HaulError::InvalidIdentifier(_))
        ));
        Ok(())
    }
}
