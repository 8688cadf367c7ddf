//! Typed command lines for the external checkpoint/restore tool.
use std::ffi::OsString;
use std::fmt::Display;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::container::ContainerId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolVerb {
    Checkpoint,
    Restore,
    Daemon,
}

impl ToolVerb {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolVerb::Checkpoint => "checkpoint",
            ToolVerb::Restore => "restore",
            ToolVerb::Daemon => "daemon",
        }
    }
}

impl Display for ToolVerb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// `<program> <verb> [flags...] [target]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    program: PathBuf,
    verb: ToolVerb,
    flags: Vec<OsString>,
    target: Option<String>,
}

impl ToolCommand {
    pub fn new<P: Into<PathBuf>>(program: P, verb: ToolVerb) -> Self {
        Self {
            program: program.into(),
            verb,
            flags: Vec::new(),
            target: None,
        }
    }

    pub fn with_image_dir(mut self, image_dir: &Path) -> Self {
        let mut flag = OsString::from("--image-dir=");
        flag.push(image_dir.as_os_str());
        self.flags.push(flag);
        self
    }

    pub fn with_flag<S: Into<OsString>>(mut self, flag: S) -> Self {
        self.push_flag(flag);
        self
    }

    pub fn with_target(mut self, id: &ContainerId) -> Self {
        self.target = Some(id.as_str().to_owned());
        self
    }

    /// Appends a flag after the ones already present. Used by drivers to
    /// adjust a request before it runs.
    pub fn push_flag<S: Into<OsString>>(&mut self, flag: S) -> &mut Self {
        self.flags.push(flag.into());
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn verb(&self) -> ToolVerb {
        self.verb
    }

    pub fn flags(&self) -> &[OsString] {
        &self.flags
    }

    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    pub fn args(&self) -> Vec<OsString> {
        let mut args = Vec::with_capacity(self.flags.len() + 2);
        args.push(OsString::from(self.verb.as_str()));
        args.extend(self.flags.iter().cloned());
        if let Some(target) = &self.target {
            args.push(OsString::from(target));
        }
        args
    }
}

/// What an external tool run came to. Exit code is `None` when the tool
/// was killed by a signal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolOutcome {
    pub exit_code: Option<i32>,
    pub log: PathBuf,
}

impl ToolOutcome {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}
