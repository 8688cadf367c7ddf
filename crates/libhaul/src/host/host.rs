//! An interface trait so that the driver can run and manage external
//! processes without having to worry about how that is done
use std::any::Any;
use std::fs::File;
use std::path::Path;

use crate::host::linux::LinuxHost;
use crate::host::test::TestHelperHost;
use crate::host::Result;
use crate::tool::ToolCommand;

pub trait Host {
    fn as_any(&self) -> &dyn Any;
    /// Runs `cmd` to completion with stdout and stderr redirected to `log`
    /// and returns its exit code.
    fn run(&self, cmd: &ToolCommand, log: &File) -> Result<Option<i32>>;
    /// Starts `cmd` in the background and returns its pid without waiting.
    fn spawn_detached(&self, cmd: &ToolCommand, log: &File) -> Result<i32>;
    /// Pids of all processes running `program`, excluding the caller.
    fn find_processes(&self, program: &Path) -> Result<Vec<i32>>;
    fn kill(&self, pid: i32) -> Result<()>;
    fn probe_socket(&self, socket: &Path) -> bool;
}

#[derive(Clone, Copy, Debug)]
pub enum HostType {
    Linux,
    Test,
}

impl HostType {
    pub fn create_host(&self) -> Box<dyn Host> {
        match self {
            HostType::Linux => Box::new(LinuxHost),
            HostType::Test => Box::<TestHelperHost>::default(),
        }
    }
}
