//! Container-type driver for live migration. Sequences the runtime's own
//! checkpoint/restore verbs, declares what the filesystem hauler has to
//! copy, and carries the runtime bookkeeping the destination needs to
//! resume the container.
pub mod config;
pub mod container;
pub mod delegate;
pub mod driver;
pub mod error;
pub mod fs;
pub mod host;
pub mod meta;
pub mod readiness;
pub mod tool;

pub use error::{HaulError, Result};
