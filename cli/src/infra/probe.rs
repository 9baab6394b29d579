//! Infrastructure implementation of the `ProgramProbe` port.

use std::path::{Path, PathBuf};
use std::process::Output;
use std::time::Duration;

use anyhow::Result;

use crate::application::ports::{CommandRunner, ProgramProbe};

/// Looks executables up with `which` and queries them through a
/// [`CommandRunner`].
pub struct SystemProbe<C> {
    runner: C,
}

impl<C: CommandRunner> SystemProbe<C> {
    pub fn new(runner: C) -> Self {
        Self { runner }
    }
}

impl<C: CommandRunner> ProgramProbe for SystemProbe<C> {
    fn find_in_path(&self, name: &str) -> Option<PathBuf> {
        which::which(name).ok()
    }

    async fn query(&self, program: &Path, args: &[&str], timeout: Duration) -> Result<Output> {
        self.runner.run_with_timeout(program, args, timeout).await
    }
}
