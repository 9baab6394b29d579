//! Infrastructure implementation of the `ScriptWorkspace` port.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use tempfile::{Builder, TempDir, TempPath};

use crate::application::ports::ScriptWorkspace;

/// Private scratch directory backed by [`TempDir`]; removed on drop.
#[derive(Debug)]
pub struct TempScratch {
    dir: TempDir,
}

impl TempScratch {
    /// Create a fresh `rigup-*` directory under the system temp directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn new() -> Result<Self> {
        let dir = Builder::new()
            .prefix("rigup-")
            .tempdir()
            .context("cannot create scratch directory")?;
        tracing::debug!(dir = %dir.path().display(), "scratch directory created");
        Ok(Self { dir })
    }
}

impl ScriptWorkspace for TempScratch {
    type Script = TempPath;

    fn dir(&self) -> &Path {
        self.dir.path()
    }

    fn materialize(&self, stem: &str, extension: &str, content: &[u8]) -> Result<TempPath> {
        let mut file = Builder::new()
            .prefix(&format!("{stem}-"))
            .suffix(&format!(".{extension}"))
            .tempfile_in(self.dir.path())
            .with_context(|| format!("cannot create script file for {stem}"))?;
        file.write_all(content)
            .and_then(|()| file.flush())
            .with_context(|| format!("cannot write script file for {stem}"))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(file.path(), std::fs::Permissions::from_mode(0o755))
                .with_context(|| format!("cannot set permissions on {}", file.path().display()))?;
        }
        // Windows refuses to run a file with an open handle.
        Ok(file.into_temp_path())
    }

    fn cleanup(self) -> Result<()> {
        let path = self.dir.path().to_path_buf();
        self.dir
            .close()
            .with_context(|| format!("cannot remove {}", path.display()))
    }
}
