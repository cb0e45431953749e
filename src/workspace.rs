//! Per-render temporary storage
//!
//! A [`Workspace`] is a temporary directory owned by exactly one render. The
//! composed document is written into it and handed to the browser as a
//! `file://` URL. The directory goes away when the workspace is closed or
//! dropped, so early returns and panics release it too.

use crate::document::ComposedDocument;
use crate::error::CleanupWarning;
use crate::{Error, Result};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use url::Url;

/// File name of the composed document inside the workspace.
pub const DOCUMENT_FILE: &str = "doc.html";

const PREFIX: &str = "nirnay-";

pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    /// Create a workspace under the system temp directory.
    pub fn create() -> Result<Self> {
        let dir = tempfile::Builder::new().prefix(PREFIX).tempdir()?;
        log::debug!("Created render workspace {}", dir.path().display());
        Ok(Self { dir })
    }

    /// Create a workspace under `root` instead of the system temp directory.
    pub fn create_in(root: impl AsRef<Path>) -> Result<Self> {
        let dir = tempfile::Builder::new().prefix(PREFIX).tempdir_in(root)?;
        log::debug!("Created render workspace {}", dir.path().display());
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write the document and return the URL the engine should load.
    pub fn write_document(&self, doc: &ComposedDocument) -> Result<String> {
        let path: PathBuf = self.dir.path().join(DOCUMENT_FILE);
        std::fs::write(&path, doc.html())?;

        let url = Url::from_file_path(&path)
            .map_err(|_| Error::ConfigError(format!("Cannot address {} as a file URL", path.display())))?;
        Ok(url.into())
    }

    /// Remove the directory, reporting a warning instead of failing.
    pub fn close(self) -> Option<CleanupWarning> {
        let path = self.dir.path().to_path_buf();
        match self.dir.close() {
            Ok(()) => {
                log::debug!("Removed render workspace {}", path.display());
                None
            }
            Err(e) => Some(CleanupWarning::new("workspace", format!("{}: {}", path.display(), e))),
        }
    }
}
