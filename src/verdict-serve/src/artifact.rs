//! On-disk copies of uploaded images handed to the predictor.
//!
//! Every artifact gets its own UUID-named file, so concurrent requests never
//! see or overwrite each other's images. An [`Artifact`] deletes its file
//! exactly once: either through [`Artifact::release`] or when it is dropped
//! on any other exit path, including cancellation of the request future.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use log::{debug, error};
use uuid::Uuid;

use crate::error::GatewayError;

#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        ArtifactStore { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `bytes` to a fresh, request-local file and return its handle.
    pub fn persist(&self, bytes: &[u8], extension: &str) -> Result<Artifact, GatewayError> {
        let persist_err = |path: &Path| {
            let path = path.to_path_buf();
            move |source| GatewayError::Persist { path, source }
        };

        fs::create_dir_all(&self.dir).map_err(persist_err(&self.dir))?;
        let dir = fs::canonicalize(&self.dir).map_err(persist_err(&self.dir))?;

        let path = dir.join(format!("upload-{}.{}", Uuid::new_v4(), extension));
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(persist_err(&path))?;

        // From here on the guard owns the file and removes it if the write fails.
        let artifact = Artifact {
            path,
            released: false,
        };
        file.write_all(bytes)
            .map_err(persist_err(&artifact.path))?;

        debug!("Persisted {} bytes to {}", bytes.len(), artifact.path.display());
        Ok(artifact)
    }
}

/// Handle on one persisted image. Removes the file when released or dropped.
#[derive(Debug)]
pub struct Artifact {
    path: PathBuf,
    released: bool,
}

impl Artifact {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the file now. Failures are logged and otherwise ignored.
    pub fn release(mut self) {
        self.remove();
    }

    fn remove(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        match fs::remove_file(&self.path) {
            Ok(()) => debug!("Removed artifact {}", self.path.display()),
            Err(e) => error!("Error deleting artifact {}: {}", self.path.display(), e),
        }
    }
}

impl Drop for Artifact {
    fn drop(&mut self) {
        self.remove();
    }
}
