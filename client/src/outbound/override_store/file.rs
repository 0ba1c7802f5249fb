//! File-backed status override store.
//!
//! The map lives in `<state_dir>/applicationStatuses.json`. Saves write a
//! hidden temporary file in the same directory and rename it over the
//! target, so readers never observe a partial document.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use cap_std::ambient_authority;
use cap_std::fs::Dir;
use tracing::debug;

use crate::domain::StatusOverrides;
use crate::domain::ports::{STATUS_OVERRIDES_KEY, StatusOverrideStore, StatusOverrideStoreError};

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Override store persisting the map as one JSON document.
#[derive(Debug, Clone)]
pub struct FileStatusOverrideStore {
    state_dir: PathBuf,
}

impl FileStatusOverrideStore {
    /// Store rooted at `state_dir`. The directory is created on first save.
    pub fn new(state_dir: impl Into<PathBuf>) -> Self {
        Self {
            state_dir: state_dir.into(),
        }
    }

    /// Full path of the override document.
    pub fn path(&self) -> PathBuf {
        self.state_dir.join(file_name())
    }
}

#[async_trait]
impl StatusOverrideStore for FileStatusOverrideStore {
    async fn load(&self) -> Result<StatusOverrides, StatusOverrideStoreError> {
        let state_dir = self.state_dir.clone();
        tokio::task::spawn_blocking(move || read_overrides(&state_dir))
            .await
            .map_err(|error| StatusOverrideStoreError::io(error.to_string()))?
    }

    async fn save(&self, overrides: &StatusOverrides) -> Result<(), StatusOverrideStoreError> {
        let contents = overrides
            .to_json()
            .map_err(|error| StatusOverrideStoreError::serialization(error.to_string()))?;
        let state_dir = self.state_dir.clone();
        tokio::task::spawn_blocking(move || write_overrides(&state_dir, &contents))
            .await
            .map_err(|error| StatusOverrideStoreError::io(error.to_string()))?
    }
}

fn file_name() -> String {
    format!("{STATUS_OVERRIDES_KEY}.json")
}

fn io_error(path: &Path, error: &io::Error) -> StatusOverrideStoreError {
    StatusOverrideStoreError::io(format!("{}: {error}", path.display()))
}

fn read_overrides(state_dir: &Path) -> Result<StatusOverrides, StatusOverrideStoreError> {
    let dir = match Dir::open_ambient_dir(state_dir, ambient_authority()) {
        Ok(dir) => dir,
        Err(error) if error.kind() == io::ErrorKind::NotFound => {
            debug!(path = %state_dir.display(), "state directory absent; no overrides");
            return Ok(StatusOverrides::new());
        }
        Err(error) => return Err(io_error(state_dir, &error)),
    };
    let name = file_name();
    let raw = match dir.read_to_string(&name) {
        Ok(raw) => raw,
        Err(error) if error.kind() == io::ErrorKind::NotFound => {
            return Ok(StatusOverrides::new());
        }
        Err(error) => return Err(io_error(&state_dir.join(&name), &error)),
    };
    StatusOverrides::from_json(&raw)
        .map_err(|error| StatusOverrideStoreError::serialization(error.to_string()))
}

fn write_overrides(state_dir: &Path, contents: &str) -> Result<(), StatusOverrideStoreError> {
    Dir::create_ambient_dir_all(state_dir, ambient_authority())
        .map_err(|error| io_error(state_dir, &error))?;
    let dir = Dir::open_ambient_dir(state_dir, ambient_authority())
        .map_err(|error| io_error(state_dir, &error))?;

    let name = file_name();
    let tmp_name = format!(
        ".{name}.tmp.{}.{}",
        std::process::id(),
        TEMP_COUNTER.fetch_add(1, Ordering::Relaxed)
    );
    if let Err(error) = dir.write(&tmp_name, contents.as_bytes()) {
        drop(dir.remove_file(&tmp_name));
        return Err(io_error(&state_dir.join(&tmp_name), &error));
    }
    if let Err(error) = dir.rename(&tmp_name, &dir, &name) {
        drop(dir.remove_file(&tmp_name));
        return Err(io_error(&state_dir.join(&name), &error));
    }
    Ok(())
}
