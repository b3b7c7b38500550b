use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Owns a task's uploaded source file and removes it when dropped, on
/// success, failure and unwinding alike.
pub struct SourceArtifact {
    path: Option<PathBuf>,
}

impl SourceArtifact {
    pub fn new(path: PathBuf) -> Self {
        Self { path: Some(path) }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Remove the file now. Later calls and the drop do nothing.
    pub fn remove(&mut self) -> bool {
        match self.path.take() {
            Some(path) => remove_source_file(&path),
            None => false,
        }
    }
}

impl Drop for SourceArtifact {
    fn drop(&mut self) {
        self.remove();
    }
}

/// Delete an uploaded file. A file that is already gone is not an error.
/// Returns whether a file was removed.
pub fn remove_source_file(path: &Path) -> bool {
    match std::fs::remove_file(path) {
        Ok(()) => {
            tracing::debug!(path = %path.display(), "Removed source file");
            true
        }
        Err(e) if e.kind() == ErrorKind::NotFound => false,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to remove source file");
            false
        }
    }
}

/// Remove files left in the upload directory by a previous run. Tasks do
/// not outlive the process, so nothing there is still owned.
pub fn cleanup_orphaned_uploads(upload_dir: &Path) -> usize {
    let entries = match std::fs::read_dir(upload_dir) {
        Ok(e) => e,
        Err(_) => return 0, // Upload dir may not exist yet
    };

    let cleaned = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| remove_source_file(path))
        .count();

    if cleaned > 0 {
        tracing::info!(
            files_cleaned = cleaned,
            "Cleaned orphaned uploads from previous session"
        );
    }
    cleaned
}
