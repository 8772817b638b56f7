//! On-disk storage for invoice attachments.
//!
//! Files live in one flat directory outside the database, named
//! `<unix-timestamp>_<original-name>`. Two uploads of the same name within
//! one second overwrite each other.

use std::io;
use std::path::{Path, PathBuf};

use opsboard_core::upload::stored_attachment_name;

#[derive(Debug, Clone)]
pub struct AttachmentStore {
    dir: PathBuf,
}

impl AttachmentStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `bytes` and return the stored file name.
    pub async fn save(&self, original_name: &str, bytes: &[u8]) -> io::Result<String> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let name = stored_attachment_name(chrono::Utc::now().timestamp(), original_name);
        tokio::fs::write(self.dir.join(&name), bytes).await?;
        tracing::debug!(file = %name, bytes = bytes.len(), "Attachment stored");
        Ok(name)
    }

    /// Delete a stored file. A file that is already gone is not an error;
    /// other failures are logged and swallowed so the database write stands.
    pub async fn remove(&self, name: &str) {
        match tokio::fs::remove_file(self.dir.join(name)).await {
            Ok(()) => tracing::debug!(file = %name, "Attachment removed"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(file = %name, error = %e, "Failed to remove attachment"),
        }
    }
}
