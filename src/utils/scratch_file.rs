use rand::distributions::Alphanumeric;
use rand::Rng;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

/// A uniquely named file on disk that is removed when the guard is dropped.
///
/// Removal is best effort: a failure is logged and otherwise ignored.
#[derive(Debug)]
pub struct ScratchFile {
    path: PathBuf,
}

impl ScratchFile {
    /// Writes `bytes` to `<dir>/<prefix>_<millis>_<random>.<extension>`.
    pub async fn create(
        dir: &Path,
        prefix: &str,
        extension: &str,
        bytes: &[u8],
    ) -> std::io::Result<Self> {
        let path = dir.join(unique_name(prefix, extension));
        // Guard first so a partially written file is still removed
        let guard = Self { path };
        tokio::fs::write(&guard.path, bytes).await?;
        debug!(path = %guard.path.display(), size = bytes.len(), "Scratch file written");
        Ok(guard)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "Scratch file removed"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), "Failed to delete scratch file: {}", e),
        }
    }
}

fn unique_name(prefix: &str, extension: &str) -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(13)
        .map(|c| char::from(c).to_ascii_lowercase())
        .collect();
    format!("{}_{}_{}.{}", prefix, millis, suffix, extension)
}
