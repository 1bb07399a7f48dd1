use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::debug;

use crate::error::{Result, SandboxError};

/// Directory name for one sandbox: creation time in nanoseconds followed by
/// the repository path with `/` replaced by `_`.
pub fn sandbox_dir_name(repo_path: &str, unix_nanos: u128) -> String {
    format!("{unix_nanos}{}", repo_path.replace('/', "_"))
}

/// Create `base` if needed and return a fresh, not yet existing, sandbox
/// path inside it. The checkout itself creates the final directory.
pub async fn prepare_sandbox_dir(base: &Path, repo_path: &str) -> Result<PathBuf> {
    tokio::fs::create_dir_all(base)
        .await
        .map_err(|source| SandboxError::Directory {
            path: base.to_path_buf(),
            source,
        })?;

    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos())
        .unwrap_or_default();
    let path = base.join(sandbox_dir_name(repo_path, nanos));
    debug!(path = %path.display(), "sandbox path prepared");
    Ok(path)
}

/// Remove a sandbox and everything in it. A missing directory is not an error.
pub async fn remove_sandbox_dir(path: &Path) -> Result<()> {
    match tokio::fs::remove_dir_all(path).await {
        Ok(()) => {
            debug!(path = %path.display(), "sandbox removed");
            Ok(())
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(SandboxError::Directory {
            path: path.to_path_buf(),
            source,
        }),
    }
}
