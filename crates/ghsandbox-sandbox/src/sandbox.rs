use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::SandboxConfig;
use crate::dir::{prepare_sandbox_dir, remove_sandbox_dir};
use crate::error::Result;
use crate::process::{clone_repo, TerminalCommand};
use crate::repo::normalize_repo_url;

/// Payload of a `sandbox` request from the extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SandboxRequest {
    pub url: String,
}

/// Clones repositories into throwaway directories and opens terminals there.
#[derive(Debug, Clone, Default)]
pub struct Sandbox {
    config: SandboxConfig,
}

impl Sandbox {
    pub fn new(config: SandboxConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SandboxConfig {
        &self.config
    }

    /// Clone the requested repository, open a terminal in it and wait for
    /// the terminal to exit.
    ///
    /// Unless `keep_sandbox` is set, the checkout is removed afterwards
    /// whether or not the clone or terminal succeeded. Returns the sandbox
    /// path.
    pub async fn open(&self, request: &SandboxRequest) -> Result<PathBuf> {
        let location = normalize_repo_url(&request.url)?;
        let path = prepare_sandbox_dir(&self.config.sandboxes_dir, &location.path).await?;

        let result = self.populate_and_attach(&location.clone_url, &path).await;

        if self.config.keep_sandbox {
            info!(path = %path.display(), "keeping sandbox");
        } else if let Err(err) = remove_sandbox_dir(&path).await {
            warn!(error = %err, "failed to remove sandbox directory");
        }

        result.map(|()| path)
    }

    async fn populate_and_attach(&self, clone_url: &str, path: &std::path::Path) -> Result<()> {
        // Resolve the terminal first so an unsupported platform never clones.
        let terminal =
            TerminalCommand::for_dir(path, self.config.terminal_program.as_deref())?;
        clone_repo(&self.config.git_program, clone_url, path).await?;
        terminal.run(path).await
    }
}
