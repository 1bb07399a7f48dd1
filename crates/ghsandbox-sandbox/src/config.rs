use std::path::PathBuf;

/// Directory name under the system temp dir used when none is configured.
pub const DEFAULT_SANDBOXES_DIR_NAME: &str = "ghsandbox";

/// Controls where sandboxes live and which programs populate them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SandboxConfig {
    /// Parent directory of every sandbox checkout.
    pub sandboxes_dir: PathBuf,
    /// When true, checkouts survive after the terminal exits.
    pub keep_sandbox: bool,
    /// Git executable used for cloning.
    pub git_program: String,
    /// Terminal program to run inside the sandbox instead of the platform
    /// default. It is started with the sandbox as working directory.
    pub terminal_program: Option<String>,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            sandboxes_dir: std::env::temp_dir().join(DEFAULT_SANDBOXES_DIR_NAME),
            keep_sandbox: false,
            git_program: "git".to_string(),
            terminal_program: None,
        }
    }
}
