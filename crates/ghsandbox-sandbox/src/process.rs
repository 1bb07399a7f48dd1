//! External programs run for a sandbox: `git clone` and a terminal.
//!
//! Children never inherit this process's stdin or stdout; both carry
//! native messaging frames.

use std::ffi::OsString;
use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, info};

use crate::error::{Result, SandboxError};

/// Clone `url` into `dest` with `git` (or a substitute program).
pub async fn clone_repo(git_program: &str, url: &str, dest: &Path) -> Result<()> {
    info!(url, dest = %dest.display(), "cloning repository");
    let output = Command::new(git_program)
        .arg("clone")
        .arg("--")
        .arg(url)
        .arg(dest)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|source| SandboxError::Spawn {
            program: git_program.to_string(),
            source,
        })?;

    if !output.status.success() {
        return Err(SandboxError::CloneFailed {
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(())
}

/// A terminal invocation that blocks until the window is closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminalCommand {
    pub program: String,
    pub args: Vec<OsString>,
}

impl TerminalCommand {
    /// The command for `dir`: `program_override` if given, otherwise the
    /// platform default.
    pub fn for_dir(dir: &Path, program_override: Option<&str>) -> Result<Self> {
        if let Some(program) = program_override {
            return Ok(Self {
                program: program.to_string(),
                args: Vec::new(),
            });
        }
        Self::platform_default(dir)
    }

    #[cfg(target_os = "linux")]
    fn platform_default(dir: &Path) -> Result<Self> {
        Ok(Self {
            program: "gnome-terminal".to_string(),
            args: vec![
                "--disable-factory".into(),
                "--working-directory".into(),
                dir.as_os_str().to_os_string(),
            ],
        })
    }

    #[cfg(target_os = "macos")]
    fn platform_default(dir: &Path) -> Result<Self> {
        Ok(Self {
            program: "open".to_string(),
            args: vec![
                "-n".into(),
                "-W".into(),
                "-a".into(),
                "Terminal".into(),
                dir.as_os_str().to_os_string(),
            ],
        })
    }

    #[cfg(not(any(target_os = "linux", target_os = "macos")))]
    fn platform_default(_dir: &Path) -> Result<Self> {
        Err(SandboxError::UnsupportedPlatform(std::env::consts::OS))
    }

    /// Run the terminal inside `dir` and wait for it to exit.
    pub async fn run(&self, dir: &Path) -> Result<()> {
        debug!(program = %self.program, dir = %dir.display(), "opening terminal");
        let status = Command::new(&self.program)
            .args(&self.args)
            .current_dir(dir)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map_err(|source| SandboxError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !status.success() {
            return Err(SandboxError::TerminalFailed(status));
        }
        Ok(())
    }
}
