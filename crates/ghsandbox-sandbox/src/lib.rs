//! Throwaway repository sandboxes.
//!
//! A sandbox is a fresh `git clone` under a configurable parent directory
//! with a terminal opened inside it. When the terminal exits the checkout is
//! deleted, unless configured otherwise.

pub mod config;
pub mod dir;
pub mod error;
pub mod process;
pub mod repo;
pub mod sandbox;

pub use config::SandboxConfig;
pub use error::{Result, SandboxError};
pub use process::TerminalCommand;
pub use repo::{normalize_repo_url, RepoLocation};
pub use sandbox::{Sandbox, SandboxRequest};
