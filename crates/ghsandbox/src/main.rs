mod dispatch;
mod exit;
mod logging;

use std::path::PathBuf;

use clap::Parser;
use ghsandbox_frame::{FrameConfig, DEFAULT_MAX_INBOUND};
use ghsandbox_sandbox::SandboxConfig;
use tracing::info;

use crate::exit::{io_error, CliError, CliResult, SUCCESS, USAGE};
use crate::logging::{init_logging, LogFormat, LogLevel};

#[derive(Parser, Debug)]
#[command(
    name = "ghsandbox",
    version,
    about = "Native messaging host that opens repositories in throwaway sandboxes"
)]
struct Cli {
    /// Caller identification passed by the browser (extension origin, or
    /// manifest path and extension id).
    #[arg(value_name = "CALLER")]
    caller: Vec<String>,

    /// Native window handle of the calling browser (Windows only).
    #[arg(long, hide = true, allow_hyphen_values = true)]
    parent_window: Option<String>,

    /// Directory that holds sandboxes.
    #[arg(long, value_name = "DIR", env = "GHSANDBOX_DIR")]
    sandboxes_dir: Option<PathBuf>,

    /// Keep the checkout after the terminal exits.
    #[arg(long)]
    keep_sandbox: bool,

    /// Terminal program to run inside the sandbox instead of the platform default.
    #[arg(long, value_name = "PROGRAM", env = "GHSANDBOX_TERMINAL")]
    terminal: Option<String>,

    /// Program used to clone repositories.
    #[arg(long, value_name = "PROGRAM", env = "GHSANDBOX_GIT", default_value = "git")]
    git: String,

    /// Largest accepted inbound message, in bytes.
    #[arg(long, value_name = "BYTES", default_value_t = DEFAULT_MAX_INBOUND)]
    max_message_size: usize,

    /// Log output format.
    #[arg(long, value_name = "FORMAT", default_value = "text")]
    log_format: LogFormat,

    /// Minimum log level.
    #[arg(long, value_name = "LEVEL", default_value = "info")]
    log_level: LogLevel,

    /// Append logs to this file instead of stderr.
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,
}

impl Cli {
    fn sandbox_config(&self) -> SandboxConfig {
        let defaults = SandboxConfig::default();
        SandboxConfig {
            sandboxes_dir: self
                .sandboxes_dir
                .clone()
                .unwrap_or(defaults.sandboxes_dir),
            keep_sandbox: self.keep_sandbox,
            git_program: self.git.clone(),
            terminal_program: self.terminal.clone(),
        }
    }

    fn frame_config(&self) -> FrameConfig {
        FrameConfig {
            max_payload_size: self.max_message_size,
        }
    }
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let code = if err.use_stderr() { USAGE } else { SUCCESS };
            let _ = err.print();
            std::process::exit(code);
        }
    };

    match run(cli) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

fn run(cli: Cli) -> CliResult<i32> {
    init_logging(cli.log_format, cli.log_level, cli.log_file.as_deref())?;

    let sandbox = cli.sandbox_config();
    info!(
        version = env!("CARGO_PKG_VERSION"),
        target = option_env!("GHSANDBOX_BUILD_TARGET").unwrap_or("unknown"),
        caller = ?cli.caller,
        parent_window = cli.parent_window.as_deref(),
        sandboxes_dir = %sandbox.sandboxes_dir.display(),
        "native host starting"
    );

    if cli.max_message_size == 0 {
        return Err(CliError::new(USAGE, "--max-message-size must be positive"));
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| io_error("cannot start runtime", err))?;
    runtime.block_on(dispatch::serve(sandbox, cli.frame_config()))
}
