//! External process execution for optimizer drivers.
//!
//! Every driver goes through [`ProcessRunner`]: tool existence is checked via
//! [`ToolPathResolver`], arguments are escaped one by one into a fixed command
//! template, and the command runs through the platform shell with its
//! stdout, stderr and exit status captured.
//!
//! On unix the shell leads its own process group. A timeout kills the whole
//! group, so a tool the shell forked (redirections keep `sh` from exec'ing it)
//! dies with it and cannot touch the staged file afterwards.

use crate::error::{CompressError, Result};
use crate::platform::PlatformShell;
use crate::tool_resolver::ToolPathResolver;
use std::ffi::OsString;
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::debug;

/// Captured result of one external command
#[derive(Debug)]
pub struct ToolOutput {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.status.success()
    }

    pub fn code(&self) -> Option<i32> {
        self.status.code()
    }

    pub fn stderr_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stderr).trim().to_string()
    }
}

/// Runs driver command templates through the shell
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    resolver: ToolPathResolver,
    shell: PlatformShell,
    /// `None` waits for the tool forever
    timeout: Option<Duration>,
}

impl ProcessRunner {
    pub fn new(resolver: ToolPathResolver, timeout: Option<Duration>) -> Self {
        Self {
            resolver,
            shell: PlatformShell::current(),
            timeout,
        }
    }

    pub fn resolver(&self) -> &ToolPathResolver {
        &self.resolver
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Whether `name` resolves to an executable on the search path.
    ///
    /// Names outside `[A-Za-z0-9_-]` are rejected before any lookup.
    pub fn exists(&self, name: &str) -> Result<bool> {
        self.resolver.is_tool_available(name)
    }

    /// Run `template` with `args` substituted into its `{}` placeholders.
    ///
    /// A nonzero exit is not an error here: the caller knows which exit codes
    /// its tool uses to say "nothing to do".
    pub async fn run(&self, template: &str, args: &[OsString]) -> Result<ToolOutput> {
        let command_line = self.shell.render(template, args)?;
        let tool = template
            .split_whitespace()
            .next()
            .unwrap_or(template)
            .to_string();

        debug!("Running command: {}", command_line.to_string_lossy());
        let start_time = Instant::now();

        let mut command = std::process::Command::new(self.shell.program());
        command
            .arg(self.shell.command_flag())
            .arg(&command_line)
            .env("PATH", self.resolver.path_env())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }

        let child = Command::from(command).kill_on_drop(true).spawn()?;
        let group = child.id();

        let output = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, child.wait_with_output()).await {
                Ok(output) => output?,
                Err(_) => {
                    kill_group(group);
                    return Err(CompressError::Timeout { tool, limit });
                }
            },
            None => child.wait_with_output().await?,
        };

        debug!(
            "{} exited with {:?} in {:?} ({} bytes on stdout)",
            tool,
            output.status.code(),
            start_time.elapsed(),
            output.stdout.len()
        );

        Ok(ToolOutput {
            status: output.status,
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}

/// SIGKILL every process in the group led by the shell `pid`
#[cfg(unix)]
fn kill_group(pid: Option<u32>) {
    let Some(pgid) = pid.and_then(|pid| libc::pid_t::try_from(pid).ok()) else {
        return;
    };
    // SAFETY: killpg only sends a signal; an ESRCH for a group that is already gone is fine
    let rc = unsafe { libc::killpg(pgid, libc::SIGKILL) };
    if rc != 0 {
        debug!("killpg({}) failed: {}", pgid, std::io::Error::last_os_error());
    }
}

/// Without process groups `kill_on_drop` only reaches the shell
#[cfg(not(unix))]
fn kill_group(_pid: Option<u32>) {}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self::new(ToolPathResolver::new(), Some(Duration::from_secs(120)))
    }
}
