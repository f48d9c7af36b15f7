//! # Tool Path Resolver
//!
//! This module finds optimizer executables on a search path:
//! - Validates tool names before anything touches the filesystem or a shell
//! - Resolves names the way `which` does, over a configurable list of directories
//! - Provides install hints for the tools the drivers depend on

use crate::error::{CompressError, Result};
use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Tools the built-in drivers and the MIME detector can use
pub const KNOWN_TOOLS: [&str; 4] = ["pngquant", "jpegoptim", "gifsicle", "file"];

/// Tool path resolver over an explicit search path
#[derive(Debug, Clone)]
pub struct ToolPathResolver {
    /// Directories searched in order, first hit wins
    search_path: Vec<PathBuf>,
}

impl ToolPathResolver {
    /// Create a resolver over the process `PATH`
    pub fn new() -> Self {
        let search_path = env::var_os("PATH")
            .map(|paths| env::split_paths(&paths).collect())
            .unwrap_or_default();

        Self { search_path }
    }

    /// Create a resolver over an explicit list of directories
    pub fn with_search_path(search_path: Vec<PathBuf>) -> Self {
        Self { search_path }
    }

    pub fn search_path(&self) -> &[PathBuf] {
        &self.search_path
    }

    /// The search path joined for use as the `PATH` of child processes
    pub fn path_env(&self) -> OsString {
        env::join_paths(&self.search_path).unwrap_or_default()
    }

    /// Check that a tool name only contains letters, digits, `-` and `_`
    pub fn is_valid_command_name(name: &str) -> bool {
        !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    }

    /// Resolve the path to a specific tool.
    ///
    /// Fails with [`CompressError::InvalidCommandName`] on a name that could
    /// smuggle shell syntax; a valid but missing tool is `Ok(None)`.
    pub fn resolve_tool(&self, tool_name: &str) -> Result<Option<PathBuf>> {
        if !Self::is_valid_command_name(tool_name) {
            return Err(CompressError::InvalidCommandName(tool_name.to_string()));
        }

        let extension = if cfg!(windows) { ".exe" } else { "" };
        let tool_with_ext = format!("{}{}", tool_name, extension);

        let found = self
            .search_path
            .iter()
            .map(|dir| dir.join(&tool_with_ext))
            .find(|path| is_executable(path));

        debug!("Resolved tool {} -> {:?}", tool_name, found);
        Ok(found)
    }

    /// Check if a specific tool is available
    pub fn is_tool_available(&self, tool_name: &str) -> Result<bool> {
        Ok(self.resolve_tool(tool_name)?.is_some())
    }

    /// Get all available tools among [`KNOWN_TOOLS`]
    pub fn get_available_tools(&self) -> Vec<String> {
        KNOWN_TOOLS
            .iter()
            .filter(|tool| matches!(self.is_tool_available(tool), Ok(true)))
            .map(|tool| tool.to_string())
            .collect()
    }

    /// Get installation instructions for a tool on Linux
    pub fn get_linux_install_instructions(tool_name: &str) -> String {
        match tool_name {
            "pngquant" => "sudo apt-get install pngquant".to_string(),
            "jpegoptim" => "sudo apt-get install jpegoptim".to_string(),
            "gifsicle" => "sudo apt-get install gifsicle".to_string(),
            "file" => "sudo apt-get install file".to_string(),
            _ => format!("sudo apt-get install {}", tool_name),
        }
    }
}

impl Default for ToolPathResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    path.metadata()
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
