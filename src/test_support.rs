//! Fake optimizer binaries for tests.
//!
//! Each fake is a small `/bin/sh` script placed in a private `bin/` directory
//! that is the runner's whole search path, so real tools installed on the
//! host never leak into a test.

use crate::driver::DriverContext;
use crate::file_manager::TempFileStore;
use crate::process::ProcessRunner;
use crate::tool_resolver::ToolPathResolver;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

pub(crate) struct FakeTools {
    root: TempDir,
}

impl FakeTools {
    pub(crate) fn new() -> Self {
        let root = TempDir::new().unwrap();
        std::fs::create_dir_all(root.path().join("bin")).unwrap();
        std::fs::create_dir_all(root.path().join("in")).unwrap();
        Self { root }
    }

    pub(crate) fn root(&self) -> &Path {
        self.root.path()
    }

    pub(crate) fn bin_dir(&self) -> PathBuf {
        self.root().join("bin")
    }

    pub(crate) fn scratch_dir(&self) -> PathBuf {
        self.root().join("scratch")
    }

    fn args_log(&self) -> PathBuf {
        self.root().join("args.log")
    }

    /// Install `name` running `body`; `$FAKE_ARGS_LOG` points at a log file
    pub(crate) fn install(&self, name: &str, body: &str) {
        let script = format!(
            "#!/bin/sh\nPATH=/usr/local/bin:/usr/bin:/bin\nFAKE_ARGS_LOG='{}'\n{}\n",
            self.args_log().display(),
            body
        );
        let path = self.bin_dir().join(name);
        std::fs::write(&path, script).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    }

    /// Write a source file of `size` non-uniform bytes
    pub(crate) fn fixture(&self, name: &str, size: usize) -> PathBuf {
        let path = self.root().join("in").join(name);
        let bytes: Vec<u8> = (0..size).map(|i| (i * 31 % 251) as u8).collect();
        std::fs::write(&path, bytes).unwrap();
        path
    }

    pub(crate) fn logged_args(&self) -> String {
        std::fs::read_to_string(self.args_log())
            .unwrap_or_default()
            .trim()
            .to_string()
    }

    pub(crate) fn runner(&self) -> ProcessRunner {
        ProcessRunner::new(
            ToolPathResolver::with_search_path(vec![self.bin_dir()]),
            Some(Duration::from_secs(10)),
        )
    }

    pub(crate) fn context(&self) -> DriverContext {
        DriverContext::new(self.runner(), TempFileStore::new(self.scratch_dir()))
    }

    /// Number of files currently in the scratch directory
    pub(crate) fn scratch_count(&self) -> usize {
        std::fs::read_dir(self.scratch_dir())
            .map(|entries| entries.count())
            .unwrap_or(0)
    }
}
