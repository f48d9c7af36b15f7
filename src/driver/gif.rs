//! GIF compression through [gifsicle](http://www.lcdf.org/gifsicle/).

use super::{compress_with, CompressionDriver, DriverContext, DriverFiles, Invocation, OutputMode};
use crate::args;
use crate::error::Result;
use crate::result::CompressionResult;
use std::path::{Path, PathBuf};

pub const TOOL: &str = "gifsicle";
pub const MIME_TYPE: &str = "image/gif";

const TEMPLATE: &str = "gifsicle -O2 {} -o -";

/// `gifsicle -O2`, no tunables
#[derive(Debug, Clone)]
pub struct GifDriver {
    files: DriverFiles,
}

impl GifDriver {
    pub fn new(file: impl Into<PathBuf>) -> Self {
        Self {
            files: DriverFiles::new(file),
        }
    }

    pub async fn compress(&mut self, ctx: &DriverContext) -> Result<Option<CompressionResult>> {
        compress_with(self, ctx).await
    }
}

impl CompressionDriver for GifDriver {
    fn tool(&self) -> &'static str {
        TOOL
    }

    fn mime_type(&self) -> &'static str {
        MIME_TYPE
    }

    fn extension(&self) -> &'static str {
        "gif"
    }

    fn files(&self) -> &DriverFiles {
        &self.files
    }

    fn files_mut(&mut self) -> &mut DriverFiles {
        &mut self.files
    }

    fn invocation(&self, staged: &Path) -> Invocation {
        Invocation {
            template: TEMPLATE,
            args: args![staged],
            output: OutputMode::Stdout,
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::error::CompressError;
    use crate::test_support::FakeTools;

    #[tokio::test]
    async fn test_gif_same_size_is_no_result() {
        let tools = FakeTools::new();
        tools.install("gifsicle", "cat \"$2\"");
        let source = tools.fixture("anim.gif", 4_096);

        let result = GifDriver::new(&source).compress(&tools.context()).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_gif_growth_is_no_result() {
        let tools = FakeTools::new();
        tools.install("gifsicle", "cat \"$2\" \"$2\"");
        let source = tools.fixture("anim.gif", 1_000);

        let result = GifDriver::new(&source).compress(&tools.context()).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_gif_shrinks() {
        let tools = FakeTools::new();
        tools.install("gifsicle", "echo \"$@\" > \"$FAKE_ARGS_LOG\"\nhead -c 999 \"$2\"");
        let source = tools.fixture("anim.gif", 1_000);

        let result = GifDriver::new(&source)
            .compress(&tools.context())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(result.mime_type, "image/gif");
        assert_eq!(result.compressed_size, 999);
        assert_eq!(result.savings, 0);
        assert!(tools.logged_args().starts_with("-O2 "));
        assert!(tools.logged_args().ends_with(" -o -"));
    }

    #[tokio::test]
    async fn test_gif_failure_exit_is_error() {
        let tools = FakeTools::new();
        tools.install("gifsicle", "echo 'not a GIF' >&2\nexit 1");
        let source = tools.fixture("anim.gif", 1_000);

        let err = GifDriver::new(&source).compress(&tools.context()).await.unwrap_err();
        assert!(matches!(err, CompressError::ToolFailed { code: Some(1), .. }));
    }

    #[tokio::test]
    async fn test_gif_non_utf8_paths() {
        use crate::driver::DriverContext;
        use crate::file_manager::TempFileStore;
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let tools = FakeTools::new();
        tools.install("gifsicle", "head -c 10 \"$2\"");
        let source = tools.root().join("in").join(OsStr::from_bytes(b"anim\xff.gif"));
        std::fs::write(&source, vec![7u8; 40]).unwrap();
        let scratch = tools.root().join(OsStr::from_bytes(b"scratch\xfe"));
        let ctx = DriverContext::new(tools.runner(), TempFileStore::new(&scratch));

        let result = GifDriver::new(&source).compress(&ctx).await.unwrap().unwrap();
        assert_eq!(result.compressed_size, 10);
        assert!(result.path.starts_with(&scratch));
    }
}
