//! # Compression Drivers
//!
//! A driver wraps exactly one external optimizer. All drivers share the same
//! pipeline ([`compress_with`]):
//!
//! 1. **Tool check**: the optimizer must resolve on the search path, otherwise
//!    the call is a no-op (`Ok(None)`) and no scratch file is created
//! 2. **Staging**: the source is copied into a fresh scratch file; its size is
//!    the baseline
//! 3. **Invocation**: the driver's fixed template runs against the scratch file.
//!    Tools writing to stdout have their output written over the scratch file,
//!    in-place tools rewrite it themselves
//! 4. **Verification**: the scratch file is re-stat'ed; only a strictly smaller
//!    file is reported as a [`CompressionResult`]
//!
//! | Driver | Tool | Tunables | Output |
//! |--------|------|----------|--------|
//! | [`PngDriver`]  | pngquant  | quality 45-65 | stdout |
//! | [`JpegDriver`] | jpegoptim | quality 90 (0 = lossless) | in place |
//! | [`GifDriver`]  | gifsicle  | - | stdout |

pub mod gif;
pub mod jpeg;
pub mod png;

pub use gif::GifDriver;
pub use jpeg::JpegDriver;
pub use png::PngDriver;

use crate::error::{CompressError, Result};
use crate::file_manager::{format_size, StagedFile, TempFileStore};
use crate::process::ProcessRunner;
use crate::result::CompressionResult;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Collaborators shared by every driver in one call
#[derive(Debug, Clone, Default)]
pub struct DriverContext {
    pub runner: ProcessRunner,
    pub store: TempFileStore,
}

impl DriverContext {
    pub fn new(runner: ProcessRunner, store: TempFileStore) -> Self {
        Self { runner, store }
    }
}

/// The closed set of drivers this crate ships
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DriverKind {
    Png,
    Jpeg,
    Gif,
}

impl DriverKind {
    pub const ALL: [DriverKind; 3] = [DriverKind::Png, DriverKind::Jpeg, DriverKind::Gif];

    /// Look a driver up by its registry name (case-insensitive)
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(name))
    }

    pub fn name(&self) -> &'static str {
        match self {
            DriverKind::Png => "Png",
            DriverKind::Jpeg => "Jpeg",
            DriverKind::Gif => "Gif",
        }
    }

    pub fn tool(&self) -> &'static str {
        match self {
            DriverKind::Png => png::TOOL,
            DriverKind::Jpeg => jpeg::TOOL,
            DriverKind::Gif => gif::TOOL,
        }
    }
}

impl fmt::Display for DriverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Tunables applied to newly built drivers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverSettings {
    pub png_quality_min: u8,
    pub png_quality_max: u8,
    pub jpeg_quality: u8,
}

impl Default for DriverSettings {
    fn default() -> Self {
        Self {
            png_quality_min: png::DEFAULT_QUALITY_MIN,
            png_quality_max: png::DEFAULT_QUALITY_MAX,
            jpeg_quality: jpeg::DEFAULT_QUALITY,
        }
    }
}

/// How the tool delivers its result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Compressed bytes arrive on stdout and replace the scratch file
    Stdout,
    /// The tool rewrites the scratch file itself
    InPlace,
}

/// A fully prepared tool invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub template: &'static str,
    pub args: Vec<OsString>,
    pub output: OutputMode,
}

/// Files owned by a driver instance
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DriverFiles {
    file: PathBuf,
    temp_dir: Option<PathBuf>,
    original_size: Option<u64>,
    temp_file: Option<PathBuf>,
}

impl DriverFiles {
    pub fn new(file: impl Into<PathBuf>) -> Self {
        Self {
            file: file.into(),
            ..Default::default()
        }
    }

    fn record_staged(&mut self, staged: &StagedFile) {
        self.original_size = Some(staged.size);
        self.temp_file = Some(staged.path.clone());
    }
}

/// Capability shared by every optimizer wrapper.
///
/// Implementors describe their tool; [`compress_with`] runs the pipeline.
pub trait CompressionDriver {
    /// Executable name, looked up on the search path
    fn tool(&self) -> &'static str;

    /// MIME type reported in results
    fn mime_type(&self) -> &'static str;

    /// Scratch file extension (without the dot)
    fn extension(&self) -> &'static str;

    fn files(&self) -> &DriverFiles;

    fn files_mut(&mut self) -> &mut DriverFiles;

    /// Build the command for a staged scratch file
    fn invocation(&self, staged: &Path) -> Invocation;

    /// Exit codes the tool uses for "ran fine, nothing gained"
    fn is_no_gain_exit(&self, _code: Option<i32>) -> bool {
        false
    }

    fn file(&self) -> &Path {
        &self.files().file
    }

    /// Point the driver at another source; forgets the previous staging
    fn set_file(&mut self, file: PathBuf) -> &mut Self
    where
        Self: Sized,
    {
        let files = self.files_mut();
        files.file = file;
        files.original_size = None;
        files.temp_file = None;
        self
    }

    /// Scratch directory override, `None` uses the context's store
    fn temp_dir(&self) -> Option<&Path> {
        self.files().temp_dir.as_deref()
    }

    fn set_temp_dir(&mut self, dir: Option<PathBuf>) -> &mut Self
    where
        Self: Sized,
    {
        self.files_mut().temp_dir = dir;
        self
    }

    /// Size of the staged copy, known once `compress` has staged the source
    fn original_size(&self) -> Option<u64> {
        self.files().original_size
    }

    /// Scratch file of the last `compress` call
    fn temp_file(&self) -> Option<&Path> {
        self.files().temp_file.as_deref()
    }
}

/// Run the shared stage / invoke / verify pipeline for `driver`
pub async fn compress_with<D: CompressionDriver>(
    driver: &mut D,
    ctx: &DriverContext,
) -> Result<Option<CompressionResult>> {
    let tool = driver.tool();
    if !ctx.runner.exists(tool)? {
        debug!("{} is not installed, skipping {}", tool, driver.file().display());
        return Ok(None);
    }

    let store = match driver.temp_dir() {
        Some(dir) => TempFileStore::new(dir),
        None => ctx.store.clone(),
    };
    let staged = store.stage(driver.file(), driver.extension()).await?;
    driver.files_mut().record_staged(&staged);

    let invocation = driver.invocation(&staged.path);
    let output = ctx.runner.run(invocation.template, &invocation.args).await?;

    if !output.success() {
        if driver.is_no_gain_exit(output.code()) {
            debug!("{} found nothing to gain (exit {:?})", tool, output.code());
            return Ok(None);
        }
        return Err(CompressError::ToolFailed {
            tool: tool.to_string(),
            code: output.code(),
            stderr: output.stderr_lossy(),
        });
    }

    if invocation.output == OutputMode::Stdout {
        if output.stdout.is_empty() {
            debug!("{} produced no output", tool);
            return Ok(None);
        }
        store.replace_contents(&staged.path, &output.stdout).await?;
    }

    let Some(compressed_size) = store.current_size(&staged.path).await? else {
        debug!("{} left no file at {}", tool, staged.path.display());
        return Ok(None);
    };

    if compressed_size >= staged.size {
        debug!(
            "{} did not shrink {} ({} -> {})",
            tool,
            driver.file().display(),
            format_size(staged.size),
            format_size(compressed_size)
        );
        return Ok(None);
    }

    let result = CompressionResult::new(staged.path, driver.mime_type(), staged.size, compressed_size);
    info!(
        "Compressed {} with {}: {} -> {} ({})",
        driver.file().display(),
        tool,
        format_size(result.original_size),
        format_size(result.compressed_size),
        result.savings_label()
    );
    Ok(Some(result))
}

/// A driver chosen at runtime from the closed [`DriverKind`] set
#[derive(Debug, Clone)]
pub enum Driver {
    Png(PngDriver),
    Jpeg(JpegDriver),
    Gif(GifDriver),
}

impl Driver {
    pub fn new(kind: DriverKind, file: impl Into<PathBuf>, settings: &DriverSettings) -> Self {
        match kind {
            DriverKind::Png => {
                let mut driver = PngDriver::new(file);
                driver
                    .set_quality_min(settings.png_quality_min)
                    .set_quality_max(settings.png_quality_max);
                Driver::Png(driver)
            }
            DriverKind::Jpeg => {
                let mut driver = JpegDriver::new(file);
                driver.set_quality(settings.jpeg_quality);
                Driver::Jpeg(driver)
            }
            DriverKind::Gif => Driver::Gif(GifDriver::new(file)),
        }
    }

    pub fn kind(&self) -> DriverKind {
        match self {
            Driver::Png(_) => DriverKind::Png,
            Driver::Jpeg(_) => DriverKind::Jpeg,
            Driver::Gif(_) => DriverKind::Gif,
        }
    }

    pub async fn compress(&mut self, ctx: &DriverContext) -> Result<Option<CompressionResult>> {
        match self {
            Driver::Png(driver) => driver.compress(ctx).await,
            Driver::Jpeg(driver) => driver.compress(ctx).await,
            Driver::Gif(driver) => driver.compress(ctx).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_driver_kind_names() {
        assert_eq!(DriverKind::from_name("Png"), Some(DriverKind::Png));
        assert_eq!(DriverKind::from_name("jpeg"), Some(DriverKind::Jpeg));
        assert_eq!(DriverKind::from_name("GIF"), Some(DriverKind::Gif));
        assert_eq!(DriverKind::from_name("Webp"), None);
        assert_eq!(DriverKind::Jpeg.tool(), "jpegoptim");
    }

    #[test]
    fn test_driver_new_applies_settings() {
        let settings = DriverSettings {
            png_quality_min: 10,
            png_quality_max: 20,
            jpeg_quality: 0,
        };
        match Driver::new(DriverKind::Png, "/in.png", &settings) {
            Driver::Png(png) => {
                assert_eq!(png.quality_min(), 10);
                assert_eq!(png.quality_max(), 20);
            }
            other => panic!("unexpected driver {:?}", other.kind()),
        }
        match Driver::new(DriverKind::Jpeg, "/in.jpg", &settings) {
            Driver::Jpeg(jpeg) => assert_eq!(jpeg.quality(), 0),
            other => panic!("unexpected driver {:?}", other.kind()),
        }
    }

    #[test]
    fn test_set_file_forgets_staging() {
        let mut driver = GifDriver::new("/a.gif");
        driver.files_mut().record_staged(&StagedFile {
            path: PathBuf::from("/scratch/x.gif"),
            size: 10,
        });
        assert_eq!(driver.original_size(), Some(10));

        driver.set_file(PathBuf::from("/b.gif"));
        assert_eq!(driver.file(), Path::new("/b.gif"));
        assert_eq!(driver.original_size(), None);
        assert_eq!(driver.temp_file(), None);
    }
}
