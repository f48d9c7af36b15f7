//! PNG compression through [pngquant](https://pngquant.org/).
//!
//! pngquant reads the scratch file on stdin and writes the quantized image
//! to stdout. Exit code 98 means the result would be larger than the input,
//! 99 means the quality floor could not be met: both are "nothing gained".

use super::{compress_with, CompressionDriver, DriverContext, DriverFiles, Invocation, OutputMode};
use crate::args;
use crate::error::Result;
use crate::result::CompressionResult;
use std::path::{Path, PathBuf};

pub const TOOL: &str = "pngquant";
pub const MIME_TYPE: &str = "image/png";
pub const DEFAULT_QUALITY_MIN: u8 = 45;
pub const DEFAULT_QUALITY_MAX: u8 = 65;

const TEMPLATE: &str = "pngquant --quality={}-{} - < {}";
const EXIT_SIZE_INCREASED: i32 = 98;
const EXIT_QUALITY_TOO_LOW: i32 = 99;

/// Lossy PNG quantization with a quality window
#[derive(Debug, Clone)]
pub struct PngDriver {
    files: DriverFiles,
    quality_min: u8,
    quality_max: u8,
}

impl PngDriver {
    pub fn new(file: impl Into<PathBuf>) -> Self {
        Self {
            files: DriverFiles::new(file),
            quality_min: DEFAULT_QUALITY_MIN,
            quality_max: DEFAULT_QUALITY_MAX,
        }
    }

    pub fn quality_min(&self) -> u8 {
        self.quality_min
    }

    pub fn set_quality_min(&mut self, quality_min: u8) -> &mut Self {
        self.quality_min = quality_min;
        self
    }

    pub fn quality_max(&self) -> u8 {
        self.quality_max
    }

    pub fn set_quality_max(&mut self, quality_max: u8) -> &mut Self {
        self.quality_max = quality_max;
        self
    }

    pub async fn compress(&mut self, ctx: &DriverContext) -> Result<Option<CompressionResult>> {
        compress_with(self, ctx).await
    }
}

impl CompressionDriver for PngDriver {
    fn tool(&self) -> &'static str {
        TOOL
    }

    fn mime_type(&self) -> &'static str {
        MIME_TYPE
    }

    fn extension(&self) -> &'static str {
        "png"
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
            args: args![self.quality_min, self.quality_max, staged],
            output: OutputMode::Stdout,
        }
    }

    fn is_no_gain_exit(&self, code: Option<i32>) -> bool {
        matches!(code, Some(EXIT_SIZE_INCREASED) | Some(EXIT_QUALITY_TOO_LOW))
    }
}
