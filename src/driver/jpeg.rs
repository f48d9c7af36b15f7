//! JPEG compression through [jpegoptim](https://github.com/tjko/jpegoptim).

use super::{compress_with, CompressionDriver, DriverContext, DriverFiles, Invocation, OutputMode};
use crate::args;
use crate::error::Result;
use crate::result::CompressionResult;
use std::path::{Path, PathBuf};

pub const TOOL: &str = "jpegoptim";
pub const MIME_TYPE: &str = "image/jpeg";
pub const DEFAULT_QUALITY: u8 = 90;

const TEMPLATE_LOSSY: &str = "jpegoptim {} -m{} --strip-all";
const TEMPLATE_LOSSLESS: &str = "jpegoptim {} --strip-all";

/// Rewrites the scratch file in place, stripping all metadata.
///
/// A quality of 0 keeps jpegoptim lossless (no `-m` cap).
#[derive(Debug, Clone)]
pub struct JpegDriver {
    files: DriverFiles,
    quality: u8,
}

impl JpegDriver {
    pub fn new(file: impl Into<PathBuf>) -> Self {
        Self {
            files: DriverFiles::new(file),
            quality: DEFAULT_QUALITY,
        }
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }

    pub fn set_quality(&mut self, quality: u8) -> &mut Self {
        self.quality = quality;
        self
    }

    pub fn is_lossless(&self) -> bool {
        self.quality == 0
    }

    pub async fn compress(&mut self, ctx: &DriverContext) -> Result<Option<CompressionResult>> {
        compress_with(self, ctx).await
    }
}

impl CompressionDriver for JpegDriver {
    fn tool(&self) -> &'static str {
        TOOL
    }

    fn mime_type(&self) -> &'static str {
        MIME_TYPE
    }

    fn extension(&self) -> &'static str {
        "jpg"
    }

    fn files(&self) -> &DriverFiles {
        &self.files
    }

    fn files_mut(&mut self) -> &mut DriverFiles {
        &mut self.files
    }

    fn invocation(&self, staged: &Path) -> Invocation {
        let (template, args) = if self.is_lossless() {
            (TEMPLATE_LOSSLESS, args![staged])
        } else {
            (TEMPLATE_LOSSY, args![staged, self.quality])
        };
        Invocation {
            template,
            args,
            output: OutputMode::InPlace,
        }
    }
}
