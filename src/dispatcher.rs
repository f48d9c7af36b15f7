//! # Compressor
//!
//! Public entry point: detect or validate the MIME type, resolve its group to
//! a handler, delegate.
//!
//! ## Outcomes
//!
//! | Situation | Return |
//! |-----------|--------|
//! | Verified size reduction | `Ok(Some(result))` |
//! | Group without handler (`text/plain`, `text`) | `Ok(None)` |
//! | Subtype without driver (`image/webp`) | `Ok(None)` |
//! | Tool missing, no gain, no output | `Ok(None)` |
//! | Malformed MIME (`image`, `""`, `/png`) | `Err(InvalidMimeType)` |
//! | Detection failed | `Err(Detection)` |
//! | Tool crashed / timed out | `Err(ToolFailed)` / `Err(Timeout)` |
//!
//! The group is looked up before the subtype is checked, so a bare `text`
//! is simply unsupported while a bare `image` is malformed.

use crate::config::Config;
use crate::driver::{DriverContext, DriverSettings};
use crate::error::{CompressError, Result};
use crate::handler::{HandlerOutcome, HandlerRegistry};
use crate::mime::{MagicMimeDetector, MimeDetector, MimeType};
use crate::process::ProcessRunner;
use crate::result::{CompressionRequest, CompressionResult};
use std::path::Path;
use tracing::debug;

/// Stateless dispatcher; every call is independent
#[derive(Debug, Clone)]
pub struct Compressor<D = MagicMimeDetector> {
    registry: HandlerRegistry,
    settings: DriverSettings,
    ctx: DriverContext,
    detector: D,
}

impl Compressor<MagicMimeDetector> {
    /// Build a compressor that sniffs MIME types itself
    pub fn new(config: Config) -> Result<Self> {
        let runner = ProcessRunner::new(config.resolver(), config.timeout());
        let detector = MagicMimeDetector::new(runner.clone());
        Self::assemble(config, runner, detector)
    }
}

impl<D: MimeDetector> Compressor<D> {
    /// Build a compressor with a custom MIME detection collaborator
    pub fn with_detector(config: Config, detector: D) -> Result<Self> {
        let runner = ProcessRunner::new(config.resolver(), config.timeout());
        Self::assemble(config, runner, detector)
    }

    fn assemble(config: Config, runner: ProcessRunner, detector: D) -> Result<Self> {
        config.validate()?;
        let registry = HandlerRegistry::from_config(&config.handlers)?;

        Ok(Self {
            registry,
            settings: config.driver_settings(),
            ctx: DriverContext::new(runner, config.temp_store()),
            detector,
        })
    }

    pub fn detector(&self) -> &D {
        &self.detector
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    pub fn context(&self) -> &DriverContext {
        &self.ctx
    }

    /// Compress one file.
    ///
    /// `mime_type` is detected when absent. On success the result's `path`
    /// is a scratch file now owned by the caller.
    pub async fn compress(
        &self,
        path: impl AsRef<Path>,
        mime_type: Option<&str>,
    ) -> Result<Option<CompressionResult>> {
        let path = path.as_ref();
        let raw = match mime_type {
            Some(declared) => declared.to_string(),
            None => self.detector.detect(path).await?,
        };

        let (group, subtype) = MimeType::split(&raw)?;
        if !self.registry.is_registered(&group) {
            debug!("No handler for MIME group {} ({})", group, raw);
            return Ok(None);
        }
        let subtype = subtype.ok_or_else(|| CompressError::InvalidMimeType(raw.clone()))?;

        match self
            .registry
            .build(&group, path.to_path_buf(), &subtype, &self.settings)
        {
            Some(HandlerOutcome::Ready(mut handler)) => handler.compress(&self.ctx).await,
            Some(HandlerOutcome::Unsupported { subtype }) => {
                debug!("{} handler has no driver for subtype {}", group, subtype);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    pub async fn compress_request(&self, request: CompressionRequest) -> Result<Option<CompressionResult>> {
        self.compress(request.path(), request.mime_type()).await
    }

    /// Blocking variant for callers without a tokio runtime.
    ///
    /// Must not be called from inside an async context.
    pub fn compress_blocking(
        &self,
        path: impl AsRef<Path>,
        mime_type: Option<&str>,
    ) -> Result<Option<CompressionResult>> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        runtime.block_on(self.compress(path, mime_type))
    }

    /// Optimizer tools found on the configured search path
    pub fn available_tools(&self) -> Vec<String> {
        self.ctx.runner.resolver().get_available_tools()
    }
}
