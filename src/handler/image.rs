//! Image handler: `image/png`, `image/jpeg`, `image/gif` by default.

use super::{Handler, HandlerOutcome, SubtypeTable};
use crate::driver::{Driver, DriverContext, DriverKind, DriverSettings};
use crate::error::Result;
use crate::result::CompressionResult;
use std::path::PathBuf;
use tracing::debug;

/// Default subtype table of the `Image` group
pub const DEFAULT_SUBTYPES: [(&str, DriverKind); 3] = [
    ("png", DriverKind::Png),
    ("gif", DriverKind::Gif),
    ("jpeg", DriverKind::Jpeg),
];

/// Owns the driver chosen for one image
#[derive(Debug, Clone)]
pub struct ImageHandler {
    subtype: String,
    driver: Driver,
}

impl ImageHandler {
    /// Pick the driver for `subtype`, or report it as unsupported
    pub fn new(
        file: impl Into<PathBuf>,
        subtype: &str,
        table: &SubtypeTable,
        settings: &DriverSettings,
    ) -> HandlerOutcome {
        let subtype = subtype.to_ascii_lowercase();
        match table.driver_for(&subtype) {
            Some(kind) => {
                debug!("image/{} handled by {} driver", subtype, kind);
                HandlerOutcome::Ready(Handler::Image(Self {
                    driver: Driver::new(kind, file, settings),
                    subtype,
                }))
            }
            None => HandlerOutcome::Unsupported { subtype },
        }
    }

    pub fn default_table() -> SubtypeTable {
        let mut table = SubtypeTable::default();
        for (subtype, kind) in DEFAULT_SUBTYPES {
            table.insert(subtype, kind);
        }
        table
    }

    pub fn subtype(&self) -> &str {
        &self.subtype
    }

    pub fn driver(&self) -> &Driver {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut Driver {
        &mut self.driver
    }

    pub async fn compress(&mut self, ctx: &DriverContext) -> Result<Option<CompressionResult>> {
        self.driver.compress(ctx).await
    }
}
