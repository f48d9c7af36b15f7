//! # Type Handlers
//!
//! A handler covers one MIME group (`Image`, ...) and maps the subtype to a
//! driver. The mapping is configuration data ([`SubtypeTable`]); the set of
//! handler and driver implementations is closed and known at compile time.
//!
//! Misconfigured tables (a driver or group name with no implementation) are
//! rejected when the [`HandlerRegistry`] is built, not at compression time.

pub mod image;

pub use self::image::ImageHandler;

use crate::driver::{DriverContext, DriverKind, DriverSettings};
use crate::error::{CompressError, Result};
use crate::mime::MimeType;
use crate::result::CompressionResult;
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use tracing::debug;

/// Subtype → driver mapping for one handler
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubtypeTable {
    drivers: HashMap<String, DriverKind>,
}

impl SubtypeTable {
    /// Resolve `subtype → driver name` pairs, failing on unknown driver names
    pub fn from_names<'a, I>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a String, &'a String)>,
    {
        let mut drivers = HashMap::new();
        for (subtype, driver) in entries {
            let kind = DriverKind::from_name(driver).ok_or_else(|| CompressError::DriverNotFound {
                subtype: subtype.clone(),
                driver: driver.clone(),
            })?;
            drivers.insert(subtype.to_ascii_lowercase(), kind);
        }
        Ok(Self { drivers })
    }

    pub fn insert(&mut self, subtype: &str, kind: DriverKind) {
        self.drivers.insert(subtype.to_ascii_lowercase(), kind);
    }

    pub fn driver_for(&self, subtype: &str) -> Option<DriverKind> {
        self.drivers.get(subtype).copied()
    }

    pub fn subtypes(&self) -> impl Iterator<Item = &str> {
        self.drivers.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.drivers.is_empty()
    }
}

/// The handler implementations this crate ships
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandlerKind {
    Image,
}

impl HandlerKind {
    /// Match a normalised group name (`Image`) to an implementation
    pub fn from_group(group: &str) -> Option<Self> {
        match group {
            "Image" => Some(HandlerKind::Image),
            _ => None,
        }
    }
}

/// A handler ready to compress one file
#[derive(Debug, Clone)]
pub enum Handler {
    Image(ImageHandler),
}

impl Handler {
    pub async fn compress(&mut self, ctx: &DriverContext) -> Result<Option<CompressionResult>> {
        match self {
            Handler::Image(handler) => handler.compress(ctx).await,
        }
    }
}

/// Result of building a handler for a subtype
#[derive(Debug, Clone)]
pub enum HandlerOutcome {
    Ready(Handler),
    /// The group is handled, this subtype is not
    Unsupported { subtype: String },
}

#[derive(Debug, Clone)]
struct RegisteredHandler {
    kind: HandlerKind,
    table: SubtypeTable,
}

/// Normalised MIME group → handler with its subtype table
#[derive(Debug, Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, RegisteredHandler>,
}

impl HandlerRegistry {
    /// Build from `group → (subtype → driver name)` configuration
    pub fn from_config(groups: &BTreeMap<String, BTreeMap<String, String>>) -> Result<Self> {
        let mut registry = Self::default();
        for (group, subtypes) in groups {
            let normalized = MimeType::normalize_group(group);
            let kind = HandlerKind::from_group(&normalized)
                .ok_or_else(|| CompressError::HandlerNotFound(group.clone()))?;
            let table = SubtypeTable::from_names(subtypes)?;
            debug!("Registered {} handler for {} subtype(s)", normalized, subtypes.len());
            registry.register(&normalized, kind, table);
        }
        Ok(registry)
    }

    pub fn register(&mut self, group: &str, kind: HandlerKind, table: SubtypeTable) {
        self.handlers
            .insert(MimeType::normalize_group(group), RegisteredHandler { kind, table });
    }

    pub fn is_registered(&self, group: &str) -> bool {
        self.handlers.contains_key(group)
    }

    pub fn groups(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    /// Build the handler for `group`, `None` when no handler is registered
    pub fn build(
        &self,
        group: &str,
        file: PathBuf,
        subtype: &str,
        settings: &DriverSettings,
    ) -> Option<HandlerOutcome> {
        let registered = self.handlers.get(group)?;
        Some(match registered.kind {
            HandlerKind::Image => ImageHandler::new(file, subtype, &registered.table, settings),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(s, d)| (s.to_string(), d.to_string()))
            .collect()
    }

    #[test]
    fn test_table_resolves_driver_names() {
        let table = SubtypeTable::from_names(&names(&[("png", "Png"), ("JPEG", "Jpeg")])).unwrap();
        assert_eq!(table.driver_for("png"), Some(DriverKind::Png));
        assert_eq!(table.driver_for("jpeg"), Some(DriverKind::Jpeg));
        assert_eq!(table.driver_for("gif"), None);
    }

    #[test]
    fn test_unknown_driver_fails_fast() {
        let err = SubtypeTable::from_names(&names(&[("webp", "Webp")])).unwrap_err();
        match err {
            CompressError::DriverNotFound { subtype, driver } => {
                assert_eq!(subtype, "webp");
                assert_eq!(driver, "Webp");
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn test_registry_rejects_unknown_group() {
        let mut groups = BTreeMap::new();
        groups.insert("video".to_string(), names(&[("mp4", "Png")]));
        let err = HandlerRegistry::from_config(&groups).unwrap_err();
        assert!(matches!(err, CompressError::HandlerNotFound(ref g) if g == "video"));
    }

    #[test]
    fn test_registry_build() {
        let mut groups = BTreeMap::new();
        groups.insert("image".to_string(), names(&[("png", "Png")]));
        let registry = HandlerRegistry::from_config(&groups).unwrap();
        let settings = DriverSettings::default();

        assert!(registry.is_registered("Image"));
        assert!(registry
            .build("Text", PathBuf::from("/a.txt"), "plain", &settings)
            .is_none());
        assert!(matches!(
            registry.build("Image", PathBuf::from("/a.png"), "png", &settings),
            Some(HandlerOutcome::Ready(Handler::Image(_)))
        ));
        assert!(matches!(
            registry.build("Image", PathBuf::from("/a.gif"), "gif", &settings),
            Some(HandlerOutcome::Unsupported { ref subtype }) if subtype == "gif"
        ));
    }
}
