//! Request and result records exchanged with callers.

use crate::file_manager::calculate_savings;
use serde::{Serialize, Serializer};
use std::fmt;
use std::path::{Path, PathBuf};

/// One compression call: a file and, optionally, its declared MIME type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressionRequest {
    path: PathBuf,
    mime_type: Option<String>,
}

impl CompressionRequest {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            mime_type: None,
        }
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn mime_type(&self) -> Option<&str> {
        self.mime_type.as_deref()
    }
}

/// A verified size reduction.
///
/// `path` is the scratch file holding the compressed bytes; the caller owns
/// it from here on and is responsible for deleting it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompressionResult {
    pub path: PathBuf,
    #[serde(rename = "mimeType")]
    pub mime_type: String,
    #[serde(rename = "originalSize")]
    pub original_size: u64,
    #[serde(rename = "compressedSize")]
    pub compressed_size: u64,
    /// Whole percent saved, `round((1 - compressed / original) * 100)`
    #[serde(serialize_with = "serialize_percent")]
    pub savings: i64,
}

impl CompressionResult {
    pub fn new(path: PathBuf, mime_type: &str, original_size: u64, compressed_size: u64) -> Self {
        Self {
            path,
            mime_type: mime_type.to_string(),
            original_size,
            compressed_size,
            savings: calculate_savings(original_size, compressed_size),
        }
    }

    pub fn bytes_saved(&self) -> u64 {
        self.original_size.saturating_sub(self.compressed_size)
    }

    /// Savings formatted as `"40%"`
    pub fn savings_label(&self) -> String {
        format!("{}%", self.savings)
    }
}

impl fmt::Display for CompressionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} -> {} bytes ({} saved) at {}",
            self.mime_type,
            self.original_size,
            self.compressed_size,
            self.savings_label(),
            self.path.display()
        )
    }
}

fn serialize_percent<S: Serializer>(savings: &i64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format!("{}%", savings))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_savings() {
        let result = CompressionResult::new(PathBuf::from("/tmp/a.png"), "image/png", 10_000, 6_000);
        assert_eq!(result.savings, 40);
        assert_eq!(result.savings_label(), "40%");
        assert_eq!(result.bytes_saved(), 4_000);
    }

    #[test]
    fn test_result_json_shape() {
        let result = CompressionResult::new(PathBuf::from("/tmp/a.png"), "image/png", 2048, 1800);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["mimeType"], "image/png");
        assert_eq!(json["originalSize"], 2048);
        assert_eq!(json["compressedSize"], 1800);
        assert_eq!(json["savings"], "12%");
    }

    #[test]
    fn test_request_builder() {
        let request = CompressionRequest::new("/in/photo.jpg").with_mime_type("image/jpeg");
        assert_eq!(request.path(), Path::new("/in/photo.jpg"));
        assert_eq!(request.mime_type(), Some("image/jpeg"));
        assert_eq!(CompressionRequest::new("x").mime_type(), None);
    }
}
