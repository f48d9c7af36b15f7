//! MIME type parsing and detection.
//!
//! Detection sniffs the file header with `image::guess_format` and falls back
//! to `file --brief --mime-type` for anything that is not a known image.

use crate::args;
use crate::error::{CompressError, Result};
use crate::process::ProcessRunner;
use image::ImageFormat;
use std::fmt;
use std::future::Future;
use std::path::Path;
use std::str::FromStr;
use tokio::io::AsyncReadExt;
use tracing::debug;

/// Bytes read from the start of a file for sniffing
const HEADER_LEN: u64 = 64;

/// A `group/subtype` pair, group normalised to `Image`, subtype to `png`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MimeType {
    group: String,
    subtype: String,
}

impl MimeType {
    /// Split `raw` on its first `/` into a normalised group and optional subtype.
    ///
    /// Empty input or an empty group is invalid. A missing or empty subtype is
    /// returned as `None`: whether that is an error depends on the group.
    pub fn split(raw: &str) -> Result<(String, Option<String>)> {
        let (group, subtype) = match raw.split_once('/') {
            Some((group, subtype)) => (group, Some(subtype)),
            None => (raw, None),
        };

        let group = group.trim();
        if group.is_empty() {
            return Err(CompressError::InvalidMimeType(raw.to_string()));
        }

        let subtype = subtype
            .map(|s| s.split(';').next().unwrap_or("").trim().to_ascii_lowercase())
            .filter(|s| !s.is_empty());

        Ok((Self::normalize_group(group), subtype))
    }

    /// `image`, `IMAGE` and `Image` all become `Image`
    pub fn normalize_group(group: &str) -> String {
        let lower = group.trim().to_ascii_lowercase();
        let mut chars = lower.chars();
        match chars.next() {
            Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
            None => String::new(),
        }
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn subtype(&self) -> &str {
        &self.subtype
    }

    /// Lowercase `group/subtype` form
    pub fn essence(&self) -> String {
        format!("{}/{}", self.group.to_ascii_lowercase(), self.subtype)
    }
}

impl FromStr for MimeType {
    type Err = CompressError;

    fn from_str(raw: &str) -> Result<Self> {
        match Self::split(raw)? {
            (group, Some(subtype)) => Ok(Self { group, subtype }),
            (_, None) => Err(CompressError::InvalidMimeType(raw.to_string())),
        }
    }
}

impl fmt::Display for MimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.essence())
    }
}

/// Collaborator answering "what MIME type is this file?"
pub trait MimeDetector: Send + Sync {
    /// A `major/minor` string; failures are hard errors
    fn detect(&self, path: &Path) -> impl Future<Output = Result<String>> + Send;
}

/// Header sniffing with a `file(1)` fallback
#[derive(Debug, Clone, Default)]
pub struct MagicMimeDetector {
    runner: ProcessRunner,
}

impl MagicMimeDetector {
    pub fn new(runner: ProcessRunner) -> Self {
        Self { runner }
    }

    pub fn runner(&self) -> &ProcessRunner {
        &self.runner
    }

    async fn read_header(path: &Path) -> std::io::Result<Vec<u8>> {
        let file = tokio::fs::File::open(path).await?;
        let mut header = Vec::with_capacity(HEADER_LEN as usize);
        file.take(HEADER_LEN).read_to_end(&mut header).await?;
        Ok(header)
    }

    async fn detect_with_file_tool(&self, path: &Path) -> Result<String> {
        let failure = |reason: String| CompressError::Detection {
            path: path.display().to_string(),
            reason,
        };

        if !self.runner.exists("file")? {
            return Err(failure(
                "content is not a known image format and `file` is not installed".to_string(),
            ));
        }

        let output = self
            .runner
            .run("file --brief --mime-type {}", &args![path])
            .await?;
        if !output.success() {
            return Err(failure(format!(
                "`file` exited with {:?}: {}",
                output.code(),
                output.stderr_lossy()
            )));
        }

        let mime = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if mime.contains('/') {
            Ok(mime)
        } else {
            Err(failure(format!("`file` answered {:?}", mime)))
        }
    }
}

impl MimeDetector for MagicMimeDetector {
    async fn detect(&self, path: &Path) -> Result<String> {
        let header = Self::read_header(path)
            .await
            .map_err(|e| CompressError::Detection {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;

        if let Some(mime) = image::guess_format(&header).ok().and_then(image_mime_type) {
            debug!("Sniffed {} as {}", path.display(), mime);
            return Ok(mime.to_string());
        }

        let mime = self.detect_with_file_tool(path).await?;
        debug!("file(1) reports {} as {}", path.display(), mime);
        Ok(mime)
    }
}

fn image_mime_type(format: ImageFormat) -> Option<&'static str> {
    match format {
        ImageFormat::Png => Some("image/png"),
        ImageFormat::Jpeg => Some("image/jpeg"),
        ImageFormat::Gif => Some("image/gif"),
        ImageFormat::WebP => Some("image/webp"),
        ImageFormat::Bmp => Some("image/bmp"),
        ImageFormat::Tiff => Some("image/tiff"),
        ImageFormat::Ico => Some("image/x-icon"),
        ImageFormat::Avif => Some("image/avif"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool_resolver::ToolPathResolver;
    use tempfile::TempDir;

    #[test]
    fn test_split_and_normalize() {
        assert_eq!(
            MimeType::split("image/png").unwrap(),
            ("Image".to_string(), Some("png".to_string()))
        );
        assert_eq!(
            MimeType::split("IMAGE/PNG; charset=binary").unwrap(),
            ("Image".to_string(), Some("png".to_string()))
        );
        assert_eq!(MimeType::split("text").unwrap(), ("Text".to_string(), None));
        assert_eq!(MimeType::split("image/").unwrap(), ("Image".to_string(), None));
        assert!(matches!(MimeType::split(""), Err(CompressError::InvalidMimeType(_))));
        assert!(matches!(MimeType::split("/png"), Err(CompressError::InvalidMimeType(_))));
    }

    #[test]
    fn test_parse_requires_subtype() {
        let mime: MimeType = "image/jpeg".parse().unwrap();
        assert_eq!(mime.group(), "Image");
        assert_eq!(mime.subtype(), "jpeg");
        assert_eq!(mime.to_string(), "image/jpeg");
        assert!("image".parse::<MimeType>().is_err());
    }

    fn offline_detector() -> MagicMimeDetector {
        MagicMimeDetector::new(ProcessRunner::new(ToolPathResolver::with_search_path(vec![]), None))
    }

    #[tokio::test]
    async fn test_detect_by_magic_bytes() {
        let dir = TempDir::new().unwrap();
        let detector = offline_detector();

        let cases: [(&str, &[u8], &str); 3] = [
            ("a.bin", b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR", "image/png"),
            ("b.bin", b"GIF89a\x01\0\x01\0", "image/gif"),
            ("c.bin", b"\xff\xd8\xff\xe0\0\x10JFIF", "image/jpeg"),
        ];
        for (name, bytes, expected) in cases {
            let path = dir.path().join(name);
            std::fs::write(&path, bytes).unwrap();
            assert_eq!(detector.detect(&path).await.unwrap(), expected);
        }
    }

    #[tokio::test]
    async fn test_detect_missing_file_is_error() {
        let dir = TempDir::new().unwrap();
        let err = offline_detector()
            .detect(&dir.path().join("missing.png"))
            .await
            .unwrap_err();
        assert!(matches!(err, CompressError::Detection { .. }));
    }

    #[tokio::test]
    async fn test_detect_unknown_without_file_tool_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "just some text").unwrap();
        let err = offline_detector().detect(&path).await.unwrap_err();
        assert!(matches!(err, CompressError::Detection { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_detect_falls_back_to_file_tool() {
        use crate::test_support::FakeTools;

        let tools = FakeTools::new();
        tools.install("file", "echo text/plain");
        let path = tools.fixture("notes.txt", 20);
        let detector = MagicMimeDetector::new(tools.runner());
        assert_eq!(detector.detect(&path).await.unwrap(), "text/plain");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_detect_non_utf8_name_with_file_tool() {
        use crate::test_support::FakeTools;
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let tools = FakeTools::new();
        tools.install(
            "file",
            "[ -e \"$3\" ] || { echo \"no such file: $3\" >&2; exit 1; }\necho text/plain",
        );
        let path = tools.root().join("in").join(OsStr::from_bytes(b"notes\xff.txt"));
        std::fs::write(&path, "just some text").unwrap();

        let detector = MagicMimeDetector::new(tools.runner());
        assert_eq!(detector.detect(&path).await.unwrap(), "text/plain");
    }
}
