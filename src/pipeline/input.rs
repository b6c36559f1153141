//! Input resolution: turn a user-supplied path into an [`ImagePayload`].
//!
//! Only JPEG and PNG are accepted. The magic bytes are checked here so a
//! stray PDF or GIF fails with a clear message before any network call.

use crate::error::ArcExtractError;
use crate::pipeline::encode::ImagePayload;
use std::path::Path;
use tracing::debug;

const PNG_MAGIC: &[u8] = b"\x89PNG";
const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF];

/// Image container formats accepted as input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Png,
    Jpeg,
}

/// Identify the container format from the leading bytes.
pub fn sniff_format(bytes: &[u8]) -> Option<SourceFormat> {
    if bytes.starts_with(PNG_MAGIC) {
        Some(SourceFormat::Png)
    } else if bytes.starts_with(JPEG_MAGIC) {
        Some(SourceFormat::Jpeg)
    } else {
        None
    }
}

/// Read an image file, validating existence, permissions and format.
pub async fn load_image(path: impl AsRef<Path>) -> Result<ImagePayload, ArcExtractError> {
    let path = path.as_ref().to_path_buf();

    let bytes = match tokio::fs::read(&path).await {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(ArcExtractError::PermissionDenied { path });
        }
        Err(_) => return Err(ArcExtractError::FileNotFound { path }),
    };

    check_format(&path, &bytes)?;
    debug!("Loaded image: {} ({} bytes)", path.display(), bytes.len());
    Ok(ImagePayload::new(bytes))
}

fn check_format(path: &Path, bytes: &[u8]) -> Result<SourceFormat, ArcExtractError> {
    sniff_format(bytes).ok_or_else(|| ArcExtractError::UnsupportedImage {
        path: path.to_path_buf(),
        magic: bytes.iter().take(4).copied().collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_sniff_format() {
        assert_eq!(sniff_format(b"\x89PNG\r\n\x1a\n...."), Some(SourceFormat::Png));
        assert_eq!(sniff_format(&[0xFF, 0xD8, 0xFF, 0xE0, 0x00]), Some(SourceFormat::Jpeg));
        assert_eq!(sniff_format(b"%PDF-1.7"), None);
        assert_eq!(sniff_format(b"GIF89a"), None);
        assert_eq!(sniff_format(b""), None);
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let err = load_image("/definitely/not/a/real/card.png").await.unwrap_err();
        assert!(matches!(err, ArcExtractError::FileNotFound { .. }), "got: {err:?}");
    }

    #[tokio::test]
    async fn pdf_bytes_are_rejected() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(b"%PDF-1.4 fake").unwrap();
        let err = load_image(tmp.path()).await.unwrap_err();
        match err {
            ArcExtractError::UnsupportedImage { magic, .. } => assert_eq!(magic, b"%PDF"),
            other => panic!("expected UnsupportedImage, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn png_file_loads() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(b"\x89PNG\r\n\x1a\nrest").unwrap();
        let payload = load_image(tmp.path()).await.unwrap();
        assert_eq!(payload.len(), 12);
    }
}
