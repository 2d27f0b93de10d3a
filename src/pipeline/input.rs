//! Input acquisition and validation: normalise a user-supplied byte buffer,
//! path, or URL into a validated [`SourceDocument`].
//!
//! ## Why validate before decoding?
//!
//! The decoder is the most expensive and least predictable part of the
//! pipeline. Rejecting a wrong media type, an oversized upload, or bytes
//! without the `%PDF` magic up front gives the user a meaningful error in
//! microseconds instead of a decoder failure seconds into a render — and
//! guarantees the previously displayed document is never disturbed by an
//! upload that was doomed from the start.

use crate::config::ViewerConfig;
use crate::document::SourceDocument;
use crate::error::ViewerError;
use std::path::PathBuf;
use tracing::{debug, info};

const PDF_MAGIC: &[u8; 4] = b"%PDF";

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve an input string to a [`SourceDocument`].
///
/// URLs are downloaded (honouring `config.download_timeout`); anything else
/// is treated as a local file path. The result is already validated via
/// [`validate`].
pub async fn resolve(input: &str, config: &ViewerConfig) -> Result<SourceDocument, ViewerError> {
    let source = if is_url(input) {
        download_url(input, config).await?
    } else {
        read_local(input, config).await?
    };
    validate(&source, config)?;
    Ok(source)
}

/// Validate a source document against the configured constraints.
///
/// Order matters: the media-type gate runs first so a wrong format is
/// rejected before any other work, then the size ceiling, then the magic
/// bytes.
pub fn validate(source: &SourceDocument, config: &ViewerConfig) -> Result<(), ViewerError> {
    if !config.accepts_media_type(&source.media_type) {
        return Err(ViewerError::InvalidFormat {
            media_type: source.media_type.clone(),
        });
    }

    let size = source.bytes.len() as u64;
    if size > config.max_document_bytes {
        return Err(ViewerError::DocumentTooLarge {
            size,
            limit: config.max_document_bytes,
        });
    }

    if source.bytes.len() < PDF_MAGIC.len() || &source.bytes[..PDF_MAGIC.len()] != PDF_MAGIC {
        return Err(ViewerError::NotAPdf {
            magic: source.magic(),
        });
    }

    Ok(())
}

/// Read a local file, mapping I/O failures to the crate error taxonomy.
async fn read_local(path_str: &str, config: &ViewerConfig) -> Result<SourceDocument, ViewerError> {
    let path = PathBuf::from(path_str);

    // Check the size from metadata before reading, so a multi-gigabyte file
    // is rejected without being pulled into memory.
    let metadata = tokio::fs::metadata(&path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::PermissionDenied => ViewerError::PermissionDenied { path: path.clone() },
        _ => ViewerError::FileNotFound { path: path.clone() },
    })?;
    if metadata.len() > config.max_document_bytes {
        return Err(ViewerError::DocumentTooLarge {
            size: metadata.len(),
            limit: config.max_document_bytes,
        });
    }

    let bytes = tokio::fs::read(&path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::PermissionDenied => ViewerError::PermissionDenied { path: path.clone() },
        _ => ViewerError::FileNotFound { path: path.clone() },
    })?;

    debug!("Read local document: {} ({} bytes)", path.display(), bytes.len());
    Ok(SourceDocument::from_bytes(bytes, media_type_for_path(path_str)))
}

/// Download a URL into memory and return it as a source document.
async fn download_url(url: &str, config: &ViewerConfig) -> Result<SourceDocument, ViewerError> {
    info!("Downloading document from: {}", url);
    let timeout_secs = config.download_timeout.as_secs();

    let client = reqwest::Client::builder()
        .timeout(config.download_timeout)
        .build()
        .map_err(|e| ViewerError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            ViewerError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            ViewerError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(ViewerError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    // Prefer the server's Content-Type; fall back to guessing from the URL.
    // A wrong declaration fails the media-type gate in validate(), which is
    // the behaviour we want for e.g. an HTML error page served with 200.
    let media_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.split(';').next().unwrap_or(v).trim().to_string())
        .unwrap_or_else(|| media_type_for_path(url));

    let bytes = response
        .bytes()
        .await
        .map_err(|e| ViewerError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    info!("Downloaded {} bytes ({})", bytes.len(), media_type);
    Ok(SourceDocument::from_bytes(bytes.to_vec(), media_type))
}

/// Guess a media type from a path or URL extension.
fn media_type_for_path(path: &str) -> String {
    let lowered = path.split(&['?', '#'][..]).next().unwrap_or(path).to_ascii_lowercase();
    if lowered.ends_with(".pdf") {
        "application/pdf".to_string()
    } else {
        "application/octet-stream".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ViewerConfig {
        ViewerConfig::default()
    }

    fn pdf_bytes() -> Vec<u8> {
        b"%PDF-1.7 minimal".to_vec()
    }

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/doc.pdf"));
        assert!(is_url("http://example.com/doc.pdf"));
        assert!(!is_url("/tmp/doc.pdf"));
        assert!(!is_url("doc.pdf"));
        assert!(!is_url(""));
    }

    #[test]
    fn wrong_media_type_rejected_first() {
        // Even though the bytes are valid PDF, the declared type wins:
        // the gate must fire before any byte inspection.
        let source = SourceDocument::from_bytes(pdf_bytes(), "image/png");
        let err = validate(&source, &config()).unwrap_err();
        assert!(matches!(err, ViewerError::InvalidFormat { .. }));
    }

    #[test]
    fn bad_magic_rejected() {
        let source = SourceDocument::from_bytes(b"GIF89a....".to_vec(), "application/pdf");
        let err = validate(&source, &config()).unwrap_err();
        assert!(matches!(err, ViewerError::NotAPdf { magic } if &magic == b"GIF8"));
    }

    #[test]
    fn oversized_rejected() {
        let cfg = ViewerConfig::builder().max_document_bytes(8).build().unwrap();
        let source = SourceDocument::from_bytes(pdf_bytes(), "application/pdf");
        let err = validate(&source, &cfg).unwrap_err();
        assert!(matches!(err, ViewerError::DocumentTooLarge { .. }));
    }

    #[test]
    fn valid_pdf_passes() {
        let source = SourceDocument::from_bytes(pdf_bytes(), "application/pdf");
        assert!(validate(&source, &config()).is_ok());
    }

    #[test]
    fn media_type_guessing() {
        assert_eq!(media_type_for_path("book.pdf"), "application/pdf");
        assert_eq!(media_type_for_path("BOOK.PDF"), "application/pdf");
        assert_eq!(
            media_type_for_path("https://example.com/a.pdf?download=1"),
            "application/pdf"
        );
        assert_eq!(media_type_for_path("notes.txt"), "application/octet-stream");
    }

    #[tokio::test]
    async fn missing_file_maps_to_not_found() {
        let err = resolve("/definitely/not/a/real/file.pdf", &config())
            .await
            .unwrap_err();
        assert!(matches!(err, ViewerError::FileNotFound { .. }));
    }
}
