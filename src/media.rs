use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{TriageError, TriageResult};

/// Largest accepted source video (100 MiB)
pub const MAX_VIDEO_BYTES: u64 = 100 * 1024 * 1024;

/// A selected source video; constructed only through validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoSource {
    pub path: PathBuf,
    pub mime_type: String,
    pub size_bytes: u64,
}

/// Base64 payload ready to be inlined into an inference request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedMedia {
    pub data: String,
    pub mime_type: String,
}

/// Reject anything that is not a video or is larger than `MAX_VIDEO_BYTES`
pub fn validate(mime_type: &str, size_bytes: u64) -> TriageResult<()> {
    if !mime_type.starts_with("video/") {
        return Err(TriageError::Validation(format!(
            "unsupported media type '{}', expected video/*",
            mime_type
        )));
    }
    if size_bytes > MAX_VIDEO_BYTES {
        return Err(TriageError::Validation(format!(
            "file is {:.1} MiB, limit is {} MiB",
            size_bytes as f64 / (1024.0 * 1024.0),
            MAX_VIDEO_BYTES / (1024 * 1024)
        )));
    }
    Ok(())
}

/// Guess a MIME type from the file extension
pub fn guess_mime_type(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let mime = match ext.as_str() {
        "mp4" | "m4v" => "video/mp4",
        "mov" => "video/quicktime",
        "webm" => "video/webm",
        "mkv" => "video/x-matroska",
        "avi" => "video/x-msvideo",
        "mpeg" | "mpg" => "video/mpeg",
        "3gp" => "video/3gpp",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        _ => return None,
    };
    Some(mime)
}

/// Extension used when storing an upload of the given type
pub fn extension_for(mime_type: &str) -> &'static str {
    match mime_type {
        "video/quicktime" => "mov",
        "video/webm" => "webm",
        "video/x-matroska" => "mkv",
        "video/x-msvideo" => "avi",
        "video/mpeg" => "mpeg",
        "video/3gpp" => "3gp",
        _ => "mp4",
    }
}

impl VideoSource {
    /// Validate an already-known type and size
    pub fn new(path: impl Into<PathBuf>, mime_type: &str, size_bytes: u64) -> TriageResult<Self> {
        validate(mime_type, size_bytes)?;
        Ok(VideoSource {
            path: path.into(),
            mime_type: mime_type.to_string(),
            size_bytes,
        })
    }

    /// Select a file from disk. The declared type wins over the extension guess.
    pub async fn from_path(path: &Path, declared_mime: Option<&str>) -> TriageResult<Self> {
        let metadata = tokio::fs::metadata(path).await.map_err(|e| {
            TriageError::Validation(format!("cannot open {}: {}", path.display(), e))
        })?;
        if !metadata.is_file() {
            return Err(TriageError::Validation(format!(
                "{} is not a regular file",
                path.display()
            )));
        }

        let mime_type = declared_mime
            .or_else(|| guess_mime_type(path))
            .ok_or_else(|| {
                TriageError::Validation(format!(
                    "cannot determine media type of {}",
                    path.display()
                ))
            })?;

        Self::new(path, mime_type, metadata.len())
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.path.to_string_lossy().to_string())
    }
}

/// Read the video and encode it as standard, padded base64 without a `data:` prefix
pub async fn encode(source: &VideoSource) -> TriageResult<EncodedMedia> {
    let bytes = tokio::fs::read(&source.path)
        .await
        .map_err(TriageError::Encoding)?;

    Ok(EncodedMedia {
        data: base64::engine::general_purpose::STANDARD.encode(&bytes),
        mime_type: source.mime_type.clone(),
    })
}
