//! Upload constraints for resource files.

use crate::error::CoreError;
use crate::messages;

/// Maximum accepted upload size in bytes (50 MB).
pub const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// MIME types accepted for resource uploads.
pub const ALLOWED_MIME_TYPES: &[&str] = &[
    // Images
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/gif",
    "image/webp",
    "image/svg+xml",
    // Video
    "video/mp4",
    "video/avi",
    "video/mov",
    "video/wmv",
    "video/flv",
    "video/webm",
    // Audio
    "audio/mp3",
    "audio/mpeg",
    "audio/wav",
    "audio/flac",
    "audio/aac",
    "audio/ogg",
    // Documents
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/vnd.ms-excel",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "application/vnd.ms-powerpoint",
    "application/vnd.openxmlformats-officedocument.presentationml.presentation",
    "text/plain",
    // Archives
    "application/zip",
    "application/x-rar-compressed",
    "application/x-7z-compressed",
    "application/x-tar",
    "application/gzip",
];

/// Folder uploads land in when none is configured.
pub const DEFAULT_UPLOAD_FOLDER: &str = "resources";

/// Fallback `file_type` when neither the client nor the uploader supplies one.
pub const FALLBACK_FILE_TYPE: &str = "other";

pub fn validate_content_type(content_type: &str) -> Result<(), CoreError> {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    if ALLOWED_MIME_TYPES.contains(&essence.as_str()) {
        Ok(())
    } else {
        Err(CoreError::InvalidEnumValue(
            messages::UNSUPPORTED_FILE_TYPE.to_string(),
        ))
    }
}

pub fn validate_size(len: usize, max: usize) -> Result<(), CoreError> {
    if len > max {
        Err(CoreError::PayloadTooLarge(messages::file_too_large(max)))
    } else {
        Ok(())
    }
}
