//! Input and upload validation helpers.

use crate::config::SecurityLimits;
use crate::{Error, Result};

/// Trim `text` and enforce the character-length cap. Returns the trimmed
/// slice; empty-after-trim input is its own error so the presentation layer
/// can prompt for text rather than shorten it.
pub fn sanitize_text(text: &str, max_len: usize) -> Result<&str> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(Error::EmptyInput);
    }
    let length = trimmed.chars().count();
    if length > max_len {
        return Err(Error::InputTooLong {
            length,
            max: max_len,
        });
    }
    Ok(trimmed)
}

/// Validate an upload for the external upload collaborator: size cap, then
/// MIME type guessed from the file name against the allow-list.
pub fn validate_upload(file_name: &str, size: u64, limits: &SecurityLimits) -> Result<()> {
    if size > limits.max_file_size {
        return Err(Error::FileTooLarge {
            size,
            max: limits.max_file_size,
        });
    }

    let mime = mime_guess::from_path(file_name)
        .first()
        .map(|m| m.essence_str().to_string())
        .unwrap_or_default();
    if !limits.allowed_mime_types.iter().any(|allowed| *allowed == mime) {
        return Err(Error::UnsupportedFileType { mime });
    }

    Ok(())
}
