//! Input checks run before a message enters the list.

use crate::api_client::OutgoingFile;
use crate::error::ValidationError;

/// Trim the body and check it is non-empty and within `max_len` characters.
pub fn validate_text(body: &str, max_len: usize) -> Result<String, ValidationError> {
    let text = body.trim();
    if text.is_empty() {
        return Err(ValidationError::EmptyMessage);
    }
    let len = text.chars().count();
    if len > max_len {
        return Err(ValidationError::MessageTooLong { len, max: max_len });
    }
    Ok(text.to_string())
}

pub fn validate_file(file: &OutgoingFile, max_bytes: u64) -> Result<(), ValidationError> {
    if file.name.trim().is_empty() {
        return Err(ValidationError::MissingFileName);
    }
    if file.bytes.is_empty() {
        return Err(ValidationError::EmptyAttachment);
    }
    if file.size() > max_bytes {
        return Err(ValidationError::AttachmentTooLarge {
            size: file.size(),
            max: max_bytes,
        });
    }
    Ok(())
}
