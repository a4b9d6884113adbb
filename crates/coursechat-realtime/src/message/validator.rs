//! Validation rules for inbound frames and payload fields.

use coursechat_core::error::AppError;
use coursechat_core::types::{RoomId, UserId};

/// Maximum length of an externally issued key (user or room id).
const MAX_KEY_LENGTH: usize = 256;

/// Maximum length of an attached image URL.
const MAX_IMAGE_URL_LENGTH: usize = 2048;

/// Validates the raw size and content of an inbound frame.
pub fn validate_frame(raw: &str, max_bytes: usize) -> Result<(), AppError> {
    if raw.len() > max_bytes {
        return Err(AppError::validation(format!(
            "Message exceeds maximum size of {max_bytes} bytes"
        )));
    }

    if raw.trim().is_empty() {
        return Err(AppError::validation("Empty message"));
    }

    Ok(())
}

/// Validates a required external key and returns it trimmed.
fn validate_key(field: &str, value: Option<&str>) -> Result<String, AppError> {
    let value = value.map(str::trim).unwrap_or_default();

    if value.is_empty() {
        return Err(AppError::validation(format!("Missing {field}")));
    }

    if value.chars().count() > MAX_KEY_LENGTH {
        return Err(AppError::validation(format!(
            "{field} exceeds {MAX_KEY_LENGTH} characters"
        )));
    }

    if value.chars().any(char::is_control) {
        return Err(AppError::validation(format!(
            "{field} contains control characters"
        )));
    }

    Ok(value.to_string())
}

/// Validates a required room id.
pub fn validate_room_id(value: Option<&str>) -> Result<RoomId, AppError> {
    validate_key("roomId", value).map(RoomId::from)
}

/// Validates a required user id.
pub fn validate_user_id(value: Option<&str>) -> Result<UserId, AppError> {
    validate_key("userId", value).map(UserId::from)
}

/// Validates chat message content.
///
/// Returns the trimmed text and the image URL. A message must carry text,
/// an image, or both.
pub fn validate_message_body(
    text: Option<&str>,
    image_url: Option<&str>,
    max_text_length: usize,
) -> Result<(String, Option<String>), AppError> {
    let text = text.map(str::trim).unwrap_or_default().to_string();
    let image_url = image_url
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .map(str::to_string);

    if text.is_empty() && image_url.is_none() {
        return Err(AppError::validation("Message has neither text nor image"));
    }

    if text.chars().count() > max_text_length {
        return Err(AppError::validation(format!(
            "Message text exceeds {max_text_length} characters"
        )));
    }

    if let Some(url) = &image_url {
        if url.len() > MAX_IMAGE_URL_LENGTH
            || !(url.starts_with("https://") || url.starts_with("http://"))
        {
            return Err(AppError::validation("Invalid image URL"));
        }
    }

    Ok((text, image_url))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_limits() {
        assert!(validate_frame("{}", 16).is_ok());
        assert!(validate_frame("   ", 16).is_err());
        assert!(validate_frame(&"x".repeat(17), 16).is_err());
    }

    #[test]
    fn test_room_id_required_and_trimmed() {
        assert_eq!(validate_room_id(Some(" course1 ")).unwrap().as_str(), "course1");
        assert!(validate_room_id(None).is_err());
        assert!(validate_room_id(Some("")).is_err());
        assert!(validate_room_id(Some("bad\nid")).is_err());
        assert!(validate_room_id(Some(&"r".repeat(257))).is_err());
    }

    #[test]
    fn test_message_body_needs_text_or_image() {
        assert!(validate_message_body(None, None, 10).is_err());
        assert!(validate_message_body(Some("  "), Some(" "), 10).is_err());

        let (text, image) = validate_message_body(Some(" hi "), None, 10).unwrap();
        assert_eq!(text, "hi");
        assert!(image.is_none());

        let (text, image) =
            validate_message_body(None, Some("https://cdn.example/a.png"), 10).unwrap();
        assert!(text.is_empty());
        assert_eq!(image.as_deref(), Some("https://cdn.example/a.png"));
    }

    #[test]
    fn test_message_body_limits() {
        assert!(validate_message_body(Some("12345678901"), None, 10).is_err());
        assert!(validate_message_body(Some("ok"), Some("ftp://x/y.png"), 10).is_err());
    }
}
