use std::fmt;
use thiserror::Error;

/// The submission precondition that was not met.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precondition {
    NoImage,
    EmptyPrompt,
    EmptyMask,
}

impl Precondition {
    pub fn message(&self) -> &'static str {
        match self {
            Precondition::NoImage => "Please upload an image before applying an edit.",
            Precondition::EmptyPrompt => "Please enter a prompt describing the edit.",
            Precondition::EmptyMask => "Please draw a mask on the area you want to edit.",
        }
    }
}

impl fmt::Display for Precondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

#[derive(Debug, Error)]
pub enum InpaintError {
    /// Carries the rejected MIME type; the message shown to the user does not.
    #[error("Please upload a valid image file (JPEG, PNG, GIF, etc.).")]
    InvalidFileType(String),
    #[error("{0}")]
    MissingPrecondition(Precondition),
    #[error("Failed to edit image: {0}")]
    RemoteEditFailure(String),
    #[error("Invalid session state: {0}")]
    InvalidState(String),
    #[error("Image decode error: {0}")]
    ImageDecodeError(String),
    #[error("Image encode error: {0}")]
    ImageEncodeError(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Request error: {0}")]
    RequestError(String),
    #[error("Response error: {0}")]
    ResponseError(String),
    #[error("Serialization error: {0}")]
    SerializationError(String),
    #[error("Gemini API Error: {0}")]
    ApiError(String),
}

pub type Result<T> = std::result::Result<T, InpaintError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precondition_messages_are_distinct() {
        let messages = [
            Precondition::NoImage.message(),
            Precondition::EmptyPrompt.message(),
            Precondition::EmptyMask.message(),
        ];
        assert_ne!(messages[0], messages[1]);
        assert_ne!(messages[1], messages[2]);
        assert_ne!(messages[0], messages[2]);
    }

    #[test]
    fn test_remote_failure_is_prefixed() {
        let err = InpaintError::RemoteEditFailure("Gemini API Error: quota exceeded".into());
        assert_eq!(
            err.to_string(),
            "Failed to edit image: Gemini API Error: quota exceeded"
        );
    }

    #[test]
    fn test_invalid_file_type_message_is_fixed() {
        let err = InpaintError::InvalidFileType("text/plain".into());
        assert_eq!(
            err.to_string(),
            "Please upload a valid image file (JPEG, PNG, GIF, etc.)."
        );
        assert_eq!(
            InpaintError::MissingPrecondition(Precondition::EmptyMask).to_string(),
            Precondition::EmptyMask.message()
        );
    }
}
