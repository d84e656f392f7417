use crate::error::{InpaintError, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::io::Cursor;

pub const MASK_MIME_TYPE: &str = "image/png";

/// A file handed to the session by the user, before any validation.
#[derive(Debug, Clone)]
pub struct SelectedFile {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }
}

/// The loaded original. Never mutated after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceImage {
    name: String,
    mime_type: String,
    bytes: Vec<u8>,
    width: u32,
    height: u32,
}

impl SourceImage {
    /// Reads the natural size from the header of `file`. Pixel data is not
    /// decoded, and the bytes are kept as-is for the edit request.
    pub fn decode(file: SelectedFile) -> Result<Self> {
        let decode_error = |e: &dyn std::fmt::Display| {
            InpaintError::ImageDecodeError(format!("{}: {}", file.name, e))
        };
        let (width, height) = ::image::ImageReader::new(Cursor::new(&file.bytes))
            .with_guessed_format()
            .map_err(|e| decode_error(&e))?
            .into_dimensions()
            .map_err(|e| decode_error(&e))?;

        Ok(Self {
            name: file.name,
            mime_type: file.mime_type,
            bytes: file.bytes,
            width,
            height,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }
}

/// The mask layer encoded as PNG.
#[derive(Debug, Clone, PartialEq)]
pub struct MaskPayload {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl MaskPayload {
    pub fn mime_type(&self) -> &'static str {
        MASK_MIME_TYPE
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }
}

#[derive(Debug, Clone)]
pub struct EditRequest {
    pub image: SourceImage,
    pub mask: MaskPayload,
    pub prompt: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EditedImage {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl EditedImage {
    pub fn new(mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            mime_type: mime_type.into(),
            bytes,
        }
    }

    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, STANDARD.encode(&self.bytes))
    }

    /// File extension for saving, falling back to `bin`.
    pub fn extension(&self) -> &'static str {
        ::image::ImageFormat::from_mime_type(&self.mime_type)
            .and_then(|format| format.extensions_str().first().copied())
            .unwrap_or("bin")
    }
}
