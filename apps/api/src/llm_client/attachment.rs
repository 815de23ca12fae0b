//! Image encoder: binary uploads become base64 inline attachments.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use thiserror::Error;

/// MIME types the model accepts as inline images.
const SUPPORTED_IMAGE_TYPES: &[&str] = &[
    "image/png",
    "image/jpeg",
    "image/webp",
    "image/gif",
    "image/heic",
    "image/heif",
];

#[derive(Debug, Error, PartialEq)]
pub enum AttachmentError {
    #[error("uploaded image is empty")]
    Empty,

    #[error("unsupported image type: {0}")]
    UnsupportedType(String),
}

/// Binary data sent alongside a prompt in the same generation request.
#[derive(Debug, Clone, PartialEq)]
pub struct InlineAttachment {
    pub mime_type: String,
    /// Standard base64, padded.
    pub data: String,
}

impl InlineAttachment {
    pub fn encode(bytes: &[u8], mime_type: &str) -> Self {
        Self {
            mime_type: mime_type.to_string(),
            data: BASE64.encode(bytes),
        }
    }

    /// Encodes an uploaded image. The declared content type is trusted when it
    /// names a supported image type; otherwise the type is sniffed from the bytes.
    pub fn from_image(bytes: &[u8], declared: Option<&str>) -> Result<Self, AttachmentError> {
        if bytes.is_empty() {
            return Err(AttachmentError::Empty);
        }

        let declared = declared.map(|d| {
            d.split(';')
                .next()
                .unwrap_or_default()
                .trim()
                .to_ascii_lowercase()
        });

        let mime_type = match declared.as_deref() {
            Some(d) if SUPPORTED_IMAGE_TYPES.contains(&d) => d,
            Some("image/jpg") => "image/jpeg",
            other => sniff_image_mime(bytes).ok_or_else(|| {
                AttachmentError::UnsupportedType(
                    other.unwrap_or("unknown").to_string(),
                )
            })?,
        };

        Ok(Self::encode(bytes, mime_type))
    }

    /// Size of the original bytes, worked out from the padded base64 length.
    pub fn decoded_len(&self) -> usize {
        let padding = self.data.bytes().rev().take_while(|b| *b == b'=').count();
        (self.data.len() / 4 * 3).saturating_sub(padding)
    }
}

/// Identifies common image formats by their magic bytes.
pub fn sniff_image_mime(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
        Some("image/png")
    } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("image/jpeg")
    } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        Some("image/gif")
    } else if bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        Some("image/webp")
    } else if bytes.len() >= 12 && &bytes[4..8] == b"ftyp" {
        match &bytes[8..12] {
            b"heic" | b"heix" | b"hevc" | b"hevx" => Some("image/heic"),
            b"mif1" | b"msf1" => Some("image/heif"),
            _ => None,
        }
    } else {
        None
    }
}
