//! Decoding of base64 signature payloads into image files.
//!
//! Clients send the drawn signature as base64 text, sometimes wrapped in a
//! `data:image/...;base64,` URL and sometimes without padding. The decoder
//! accepts both and identifies the image format from its magic bytes rather
//! than trusting any declared type.

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use bytes::Bytes;
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Standard alphabet, padding optional.
const SIGNATURE_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Why a signature payload could not be turned into an image.
#[derive(Debug, Error)]
pub enum SignatureError {
    /// Payload is empty after stripping.
    #[error("signature payload is empty")]
    Empty,

    /// A `data:` URL without a base64 body.
    #[error("signature data URL is malformed")]
    InvalidDataUrl,

    /// Payload is not valid base64.
    #[error("signature is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    /// Decoded bytes are not a recognized image.
    #[error("decoded signature is not a PNG, JPEG, GIF or WebP image")]
    UnrecognizedImage,
}

/// Image formats a signature may decode to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// Portable Network Graphics.
    Png,
    /// JPEG.
    Jpeg,
    /// GIF87a / GIF89a.
    Gif,
    /// WebP (RIFF container).
    Webp,
}

impl ImageFormat {
    /// Detect the format from leading magic bytes.
    #[must_use]
    pub fn detect(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
            Some(Self::Png)
        } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(Self::Jpeg)
        } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
            Some(Self::Gif)
        } else if bytes.len() >= 12 && bytes.starts_with(b"RIFF") && &bytes[8..12] == b"WEBP" {
            Some(Self::Webp)
        } else {
            None
        }
    }

    /// MIME type of the format.
    #[must_use]
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Gif => "image/gif",
            Self::Webp => "image/webp",
        }
    }

    /// File extension of the format.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Gif => "gif",
            Self::Webp => "webp",
        }
    }
}

/// A decoded signature image.
#[derive(Debug, Clone)]
pub struct DecodedSignature {
    /// Raw image bytes.
    pub bytes: Bytes,
    /// Detected format.
    pub format: ImageFormat,
}

impl DecodedSignature {
    /// Lower-case hex SHA-256 of the image bytes.
    #[must_use]
    pub fn digest_hex(&self) -> String {
        format!("{:x}", Sha256::digest(&self.bytes))
    }
}

/// Decode a stored signature payload.
///
/// # Errors
///
/// Returns an error if the payload is empty, is not base64, or does not
/// decode to a supported image format.
pub fn decode_signature(payload: &str) -> Result<DecodedSignature, SignatureError> {
    let body = strip_data_url(payload.trim())?;
    let compact: String = body.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    if compact.is_empty() {
        return Err(SignatureError::Empty);
    }

    let bytes = SIGNATURE_ENGINE.decode(compact.as_bytes())?;
    let format = ImageFormat::detect(&bytes).ok_or(SignatureError::UnrecognizedImage)?;

    Ok(DecodedSignature {
        bytes: Bytes::from(bytes),
        format,
    })
}

/// Returns the base64 body of a `data:<type>;base64,<body>` URL, or the
/// input itself when it is not a data URL.
fn strip_data_url(payload: &str) -> Result<&str, SignatureError> {
    let Some(rest) = payload.strip_prefix("data:") else {
        return Ok(payload);
    };
    let (header, body) = rest.split_once(',').ok_or(SignatureError::InvalidDataUrl)?;
    if !header.to_ascii_lowercase().ends_with(";base64") {
        return Err(SignatureError::InvalidDataUrl);
    }
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD};
    use rstest::rstest;

    /// 1x1 transparent PNG.
    const PNG_B64: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

    #[test]
    fn test_decode_plain_png() {
        let decoded = decode_signature(PNG_B64).unwrap();
        assert_eq!(decoded.format, ImageFormat::Png);
        assert!(decoded.bytes.starts_with(b"\x89PNG"));
    }

    #[test]
    fn test_decode_data_url_and_whitespace() {
        let wrapped = format!("data:image/png;base64,{}\n{}", &PNG_B64[..20], &PNG_B64[20..]);
        let decoded = decode_signature(&wrapped).unwrap();
        assert_eq!(decoded.format, ImageFormat::Png);
        assert_eq!(
            decoded.digest_hex(),
            decode_signature(PNG_B64).unwrap().digest_hex()
        );
    }

    #[test]
    fn test_padding_is_optional() {
        let unpadded = PNG_B64.trim_end_matches('=');
        let a = decode_signature(unpadded).unwrap();
        let b = decode_signature(PNG_B64).unwrap();
        assert_eq!(a.bytes, b.bytes);
    }

    #[rstest]
    #[case(&[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10], ImageFormat::Jpeg, "jpg")]
    #[case(b"GIF89a\x01\x00\x01\x00", ImageFormat::Gif, "gif")]
    #[case(b"RIFF\x24\x00\x00\x00WEBPVP8 ", ImageFormat::Webp, "webp")]
    fn test_detects_other_formats(
        #[case] raw: &[u8],
        #[case] format: ImageFormat,
        #[case] extension: &str,
    ) {
        let decoded = decode_signature(&STANDARD_NO_PAD.encode(raw)).unwrap();
        assert_eq!(decoded.format, format);
        assert_eq!(decoded.format.extension(), extension);
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("data:image/png;base64,")]
    fn test_empty_payload(#[case] payload: &str) {
        assert!(matches!(decode_signature(payload), Err(SignatureError::Empty)));
    }

    #[test]
    fn test_invalid_base64() {
        assert!(matches!(
            decode_signature("not*base64!"),
            Err(SignatureError::Base64(_))
        ));
    }

    #[test]
    fn test_data_url_without_base64_marker() {
        assert!(matches!(
            decode_signature("data:image/png,abcd"),
            Err(SignatureError::InvalidDataUrl)
        ));
        assert!(matches!(
            decode_signature("data:image/png;base64"),
            Err(SignatureError::InvalidDataUrl)
        ));
    }

    #[test]
    fn test_non_image_bytes_rejected() {
        let payload = STANDARD.encode(b"just some text, not an image");
        assert!(matches!(
            decode_signature(&payload),
            Err(SignatureError::UnrecognizedImage)
        ));
    }

    #[test]
    fn test_digest_is_stable() {
        let a = decode_signature(PNG_B64).unwrap().digest_hex();
        let b = decode_signature(PNG_B64).unwrap().digest_hex();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }
}
