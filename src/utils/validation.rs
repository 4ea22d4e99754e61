use crate::api::error::UploadError;
use crate::models::Dimensions;
use image::ImageFormat;
use std::io::Cursor;

/// Maximum upload size: 5 MB
pub const MAX_FILE_SIZE: usize = 5 * 1024 * 1024; // 5 MB

/// Extension used when a MIME type has no canonical mapping
pub const FALLBACK_EXTENSION: &str = "jpg";

/// Canonical on-disk extension for each accepted image type
const EXTENSIONS: &[(&str, &str)] = &[
    ("image/jpeg", "jpg"),
    ("image/png", "png"),
    ("image/gif", "gif"),
    ("image/webp", "webp"),
];

/// Validates body size against the inclusive maximum
pub fn validate_file_size(size: usize, max_size: usize) -> Result<(), UploadError> {
    if size > max_size {
        tracing::debug!(
            "Body of {} bytes exceeds maximum allowed {} bytes",
            size,
            max_size
        );
        return Err(UploadError::PayloadTooLarge);
    }
    Ok(())
}

/// Detects the MIME type from the leading magic bytes. Declared content types
/// are never consulted.
pub fn sniff_mime(bytes: &[u8]) -> Option<&'static str> {
    infer::get(bytes).map(|kind| kind.mime_type())
}

/// Validates a sniffed MIME type against the allow-list
pub fn validate_mime_type<S: AsRef<str>>(
    sniffed: Option<&'static str>,
    allowed: &[S],
) -> Result<&'static str, UploadError> {
    match sniffed {
        Some(mime) if allowed.iter().any(|a| a.as_ref() == mime) => Ok(mime),
        other => {
            tracing::debug!("Rejected content sniffed as {:?}", other);
            Err(UploadError::UnsupportedFormat)
        }
    }
}

pub fn extension_for_mime(mime: &str) -> &'static str {
    EXTENSIONS
        .iter()
        .find(|(m, _)| *m == mime)
        .map(|(_, ext)| *ext)
        .unwrap_or(FALLBACK_EXTENSION)
}

fn image_format_for_mime(mime: &str) -> Option<ImageFormat> {
    match mime {
        "image/jpeg" => Some(ImageFormat::Jpeg),
        "image/png" => Some(ImageFormat::Png),
        "image/gif" => Some(ImageFormat::Gif),
        "image/webp" => Some(ImageFormat::WebP),
        _ => None,
    }
}

/// Reads pixel dimensions from the image header without decoding pixel data
pub fn image_dimensions(bytes: &[u8], mime: &str) -> Option<Dimensions> {
    let format = image_format_for_mime(mime)?;
    let reader = image::io::Reader::with_format(Cursor::new(bytes), format);

    match reader.into_dimensions() {
        Ok((width, height)) if width > 0 && height > 0 => Some(Dimensions { width, height }),
        Ok(_) => None,
        Err(e) => {
            tracing::debug!("Image structure check failed for {}: {}", mime, e);
            None
        }
    }
}

/// Content checks run on a fully read body, in order: size, sniffed type, structure
pub fn validate_image<S: AsRef<str>>(
    bytes: &[u8],
    max_size: usize,
    allowed: &[S],
) -> Result<(&'static str, Dimensions), UploadError> {
    if bytes.is_empty() {
        return Err(UploadError::NoData);
    }

    validate_file_size(bytes.len(), max_size)?;

    let mime = validate_mime_type(sniff_mime(bytes), allowed)?;

    let dimensions = image_dimensions(bytes, mime).ok_or(UploadError::InvalidImageData)?;

    Ok((mime, dimensions))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_ALLOWED_MIME_TYPES;
    use image::{ImageOutputFormat, RgbImage};

    fn encode(width: u32, height: u32, format: ImageOutputFormat) -> Vec<u8> {
        let img = image::DynamicImage::ImageRgb8(RgbImage::new(width, height));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, format).unwrap();
        buf.into_inner()
    }

    #[test]
    fn test_validate_file_size() {
        assert!(validate_file_size(1024, MAX_FILE_SIZE).is_ok());
        assert!(validate_file_size(MAX_FILE_SIZE, MAX_FILE_SIZE).is_ok());
        assert!(matches!(
            validate_file_size(MAX_FILE_SIZE + 1, MAX_FILE_SIZE),
            Err(UploadError::PayloadTooLarge)
        ));
    }

    #[test]
    fn test_sniff_mime() {
        assert_eq!(sniff_mime(&[0xFF, 0xD8, 0xFF, 0xE0, 0, 0]), Some("image/jpeg"));
        assert_eq!(
            sniff_mime(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]),
            Some("image/png")
        );
        assert_eq!(sniff_mime(b"GIF89a\x01\x00\x01\x00"), Some("image/gif"));
        assert_eq!(sniff_mime(b"RIFF\x24\x00\x00\x00WEBPVP8 "), Some("image/webp"));
        assert_eq!(sniff_mime(b"%PDF-1.5\n"), Some("application/pdf"));
        assert_eq!(sniff_mime(b"Hello World"), None);
    }

    #[test]
    fn test_validate_mime_type() {
        assert_eq!(
            validate_mime_type(Some("image/png"), DEFAULT_ALLOWED_MIME_TYPES).unwrap(),
            "image/png"
        );
        assert!(matches!(
            validate_mime_type(Some("application/pdf"), DEFAULT_ALLOWED_MIME_TYPES),
            Err(UploadError::UnsupportedFormat)
        ));
        assert!(matches!(
            validate_mime_type(Some("image/bmp"), DEFAULT_ALLOWED_MIME_TYPES),
            Err(UploadError::UnsupportedFormat)
        ));
        assert!(matches!(
            validate_mime_type(None, DEFAULT_ALLOWED_MIME_TYPES),
            Err(UploadError::UnsupportedFormat)
        ));
    }

    #[test]
    fn test_extension_for_mime() {
        assert_eq!(extension_for_mime("image/jpeg"), "jpg");
        assert_eq!(extension_for_mime("image/png"), "png");
        assert_eq!(extension_for_mime("image/gif"), "gif");
        assert_eq!(extension_for_mime("image/webp"), "webp");
        assert_eq!(extension_for_mime("image/tiff"), "jpg");
    }

    #[test]
    fn test_image_dimensions() {
        let png = encode(10, 7, ImageOutputFormat::Png);
        assert_eq!(
            image_dimensions(&png, "image/png"),
            Some(Dimensions { width: 10, height: 7 })
        );

        let gif = encode(3, 4, ImageOutputFormat::Gif);
        assert_eq!(
            image_dimensions(&gif, "image/gif"),
            Some(Dimensions { width: 3, height: 4 })
        );

        let jpeg = encode(16, 8, ImageOutputFormat::Jpeg(80));
        assert_eq!(
            image_dimensions(&jpeg, "image/jpeg"),
            Some(Dimensions { width: 16, height: 8 })
        );
    }

    #[test]
    fn test_truncated_image_has_no_dimensions() {
        // PNG signature followed by garbage instead of an IHDR chunk
        let mut bytes = vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
        bytes.extend_from_slice(b"not really a png");
        assert_eq!(sniff_mime(&bytes), Some("image/png"));
        assert_eq!(image_dimensions(&bytes, "image/png"), None);
    }

    #[test]
    fn test_validate_image_order() {
        assert!(matches!(
            validate_image(b"", MAX_FILE_SIZE, DEFAULT_ALLOWED_MIME_TYPES),
            Err(UploadError::NoData)
        ));
        assert!(matches!(
            validate_image(b"plain text", 4, DEFAULT_ALLOWED_MIME_TYPES),
            Err(UploadError::PayloadTooLarge)
        ));
        assert!(matches!(
            validate_image(b"plain text", MAX_FILE_SIZE, DEFAULT_ALLOWED_MIME_TYPES),
            Err(UploadError::UnsupportedFormat)
        ));

        let png = encode(10, 10, ImageOutputFormat::Png);
        let (mime, dims) = validate_image(&png, MAX_FILE_SIZE, DEFAULT_ALLOWED_MIME_TYPES).unwrap();
        assert_eq!(mime, "image/png");
        assert_eq!(dims, Dimensions { width: 10, height: 10 });
    }
}
