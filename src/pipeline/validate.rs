//! Upload validation: bounds checks on an in-memory image.
//!
//! One configurable validator replaces the two near-identical variants the
//! application grew historically — the bounds travel in
//! [`ValidationBounds`], so "10 MB, aspect 0.5–2.0" and "5 MB, aspect
//! 1.0–2.0" are two configurations of the same code, not two code paths
//! that drift apart.
//!
//! Checks run in a fixed order (type, size, aspect ratio, resolution,
//! category) and fail fast on the first violation. Validation never
//! mutates its input; resizing an out-of-bounds image is a separate,
//! explicit call to [`conform`].

use crate::config::ValidationBounds;
use crate::error::{Img2SumError, ValidationError};
use image::ImageReader;
use std::io::Cursor;
use std::path::Path;
use tracing::debug;

/// An uploaded image as received from the client, before any disk I/O.
///
/// Exists only for the duration of one request. `validate` treats it as
/// read-only; `conform` consumes it and returns a new value.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    /// Client-supplied filename. Never used as a storage path directly —
    /// see [`crate::pipeline::store`].
    pub filename: String,

    /// Client-supplied MIME type, "main/sub".
    pub content_type: String,

    /// Raw file bytes.
    pub bytes: Vec<u8>,

    /// Optional category label the client classified the image under.
    pub category: Option<String>,
}

impl UploadedImage {
    /// Decode just the pixel dimensions without a full pixel buffer.
    pub fn dimensions(&self) -> Result<(u32, u32), ValidationError> {
        ImageReader::new(Cursor::new(&self.bytes))
            .with_guessed_format()
            .map_err(|_| ValidationError::Undecodable)?
            .into_dimensions()
            .map_err(|_| ValidationError::Undecodable)
    }
}

/// Check an upload against the configured bounds.
///
/// Returns `Ok(())` and leaves the image untouched, or the first violated
/// bound as a [`ValidationError`] whose message names the configured
/// threshold.
///
/// Check order:
/// 1. MIME main part must be "image" and the subtype (lower-cased) must be
///    in `bounds.allowed_formats`
/// 2. Byte size must not exceed `bounds.max_file_size_mb`
/// 3. Aspect ratio (width ÷ height) must lie in the configured range
/// 4. Resolution (width × height) must lie in the configured range
/// 5. A supplied category must case-insensitively match the allow-list
pub fn validate(image: &UploadedImage, bounds: &ValidationBounds) -> Result<(), ValidationError> {
    let Some((main, sub)) = image.content_type.split_once('/') else {
        return Err(ValidationError::ContentType {
            content_type: image.content_type.clone(),
        });
    };
    let sub = sub.to_ascii_lowercase();
    if main != "image" || !bounds.allowed_formats.iter().any(|f| f == &sub) {
        return Err(ValidationError::Format {
            allowed: bounds.allowed_formats.join(", "),
        });
    }

    let size = image.bytes.len() as u64;
    if size > bounds.max_file_size_bytes() {
        return Err(ValidationError::TooLarge {
            max_mb: bounds.max_file_size_mb,
            got_mb: size as f64 / (1024.0 * 1024.0),
        });
    }

    let (width, height) = image.dimensions()?;
    let aspect_ratio = width as f64 / height as f64;
    let resolution = width as u64 * height as u64;

    if aspect_ratio < bounds.min_aspect_ratio || aspect_ratio > bounds.max_aspect_ratio {
        return Err(ValidationError::AspectRatio {
            min: bounds.min_aspect_ratio,
            max: bounds.max_aspect_ratio,
            actual: aspect_ratio,
        });
    }

    if resolution < bounds.min_resolution || resolution > bounds.max_resolution {
        return Err(ValidationError::Resolution {
            min: bounds.min_resolution,
            max: bounds.max_resolution,
            actual: resolution,
        });
    }

    if let Some(category) = image.category.as_deref() {
        let category = category.trim();
        if !category.is_empty()
            && !bounds
                .allowed_categories
                .iter()
                .any(|c| c.eq_ignore_ascii_case(category))
        {
            return Err(ValidationError::Category {
                category: category.to_string(),
            });
        }
    }

    debug!(
        filename = %image.filename,
        width,
        height,
        size,
        "upload passed validation"
    );
    Ok(())
}

/// Resize an image whose sides exceed the bounds and re-encode it as PNG.
///
/// This is the explicit form of what one historical validator did silently:
/// each side is clamped into the per-side range derived from the resolution
/// bounds, the pixels are resampled to exactly the clamped dimensions, and
/// the bytes are re-encoded. PNG is used because lossless re-encoding
/// preserves text crispness for the OCR stage downstream.
///
/// An image already within bounds is returned unchanged (no re-encode).
pub fn conform(
    image: UploadedImage,
    bounds: &ValidationBounds,
) -> Result<UploadedImage, Img2SumError> {
    let decoded = image::load_from_memory(&image.bytes).map_err(|e| Img2SumError::DecodeFailed {
        filename: image.filename.clone(),
        detail: e.to_string(),
    })?;

    let (lo, hi) = bounds.side_bounds();
    let (w, h) = (decoded.width(), decoded.height());
    let (cw, ch) = (w.clamp(lo, hi), h.clamp(lo, hi));
    if (cw, ch) == (w, h) {
        return Ok(image);
    }

    debug!(from = ?(w, h), to = ?(cw, ch), "conforming image dimensions");
    let resized = decoded.resize_exact(cw, ch, image::imageops::FilterType::Lanczos3);

    let mut buf = Vec::new();
    resized
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .map_err(|e| Img2SumError::DecodeFailed {
            filename: image.filename.clone(),
            detail: format!("re-encode failed: {e}"),
        })?;

    let stem = Path::new(&image.filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("image");

    Ok(UploadedImage {
        filename: format!("{stem}.png"),
        content_type: "image/png".into(),
        bytes: buf,
        category: image.category,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, Rgba, RgbaImage};

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img =
            DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, Rgba([90, 120, 40, 255])));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .expect("encode should succeed");
        buf
    }

    fn upload(width: u32, height: u32) -> UploadedImage {
        UploadedImage {
            filename: "test.png".into(),
            content_type: "image/png".into(),
            bytes: png_bytes(width, height),
            category: None,
        }
    }

    #[test]
    fn accepts_500_by_500_under_both_variants() {
        let img = upload(500, 500);
        assert_eq!(validate(&img, &ValidationBounds::default()), Ok(()));
        assert_eq!(validate(&img, &ValidationBounds::strict()), Ok(()));
    }

    #[test]
    fn rejects_disallowed_subtype() {
        let mut img = upload(500, 500);
        img.content_type = "image/bmp".into();
        let err = validate(&img, &ValidationBounds::default()).unwrap_err();
        assert!(matches!(err, ValidationError::Format { .. }));
        assert!(err.to_string().contains("jpeg, png, gif"));
    }

    #[test]
    fn subtype_check_is_case_insensitive() {
        let mut img = upload(500, 500);
        img.content_type = "image/JPEG".into();
        // The bytes are PNG but the declared type decides this check;
        // dimensions still decode via format sniffing.
        assert_eq!(validate(&img, &ValidationBounds::default()), Ok(()));
    }

    #[test]
    fn rejects_non_image_main_type() {
        let mut img = upload(500, 500);
        img.content_type = "application/png".into();
        assert!(matches!(
            validate(&img, &ValidationBounds::default()),
            Err(ValidationError::Format { .. })
        ));
    }

    #[test]
    fn rejects_malformed_content_type() {
        let mut img = upload(500, 500);
        img.content_type = "not-a-mime".into();
        assert!(matches!(
            validate(&img, &ValidationBounds::default()),
            Err(ValidationError::ContentType { .. })
        ));
    }

    #[test]
    fn rejects_oversize_before_decoding() {
        let bounds = ValidationBounds::default();
        let img = UploadedImage {
            filename: "big.png".into(),
            content_type: "image/png".into(),
            // Not decodable, but the size check fires first.
            bytes: vec![0u8; (bounds.max_file_size_bytes() + 1) as usize],
            category: None,
        };
        let err = validate(&img, &bounds).unwrap_err();
        assert!(matches!(err, ValidationError::TooLarge { max_mb: 10, .. }));
    }

    #[test]
    fn rejects_undecodable_bytes() {
        let img = UploadedImage {
            filename: "junk.png".into(),
            content_type: "image/png".into(),
            bytes: b"definitely not pixels".to_vec(),
            category: None,
        };
        assert!(matches!(
            validate(&img, &ValidationBounds::default()),
            Err(ValidationError::Undecodable)
        ));
    }

    #[test]
    fn resolution_lower_bound_is_inclusive() {
        let bounds = ValidationBounds::default();
        // 100×100 = 10 000 sits exactly on the bound.
        assert_eq!(validate(&upload(100, 100), &bounds), Ok(()));
        // 99×99 = 9 801 is below it.
        let err = validate(&upload(99, 99), &bounds).unwrap_err();
        assert!(matches!(err, ValidationError::Resolution { actual: 9801, .. }));
    }

    #[test]
    fn aspect_ratio_bounds_differ_between_variants() {
        // 100×150 → 0.667: fine under the lenient bounds, too tall for strict.
        let img = upload(100, 150);
        assert_eq!(validate(&img, &ValidationBounds::default()), Ok(()));
        assert!(matches!(
            validate(&img, &ValidationBounds::strict()),
            Err(ValidationError::AspectRatio { .. })
        ));
    }

    #[test]
    fn rejects_wide_aspect_ratio() {
        // 600×150 → 4.0, outside both variants.
        let err = validate(&upload(600, 150), &ValidationBounds::default()).unwrap_err();
        assert!(matches!(err, ValidationError::AspectRatio { .. }));
    }

    #[test]
    fn category_allow_list_is_case_insensitive() {
        let bounds = ValidationBounds::default();
        let mut img = upload(500, 500);

        img.category = Some("Nature".into());
        assert_eq!(validate(&img, &bounds), Ok(()));

        img.category = Some("cars".into());
        let err = validate(&img, &bounds).unwrap_err();
        assert_eq!(
            err,
            ValidationError::Category {
                category: "cars".into()
            }
        );

        // Absent or blank category is always accepted.
        img.category = Some("  ".into());
        assert_eq!(validate(&img, &bounds), Ok(()));
        img.category = None;
        assert_eq!(validate(&img, &bounds), Ok(()));
    }

    #[test]
    fn conform_clamps_oversized_sides_and_reencodes() {
        let bounds = ValidationBounds::default();
        let img = upload(2500, 1500);
        let conformed = conform(img, &bounds).expect("conform should succeed");

        assert_eq!(conformed.content_type, "image/png");
        assert_eq!(conformed.filename, "test.png");
        let (w, h) = conformed.dimensions().unwrap();
        assert_eq!((w, h), (2000, 1500));
        // The conformed image now passes validation.
        assert_eq!(validate(&conformed, &bounds), Ok(()));
    }

    #[test]
    fn conform_leaves_in_bounds_image_untouched() {
        let bounds = ValidationBounds::default();
        let img = upload(500, 500);
        let original_bytes = img.bytes.clone();
        let conformed = conform(img, &bounds).unwrap();
        assert_eq!(conformed.bytes, original_bytes);
    }

    #[test]
    fn conform_grows_a_too_small_image() {
        let bounds = ValidationBounds::default();
        let img = upload(50, 120);
        let conformed = conform(img, &bounds).unwrap();
        let (w, h) = conformed.dimensions().unwrap();
        assert_eq!((w, h), (100, 120));
    }
}
