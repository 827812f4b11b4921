use image::{codecs::jpeg::JpegEncoder, imageops::FilterType, ImageError};

pub struct NormalizedImage {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl NormalizedImage {
    pub fn byte_len(&self) -> usize {
        self.bytes.len()
    }
}

/// Decode an uploaded image, drop any alpha channel and bound the longer
/// edge to `max_px`, then re-encode as baseline JPEG at `jpeg_quality`.
///
/// Pure and deterministic; content-type and byte-size checks happen
/// before this is called, and all I/O stays with the caller. Images
/// already within bounds are never upscaled.
pub fn normalize(raw: &[u8], max_px: u32, jpeg_quality: u8) -> Result<NormalizedImage, ImageError> {
    let mut img = image::load_from_memory(raw)?;
    if img.width().max(img.height()) > max_px {
        img = img.resize(max_px, max_px, FilterType::Lanczos3);
    }
    let rgb = img.to_rgb8();
    let (width, height) = rgb.dimensions();

    let mut out = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut out, jpeg_quality);
    rgb.write_with_encoder(encoder)?;

    Ok(NormalizedImage {
        bytes: out,
        width,
        height,
    })
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use image::ImageFormat;

    use super::*;

    fn png_bytes(w: u32, h: u32) -> Vec<u8> {
        let img = image::RgbImage::from_fn(w, h, |x, y| {
            image::Rgb([(x % 251) as u8, (y % 241) as u8, 128])
        });
        let mut out = Vec::new();
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
            .unwrap();
        out
    }

    fn rgba_png_bytes(w: u32, h: u32) -> Vec<u8> {
        let img = image::RgbaImage::from_fn(w, h, |x, _| {
            image::Rgba([200, 50, 50, (x % 255) as u8])
        });
        let mut out = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
            .unwrap();
        out
    }

    #[test]
    fn oversized_image_is_bounded_to_max_edge() {
        let raw = png_bytes(1600, 1200);
        let norm = normalize(&raw, 800, 85).unwrap();
        assert_eq!(norm.width.max(norm.height), 800);
        // 4:3 aspect survives the downscale
        assert_eq!((norm.width, norm.height), (800, 600));
        assert!(norm.byte_len() > 0);
    }

    #[test]
    fn portrait_aspect_is_preserved() {
        let raw = png_bytes(500, 1000);
        let norm = normalize(&raw, 800, 85).unwrap();
        assert_eq!((norm.width, norm.height), (400, 800));
    }

    #[test]
    fn small_image_is_not_upscaled() {
        let raw = png_bytes(320, 200);
        let norm = normalize(&raw, 800, 85).unwrap();
        assert_eq!((norm.width, norm.height), (320, 200));
    }

    #[test]
    fn alpha_channel_is_discarded_and_output_is_jpeg() {
        let raw = rgba_png_bytes(100, 100);
        let norm = normalize(&raw, 800, 85).unwrap();
        assert_eq!(image::guess_format(&norm.bytes).unwrap(), ImageFormat::Jpeg);
        let decoded = image::load_from_memory(&norm.bytes).unwrap();
        assert_eq!(decoded.color().channel_count(), 3);
    }

    #[test]
    fn identical_input_gives_identical_output() {
        let raw = png_bytes(900, 900);
        let a = normalize(&raw, 800, 85).unwrap();
        let b = normalize(&raw, 800, 85).unwrap();
        assert_eq!(a.bytes, b.bytes);
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        assert!(normalize(b"definitely not an image", 800, 85).is_err());
    }
}
