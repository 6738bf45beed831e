// thumbnailer/src/processors/codec.rs
use crate::core::{Result, ThumbnailError};
use crate::utils::get_file_extension;
use image::codecs::bmp::BmpEncoder;
use image::codecs::gif::GifEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{
    DynamicImage, ExtendedColorType, GenericImageView, ImageEncoder, ImageFormat, Rgb, RgbImage,
    RgbaImage,
};
use std::fmt;
use std::io::Cursor;
use tiff::encoder::compression::DeflateLevel;
use tiff::encoder::{colortype, Compression, TiffEncoder};
use tiff::tags::Predictor;

pub const JPEG_QUALITY: u8 = 75;

/// NeuQuant sampling factor. The quantizer always builds a 256-entry palette.
pub const GIF_QUANTIZER_SPEED: i32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Jpeg,
    Png,
    Gif,
    Tiff,
    Bmp,
}

impl ImageKind {
    /// Accepts the extension with or without its leading dot, in any case.
    pub fn from_extension(ext: &str) -> Result<Self> {
        let ext = ext.trim_start_matches('.').to_lowercase();
        match ext.as_str() {
            "jpg" | "jpeg" => Ok(Self::Jpeg),
            "png" => Ok(Self::Png),
            "gif" => Ok(Self::Gif),
            "tif" | "tiff" => Ok(Self::Tiff),
            "bmp" => Ok(Self::Bmp),
            _ => Err(ThumbnailError::UnsupportedFormat(format!(
                "unrecognized extension {:?}",
                ext
            ))),
        }
    }

    pub fn from_path(path: &str) -> Result<Self> {
        let ext = get_file_extension(path).ok_or_else(|| {
            ThumbnailError::UnsupportedFormat(format!("no extension in {:?}", path))
        })?;
        Self::from_extension(&ext)
    }

    pub fn image_format(self) -> ImageFormat {
        match self {
            Self::Jpeg => ImageFormat::Jpeg,
            Self::Png => ImageFormat::Png,
            Self::Gif => ImageFormat::Gif,
            Self::Tiff => ImageFormat::Tiff,
            Self::Bmp => ImageFormat::Bmp,
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Gif => "image/gif",
            Self::Tiff => "image/tiff",
            Self::Bmp => "image/bmp",
        }
    }
}

impl fmt::Display for ImageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Jpeg => "JPEG",
            Self::Png => "PNG",
            Self::Gif => "GIF",
            Self::Tiff => "TIFF",
            Self::Bmp => "BMP",
        };
        f.write_str(name)
    }
}

/// Decodes `data` as `kind`. JPEG goes through the `image` crate's SIMD
/// decoder; geometry and channel layout match the other decoders.
pub fn decode(data: &[u8], kind: ImageKind) -> Result<DynamicImage> {
    let image =
        image::load_from_memory_with_format(data, kind.image_format()).map_err(ThumbnailError::Decode)?;

    log::debug!(
        "Decoded {} image: {}x{} pixels, color: {:?}",
        kind,
        image.width(),
        image.height(),
        image.color()
    );

    Ok(image)
}

pub fn encode(image: &RgbaImage, kind: ImageKind) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let (width, height) = image.dimensions();

    match kind {
        ImageKind::Jpeg => encode_jpeg(image, &mut buffer)?,
        ImageKind::Png => PngEncoder::new(&mut buffer)
            .write_image(image.as_raw(), width, height, ExtendedColorType::Rgba8)
            .map_err(encode_error)?,
        ImageKind::Gif => {
            let mut encoder = GifEncoder::new_with_speed(&mut buffer, GIF_QUANTIZER_SPEED);
            encoder
                .encode(image.as_raw(), width, height, ExtendedColorType::Rgba8)
                .map_err(encode_error)?;
        }
        ImageKind::Tiff => buffer = encode_tiff(image)?,
        ImageKind::Bmp => BmpEncoder::new(&mut buffer)
            .write_image(image.as_raw(), width, height, ExtendedColorType::Rgba8)
            .map_err(encode_error)?,
    }

    log::debug!(
        "Encoded {}x{} {} image ({} bytes)",
        width,
        height,
        kind,
        buffer.len()
    );

    Ok(buffer)
}

pub fn is_opaque(image: &RgbaImage) -> bool {
    image.pixels().all(|p| p.0[3] == u8::MAX)
}

/// Presents an opaque RGBA buffer as RGB pixels without copying it.
struct OpaqueRgbView<'a>(&'a RgbaImage);

impl GenericImageView for OpaqueRgbView<'_> {
    type Pixel = Rgb<u8>;

    fn dimensions(&self) -> (u32, u32) {
        self.0.dimensions()
    }

    fn get_pixel(&self, x: u32, y: u32) -> Rgb<u8> {
        let [r, g, b, _] = self.0.get_pixel(x, y).0;
        Rgb([r, g, b])
    }
}

fn encode_jpeg(image: &RgbaImage, buffer: &mut Vec<u8>) -> Result<()> {
    let mut encoder = JpegEncoder::new_with_quality(buffer, JPEG_QUALITY);

    if is_opaque(image) {
        return encoder
            .encode_image(&OpaqueRgbView(image))
            .map_err(encode_error);
    }

    // JPEG has no alpha: composite over black into a fresh buffer.
    let flattened = RgbImage::from_fn(image.width(), image.height(), |x, y| {
        let [r, g, b, a] = image.get_pixel(x, y).0;
        Rgb([premultiply(r, a), premultiply(g, a), premultiply(b, a)])
    });
    encoder.encode_image(&flattened).map_err(encode_error)
}

fn premultiply(channel: u8, alpha: u8) -> u8 {
    ((u16::from(channel) * u16::from(alpha) + 127) / 255) as u8
}

fn encode_tiff(image: &RgbaImage) -> Result<Vec<u8>> {
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut encoder = TiffEncoder::new(&mut cursor)
            .map_err(tiff_error)?
            .with_compression(Compression::Deflate(DeflateLevel::Balanced))
            .with_predictor(Predictor::Horizontal);
        encoder
            .write_image::<colortype::RGBA8>(image.width(), image.height(), image.as_raw())
            .map_err(tiff_error)?;
    }
    Ok(cursor.into_inner())
}

fn encode_error(e: image::ImageError) -> ThumbnailError {
    ThumbnailError::Encode(e.to_string())
}

fn tiff_error(e: tiff::TiffError) -> ThumbnailError {
    ThumbnailError::Encode(format!("TIFF: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn gradient(width: u32, height: u32, alpha: u8) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| {
            Rgba([(x * 7 % 256) as u8, (y * 5 % 256) as u8, 128, alpha])
        })
    }

    #[test]
    fn recognizes_extensions_case_insensitively() {
        assert_eq!(ImageKind::from_extension("JPG").unwrap(), ImageKind::Jpeg);
        assert_eq!(ImageKind::from_extension(".jpeg").unwrap(), ImageKind::Jpeg);
        assert_eq!(ImageKind::from_extension("Tif").unwrap(), ImageKind::Tiff);
        assert_eq!(ImageKind::from_path("/x/y.BMP").unwrap(), ImageKind::Bmp);
        assert!(matches!(
            ImageKind::from_extension("webp"),
            Err(ThumbnailError::UnsupportedFormat(_))
        ));
        assert!(matches!(
            ImageKind::from_path("/x/noext"),
            Err(ThumbnailError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn mime_types() {
        assert_eq!(ImageKind::Jpeg.mime_type(), "image/jpeg");
        assert_eq!(ImageKind::Tiff.mime_type(), "image/tiff");
    }

    #[test]
    fn every_format_round_trips_dimensions() {
        let image = gradient(37, 21, 255);
        for ext in ["jpg", "jpeg", "png", "gif", "tif", "tiff", "bmp"] {
            let kind = ImageKind::from_extension(ext).unwrap();
            let bytes = encode(&image, kind).unwrap();
            let decoded = decode(&bytes, kind).unwrap();
            assert_eq!(decoded.dimensions(), (37, 21), "{}", ext);
        }
    }

    #[test]
    fn lossless_formats_preserve_pixels() {
        let image = gradient(16, 9, 200);
        for kind in [ImageKind::Png, ImageKind::Tiff] {
            let bytes = encode(&image, kind).unwrap();
            let decoded = decode(&bytes, kind).unwrap().into_rgba8();
            assert_eq!(decoded, image, "{}", kind);
        }
    }

    #[test]
    fn tiff_uses_deflate_with_horizontal_predictor() {
        use tiff::decoder::Decoder;
        use tiff::tags::{CompressionMethod, Tag};

        let bytes = encode(&gradient(12, 7, 255), ImageKind::Tiff).unwrap();
        let mut decoder = Decoder::new(Cursor::new(bytes)).unwrap();

        assert_eq!(decoder.dimensions().unwrap(), (12, 7));
        assert_eq!(
            decoder.get_tag_u32(Tag::Compression).unwrap(),
            u32::from(CompressionMethod::Deflate.to_u16())
        );
        assert_eq!(
            decoder.get_tag_u32(Tag::Predictor).unwrap(),
            u32::from(Predictor::Horizontal.to_u16())
        );
    }

    #[test]
    fn jpeg_is_encoded_at_quality_75() {
        let image = gradient(24, 16, 255);
        let rgb = DynamicImage::ImageRgba8(image.clone()).to_rgb8();

        let mut expected = Vec::new();
        JpegEncoder::new_with_quality(&mut expected, 75)
            .encode_image(&rgb)
            .unwrap();

        assert_eq!(encode(&image, ImageKind::Jpeg).unwrap(), expected);
    }

    #[test]
    fn gif_palette_has_at_most_256_colors() {
        // 64x64 with distinct red/green pairs: 4096 source colors.
        let image = RgbaImage::from_fn(64, 64, |x, y| {
            Rgba([(x * 4) as u8, (y * 4) as u8, ((x + y) * 2) as u8, 255])
        });

        let bytes = encode(&image, ImageKind::Gif).unwrap();
        let decoded = decode(&bytes, ImageKind::Gif).unwrap().into_rgba8();

        let colors: std::collections::HashSet<[u8; 4]> =
            decoded.pixels().map(|p| p.0).collect();
        assert_eq!(decoded.dimensions(), (64, 64));
        assert!(colors.len() <= 256, "{} colors", colors.len());
        assert!(colors.len() > 16);
    }

    #[test]
    fn translucent_jpeg_is_flattened() {
        let image = RgbaImage::from_pixel(8, 8, Rgba([255, 255, 255, 0]));
        assert!(!is_opaque(&image));

        let bytes = encode(&image, ImageKind::Jpeg).unwrap();
        let decoded = decode(&bytes, ImageKind::Jpeg).unwrap().into_rgb8();
        assert!(decoded.pixels().all(|p| p.0.iter().all(|&c| c < 8)));
    }

    #[test]
    fn opaque_jpeg_keeps_colors() {
        let image = RgbaImage::from_pixel(8, 8, Rgba([250, 250, 250, 255]));
        assert!(is_opaque(&image));

        let bytes = encode(&image, ImageKind::Jpeg).unwrap();
        let decoded = decode(&bytes, ImageKind::Jpeg).unwrap().into_rgb8();
        assert!(decoded.pixels().all(|p| p.0.iter().all(|&c| c > 240)));
    }

    #[test]
    fn garbage_fails_to_decode() {
        let result = decode(b"definitely not a png", ImageKind::Png);
        assert!(matches!(result, Err(ThumbnailError::Decode(_))));
    }

    #[test]
    fn premultiply_bounds() {
        assert_eq!(premultiply(255, 255), 255);
        assert_eq!(premultiply(255, 0), 0);
        assert_eq!(premultiply(200, 128), 100);
    }
}
