// thumbnailer/src/processors/resizer.rs
use crate::core::{
    Rect, ResizeAlgorithm, Result, ThumbnailError, ThumbnailOpt, MAX_DIMENSION, MAX_PIXELS,
};
use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbaImage};

/// A thumbnail rendered in memory, waiting to be named and stored.
#[derive(Debug)]
pub struct Rendered {
    pub image: RgbaImage,
    pub width: u32,
    pub height: u32,
}

impl Rendered {
    fn new(image: RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            image,
            width,
            height,
        }
    }
}

/// Converts any decoded image to 8-bit non-premultiplied RGBA, reusing the
/// buffer when it already is.
pub fn to_canonical(image: DynamicImage) -> RgbaImage {
    match image {
        DynamicImage::ImageRgba8(buffer) => buffer,
        other => other.into_rgba8(),
    }
}

/// Resolves a requested box against a source size. A zero dimension follows
/// the aspect ratio of the other one, never below 1px. `None` means no resize.
pub fn resolve_dimensions(source: (u32, u32), target: (u32, u32)) -> Option<(u32, u32)> {
    let (src_w, src_h) = source;
    match target {
        (0, 0) => None,
        (0, h) => Some((derive(h, src_w, src_h), h)),
        (w, 0) => Some((w, derive(w, src_h, src_w))),
        (w, h) => Some((w, h)),
    }
}

fn derive(other: u32, source_opposite: u32, source_same: u32) -> u32 {
    if source_same == 0 {
        return 1;
    }
    let value = f64::from(other) * f64::from(source_opposite) / f64::from(source_same);
    value.round().max(1.0) as u32
}

/// Rejects resize targets above `MAX_DIMENSION` per side or `MAX_PIXELS`
/// in total.
pub fn check_dimensions(dimensions: (u32, u32)) -> Result<(u32, u32)> {
    let (width, height) = dimensions;
    if width > MAX_DIMENSION || height > MAX_DIMENSION {
        return Err(ThumbnailError::InvalidParameter(format!(
            "Dimensions {}x{} too large (max {} pixels per side)",
            width, height, MAX_DIMENSION
        )));
    }
    if u64::from(width) * u64::from(height) > MAX_PIXELS {
        return Err(ThumbnailError::InvalidParameter(format!(
            "Dimensions {}x{} too large (max {} pixels)",
            width, height, MAX_PIXELS
        )));
    }
    Ok(dimensions)
}

/// Component-wise maximum box of the options that may share a pre-resized
/// source: no crop, an actual resize and a box within limits.
pub fn shared_box(source: (u32, u32), opts: &[ThumbnailOpt]) -> Option<(u32, u32)> {
    opts.iter()
        .filter(|opt| opt.rect.is_none())
        .filter_map(|opt| resolve_dimensions(source, (opt.width, opt.height)))
        .filter(|&dimensions| check_dimensions(dimensions).is_ok())
        .reduce(|(max_w, max_h), (w, h)| (max_w.max(w), max_h.max(h)))
}

pub struct Resizer {
    algorithm: ResizeAlgorithm,
}

impl Resizer {
    pub fn new(algorithm: ResizeAlgorithm) -> Self {
        Self { algorithm }
    }

    pub fn resize(&self, image: &RgbaImage, width: u32, height: u32) -> RgbaImage {
        if (width, height) == image.dimensions() {
            log::debug!("Image dimensions unchanged, skipping resize");
            return image.clone();
        }

        log::debug!(
            "Resizing image from {}x{} to {}x{}",
            image.width(),
            image.height(),
            width,
            height
        );

        imageops::resize(image, width, height, self.get_filter_type())
    }

    pub fn crop(&self, image: &RgbaImage, rect: &Rect) -> Result<RgbaImage> {
        let (width, height) = image.dimensions();
        let (x, y, w, h) = rect.clamp_to(width, height).ok_or_else(|| {
            ThumbnailError::InvalidParameter(format!(
                "Crop rectangle ({}) lies outside the {}x{} source",
                rect, width, height
            ))
        })?;

        Ok(imageops::crop_imm(image, x, y, w, h).to_image())
    }

    /// Resizes the canonical source once to the largest crop-free box of
    /// `opts`. Returns `None` when nothing would be gained.
    pub fn shared_pre_resize(&self, source: &RgbaImage, opts: &[ThumbnailOpt]) -> Option<RgbaImage> {
        let (width, height) = shared_box(source.dimensions(), opts)?;
        if (width, height) == source.dimensions() {
            return None;
        }

        log::debug!("Shared pre-resize box: {}x{}", width, height);
        Some(self.resize(source, width, height))
    }

    /// Crop, then resize or clone. `original` is the full-resolution
    /// canonical source; `shared` is the optional pre-resized copy that
    /// crop-free options resize from.
    pub fn render(
        &self,
        original: &RgbaImage,
        shared: Option<&RgbaImage>,
        opt: &ThumbnailOpt,
    ) -> Result<Rendered> {
        let target = (opt.width, opt.height);

        if let Some(rect) = &opt.rect {
            let cropped = self.crop(original, rect)?;
            let image = match resolve_dimensions(cropped.dimensions(), target) {
                Some(dimensions) => {
                    let (w, h) = check_dimensions(dimensions)?;
                    self.resize(&cropped, w, h)
                }
                None => cropped,
            };
            return Ok(Rendered::new(image));
        }

        let image = match resolve_dimensions(original.dimensions(), target) {
            Some(dimensions) => {
                let (w, h) = check_dimensions(dimensions)?;
                self.resize(shared.unwrap_or(original), w, h)
            }
            None => original.clone(),
        };
        Ok(Rendered::new(image))
    }

    fn get_filter_type(&self) -> FilterType {
        match self.algorithm {
            ResizeAlgorithm::Nearest => FilterType::Nearest,
            ResizeAlgorithm::Bilinear => FilterType::Triangle,
            ResizeAlgorithm::Bicubic => FilterType::CatmullRom,
            ResizeAlgorithm::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

impl Default for Resizer {
    fn default() -> Self {
        Self::new(ResizeAlgorithm::default())
    }
}
