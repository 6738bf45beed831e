// thumbnailer/src/core/job.rs
use super::ThumbnailError;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use url::Url;

/// Axis-aligned rectangle in source-pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub min: [i32; 2],
    pub max: [i32; 2],
}

impl Rect {
    pub fn new(min_x: i32, min_y: i32, max_x: i32, max_y: i32) -> Self {
        Self {
            min: [min_x, min_y],
            max: [max_x, max_y],
        }
    }

    /// Corners reordered so that min <= max on both axes.
    pub fn canonical(&self) -> Self {
        Self {
            min: [self.min[0].min(self.max[0]), self.min[1].min(self.max[1])],
            max: [self.min[0].max(self.max[0]), self.min[1].max(self.max[1])],
        }
    }

    /// Intersection with a `width` x `height` image as `(x, y, w, h)`,
    /// or `None` when nothing is left.
    pub fn clamp_to(&self, width: u32, height: u32) -> Option<(u32, u32, u32, u32)> {
        let r = self.canonical();
        let x0 = i64::from(r.min[0]).max(0);
        let y0 = i64::from(r.min[1]).max(0);
        let x1 = i64::from(r.max[0]).min(i64::from(width));
        let y1 = i64::from(r.max[1]).min(i64::from(height));

        if x1 <= x0 || y1 <= y0 {
            return None;
        }

        Some((x0 as u32, y0 as u32, (x1 - x0) as u32, (y1 - y0) as u32))
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "min: {:?}, max: {:?}", self.min, self.max)
    }
}

/// One requested derived image.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThumbnailOpt {
    #[serde(rename = "dstImage", default, skip_serializing_if = "Option::is_none")]
    pub dst_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rect: Option<Rect>,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
}

impl ThumbnailOpt {
    pub fn sized(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }

    pub fn cropped(rect: Rect, width: u32, height: u32) -> Self {
        Self {
            rect: Some(rect),
            width,
            height,
            ..Default::default()
        }
    }

    pub fn with_destination(mut self, dst_image: impl Into<String>) -> Self {
        self.dst_image = Some(dst_image.into());
        self
    }

    /// The explicit output location, ignoring empty strings.
    pub fn explicit_destination(&self) -> Option<&str> {
        self.dst_image.as_deref().filter(|d| !d.is_empty())
    }

    /// Neither crop nor resize: the output is a copy of the source.
    pub fn is_passthrough(&self) -> bool {
        self.rect.is_none() && self.width == 0 && self.height == 0
    }
}

/// One thumbnail generation request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub src_image: String,
    pub dst_folder: String,
    #[serde(default)]
    pub delete_src: bool,
    #[serde(default)]
    pub opts: Vec<ThumbnailOpt>,
}

impl Job {
    pub fn new(src_image: impl Into<String>, dst_folder: impl Into<String>) -> Self {
        Self {
            src_image: src_image.into(),
            dst_folder: dst_folder.into(),
            ..Default::default()
        }
    }

    pub fn with_opt(mut self, opt: ThumbnailOpt) -> Self {
        self.opts.push(opt);
        self
    }

    pub fn delete_source_on_success(mut self, delete: bool) -> Self {
        self.delete_src = delete;
        self
    }

    pub fn from_json(data: &str) -> serde_json::Result<Self> {
        serde_json::from_str(data)
    }
}

/// Outcome of one option. Exactly one of the fields is set.
#[derive(Debug)]
pub struct ThumbnailResult {
    pub thumbnail: Option<Url>,
    pub err: Option<ThumbnailError>,
}

impl ThumbnailResult {
    pub fn is_ok(&self) -> bool {
        self.err.is_none()
    }
}

impl From<Result<Url, ThumbnailError>> for ThumbnailResult {
    fn from(outcome: Result<Url, ThumbnailError>) -> Self {
        match outcome {
            Ok(url) => Self {
                thumbnail: Some(url),
                err: None,
            },
            Err(e) => Self {
                thumbnail: None,
                err: Some(e),
            },
        }
    }
}

impl Serialize for ThumbnailResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ThumbnailResult", 2)?;
        state.serialize_field("thumbnail", &self.thumbnail.as_ref().map(Url::as_str))?;
        state.serialize_field("err", &self.err.as_ref().map(|e| e.to_string()))?;
        state.end()
    }
}

/// Everything `Thumbnailer::process` observed for one job.
#[derive(Debug, Default)]
pub struct JobReport {
    pub results: Vec<ThumbnailResult>,
    pub source_deleted: bool,
    pub delete_error: Option<ThumbnailError>,
}

impl JobReport {
    pub fn failures(&self) -> impl Iterator<Item = &ThumbnailError> {
        self.results.iter().filter_map(|r| r.err.as_ref())
    }

    pub fn is_success(&self) -> bool {
        self.failures().next().is_none() && self.delete_error.is_none()
    }
}
