// thumbnailer/src/lib.rs
mod cli;
pub mod core;
pub mod processors;
pub mod store;
pub mod utils;

pub use cli::{Algorithm, Cli, Commands, Naming};
pub use core::{
    Job, JobReport, JobStage, ObjectStoreConfig, PassthroughNaming, Rect,
    ResizeAlgorithm, Result, ThumbnailError, ThumbnailOpt, ThumbnailResult, Thumbnailer,
    ThumbnailerConfig,
};
pub use processors::{ImageKind, Resizer};
pub use store::{parse_location, ImageStore, StoreContext};

pub mod prelude {
    pub use crate::{
        Job, ThumbnailOpt, ThumbnailResult, Thumbnailer, ThumbnailerConfig, ResizeAlgorithm,
        PassthroughNaming,
    };
}
