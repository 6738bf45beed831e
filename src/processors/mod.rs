// thumbnailer/src/processors/mod.rs
pub mod codec;
pub mod naming;
pub mod resizer;

pub use codec::ImageKind;
pub use naming::{thumbnail_file_name, thumbnail_url, SourceName};
pub use resizer::{Rendered, Resizer};

pub mod prelude {
    pub use super::{ImageKind, Rendered, Resizer, SourceName};
}
