//! CPU-side images and the asynchronous loading seam.

mod loader;
mod source;

pub use loader::{FileImageLoader, ImageFuture, ImageLoader, ready};
pub(crate) use loader::poll_once;
pub use source::ImageSource;
