//! CPU back buffer written by drawers and uploaded once per frame.

mod error;
mod pixel;

pub use error::AllocError;
pub use pixel::{PixelBuffer, Rgba};
