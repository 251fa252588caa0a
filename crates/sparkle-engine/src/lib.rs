//! Sparkle engine crate.
//!
//! A minimal real-time rendering host: owns a window and a graphics context,
//! keeps a CPU pixel buffer in sync with the window size, and drives the
//! start → concurrent update/draw → stop lifecycle while registered drawers
//! contribute per-frame work.

pub mod asset;
pub mod buffer;
pub mod coords;
pub mod device;
pub mod diagnostics;
pub mod host;
pub mod input;
pub mod logging;
pub mod time;
pub mod window;

pub use asset::load_text_asset;
pub use buffer::{AllocError, PixelBuffer, Rgba};
pub use coords::{Point, Rect, Size};
pub use device::{Gpu, GpuInit};
pub use host::{
    App, BufferPolicy, Context, DrawerId, EngineConfig, Event, FramePacing, WindowConfig,
};
pub use window::{run, run_app, RuntimeConfig};
