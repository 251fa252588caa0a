//! Input subsystem.
//!
//! Public API does not expose winit types; `platform::winit` translates.

pub(crate) mod platform;
mod types;

pub use types::{Key, KeyEvent, KeyState};
