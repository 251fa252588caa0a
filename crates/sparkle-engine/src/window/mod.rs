//! Window + runtime loop.
//!
//! Owns the `winit` EventLoop and Window, wires them to the GPU layer, and
//! feeds translated OS events into the host dispatcher.

mod runtime;

pub use runtime::{run, run_app, RuntimeConfig, WinitPlatform};
