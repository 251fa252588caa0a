//! Time subsystem.
//!
//! Frame timing utilities used by the draw loop and the diagnostics overlay,
//! plus the optional pacing applied to the update and draw loops.

mod frame_clock;
mod pacer;

pub use frame_clock::{FrameClock, FrameTime};
pub use pacer::{FramePacer, FramePacing};
