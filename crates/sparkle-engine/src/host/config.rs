use anyhow::{ensure, Result};

use crate::buffer::Rgba;
use crate::coords::Size;
use crate::input::Key;
use crate::time::FramePacing;

/// Window creation parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowConfig {
    pub title: String,
    /// Initial width in physical pixels.
    pub width: u32,
    /// Initial height in physical pixels.
    pub height: u32,
}

impl WindowConfig {
    pub fn new(title: impl Into<String>, width: u32, height: u32) -> Self {
        Self { title: title.into(), width, height }
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Rejects zero dimensions; the back buffer must never be empty.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.width > 0 && self.height > 0,
            "window size must be non-zero, got {}",
            self.size()
        );
        Ok(())
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self::new("sparkle", 1024, 768)
    }
}

/// When the draw loop replaces the back buffer.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum BufferPolicy {
    /// Allocate a fresh buffer at the start of every frame.
    #[default]
    EveryFrame,
    /// Allocate only when the window size changed; otherwise clear the
    /// existing buffer to transparent.
    OnResize,
}

/// Behaviour of the host itself.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Key whose press closes the window through the normal teardown.
    pub exit_key: Option<Key>,

    /// Colour the window is cleared to before the frame is composited.
    pub clear_color: Rgba,

    pub buffer_policy: BufferPolicy,

    /// Pacing of the update loop. Unthrottled by default.
    pub update_pacing: FramePacing,

    /// Pacing of the draw loop. Unthrottled by default.
    pub draw_pacing: FramePacing,

    /// Draw the frames-per-second overlay.
    pub diagnostics: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            exit_key: Some(Key::Escape),
            clear_color: Rgba::BLACK,
            buffer_policy: BufferPolicy::EveryFrame,
            update_pacing: FramePacing::Unthrottled,
            draw_pacing: FramePacing::Unthrottled,
            diagnostics: true,
        }
    }
}
