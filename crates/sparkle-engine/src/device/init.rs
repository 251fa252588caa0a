/// Parameters for creating the window's [`Gpu`](super::Gpu).
#[derive(Debug, Clone)]
pub struct GpuInit {
    /// Pick `Bgra8UnormSrgb`/`Rgba8UnormSrgb` when the surface offers one.
    /// Back buffers hold sRGB-encoded bytes either way.
    pub prefer_srgb: bool,

    /// Defaults to `AutoNoVsync`: the draw loop is unthrottled, so presenting
    /// should not block on vblank. Use `Fifo` (or a `FramePacing::Interval`
    /// draw pacing) to cap the frame rate.
    pub present_mode: wgpu::PresentMode,

    /// Requested alpha mode; replaced by the first supported one if the
    /// surface rejects it.
    pub alpha_mode: Option<wgpu::CompositeAlphaMode>,

    pub required_features: wgpu::Features,
    pub required_limits: wgpu::Limits,

    /// Swapchain depth hint.
    pub desired_maximum_frame_latency: u32,
}

impl GpuInit {
    /// Switches between vsync'd (`Fifo`) and unthrottled presentation.
    pub fn with_vsync(mut self, vsync: bool) -> Self {
        self.present_mode = if vsync {
            wgpu::PresentMode::Fifo
        } else {
            wgpu::PresentMode::AutoNoVsync
        };
        self
    }
}

impl Default for GpuInit {
    fn default() -> Self {
        Self {
            prefer_srgb: true,
            present_mode: wgpu::PresentMode::AutoNoVsync,
            alpha_mode: None,
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            desired_maximum_frame_latency: 2,
        }
    }
}
