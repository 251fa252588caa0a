use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use anyhow::{Context as _, Result};
use parking_lot::Mutex;
use winit::application::ApplicationHandler;
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop, EventLoopProxy};
use winit::window::{Window, WindowId};

use crate::buffer::{AllocError, PixelBuffer};
use crate::coords::{Point, Size};
use crate::device::{Gpu, GpuInit};
use crate::host::{
    App, Callbacks, Context, Dispatcher, EngineConfig, Event, Flow, Platform, WindowConfig,
};
use crate::input::platform::winit::translate_key_event;

/// Everything needed to open and drive one window.
#[derive(Debug, Clone, Default)]
pub struct RuntimeConfig {
    pub window: WindowConfig,
    pub engine: EngineConfig,
    pub gpu: GpuInit,
}

/// Runs the host with closure callbacks until the window closes.
///
/// Blocks the calling thread, which must be the main thread on platforms that
/// require it. Returns the shared context; its graphics handle is cleared by
/// then.
pub fn run<S, T, U>(window: WindowConfig, start: S, stop: T, update: U) -> Result<Arc<Context>>
where
    S: FnMut(&Context) + Send + 'static,
    T: FnMut(&Context) + Send + 'static,
    U: FnMut(&Context) + Send + 'static,
{
    let config = RuntimeConfig { window, ..RuntimeConfig::default() };
    run_app(config, Callbacks::new(start, stop, update))
}

/// Runs the host with an [`App`] implementation until the window closes.
pub fn run_app<A>(config: RuntimeConfig, app: A) -> Result<Arc<Context>>
where
    A: App<Gpu>,
{
    let RuntimeConfig { window, engine, gpu } = config;
    window.validate()?;

    let event_loop = EventLoop::<Event<Gpu>>::with_user_event()
        .build()
        .context("failed to create winit EventLoop")?;

    let platform = Arc::new(WinitPlatform::new(event_loop.create_proxy()));
    let buffer = platform
        .allocate(window.size())
        .context("failed to allocate initial back buffer")?;
    let ctx = Arc::new(Context::new(window.size(), buffer));

    let dispatcher = Dispatcher::new(ctx.clone(), platform.clone(), engine, app);
    let mut host = WinitHost {
        window_config: window,
        gpu_init: gpu,
        platform,
        dispatcher,
        window: None,
        finished: false,
        error: None,
    };

    event_loop
        .run_app(&mut host)
        .context("winit event loop terminated with error")?;

    match host.error.take() {
        Some(err) => Err(err),
        None => Ok(ctx),
    }
}

/// [`Platform`] backed by a winit event loop.
///
/// Posted events travel through an [`EventLoopProxy`] and come back on the
/// main thread as user events.
pub struct WinitPlatform {
    proxy: Mutex<EventLoopProxy<Event<Gpu>>>,
    max_dimension: AtomicU32,
}

impl WinitPlatform {
    /// Texture limit assumed until a device reports its own.
    const DEFAULT_MAX_DIMENSION: u32 = 8192;

    fn new(proxy: EventLoopProxy<Event<Gpu>>) -> Self {
        Self {
            proxy: Mutex::new(proxy),
            max_dimension: AtomicU32::new(Self::DEFAULT_MAX_DIMENSION),
        }
    }

    fn set_max_dimension(&self, limit: u32) {
        self.max_dimension.store(limit, Ordering::Relaxed);
    }
}

impl Platform for WinitPlatform {
    type Graphics = Gpu;

    fn allocate(&self, size: Size) -> Result<PixelBuffer, AllocError> {
        let limit = self.max_dimension.load(Ordering::Relaxed);
        if size.width > limit || size.height > limit {
            return Err(AllocError::TooLarge { size, limit });
        }
        PixelBuffer::try_new(size)
    }

    fn post(&self, event: Event<Gpu>) {
        if let Err(err) = self.proxy.lock().send_event(event) {
            log::trace!("dropping {:?}: event loop closed", err.0);
        }
    }
}

struct WinitHost<A: App<Gpu>> {
    window_config: WindowConfig,
    gpu_init: GpuInit,
    platform: Arc<WinitPlatform>,
    dispatcher: Dispatcher<WinitPlatform, A>,

    window: Option<Arc<Window>>,

    /// Set once the dispatcher exited; later events are dropped.
    finished: bool,
    error: Option<anyhow::Error>,
}

impl<A: App<Gpu>> WinitHost<A> {
    fn dispatch(&mut self, event_loop: &ActiveEventLoop, event: Event<Gpu>) {
        if self.finished {
            return;
        }

        match self.dispatcher.handle(event) {
            Ok(Flow::Continue) => {}
            Ok(Flow::Exit) => self.finish(event_loop),
            Err(err) => {
                log::error!("{err:#}");
                self.error = Some(err);
                self.finish(event_loop);
            }
        }
    }

    fn finish(&mut self, event_loop: &ActiveEventLoop) {
        self.finished = true;
        event_loop.exit();
    }

    fn create_window(&self, event_loop: &ActiveEventLoop) -> Result<(Arc<Window>, Gpu)> {
        let attrs = Window::default_attributes()
            .with_title(self.window_config.title.clone())
            .with_inner_size(PhysicalSize::new(
                self.window_config.width,
                self.window_config.height,
            ));

        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .context("failed to create window")?,
        );

        let gpu = pollster::block_on(Gpu::new(window.clone(), self.gpu_init.clone()))
            .context("GPU initialization failed for window")?;

        Ok((window, gpu))
    }
}

impl<A: App<Gpu>> ApplicationHandler<Event<Gpu>> for WinitHost<A> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() || self.finished {
            return;
        }

        let (window, gpu) = match self.create_window(event_loop) {
            Ok(created) => created,
            Err(err) => {
                log::error!("failed to create initial window: {err:#}");
                self.error = Some(err);
                self.finish(event_loop);
                return;
            }
        };

        self.platform.set_max_dimension(gpu.max_texture_dimension());
        let size = Size::from(window.inner_size());
        self.window = Some(window);

        // The OS may have picked a different size than requested.
        self.dispatch(event_loop, Event::Resize(size));
        self.dispatch(event_loop, Event::Visible(gpu));
    }

    fn suspended(&mut self, event_loop: &ActiveEventLoop) {
        self.dispatch(event_loop, Event::Hidden);
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: Event<Gpu>) {
        self.dispatch(event_loop, event);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let translated = match event {
            WindowEvent::CloseRequested => Event::Hidden,
            WindowEvent::Resized(size) => Event::Resize(size.into()),
            WindowEvent::ScaleFactorChanged { .. } => match &self.window {
                Some(window) => Event::Resize(window.inner_size().into()),
                None => return,
            },
            WindowEvent::KeyboardInput { event, .. } => Event::Key(translate_key_event(&event)),
            WindowEvent::CursorMoved { position, .. } => Event::Pointer(cursor_point(position)),
            _ => return,
        };

        self.dispatch(event_loop, translated);
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        // Frames come from the draw thread, not from redraw requests.
        event_loop.set_control_flow(ControlFlow::Wait);
    }
}

fn cursor_point(position: PhysicalPosition<f64>) -> Point {
    Point::new(position.x as f32, position.y as f32)
}
