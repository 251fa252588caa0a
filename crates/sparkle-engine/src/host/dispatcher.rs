use std::sync::Arc;
use std::thread::JoinHandle;

use anyhow::{Context as _, Result};
use crossbeam_channel::Receiver;
use parking_lot::Mutex;

use crate::coords::Size;
use crate::diagnostics::Diagnostics;
use crate::input::KeyEvent;

use super::draw::DrawLoop;
use super::session::{cancellation, Session};
use super::update::run_update_loop;
use super::{App, Context, EngineConfig, Event, Platform};

/// What the event source should do after an event was handled.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Flow {
    Continue,
    /// The visible session ended; stop delivering events.
    Exit,
}

/// Lifecycle state machine driven by platform events.
///
/// Owns the running session (if any). Start and stop hooks run on the thread
/// calling [`Dispatcher::handle`], never concurrently with the loops.
pub struct Dispatcher<P: Platform, A: App<P::Graphics>> {
    ctx: Arc<Context<P::Graphics>>,
    platform: Arc<P>,
    app: Arc<Mutex<A>>,
    config: EngineConfig,
    session: Option<Session>,
}

impl<P, A> Dispatcher<P, A>
where
    P: Platform,
    A: App<P::Graphics>,
{
    pub fn new(
        ctx: Arc<Context<P::Graphics>>,
        platform: Arc<P>,
        config: EngineConfig,
        app: A,
    ) -> Self {
        Self {
            ctx,
            platform,
            app: Arc::new(Mutex::new(app)),
            config,
            session: None,
        }
    }

    pub fn context(&self) -> &Arc<Context<P::Graphics>> {
        &self.ctx
    }

    /// True between a handled `Visible` and the matching `Hidden`.
    pub fn is_visible(&self) -> bool {
        self.session.is_some()
    }

    /// Pulls events from `events` until the session ends.
    ///
    /// A disconnected queue is treated like `Hidden`.
    pub fn run(&mut self, events: &Receiver<Event<P::Graphics>>) -> Result<()> {
        loop {
            let event = match events.recv() {
                Ok(event) => event,
                Err(_) => {
                    log::warn!("event queue closed; shutting down");
                    self.handle(Event::Hidden)?;
                    return Ok(());
                }
            };

            if self.handle(event)? == Flow::Exit {
                return Ok(());
            }
        }
    }

    /// Applies one platform event.
    ///
    /// Errors are fatal for the window: a failed resize allocation (loops are
    /// stopped first) or a loop failure reported during teardown.
    pub fn handle(&mut self, event: Event<P::Graphics>) -> Result<Flow> {
        log::trace!("dispatching {} event", event.kind());

        match event {
            Event::Visible(graphics) => self.enter(graphics)?,
            Event::Hidden => return self.exit(),
            Event::Resize(size) => self.resize(size)?,
            Event::Key(key) => self.key(key),
            Event::Pointer(p) => self.ctx.set_pointer(p),
        }

        Ok(Flow::Continue)
    }

    fn enter(&mut self, graphics: P::Graphics) -> Result<()> {
        if self.session.is_some() {
            log::warn!("already visible; ignoring duplicate visibility event");
            return Ok(());
        }

        self.ctx.set_graphics(Some(graphics.clone()));
        self.host_start();
        self.app.lock().start(&self.ctx);

        let (canceller, signal) = cancellation();

        let update = {
            let (ctx, platform, app) = (self.ctx.clone(), self.platform.clone(), self.app.clone());
            let (signal, pacing) = (signal.clone(), self.config.update_pacing);
            spawn("sparkle-update", move || {
                run_update_loop(ctx, platform, app, signal, pacing)
            })?
        };

        let draw = DrawLoop::new(
            self.ctx.clone(),
            self.platform.clone(),
            graphics,
            self.config.clear_color,
            self.config.buffer_policy,
        );
        let pacing = self.config.draw_pacing;
        let draw = match spawn("sparkle-draw", move || draw.run(signal, pacing)) {
            Ok(handle) => handle,
            Err(err) => {
                canceller.cancel();
                let _ = update.join();
                self.host_stop();
                self.ctx.set_graphics(None);
                return Err(err);
            }
        };

        self.session = Some(Session::new(canceller, update, draw));
        log::info!("window visible at {}", self.ctx.size());
        Ok(())
    }

    fn exit(&mut self) -> Result<Flow> {
        let Some(session) = self.session.take() else {
            log::debug!("hidden before becoming visible");
            return Ok(Flow::Exit);
        };

        let ended = session.end();

        self.host_stop();
        self.app.lock().stop(&self.ctx);
        self.ctx.set_graphics(None);

        log::info!("window hidden; dispatcher finished");
        ended.context("render loop failed")?;
        Ok(Flow::Exit)
    }

    fn resize(&mut self, size: Size) -> Result<()> {
        if size.is_empty() {
            log::debug!("ignoring resize to empty {size}");
            return Ok(());
        }

        match self.platform.allocate(size) {
            Ok(buffer) => {
                self.ctx.apply_resize(size, buffer);
                log::debug!("resized to {size}");
                Ok(())
            }
            Err(err) => {
                log::error!("cannot reallocate back buffer for {size}: {err}");
                self.abort();
                Err(anyhow::Error::new(err)
                    .context(format!("failed to reallocate back buffer on resize to {size}")))
            }
        }
    }

    fn key(&self, key: KeyEvent) {
        let Some(exit_key) = self.config.exit_key else { return };
        if key.is_press_of(exit_key) {
            log::debug!("exit key {exit_key} pressed");
            // Route through the queue so exit shares the OS close path.
            self.platform.post(Event::Hidden);
        }
    }

    /// Stops the loops without running the user `stop` hook.
    fn abort(&mut self) {
        if let Some(session) = self.session.take() {
            if let Err(err) = session.end() {
                log::warn!("while aborting: {err:#}");
            }
            self.host_stop();
        }
        self.ctx.set_graphics(None);
    }

    fn host_start(&self) {
        log::info!("initializing window");
        if !self.config.diagnostics {
            return;
        }
        match Diagnostics::new() {
            Ok(overlay) => *self.ctx.overlay() = Some(overlay),
            Err(err) => log::warn!("diagnostics overlay disabled: {err}"),
        }
    }

    fn host_stop(&self) {
        log::info!("killing window");
        self.ctx.overlay().take();
    }
}

impl<P: Platform, A: App<P::Graphics>> Drop for Dispatcher<P, A> {
    fn drop(&mut self) {
        if self.session.is_some() {
            log::warn!("dispatcher dropped while visible; stopping loops");
            self.abort();
        }
    }
}

fn spawn<T, F>(name: &str, f: F) -> Result<JoinHandle<T>>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    std::thread::Builder::new()
        .name(name.to_string())
        .spawn(f)
        .with_context(|| format!("failed to spawn {name} thread"))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
    use std::time::{Duration, Instant};

    use super::*;
    use crate::buffer::{AllocError, PixelBuffer, Rgba};
    use crate::coords::Point;
    use crate::host::headless::{HeadlessGraphics, HeadlessPlatform};
    use crate::host::Layer;
    use crate::input::Key;

    type Ctx = Context<HeadlessGraphics>;

    #[derive(Default)]
    struct Probe {
        starts: AtomicUsize,
        stops: AtomicUsize,
        updates: AtomicU64,
        updates_at_start: AtomicU64,
        loops_still_running_at_stop: AtomicBool,
        graphics_at_stop: AtomicBool,
    }

    struct ProbeApp {
        probe: Arc<Probe>,
        graphics: HeadlessGraphics,
    }

    impl App<HeadlessGraphics> for ProbeApp {
        fn start(&mut self, _ctx: &Ctx) {
            let p = &self.probe;
            p.updates_at_start.store(p.updates.load(Ordering::SeqCst), Ordering::SeqCst);
            p.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn stop(&mut self, ctx: &Ctx) {
            let p = &self.probe;
            let (updates, frames) = (p.updates.load(Ordering::SeqCst), self.graphics.frames());
            std::thread::sleep(Duration::from_millis(10));
            let moved = p.updates.load(Ordering::SeqCst) != updates || self.graphics.frames() != frames;
            p.loops_still_running_at_stop.store(moved, Ordering::SeqCst);
            p.graphics_at_stop.store(ctx.graphics().is_some(), Ordering::SeqCst);
            p.stops.fetch_add(1, Ordering::SeqCst);
        }

        fn update(&mut self, _ctx: &Ctx) {
            self.probe.updates.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct Harness {
        dispatcher: Dispatcher<HeadlessPlatform, ProbeApp>,
        platform: Arc<HeadlessPlatform>,
        events: Receiver<Event<HeadlessGraphics>>,
        graphics: HeadlessGraphics,
        probe: Arc<Probe>,
    }

    impl Harness {
        fn new(size: Size) -> Self {
            Self::with_config(size, EngineConfig::default())
        }

        fn with_config(size: Size, config: EngineConfig) -> Self {
            let (platform, events) = HeadlessPlatform::new();
            let platform = Arc::new(platform);
            let ctx = Arc::new(Context::new(size, PixelBuffer::try_new(size).unwrap()));
            let graphics = HeadlessGraphics::new();
            let probe = Arc::new(Probe::default());
            let app = ProbeApp { probe: probe.clone(), graphics: graphics.clone() };
            let dispatcher = Dispatcher::new(ctx, platform.clone(), config, app);
            Self { dispatcher, platform, events, graphics, probe }
        }

        fn ctx(&self) -> Arc<Ctx> {
            self.dispatcher.context().clone()
        }

        fn show(&mut self) {
            let g = self.graphics.clone();
            assert_eq!(self.dispatcher.handle(Event::Visible(g)).unwrap(), Flow::Continue);
        }

        fn wait_frames(&self, n: u64) {
            let target = self.graphics.frames() + n;
            wait_until(|| self.graphics.frames() >= target);
        }
    }

    fn wait_until(mut cond: impl FnMut() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(10);
        while !cond() {
            assert!(Instant::now() < deadline, "timed out waiting for condition");
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn resize_before_visible_sizes_first_frame() {
        let mut h = Harness::new(Size::new(800, 600));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = seen.clone();
        h.ctx().add_drawer(move |ctx| s.lock().push(ctx.buffer().size()));

        h.dispatcher.handle(Event::Resize(Size::new(640, 480))).unwrap();
        h.show();
        h.wait_frames(1);
        h.dispatcher.handle(Event::Hidden).unwrap();

        assert_eq!(seen.lock()[0], Size::new(640, 480));
        assert_eq!(h.graphics.first_upload_size(Layer::Frame), Some(Size::new(640, 480)));
    }

    #[test]
    fn resize_resets_pointer_to_center() {
        let mut h = Harness::new(Size::new(100, 100));
        h.dispatcher.handle(Event::Pointer(Point::new(3.0, 4.0))).unwrap();
        assert_eq!(h.ctx().pointer(), Point::new(3.0, 4.0));

        h.dispatcher.handle(Event::Resize(Size::new(640, 480))).unwrap();
        let ctx = h.ctx();
        assert_eq!(ctx.size(), Size::new(640, 480));
        assert_eq!((ctx.pointer_x(), ctx.pointer_y()), (320.0, 240.0));
        // The live buffer is swapped by the draw loop, not by the dispatcher.
        assert_eq!(ctx.buffer().size(), Size::new(100, 100));
        assert_eq!(ctx.take_staged().map(|b| b.size()), Some(Size::new(640, 480)));
    }

    #[test]
    fn resize_does_not_wait_for_a_running_drawer() {
        let mut h = Harness::new(Size::new(16, 16));
        let holding = Arc::new(AtomicBool::new(false));
        let once = Arc::new(AtomicBool::new(false));
        let (hold, first) = (holding.clone(), once.clone());
        h.ctx().add_drawer(move |ctx| {
            if first.swap(true, Ordering::SeqCst) {
                return;
            }
            let _buffer = ctx.buffer();
            hold.store(true, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(400));
        });

        h.show();
        wait_until(|| holding.load(Ordering::SeqCst));

        let started = Instant::now();
        h.dispatcher.handle(Event::Resize(Size::new(32, 32))).unwrap();
        assert!(started.elapsed() < Duration::from_millis(200), "resize took {:?}", started.elapsed());

        h.wait_frames(2);
        h.dispatcher.handle(Event::Hidden).unwrap();

        let ctx = h.ctx();
        assert_eq!(ctx.buffer().size(), Size::new(32, 32));
        assert_eq!(h.graphics.last_frame().map(|f| f.size()), Some(Size::new(32, 32)));
    }

    #[test]
    fn empty_resize_is_ignored() {
        let mut h = Harness::new(Size::new(100, 80));
        h.dispatcher.handle(Event::Resize(Size::new(0, 0))).unwrap();
        assert_eq!(h.ctx().size(), Size::new(100, 80));
    }

    #[test]
    fn every_drawer_runs_once_per_presented_frame() {
        let mut h = Harness::new(Size::new(32, 24));
        let calls = Arc::new(Mutex::new(Vec::new()));

        for name in ["d1", "d2"] {
            let (calls, g) = (calls.clone(), h.graphics.clone());
            h.ctx().add_drawer(move |_| calls.lock().push((name, g.frames())));
        }

        h.show();
        h.wait_frames(3);
        h.dispatcher.handle(Event::Hidden).unwrap();

        let frames = h.graphics.frames();
        let calls = calls.lock();
        for frame in 0..frames {
            for name in ["d1", "d2"] {
                let n = calls.iter().filter(|c| **c == (name, frame)).count();
                assert_eq!(n, 1, "{name} ran {n} times in frame {frame}");
            }
        }
        assert_eq!(calls.len() as u64, frames * 2);
    }

    #[test]
    fn removed_drawer_is_skipped_from_next_frame() {
        let mut h = Harness::new(Size::new(16, 16));
        let last = Arc::new(AtomicU64::new(u64::MAX));
        let (l, g) = (last.clone(), h.graphics.clone());
        let id = h.ctx().add_drawer(move |_| l.store(g.frames(), Ordering::SeqCst));

        h.show();
        h.wait_frames(2);
        h.ctx().remove_drawer(id);
        let removed_at = h.graphics.frames();
        h.wait_frames(3);
        h.dispatcher.handle(Event::Hidden).unwrap();

        assert!(last.load(Ordering::SeqCst) <= removed_at);
    }

    #[test]
    fn start_precedes_first_update() {
        let mut h = Harness::new(Size::new(16, 16));
        assert!(!h.ctx().is_visible());
        h.show();
        assert!(h.ctx().is_visible());
        wait_until(|| h.probe.updates.load(Ordering::SeqCst) > 0);
        h.dispatcher.handle(Event::Hidden).unwrap();

        assert_eq!(h.probe.starts.load(Ordering::SeqCst), 1);
        assert_eq!(h.probe.updates_at_start.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn exit_key_runs_deterministic_stop_sequence() {
        let mut h = Harness::new(Size::new(64, 48));
        h.show();
        h.wait_frames(1);

        assert_eq!(
            h.dispatcher.handle(Event::Key(KeyEvent::pressed(Key::Escape))).unwrap(),
            Flow::Continue,
        );
        // Nothing is torn down until the re-submitted event is processed.
        assert!(h.dispatcher.is_visible());

        h.dispatcher.run(&h.events).unwrap();

        let p = &h.probe;
        assert_eq!(p.stops.load(Ordering::SeqCst), 1);
        assert!(!p.loops_still_running_at_stop.load(Ordering::SeqCst));
        assert!(p.graphics_at_stop.load(Ordering::SeqCst));
        assert!(h.ctx().graphics().is_none());
        assert!(!h.dispatcher.is_visible());

        let (updates, frames) = (p.updates.load(Ordering::SeqCst), h.graphics.frames());
        std::thread::sleep(Duration::from_millis(10));
        assert_eq!(p.updates.load(Ordering::SeqCst), updates);
        assert_eq!(h.graphics.frames(), frames);
    }

    #[test]
    fn key_release_and_other_keys_do_not_exit() {
        let mut h = Harness::new(Size::new(16, 16));
        h.dispatcher.handle(Event::Key(KeyEvent::released(Key::Escape))).unwrap();
        h.dispatcher.handle(Event::Key(KeyEvent::pressed(Key::Char('q')))).unwrap();
        assert!(h.events.try_recv().is_err());
    }

    #[test]
    fn hidden_before_visible_exits_without_hooks() {
        let mut h = Harness::new(Size::new(16, 16));
        assert_eq!(h.dispatcher.handle(Event::Hidden).unwrap(), Flow::Exit);
        assert_eq!(h.probe.starts.load(Ordering::SeqCst), 0);
        assert_eq!(h.probe.stops.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn duplicate_visible_keeps_single_session() {
        let mut h = Harness::new(Size::new(16, 16));
        h.show();
        h.show();
        h.dispatcher.handle(Event::Hidden).unwrap();
        assert_eq!(h.probe.starts.load(Ordering::SeqCst), 1);
        assert_eq!(h.probe.stops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failed_resize_allocation_stops_drawing() {
        let mut h = Harness::new(Size::new(64, 64));
        h.platform.set_max_dimension(1024);
        h.show();
        h.wait_frames(1);

        let err = h
            .dispatcher
            .handle(Event::Resize(Size::new(4096, 64)))
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AllocError>(),
            Some(AllocError::TooLarge { limit: 1024, .. })
        ));

        let ctx = h.ctx();
        assert!(ctx.graphics().is_none());
        assert!(!h.dispatcher.is_visible());
        assert_eq!(ctx.size(), Size::new(64, 64));
        assert_eq!(h.probe.stops.load(Ordering::SeqCst), 0);

        let frames = h.graphics.frames();
        std::thread::sleep(Duration::from_millis(10));
        assert_eq!(h.graphics.frames(), frames);
    }

    #[test]
    fn draw_failure_tears_down_through_hidden() {
        let mut h = Harness::new(Size::new(16, 16));
        h.show();
        h.wait_frames(1);
        h.graphics.fail_uploads(true);

        let err = h.dispatcher.run(&h.events).unwrap_err();
        assert!(format!("{err:#}").contains("failed to upload frame"));
        assert_eq!(h.probe.stops.load(Ordering::SeqCst), 1);
        assert!(h.ctx().graphics().is_none());
    }

    #[test]
    fn frame_is_composited_over_clear_color() {
        let config = EngineConfig {
            clear_color: Rgba::opaque(0, 0, 255),
            diagnostics: false,
            ..EngineConfig::default()
        };
        let mut h = Harness::with_config(Size::new(8, 8), config);
        h.ctx().add_drawer(|ctx| ctx.buffer().set(1, 1, Rgba::WHITE));

        h.show();
        h.wait_frames(2);
        h.dispatcher.handle(Event::Hidden).unwrap();

        let frame = h.graphics.last_frame().unwrap();
        assert_eq!(frame.get(1, 1), Some(Rgba::WHITE));
        assert_eq!(frame.get(0, 0), Some(Rgba::opaque(0, 0, 255)));
    }

    #[test]
    fn on_resize_policy_clears_reused_buffer() {
        let config = EngineConfig {
            buffer_policy: crate::host::BufferPolicy::OnResize,
            diagnostics: false,
            ..EngineConfig::default()
        };
        let mut h = Harness::with_config(Size::new(8, 8), config);
        let stale = Arc::new(AtomicBool::new(false));
        let s = stale.clone();
        h.ctx().add_drawer(move |ctx| {
            let mut buf = ctx.buffer();
            if buf.get(2, 2) != Some(Rgba::TRANSPARENT) {
                s.store(true, Ordering::SeqCst);
            }
            buf.set(2, 2, Rgba::WHITE);
        });

        h.show();
        h.wait_frames(3);
        h.dispatcher.handle(Event::Hidden).unwrap();
        assert!(!stale.load(Ordering::SeqCst));
    }

    #[test]
    fn overlay_exists_only_while_visible() {
        let mut h = Harness::new(Size::new(200, 100));
        assert!(h.ctx().overlay().is_none());
        h.show();
        assert!(h.ctx().overlay().is_some());
        h.wait_frames(1);
        h.dispatcher.handle(Event::Hidden).unwrap();
        assert!(h.ctx().overlay().is_none());
        assert!(h.graphics.first_upload_size(Layer::Overlay).is_some());
    }
}
