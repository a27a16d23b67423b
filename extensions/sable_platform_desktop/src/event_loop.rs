//! Desktop event loop implementation using winit
//!
//! The loop sleeps until the next poll tick (`WaitUntil`) and reports each
//! tick as [`Event::Frame`] through a redraw request, so the handler can
//! present whatever the render thread finished in the meantime.

use std::time::{Duration, Instant};

use crate::input::InputTranslator;
use crate::window::DesktopWindow;
use sable_platform::{
    ControlFlow, Event, EventLoop, LifecycleEvent, PlatformError, Window, WindowConfig, WindowEvent,
};
use winit::application::ApplicationHandler;
use winit::event::{StartCause, WindowEvent as WinitWindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow as WinitControlFlow, EventLoop as WinitEventLoop};
use winit::window::WindowId;

/// Default presentation polling interval
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2);

/// Next tick after `deadline`, never scheduling a backlog of missed ticks
fn advance_tick(deadline: Instant, now: Instant, interval: Duration) -> Instant {
    let next = deadline + interval;
    if next <= now {
        now + interval
    } else {
        next
    }
}

/// Desktop event loop wrapping winit's event loop
pub struct DesktopEventLoop {
    event_loop: WinitEventLoop<()>,
    window_config: WindowConfig,
    poll_interval: Duration,
}

impl DesktopEventLoop {
    /// Create a new desktop event loop
    pub fn new(config: WindowConfig) -> Result<Self, PlatformError> {
        let event_loop = {
            let mut builder = WinitEventLoop::builder();

            #[cfg(target_os = "macos")]
            {
                use winit::platform::macos::{ActivationPolicy, EventLoopBuilderExtMacOS};
                builder.with_activation_policy(ActivationPolicy::Regular);
            }

            builder
                .build()
                .map_err(|e| PlatformError::EventLoop(e.to_string()))?
        };

        Ok(Self {
            event_loop,
            window_config: config,
            poll_interval: DEFAULT_POLL_INTERVAL,
        })
    }

    /// Interval between [`Event::Frame`] ticks
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval.max(Duration::from_millis(1));
        self
    }
}

impl EventLoop for DesktopEventLoop {
    type Window = DesktopWindow;

    fn run<F>(self, handler: F) -> Result<(), PlatformError>
    where
        F: FnMut(Event, &Self::Window) -> ControlFlow + 'static,
    {
        let mut app = DesktopApp::new(self.window_config, self.poll_interval, handler);
        let result = self.event_loop.run_app(&mut app);
        app.finish(result.map_err(|e| PlatformError::EventLoop(e.to_string())))
    }
}

/// Internal winit application handler
struct DesktopApp<F>
where
    F: FnMut(Event, &DesktopWindow) -> ControlFlow,
{
    window_config: WindowConfig,
    window: Option<DesktopWindow>,
    handler: F,
    input: InputTranslator,
    poll_interval: Duration,
    next_tick: Instant,
    should_exit: bool,
    /// Error that stopped the loop, reported once `run_app` returns
    fatal: Option<PlatformError>,
}

impl<F> DesktopApp<F>
where
    F: FnMut(Event, &DesktopWindow) -> ControlFlow,
{
    fn new(window_config: WindowConfig, poll_interval: Duration, handler: F) -> Self {
        Self {
            window_config,
            window: None,
            handler,
            input: InputTranslator::default(),
            poll_interval,
            next_tick: Instant::now(),
            should_exit: false,
            fatal: None,
        }
    }

    /// Stop the loop with `error`; the first error wins
    fn fail(&mut self, error: PlatformError) {
        tracing::error!("{}", error);
        self.should_exit = true;
        if self.fatal.is_none() {
            self.fatal = Some(error);
        }
    }

    /// Outcome of the run once the winit loop has returned
    fn finish(&mut self, result: Result<(), PlatformError>) -> Result<(), PlatformError> {
        match self.fatal.take() {
            Some(error) => Err(error),
            None => result,
        }
    }

    fn handle_event(&mut self, event: Event) {
        if let Some(ref window) = self.window {
            let flow = (self.handler)(event, window);
            if flow == ControlFlow::Exit {
                self.should_exit = true;
            }
        }
    }
}

impl<F> ApplicationHandler for DesktopApp<F>
where
    F: FnMut(Event, &DesktopWindow) -> ControlFlow,
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            match DesktopWindow::new(event_loop, &self.window_config) {
                Ok(window) => {
                    self.input.set_scale_factor(window.scale_factor());
                    self.window = Some(window);
                    self.handle_event(Event::Lifecycle(LifecycleEvent::Resumed));
                }
                Err(e) => self.fail(PlatformError::WindowCreation(e.to_string())),
            }
        }
        if self.should_exit {
            event_loop.exit();
        }
    }

    fn suspended(&mut self, _event_loop: &ActiveEventLoop) {
        self.handle_event(Event::Lifecycle(LifecycleEvent::Suspended));
    }

    fn new_events(&mut self, _event_loop: &ActiveEventLoop, cause: StartCause) {
        let now = Instant::now();
        if matches!(cause, StartCause::ResumeTimeReached { .. } | StartCause::Poll)
            || now >= self.next_tick
        {
            self.next_tick = advance_tick(self.next_tick, now, self.poll_interval);
            if let Some(ref window) = self.window {
                window.request_redraw();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WinitWindowEvent,
    ) {
        match event {
            WinitWindowEvent::CloseRequested => {
                self.handle_event(Event::Window(WindowEvent::CloseRequested));
            }

            WinitWindowEvent::Resized(size) => {
                self.handle_event(Event::Window(WindowEvent::Resized {
                    width: size.width,
                    height: size.height,
                }));
            }

            WinitWindowEvent::Focused(focused) => {
                if let Some(ref window) = self.window {
                    window.set_focused(focused);
                }
                self.handle_event(Event::Window(WindowEvent::Focused(focused)));
            }

            WinitWindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                self.input.set_scale_factor(scale_factor);
                self.handle_event(Event::Window(WindowEvent::ScaleFactorChanged {
                    scale_factor,
                }));
            }

            WinitWindowEvent::RedrawRequested => {
                self.handle_event(Event::Frame);
            }

            WinitWindowEvent::ModifiersChanged(mods) => {
                self.input.set_modifiers(mods.state());
            }

            WinitWindowEvent::KeyboardInput { event, .. } => {
                let events = self.input.key(
                    event.physical_key,
                    event.state,
                    event.repeat,
                    event.text.as_deref(),
                );
                for input_event in events {
                    self.handle_event(Event::Input(input_event));
                }
            }

            WinitWindowEvent::CursorMoved { position, .. } => {
                let input_event = self.input.cursor_moved(position.x, position.y);
                self.handle_event(Event::Input(input_event));
            }

            WinitWindowEvent::MouseInput { state, button, .. } => {
                if let Some(input_event) = self.input.mouse_button(button, state) {
                    self.handle_event(Event::Input(input_event));
                }
            }

            WinitWindowEvent::MouseWheel { delta, .. } => {
                let input_event = self.input.scroll(delta);
                self.handle_event(Event::Input(input_event));
            }

            _ => {}
        }

        if self.should_exit {
            event_loop.exit();
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.should_exit {
            event_loop.exit();
            return;
        }
        event_loop.set_control_flow(WinitControlFlow::WaitUntil(self.next_tick));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_advances_by_interval() {
        let start = Instant::now();
        let interval = Duration::from_millis(2);
        assert_eq!(advance_tick(start, start, interval), start + interval);
    }

    #[test]
    fn late_tick_does_not_accumulate_backlog() {
        let start = Instant::now();
        let interval = Duration::from_millis(2);
        let now = start + Duration::from_millis(50);
        assert_eq!(advance_tick(start, now, interval), now + interval);
    }

    fn app() -> DesktopApp<impl FnMut(Event, &DesktopWindow) -> ControlFlow> {
        DesktopApp::new(WindowConfig::default(), DEFAULT_POLL_INTERVAL, |_: Event, _: &DesktopWindow| {
            ControlFlow::Continue
        })
    }

    #[test]
    fn window_failure_is_returned_after_the_loop() {
        let mut app = app();
        app.fail(PlatformError::WindowCreation("no display".into()));
        assert!(app.should_exit);
        assert!(matches!(
            app.finish(Ok(())),
            Err(PlatformError::WindowCreation(msg)) if msg == "no display"
        ));
    }

    #[test]
    fn first_failure_wins() {
        let mut app = app();
        app.fail(PlatformError::WindowCreation("first".into()));
        app.fail(PlatformError::EventLoop("second".into()));
        assert!(matches!(app.finish(Ok(())), Err(PlatformError::WindowCreation(_))));
    }

    #[test]
    fn clean_run_reports_the_loop_result() {
        let mut app = app();
        assert!(app.finish(Ok(())).is_ok());
        assert!(matches!(
            app.finish(Err(PlatformError::EventLoop("closed".into()))),
            Err(PlatformError::EventLoop(_))
        ));
    }
}
