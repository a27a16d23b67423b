//! Desktop windowed runner
//!
//! Wires the desktop event loop, the GPU context and the frame driver
//! together: the render thread draws into off-screen swap targets and the
//! event loop presents the newest one at every poll tick.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use sable_core::{EventSink, EventType, InputEvent, KeyCode};
use sable_gpu::{GpuContext, GpuError, Presenter, SwapTargets, WgpuDevice};
use sable_platform::{
    ControlFlow, Event, EventLoop, LifecycleEvent, Window, WindowControl, WindowEvent,
};
use sable_platform_desktop::{DesktopEventLoop, DesktopWindow};

use crate::config::DriverConfig;
use crate::context::FrameContext;
use crate::driver::{FrameDriver, FrameStats};
use crate::error::{AppError, Result};

/// Optional callbacks for [`run_windowed`]
#[derive(Default)]
pub struct WindowedHooks {
    /// Receives every translated input event on the main thread
    pub event_sink: Option<Box<dyn EventSink>>,
    /// Runs on the render thread after each published frame
    pub on_frame_complete: Option<Box<dyn FnMut(FrameStats) + Send>>,
}

impl WindowedHooks {
    pub fn with_event_sink(mut self, sink: impl EventSink + 'static) -> Self {
        self.event_sink = Some(Box::new(sink));
        self
    }

    pub fn with_frame_complete(mut self, callback: impl FnMut(FrameStats) + Send + 'static) -> Self {
        self.on_frame_complete = Some(Box::new(callback));
        self
    }
}

/// Main-thread state created once the window exists
struct Presentation {
    presenter: Presenter,
    last_presented: Option<u64>,
}

/// Open a window and drive `frame_callback` until the window closes
///
/// Blocks the calling thread, which must be the main thread on macOS.
/// GPU or window creation failures end the run with an error.
pub fn run_windowed<F>(config: DriverConfig, frame_callback: F, hooks: WindowedHooks) -> Result<()>
where
    F: FnMut(&mut FrameContext<'_, WgpuDevice>) + Send + 'static,
{
    let config = config.normalized();
    let poll_interval = Duration::from_millis(config.frame.poll_interval_ms);
    let event_loop =
        DesktopEventLoop::new(config.window.clone())?.with_poll_interval(poll_interval);

    let mut driver = FrameDriver::<WgpuDevice>::new(config);
    if let Some(mut sink) = hooks.event_sink {
        driver.set_event_sink(move |event: &InputEvent| sink.handle(event));
    }
    if let Some(on_complete) = hooks.on_frame_complete {
        driver.on_frame_complete(on_complete)?;
    }

    let fatal: Rc<RefCell<Option<AppError>>> = Rc::new(RefCell::new(None));
    let fatal_in_loop = Rc::clone(&fatal);
    let mut frame_callback = Some(frame_callback);
    let mut presentation: Option<Presentation> = None;

    event_loop.run(move |event, window| {
        match event {
            Event::Lifecycle(LifecycleEvent::Resumed) => {
                if presentation.is_some() {
                    return ControlFlow::Continue;
                }
                let Some(callback) = frame_callback.take() else {
                    return ControlFlow::Continue;
                };
                match start_pipeline(window, &mut driver, callback) {
                    Ok(presenter) => {
                        presentation = Some(Presentation {
                            presenter,
                            last_presented: None,
                        });
                    }
                    Err(e) => {
                        tracing::error!("Failed to start rendering: {}", e);
                        driver.terminate();
                        *fatal_in_loop.borrow_mut() = Some(e);
                        return ControlFlow::Exit;
                    }
                }
            }

            Event::Frame => {
                if driver.is_terminate_requested() {
                    driver.terminate();
                    return ControlFlow::Exit;
                }
                if let Some(ref mut presentation) = presentation {
                    present_new_frame(&driver, presentation);
                }
            }

            Event::Window(WindowEvent::Resized { width, height }) => {
                if let Some(ref mut presentation) = presentation {
                    presentation.presenter.resize(width, height);
                    // Re-present the current frame at the new size
                    presentation.last_presented = None;
                }
            }

            Event::Window(WindowEvent::ScaleFactorChanged { scale_factor }) => {
                tracing::debug!("Scale factor changed to {:.2}", scale_factor);
                driver.set_scale_factor(scale_factor);
            }

            Event::Window(WindowEvent::CloseRequested) => {
                driver.terminate();
                return ControlFlow::Exit;
            }

            Event::Input(input) => {
                if input.has(EventType::KEY_DOWN) && input.key == KeyCode::F11 {
                    window.set_fullscreen(!window.is_fullscreen());
                }
                driver.dispatch_event(&input);
            }

            Event::Window(WindowEvent::Focused(_)) | Event::Lifecycle(LifecycleEvent::Suspended) => {}
        }
        ControlFlow::Continue
    })?;

    let error = fatal.borrow_mut().take();
    match error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

/// Create the GPU side on the main thread and start the render thread
fn start_pipeline<F>(
    window: &DesktopWindow,
    driver: &mut FrameDriver<WgpuDevice>,
    frame_callback: F,
) -> Result<Presenter>
where
    F: FnMut(&mut FrameContext<'_, WgpuDevice>) + Send + 'static,
{
    let (context, surface) = pollster::block_on(GpuContext::with_surface(window.winit_window_arc()))?;
    let (width, height) = window.size();
    let targets = Arc::new(SwapTargets::new(
        &context.device,
        width,
        height,
        driver.config().frame.swap_chain_depth,
    ));
    let presenter = Presenter::new(&context, surface, &targets, width, height);
    let device = WgpuDevice::new(
        Arc::clone(&context.device),
        Arc::clone(&context.queue),
        targets,
    );

    driver.attach_context(device, window.scale_factor())?;
    driver.start(frame_callback)?;
    Ok(presenter)
}

fn present_new_frame(driver: &FrameDriver<WgpuDevice>, presentation: &mut Presentation) {
    let latest = driver.latest_sequence();
    if latest.is_none() || latest == presentation.last_presented {
        return;
    }

    let mut result = Ok(());
    let presenter = &mut presentation.presenter;
    let presented = driver.present_latest(|frame| {
        result = presenter.present(frame.slot);
    });

    match result {
        Ok(()) => {
            if presented.is_some() {
                presentation.last_presented = presented;
            }
        }
        Err(GpuError::SurfaceLost) => {
            tracing::debug!("Surface lost, retrying next tick");
        }
        Err(e) => tracing::error!("Present failed: {}", e),
    }
}
