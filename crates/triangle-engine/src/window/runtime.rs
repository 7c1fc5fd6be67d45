use anyhow::{anyhow, Context, Result};
use ouroboros::self_referencing;

use winit::application::ApplicationHandler;
use winit::dpi::{LogicalSize, PhysicalSize, Size};
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::core::{App, FrameCtx};
use crate::device::GpuInit;
use crate::gfx::WgpuBackend;
use crate::input::platform::winit::translate_window_event;
use crate::input::{InputEvent, Modifiers};
use crate::time::FrameClock;

use super::host::AppHost;

/// Window configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// `true`: `width`/`height` are logical pixels scaled by the display
    /// factor. `false`: they are physical pixels.
    pub high_dpi: bool,
}

impl RuntimeConfig {
    fn window_size(&self) -> Size {
        if self.high_dpi {
            LogicalSize::new(self.width as f64, self.height as f64).into()
        } else {
            PhysicalSize::new(self.width, self.height).into()
        }
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "triangle".to_string(),
            width: 800,
            height: 600,
            high_dpi: true,
        }
    }
}

/// Entry point for the runtime.
pub struct Runtime;

impl Runtime {
    /// Runs `app` until it requests exit or the window closes.
    ///
    /// Returns an error if the window or GPU context cannot be created, if
    /// `App::init` fails, or if the surface becomes unrecoverable.
    pub fn run<A>(config: RuntimeConfig, gpu_init: GpuInit, app: A) -> Result<()>
    where
        A: App + 'static,
    {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = RuntimeState::new(config, gpu_init, app);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        // `exiting` normally runs cleanup; this covers loops that return without it.
        state.shutdown();

        match state.host.take_fatal() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[self_referencing]
struct WindowEntry {
    clock: FrameClock,
    modifiers: Modifiers,

    window: Window,

    #[borrows(window)]
    #[covariant]
    gfx: WgpuBackend<'this>,
}

struct RuntimeState<A>
where
    A: App + 'static,
{
    config: RuntimeConfig,
    gpu_init: GpuInit,
    host: AppHost<A>,

    window: Option<WindowEntry>,
}

impl<A> RuntimeState<A>
where
    A: App + 'static,
{
    fn new(config: RuntimeConfig, gpu_init: GpuInit, app: A) -> Self {
        Self {
            config,
            gpu_init,
            host: AppHost::new(app),
            window: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        self.host.fail(err);
        event_loop.exit();
    }

    fn create_window_entry(&self, event_loop: &ActiveEventLoop) -> Result<WindowEntry> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.window_size());

        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;

        let gpu_init = self.gpu_init.clone();

        WindowEntryTryBuilder {
            clock: FrameClock::default(),
            modifiers: Modifiers::default(),
            window,
            gfx_builder: |w| {
                pollster::block_on(WgpuBackend::new(w, gpu_init))
                    .context("failed to create graphics context")
            },
        }
        .try_build()
    }

    fn start(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let mut entry = self.create_window_entry(event_loop)?;

        let host = &mut self.host;
        entry.with_gfx_mut(|gfx| host.start(gfx))?;

        entry.with_window(|w| w.request_redraw());
        self.window = Some(entry);
        log::info!("running");
        Ok(())
    }

    /// Runs `App::cleanup` and drops the window. Safe to call repeatedly.
    fn shutdown(&mut self) {
        let Some(mut entry) = self.window.take() else { return };
        let host = &mut self.host;
        if entry.with_gfx_mut(|gfx| host.shutdown(gfx)) {
            log::info!("shut down after {} frames", entry.borrow_clock().frames());
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let (host, window) = (&mut self.host, &mut self.window);
        let Some(entry) = window.as_mut() else { return };

        let mut lost = false;
        entry.with_mut(|fields| {
            let time = fields.clock.tick();
            host.frame(&mut FrameCtx { gfx: &mut *fields.gfx, time });
            lost = fields.gfx.is_lost();
        });

        if lost {
            self.fail(event_loop, anyhow!("graphics surface lost"));
        }
    }

    fn dispatch_input(&mut self, event: &WindowEvent) {
        let (host, window) = (&mut self.host, &mut self.window);
        let Some(entry) = window.as_mut() else { return };

        entry.with_mut(|fields| {
            let Some(ev) = translate_window_event(event, *fields.modifiers) else { return };
            if let InputEvent::ModifiersChanged(m) = ev {
                *fields.modifiers = m;
            }
            host.input(&ev);
        });
    }
}

impl<A> ApplicationHandler for RuntimeState<A>
where
    A: App + 'static,
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if !self.host.is_idle() {
            return;
        }

        if let Err(e) = self.start(event_loop) {
            self.fail(event_loop, e);
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.host.exit_requested() {
            event_loop.exit();
            return;
        }

        // Continuous redraw; FIFO presentation paces it to the display.
        event_loop.set_control_flow(ControlFlow::Wait);
        if let Some(entry) = self.window.as_ref() {
            entry.with_window(|w| w.request_redraw());
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if self.host.exit_requested() {
            event_loop.exit();
            return;
        }

        match &event {
            WindowEvent::CloseRequested => self.host.request_exit(),

            WindowEvent::Resized(new_size) => {
                if let Some(entry) = self.window.as_mut() {
                    entry.with_gfx_mut(|gfx| gfx.resize(*new_size));
                    entry.with_window(|w| w.request_redraw());
                }
            }

            WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(entry) = self.window.as_mut() {
                    let new_size = entry.with_window(|w| w.inner_size());
                    entry.with_gfx_mut(|gfx| gfx.resize(new_size));
                }
            }

            WindowEvent::RedrawRequested => self.redraw(event_loop),

            _ => self.dispatch_input(&event),
        }

        if self.host.exit_requested() {
            event_loop.exit();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_800_by_600_high_dpi() {
        let c = RuntimeConfig::default();
        assert_eq!((c.width, c.height), (800, 600));
        assert!(c.high_dpi);
    }

    #[test]
    fn high_dpi_selects_logical_size() {
        let mut c = RuntimeConfig::default();
        assert!(matches!(c.window_size(), Size::Logical(s) if s.width == 800.0 && s.height == 600.0));

        c.high_dpi = false;
        assert!(matches!(c.window_size(), Size::Physical(s) if s.width == 800 && s.height == 600));
    }
}
