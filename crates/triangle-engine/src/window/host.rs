use anyhow::{ensure, Context, Result};

use crate::core::{App, AppControl, FrameCtx};
use crate::gfx::GfxBackend;
use crate::input::InputEvent;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum HostPhase {
    Idle,
    Running,
    Finished,
}

/// Drives `App` callbacks in order: `init` once, frames and events while
/// running, `cleanup` once. Platform-free; the runtime owns the window.
pub(crate) struct AppHost<A> {
    app: A,
    phase: HostPhase,
    exit_requested: bool,
    fatal: Option<anyhow::Error>,
}

impl<A: App> AppHost<A> {
    pub(crate) fn new(app: A) -> Self {
        Self {
            app,
            phase: HostPhase::Idle,
            exit_requested: false,
            fatal: None,
        }
    }

    /// True until `start` or `fail` has been called.
    pub(crate) fn is_idle(&self) -> bool {
        self.phase == HostPhase::Idle
    }

    pub(crate) fn exit_requested(&self) -> bool {
        self.exit_requested
    }

    pub(crate) fn request_exit(&mut self) {
        self.exit_requested = true;
    }

    /// Runs `App::init`. A failed init is terminal and skips `cleanup`.
    pub(crate) fn start(&mut self, gfx: &mut dyn GfxBackend) -> Result<()> {
        ensure!(self.phase == HostPhase::Idle, "application already started");

        match self.app.init(gfx).context("application init failed") {
            Ok(()) => {
                self.phase = HostPhase::Running;
                Ok(())
            }
            Err(err) => {
                self.phase = HostPhase::Finished;
                Err(err)
            }
        }
    }

    pub(crate) fn frame(&mut self, ctx: &mut FrameCtx<'_>) {
        if self.phase != HostPhase::Running {
            return;
        }
        if self.app.frame(ctx) == AppControl::Exit {
            self.exit_requested = true;
        }
    }

    pub(crate) fn input(&mut self, event: &InputEvent) {
        if self.phase != HostPhase::Running {
            return;
        }
        if self.app.event(event) == AppControl::Exit {
            log::debug!("exit requested by app");
            self.exit_requested = true;
        }
    }

    /// Runs `App::cleanup` if the app is running. Returns whether it ran.
    pub(crate) fn shutdown(&mut self, gfx: &mut dyn GfxBackend) -> bool {
        if self.phase != HostPhase::Running {
            return false;
        }
        self.phase = HostPhase::Finished;
        self.app.cleanup(gfx);
        true
    }

    /// Records a fatal error and requests exit. The first error wins.
    pub(crate) fn fail(&mut self, err: anyhow::Error) {
        log::error!("{err:#}");
        if self.fatal.is_none() {
            self.fatal = Some(err);
        }
        if self.phase == HostPhase::Idle {
            self.phase = HostPhase::Finished;
        }
        self.exit_requested = true;
    }

    pub(crate) fn take_fatal(&mut self) -> Option<anyhow::Error> {
        self.fatal.take()
    }
}
