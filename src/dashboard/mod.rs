//! Live telemetry dashboard.
//!
//! Each tick reads the workload state, its resource usage and the telemetry
//! extracted from a bounded log tail, renders one frame, then waits. The
//! session is read-only: it never changes the workload or the settings.
//! Terminal mode is held by a [`TerminalGuard`] for the whole session, so it
//! is restored once on every way out.

mod frame;
mod signals;
mod terminal;
mod wait;

pub use frame::{Frame, FrameStyle};
pub use signals::{termination_scope, SignalAction, TerminationScope, INTERRUPTED_EXIT_CODE};
pub use terminal::{CrosstermTerminal, PlainTerminal, TerminalGuard, TerminalMode};
pub use wait::{CancelToken, HeadlessWaiter, InteractiveWaiter, WaitOutcome, Waiter, WAIT_SLICE};

use std::io::Write;
use std::time::Duration;

use chrono::Local;
use tracing::debug;

use crate::controller::WorkloadController;
use crate::engine::ContainerEngine;
use crate::error::ConduitResult;
use crate::models::{SettingsRecord, TelemetrySample};
use crate::stats;

#[derive(Debug, Clone, Copy)]
pub struct DashboardOptions {
    pub refresh: Duration,
    pub log_tail: usize,
    pub style: FrameStyle,
    pub interactive: bool,
}

impl Default for DashboardOptions {
    fn default() -> Self {
        Self {
            refresh: Duration::from_secs(10),
            log_tail: 200,
            style: FrameStyle::InPlace,
            interactive: true,
        }
    }
}

/// Why the session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionExit {
    /// The operator pressed a key; callers return to where they came from.
    KeyPressed,
    /// Ctrl+C or a termination signal.
    Cancelled,
}

pub struct DashboardSession<'a, E: ContainerEngine> {
    controller: &'a WorkloadController<E>,
    settings: &'a SettingsRecord,
    options: DashboardOptions,
    token: CancelToken,
}

impl<'a, E: ContainerEngine> DashboardSession<'a, E> {
    pub fn new(
        controller: &'a WorkloadController<E>,
        settings: &'a SettingsRecord,
        options: DashboardOptions,
        token: CancelToken,
    ) -> Self {
        Self {
            controller,
            settings,
            options,
            token,
        }
    }

    /// Run until a key press or cancellation.
    pub fn run<T, W, O>(&self, terminal: T, waiter: &mut W, out: &mut O) -> ConduitResult<SessionExit>
    where
        T: TerminalMode,
        W: Waiter,
        O: Write,
    {
        let mut guard = TerminalGuard::enter(terminal)?;
        let result = self.tick_loop(waiter, out);
        guard.restore();
        if let Ok(exit) = &result {
            debug!(?exit, "dashboard session ended");
        }
        result
    }

    fn tick_loop<W: Waiter, O: Write>(&self, waiter: &mut W, out: &mut O) -> ConduitResult<SessionExit> {
        loop {
            if self.token.is_cancelled() {
                return Ok(SessionExit::Cancelled);
            }
            let frame = self.snapshot();
            if self.token.is_cancelled() {
                return Ok(SessionExit::Cancelled);
            }
            frame.render(out, self.options.style)?;

            match waiter.wait(self.options.refresh) {
                WaitOutcome::Elapsed => {}
                WaitOutcome::KeyPressed => return Ok(SessionExit::KeyPressed),
                WaitOutcome::Cancelled => return Ok(SessionExit::Cancelled),
            }
        }
    }

    /// Gather one frame's worth of data. Engine failures become frame content.
    pub fn snapshot(&self) -> Frame {
        let state = self.controller.status().map_err(|e| e.to_string());
        let usage = self.controller.resource_usage();
        let telemetry = match self.controller.recent_logs(self.options.log_tail) {
            Ok(lines) => stats::extract(&lines),
            Err(e) => {
                debug!("log tail unavailable: {e}");
                TelemetrySample::no_data()
            }
        };
        Frame {
            taken_at: Local::now(),
            state,
            usage,
            telemetry,
            settings: self.settings.clone(),
            refresh: self.options.refresh,
            interactive: self.options.interactive,
        }
    }
}
