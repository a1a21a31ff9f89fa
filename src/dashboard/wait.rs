//! Waiting between dashboard ticks.
//!
//! A wait ends on the timer, on a key press (interactive only) or when the
//! cancel token flips. Keyboard input is an optional extra source; the
//! headless waiter never touches the terminal.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use tracing::debug;

/// Granularity at which waits re-check the cancel token.
pub const WAIT_SLICE: Duration = Duration::from_millis(100);

/// Shared cancellation flag, flipped by signal handlers or tests.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Clear a previous cancellation so the token can serve another session.
    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    Elapsed,
    KeyPressed,
    Cancelled,
}

pub trait Waiter {
    fn wait(&mut self, timeout: Duration) -> WaitOutcome;
}

/// Timer plus cancel token; for runs under a supervisor or without a tty.
pub struct HeadlessWaiter {
    token: CancelToken,
}

impl HeadlessWaiter {
    pub fn new(token: CancelToken) -> Self {
        Self { token }
    }
}

impl Waiter for HeadlessWaiter {
    fn wait(&mut self, timeout: Duration) -> WaitOutcome {
        let deadline = Instant::now() + timeout;
        loop {
            if self.token.is_cancelled() {
                return WaitOutcome::Cancelled;
            }
            let now = Instant::now();
            if now >= deadline {
                return WaitOutcome::Elapsed;
            }
            thread::sleep(WAIT_SLICE.min(deadline - now));
        }
    }
}

/// Timer, cancel token and keyboard. Expects the terminal in raw mode, where
/// Ctrl+C arrives as a key event instead of a signal.
pub struct InteractiveWaiter {
    token: CancelToken,
}

impl InteractiveWaiter {
    pub fn new(token: CancelToken) -> Self {
        Self { token }
    }
}

impl Waiter for InteractiveWaiter {
    fn wait(&mut self, timeout: Duration) -> WaitOutcome {
        let deadline = Instant::now() + timeout;
        loop {
            if self.token.is_cancelled() {
                return WaitOutcome::Cancelled;
            }
            let now = Instant::now();
            if now >= deadline {
                return WaitOutcome::Elapsed;
            }
            let slice = WAIT_SLICE.min(deadline - now);

            match event::poll(slice) {
                Ok(true) => match event::read() {
                    Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                        if key.code == KeyCode::Char('c')
                            && key.modifiers.contains(KeyModifiers::CONTROL)
                        {
                            return WaitOutcome::Cancelled;
                        }
                        return WaitOutcome::KeyPressed;
                    }
                    Ok(_) => {}
                    Err(e) => debug!("terminal read failed: {e}"),
                },
                Ok(false) => {}
                Err(e) => {
                    debug!("terminal poll failed, sleeping instead: {e}");
                    thread::sleep(slice);
                }
            }
        }
    }
}
