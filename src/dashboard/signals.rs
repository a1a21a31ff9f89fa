use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use super::wait::CancelToken;

/// Exit status used when a signal arrives outside a dashboard session.
pub const INTERRUPTED_EXIT_CODE: i32 = 130;

static STATE: OnceLock<Arc<SignalState>> = OnceLock::new();

/// What the process-wide handler does with one SIGINT, SIGTERM or SIGHUP.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalAction {
    /// A session is running; its token was flipped.
    Cancel,
    /// No session is running; the process should exit.
    Exit,
}

#[derive(Debug, Default)]
struct SignalState {
    armed: AtomicBool,
    token: CancelToken,
}

impl SignalState {
    fn handle(&self) -> SignalAction {
        if self.armed.load(Ordering::SeqCst) {
            self.token.cancel();
            SignalAction::Cancel
        } else {
            SignalAction::Exit
        }
    }
}

/// Routes termination signals to one dashboard session while it lives.
///
/// Dropping the scope disarms it, after which signals terminate the process
/// again, so a menu or prompt that outlives the session stays interruptible.
#[derive(Debug)]
pub struct TerminationScope {
    state: Arc<SignalState>,
}

impl TerminationScope {
    fn arm(state: Arc<SignalState>) -> Self {
        state.token.reset();
        state.armed.store(true, Ordering::SeqCst);
        Self { state }
    }

    pub fn token(&self) -> CancelToken {
        self.state.token.clone()
    }

    /// Apply one signal delivery; this is exactly what the installed handler does.
    pub fn deliver(&self) -> SignalAction {
        self.state.handle()
    }
}

impl Drop for TerminationScope {
    fn drop(&mut self) {
        self.state.armed.store(false, Ordering::SeqCst);
    }
}

/// Arm signal routing for one session.
///
/// The `ctrlc` handler is installed on first call and stays for the life of
/// the process, but it only cancels while a scope is alive.
pub fn termination_scope() -> Result<TerminationScope, ctrlc::Error> {
    if let Some(state) = STATE.get() {
        return Ok(TerminationScope::arm(Arc::clone(state)));
    }

    let state = Arc::new(SignalState::default());
    let handler_state = Arc::clone(&state);
    ctrlc::set_handler(move || {
        if handler_state.handle() == SignalAction::Exit {
            std::process::exit(INTERRUPTED_EXIT_CODE);
        }
    })?;
    let state = STATE.get_or_init(|| state);
    Ok(TerminationScope::arm(Arc::clone(state)))
}
