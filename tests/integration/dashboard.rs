//! Dashboard session exit paths.

use std::cell::Cell;
use std::collections::VecDeque;
use std::io;
use std::rc::Rc;
use std::time::Duration;

use conduit::dashboard::{
    termination_scope, CancelToken, DashboardOptions, DashboardSession, FrameStyle,
    HeadlessWaiter, SessionExit, SignalAction, TerminalMode, WaitOutcome, Waiter,
};
use conduit::models::{Completeness, SettingsRecord};

use super::helpers::{controller, ScriptedEngine};

/// Terminal double counting mode switches.
#[derive(Clone, Default)]
struct FakeTerminal {
    enters: Rc<Cell<usize>>,
    restores: Rc<Cell<usize>>,
}

impl TerminalMode for FakeTerminal {
    fn enter(&mut self) -> io::Result<()> {
        self.enters.set(self.enters.get() + 1);
        Ok(())
    }

    fn restore(&mut self) {
        self.restores.set(self.restores.get() + 1);
    }
}

/// Returns queued outcomes, then `Elapsed` forever.
struct ScriptedWaiter {
    outcomes: VecDeque<WaitOutcome>,
    waits: usize,
}

impl ScriptedWaiter {
    fn new(outcomes: &[WaitOutcome]) -> Self {
        Self {
            outcomes: outcomes.iter().copied().collect(),
            waits: 0,
        }
    }
}

impl Waiter for ScriptedWaiter {
    fn wait(&mut self, _timeout: Duration) -> WaitOutcome {
        self.waits += 1;
        self.outcomes.pop_front().unwrap_or(WaitOutcome::Elapsed)
    }
}

fn options() -> DashboardOptions {
    DashboardOptions {
        refresh: Duration::from_millis(10),
        log_tail: 200,
        style: FrameStyle::Append,
        interactive: false,
    }
}

#[test]
fn signal_mid_frame_restores_terminal_exactly_once() {
    let token = CancelToken::new();
    let engine = ScriptedEngine::running();
    *engine.cancel_during_stats.borrow_mut() = Some(token.clone());
    let ctl = controller(engine);
    let settings = SettingsRecord::default();
    let terminal = FakeTerminal::default();
    let session = DashboardSession::new(&ctl, &settings, options(), token.clone());

    let mut waiter = HeadlessWaiter::new(token);
    let mut out = Vec::new();
    let exit = session.run(terminal.clone(), &mut waiter, &mut out).unwrap();

    assert_eq!(exit, SessionExit::Cancelled);
    assert_eq!(terminal.enters.get(), 1);
    assert_eq!(terminal.restores.get(), 1);
    // The interrupted frame is never drawn.
    assert!(out.is_empty());
}

#[test]
fn key_press_ends_session_after_rendering() {
    let ctl = controller(ScriptedEngine::running());
    ctl.engine().logs.borrow_mut().extend([
        "starting conduit".to_string(),
        "[STATS] Connecting: 1 | Connected: 7 | Up: 10KB/s | Down: 20KB/s | Uptime: 5m".to_string(),
    ]);
    let settings = SettingsRecord::default();
    let terminal = FakeTerminal::default();
    let session = DashboardSession::new(&ctl, &settings, options(), CancelToken::new());

    let mut waiter = ScriptedWaiter::new(&[WaitOutcome::Elapsed, WaitOutcome::KeyPressed]);
    let mut out = Vec::new();
    let exit = session.run(terminal.clone(), &mut waiter, &mut out).unwrap();

    assert_eq!(exit, SessionExit::KeyPressed);
    assert_eq!(waiter.waits, 2);
    assert_eq!(terminal.restores.get(), 1);
    let text = String::from_utf8(out).unwrap();
    assert_eq!(text.matches("CONDUIT LIVE STATS").count(), 2);
}

#[test]
fn cancelled_wait_ends_session() {
    let ctl = controller(ScriptedEngine::running());
    let settings = SettingsRecord::default();
    let terminal = FakeTerminal::default();
    let session = DashboardSession::new(&ctl, &settings, options(), CancelToken::new());

    let mut waiter = ScriptedWaiter::new(&[WaitOutcome::Cancelled]);
    let exit = session
        .run(terminal.clone(), &mut waiter, &mut io::sink())
        .unwrap();
    assert_eq!(exit, SessionExit::Cancelled);
    assert_eq!(terminal.restores.get(), 1);
}

#[test]
fn snapshot_extracts_latest_telemetry_and_leaves_workload_alone() {
    let ctl = controller(ScriptedEngine::running());
    ctl.engine().logs.borrow_mut().extend([
        "[STATS] Connecting: 9 | Connected: 1 | Up: 1KB/s | Down: 1KB/s | Uptime: 1m".to_string(),
        "[STATS] Connected: 42 | Up: 1.2MB/s | Down: 3.4MB/s | Uptime: 2h5m".to_string(),
    ]);
    let settings = SettingsRecord::default();
    let session = DashboardSession::new(&ctl, &settings, options(), CancelToken::new());

    let frame = session.snapshot();
    assert_eq!(frame.telemetry.connected, 42);
    assert_eq!(frame.telemetry.connecting, 0);
    assert_eq!(frame.telemetry.completeness, Completeness::Partial);
    assert!(ctl.engine().calls.borrow().is_empty());
}

#[test]
fn failing_writer_still_restores_once() {
    struct Broken;
    impl io::Write for Broken {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    let ctl = controller(ScriptedEngine::running());
    let settings = SettingsRecord::default();
    let terminal = FakeTerminal::default();
    let session = DashboardSession::new(&ctl, &settings, options(), CancelToken::new());

    let result = session.run(terminal.clone(), &mut ScriptedWaiter::new(&[]), &mut Broken);
    assert!(result.is_err());
    assert_eq!(terminal.restores.get(), 1);
}

#[test]
fn signal_scope_is_released_when_the_session_ends() {
    let ctl = controller(ScriptedEngine::running());
    let settings = SettingsRecord::default();

    let scope = termination_scope().unwrap();
    let token = scope.token();
    let session = DashboardSession::new(&ctl, &settings, options(), token.clone());
    assert_eq!(scope.deliver(), SignalAction::Cancel);
    let mut out: Vec<u8> = Vec::new();
    let exit = session
        .run(FakeTerminal::default(), &mut HeadlessWaiter::new(token), &mut out)
        .unwrap();
    assert_eq!(exit, SessionExit::Cancelled);
    drop(scope);

    // A later session starts clean rather than inheriting the cancellation.
    let next = termination_scope().unwrap();
    assert!(!next.token().is_cancelled());
}
