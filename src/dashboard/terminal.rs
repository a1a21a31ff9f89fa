//! Terminal mode ownership for the live dashboard.

use std::io;

use crossterm::cursor::Hide;
use crossterm::execute;
use crossterm::terminal::enable_raw_mode;

use crate::utils::{cleanup_terminal, install_terminal_panic_hook};

/// Something that can switch the terminal into dashboard mode and back.
pub trait TerminalMode {
    fn enter(&mut self) -> io::Result<()>;
    fn restore(&mut self);
}

/// Raw mode with a hidden cursor on stdout.
#[derive(Debug, Default)]
pub struct CrosstermTerminal;

impl TerminalMode for CrosstermTerminal {
    fn enter(&mut self) -> io::Result<()> {
        install_terminal_panic_hook();
        enable_raw_mode()?;
        execute!(io::stdout(), Hide)
    }

    fn restore(&mut self) {
        cleanup_terminal();
    }
}

/// Leaves the terminal alone; used headless.
#[derive(Debug, Default)]
pub struct PlainTerminal;

impl TerminalMode for PlainTerminal {
    fn enter(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn restore(&mut self) {}
}

/// Restores the terminal exactly once: explicitly, or on drop.
pub struct TerminalGuard<T: TerminalMode> {
    mode: T,
    restored: bool,
}

impl<T: TerminalMode> TerminalGuard<T> {
    pub fn enter(mut mode: T) -> io::Result<Self> {
        if let Err(e) = mode.enter() {
            // Partially entered modes still need undoing.
            mode.restore();
            return Err(e);
        }
        Ok(Self {
            mode,
            restored: false,
        })
    }

    pub fn restore(&mut self) {
        if self.restored {
            return;
        }
        self.restored = true;
        self.mode.restore();
    }
}

impl<T: TerminalMode> Drop for TerminalGuard<T> {
    fn drop(&mut self) {
        self.restore();
    }
}
