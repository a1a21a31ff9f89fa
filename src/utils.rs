use std::io::{self, Write};
use std::sync::Once;

use crossterm::cursor::Show;
use crossterm::execute;
use crossterm::style::ResetColor;
use crossterm::terminal::disable_raw_mode;

static PANIC_HOOK_INSTALLED: Once = Once::new();

/// Put the terminal back into a usable state.
///
/// Leaves raw mode, shows the cursor, resets colours and moves to a fresh
/// line. Best effort; errors are ignored.
pub fn cleanup_terminal() {
    let _ = disable_raw_mode();
    let mut stdout = io::stdout();
    let _ = execute!(stdout, ResetColor, Show);
    let _ = stdout.write_all(b"\r\n");
    let _ = stdout.flush();
}

/// Install a panic hook that restores the terminal before the default hook
/// prints the panic. Safe to call more than once.
pub fn install_terminal_panic_hook() {
    PANIC_HOOK_INSTALLED.call_once(|| {
        let default_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |panic_info| {
            cleanup_terminal();
            default_hook(panic_info);
        }));
    });
}

/// Truncate by character count, not bytes.
pub fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{truncated}...")
    }
}
