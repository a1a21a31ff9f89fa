//! Numbered interactive menu over the other commands.

use anyhow::{bail, Result};
use colored::Colorize;

use super::common::{print_fail, prompt, report_error, stdin_is_interactive, Context};
use super::{health, lifecycle, logs, settings, stats, status, uninstall, update};
use crate::dashboard::SessionExit;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    Dashboard,
    Status,
    Logs,
    Start,
    Stop,
    Restart,
    Settings,
    Update,
    Health,
    Uninstall,
    Quit,
}

const ENTRIES: [(MenuChoice, &str); 11] = [
    (MenuChoice::Dashboard, "Live dashboard"),
    (MenuChoice::Status, "Status"),
    (MenuChoice::Logs, "Recent logs"),
    (MenuChoice::Start, "Start"),
    (MenuChoice::Stop, "Stop"),
    (MenuChoice::Restart, "Restart"),
    (MenuChoice::Settings, "Change settings"),
    (MenuChoice::Update, "Update image"),
    (MenuChoice::Health, "Health check"),
    (MenuChoice::Uninstall, "Uninstall"),
    (MenuChoice::Quit, "Quit"),
];

/// `1`..`10` pick an entry, `0`/`q` quit.
pub fn parse_choice(input: &str) -> Option<MenuChoice> {
    let input = input.trim();
    if input == "0" || input.eq_ignore_ascii_case("q") {
        return Some(MenuChoice::Quit);
    }
    let index: usize = input.parse().ok()?;
    ENTRIES
        .iter()
        .filter(|(choice, _)| *choice != MenuChoice::Quit)
        .nth(index.checked_sub(1)?)
        .map(|(choice, _)| *choice)
}

pub fn execute() -> Result<()> {
    if !stdin_is_interactive() {
        bail!("the menu needs an interactive terminal; use the subcommands instead");
    }

    loop {
        print_menu();
        let Some(answer) = prompt("Choice", "q")? else {
            return Ok(());
        };
        let Some(choice) = parse_choice(&answer) else {
            print_fail(&format!("'{answer}' is not a menu entry"));
            continue;
        };

        let result = match choice {
            MenuChoice::Quit => return Ok(()),
            MenuChoice::Dashboard => match dashboard() {
                Ok(SessionExit::Cancelled) => return Ok(()),
                Ok(SessionExit::KeyPressed) => Ok(()),
                Err(e) => Err(e),
            },
            MenuChoice::Status => status::execute(),
            MenuChoice::Logs => logs::execute(Some(50), false),
            MenuChoice::Start => lifecycle::start(),
            MenuChoice::Stop => lifecycle::stop(),
            MenuChoice::Restart => lifecycle::restart(),
            MenuChoice::Settings => settings::execute(Default::default()),
            MenuChoice::Update => update::execute(),
            MenuChoice::Health => health::execute(),
            MenuChoice::Uninstall => uninstall::execute(false, false),
        };
        if let Err(e) = result {
            report_error(&e);
        }
    }
}

fn dashboard() -> Result<SessionExit> {
    let ctx = Context::load()?;
    ctx.ensure_engine()?;
    let settings = ctx.settings()?;
    stats::run_dashboard(&ctx, &settings, None, false)
}

fn print_menu() {
    println!("\n{}", crate::LOGO.cyan());
    println!("  {}", "Conduit Manager".bold().blue());
    println!("{}", "─".repeat(30));
    for (number, (_, label)) in ENTRIES
        .iter()
        .filter(|(choice, _)| *choice != MenuChoice::Quit)
        .enumerate()
    {
        println!("  {:>2}. {label}", number + 1);
    }
    println!("   {}", "0. Quit".dimmed());
}
