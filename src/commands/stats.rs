//! Live dashboard command.

use std::io::{self, IsTerminal};
use std::time::Duration;

use anyhow::{bail, Context as _, Result};
use crossterm::execute;
use crossterm::terminal::{Clear, ClearType};

use super::common::Context;
use crate::dashboard::{
    termination_scope, CrosstermTerminal, DashboardOptions, DashboardSession, FrameStyle,
    HeadlessWaiter, InteractiveWaiter, PlainTerminal, SessionExit,
};
use crate::models::SettingsRecord;

pub fn execute(interval: Option<u64>, headless: bool) -> Result<()> {
    let ctx = Context::load()?;
    ctx.ensure_engine()?;
    let settings = ctx.settings()?;
    run_dashboard(&ctx, &settings, interval, headless)?;
    Ok(())
}

/// Run a dashboard session; interactive only when stdin and stdout are ttys.
pub fn run_dashboard(
    ctx: &Context,
    settings: &SettingsRecord,
    interval: Option<u64>,
    headless: bool,
) -> Result<SessionExit> {
    let refresh = match interval {
        Some(0) => bail!("--interval must be at least 1 second"),
        Some(secs) => Duration::from_secs(secs),
        None => ctx.config.refresh_interval(),
    };
    let interactive = !headless && io::stdout().is_terminal() && io::stdin().is_terminal();
    let options = DashboardOptions {
        refresh,
        log_tail: ctx.config.log_tail,
        style: if interactive {
            FrameStyle::InPlace
        } else {
            FrameStyle::Append
        },
        interactive,
    };

    // Held until the session returns; signals terminate the process again after that.
    let scope = termination_scope().context("Failed to install signal handler")?;
    let token = scope.token();
    let session = DashboardSession::new(&ctx.controller, settings, options, token.clone());
    let mut out = io::stdout();

    let exit = if interactive {
        execute!(out, Clear(ClearType::All))?;
        session.run(CrosstermTerminal, &mut InteractiveWaiter::new(token), &mut out)?
    } else {
        session.run(PlainTerminal, &mut HeadlessWaiter::new(token), &mut out)?
    };
    Ok(exit)
}
