use anyhow::Result;
use colored::Colorize;

use super::common::Context;

pub fn execute(tail: Option<usize>, follow: bool) -> Result<()> {
    let ctx = Context::load()?;
    ctx.ensure_engine()?;
    let tail = tail.unwrap_or(ctx.config.log_tail);

    if follow {
        ctx.controller.follow_logs(tail)?;
        return Ok(());
    }

    let lines = ctx.controller.recent_logs(tail)?;
    if lines.is_empty() {
        println!("{}", "No log output (is the workload installed?)".dimmed());
    }
    for line in lines {
        println!("{line}");
    }
    Ok(())
}
