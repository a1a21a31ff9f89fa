//! One-shot status report.

use anyhow::Result;
use colored::Colorize;

use super::common::{print_settings, Context};
use crate::models::{Completeness, ResourceUsage, TelemetrySample, WorkloadState};
use crate::stats;

pub fn execute() -> Result<()> {
    let ctx = Context::load()?;
    ctx.ensure_engine()?;

    let state = ctx.controller.status()?;
    let settings = ctx.settings()?;
    let services = ctx.services();

    println!("{}", "Conduit Status".bold().blue());
    println!("{}", "=".repeat(50));
    println!("  Workload:     {}", state_label(state));
    match ctx.controller.resource_usage() {
        ResourceUsage::Available {
            cpu_percent,
            memory,
        } => {
            println!("  CPU:          {cpu_percent}");
            println!("  Memory:       {memory}");
        }
        ResourceUsage::Unavailable => println!("  Resources:    {}", "unavailable".dimmed()),
    }
    println!(
        "  Auto-start:   {} ({})",
        if services.is_installed() {
            "registered".green()
        } else {
            "not registered".yellow()
        },
        services.kind()
    );
    println!("  Home:         {}", ctx.home.display());

    println!("\n{}", "Settings".bold());
    print_settings(&settings);

    println!("\n{}", "Telemetry".bold());
    let sample = match ctx.controller.recent_logs(ctx.config.log_tail) {
        Ok(lines) => stats::extract(&lines),
        Err(_) => TelemetrySample::no_data(),
    };
    print_telemetry(&sample);
    Ok(())
}

fn state_label(state: WorkloadState) -> String {
    match state {
        WorkloadState::Running => state.to_string().green().bold().to_string(),
        WorkloadState::Absent | WorkloadState::Removed => state.to_string().red().to_string(),
        _ => state.to_string().yellow().to_string(),
    }
}

fn print_telemetry(sample: &TelemetrySample) {
    if sample.completeness == Completeness::NoData {
        println!("  {}", "No [STATS] output yet".dimmed());
        return;
    }
    println!("  Connected:    {}", sample.connected);
    println!("  Connecting:   {}", sample.connecting);
    println!("  Upload:       {}", sample.upload_rate);
    println!("  Download:     {}", sample.download_rate);
    println!("  Uptime:       {}", sample.uptime);
    if sample.is_degraded() {
        println!("  {}", "Some fields were missing from the last report".yellow());
    }
}
