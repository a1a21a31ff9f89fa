//! View and change the workload settings.
//!
//! With any flag present the command is non-interactive; otherwise it
//! prompts for each value, showing the current one. Rejected values are
//! reported and the previous value is kept.

use anyhow::Result;

use super::common::{
    print_ok, print_settings, print_step, print_warn, prompt, report_warnings, require_root,
    stdin_is_interactive, Context,
};
use crate::models::settings::format_memory;
use crate::models::{SettingsRecord, SettingsUpdate};

pub fn execute(update: SettingsUpdate) -> Result<()> {
    require_root("settings")?;
    let ctx = Context::load()?;
    let current = ctx.settings()?;

    let update = if update.is_empty() {
        if !stdin_is_interactive() {
            println!("Current settings:");
            print_settings(&current);
            return Ok(());
        }
        prompt_for_update(&current)?
    } else {
        update
    };

    let (next, warnings) = update.apply_to(&current);
    report_warnings(&warnings);
    if next == current {
        println!("No changes to apply.");
        return Ok(());
    }

    apply(&ctx, &next)
}

/// Persist `settings` and recreate the workload with them.
pub fn apply(ctx: &Context, settings: &SettingsRecord) -> Result<()> {
    ctx.ensure_engine()?;
    print_step("Applying settings (the workload will be recreated)...");
    let report = ctx.controller.apply_settings(&ctx.store, settings)?;
    if let Some(warning) = report.pull_warning {
        print_warn(&format!("Image refresh failed, using the local image: {warning}"));
    }
    print_ok("Settings applied");
    print_settings(settings);
    Ok(())
}

pub fn prompt_for_update(current: &SettingsRecord) -> Result<SettingsUpdate> {
    println!("Press enter to keep a value. Bandwidth -1 means unlimited; cpus/memory 'none' clears.");
    Ok(SettingsUpdate {
        max_clients: prompt("Max clients (1-1000)", &current.max_clients.to_string())?,
        bandwidth: prompt("Bandwidth in Mbps (1-40)", &current.bandwidth.as_flag())?,
        cpus: prompt("CPU limit in cores", &optional(current.cpu_limit.map(|c| c.to_string())))?,
        memory: prompt(
            "Memory limit (e.g. 512m, 1g)",
            &optional(current.memory_limit.map(format_memory)),
        )?,
    })
}

fn optional(value: Option<String>) -> String {
    value.unwrap_or_else(|| "none".to_string())
}
