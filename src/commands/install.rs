//! Install command: settings, service registration, running workload.

use anyhow::{Context as _, Result};
use colored::Colorize;

use super::common::{
    print_ok, print_settings, print_step, print_warn, report_warnings, require_root, Context,
};
use crate::models::{SettingsUpdate, WorkloadState};
use crate::service::InstallOutcome;

pub fn execute(max_clients: Option<String>, bandwidth: Option<String>) -> Result<()> {
    require_root("install")?;
    let ctx = Context::load()?;

    print_step("Checking container engine...");
    ctx.ensure_engine()?;

    let current = ctx.settings()?;
    let update = SettingsUpdate {
        max_clients,
        bandwidth,
        ..SettingsUpdate::default()
    };
    let (settings, warnings) = update.apply_to(&current);
    report_warnings(&warnings);

    let settings_changed = settings != current;
    if !ctx.store.exists() || settings_changed {
        ctx.store
            .save(&settings)
            .context("Failed to write settings")?;
        print_ok(&format!("Settings saved to {}", ctx.settings_path().display()));
    }
    print_settings(&settings);

    let services = ctx.services();
    print_step(&format!("Registering auto-start ({})...", services.kind()));
    match services.install(&services.unit(&ctx.unit_commands()))? {
        InstallOutcome::Installed => print_ok("Service registered"),
        InstallOutcome::Unchanged => print_ok("Service already registered"),
        InstallOutcome::Skipped { reason } => print_warn(&reason),
    }

    let state = ctx.controller.status()?;
    if state.exists() && settings_changed {
        print_step("Recreating workload with the new settings...");
        let report = ctx.controller.apply_settings(&ctx.store, &settings)?;
        if let Some(warning) = report.pull_warning {
            print_warn(&format!("Image refresh failed, using the local image: {warning}"));
        }
    } else {
        if state == WorkloadState::Absent {
            print_step(&format!("Pulling {}...", ctx.config.image));
            if let Err(e) = ctx.controller.refresh_image() {
                print_warn(&format!("Pull failed, trying the local image: {e}"));
            }
        }
        print_step("Starting workload...");
        ctx.controller.ensure_running(&settings)?;
    }

    print_ok(&format!(
        "Conduit is {}. Watch it with {}",
        "running".green().bold(),
        "conduit stats".cyan()
    ));
    Ok(())
}
