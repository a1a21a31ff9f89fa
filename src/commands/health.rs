//! Health checks with a non-zero exit on any failure.

use anyhow::{bail, Result};
use colored::Colorize;

use super::common::{print_fail, print_ok, print_warn, Context};
use crate::models::{Completeness, WorkloadState};
use crate::service::InitKind;
use crate::stats;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckResult {
    Pass(String),
    /// Worth a look, but not a failure.
    Warn(String),
    Fail(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthCheck {
    pub name: &'static str,
    pub result: CheckResult,
}

impl HealthCheck {
    fn new(name: &'static str, result: CheckResult) -> Self {
        Self { name, result }
    }
}

pub fn execute() -> Result<()> {
    let ctx = Context::load()?;
    let checks = run_checks(&ctx);

    println!("{}", "Conduit Health".bold().blue());
    for check in &checks {
        match &check.result {
            CheckResult::Pass(detail) => print_ok(&format!("{}: {detail}", check.name)),
            CheckResult::Warn(detail) => print_warn(&format!("{}: {detail}", check.name)),
            CheckResult::Fail(detail) => print_fail(&format!("{}: {detail}", check.name)),
        }
    }

    let failed = count_failures(&checks);
    if failed > 0 {
        bail!("{failed} health check(s) failed");
    }
    Ok(())
}

pub fn run_checks(ctx: &Context) -> Vec<HealthCheck> {
    let mut checks = Vec::new();

    if let Err(e) = ctx.ensure_engine() {
        checks.push(HealthCheck::new("engine", CheckResult::Fail(e.to_string())));
        checks.push(settings_check(ctx));
        checks.push(service_check(ctx));
        return checks;
    }
    checks.push(HealthCheck::new(
        "engine",
        CheckResult::Pass("docker daemon reachable".to_string()),
    ));

    let workload = match ctx.controller.status() {
        Ok(WorkloadState::Running) => CheckResult::Pass("running".to_string()),
        Ok(state) => CheckResult::Fail(state.to_string()),
        Err(e) => CheckResult::Fail(e.to_string()),
    };
    checks.push(HealthCheck::new("workload", workload));

    let volume = match ctx.controller.data_volume_present() {
        Ok(true) => CheckResult::Pass(format!("'{}' present", ctx.config.volume_name)),
        Ok(false) => CheckResult::Fail(format!("'{}' missing", ctx.config.volume_name)),
        Err(e) => CheckResult::Fail(e.to_string()),
    };
    checks.push(HealthCheck::new("data volume", volume));

    checks.push(settings_check(ctx));
    checks.push(service_check(ctx));

    let telemetry = match ctx.controller.recent_logs(ctx.config.log_tail) {
        Ok(lines) => match stats::extract(&lines).completeness {
            Completeness::Full => CheckResult::Pass("reporting".to_string()),
            Completeness::Partial => CheckResult::Warn("last report incomplete".to_string()),
            Completeness::NoData => CheckResult::Warn("no [STATS] output yet".to_string()),
        },
        Err(e) => CheckResult::Warn(e.to_string()),
    };
    checks.push(HealthCheck::new("telemetry", telemetry));

    checks
}

fn settings_check(ctx: &Context) -> HealthCheck {
    let result = if !ctx.store.exists() {
        CheckResult::Fail(format!("{} missing", ctx.settings_path().display()))
    } else {
        match ctx.store.load() {
            Ok(s) => CheckResult::Pass(format!(
                "max-clients {}, bandwidth {}",
                s.max_clients, s.bandwidth
            )),
            Err(e) => CheckResult::Fail(e.to_string()),
        }
    };
    HealthCheck::new("settings", result)
}

fn service_check(ctx: &Context) -> HealthCheck {
    let services = ctx.services();
    let result = match services.kind() {
        InitKind::None => CheckResult::Warn("no init system; relying on restart policy".to_string()),
        kind if services.is_installed() => CheckResult::Pass(format!("{kind} unit present")),
        kind => CheckResult::Fail(format!("{kind} unit missing")),
    };
    HealthCheck::new("auto-start", result)
}

pub fn count_failures(checks: &[HealthCheck]) -> usize {
    checks
        .iter()
        .filter(|c| matches!(c.result, CheckResult::Fail(_)))
        .count()
}
