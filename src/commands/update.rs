use anyhow::Result;

use super::common::{print_ok, print_step, require_root, Context};

/// Pull the configured image and recreate the workload on it.
pub fn execute() -> Result<()> {
    require_root("update")?;
    let ctx = Context::load()?;
    ctx.ensure_engine()?;
    let settings = ctx.settings()?;

    print_step(&format!("Pulling {} and recreating the workload...", ctx.config.image));
    let report = ctx.controller.update(&settings)?;
    if report.replaced {
        print_ok("Workload recreated on the latest image");
    } else {
        print_ok("Workload created on the latest image");
    }
    Ok(())
}
