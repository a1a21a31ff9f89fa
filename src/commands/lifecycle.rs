//! start, stop and restart.

use anyhow::Result;

use super::common::{print_ok, print_step, require_root, Context};

pub fn start() -> Result<()> {
    require_root("start")?;
    let ctx = Context::load()?;
    ctx.ensure_engine()?;
    let settings = ctx.settings()?;

    print_step("Starting workload...");
    ctx.controller.ensure_running(&settings)?;
    print_ok("Conduit is running");
    Ok(())
}

pub fn stop() -> Result<()> {
    require_root("stop")?;
    let ctx = Context::load()?;
    ctx.ensure_engine()?;

    if ctx.controller.stop()? {
        print_ok("Conduit stopped");
    } else {
        println!("Conduit is not running");
    }
    Ok(())
}

pub fn restart() -> Result<()> {
    require_root("restart")?;
    let ctx = Context::load()?;
    ctx.ensure_engine()?;

    print_step("Restarting workload...");
    ctx.controller.restart()?;
    print_ok("Conduit restarted");
    Ok(())
}
