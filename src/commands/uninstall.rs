use anyhow::{bail, Result};

use super::common::{
    confirm, print_ok, print_step, print_warn, require_root, stdin_is_interactive, Context,
};

/// Remove the workload and its auto-start registration.
///
/// The data volume and settings survive unless `purge` is set.
pub fn execute(purge: bool, yes: bool) -> Result<()> {
    require_root("uninstall")?;
    let mut ctx = Context::load()?;

    if !yes {
        if !stdin_is_interactive() {
            bail!("refusing to uninstall without confirmation; pass --yes");
        }
        let question = if purge {
            "Remove Conduit, its data volume and settings?"
        } else {
            "Remove Conduit (data volume and settings are kept)?"
        };
        if !confirm(question)? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    ctx.ensure_engine()?;

    print_step("Removing auto-start registration...");
    ctx.services().remove()?;

    print_step("Removing workload...");
    ctx.controller.uninstall(purge)?;

    if purge {
        ctx.store.remove()?;
        print_ok("Workload, data volume and settings removed");
    } else {
        print_ok("Workload removed");
        print_warn(&format!(
            "Data volume '{}' and {} were kept; use --purge to delete them",
            ctx.config.volume_name,
            ctx.settings_path().display()
        ));
    }
    Ok(())
}
