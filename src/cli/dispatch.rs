use std::io;
use std::str::FromStr;

use anyhow::Result;
use clap::CommandFactory;
use conduit::commands::{
    health, install, lifecycle, logs, menu, settings, stats, status, uninstall, update,
};
use conduit::completions::{generate_completions, Shell};
use conduit::models::SettingsUpdate;

use super::types::{Cli, Commands};

pub fn dispatch(command: Commands) -> Result<()> {
    match command {
        Commands::Install {
            max_clients,
            bandwidth,
        } => install::execute(max_clients, bandwidth),
        Commands::Status => status::execute(),
        Commands::Stats { interval, headless } => stats::execute(interval, headless),
        Commands::Logs { tail, follow } => logs::execute(tail, follow),
        Commands::Start => lifecycle::start(),
        Commands::Stop => lifecycle::stop(),
        Commands::Restart => lifecycle::restart(),
        Commands::Settings {
            max_clients,
            bandwidth,
            cpus,
            memory,
        } => settings::execute(SettingsUpdate {
            max_clients,
            bandwidth,
            cpus,
            memory,
        }),
        Commands::Update => update::execute(),
        Commands::Health => health::execute(),
        Commands::Uninstall { purge, yes } => uninstall::execute(purge, yes),
        Commands::Menu => menu::execute(),
        Commands::Completions { shell } => {
            let shell = Shell::from_str(&shell)?;
            generate_completions(&mut Cli::command(), shell, &mut io::stdout());
            Ok(())
        }
    }
}
