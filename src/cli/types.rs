use clap::{Parser, Subcommand};

const HELP_TEMPLATE: &str = "
  ┌─┐┌─┐┌┐┌┌┬┐┬ ┬┬┌┬┐
  │  │ ││││ │││ ││ │
  └─┘└─┘┘└┘─┴┘└─┘┴ ┴

{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}";

#[derive(Parser)]
#[command(name = "conduit")]
#[command(about = "Manage a Psiphon Conduit node running in Docker", long_about = None)]
#[command(version)]
#[command(help_template = HELP_TEMPLATE)]
#[command(subcommand_help_heading = "Commands")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Save settings, register auto-start and start the node
    Install {
        /// Maximum concurrent clients (1-1000)
        #[arg(long)]
        max_clients: Option<String>,

        /// Per-client bandwidth in Mbps (1-40, or -1 for unlimited)
        #[arg(long, allow_hyphen_values = true)]
        bandwidth: Option<String>,
    },

    /// Show state, resource usage, settings and the latest telemetry
    Status,

    /// Live dashboard, refreshed until a key press or Ctrl+C
    Stats {
        /// Seconds between refreshes (default: 10)
        #[arg(short, long)]
        interval: Option<u64>,

        /// Never read the keyboard or switch terminal modes
        #[arg(long)]
        headless: bool,
    },

    /// Print recent workload logs
    Logs {
        /// Number of lines from the end (default: 200)
        #[arg(short = 'n', long)]
        tail: Option<usize>,

        /// Keep streaming new output
        #[arg(short, long)]
        follow: bool,
    },

    /// Start the node, creating it if needed
    Start,

    /// Stop the node
    Stop,

    /// Restart the node
    Restart,

    /// View or change settings; prompts when no flag is given
    Settings {
        /// Maximum concurrent clients (1-1000)
        #[arg(long)]
        max_clients: Option<String>,

        /// Per-client bandwidth in Mbps (1-40, or -1 for unlimited)
        #[arg(long, allow_hyphen_values = true)]
        bandwidth: Option<String>,

        /// CPU limit in cores, or 'none'
        #[arg(long)]
        cpus: Option<String>,

        /// Memory limit such as 512m or 1g, or 'none'
        #[arg(long)]
        memory: Option<String>,
    },

    /// Pull the latest image and recreate the node
    Update,

    /// Run health checks; exits non-zero when any fails
    Health,

    /// Remove the node and its auto-start registration
    Uninstall {
        /// Also delete the data volume and settings
        #[arg(long)]
        purge: bool,

        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Interactive menu
    Menu,

    /// Generate shell completion script
    Completions {
        /// Shell to generate completions for (bash, zsh, fish)
        shell: String,
    },
}
