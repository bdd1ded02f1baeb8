use clap::{Parser, Subcommand, Args};

#[derive(Parser)]
#[command(name = "costintel", version, about = "Cost intelligence reporting API")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase log verbosity (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP REST API server
    Serve(ServeArgs),
    /// Validate a configuration file
    Validate(ValidateArgs),
    /// Run a budget-cut simulation or scenario comparison against a database
    Simulate(SimulateArgs),
}

#[derive(Args, Clone)]
pub struct ServeArgs {
    /// Listen port (overrides the config file)
    #[arg(long)]
    pub port: Option<u16>,

    /// Listen address (overrides the config file)
    #[arg(long)]
    pub host: Option<String>,

    /// SQLite database path (overrides the config file)
    #[arg(long)]
    pub db: Option<String>,

    /// YAML configuration file
    #[arg(short, long)]
    pub config: Option<String>,
}

#[derive(Args, Clone)]
pub struct ValidateArgs {
    /// Config file to validate
    pub config: String,
}

#[derive(Args, Clone)]
pub struct SimulateArgs {
    /// SQLite database path
    #[arg(long, default_value = "costintel.db")]
    pub db: String,

    /// JSON file with a simulation request, or a comparison request holding `scenarios`
    #[arg(short, long)]
    pub input: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}
