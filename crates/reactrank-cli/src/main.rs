//! CLI for reactrank — record reaction-time results and rank users against the population.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "reactrank")]
#[command(about = "reactrank — percentile ranking for reaction-time tests")]
#[command(version = reactrank_core::VERSION)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API
    Serve {
        /// Bind address (overrides the config file)
        #[arg(long)]
        host: Option<String>,

        /// Port (overrides the config file)
        #[arg(long)]
        port: Option<u16>,

        /// TOML config file
        #[arg(long)]
        config: Option<PathBuf>,

        /// JSON array of measurements to load before serving
        #[arg(long)]
        seed: Option<PathBuf>,

        /// Summary lifetime in seconds (overrides the config file)
        #[arg(long)]
        ttl_secs: Option<u64>,
    },

    /// Rank one user against a data file and print the report as JSON
    Rank {
        /// JSON array of measurements
        #[arg(long)]
        data: PathBuf,

        /// User id to rank
        #[arg(long)]
        user: String,
    },

    /// Print trimmed statistics for a data file as JSON
    Stats {
        /// JSON array of measurements
        #[arg(long)]
        data: PathBuf,

        /// Restrict to one user's runs
        #[arg(long)]
        user: Option<String>,

        /// Percentage trimmed from each end
        #[arg(long, default_value_t = reactrank_core::DEFAULT_EXCLUDE_PERCENT)]
        exclude_percent: f64,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            host,
            port,
            config,
            seed,
            ttl_secs,
        } => commands::serve::run(commands::serve::ServeCommandConfig {
            host,
            port,
            config_path: config,
            seed_path: seed,
            ttl_secs,
        }),
        Commands::Rank { data, user } => commands::rank::run(&data, &user),
        Commands::Stats {
            data,
            user,
            exclude_percent,
        } => commands::stats::run(&data, user.as_deref(), exclude_percent),
    }
}
