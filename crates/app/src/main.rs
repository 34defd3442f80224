use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tap_to_prosper_core::GameConfig;
use tracing_subscriber::EnvFilter;

mod play;
mod simulate;

use simulate::BotSettings;

fn main() -> tap_to_prosper_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref(), cli.single_target)?;

    match cli.command {
        Commands::Play { seed } => play::run(config, seed),
        Commands::Simulate {
            seed,
            accuracy,
            taps_per_tick,
            max_rounds,
            json,
        } => simulate::run(
            config,
            BotSettings {
                seed,
                accuracy,
                taps_per_tick,
                max_rounds,
                json,
            },
        ),
    }
}

fn load_config(
    path: Option<&PathBuf>,
    single_target: bool,
) -> tap_to_prosper_core::Result<GameConfig> {
    let config = match path {
        Some(path) => {
            tracing::info!(?path, "loading game configuration");
            GameConfig::load(path)?
        }
        None if single_target => GameConfig::single_target(),
        None => GameConfig::default(),
    };
    Ok(config)
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Tap To Prosper: keep up with your payments", long_about = None)]
struct Cli {
    /// JSON file with game parameters. Missing fields keep their defaults.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    /// Play the single-target variant (ignored when --config is given).
    #[arg(long, global = true)]
    single_target: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Play in real time from the terminal.
    Play {
        /// Seed for object placement.
        #[arg(short, long)]
        seed: Option<u64>,
    },
    /// Let a bot play a game in virtual time and report each round.
    Simulate {
        #[arg(short, long, default_value_t = 7)]
        seed: u64,
        /// Chance that each tap attempt lands.
        #[arg(short, long, default_value_t = 0.8)]
        accuracy: f64,
        /// Tap attempts per countdown second.
        #[arg(short, long, default_value_t = 2)]
        taps_per_tick: u32,
        /// Stop after this many rounds even if the game is still running.
        #[arg(short, long, default_value_t = 50)]
        max_rounds: u32,
        /// Print a JSON snapshot after every round instead of a summary line.
        #[arg(long)]
        json: bool,
    },
}
