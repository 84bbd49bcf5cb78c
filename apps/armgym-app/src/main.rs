//! armgym robot-arm environment CLI.
//!
//! Provides three modes of operation:
//! - `probe`: Connect to the simulator and exercise every command once
//! - `run`: Drive a random agent for N episodes and log statistics
//! - `info`: Print crate versions and the effective configuration

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};

use clap::{Parser, Subcommand};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use armgym_core::prelude::*;
use armgym_env::stats::EpisodeStats;
use armgym_gym::prelude::*;

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

/// Reinforcement-learning adapter for a simulated 6-DOF arm.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// TOML configuration file. Defaults apply when omitted.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Simulator address, overriding the configuration (e.g. tcp://localhost:5555).
    #[arg(short, long, global = true)]
    address: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect, reset, step once and configure, reporting each reply.
    Probe,

    /// Run a uniformly random agent.
    Run {
        /// Number of episodes to run.
        #[arg(short = 'n', long, default_value_t = 10)]
        episodes: u32,

        /// Random seed.
        #[arg(short, long, default_value_t = 0)]
        seed: u64,

        /// Log running statistics every N episodes.
        #[arg(long, default_value_t = 10)]
        log_every: u32,

        /// Smooth (simulation) motion instead of instant training moves.
        #[arg(long)]
        smooth: bool,
    },

    /// Print crate information and the effective configuration.
    Info,
}

// ---------------------------------------------------------------------------
// Mode implementations
// ---------------------------------------------------------------------------

fn load_config(cli: &Cli) -> Result<EnvConfig, ArmError> {
    let mut config = match &cli.config {
        Some(path) => EnvConfig::from_file(path)?,
        None => EnvConfig::default(),
    };
    if let Some(address) = &cli.address {
        config.address.clone_from(address);
    }
    config.validate()?;
    Ok(config)
}

fn run_probe(config: EnvConfig) -> Result<(), ArmError> {
    println!("connecting to {} ...", config.address);
    let mut client = SimClient::from_config(&config)?;
    client.connect()?;

    let reply = client.send_raw(serde_json::json!({"Type": "RESET"}))?;
    let keys: Vec<&str> = reply
        .as_object()
        .map(|m| m.keys().map(String::as_str).collect())
        .unwrap_or_default();
    println!("raw reset reply keys: {}", keys.join(", "));
    client.disconnect();

    let mut env = RobotArmEnv::open(config)?;
    let reset = env.reset()?;
    println!(
        "reset: joints={}, reset_frame={}, obs={:?}",
        reset.info.joint_count,
        reset.info.is_reset_frame,
        reset.observation.as_slice()
    );

    let step = env.step(&[0.0; ACTION_DIM])?;
    println!(
        "step: reward={:.4}, terminated={}, truncated={}, components={:?}",
        step.reward, step.terminated, step.truncated, step.info.reward_components
    );

    env.configure(false)?;
    println!("configure: ok");
    env.close();
    println!("probe succeeded");
    Ok(())
}

fn run_random(config: EnvConfig, episodes: u32, seed: u64, log_every: u32, smooth: bool) -> Result<(), ArmError> {
    let stats = Arc::new(Mutex::new(EpisodeStats::new()));
    let mut env = RobotArmEnv::open(config)?;
    {
        let stats = Arc::clone(&stats);
        let log_every = log_every.max(1);
        env.set_observer(move |summary: &EpisodeSummary| {
            let Ok(mut stats) = stats.lock() else {
                return;
            };
            stats.record(summary);
            if stats.episodes_completed % log_every == 0 {
                info!(
                    episodes = stats.episodes_completed,
                    successes = stats.successes,
                    collisions = stats.collisions,
                    underground = stats.underground,
                    timeouts = stats.truncations,
                    mean_reward = stats.mean_episode_reward().unwrap_or(0.0),
                    "training progress"
                );
            }
        });
    }
    env.configure(smooth)?;

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    for _ in 0..episodes {
        env.reset()?;
        loop {
            let action = random_action(&mut rng);
            let step = env.step(&action)?;
            if step.terminated || step.truncated {
                break;
            }
        }
    }
    env.close();

    if let Ok(stats) = stats.lock() {
        println!(
            "total: episodes={}, steps={}, successes={}, collisions={}, underground={}, timeouts={}, mean_reward={:.3}",
            stats.episodes_completed,
            stats.total_steps,
            stats.successes,
            stats.collisions,
            stats.underground,
            stats.truncations,
            stats.mean_episode_reward().unwrap_or(0.0)
        );
    }
    Ok(())
}

fn random_action(rng: &mut impl rand::Rng) -> [f32; ACTION_DIM] {
    std::array::from_fn(|_| rng.random_range(-1.0..=1.0))
}

fn run_info(config: &EnvConfig) {
    println!("armgym v{}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("crates:");
    println!("  armgym-core {}", env!("CARGO_PKG_VERSION"));
    println!("  armgym-env  {}", env!("CARGO_PKG_VERSION"));
    println!("  armgym-gym  {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("observation dim: {OBSERVATION_DIM}, action dim: {ACTION_DIM}");
    println!();
    match toml::to_string_pretty(config) {
        Ok(text) => println!("{text}"),
        Err(e) => error!(error = %e, "failed to render configuration"),
    }
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    let result = match cli.command {
        Some(Commands::Probe) => run_probe(config),
        Some(Commands::Run {
            episodes,
            seed,
            log_every,
            smooth,
        }) => run_random(config, episodes, seed, log_every, smooth),
        Some(Commands::Info) | None => {
            run_info(&config);
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "command failed");
            ExitCode::FAILURE
        }
    }
}
