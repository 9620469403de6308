//! # Main — CLI Entry Point
//!
//! Routes subcommands to the analysis library and prints results as text or,
//! with `--json`, as one JSON document on stdout. Logs go to stderr.
//!
//! ## Subcommands
//!
//! - `nth`: value (and optionally id) after n steps, via matrix fast-forward.
//! - `check`: analytic full-period verdict for a triple.
//! - `search`: randomized hunt for full-period parameters below a target.
//! - `cross-check`: analytic verdict against a brute-force walk.
//! - `sweep`: cross-check a whole parameter grid in parallel.
//! - `encode` / `decode`: fixed-width id rendering.
//! - `ids`: issue ids from an in-memory named sequence.
//! - `pow-mod`, `prime-below`: the arithmetic primitives.
//!
//! ## Global Options
//!
//! - `--config` / `LCGFORGE_CONFIG`: TOML file overriding search and encoder
//!   defaults.
//! - `--json`: machine-readable output.
//! - `--threads`: Rayon thread pool size (defaults to all cores).
//!
//! `LOG_FORMAT=json` switches logs to JSON lines; `RUST_LOG` sets the filter.

mod cli;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(
    name = "lcgforge",
    version,
    about = "Analyze, fast-forward and search linear congruential generators"
)]
struct Cli {
    /// TOML configuration file (or set LCGFORGE_CONFIG)
    #[arg(long, env = "LCGFORGE_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Number of rayon worker threads (defaults to all logical cores)
    #[arg(long, global = true)]
    threads: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

/// Recurrence parameters, defaulting to the production generator.
#[derive(Args, Clone, Copy)]
struct ParamArgs {
    /// Multiplier a
    #[arg(long, default_value_t = 69069)]
    a: u64,
    /// Increment c
    #[arg(long, default_value_t = 1)]
    c: u64,
    /// Modulus m
    #[arg(long, default_value_t = 380_204_023)]
    m: u64,
}

#[derive(Subcommand)]
enum Commands {
    /// Value after n steps from a seed, in O(log n)
    Nth {
        #[command(flatten)]
        params: ParamArgs,
        /// Seed x0
        #[arg(long, default_value_t = 0)]
        seed: u64,
        /// Number of steps
        #[arg(long)]
        n: u64,
        /// Also render the value as an id
        #[arg(long)]
        encode: bool,
    },
    /// Analytic full-period test (Hull-Dobell / primitive root)
    Check {
        #[command(flatten)]
        params: ParamArgs,
    },
    /// Search for full-period parameters with modulus below a target
    Search {
        /// Target modulus; the result's modulus is a prime just below it
        #[arg(long)]
        target: u64,
        /// Seed for a reproducible search (random if omitted)
        #[arg(long)]
        seed: Option<u64>,
        /// Independent search rounds before giving up
        #[arg(long, default_value_t = 5)]
        rounds: u32,
    },
    /// Compare the analytic verdict with a brute-force walk from 0
    CrossCheck {
        #[command(flatten)]
        params: ParamArgs,
        /// Refuse moduli above this (the walk holds every residue in memory)
        #[arg(long, default_value_t = cli::BRUTE_FORCE_LIMIT)]
        max_modulus: u64,
    },
    /// Cross-check every modulus in a range against a multiplier grid
    Sweep {
        /// Smallest modulus
        #[arg(long, default_value_t = 2)]
        from: u64,
        /// Largest modulus (inclusive)
        #[arg(long)]
        to: u64,
        /// Multipliers to test (every a in 0..m when omitted)
        #[arg(long = "multiplier", value_delimiter = ',')]
        multipliers: Vec<u64>,
        /// Increments to test
        #[arg(long = "increment", value_delimiter = ',', default_value = "1")]
        increments: Vec<u64>,
    },
    /// Render a value as a fixed-width id
    Encode {
        value: u64,
    },
    /// Recover the value behind an id
    Decode {
        id: String,
    },
    /// Issue ids from an in-memory named sequence
    Ids {
        #[command(flatten)]
        params: ParamArgs,
        /// Seed x0 (random in [0, m) if omitted)
        #[arg(long)]
        seed: Option<u64>,
        /// Number of ids to issue
        #[arg(long, default_value_t = 10)]
        count: usize,
        /// Print only the id at this index instead of issuing
        #[arg(long)]
        at: Option<u64>,
    },
    /// Modular exponentiation base^exp mod modulus
    PowMod {
        #[arg(long)]
        base: u64,
        /// Exponent; negative values are rejected
        #[arg(long, allow_negative_numbers = true)]
        exp: i64,
        #[arg(long)]
        modulus: u64,
    },
    /// The k-th prime strictly below n
    PrimeBelow {
        #[arg(long)]
        n: u64,
        #[arg(long, default_value_t = 1)]
        k: u32,
    },
}

fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    // Structured logging: LOG_FORMAT=json for log shippers, human-readable otherwise
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_default();
    if log_format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .init();
    }

    let cli = Cli::parse();
    cli::configure_rayon(cli.threads);
    let config = cli::load_config(cli.config.as_deref())?;
    let out = cli::Output { json: cli.json };

    match &cli.command {
        Commands::Nth {
            params,
            seed,
            n,
            encode,
        } => cli::run_nth(&out, &config, params.to_params(), *seed, *n, *encode),
        Commands::Check { params } => cli::run_check(&out, params.to_params()),
        Commands::Search {
            target,
            seed,
            rounds,
        } => cli::run_search(&out, &config, *target, *seed, *rounds),
        Commands::CrossCheck {
            params,
            max_modulus,
        } => cli::run_cross_check(&out, params.to_params(), *max_modulus),
        Commands::Sweep {
            from,
            to,
            multipliers,
            increments,
        } => cli::run_sweep(&out, *from, *to, multipliers, increments),
        Commands::Encode { value } => cli::run_encode(&out, &config, *value),
        Commands::Decode { id } => cli::run_decode(&out, &config, id),
        Commands::Ids {
            params,
            seed,
            count,
            at,
        } => cli::run_ids(&out, &config, params.to_params(), *seed, *count, *at),
        Commands::PowMod { base, exp, modulus } => cli::run_pow_mod(&out, *base, *exp, *modulus),
        Commands::PrimeBelow { n, k } => cli::run_prime_below(&out, *n, *k),
    }
}

impl ParamArgs {
    fn to_params(self) -> lcgforge::RecurrenceParams {
        lcgforge::RecurrenceParams {
            a: self.a,
            c: self.c,
            m: self.m,
        }
    }
}
