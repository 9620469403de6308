//! # CLI Execution Functions
//!
//! Extracted from `main.rs` to keep the entry point slim. Each `run_*`
//! function executes one subcommand and writes its result to stdout, as text
//! or as a single JSON document when `--json` is set.

use anyhow::{bail, Context, Result};
use lcgforge::config::{parse_toml_file, ForgeConfig};
use lcgforge::counter::{IdGenerator, MemoryCounterStore};
use lcgforge::search::search_full_period_params;
use lcgforge::{arith, fast_forward, verify, LcgError, RecurrenceParams};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use serde_json::json;
use std::path::Path;
use tracing::{info, warn};

/// Largest modulus `cross-check` walks by default. The walk keeps every
/// visited residue in a hash set.
pub const BRUTE_FORCE_LIMIT: u64 = 20_000_000;

/// Sequence name used by the `ids` subcommand.
const CLI_SEQUENCE: &str = "cli";

pub struct Output {
    pub json: bool,
}

impl Output {
    /// Print `value` as pretty JSON, or `text()` otherwise.
    fn emit<T: Serialize>(&self, value: &T, text: impl FnOnce() -> String) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            println!("{}", text());
        }
        Ok(())
    }
}

// ── Setup ───────────────────────────────────────────────────────

pub fn load_config(path: Option<&Path>) -> Result<ForgeConfig> {
    match path {
        Some(path) => {
            let config = parse_toml_file(path)
                .with_context(|| format!("loading config {}", path.display()))?;
            info!(path = %path.display(), "loaded configuration");
            Ok(config)
        }
        None => Ok(ForgeConfig::default()),
    }
}

/// Configure the global rayon pool. `None` or 0 uses all logical cores.
pub fn configure_rayon(threads: Option<usize>) {
    let num_threads = threads.unwrap_or(0);
    if let Err(e) = rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build_global()
    {
        warn!(error = %e, "Could not configure rayon thread pool");
    }
}

fn rng_from(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

fn validated(params: RecurrenceParams) -> Result<RecurrenceParams> {
    Ok(RecurrenceParams::new(params.a, params.c, params.m)?)
}

// ── Sequence ────────────────────────────────────────────────────

pub fn run_nth(
    out: &Output,
    config: &ForgeConfig,
    params: RecurrenceParams,
    seed: u64,
    n: u64,
    encode: bool,
) -> Result<()> {
    let params = validated(params)?;
    let value = fast_forward::nth_value(params.a, params.c, params.m, seed, n)?;
    let id = if encode {
        let encoder = config.encoder.build()?;
        Some(encoder.encode(value).with_context(|| {
            format!("value {} has no id; is m within the encoder's capacity?", value)
        })?)
    } else {
        None
    };
    out.emit(
        &json!({"params": params, "seed": seed, "n": n, "value": value, "id": id}),
        || match &id {
            Some(id) => format!("{} {}", value, id),
            None => value.to_string(),
        },
    )
}

pub fn run_ids(
    out: &Output,
    config: &ForgeConfig,
    params: RecurrenceParams,
    seed: Option<u64>,
    count: usize,
    at: Option<u64>,
) -> Result<()> {
    let params = validated(params)?;
    let generator = IdGenerator::new(MemoryCounterStore::new(), config.encoder.build()?);
    let state = match seed {
        Some(seed) => generator.init(CLI_SEQUENCE, params, seed)?,
        None => generator.init_random(CLI_SEQUENCE, params, &mut rng_from(None))?,
    };

    let ids = match at {
        Some(n) => vec![generator.nth_id(CLI_SEQUENCE, n)?],
        None => generator.take_ids(CLI_SEQUENCE, count)?,
    };
    out.emit(&json!({"params": params, "seed": state.seed, "ids": ids}), || {
        ids.iter()
            .map(|issued| format!("{:>10} {}", issued.index, issued.id))
            .collect::<Vec<_>>()
            .join("\n")
    })
}

// ── Period analysis ─────────────────────────────────────────────

pub fn run_check(out: &Output, params: RecurrenceParams) -> Result<()> {
    let params = validated(params)?;
    let verdict = params.verdict();
    let cycle_length = verdict.cycle_length(params.m);
    out.emit(
        &json!({"params": params, "verdict": verdict, "cycle_length": cycle_length}),
        || match cycle_length {
            Some(length) => format!("{}\n{} (cycle length {})", params, verdict, length),
            None => format!("{}\n{}", params, verdict),
        },
    )
}

pub fn run_search(
    out: &Output,
    config: &ForgeConfig,
    target: u64,
    seed: Option<u64>,
    rounds: u32,
) -> Result<()> {
    let mut rng = rng_from(seed);
    for round in 1..=rounds.max(1) {
        match search_full_period_params(target, &config.search, &mut rng) {
            Ok(params) => {
                let verdict = params.verdict();
                return out.emit(&json!({"params": params, "verdict": verdict}), || {
                    format!("{}\n{}", params, verdict)
                });
            }
            Err(LcgError::RangeExhausted(reason)) => {
                warn!(round, %reason, "search round came up empty");
            }
            Err(e) => return Err(e.into()),
        }
    }
    bail!(
        "no full-period parameters found below {} after {} rounds",
        target,
        rounds.max(1)
    )
}

pub fn run_cross_check(out: &Output, params: RecurrenceParams, max_modulus: u64) -> Result<()> {
    let params = validated(params)?;
    if params.m > max_modulus {
        bail!(
            "modulus {} exceeds the brute-force limit {} (raise --max-modulus)",
            params.m,
            max_modulus
        );
    }
    let check = verify::cross_check(params.m, params.a, params.c)?;
    out.emit(&check, || {
        let expected = check
            .expected
            .map_or_else(|| "short".to_string(), |n| n.to_string());
        format!(
            "{}\n{}\nobserved {} distinct values from 0, expected {}: {}",
            params,
            check.verdict,
            check.observed,
            expected,
            if check.agrees { "agree" } else { "DISAGREE" }
        )
    })?;
    if !check.agrees {
        bail!("analytic verdict disagrees with brute force for {}", params);
    }
    Ok(())
}

pub fn run_sweep(
    out: &Output,
    from: u64,
    to: u64,
    multipliers: &[u64],
    increments: &[u64],
) -> Result<()> {
    if from == 0 || from > to {
        bail!("sweep needs 1 <= --from <= --to (got {}..={})", from, to);
    }
    if to > BRUTE_FORCE_LIMIT {
        bail!("--to {} exceeds the brute-force limit {}", to, BRUTE_FORCE_LIMIT);
    }
    let moduli: Vec<u64> = (from..=to).collect();
    let summary = if multipliers.is_empty() {
        verify::sweep_triples(&verify::dense_triples(&moduli, increments))?
    } else {
        verify::sweep(&moduli, multipliers, increments)?
    };

    out.emit(&summary, || {
        let mut lines = vec![
            format!("checked:          {}", summary.checked),
            format!("full,  agree:     {}", summary.predicted_full_agree),
            format!("short, agree:     {}", summary.predicted_short_agree),
            format!("full,  disagree:  {}", summary.predicted_full_disagree),
            format!("short, disagree:  {}", summary.predicted_short_disagree),
        ];
        for d in &summary.disagreements {
            lines.push(format!(
                "  m={} a={} c={}: {} (observed {})",
                d.params.m, d.params.a, d.params.c, d.verdict, d.observed
            ));
        }
        lines.join("\n")
    })?;
    if !summary.all_agree() {
        bail!("{} triples disagree", summary.disagreements.len());
    }
    Ok(())
}

// ── Encoding ────────────────────────────────────────────────────

pub fn run_encode(out: &Output, config: &ForgeConfig, value: u64) -> Result<()> {
    let encoder = config.encoder.build()?;
    let id = encoder.encode(value)?;
    out.emit(&json!({"value": value, "id": id}), || id.clone())
}

pub fn run_decode(out: &Output, config: &ForgeConfig, id: &str) -> Result<()> {
    let encoder = config.encoder.build()?;
    let value = encoder.decode(id)?;
    out.emit(&json!({"value": value, "id": id}), || value.to_string())
}

// ── Arithmetic ──────────────────────────────────────────────────

pub fn run_pow_mod(out: &Output, base: u64, exp: i64, modulus: u64) -> Result<()> {
    let exp = u64::try_from(exp)
        .map_err(|_| LcgError::Domain(format!("pow_mod: negative exponent {}", exp)))?;
    let result = arith::pow_mod(base, exp, modulus)?;
    out.emit(
        &json!({"base": base, "exp": exp, "modulus": modulus, "result": result}),
        || result.to_string(),
    )
}

pub fn run_prime_below(out: &Output, n: u64, k: u32) -> Result<()> {
    let prime = arith::find_nth_prime_below(n, k)?;
    out.emit(&json!({"n": n, "k": k, "prime": prime}), || prime.to_string())
}
