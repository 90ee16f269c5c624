//! avgcolor CLI - benchmark the average colour kernels.
//!
//! Builds a synthetic pixel buffer, averages it with the scalar reference and
//! with the SIMD kernel, and reports both results with their timings.

use std::hint::black_box;
use std::num::{NonZeroUsize, ParseIntError};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use anyhow::Context;
use avgcolor::{ChannelSums, Tier};
use clap::Parser;
use common::LogOutput;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use strum::IntoEnumIterator;

/// Average colour kernel benchmark
///
/// Fills a buffer with packed RGBA8 pixels (red in the low byte) and averages
/// it with the scalar reference and the fastest supported SIMD kernel.
#[derive(Parser, Debug)]
#[command(name = "avgcolor")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "EXAMPLES:
    Ten million pixels of one colour:
        avgcolor --count 10000000 --value BEEFFEEB

    Random pixels, forced AVX2 kernel:
        avgcolor --random --seed 7 --tier avx2

    Split the buffer over four threads:
        avgcolor --count 50000000 --threads 4

EXIT CODES:
    0 - Every kernel agreed with the scalar reference
    1 - A kernel disagreed with the scalar reference
    2 - Error (empty buffer, unsupported tier, etc.)")]
struct Cli {
    /// Number of pixels in the buffer
    #[arg(short = 'n', long, default_value_t = 1_000_000)]
    count: usize,

    /// Fill value as hex, alpha in the high byte
    #[arg(
        long,
        default_value = "BEEFFEEB",
        value_parser = parse_hex_pixel,
        conflicts_with = "random"
    )]
    value: u32,

    /// Fill the buffer with random pixels instead of --value
    #[arg(long)]
    random: bool,

    /// Seed for --random
    #[arg(long, default_value_t = 0, requires = "random")]
    seed: u64,

    /// Force a kernel tier instead of the detected one
    #[arg(long, value_name = "TIER")]
    tier: Option<Tier>,

    /// Timed runs per kernel; the fastest run is reported
    #[arg(
        long,
        default_value_t = 5,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    iters: u32,

    /// Also average in parallel over this many threads, merging partial sums
    #[arg(long, value_name = "N")]
    threads: Option<NonZeroUsize>,

    /// List kernel tiers and whether this CPU supports them
    #[arg(long)]
    list_tiers: bool,

    /// Log level (RUST_LOG takes precedence)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Also write rotating log files to this directory
    #[arg(long, value_name = "DIR")]
    log_dir: Option<PathBuf>,
}

fn parse_hex_pixel(s: &str) -> Result<u32, ParseIntError> {
    let digits = s.trim_start_matches('#');
    let digits = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
        .unwrap_or(digits);
    u32::from_str_radix(digits, 16)
}

struct Timed {
    value: u32,
    best: Duration,
}

fn bench<F>(iters: u32, mut f: F) -> anyhow::Result<Timed>
where
    F: FnMut() -> avgcolor::Result<u32>,
{
    let mut timed = Timed {
        value: 0,
        best: Duration::MAX,
    };
    for _ in 0..iters {
        let start = Instant::now();
        timed.value = black_box(f()?);
        timed.best = timed.best.min(start.elapsed());
    }
    Ok(timed)
}

fn print_timed(label: &str, timed: &Timed) {
    println!(
        "{label}: #{:08X} | {:>12}ns",
        timed.value,
        timed.best.as_nanos()
    );
}

fn make_pixels(cli: &Cli) -> Vec<u32> {
    if cli.random {
        let mut rng = StdRng::seed_from_u64(cli.seed);
        (0..cli.count).map(|_| rng.random()).collect()
    } else {
        vec![cli.value; cli.count]
    }
}

/// Sum disjoint ranges on the current rayon pool and average the merged totals.
fn parallel_average(pixels: &[u32], ranges: usize, tier: Tier) -> avgcolor::Result<u32> {
    let range_len = pixels.len().div_ceil(ranges).max(1);
    pixels
        .par_chunks(range_len)
        .map(|range| {
            let mut sums = ChannelSums::new();
            sums.add_pixels_with(tier, range).map(|()| sums)
        })
        .try_reduce(ChannelSums::new, |a, b| Ok(a + b))?
        .average()
}

fn list_tiers() {
    let active = avgcolor::active_tier();
    for tier in Tier::iter() {
        let marker = if tier == active { "*" } else { " " };
        let status = if tier.is_supported() {
            "supported"
        } else {
            "unsupported"
        };
        println!(
            "{marker} {:<12} {:>2} px/iter  {status}",
            tier.to_string(),
            tier.width()
        );
    }
}

/// Returns whether every kernel agreed with the scalar reference.
fn run(cli: &Cli) -> anyhow::Result<bool> {
    let output = cli
        .log_dir
        .clone()
        .map_or(LogOutput::Stderr, LogOutput::Directory);
    let _logger = common::setup_logging(&cli.log_level, output)
        .context("Failed to initialize logging")?;

    if cli.list_tiers {
        list_tiers();
        return Ok(true);
    }

    let tier = cli.tier.unwrap_or_else(avgcolor::active_tier);
    let pixels = make_pixels(cli);
    log::info!(
        "Averaging {} pixels ({:.1} MiB) with the {} kernel",
        pixels.len(),
        (pixels.len() * size_of::<u32>()) as f64 / (1024.0 * 1024.0),
        tier
    );

    let serial = bench(cli.iters, || avgcolor::scalar::average_color(&pixels))
        .context("Scalar reference failed")?;
    print_timed("Serial", &serial);

    let fast = bench(cli.iters, || avgcolor::average_color_with(tier, &pixels))
        .with_context(|| format!("{tier} kernel failed"))?;
    print_timed("Fast  ", &fast);
    println!(
        "Speedup: {:.6}",
        serial.best.as_nanos() as f64 / fast.best.as_nanos().max(1) as f64
    );

    let mut agreed = fast.value == serial.value;

    if let Some(threads) = cli.threads {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads.get())
            .build()
            .context("Failed to build thread pool")?;
        let ranges = threads.get();
        let run_parallel = || parallel_average(&pixels, ranges, tier);
        let parallel = pool
            .install(|| bench(cli.iters, run_parallel))
            .context("Parallel average failed")?;
        print_timed("Threads", &parallel);
        agreed &= parallel.value == serial.value;
    }

    if !agreed {
        log::error!("Kernel results disagree with the scalar reference");
    }
    Ok(agreed)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::from(2)
        }
    }
}
