//! memprobe-bench-harness
//!
//! Run every preset of a profile in both drive modes (eager vs cooperative)
//! and append CSV rows into `benchmarks/reports/probe-<unix>.csv`, so the
//! two memory curves can be compared across repeats.
//!
//! Usage examples:
//!   cargo run -p memprobe-bench-harness -- --profile benchmarks/profiles/small.toml
//!   cargo run -p memprobe-bench-harness -- --profile benchmarks/profiles/medium.toml

use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use serde::Deserialize;

use memprobe_core::{ProbeSpec, RunMode};
use memprobe_harness::{ProbeHarness, Yielder};
use memprobe_probes::{
    BasicFactory, CoreFactory, ModelFactory, ModelSource, ProbeKind, Reclaimer, TensorFactory,
};
use memprobe_report::CollectSink;

#[derive(Debug, Deserialize)]
struct Profile {
    /// Factory invocations per run
    iterations: u64,
    /// Iterations between memory samples
    sample_interval: u64,
    /// Repetitions of the whole preset sweep
    repeats: u32,
    /// Presets to sweep
    presets: Vec<ProbeKind>,
}

fn parse_flag(name: &str, default: &str) -> String {
    let mut it = std::env::args().skip(1);
    while let Some(k) = it.next() {
        if k == format!("--{name}") {
            return it.next().unwrap_or_else(|| default.to_string());
        }
    }
    default.to_string()
}

fn dur_ms(d: Duration) -> u128 {
    d.as_millis()
}

fn main() -> Result<()> {
    let profile_path = PathBuf::from(parse_flag("profile", "benchmarks/profiles/small.toml"));

    let profile_src = fs::read_to_string(&profile_path)
        .with_context(|| format!("read profile {:?}", profile_path))?;
    let profile: Profile = toml::from_str(&profile_src).context("parse profile toml")?;
    println!(
        "Profile: iterations={}, interval={}, repeats={}, presets={:?}",
        profile.iterations, profile.sample_interval, profile.repeats, profile.presets
    );

    fs::create_dir_all("benchmarks/reports").ok();

    let ts = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs();
    let csv_path = PathBuf::from(format!("benchmarks/reports/probe-{ts}.csv"));
    let mut csv = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&csv_path)?;
    writeln!(
        csv,
        "timestamp,preset,mode,iterations,interval,repeat,samples,heap_first,heap_last,heap_delta,rss_last,ms"
    )?;

    for rep in 0..profile.repeats {
        for &kind in &profile.presets {
            for mode in [RunMode::Eager, RunMode::Cooperative] {
                let spec = ProbeSpec::new(
                    format!("{kind}-{mode}-r{rep}"),
                    profile.iterations,
                    profile.sample_interval,
                )
                .with_mode(mode);

                let mut sink = CollectSink::new();
                let t0 = Instant::now();
                run_preset(kind, &spec, &mut sink)
                    .with_context(|| format!("{mode} run of preset {kind} (repeat {rep})"))?;
                let elapsed = t0.elapsed();

                // Independent runs: settle deferred memory between rows.
                let _ = Reclaimer::global().drain_now();

                let samples = sink.samples();
                let first = samples.first().map_or(0, |s| s.heap_used_bytes);
                let last_sample = samples.last();
                let last = last_sample.map_or(0, |s| s.heap_used_bytes);
                let rss_last = last_sample.map_or(0, |s| s.rss_bytes);
                let delta = i128::from(last) - i128::from(first);

                writeln!(
                    csv,
                    "{ts},{kind},{mode},{},{},{rep},{},{first},{last},{delta},{rss_last},{}",
                    profile.iterations,
                    profile.sample_interval,
                    samples.len(),
                    dur_ms(elapsed)
                )?;
            }
        }
    }

    println!("Wrote report → {}", csv_path.display());
    Ok(())
}

fn run_preset(kind: ProbeKind, spec: &ProbeSpec, sink: &mut CollectSink) -> Result<()> {
    match spec.mode {
        RunMode::Eager => run_with(ProbeHarness::new(), kind, spec, sink),
        RunMode::Cooperative => run_with(ProbeHarness::cooperative(), kind, spec, sink),
    }
}

fn run_with<Y: Yielder>(
    mut harness: ProbeHarness<Y>,
    kind: ProbeKind,
    spec: &ProbeSpec,
    sink: &mut CollectSink,
) -> Result<()> {
    match kind {
        ProbeKind::Basic => harness.run(spec, &mut BasicFactory, sink)?,
        ProbeKind::Core => harness.run(spec, &mut CoreFactory, sink)?,
        ProbeKind::Tensor => harness.run(spec, &mut TensorFactory::f32_default(), sink)?,
        ProbeKind::Model => {
            let source = ModelSource::generate(16, 42);
            let mut factory = ModelFactory::new(source);
            harness.run(spec, &mut factory, sink)?;
        }
    }
    Ok(())
}
