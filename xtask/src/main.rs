use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::Command;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "resmgr workspace automation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Benchmark counter carriers and lock primitives
    Bench {
        /// Run quickly (lower sample size/time)
        #[arg(long, default_value_t = false)]
        quick: bool,

        /// Generate report only (skip running benchmarks)
        #[arg(long, default_value_t = false)]
        report_only: bool,
    },
}

const BENCH: &str = "backings_benchmark";

/// Backing each workload is compared against.
const BASELINES: &[(&str, &str)] = &[
    ("clone_drop", "atomic_usize"),
    ("clone_drop_contended", "atomic_usize"),
    ("scoped_lock", "spin"),
    ("scoped_lock_contended", "spin"),
];

#[derive(Deserialize)]
struct Estimates {
    mean: Estimate,
}

#[derive(Deserialize)]
struct Estimate {
    point_estimate: f64,
}

#[derive(Deserialize)]
struct BenchmarkInfo {
    throughput: Option<Throughput>,
}

#[derive(Deserialize)]
enum Throughput {
    Elements(u64),
    Bytes(u64),
    BytesDecimal(u64),
}

/// workload -> backing -> ops/s
type Results = BTreeMap<String, BTreeMap<String, f64>>;

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Bench { quick, report_only } => {
            if !report_only {
                run_benchmarks(quick)?;
            }
            generate_report()?;
        }
    }

    Ok(())
}

fn run_benchmarks(quick: bool) -> Result<()> {
    // Build first to avoid measuring build time
    println!("Compiling benchmarks...");
    let status = Command::new("cargo")
        .args(["build", "--bench", BENCH, "--release"])
        .status()
        .context("failed to spawn cargo")?;
    if !status.success() {
        anyhow::bail!("Failed to compile benchmarks");
    }

    println!("\n>>> Benchmarking backings");
    let start = Instant::now();

    let mut cmd = Command::new("cargo");
    cmd.env("CARGO_INCREMENTAL", "0");
    cmd.args(["bench", "--bench", BENCH]);

    // Args for the test runner (Criterion) go after --
    cmd.arg("--");
    if quick {
        cmd.args(["--measurement-time", "0.1", "--noplot", "--sample-size", "10"]);
    }

    let status = cmd.status().context("failed to run cargo bench")?;
    if !status.success() {
        anyhow::bail!("Benchmark run failed");
    }
    println!("Finished in {:.2?}", start.elapsed());

    Ok(())
}

fn generate_report() -> Result<()> {
    println!("\n>>> Generating Report...");
    let criterion_dir = Path::new("target/criterion");
    if !criterion_dir.exists() {
        eprintln!("No criterion output found at {}", criterion_dir.display());
        return Ok(());
    }

    let mut results = Results::new();
    for (workload, _) in BASELINES {
        collect_workload(&criterion_dir.join(workload), workload, &mut results)
            .with_context(|| format!("reading results for {workload}"))?;
    }

    let report_path = Path::new("benchmark_results/report.md");
    if let Some(parent) = report_path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = fs::File::create(report_path)
        .with_context(|| format!("creating {}", report_path.display()))?;

    writeln!(file, "# Backing Benchmark Report")?;

    for (workload, baseline) in BASELINES {
        let Some(backings) = results.get(*workload) else {
            continue;
        };
        let base_ops = backings.get(*baseline).copied().unwrap_or(0.0);

        writeln!(file, "\n## {workload}\n")?;
        writeln!(file, "| Backing | Ops/s | vs {baseline} |")?;
        writeln!(file, "|---|---|---|")?;
        for (backing, ops) in backings {
            let rel = if base_ops > 0.0 { ops / base_ops } else { 0.0 };
            writeln!(file, "| {backing} | {} | **{rel:.2}x** |", format_ops(*ops))?;
        }
    }

    println!("Report written to {}", report_path.display());
    Ok(())
}

fn format_ops(ops: f64) -> String {
    if ops > 1_000_000.0 {
        format!("{:.2}M", ops / 1_000_000.0)
    } else if ops > 1_000.0 {
        format!("{:.2}K", ops / 1_000.0)
    } else {
        format!("{ops:.0}")
    }
}

/// Reads `<workload>/<backing>/new/{estimates,benchmark}.json` for every backing.
fn collect_workload(dir: &Path, workload: &str, results: &mut Results) -> Result<()> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Ok(());
    };

    for entry in entries.flatten() {
        let backing_dir = entry.path();
        let Some(backing) = backing_dir.file_name().and_then(|s| s.to_str()) else {
            continue;
        };
        if backing == "report" {
            continue;
        }
        let estimates_path = backing_dir.join("new").join("estimates.json");
        let Ok(content) = fs::read_to_string(&estimates_path) else {
            continue;
        };
        let estimates: Estimates = serde_json::from_str(&content)
            .with_context(|| format!("parsing {}", estimates_path.display()))?;

        let elements = fs::read_to_string(backing_dir.join("new").join("benchmark.json"))
            .ok()
            .and_then(|c| serde_json::from_str::<BenchmarkInfo>(&c).ok())
            .and_then(|info| info.throughput)
            .map_or(1.0, |t| match t {
                Throughput::Elements(n) | Throughput::Bytes(n) | Throughput::BytesDecimal(n) => n as f64,
            });

        let time_ns = estimates.mean.point_estimate;
        if time_ns > 0.0 {
            results
                .entry(workload.to_string())
                .or_default()
                .insert(backing.to_string(), elements * 1e9 / time_ns);
        }
    }

    Ok(())
}
