use std::path::{Path, PathBuf};

use anyhow::Context;
use arena_tactician_server::config::{normalize_hit_threshold, parse_lane_policy, EngineConfig};
use arena_tactician_server::constants::MAX_SIM_OPPONENTS;
use arena_tactician_server::geometry::LanePolicy;
use arena_tactician_server::sim::{Arena, SimOptions, SimReport};
use chrono::{SecondsFormat, Utc};
use clap::Parser;
use rand::Rng;
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[arg(long, default_value_t = 200)]
    ticks: u64,
    #[arg(long, default_value_t = 3)]
    opponents: usize,
    #[arg(long, default_value_t = 1)]
    runs: u32,
    #[arg(long)]
    seed: Option<u32>,
    #[arg(long)]
    lane_policy: Option<String>,
    #[arg(long)]
    hit_threshold: Option<i64>,
    #[arg(long)]
    summary_out: Option<PathBuf>,
}

#[derive(Clone, Debug, Serialize)]
struct RunSummary {
    #[serde(rename = "generatedAtIso")]
    generated_at_iso: String,
    #[serde(rename = "baseSeed")]
    base_seed: u32,
    runs: usize,
    ticks: u64,
    opponents: usize,
    #[serde(rename = "lanePolicy")]
    lane_policy: LanePolicy,
    #[serde(rename = "escapeHitThreshold")]
    escape_hit_threshold: u32,
    #[serde(rename = "tacticianWins")]
    tactician_wins: usize,
    #[serde(rename = "averageTacticianScore")]
    average_tactician_score: f64,
    #[serde(rename = "averageTacticianRank")]
    average_tactician_rank: f64,
    #[serde(rename = "totalFaults")]
    total_faults: u32,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let base_seed = cli.seed.unwrap_or_else(|| rand::rng().random());
    let runs = cli.runs.max(1);
    let mut reports = Vec::with_capacity(runs as usize);

    for run in 0..runs {
        let options = resolve_options(&cli, base_seed.wrapping_add(run));
        info!(
            run,
            seed = options.seed,
            opponents = options.opponents,
            ticks = options.ticks,
            "simulation started"
        );
        let report = Arena::new(&options).run(options.ticks);
        info!(
            run,
            seed = report.seed,
            tactician_rank = report.tactician_rank,
            "simulation finished"
        );
        println!(
            "{}",
            serde_json::to_string(&report).context("simulation report should serialize")?
        );
        reports.push(report);
    }

    let template = resolve_options(&cli, base_seed);
    let summary = build_run_summary(&template, base_seed, &reports);
    if summary.total_faults > 0 {
        warn!(faults = summary.total_faults, "tactician faulted during simulation");
    }

    if let Some(path) = cli.summary_out.as_ref() {
        write_summary(path, &summary)
            .with_context(|| format!("failed to write summary to {}", path.display()))?;
        info!(path = %path.display(), "summary written");
    }

    info!(
        runs = summary.runs,
        wins = summary.tactician_wins,
        average_score = summary.average_tactician_score,
        "all simulations finished"
    );
    Ok(())
}

fn resolve_options(cli: &Cli, seed: u32) -> SimOptions {
    SimOptions {
        ticks: cli.ticks,
        opponents: cli.opponents.clamp(1, MAX_SIM_OPPONENTS),
        seed,
        engine: EngineConfig {
            lane_policy: parse_lane_policy(cli.lane_policy.as_deref()),
            escape_hit_threshold: normalize_hit_threshold(cli.hit_threshold),
            seed: seed.wrapping_add(1),
        },
    }
}

fn build_run_summary(options: &SimOptions, base_seed: u32, reports: &[SimReport]) -> RunSummary {
    let runs = reports.len();
    let divisor = runs.max(1) as f64;
    let tactician_scores: Vec<i64> = reports
        .iter()
        .filter_map(|report| report.agents.first().map(|agent| agent.score))
        .collect();

    RunSummary {
        generated_at_iso: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        base_seed,
        runs,
        ticks: options.ticks,
        opponents: options.opponents,
        lane_policy: options.engine.lane_policy,
        escape_hit_threshold: options.engine.escape_hit_threshold,
        tactician_wins: reports
            .iter()
            .filter(|report| report.tactician_rank == 1)
            .count(),
        average_tactician_score: tactician_scores.iter().sum::<i64>() as f64 / divisor,
        average_tactician_rank: reports
            .iter()
            .map(|report| report.tactician_rank as f64)
            .sum::<f64>()
            / divisor,
        total_faults: reports
            .iter()
            .flat_map(|report| report.agents.iter())
            .map(|agent| agent.faults)
            .sum(),
    }
}

fn write_summary(path: &Path, summary: &RunSummary) -> anyhow::Result<()> {
    let summary_text = serde_json::to_string_pretty(summary)?;
    std::fs::write(path, summary_text)?;
    Ok(())
}
