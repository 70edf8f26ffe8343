// Boxscore entry point.
//
// Startup sequence:
// 1. Initialize tracing (stderr)
// 2. Parse arguments, load config (seeding from defaults/)
// 3. Load the league snapshot and optional player CSV
// 4. Value players and build team snapshots
// 5. Fan matchup projections and per-team start plans out to blocking workers
// 6. Assemble the report and write it as JSON

mod config;
mod data;

use anyhow::Context;
use boxscore_engine::engine::{assemble, plan_streaming, prepare, project_pairing, RunContext};
use boxscore_engine::EngineReport;
use chrono::{NaiveDate, Utc};
use clap::Parser;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::spawn_blocking;
use tracing::{info, warn};

/// Value a league, project its matchups and plan pitcher starts.
#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory holding `config/`, `defaults/` and the data files
    base_dir: Option<PathBuf>,
    /// First day not yet played (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    as_of: Option<NaiveDate>,
    /// Report path, overriding `output.path`
    #[arg(long)]
    out: Option<PathBuf>,
}

fn parse_date(s: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize tracing
    init_tracing()?;
    info!("boxscore starting up");

    // 2. Arguments and config
    let args = Args::parse();
    let base_dir = match args.base_dir.clone() {
        Some(dir) => dir,
        None => std::env::current_dir().context("failed to read current directory")?,
    };
    let config = config::load_config(&base_dir).context("failed to load configuration")?;
    info!(
        "Config loaded: league={}, {} teams, {} categories, period {}",
        config.league_name,
        config.engine.league.num_teams,
        config.engine.categories.len(),
        config.period.id
    );

    // 3. League data
    let snapshot = data::load_all(&config.data_paths, &base_dir).context("failed to load league data")?;
    info!(
        "Loaded {} teams, {} players, {} scheduled games",
        snapshot.teams.len(),
        snapshot.players.len(),
        snapshot.schedule.len()
    );

    let ctx = Arc::new(RunContext {
        period: config.period.clone(),
        generated_at: Utc::now(),
        as_of: args.as_of,
    });
    let engine_config = Arc::new(config.engine.clone());
    let snapshot = Arc::new(snapshot);

    // 4. Valuation and team snapshots
    let prepared = {
        let snapshot = Arc::clone(&snapshot);
        let engine_config = Arc::clone(&engine_config);
        spawn_blocking(move || prepare(&snapshot, &engine_config))
            .await
            .context("valuation task failed")?
            .context("failed to value players")?
    };
    let low = prepared.valuation.baselines.low_confidence().count();
    if low > 0 {
        warn!("{} replacement baselines are low confidence", low);
    }
    let prepared = Arc::new(prepared);

    // 5. Independent projections and start plans
    let matchup_tasks: Vec<_> = snapshot
        .matchups
        .iter()
        .cloned()
        .map(|pairing| {
            let (prepared, snapshot, ctx, cfg) = (
                Arc::clone(&prepared),
                Arc::clone(&snapshot),
                Arc::clone(&ctx),
                Arc::clone(&engine_config),
            );
            spawn_blocking(move || project_pairing(&pairing, &prepared, &snapshot, &ctx, &cfg))
        })
        .collect();
    let streaming_tasks: Vec<_> = prepared
        .teams
        .iter()
        .map(|team| {
            let team_id = team.team_id.clone();
            let (prepared, snapshot, ctx, cfg) = (
                Arc::clone(&prepared),
                Arc::clone(&snapshot),
                Arc::clone(&ctx),
                Arc::clone(&engine_config),
            );
            spawn_blocking(move || {
                plan_streaming(&team_id, &prepared, &snapshot, &ctx, &cfg).map(|plan| (team_id, plan))
            })
        })
        .collect();

    let mut matchups = Vec::with_capacity(matchup_tasks.len());
    for task in matchup_tasks {
        matchups.push(
            task.await
                .context("matchup task failed")?
                .context("failed to project matchup")?,
        );
    }
    let mut streaming = BTreeMap::new();
    for task in streaming_tasks {
        let (team_id, plan) = task
            .await
            .context("streaming task failed")?
            .context("failed to plan starts")?;
        info!(
            "Team {}: {} starts selected, {} transactions, net value {:.2}",
            team_id,
            plan.selected.len(),
            plan.total_transaction_cost,
            plan.net_value
        );
        streaming.insert(team_id, plan);
    }

    // 6. Report
    let prepared = Arc::try_unwrap(prepared).unwrap_or_else(|shared| (*shared).clone());
    let report = assemble(prepared, matchups, streaming, &snapshot, &ctx, &engine_config);
    let out = args
        .out
        .unwrap_or_else(|| base_dir.join(&config.output_path));
    write_report(&out, &report)?;
    info!("Report written to {}", out.display());

    Ok(())
}

fn write_report(path: &Path, report: &EngineReport) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(report).context("failed to serialize report")?;
    std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

/// Initialize tracing to stderr; stdout stays free for piping.
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("boxscore=info,boxscore_engine=info,warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
