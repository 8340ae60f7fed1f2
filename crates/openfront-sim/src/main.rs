//! OpenFront headless simulator.
//!
//! Loads an ASCII map, an optional game config and an optional intent
//! script, runs the engine for a fixed number of ticks and logs the
//! consistency hashes. Update batches can be written out as JSON lines or
//! length-prefixed MessagePack frames.

mod runner;

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use openfront_core::{GameConfig, TileStore, WorldEngine};
use openfront_protocol::wire::{deserialize_script_json, serialize_updates, serialize_updates_json};
use openfront_protocol::{GameUpdate, GameUpdates, Tick};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use crate::runner::ScriptedRun;

#[derive(Parser)]
#[command(name = "openfront-sim")]
#[command(about = "Run a scripted territorial simulation headlessly", version)]
struct Cli {
    /// ASCII terrain map (`.` ocean, `~` lake, `#` plains, `^` highland, `M` mountain)
    map: PathBuf,

    /// Game config, YAML or JSON by extension
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// JSON array of tick-stamped intents
    #[arg(short, long)]
    script: Option<PathBuf>,

    /// Number of ticks to run
    #[arg(short, long, default_value_t = 300)]
    ticks: Tick,

    /// Write every update batch to this file
    #[arg(short, long)]
    out: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// One JSON batch per line
    Json,
    /// u32 little-endian length followed by the MessagePack batch
    Msgpack,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    fmt().with_env_filter(filter).with_target(false).init();

    let config = match &cli.config {
        Some(path) => GameConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => GameConfig::default(),
    };
    config.validate().context("invalid game config")?;

    let map_text = fs::read_to_string(&cli.map)
        .with_context(|| format!("reading map {}", cli.map.display()))?;
    let map = TileStore::from_ascii(&map_text)
        .with_context(|| format!("parsing map {}", cli.map.display()))?;
    info!(
        "map {}x{} with {} land tiles",
        map.width(),
        map.height(),
        map.num_land_tiles()
    );

    let script = match &cli.script {
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("reading script {}", path.display()))?;
            deserialize_script_json(&json)
                .with_context(|| format!("parsing script {}", path.display()))?
        }
        None => Vec::new(),
    };
    info!("{} scripted intents", script.len());

    let mut out = match &cli.out {
        Some(path) => Some(BufWriter::new(
            File::create(path).with_context(|| format!("creating {}", path.display()))?,
        )),
        None => None,
    };

    let mut run = ScriptedRun::new(WorldEngine::new(map, config), script);
    let mut last_hash = None;
    for _ in 0..cli.ticks {
        let batch = run.step();
        for update in batch.iter() {
            if let GameUpdate::Hash { tick, hash } = update {
                info!("tick {} hash {:#018x}", tick, hash);
                last_hash = Some(*hash);
            }
        }
        if let Some(writer) = out.as_mut() {
            write_batch(writer, &batch, cli.format)?;
        }
    }
    if let Some(mut writer) = out {
        writer.flush()?;
    }
    if run.remaining() > 0 {
        warn!("{} scripted intents were never reached", run.remaining());
    }

    let engine = run.engine();
    for player in engine.players() {
        info!(
            "{} ({}): {} tiles, {} troops, {} gold, {} allies",
            player.name(),
            player.small_id(),
            player.num_tiles_owned(),
            player.troops(),
            player.gold(),
            player.alliances().len()
        );
    }
    info!(
        "finished at tick {} with hash {:#018x}",
        engine.ticks(),
        last_hash.unwrap_or_else(|| engine.hash())
    );
    Ok(())
}

fn write_batch(writer: &mut impl Write, batch: &GameUpdates, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            writeln!(writer, "{}", serialize_updates_json(batch)?)?;
        }
        OutputFormat::Msgpack => {
            let bytes = serialize_updates(batch)?;
            let len = u32::try_from(bytes.len()).context("update batch too large")?;
            writer.write_all(&len.to_le_bytes())?;
            writer.write_all(&bytes)?;
        }
    }
    Ok(())
}
