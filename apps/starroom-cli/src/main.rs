use anyhow::Context;
use clap::{Parser, Subcommand};
use glam::Vec3;
use starroom_common::ParticipantId;
use starroom_scene::{DebugTextRenderer, RetainedScene, SceneRenderer};
use starroom_session::{CameraState, PlayerState, Room, RoomState, Session};
use starroom_sync::{SceneConfig, SyncPolicy, SyncReport, Synchronizer};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "starroom-cli", about = "Room-to-scene synchronization tool")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Scene config (YAML); defaults are used when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print crate versions
    Info,
    /// Print the effective scene config as YAML
    Config,
    /// Simulate a room: players join, some leave, synchronize after each step
    Demo {
        /// Number of players joining the room
        #[arg(short, long, default_value = "3")]
        players: usize,
        /// Number of players leaving afterwards
        #[arg(short, long, default_value = "1")]
        leave: usize,
        /// Recreate every ship on each pass instead of diffing
        #[arg(long)]
        full_reissue: bool,
    },
    /// Apply JSON room snapshots in order, synchronizing after each one
    Replay {
        /// Local participant id
        #[arg(short, long)]
        session_id: String,
        /// Snapshot files
        #[arg(required = true)]
        snapshots: Vec<PathBuf>,
        /// Print reports as JSON lines instead of text
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let mut config = match &cli.config {
        Some(path) => SceneConfig::load(path)
            .with_context(|| format!("loading scene config {}", path.display()))?,
        None => SceneConfig::default(),
    };

    match cli.command {
        Commands::Info => {
            println!("starroom-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("common: {}", starroom_common::crate_info());
            println!("session: {}", starroom_session::crate_info());
            println!("scene: {}", starroom_scene::crate_info());
            println!("sync: {}", starroom_sync::crate_info());
        }
        Commands::Config => {
            print!("{}", config.to_yaml()?);
        }
        Commands::Demo {
            players,
            leave,
            full_reissue,
        } => {
            anyhow::ensure!(players > 0, "demo needs at least one player");
            if full_reissue {
                config.policy = SyncPolicy::FullReissue;
            }
            run_demo(config, players, leave.min(players - 1))?;
        }
        Commands::Replay {
            session_id,
            snapshots,
            json,
        } => {
            run_replay(config, ParticipantId::new(session_id), &snapshots, json)?;
        }
    }

    Ok(())
}

fn run_demo(config: SceneConfig, players: usize, leave: usize) -> anyhow::Result<()> {
    println!("Demo: {players} players join, {leave} leave, policy={:?}", config.policy);

    let mut room = Room::new("player-0");
    for i in 0..players {
        let angle = i as f32 / players as f32 * std::f32::consts::TAU;
        room.join(
            format!("player-{i}"),
            PlayerState::at(Vec3::new(angle.cos() * 15.0, 0.0, angle.sin() * 15.0)),
            CameraState::default(),
        )?;
    }

    let mut scene = RetainedScene::new();
    let mut sync = Synchronizer::new(room, config);
    let report = sync.mount(&mut scene)?;
    print_report("mount", &report);

    // Players leave from the back so the local participant stays
    for i in (players - leave..players).rev() {
        sync.session_mut().leave(&ParticipantId::new(format!("player-{i}")))?;
    }
    if let Some(report) = sync.synchronize_if_changed(&mut scene)? {
        print_report("after leave", &report);
    }

    print!("{}", DebugTextRenderer::new().render(&scene));
    println!(
        "Match: {}",
        if sync.rendered_count() == sync.session().state().players.len() {
            "OK"
        } else {
            "MISMATCH"
        }
    );
    Ok(())
}

fn run_replay(
    config: SceneConfig,
    session_id: ParticipantId,
    snapshots: &[PathBuf],
    json: bool,
) -> anyhow::Result<()> {
    let mut states = Vec::with_capacity(snapshots.len());
    for path in snapshots {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading snapshot {}", path.display()))?;
        let state = RoomState::from_json(&text)
            .with_context(|| format!("decoding snapshot {}", path.display()))?;
        if let Err(e) = state.validate() {
            tracing::warn!("{}: {e}", path.display());
        }
        states.push(state);
    }

    let mut states = states.into_iter();
    let first = states.next().unwrap_or_default();
    let mut scene = RetainedScene::new();
    let mut sync = Synchronizer::new(Room::with_state(session_id, first), config);
    let report = sync.mount(&mut scene)?;
    emit(json, &snapshots[0], &report)?;

    for (state, path) in states.zip(&snapshots[1..]) {
        let events = sync.session_mut().apply_snapshot(state);
        tracing::debug!(events, "applied {}", path.display());
        match sync.synchronize_if_changed(&mut scene)? {
            Some(report) => emit(json, path, &report)?,
            None if !json => println!("{}: unchanged", path.display()),
            None => {}
        }
    }

    if !json {
        print!("{}", DebugTextRenderer::new().render(&scene));
    }
    Ok(())
}

fn emit(json: bool, path: &std::path::Path, report: &SyncReport) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string(report)?);
    } else {
        print_report(&path.display().to_string(), report);
    }
    Ok(())
}

fn print_report(label: &str, report: &SyncReport) {
    println!(
        "{label}: rev={} created={} updated={} removed={} unchanged={} rendered={}",
        report.revision,
        report.created.len(),
        report.updated.len(),
        report.removed.len(),
        report.unchanged,
        report.rendered
    );
}
