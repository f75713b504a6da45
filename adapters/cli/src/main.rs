#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter for the dungeon editor.
//!
//! `build` applies a TOML editing script to a fresh map and prints the
//! resulting scene as a clipboard snapshot or JSON. `inspect` decodes a
//! snapshot and replays it to check that every placement still fits.

mod script;
mod snapshot;

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use dungeon_editor_core::{Command, Event, FootprintSize, TileKind};
use dungeon_editor_rendering::InstanceBuffers;
use dungeon_editor_system_asset_cache::{AssetLoadCache, LoadState};
use dungeon_editor_system_scene_export::{export_scene, replay};
use dungeon_editor_world::{apply, catalog::Catalog, World};
use futures::future::join_all;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use crate::{script::Script, snapshot::SceneSnapshot};

#[derive(Parser, Debug)]
#[command(name = "dungeon-editor")]
#[command(about = "Tile-based dungeon map editor")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand, Debug)]
enum CliCommand {
    /// Applies an editing script and prints the resulting scene.
    Build {
        /// TOML script listing the board size and editing steps.
        script: PathBuf,
        /// Catalog of tile and actor types; the built-in catalog otherwise.
        #[arg(long)]
        catalog: Option<PathBuf>,
        /// Print the scene as JSON instead of a snapshot string.
        #[arg(long)]
        json: bool,
    },
    /// Decodes a snapshot string and replays it onto an empty board.
    Inspect {
        /// Snapshot produced by `build`.
        snapshot: String,
        /// Catalog of tile and actor types; the built-in catalog otherwise.
        #[arg(long)]
        catalog: Option<PathBuf>,
    },
}

/// Mesh template shared by every instance of a tile type.
#[derive(Clone, Debug)]
struct TileTemplate {
    kind: TileKind,
    footprint: FootprintSize,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("dungeon_editor=info".parse()?))
        .init();

    match Cli::parse().command {
        CliCommand::Build {
            script,
            catalog,
            json,
        } => build(&script, catalog.as_deref(), json).await,
        CliCommand::Inspect { snapshot, catalog } => inspect(&snapshot, catalog.as_deref()),
    }
}

async fn build(script_path: &Path, catalog_path: Option<&Path>, json: bool) -> Result<()> {
    let catalog = load_catalog(catalog_path)?;
    let contents = fs::read_to_string(script_path)
        .with_context(|| format!("could not read script {}", script_path.display()))?;
    let script = Script::from_toml_str(&contents)?;
    let commands = script.commands()?;

    let templates = AssetLoadCache::new();
    resolve_templates(&templates, &catalog, script.placed_tile_kinds()).await;

    let mut world = World::new(script.board.q, script.board.s, &catalog);
    let mut buffers = InstanceBuffers::new();
    let mut events = Vec::new();
    let mut rejected = 0;
    for command in commands {
        if let Command::PlaceTile { kind, .. } = &command {
            if templates.state(kind) != LoadState::Resolved {
                warn!(%kind, "skipping placement without a loaded template");
                rejected += 1;
                continue;
            }
        }
        events.clear();
        apply(&mut world, command, &mut events);
        rejected += events.iter().filter(|event| is_rejection(event)).count();
        buffers.apply_events(&events);
    }

    let scene = export_scene(&world, &buffers)?;
    info!(
        tiles = scene.tiles.len(),
        actors = scene.actors.len(),
        rejected,
        "scene built"
    );

    if json {
        println!("{}", serde_json::to_string_pretty(&scene)?);
    } else {
        let snapshot = SceneSnapshot {
            q: script.board.q,
            s: script.board.s,
            scene,
        };
        println!("{}", snapshot.encode()?);
    }
    Ok(())
}

/// Requests a template for every placement concurrently; one load runs per type.
async fn resolve_templates(
    templates: &AssetLoadCache<TileKind, TileTemplate>,
    catalog: &Catalog,
    placements: Vec<TileKind>,
) {
    let requests = placements.into_iter().map(|kind| {
        let spec = catalog.tile(&kind).cloned();
        templates.resolve(kind, move |key| async move {
            spec.map(|spec| TileTemplate {
                kind: key,
                footprint: spec.footprint(),
            })
            .ok_or("type is not in the catalog")
        })
    });

    for outcome in join_all(requests).await {
        match outcome {
            Ok(template) => debug!(
                kind = %template.kind,
                q_length = template.footprint.q_length(),
                s_length = template.footprint.s_length(),
                "tile template ready"
            ),
            Err(error) => warn!(%error, "tile template unavailable"),
        }
    }
}

fn inspect(encoded: &str, catalog_path: Option<&Path>) -> Result<()> {
    let catalog = load_catalog(catalog_path)?;
    let snapshot = SceneSnapshot::decode(encoded).context("could not decode snapshot")?;

    let mut world = World::new(snapshot.q, snapshot.s, &catalog);
    let mut events = Vec::new();
    for command in replay(&snapshot.scene) {
        apply(&mut world, command, &mut events);
    }

    println!(
        "board {}x{}: {} tiles, {} actors",
        snapshot.q,
        snapshot.s,
        snapshot.scene.tiles.len(),
        snapshot.scene.actors.len()
    );
    for tile in &snapshot.scene.tiles {
        println!(
            "  tile {} at {} rotation {} {:?}",
            tile.kind,
            tile.anchor,
            tile.rotation.quarter_turns(),
            tile.orientation
        );
    }
    for actor in &snapshot.scene.actors {
        println!(
            "  actor {} at {} rotation {} action {}",
            actor.kind,
            actor.anchor,
            actor.rotation.quarter_turns(),
            actor.default_action.as_deref().unwrap_or("-")
        );
    }

    let rejected = events.iter().filter(|event| is_rejection(event)).count();
    if rejected > 0 {
        bail!("{rejected} placements could not be replayed");
    }
    Ok(())
}

fn load_catalog(path: Option<&Path>) -> Result<Catalog> {
    let Some(path) = path else {
        return Ok(Catalog::builtin());
    };
    let contents = fs::read_to_string(path)
        .with_context(|| format!("could not read catalog {}", path.display()))?;
    Catalog::from_toml_str(&contents)
        .with_context(|| format!("invalid catalog {}", path.display()))
}

fn is_rejection(event: &Event) -> bool {
    matches!(
        event,
        Event::TilePlacementRejected { .. }
            | Event::TileCommandRejected { .. }
            | Event::ActorPlacementRejected { .. }
            | Event::ActorCommandRejected { .. }
    )
}
