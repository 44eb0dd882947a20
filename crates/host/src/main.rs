//! proghost - prog content host
//!
//! Compiles every `.prog` file in the configured directory, reports
//! diagnostics, optionally runs one prog against a demo world, and can watch
//! the directory to recompile progs as builders edit them.

mod library;
mod progfile;

use anyhow::{bail, Context};
use library::{ProgLibrary, PROG_EXTENSION};
use mud_config::ProgConfig;
use mud_core::{CharacterId, ItemId, LocationId};
use mud_prog::{EngineOptions, MemoryWorld, ProgCache, ProgEngine};
use notify::{Event, EventKind, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

const USAGE: &str = "usage: proghost [--config PATH] [--watch] [--run NAME [ARGS...]] [--help-json NAME]";

#[derive(Debug, Default, PartialEq)]
struct Args {
    config: Option<PathBuf>,
    watch: bool,
    run: Option<(String, Vec<String>)>,
    help_json: Option<String>,
}

fn parse_args(args: impl IntoIterator<Item = String>) -> anyhow::Result<Args> {
    let mut parsed = Args::default();
    let mut it = args.into_iter();

    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--config" => {
                let path = it.next().context("--config needs a path")?;
                parsed.config = Some(path.into());
            }
            "--watch" => parsed.watch = true,
            "--run" => {
                let name = it.next().context("--run needs a prog name")?;
                parsed.run = Some((name, it.by_ref().collect()));
            }
            "--help-json" => {
                parsed.help_json = Some(it.next().context("--help-json needs a function name")?);
            }
            "-h" | "--help" => bail!(USAGE),
            other => bail!("unknown argument '{}'\n{}", other, USAGE),
        }
    }

    Ok(parsed)
}

fn load_config(path: Option<&Path>) -> ProgConfig {
    let loaded = match path {
        Some(path) => ProgConfig::load_from_file(path),
        None => ProgConfig::load_default(),
    };

    match loaded {
        Ok(config) => config,
        Err(e) => {
            warn!("Failed to load prog options: {}", e);
            warn!("   Using default configuration");
            ProgConfig::default()
        }
    }
}

/// Small world for trying progs from the command line
fn demo_world() -> MemoryWorld {
    let mut world = MemoryWorld::new();
    world
        .add_location(LocationId::new(1), "Market Square")
        .add_location(LocationId::new(2), "The Rusty Anchor")
        .add_character(CharacterId::new(1), "Mira", Some(LocationId::new(1)))
        .add_character(CharacterId::new(2), "Tobin", Some(LocationId::new(1)))
        .add_character(CharacterId::new(3), "Old Hask", Some(LocationId::new(2)))
        .add_item_at(ItemId::new(1), "a fruit cart", LocationId::new(1))
        .give_item(ItemId::new(2), "a brass lantern", CharacterId::new(1));
    world
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_target(false)
        .init();

    let args = parse_args(std::env::args().skip(1))?;
    let config = load_config(args.config.as_deref());
    config.display();

    let engine = ProgEngine::standard().with_options(EngineOptions::from(&config));

    if let Some(name) = &args.help_json {
        if engine.describe_signatures(name).is_empty() {
            bail!("no built-in function named '{}'", name);
        }
        println!("{}", engine.registry().help_json(name)?);
        return Ok(());
    }

    let mut library = ProgLibrary::new(ProgCache::new(engine, config.cache_size), config.log_compile);
    let prog_dir = PathBuf::from(&config.prog_dir);
    let summary = library
        .load_dir(&prog_dir)
        .with_context(|| format!("reading prog directory {}", prog_dir.display()))?;

    if let Some((name, run_args)) = &args.run {
        let world = demo_world();
        match library.run_with_text(name, run_args, &world) {
            Ok(value) => info!("{} returned {}", name, value),
            Err(e) => error!("{} failed: {}", name, e),
        }
        for id in 1..=3 {
            for message in world.sent_to(CharacterId::new(id)) {
                info!("  to #{}: {}", id, message);
            }
        }
        for id in 1..=2 {
            for message in world.echoes_at(LocationId::new(id)) {
                info!("  in #{}: {}", id, message);
            }
        }
    }

    if args.watch || config.watch {
        watch(&mut library, &prog_dir).await?;
    } else if summary.failed > 0 {
        bail!("{} progs failed to compile", summary.failed);
    }

    Ok(())
}

/// Recompile progs as their files change, until the watcher stops
async fn watch(library: &mut ProgLibrary, dir: &Path) -> anyhow::Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
        let _ = tx.send(res);
    })?;
    watcher.watch(dir, RecursiveMode::NonRecursive)?;
    info!("Watching {} for prog edits", dir.display());

    while let Some(res) = rx.recv().await {
        let event = match res {
            Ok(event) => event,
            Err(e) => {
                warn!("Watch error: {}", e);
                continue;
            }
        };

        for path in event
            .paths
            .iter()
            .filter(|path| path.extension().is_some_and(|ext| ext == PROG_EXTENSION))
        {
            match event.kind {
                EventKind::Remove(_) => {
                    library.unload(path);
                }
                EventKind::Create(_) | EventKind::Modify(_) if path.is_file() => match library.load_file(path) {
                    Ok(name) => info!("Recompiled prog '{}'", name),
                    Err(e) => warn!("{}: {}", path.display(), e),
                },
                _ => {}
            }
        }
    }

    Ok(())
}
