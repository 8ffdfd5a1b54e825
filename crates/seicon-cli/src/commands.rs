use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use colored::Colorize;
use seicon_cache::{FlushReport, IconCacheConfig, IconHandler, IconServices, NoConsumers};
use seicon_engine::{AppProvidedEngine, EngineConfig};
use seicon_idle::ManualIdleDetector;
use seicon_remote::InMemoryCollection;
use seicon_store::{
    AttachmentStore, FsAttachmentStore, HandleRegistry, InMemoryAttachmentStore, ResourceHandle,
};
use seicon_types::pattern_matches;
use serde_json::json;

use crate::cli::*;
use crate::fixture::Fixture;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Resolve(args) => cmd_resolve(args, cli.format).await,
        Command::Match(args) => cmd_match(args, cli.format),
        Command::Engine(args) => cmd_engine(args, cli.format).await,
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<IconCacheConfig> {
    match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            Ok(IconCacheConfig::from_toml_str(&text)?)
        }
        None => Ok(IconCacheConfig::default()),
    }
}

/// A handler over a fixture collection. Idle is driven by hand: the CLI
/// flushes explicitly instead of waiting for the user to go idle.
fn build_handler(
    collection: InMemoryCollection,
    cache_dir: Option<&Path>,
    config: IconCacheConfig,
) -> Arc<IconHandler> {
    let store: Arc<dyn AttachmentStore> = match cache_dir {
        Some(dir) => Arc::new(FsAttachmentStore::new(dir)),
        None => Arc::new(InMemoryAttachmentStore::new()),
    };
    IconHandler::new(
        config,
        IconServices {
            remote: Arc::new(collection),
            store,
            handles: Arc::new(HandleRegistry::new()),
            idle: Arc::new(ManualIdleDetector::new()),
            consumers: Arc::new(NoConsumers),
        },
    )
}

/// Resolve, flushing pending downloads and resolving again when the first
/// attempt queued any.
async fn resolve(
    handler: &IconHandler,
    identifier: &str,
    width: u32,
    flush: bool,
) -> (Option<ResourceHandle>, Option<FlushReport>) {
    let handle = handler.get_icon(identifier, width).await;
    if !flush || !handler.is_idle_armed().await {
        return (handle, None);
    }
    let report = handler.on_idle().await;
    if let Some(stale) = &handle {
        handler.handles().release(stale);
    }
    (handler.get_icon(identifier, width).await, Some(report))
}

fn icon_json(handle: &Option<ResourceHandle>) -> serde_json::Value {
    match handle {
        Some(h) => json!({
            "url": h.url(),
            "mimetype": h.mimetype(),
            "size": h.bytes().len(),
        }),
        None => serde_json::Value::Null,
    }
}

fn report_json(report: &Option<FlushReport>) -> serde_json::Value {
    match report {
        Some(r) => json!({
            "downloaded": r.downloaded.iter().map(|id| id.as_str()).collect::<Vec<_>>(),
            "failed": r
                .failed
                .iter()
                .map(|(id, e)| json!({ "id": id.as_str(), "error": e.to_string() }))
                .collect::<Vec<_>>(),
        }),
        None => serde_json::Value::Null,
    }
}

fn print_icon(identifier: &str, handle: &Option<ResourceHandle>) {
    match handle {
        Some(h) => println!(
            "{} {} → {} ({}, {} bytes)",
            "✓".green().bold(),
            identifier.bold(),
            h.url().cyan(),
            h.mimetype(),
            h.bytes().len()
        ),
        None => println!("{} No icon for {}", "✗".red().bold(), identifier.bold()),
    }
}

fn print_report(report: &FlushReport) {
    println!("Downloaded {} icon(s)", report.downloaded.len().to_string().bold());
    for (id, e) in &report.failed {
        println!("  {} {}: {}", "failed".red(), id.as_str().yellow(), e);
    }
}

async fn cmd_resolve(args: ResolveArgs, format: OutputFormat) -> anyhow::Result<()> {
    let config = load_config(args.config.as_deref())?;
    let collection = Fixture::load(&args.fixture)?.into_collection()?;
    let handler = build_handler(collection, args.cache_dir.as_deref(), config);

    let (handle, report) = resolve(&handler, &args.identifier, args.width, !args.no_flush).await;

    match format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&json!({
                "identifier": args.identifier,
                "width": args.width,
                "icon": icon_json(&handle),
                "flush": report_json(&report),
            }))?
        ),
        OutputFormat::Text => {
            if let Some(report) = &report {
                print_report(report);
            }
            print_icon(&args.identifier, &handle);
        }
    }
    Ok(())
}

fn cmd_match(args: MatchArgs, format: OutputFormat) -> anyhow::Result<()> {
    let matched: Vec<&str> = args
        .patterns
        .iter()
        .filter(|p| pattern_matches(&args.identifier, p))
        .map(String::as_str)
        .collect();

    match format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&json!({
                "identifier": args.identifier,
                "matches": !matched.is_empty(),
                "patterns": matched,
            }))?
        ),
        OutputFormat::Text => {
            if matched.is_empty() {
                println!("{} {} matches no pattern", "✗".red().bold(), args.identifier.bold());
            } else {
                println!(
                    "{} {} matches {}",
                    "✓".green().bold(),
                    args.identifier.bold(),
                    matched.join(", ").yellow()
                );
            }
        }
    }
    Ok(())
}

async fn cmd_engine(args: EngineArgs, format: OutputFormat) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(&args.config)
        .with_context(|| format!("reading engine config {}", args.config.display()))?;
    let config = EngineConfig::from_json(&text)?;

    let collection = match &args.fixture {
        Some(path) => Fixture::load(path)?.into_collection()?,
        None => InMemoryCollection::default(),
    };
    let handler = build_handler(collection, None, IconCacheConfig::default());
    let engine = AppProvidedEngine::new(&config, None, handler.clone())?;

    let icon = if args.fixture.is_some() {
        let mut icon = engine.get_icon_url(args.width).await;
        if icon.is_none() && handler.is_idle_armed().await {
            handler.on_idle().await;
            icon = engine.get_icon_url(args.width).await;
        }
        icon
    } else {
        None
    };

    let prefs = HashMap::new();
    let submissions: Vec<_> = engine
        .urls()
        .iter()
        .map(|u| (u.url_type(), u.submission(&args.terms, args.purpose.as_deref(), &prefs)))
        .collect();

    match format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&json!({
                "id": engine.id(),
                "name": engine.name(),
                "identifier": engine.configuration_id(),
                "telemetryId": engine.telemetry_id(),
                "loadPath": engine.load_path(),
                "aliases": engine.aliases(),
                "generalPurpose": engine.is_general_purpose(),
                "urls": submissions
                    .iter()
                    .map(|(t, s)| json!({ "type": t.as_str(), "method": s.method, "url": s.url, "body": s.body }))
                    .collect::<Vec<_>>(),
                "icon": icon_json(&icon),
            }))?
        ),
        OutputFormat::Text => {
            println!("{} ({})", engine.name().bold(), engine.id().dimmed());
            println!("  Identifier: {}", engine.configuration_id().yellow());
            println!("  Telemetry: {}", engine.telemetry_id());
            println!("  Load path: {}", engine.load_path());
            if !engine.aliases().is_empty() {
                println!("  Aliases: {}", engine.aliases().join(", ").cyan());
            }
            println!("  General purpose: {}", engine.is_general_purpose());
            for (url_type, sub) in &submissions {
                println!("  {:<12} {} {}", url_type.as_str(), sub.method, sub.url.blue());
                if let Some(body) = &sub.body {
                    println!("  {:<12} body: {}", "", body);
                }
            }
            if args.fixture.is_some() {
                print_icon(engine.configuration_id(), &icon);
            }
        }
    }

    engine.cleanup();
    Ok(())
}
