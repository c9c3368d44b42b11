//! # Portalcrawl Main Entry Point
//!
//! Loads a room catalog, generates a map against the sandbox world, and reports the result.

use clap::Parser;
use log::{error, info};
use portalcrawl::{
    MapGenerationParams, MapGenerator, MinimapLog, PortalcrawlResult, RoomCatalog, SandboxWorld,
};
use std::path::PathBuf;

/// Command line arguments for the Portalcrawl generator.
#[derive(Parser, Debug)]
#[command(name = "portalcrawl")]
#[command(about = "Generates room-graph dungeon layouts with doorways and portals")]
#[command(version)]
struct Args {
    /// Room catalog JSON file (defaults to the built-in sample catalog)
    #[arg(short, long)]
    catalog: Option<PathBuf>,

    /// Seed for the draw sequence (random when omitted)
    #[arg(short, long)]
    seed: Option<u32>,

    /// Override the catalog's battle room count
    #[arg(short, long)]
    battle_rooms: Option<u32>,

    /// Print the generated layout as JSON
    #[arg(long)]
    json: bool,

    /// Destroy the map after generating it and report destroy counts
    #[arg(long)]
    teardown: bool,

    /// Write the sample catalog to this file and exit
    #[arg(long)]
    write_sample: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() {
    let args = Args::parse();

    if let Err(e) = initialize_logging(&args.log_level) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    if let Err(e) = run(&args) {
        error!("{}", e);
        std::process::exit(1);
    }
}

/// Initializes the logging system based on the specified log level.
fn initialize_logging(log_level: &str) -> PortalcrawlResult<()> {
    #[cfg(feature = "dev-tools")]
    {
        let level = match log_level.to_lowercase().as_str() {
            "error" => tracing::Level::ERROR,
            "warn" => tracing::Level::WARN,
            "info" => tracing::Level::INFO,
            "debug" => tracing::Level::DEBUG,
            "trace" => tracing::Level::TRACE,
            _ => tracing::Level::INFO,
        };

        tracing_subscriber::fmt()
            .with_max_level(level)
            .with_target(false)
            .init();
    }

    #[cfg(not(feature = "dev-tools"))]
    {
        let filter = match log_level.to_lowercase().as_str() {
            "error" => log::LevelFilter::Error,
            "warn" => log::LevelFilter::Warn,
            "info" => log::LevelFilter::Info,
            "debug" => log::LevelFilter::Debug,
            "trace" => log::LevelFilter::Trace,
            _ => log::LevelFilter::Info,
        };

        env_logger::Builder::new()
            .filter_level(filter)
            .format_target(false)
            .init();
    }

    Ok(())
}

fn run(args: &Args) -> PortalcrawlResult<()> {
    info!("Starting Portalcrawl v{}", portalcrawl::VERSION);

    if let Some(path) = &args.write_sample {
        RoomCatalog::sample().save(path)?;
        info!("Sample catalog written to {}", path.display());
        return Ok(());
    }

    let catalog = match &args.catalog {
        Some(path) => {
            info!("Loading catalog from {}", path.display());
            RoomCatalog::from_file(path)?
        }
        None => RoomCatalog::sample(),
    };
    catalog.validate()?;

    let seed = args.seed.unwrap_or_else(portalcrawl::create_seed);
    let mut params = MapGenerationParams::from_catalog(&catalog, seed);
    if let Some(battle_rooms) = args.battle_rooms {
        params.battle_room_count = battle_rooms;
    }

    let world = SandboxWorld::new(&catalog);
    let mut generator = MapGenerator::new(catalog, world, MinimapLog::new());
    let summary = generator.generate_map(&params)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(generator.layout())?);
    } else {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        let path: Vec<String> = generator
            .layout()
            .main_path_kinds()
            .iter()
            .map(|kind| kind.to_string())
            .collect();
        println!("main path: {}", path.join(" -> "));
    }

    if args.teardown {
        let live = generator.world().live_actor_count();
        generator.destroy_map();
        println!(
            "destroyed {} actors with {} destroy calls; {} remain",
            live,
            generator.world().total_destroy_calls(),
            generator.world().live_actor_count()
        );
    }

    Ok(())
}
