//! # Warren Dungeon Dump
//!
//! Generates a dungeon from a seed and prints it: every room grid as ASCII, or the whole
//! structure as JSON. Useful for eyeballing generator output.

use clap::Parser;
use rand::{rngs::StdRng, SeedableRng};
use std::path::PathBuf;
#[cfg(feature = "dev-tools")]
use tracing::{error, info, Level};
use warren::{
    GenerationConfig, Generator, Position, RoomContentGenerator, RoomGraphGenerator,
    SpatialConfig, SpatialDungeon, SpatialRoomGenerator, SpatialRoomKind, WarrenResult,
};

#[cfg(not(feature = "dev-tools"))]
use log::{error, info};

/// Command line arguments for the dungeon dump.
#[derive(Parser, Debug)]
#[command(name = "warren")]
#[command(about = "Generate and print a dungeon room graph and its room layouts")]
#[command(version)]
struct Args {
    /// Random seed for dungeon generation
    #[arg(short, long)]
    seed: Option<u64>,

    /// Difficulty stage
    #[arg(long, default_value_t = 1)]
    stage: u32,

    /// Number of rooms (overrides the config file)
    #[arg(short, long)]
    rooms: Option<usize>,

    /// Generate a spatial room tree instead of a room graph
    #[arg(long)]
    spatial: bool,

    /// JSON generation config to load
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print JSON instead of ASCII
    #[arg(long)]
    json: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

fn main() {
    let args = Args::parse();
    initialize_logging(&args.log_level);

    info!("Starting warren v{}", warren::VERSION);

    if let Err(err) = run(&args) {
        error!("{}", err);
        std::process::exit(1);
    }
}

/// Initializes the logging system based on the specified log level.
fn initialize_logging(log_level: &str) {
    #[cfg(feature = "dev-tools")]
    {
        let level = match log_level.to_lowercase().as_str() {
            "error" => Level::ERROR,
            "warn" => Level::WARN,
            "info" => Level::INFO,
            "debug" => Level::DEBUG,
            "trace" => Level::TRACE,
            _ => Level::WARN,
        };

        tracing_subscriber::fmt()
            .with_max_level(level)
            .with_target(false)
            .init();
    }

    #[cfg(not(feature = "dev-tools"))]
    {
        env_logger::Builder::new()
            .parse_filters(log_level)
            .format_target(false)
            .init();
    }
}

fn load_config(args: &Args) -> WarrenResult<GenerationConfig> {
    let mut config = match &args.config {
        Some(path) => GenerationConfig::load(path)?,
        None => GenerationConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(rooms) = args.rooms {
        config.total_rooms = rooms;
    }
    config.validate()?;
    Ok(config)
}

fn run(args: &Args) -> WarrenResult<()> {
    let config = load_config(args)?;
    info!("Generating with seed {} at stage {}", config.seed, args.stage);

    if args.spatial {
        let generator = SpatialRoomGenerator::new(SpatialConfig {
            target_rooms: config.total_rooms,
            ..SpatialConfig::default()
        });
        let mut rng = StdRng::seed_from_u64(config.seed);
        let dungeon = generator.generate(&config, &mut rng)?;
        if args.json {
            println!("{}", serde_json::to_string_pretty(&dungeon)?);
        } else {
            print!("{}", render_spatial(&dungeon));
        }
        return Ok(());
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut graph = RoomGraphGenerator::for_stage(args.stage).generate(&config, &mut rng)?;
    let content = RoomContentGenerator::from_config(&config);
    for room in graph.rooms.values_mut() {
        content.generate(room, args.stage, &mut rng);
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&graph)?);
        return Ok(());
    }

    for room in graph.rooms.values() {
        println!(
            "Room {} {:?} -> {:?}",
            room.id, room.room_type, room.connections
        );
        if let Some(grid) = &room.grid {
            print!("{}", grid.to_ascii());
        }
        println!();
    }
    Ok(())
}

/// One character per room slot: `S` start, `B` boss, `T` treasure, `*` special, `#` normal.
fn render_spatial(dungeon: &SpatialDungeon) -> String {
    let grid = dungeon.occupancy_grid();
    let mut out = String::new();
    for y in 0..grid.height {
        for x in 0..grid.width {
            let unit = grid.min_unit + Position::new(x, y);
            let corner = dungeon.origin + unit.scaled(dungeon.room_size);
            let glyph = match dungeon.room_at(corner).map(|room| room.kind) {
                Some(SpatialRoomKind::Start) => 'S',
                Some(SpatialRoomKind::Boss) => 'B',
                Some(SpatialRoomKind::Treasure) => 'T',
                Some(SpatialRoomKind::Special) => '*',
                Some(SpatialRoomKind::Normal) => '#',
                None => ' ',
            };
            out.push(glyph);
        }
        out.push('\n');
    }
    out
}
