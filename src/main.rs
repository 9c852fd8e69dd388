use std::error::Error;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use wilderness::config::WildernessConfig;
use wilderness::explorer;
use wilderness::seeds::WorldSeeds;
use wilderness::terrain::Terrain;
use wilderness::tileset::Tileset;
use wilderness::world::World;

#[derive(Parser, Debug)]
#[command(name = "wilderness")]
#[command(about = "Explore procedurally grown biome maps in the terminal")]
struct Args {
    /// Map width in cells (fits the terminal if not specified)
    #[arg(short = 'W', long)]
    width: Option<usize>,

    /// Map height in cells (fits the terminal if not specified)
    #[arg(short = 'H', long)]
    height: Option<usize>,

    /// Random seed (uses random seed if not specified)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Glyph palette: default or moon
    #[arg(short, long)]
    tileset: Option<Tileset>,

    /// Biome the generator starts from
    #[arg(short, long)]
    origin: Option<Terrain>,

    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write logs to this file
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Print one generated map to stdout and exit
    #[arg(long)]
    dump: bool,
}

impl Args {
    /// Command-line values take precedence over the config file.
    fn apply(&self, config: &mut WildernessConfig) {
        if self.width.is_some() {
            config.width = self.width;
        }
        if self.height.is_some() {
            config.height = self.height;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if let Some(tileset) = self.tileset {
            config.tileset = tileset;
        }
        if let Some(origin) = self.origin {
            config.origin_terrain = origin;
        }
        if self.log_file.is_some() {
            config.log_file = self.log_file.clone();
        }
    }
}

/// Logging goes to a file only; the terminal belongs to the explorer.
fn init_logging(path: Option<&Path>) -> Result<(), Box<dyn Error>> {
    let Some(path) = path else {
        return Ok(());
    };
    let file = File::create(path)?;
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(Mutex::new(file)).with_ansi(false))
        .with(EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("wilderness=info"))?)
        .init();
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let mut config = WildernessConfig::load_or_default(args.config.as_deref())?;
    args.apply(&mut config);
    config.validate()?;

    init_logging(config.log_file.as_deref())?;
    if let Some(path) = &args.config {
        info!(path = %path.display(), "loaded config");
    }

    let seeds = WorldSeeds::from_option(config.seed);
    info!(%seeds, tileset = %config.tileset, origin = %config.origin_terrain, "starting");

    if args.dump {
        let (width, height) = config.map_size_for(80, 24);
        let mut world = World::new(config.world_settings(), seeds)?;
        world.regenerate(width, height)?;
        print!("{}", world.grid().render_text());
        println!("Seed: {}", seeds.master);
        return Ok(());
    }

    explorer::run_explorer(config, seeds)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file_config() -> WildernessConfig {
        WildernessConfig::from_toml_str(
            r#"
            tileset = "moon"
            origin_terrain = "water"
            seed = 5
            width = 30
            log_file = "from-file.log"
            "#,
        )
        .unwrap()
    }

    #[test]
    fn test_flags_override_file_values() {
        let args = Args::try_parse_from([
            "wilderness", "--seed", "9", "--origin", "grass", "--tileset", "default", "-W", "12", "--log-file", "cli.log",
        ])
        .unwrap();
        let mut config = file_config();
        args.apply(&mut config);

        assert_eq!(config.seed, Some(9));
        assert_eq!(config.origin_terrain, Terrain::Grass);
        assert_eq!(config.tileset, Tileset::Default);
        assert_eq!(config.width, Some(12));
        assert_eq!(config.log_file, Some(PathBuf::from("cli.log")));
    }

    #[test]
    fn test_unset_flags_keep_file_values() {
        let args = Args::try_parse_from(["wilderness", "--height", "7"]).unwrap();
        let mut config = file_config();
        args.apply(&mut config);

        assert_eq!(config.seed, Some(5));
        assert_eq!(config.origin_terrain, Terrain::Water);
        assert_eq!(config.tileset, Tileset::Moon);
        assert_eq!(config.width, Some(30));
        assert_eq!(config.height, Some(7));
        assert_eq!(config.log_file, Some(PathBuf::from("from-file.log")));
        assert!(!args.dump);
    }

    #[test]
    fn test_bad_flag_values_rejected() {
        assert!(Args::try_parse_from(["wilderness", "--tileset", "mars"]).is_err());
        assert!(Args::try_parse_from(["wilderness", "--origin", "lava"]).is_err());
    }
}
