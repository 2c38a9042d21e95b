use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use flexi_logger::Logger;
use log::{info, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;

use cardlayout::config::migrate::migrate_with_report;
use cardlayout::{
    render, segment_with, CardExporter, CondensedCardConfig, EngineConfig, LiveOverrides, ProfileData,
    SectionRegistry,
};

#[derive(Parser, Debug)]
#[command(name = "cardlayout", version, about = "Migrate, segment, render and export card layouts")]
struct Cli {
    /// Log level spec (overridden by RUST_LOG)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Upgrade a persisted config to the current shape and print it
    Migrate(InputArgs),
    /// Print the flow segmentation of a config
    Segment(InputArgs),
    /// Print the layout tree of a config
    Render(InputArgs),
    /// Rasterize a config to PNG
    Export(ExportArgs),
}

#[derive(Args, Debug)]
struct InputArgs {
    /// Persisted card config (any supported shape)
    config: PathBuf,
    /// Profile data JSON used by section renderers
    #[arg(long)]
    profile: Option<PathBuf>,
    /// Engine config JSON (partial documents are fine)
    #[arg(long)]
    engine_config: Option<PathBuf>,
    /// Write output here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ExportArgs {
    #[command(flatten)]
    input: InputArgs,
    /// Overrides `export.pixelRatio` from the engine config
    #[arg(long)]
    pixel_ratio: Option<f64>,
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}

fn emit<T: Serialize>(value: &T, output: Option<&Path>) -> Result<()> {
    let text = serde_json::to_string_pretty(value)?;
    match output {
        Some(path) => fs::write(path, text).with_context(|| format!("writing {}", path.display())),
        None => {
            println!("{}", text);
            Ok(())
        }
    }
}

struct Loaded {
    config: CondensedCardConfig,
    profile: ProfileData,
    engine: EngineConfig,
}

fn load(args: &InputArgs) -> Result<Loaded> {
    let raw: serde_json::Value = read_json(&args.config)?;
    let (config, report) = migrate_with_report(&raw);
    for dropped in &report.dropped {
        warn!("{}", dropped);
    }
    info!("loaded {:?} config with {} section(s)", report.shape, config.sections.len());

    let profile = match &args.profile {
        Some(path) => read_json(path)?,
        None => ProfileData::default(),
    };
    let engine = match &args.engine_config {
        Some(path) => read_json(path)?,
        None => EngineConfig::default(),
    };
    Ok(Loaded { config, profile, engine })
}

fn export(args: &ExportArgs) -> Result<()> {
    let loaded = load(&args.input)?;
    let mut options = loaded.engine.export.clone();
    if let Some(ratio) = args.pixel_ratio {
        options.pixel_ratio = ratio;
    }
    let output = args.input.output.clone().unwrap_or_else(|| PathBuf::from("card.png"));

    let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;
    let exporter = CardExporter::new().on_progress(|p| info!("export {:?} {:.0}%", p.phase, p.fraction * 100.0));
    let artifact = runtime.block_on(exporter.export_card(
        &loaded.config,
        &loaded.profile,
        &SectionRegistry::standard(),
        &LiveOverrides::new(),
        &options,
    ))?;

    fs::write(&output, &artifact.image.png_data).with_context(|| format!("writing {}", output.display()))?;
    println!("{} {}x{} sha256:{}", output.display(), artifact.image.width, artifact.image.height, artifact.image.digest);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let _logger = Logger::try_with_env_or_str(&cli.log_level)?.log_to_stderr().start()?;

    match &cli.command {
        Commands::Migrate(args) => {
            let loaded = load(args)?;
            emit(&loaded.config, args.output.as_deref())
        }
        Commands::Segment(args) => {
            let loaded = load(args)?;
            emit(&segment_with(&loaded.config, &loaded.engine.segmentation), args.output.as_deref())
        }
        Commands::Render(args) => {
            let loaded = load(args)?;
            emit(&render(&loaded.config, &loaded.profile), args.output.as_deref())
        }
        Commands::Export(args) => export(args),
    }
}
