use anyhow::{Context, Result};
use camera_metadata::{helpers, BuildConfig, Metadata, MetadataDocument, PropertyKind};
use clap::{Args, Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};

mod report;

#[derive(Parser)]
#[command(name = "camera-metadata")]
#[command(about = "Build and inspect the camera metadata property graph", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors (stdout is reserved for output)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Build configuration (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the namespace/section/kind tree
    Tree(TreeArgs),

    /// Print node counts as a markdown table
    Stats(InputArgs),

    /// Print the built tree as JSON
    Dump(DumpArgs),

    /// List the values of a property's enumeration
    #[command(name = "enum-values")]
    EnumValues(EnumValuesArgs),
}

#[derive(Args)]
struct InputArgs {
    /// Metadata definitions document (JSON)
    file: PathBuf,

    /// Drop clones whose target never resolved
    #[arg(long)]
    prune: bool,
}

#[derive(Args)]
struct TreeArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Sort containers by name and kinds by kind order
    #[arg(long)]
    sort: bool,
}

#[derive(Args)]
struct DumpArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Pretty-print JSON
    #[arg(long)]
    pretty: bool,
}

#[derive(Args)]
struct EnumValuesArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Fully qualified property name, e.g. android.lens.facing
    property: String,

    /// Property kind; the first kind defining the name is used when omitted
    #[arg(long)]
    kind: Option<PropertyKind>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Tree(args) => {
            let mut metadata = load_metadata(&args.input, &config)?;
            if args.sort {
                metadata.sort_tree();
            }
            print!("{}", report::render_tree(&metadata)?);
        }
        Commands::Stats(args) => {
            let metadata = load_metadata(&args, &config)?;
            print!("{}", report::render_stats(&metadata.stats()));
        }
        Commands::Dump(args) => {
            let metadata = load_metadata(&args.input, &config)?;
            let dump = metadata.dump()?;
            let json = if args.pretty {
                serde_json::to_string_pretty(&dump)?
            } else {
                serde_json::to_string(&dump)?
            };
            println!("{json}");
        }
        Commands::EnumValues(args) => {
            let metadata = load_metadata(&args.input, &config)?;
            print_enum_values(&metadata, &args.property, args.kind)?;
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<BuildConfig> {
    match path {
        Some(path) => BuildConfig::from_toml_file(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(BuildConfig::default()),
    }
}

fn load_metadata(input: &InputArgs, config: &BuildConfig) -> Result<Metadata> {
    let text = fs::read_to_string(&input.file)
        .with_context(|| format!("Failed to read {}", input.file.display()))?;
    let document = MetadataDocument::from_json_str(&text)
        .with_context(|| format!("Failed to parse {}", input.file.display()))?;

    let mut config = config.clone();
    if input.prune {
        config.prune_unresolved_clones = true;
    }
    let metadata = Metadata::from_document(document, config)
        .with_context(|| format!("Failed to build metadata from {}", input.file.display()))?;
    log::debug!("Loaded {} properties", metadata.properties().len());
    Ok(metadata)
}

fn print_enum_values(metadata: &Metadata, name: &str, kind: Option<PropertyKind>) -> Result<()> {
    let id = match kind {
        Some(kind) => metadata.find_entry(kind, name),
        None => PropertyKind::ALL
            .iter()
            .find_map(|&kind| metadata.find_entry(kind, name)),
    }
    .with_context(|| format!("No property named '{name}'"))?;

    let merged = metadata.merge(id)?;
    let enumeration = merged
        .enumeration
        .and_then(|e| metadata.enumeration(e))
        .with_context(|| format!("Property '{name}' is not an enum"))?;

    for &value in &enumeration.values {
        let constant = helpers::jenum_value(metadata, value).unwrap_or_default();
        let number = helpers::enum_calculate_value_string(metadata, value)?;
        println!("{constant} = {number}");
    }
    Ok(())
}
