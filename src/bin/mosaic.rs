use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use mosaic_editor::common::config::{EditorSettings, config_file};
use mosaic_editor::editor::namer;
use mosaic_editor::model::{SetupKey, SetupTree, SetupValues, SizeValue};

#[derive(Parser)]
struct Cli {
    /// Path to the editor config file (overrides default).
    #[arg(long)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a setup file as an indented tree.
    Inspect {
        /// Path to a setup JSON file.
        file: PathBuf,
    },
    /// Validate a setup file without printing it.
    Check {
        /// Path to a setup JSON file.
        file: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();
    let config_path = cli.config.unwrap_or_else(config_file);
    let settings = EditorSettings::load(&config_path)?;
    match cli.command {
        Commands::Inspect { file } => inspect(&file, &settings),
        Commands::Check { file } => check(&file),
    }
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}

fn load_values(file: &Path) -> anyhow::Result<SetupValues> {
    let contents = std::fs::read_to_string(file)
        .with_context(|| format!("reading {}", file.display()))?;
    serde_json::from_str(&contents).context("invalid setup JSON")
}

fn check(file: &Path) -> anyhow::Result<()> {
    let values = load_values(file)?;
    SetupTree::from_values(&values).context("invalid setup tree")?;
    println!("ok");
    Ok(())
}

fn inspect(file: &Path, settings: &EditorSettings) -> anyhow::Result<()> {
    let values = load_values(file)?;
    let tree = SetupTree::from_values(&values).context("invalid setup tree")?;
    if let Some(SizeValue::Pixels(width)) = tree.data(tree.root()).width
        && let Some(range) = settings
            .media_screen_ranges
            .iter()
            .filter(|r| r.width <= width)
            .next_back()
    {
        println!("media screen: {}", range.name);
    }
    print_node(&tree, tree.root(), 0);
    Ok(())
}

fn print_node(tree: &SetupTree, key: SetupKey, depth: usize) {
    let data = tree.data(key);
    let indent = "  ".repeat(depth);
    let id = if key == tree.root() { "(root)".to_owned() } else { tree.id(key).to_string() };
    let name = data
        .name
        .as_deref()
        .map(|n| format!(" {:?}", namer::setup_label(n)))
        .unwrap_or_default();
    let width = data.width.as_ref().map(|w| format!(" width={w}")).unwrap_or_default();
    let mut flags = Vec::new();
    if tree.is_group(key) && data.tight_group {
        flags.push("tight");
    }
    if data.hidden {
        flags.push("hidden");
    }
    if data.width_flexible {
        flags.push("flexible");
    }
    let flags =
        if flags.is_empty() { String::new() } else { format!(" [{}]", flags.join(" ")) };
    println!("{indent}{id}{name} priority={}{width}{flags}", data.priority);
    for child in tree.children_by_priority(key, true) {
        print_node(tree, child, depth + 1);
    }
}
