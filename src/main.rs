use clap::{Parser, Subcommand};
use sky_align::config::load_config_or_default;
use sky_align::data::{load_scenario, synthetic};
use sky_align::logging::init_logging;
use sky_align::*;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser)]
#[command(name = "skyalign")]
#[command(about = "WCS-aware link selection and cursor readout for multi-image sky viewers")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Configuration file (TOML or JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute links for the datasets of a scenario and print them as JSON
    Link {
        /// Scenario file listing the datasets
        #[arg(short, long)]
        scenario: PathBuf,

        /// Alignment mode: pixels or wcs
        #[arg(short, long, default_value = "wcs")]
        mode: String,

        /// Fallback for datasets without a celestial WCS: pixels or none
        #[arg(short, long, default_value = "pixels")]
        fallback: String,

        /// Keep exact WCS links instead of approximating them
        #[arg(long)]
        no_fast: bool,

        /// Label of the reference dataset (first loaded by default)
        #[arg(short, long)]
        reference: Option<String>,
    },

    /// Print the cursor readout at a reference pixel position
    Readout {
        #[arg(short, long)]
        scenario: PathBuf,

        #[arg(short, long, default_value = "wcs")]
        mode: String,

        #[arg(short, default_value = "0")]
        x: f64,

        #[arg(short, default_value = "0")]
        y: f64,

        /// Blink this many times before reading
        #[arg(short, long, default_value = "0")]
        blink: usize,
    },

    /// Link two built-in images by WCS and read out pixel (0, 0)
    Demo,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = load_config_or_default(cli.config.as_deref());
    let _guard = init_logging(&config.logging.clone().with_verbosity(cli.verbose))?;

    match cli.command {
        Commands::Link {
            scenario,
            mode,
            fallback,
            no_fast,
            reference,
        } => {
            let mut options = LinkOptions {
                mode: mode.parse()?,
                fallback: fallback.parse()?,
                fast_approximation: !no_fast,
                reference: None,
            };
            if let Some(label) = reference {
                options = options.with_reference(label);
            }
            handle_link(config, scenario, options)?;
        }
        Commands::Readout {
            scenario,
            mode,
            x,
            y,
            blink,
        } => {
            let options = LinkOptions {
                mode: mode.parse()?,
                ..config.defaults.clone()
            };
            handle_readout(config, scenario, options, (x, y), blink)?;
        }
        Commands::Demo => {
            handle_demo(config)?;
        }
    }

    Ok(())
}

fn workspace_from_scenario(config: Config, scenario: &Path) -> anyhow::Result<Workspace> {
    let datasets = load_scenario(scenario)?;
    info!(count = datasets.len(), "Scenario loaded");

    let mut workspace = Workspace::new(config);
    for dataset in datasets {
        workspace.load(dataset)?;
    }
    Ok(workspace)
}

fn handle_link(config: Config, scenario: PathBuf, options: LinkOptions) -> anyhow::Result<()> {
    let mut workspace = workspace_from_scenario(config, &scenario)?;
    let links = workspace.link_data(options)?.clone();

    let mut frames = serde_json::Map::new();
    for dataset in workspace.datasets() {
        let capabilities = workspace.classify(dataset.label())?;
        frames.insert(dataset.label().to_string(), serde_json::to_value(capabilities)?);
    }

    let report = serde_json::json!({
        "links": links,
        "frames": frames,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn handle_readout(
    config: Config,
    scenario: PathBuf,
    options: LinkOptions,
    (x, y): (f64, f64),
    blink: usize,
) -> anyhow::Result<()> {
    let mut workspace = workspace_from_scenario(config, &scenario)?;
    workspace.link_data(options)?;
    for _ in 0..blink {
        workspace.blink(DEFAULT_VIEWER)?;
    }

    let readout = workspace.read(DEFAULT_VIEWER, x, y)?;
    print_readout(&readout);
    Ok(())
}

fn handle_demo(config: Config) -> anyhow::Result<()> {
    let mut workspace = Workspace::new(config);
    workspace.load(synthetic::image_with_wcs("has_wcs"))?;
    workspace.load(synthetic::image_without_wcs("no_wcs"))?;
    workspace.link_data(LinkOptions::wcs())?;

    for label in ["has_wcs", "no_wcs"] {
        println!(
            "{}: aligned by {}",
            label,
            workspace.get_alignment_method(DEFAULT_VIEWER, label)?
        );
    }

    let readout = workspace.read(DEFAULT_VIEWER, 0.0, 0.0)?;
    print_readout(&readout);
    Ok(())
}

fn print_readout(readout: &CursorReadout) {
    let (pixel, world, decimal) = readout.as_text();
    let flag = |unreliable: bool| if unreliable { " (unreliable)" } else { "" };
    println!("Dataset: {}", readout.dataset.as_deref().unwrap_or("-"));
    println!("{}{}", pixel, flag(readout.row1_unreliable));
    println!("{}{}", world, flag(readout.row2_unreliable));
    println!("{}{}", decimal, flag(readout.row3_unreliable));
}
