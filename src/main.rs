use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use component_ident::config;
use component_ident::domain::Version;
use component_ident::{ui, Component};

#[derive(Parser)]
#[command(
    name = "component-ident",
    version,
    about = "Resolve component version identifiers and source tree digests"
)]
struct Args {
    #[arg(short, long, global = true, help = "Custom configuration file path")]
    config: Option<PathBuf>,

    #[arg(
        short,
        long,
        global = true,
        conflicts_with = "component",
        help = "Component source directory (default: current directory)"
    )]
    source_dir: Option<PathBuf>,

    #[arg(
        short = 'n',
        long,
        global = true,
        help = "Name of a component from the configuration file"
    )]
    component: Option<String>,

    #[arg(short, long, global = true, action = clap::ArgAction::Count, help = "Increase log verbosity")]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the component version
    Version,
    /// Print the package release
    Release,
    /// Print the devel counter (empty when none is persisted)
    Devel,
    /// Print the combined version-release identifier
    VersionRelease,
    /// Increment the persisted devel counter
    IncrementDevel,
    /// Print the content digest of the source tree
    SourceHash,
    /// Print the commit id of the source checkout
    CommitHash,
    /// Print recipe placeholder values as KEY=value lines
    Placeholders,
    /// Compare two versions, printing <, = or >
    Compare { first: String, second: String },
}

fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);

    if let Err(e) = run(args) {
        ui::display_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn run(args: Args) -> Result<()> {
    if let Commands::Compare { first, second } = &args.command {
        return compare(first, second);
    }

    let mut component = load_component(&args)?;

    match args.command {
        Commands::Version => ui::display_value(&component.resolve_version()?),
        Commands::Release => ui::display_value(&component.resolve_release()?),
        Commands::Devel => ui::display_value(&component.resolve_devel()?.unwrap_or_default()),
        Commands::VersionRelease => ui::display_value(&component.version_release()?),
        Commands::IncrementDevel => {
            component.increment_devel()?;
            if !component.has_packages() {
                ui::display_success(&format!(
                    "{} has no packages, devel counter unchanged",
                    component.name()
                ));
            } else if let Some(devel) = component.resolve_devel()? {
                ui::display_success(&format!(
                    "Devel counter of {} is now {}",
                    component.name(),
                    devel
                ));
            }
        }
        Commands::SourceHash => ui::display_value(component.source_hash(true)?.as_str()),
        Commands::CommitHash => ui::display_value(&component.source_commit_hash()?),
        Commands::Placeholders => ui::display_placeholders(&component.placeholders()?),
        Commands::Compare { .. } => {}
    }

    Ok(())
}

fn load_component(args: &Args) -> Result<Component> {
    let config = config::load_config(args.config.as_deref())?;

    let component = match (&args.component, &args.source_dir) {
        (Some(name), _) => config.component(name)?,
        (None, Some(dir)) => config.component_for_dir(dir),
        (None, None) => {
            let cwd = std::env::current_dir().context("Cannot determine current directory")?;
            config.component_for_dir(&cwd)
        }
    };
    Ok(component)
}

fn compare(first: &str, second: &str) -> Result<()> {
    let first_version =
        Version::parse(first).with_context(|| format!("Cannot compare '{}'", first))?;
    let second_version =
        Version::parse(second).with_context(|| format!("Cannot compare '{}'", second))?;

    ui::display_value(ui::ordering_symbol(first_version.cmp(&second_version)));
    Ok(())
}
