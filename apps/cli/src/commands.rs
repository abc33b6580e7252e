//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use toolbox_core::{AggregateResult, Aggregator, Loader, ProgressReporter};
use toolbox_shared::{
    AppConfig, LoaderConfig, PROJECT_CONFIG_FILE, TransportChoice, Unit, UnitStatus,
    config_file_path, init_config, load_layered,
};
use toolbox_transport::{AnyTransport, Transport};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// toolbox — load a categorized tool manifest over an unreliable transport.
#[derive(Parser)]
#[command(
    name = "toolbox",
    version,
    about = "Load a root tool manifest and its category documents, tolerating partial failure.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Extra config file, layered over the user and project config.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Load the manifest tree and print the aggregated categories.
    Load(LoadArgs),

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Flags for `load`. Each one overrides the resolved config.
#[derive(clap::Args, Debug, Default)]
pub(crate) struct LoadArgs {
    /// Serving root: http(s) URL, file:// URL, or directory.
    #[arg(long, env = "TOOLBOX_BASE")]
    pub base: Option<String>,

    /// Root manifest path relative to the base.
    #[arg(long)]
    pub root: Option<String>,

    /// Transport: auto, http, or file.
    #[arg(long)]
    pub transport: Option<String>,

    /// Per-attempt timeout in milliseconds.
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Attempts per document.
    #[arg(long)]
    pub attempts: Option<u32>,

    /// Backoff base in milliseconds.
    #[arg(long)]
    pub backoff_ms: Option<u64>,

    /// Start every category collapsed.
    #[arg(long)]
    pub collapsed: bool,

    /// Print the aggregate as JSON instead of a tree.
    #[arg(long)]
    pub json: bool,
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "toolbox=info",
        1 => "toolbox=debug",
        _ => "toolbox=trace",
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config = resolve_config(cli.config.as_ref())?;
    match cli.command {
        Command::Load(args) => cmd_load(config, &args).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(&config),
        },
    }
}

/// User config, then `./toolbox.toml`, then `--config`, later layers winning.
fn resolve_config(extra: Option<&PathBuf>) -> Result<AppConfig> {
    let mut layers = vec![config_file_path()?, PathBuf::from(PROJECT_CONFIG_FILE)];
    if let Some(path) = extra {
        if !path.exists() {
            return Err(eyre!("config file not found: {}", path.display()));
        }
        layers.push(path.clone());
    }
    Ok(load_layered(&layers)?)
}

/// Fold `load` flags into the resolved config.
fn apply_overrides(config: &mut AppConfig, args: &LoadArgs) -> Result<()> {
    if let Some(base) = &args.base {
        config.source.base = base.clone();
    }
    if let Some(root) = &args.root {
        config.source.root_path = root.clone();
    }
    if let Some(transport) = &args.transport {
        config.source.transport = transport.parse::<TransportChoice>()?;
    }
    if let Some(timeout_ms) = args.timeout_ms {
        config.loader.timeout_ms = timeout_ms;
    }
    if let Some(attempts) = args.attempts {
        config.loader.max_attempts = attempts;
    }
    if let Some(backoff_ms) = args.backoff_ms {
        config.loader.backoff_base_ms = backoff_ms;
    }
    if args.collapsed {
        config.display.default_expanded = false;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_load(mut config: AppConfig, args: &LoadArgs) -> Result<()> {
    apply_overrides(&mut config, args)?;

    let transport = AnyTransport::connect(&config.source.base, config.source.transport)?;
    let loader_config = LoaderConfig::from(&config);

    info!(
        base = %config.source.base,
        transport = transport.name(),
        root = %config.source.root_path,
        timeout_ms = loader_config.timeout.as_millis() as u64,
        max_attempts = loader_config.max_attempts,
        "loading toolbox"
    );

    let mut aggregator = Aggregator::new(
        Loader::new(transport, loader_config),
        config.display.default_expanded,
    );
    let reporter = CliProgress::new();
    let result = aggregator
        .load_all(&config.source.root_path, &reporter)
        .await;

    if let Some(error) = &result.error {
        return Err(eyre!("{error}"));
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_tree(&result);
    }

    Ok(())
}

fn print_tree(result: &AggregateResult) {
    println!();
    for unit in &result.units {
        println!("{}", unit_line(unit));
        if unit.expanded {
            for entry in &unit.tools {
                let label = entry.name().or(entry.id()).unwrap_or("(unnamed)");
                println!("      - {label}");
            }
        }
    }
    println!();
    println!(
        "  {} categories, {} tools, {} unavailable",
        result.units.len(),
        result.entry_count(),
        result.degraded_count()
    );
    println!();
}

fn unit_line(unit: &Unit) -> String {
    let marker = if unit.expanded { "▾" } else { "▸" };
    let detail = match &unit.status {
        UnitStatus::Loaded => format!("{} tools", unit.tools.len()),
        UnitStatus::Empty => "no tools".to_string(),
        UnitStatus::Failed { reason } => format!("unavailable: {reason}"),
    };
    format!("  {marker} {} [{}]  {detail}", unit.name, unit.icon)
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config: &AppConfig) -> Result<()> {
    let toml_str = toml::to_string_pretty(config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        spinner.set_style(style);
        spinner.enable_steady_tick(Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn unit_settled(&self, unit: &Unit, settled: usize, total: usize) {
        self.spinner
            .set_message(format!("Loaded [{settled}/{total}] {}", unit.name));
    }

    fn done(&self, _result: &AggregateResult) {
        self.spinner.finish_and_clear();
    }
}
