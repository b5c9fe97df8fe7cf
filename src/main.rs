use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use kentridge::config::{find_config_file, get_config, load_config, Config};
use kentridge::engine::{search_enabled, BatchReport, BatchWorkflow, RecordState, UpdateStrategy};
use kentridge::providers::ProviderRegistry;
use kentridge::store::JsonLibrary;
use kentridge::ui::{
    self, print_section, print_status, AutoPolicy, AutoSelector, ConsoleReporter, PromptSelector,
    Spinner, Status,
};
use kentridge::utils::HttpClient;
use kentridge::SearchResult;
use owo_colors::OwoColorize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Kentridge - Fill in bibliographic records from external metadata providers
#[derive(Parser, Debug)]
#[command(name = "kentridge")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Fetch bibliographic metadata and reconcile it into existing records", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (can be used multiple times for more verbosity: -v, -vv)
    #[arg(long, short, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, short, value_enum, global = true, default_value_t = OutputFormat::Auto)]
    output: OutputFormat,

    /// Log line format
    #[arg(long, value_enum, global = true, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Output format for results
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    /// Automatic based on terminal (table if TTY, JSON otherwise)
    Auto,
    /// Table format (human-readable)
    Table,
    /// JSON format (machine-readable)
    Json,
}

impl OutputFormat {
    fn resolve(self) -> Self {
        match self {
            OutputFormat::Auto if ui::is_terminal() => OutputFormat::Table,
            OutputFormat::Auto => OutputFormat::Json,
            other => other,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the known metadata providers and whether they are enabled
    Providers,

    /// Query every enabled provider for a title
    #[command(alias = "s")]
    Search {
        /// Title to look up
        title: String,
    },

    /// Fetch metadata for the records of a JSON library file and apply the chosen results
    Enrich {
        /// Path to the library file
        library: PathBuf,

        /// Merge strategy (overrides the configured `update_strategy`)
        #[arg(long)]
        strategy: Option<UpdateStrategy>,

        /// Pick results without prompting
        #[arg(long, value_enum)]
        auto: Option<AutoPolicy>,

        /// Only process the record at this zero-based index
        #[arg(long)]
        index: Option<usize>,
    },

    /// Show the effective configuration
    Config,
}

fn init_tracing(cli: &Cli) {
    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let level = if cli.quiet { "error" } else { log_level };

    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| format!("kentridge={}", level)),
    );

    let registry = tracing_subscriber::registry().with(filter);
    match cli.log_format {
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init(),
    }
}

fn resolve_config(cli: &Cli) -> Result<Config> {
    let config = if let Some(path) = &cli.config {
        load_config(path).with_context(|| format!("Failed to load {}", path.display()))?
    } else if let Some(path) = find_config_file() {
        tracing::info!("Using config file: {}", path.display());
        load_config(&path).with_context(|| format!("Failed to load {}", path.display()))?
    } else {
        get_config()?
    };
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli);

    let config = resolve_config(&cli)?;
    let client = HttpClient::from_config(&config.http)?;
    let registry = ProviderRegistry::new(Arc::new(client));
    let output = cli.output.resolve();

    match &cli.command {
        Commands::Providers => list_providers(&registry, &config, output)?,
        Commands::Search { title } => search(&registry, &config, title, output, cli.quiet).await?,
        Commands::Enrich {
            library,
            strategy,
            auto,
            index,
        } => {
            let report =
                enrich(&registry, &config, library, *strategy, *auto, *index, cli.quiet).await?;
            print_report(&report, output)?;
        }
        Commands::Config => print!("{}", config.to_toml()?),
    }

    Ok(())
}

fn list_providers(registry: &ProviderRegistry, config: &Config, output: OutputFormat) -> Result<()> {
    let configs = registry.all_configs();

    if output == OutputFormat::Json {
        let rows: Vec<_> = configs
            .iter()
            .map(|c| {
                serde_json::json!({
                    "key": c.key,
                    "name": c.name,
                    "enabled": c.is_enabled(config),
                    "requiresApiKey": c.requires_api_key,
                    "hasApiKey": c.api_key(config).is_some(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Key", "Name", "Enabled", "API key"]);

    for c in &configs {
        let enabled = if c.is_enabled(config) { "yes" } else { "no" };
        let api_key = match (c.requires_api_key, c.api_key(config).is_some()) {
            (_, true) => "set",
            (true, false) => "missing",
            (false, false) => "-",
        };
        table.add_row(vec![
            format!("{} {}", ui::provider_icon(&c.key), c.key),
            c.name.clone(),
            enabled.to_string(),
            api_key.to_string(),
        ]);
    }

    println!("{table}");
    Ok(())
}

async fn search(
    registry: &ProviderRegistry,
    config: &Config,
    title: &str,
    output: OutputFormat,
    quiet: bool,
) -> Result<()> {
    let spinner = (output == OutputFormat::Table && !quiet)
        .then(|| Spinner::new(&format!("Searching for \"{}\"", title)));
    let results = search_enabled(title, registry, config).await;
    if let Some(spinner) = spinner {
        spinner.finish();
    }

    output_results(&results, output)
}

fn output_results(results: &[SearchResult], output: OutputFormat) -> Result<()> {
    if output == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(results)?);
        return Ok(());
    }

    if results.is_empty() {
        print_status(Status::Warning, "No results found.");
        return Ok(());
    }

    print_section(&format!("{} results", results.len()));
    println!("{}", ui::results_table(results));
    Ok(())
}

async fn enrich(
    registry: &ProviderRegistry,
    config: &Config,
    path: &Path,
    strategy: Option<UpdateStrategy>,
    auto: Option<AutoPolicy>,
    index: Option<usize>,
    quiet: bool,
) -> Result<BatchReport> {
    let library = JsonLibrary::load(path)
        .with_context(|| format!("Failed to load library {}", path.display()))?;

    let prompt = PromptSelector;
    let auto_selector = auto.map(AutoSelector::new);
    let selector: &dyn kentridge::engine::SelectionSurface = match &auto_selector {
        Some(selector) => selector,
        None => &prompt,
    };
    let reporter = ConsoleReporter::new(quiet);

    let mut workflow = BatchWorkflow::new(registry, config, selector, &reporter);
    if let Some(strategy) = strategy {
        workflow = workflow.with_strategy(strategy);
    }
    tracing::debug!("Using {} strategy", workflow.strategy());

    let report = match index {
        Some(index) => {
            let mut record = library
                .record(index)
                .with_context(|| format!("No record at index {}", index))?;
            workflow.run_single(&mut record).await
        }
        None => {
            let mut records = library.records()?;
            workflow.run(&mut records).await
        }
    };

    Ok(report)
}

fn print_report(report: &BatchReport, output: OutputFormat) -> Result<()> {
    let applied = report.count(RecordState::Applied);
    let skipped = report.count(RecordState::Skipped);
    let failed = report.failed_titles.len() + report.count(RecordState::FailedSave);

    if output == OutputFormat::Json {
        let summary = serde_json::json!({
            "records": report.states.len(),
            "applied": applied,
            "skipped": skipped,
            "failed": failed,
            "aborted": report.aborted,
            "failedTitles": report.failed_titles,
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    print_section("Summary");
    println!(
        "{} applied, {} skipped, {} failed",
        applied.to_string().green(),
        skipped.to_string().yellow(),
        failed.to_string().red()
    );
    if report.aborted {
        print_status(Status::Skipped, "Batch aborted");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_version() {
        let version = env!("CARGO_PKG_VERSION");
        let parts: Vec<&str> = version.split('.').collect();
        assert!(parts.len() >= 2);
        assert!(parts[0].parse::<u32>().is_ok());
    }

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::parse_from(["kentridge", "providers"]);
        assert_eq!(cli.verbose, 0);
        assert!(!cli.quiet);
        assert_eq!(cli.output, OutputFormat::Auto);
        assert_eq!(cli.log_format, LogFormat::Text);
        assert!(cli.config.is_none());
        assert!(matches!(cli.command, Commands::Providers));
    }

    #[test]
    fn test_cli_verbose_flag() {
        let cli = Cli::parse_from(["kentridge", "-v", "providers"]);
        assert_eq!(cli.verbose, 1);

        let cli = Cli::parse_from(["kentridge", "-vv", "providers"]);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_cli_output_format() {
        let cli = Cli::parse_from(["kentridge", "-o", "json", "config"]);
        assert_eq!(cli.output, OutputFormat::Json);
        assert_eq!(OutputFormat::Json.resolve(), OutputFormat::Json);
        assert_eq!(OutputFormat::Table.resolve(), OutputFormat::Table);
    }

    #[test]
    fn test_cli_search() {
        let cli = Cli::parse_from(["kentridge", "search", "Deep Learning"]);
        match cli.command {
            Commands::Search { title } => assert_eq!(title, "Deep Learning"),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_cli_enrich() {
        let cli = Cli::parse_from([
            "kentridge",
            "enrich",
            "library.json",
            "--strategy",
            "replace",
            "--auto",
            "first",
            "--index",
            "2",
        ]);
        match cli.command {
            Commands::Enrich {
                library,
                strategy,
                auto,
                index,
            } => {
                assert_eq!(library, PathBuf::from("library.json"));
                assert_eq!(strategy, Some(UpdateStrategy::Replace));
                assert_eq!(auto, Some(AutoPolicy::First));
                assert_eq!(index, Some(2));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_cli_rejects_unknown_strategy() {
        let result = Cli::try_parse_from(["kentridge", "enrich", "lib.json", "--strategy", "merge"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_log_format() {
        let cli = Cli::parse_from(["kentridge", "--log-format", "json", "config"]);
        assert_eq!(cli.log_format, LogFormat::Json);
    }
}
