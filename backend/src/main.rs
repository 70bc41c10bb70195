//! Survey Results CLI - render stored survey responses
//!
//! # Main Commands
//!
//! ```bash
//! survey-results render rows.json --format column-csv --columns urn:ohmage:special:all
//! survey-results data-points rows.csv --sort      # Legacy data-point JSON
//! ```
//!
//! # Debug Commands (for development)
//!
//! ```bash
//! survey-results group rows.json                  # Show grouped survey instances
//! survey-results columns                          # Show the column catalog
//! survey-results utc "2012-01-01 00:00:00" America/Los_Angeles
//! ```

use clap::{Parser, Subcommand};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use survey_results::logs::{init_logging, log_error, log_info};
use survey_results::{
    load_rows_file, to_utc, CampaignIdentity, DataPointOptions, EngineConfig, OutputFormat, RenderRequest,
    ResultComposer, SPECIAL_ALL,
};

#[derive(Parser)]
#[command(name = "survey-results")]
#[command(about = "Compose survey responses into JSON or CSV result documents", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render rows as row-json, column-json or column-csv
    Render {
        /// Input rows (.csv or JSON array)
        input: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "column-json")]
        format: OutputFormat,

        /// Comma-separated column tokens
        #[arg(short, long, value_delimiter = ',', default_value = SPECIAL_ALL)]
        columns: Vec<String>,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,

        /// Append the row id to each row-json record
        #[arg(long)]
        row_id: bool,

        /// Drop duplicate row-json records
        #[arg(long)]
        collapse: bool,

        /// Omit the commented CSV preamble
        #[arg(long)]
        suppress_metadata: bool,

        /// Abbreviated CSV header names
        #[arg(long)]
        short_headers: bool,

        /// Fail when rows of one survey instance are not contiguous
        #[arg(long)]
        strict_order: bool,

        /// Campaign URN (overrides the environment)
        #[arg(long)]
        campaign_urn: Option<String>,

        /// Campaign name (overrides the environment)
        #[arg(long)]
        campaign_name: Option<String>,

        /// Campaign version (overrides the environment)
        #[arg(long)]
        campaign_version: Option<String>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Legacy per-row output with attached metadata
    DataPoints {
        /// Input rows (.csv or JSON array)
        input: PathBuf,

        /// Sort rows by survey id, UTC timestamp and display type first
        #[arg(long)]
        sort: bool,

        /// Fail when groups are not contiguous
        #[arg(long)]
        strict_order: bool,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Group rows into survey instances and print them as JSON
    Group {
        /// Input rows (.csv or JSON array)
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show the configured column catalog
    Columns,

    /// Convert a local timestamp to UTC
    Utc {
        /// Local timestamp, YYYY-MM-DD HH:MM:SS
        timestamp: String,

        /// IANA zone id
        zone: String,
    },
}

fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();
    init_logging("info");

    let cli = Cli::parse();

    let result = match EngineConfig::from_env() {
        Ok(config) => run(cli.command, &config),
        Err(e) => Err(e.into()),
    };

    if let Err(e) = result {
        log_error(format!("Error: {}", e));
        std::process::exit(1);
    }
}

fn run(command: Commands, config: &EngineConfig) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Render {
            input,
            format,
            columns,
            pretty,
            row_id,
            collapse,
            suppress_metadata,
            short_headers,
            strict_order,
            campaign_urn,
            campaign_name,
            campaign_version,
            output,
        } => {
            let mut request = RenderRequest::from_config(config, format, columns);
            request.pretty_print |= pretty;
            request.strict_order |= strict_order;
            request.include_row_id = row_id;
            request.collapse = collapse;
            request.suppress_metadata = suppress_metadata;
            request.short_headers = short_headers;
            request.campaign = CampaignIdentity {
                urn: campaign_urn.or(request.campaign.urn),
                name: campaign_name.or(request.campaign.name),
                version: campaign_version.or(request.campaign.version),
            };
            cmd_render(&input, config, &request, output.as_deref())
        }

        Commands::DataPoints {
            input,
            sort,
            strict_order,
            pretty,
            output,
        } => {
            let options = DataPointOptions {
                sort,
                strict_order: strict_order || config.strict_order,
                pretty_print: pretty || config.pretty_print,
            };
            cmd_data_points(&input, config, options, output.as_deref())
        }

        Commands::Group { input, output } => cmd_group(&input, config, output.as_deref()),

        Commands::Columns => cmd_columns(config),

        Commands::Utc { timestamp, zone } => {
            println!("{}", to_utc(&timestamp, &zone)?);
            Ok(())
        }
    }
}

fn cmd_render(
    input: &Path,
    config: &EngineConfig,
    request: &RenderRequest,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let loaded = load_rows_file(input)?;
    log_info(format!(
        "Loaded {} rows from {} (encoding {})",
        loaded.rows.len(),
        input.display(),
        loaded.encoding
    ));

    let composer = ResultComposer::from_config(config);
    let rendered = composer.render(&loaded.rows, request)?;
    write_output(&rendered.body, output)
}

fn cmd_data_points(
    input: &Path,
    config: &EngineConfig,
    options: DataPointOptions,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let loaded = load_rows_file(input)?;
    log_info(format!("Loaded {} rows from {}", loaded.rows.len(), input.display()));

    let rendered = ResultComposer::from_config(config).render_data_points(&loaded.rows, options)?;
    write_output(&rendered.body, output)
}

fn cmd_group(input: &Path, config: &EngineConfig, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let loaded = load_rows_file(input)?;
    log_info(format!("{} rows", loaded.rows.len()));

    let instances = ResultComposer::from_config(config).group(&loaded.rows, config.strict_order)?;
    log_info(format!("{} survey instances", instances.len()));

    let json = serde_json::to_vec_pretty(&instances)?;
    write_output(&json, output)
}

fn cmd_columns(config: &EngineConfig) -> Result<(), Box<dyn std::error::Error>> {
    for key in config.catalog.columns() {
        println!("{:<45} {}", key.urn(), key.row_key());
    }
    Ok(())
}

fn write_output(content: &[u8], path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            log_info(format!("Output written to: {}", p.display()));
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(content)?;
            if !content.ends_with(b"\n") {
                stdout.write_all(b"\n")?;
            }
        }
    }
    Ok(())
}
