//! dx-core CLI entry point.
//!
//! Exports a comprehensive report from a recorded dashboard session,
//! validates configuration, and shows the effective settings.

use clap::{Args, Parser, Subcommand};
use dx_common::Error;
use dx_config::{load_config, ExportConfig, LoadedConfig};
use dx_core::exit_codes::ExitCode;
use dx_core::export::{ComprehensiveExporter, ExportRequest};
use dx_core::logging::{event_names, init_logging, LogConfig, LogFormat, LogLevel, Stage};
use dx_core::recorded::RecordedApp;
use dx_report::Logo;
use std::path::PathBuf;
use tracing::info;

/// Comprehensive report export engine
#[derive(Parser, Debug)]
#[command(name = "dx-core")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Export configuration file (TOML or JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long, global = true, value_enum)]
    log_level: Option<LogLevel>,

    /// Log format (human, jsonl)
    #[arg(long, global = true, value_enum)]
    log_format: Option<LogFormat>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Export the comprehensive report
    Export(ExportArgs),

    /// Validate the export configuration
    Check,

    /// Configuration commands
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Print version information
    Version,
}

#[derive(Args, Debug)]
struct ExportArgs {
    /// Recorded dashboard session (JSON)
    #[arg(long)]
    app: PathBuf,

    /// Output directory (overrides the configured one)
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Division name (overrides the dashboard's)
    #[arg(long)]
    division: Option<String>,

    /// Brand logo embedded in the header
    #[arg(long)]
    logo: Option<PathBuf>,

    /// Chart library file, tried before the configured locations (repeatable)
    #[arg(long = "bundle")]
    bundles: Vec<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Print the effective configuration as JSON
    Show,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    init_logging(&LogConfig::from_env(
        cli.global.log_level,
        cli.global.log_format,
    ));

    let code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {}", e.user_message());
            eprintln!("hint: {}", e.remediation());
            ExitCode::from(&e)
        }
    };
    std::process::exit(code.as_i32());
}

async fn run(cli: Cli) -> Result<ExitCode, Error> {
    match cli.command {
        Commands::Version => {
            println!("dx-core {}", env!("CARGO_PKG_VERSION"));
            Ok(ExitCode::Clean)
        }
        Commands::Check => {
            let loaded = load(&cli.global)?;
            let location = loaded
                .path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "built-in defaults".to_string());
            println!(
                "config OK: {} ({}), {} views, {} style concepts",
                location,
                loaded.source,
                loaded.config.views.len(),
                loaded.config.styles.len()
            );
            Ok(ExitCode::Clean)
        }
        Commands::Config {
            command: ConfigCommands::Show,
        } => {
            let loaded = load(&cli.global)?;
            println!("{}", loaded.config.to_json_pretty()?);
            Ok(ExitCode::Clean)
        }
        Commands::Export(args) => {
            let loaded = load(&cli.global)?;
            export(loaded.config, args).await
        }
    }
}

fn load(global: &GlobalOpts) -> Result<LoadedConfig, Error> {
    let loaded = load_config(global.config.as_deref())?;
    info!(
        event = if loaded.path.is_some() {
            event_names::CONFIG_LOADED
        } else {
            event_names::CONFIG_DEFAULT_USED
        },
        stage = %Stage::Init,
        source = %loaded.source,
        "Configuration ready"
    );
    Ok(loaded)
}

async fn export(config: ExportConfig, args: ExportArgs) -> Result<ExitCode, Error> {
    let app = RecordedApp::from_path(&args.app)?;
    let logo = args.logo.as_deref().map(Logo::from_path).transpose()?;
    let request = ExportRequest {
        out_dir: args.out_dir,
        division: args.division,
        logo,
        extra_bundle_paths: args.bundles,
        ..ExportRequest::default()
    };

    let exporter = ComprehensiveExporter::new(config)?;
    let summary = exporter.export(&app, &request).await?;
    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(if summary.placeholders == 0 {
        ExitCode::Clean
    } else {
        ExitCode::Degraded
    })
}
