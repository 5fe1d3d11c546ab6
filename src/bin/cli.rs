use clap::error::ErrorKind;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use provena::{render_json, render_terminal, AuditDocument, AuditLog, VERSION};

#[derive(Parser)]
#[command(name = "provena")]
#[command(about = "Provena - Audit trail system for data transformations")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a report from an exported audit trail
    Report {
        /// Audit trail JSON file
        json_file: PathBuf,

        /// Output format
        #[arg(long, value_enum, default_value = "terminal", env = "PROVENA_REPORT_FORMAT")]
        format: ReportFormat,

        /// Write the report to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show version
    Version,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ReportFormat {
    Terminal,
    Json,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => match e.kind() {
            ErrorKind::InvalidSubcommand | ErrorKind::UnknownArgument => {
                print_usage();
                return ExitCode::SUCCESS;
            }
            _ => e.exit(),
        },
    };

    let filter = if cli.verbose {
        EnvFilter::new("provena=debug,info")
    } else {
        EnvFilter::new("provena=info,warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("\x1b[31m✗ Error:\x1b[0m {}", e);
            ExitCode::FAILURE
        }
    }
}

fn print_usage() {
    let mut command = Cli::command();
    let _ = command.print_help();
    println!();
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let Some(command) = cli.command else {
        print_usage();
        return Ok(());
    };

    match command {
        Commands::Version => {
            println!("provena v{}", VERSION);
        }

        Commands::Report { json_file, format, output } => {
            cmd_report(&json_file, format, output)?;
        }
    }

    Ok(())
}

fn cmd_report(
    json_file: &Path,
    format: ReportFormat,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let document = AuditDocument::load(json_file)?;
    debug!(
        "Loaded {} steps for pipeline {} (written by provena {})",
        document.audit_trail.len(),
        document.pipeline,
        document.provena_version
    );

    let log = AuditLog::from_document(document);

    if output.is_some() || !std::io::stdout().is_terminal() {
        colored::control::set_override(false);
    }

    let rendered = match format {
        ReportFormat::Terminal => render_terminal(&log),
        ReportFormat::Json => render_json(&log)?,
    };

    match output {
        Some(path) => {
            fs::write(&path, &rendered)?;
            info!("Report written to {}", path.display());
        }
        None => println!("{}", rendered),
    }

    Ok(())
}
