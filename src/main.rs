//! Hiltest CLI - hardware-in-the-loop test runner
//!
//! Starts the device self-tests, checks the reported results and publishes
//! badges. Exit status reflects the outcome, see `hiltest exit-codes`.

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use hiltest_core::cli::exit_codes::{
    config_error_code, outcome_code, print_exit_codes, run_error_code, to_exit_code,
};
use hiltest_core::cli::{format_outcome, ExitCodes, OutputFormat as SummaryFormat};
use hiltest_core::config::HarnessConfig;
use hiltest_core::core::transport::list_ports;
use hiltest_core::{create_transport, PairingMode, ReplayConfig, TestRun, Transport};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// CLI output format
#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable text
    Text,
    /// JSON format for scripting
    Json,
}

impl From<OutputFormat> for SummaryFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Text => Self::Text,
            OutputFormat::Json => Self::Json,
        }
    }
}

/// Hiltest CLI
#[derive(Parser, Debug)]
#[command(
    name = "hiltest",
    version,
    about = "Hardware-in-the-loop test runner with status badges",
    long_about = None
)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode (warnings and errors only)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the device tests and publish badges
    Run(RunArgs),

    /// List available serial ports
    ListPorts {
        /// Show detailed info
        #[arg(short, long)]
        detailed: bool,
    },

    /// Print the exit code table
    ExitCodes,
}

#[derive(clap::Args, Debug)]
struct RunArgs {
    /// Config file (default: platform config dir / config.toml)
    #[arg(short, long, env = "HILTEST_CONFIG")]
    config: Option<PathBuf>,

    /// Serial port name (e.g., COM9, /dev/ttyACM0)
    #[arg(short, long)]
    port: Option<String>,

    /// Baud rate
    #[arg(short, long)]
    baud: Option<u32>,

    /// Expectation table (CSV with header row)
    #[arg(short, long)]
    expected: Option<PathBuf>,

    /// Badge output directory
    #[arg(long)]
    badges: Option<PathBuf>,

    /// Label for the aggregate badges
    #[arg(long)]
    label: Option<String>,

    /// Delay after opening the port before starting (ms)
    #[arg(long)]
    reset_delay: Option<u64>,

    /// Give up if the run has not finished after this many seconds
    #[arg(long)]
    max_duration: Option<u64>,

    /// Result pairing: positional or by-id
    #[arg(long)]
    pairing: Option<PairingMode>,

    /// Replay a captured device log instead of opening the port
    #[arg(long)]
    replay: Option<PathBuf>,

    /// Write a JSON run report to this file
    #[arg(long)]
    report: Option<PathBuf>,

    /// Summary format on stdout
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);

    let result = match cli.command {
        Commands::Run(args) => run(args).await,
        Commands::ListPorts { detailed } => show_ports(detailed).map(|()| ExitCodes::SUCCESS),
        Commands::ExitCodes => {
            print_exit_codes();
            Ok(ExitCodes::SUCCESS)
        }
    };

    match result {
        Ok(code) => to_exit_code(code),
        Err(e) => {
            tracing::error!("{e:#}");
            to_exit_code(ExitCodes::INTERNAL_ERROR)
        }
    }
}

fn init_logging(cli: &Cli) {
    let level = if cli.quiet {
        tracing::Level::WARN
    } else if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if cli.log_json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_config(path: Option<&Path>) -> Result<HarnessConfig, hiltest_core::ConfigError> {
    match path {
        Some(path) => HarnessConfig::load(path),
        None => HarnessConfig::load_default(),
    }
}

fn apply_overrides(config: &mut HarnessConfig, args: &RunArgs) {
    if let Some(port) = &args.port {
        config.device.port.clone_from(port);
    }
    if let Some(baud) = args.baud {
        config.device.baud_rate = baud;
    }
    if let Some(expected) = &args.expected {
        config.expectations.path.clone_from(expected);
    }
    if let Some(badges) = &args.badges {
        config.badges.output_dir.clone_from(badges);
    }
    if let Some(label) = &args.label {
        config.badges.label.clone_from(label);
    }
    if let Some(delay) = args.reset_delay {
        config.device.reset_delay_ms = delay;
    }
    if let Some(secs) = args.max_duration {
        config.run.max_duration_secs = Some(secs);
    }
    if let Some(pairing) = args.pairing {
        config.run.pairing = pairing;
    }
    if args.replay.is_some() {
        config.device.reset_delay_ms = 0;
    }
}

async fn run(args: RunArgs) -> anyhow::Result<u8> {
    let mut config = match load_config(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{e}");
            return Ok(config_error_code(&e));
        }
    };
    apply_overrides(&mut config, &args);
    if let Err(e) = config.validate() {
        tracing::error!("{e}");
        return Ok(config_error_code(&e));
    }

    let transport = match &args.replay {
        Some(capture) => Transport::Replay(ReplayConfig::from_file(capture)),
        None => Transport::Serial(config.serial_config()),
    };
    let mut link = create_transport(transport);

    let outcome = match TestRun::from_config(&config).execute(link.as_mut()).await {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!("{e}");
            return Ok(run_error_code(&e));
        }
    };

    println!("{}", format_outcome(&outcome, args.format.into()));

    if let Some(path) = &args.report {
        outcome
            .report()
            .write_to(path)
            .with_context(|| format!("writing run report to {}", path.display()))?;
    }

    Ok(outcome_code(&outcome))
}

fn show_ports(detailed: bool) -> anyhow::Result<()> {
    let ports = list_ports().context("enumerating serial ports")?;

    if ports.is_empty() {
        println!("No serial ports found.");
        return Ok(());
    }

    for port in &ports {
        if detailed {
            println!("  {} [{:?}]", port.port_name, port.port_type);
        } else {
            println!("{}", port.port_name);
        }
    }
    Ok(())
}
