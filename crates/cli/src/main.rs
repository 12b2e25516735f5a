//! Process entry point.
//!
//! `invoke` reads an invocation envelope (file or stdin), runs the
//! pipeline, and prints the response. `doctor` runs only the configure
//! phase and reports per-channel status.

use {
    anyhow::Context,
    clap::{Parser, Subcommand},
    formgate_handler::{App, Capabilities, DoctorStatus},
    std::{io::Read, path::PathBuf},
    tracing::info,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "formgate", about = "Formgate — contact-form fan-out handler")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Process one invocation envelope and print the response (default).
    Invoke {
        /// Envelope JSON file; stdin when omitted.
        #[arg(long)]
        event: Option<PathBuf>,
    },
    /// Validate channel configuration without serving a request.
    Doctor,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    info!(version = env!("CARGO_PKG_VERSION"), "formgate starting");

    match cli.command.unwrap_or(Commands::Invoke { event: None }) {
        Commands::Invoke { event } => invoke(event).await,
        Commands::Doctor => doctor().await,
    }
}

async fn invoke(event: Option<PathBuf>) -> anyhow::Result<()> {
    let raw = match event {
        Some(path) => std::fs::read_to_string(&path)
            .with_context(|| format!("reading event file {}", path.display()))?,
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("reading event from stdin")?;
            buffer
        },
    };
    let envelope = serde_json::from_str(&raw).context("parsing event JSON")?;

    // Failure responses are data for the caller, not process errors, so
    // the exit code stays zero either way.
    let response = formgate_handler::handle_event(envelope, Capabilities::noop()).await;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

async fn doctor() -> anyhow::Result<()> {
    let reports = App::new(Capabilities::noop()).doctor().await;
    let mut failures = 0usize;
    for report in &reports {
        match &report.status {
            DoctorStatus::Ok { enabled: true } => println!("{:<12} ok (enabled)", report.channel),
            DoctorStatus::Ok { enabled: false } => println!("{:<12} disabled", report.channel),
            DoctorStatus::Error(error) => {
                failures += 1;
                println!("{:<12} error: {error}", report.channel);
            },
        }
    }
    if failures > 0 {
        anyhow::bail!("{failures} channel(s) failed configuration");
    }
    Ok(())
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(false).with_thread_ids(false))
            .init();
    }
}
