use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use thiserror::Error;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use streamck::pass::PassId;
use streamck::pipeline::{run_pipeline, BuildSession, CheckOptions};
use streamck::{Event, Report, SchemaViolation, WorklistOrder};

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum EmitStage {
    /// JSON report (status, errors, types, graph)
    Report,
    /// Graphviz rendering of the propagated graph
    Dot,
    /// Human-readable summary
    Summary,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum Order {
    Lifo,
    Fifo,
}

impl From<Order> for WorklistOrder {
    fn from(order: Order) -> Self {
        match order {
            Order::Lifo => WorklistOrder::Lifo,
            Order::Fifo => WorklistOrder::Fifo,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "streamck",
    version,
    about = "Stream type checker: verifies one consistent type flows through every stream"
)]
struct Cli {
    /// Scanner event file (JSON array of declare/invoke events)
    events: PathBuf,

    /// Output file path (`-` for stdout)
    #[arg(short, long, default_value = "streams_types.json")]
    output: PathBuf,

    /// Output stage
    #[arg(long, value_enum, default_value_t = EmitStage::Report)]
    emit: EmitStage,

    /// Propagation worklist discipline
    #[arg(long, value_enum, default_value_t = Order::Lifo)]
    order: Order,

    /// Log every phase at debug level
    #[arg(long)]
    verbose: bool,
}

#[derive(Debug, Error)]
enum CliError {
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{}: malformed event file: {source}", path.display())]
    Events {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("cannot serialize report: {0}")]
    Report(#[from] serde_json::Error),

    #[error("scanner protocol violation: {0}")]
    Schema(#[from] SchemaViolation),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("streamck={}", default_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            eprintln!("streamck: error: {}", e);
            ExitCode::from(2)
        }
    }
}

/// Returns whether the checked program is consistent.
fn run(cli: &Cli) -> Result<bool, CliError> {
    let events = read_events(&cli.events)?;
    debug!(events = events.len(), source = %cli.events.display(), "loaded events");

    let mut session = BuildSession::new(CheckOptions {
        order: cli.order.into(),
    });
    let terminal = match cli.emit {
        EmitStage::Dot => PassId::Propagate,
        EmitStage::Report | EmitStage::Summary => PassId::Verify,
    };
    run_pipeline(&mut session, events, terminal, |_, diags| {
        for diag in diags {
            eprintln!("streamck: {}", diag);
        }
    })?;

    let text = match cli.emit {
        EmitStage::Dot => streamck::dot::emit_dot(&session.graph),
        EmitStage::Report => Report::assemble(&session).to_json()? + "\n",
        EmitStage::Summary => Report::assemble(&session).to_string(),
    };
    write_output(&cli.output, &text)?;

    if let Some(stats) = session.propagation {
        debug!(
            iterations = stats.iterations,
            additions = stats.additions,
            "propagation converged"
        );
    }
    info!(status = %session.status, streams = session.graph.len(), "check finished");

    Ok(matches!(cli.emit, EmitStage::Dot) || session.diagnostics.is_empty())
}

fn read_events(path: &Path) -> Result<Vec<Event>, CliError> {
    let text = std::fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| CliError::Events {
        path: path.to_path_buf(),
        source,
    })
}

fn write_output(path: &Path, text: &str) -> Result<(), CliError> {
    if path.as_os_str() == "-" {
        print!("{}", text);
        return Ok(());
    }
    std::fs::write(path, text).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })
}
