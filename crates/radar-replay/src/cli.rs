use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use radar_bridge::BridgeConfig;
use radar_bridge::message::MESSAGE_TYPES;
use radar_bridge::notification::timestamp;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use crate::error::{ReplayError, Result};
use crate::replay::{ReplayOptions, Replayer};

#[derive(Debug, Parser)]
#[command(
    name = "radar-replay",
    about = "Replay host messages and UI actions through the radar overlay bridge",
    version
)]
pub struct Cli {
    /// Emit logs as JSON on stderr.
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run a JSONL script and print outbound host calls.
    Run(RunArgs),

    /// Load, validate and print a bridge configuration.
    #[command(name = "check-config")]
    CheckConfig(CheckConfigArgs),

    /// Print every inbound message type.
    #[command(name = "message-types")]
    MessageTypes,
}

#[derive(Debug, Clone, Args)]
pub struct RunArgs {
    /// Script path, or `-` for stdin.
    pub script: PathBuf,

    /// Bridge configuration (TOML, or JSON by `.json` extension).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Stop at the first undecodable line.
    #[arg(long)]
    pub strict: bool,

    /// Also print native notification banners.
    #[arg(long)]
    pub banners: bool,

    /// Print the final overlay state after the script.
    #[arg(long)]
    pub dump_state: bool,

    /// Stamp saved readings with the Unix epoch instead of the local time.
    #[arg(long)]
    pub frozen_clock: bool,

    /// Also POST every outbound call to the configured host resource.
    #[cfg(feature = "http")]
    #[arg(long)]
    pub post: bool,
}

#[derive(Debug, Clone, Args)]
pub struct CheckConfigArgs {
    pub path: PathBuf,
}

pub fn run_from_env() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);
    let stdout = io::stdout();
    let mut out = stdout.lock();
    run(cli, &mut out)
}

pub fn run<W: Write>(cli: Cli, out: &mut W) -> Result<()> {
    match cli.command {
        Commands::Run(args) => run_script(&args, out),
        Commands::CheckConfig(args) => {
            let config = BridgeConfig::load(&args.path)?;
            serde_json::to_writer_pretty(&mut *out, &config)?;
            writeln!(out)?;
            Ok(())
        }
        Commands::MessageTypes => {
            for kind in MESSAGE_TYPES {
                writeln!(out, "{kind}")?;
            }
            Ok(())
        }
    }
}

fn run_script<W: Write>(args: &RunArgs, out: &mut W) -> Result<()> {
    let config = match &args.config {
        Some(path) => BridgeConfig::load(path)?,
        None => BridgeConfig::default(),
    };
    let options = ReplayOptions {
        strict: args.strict,
        banners: args.banners,
    };
    let mut replayer = Replayer::new(&config, options);
    if args.frozen_clock {
        replayer = replayer.with_timestamp_source(epoch_timestamp);
    }
    #[cfg(feature = "http")]
    if args.post {
        let sink = radar_bridge::HttpHostSink::start(config.resource.clone(), config.http_queue_capacity)?;
        replayer = replayer.forward_to(Box::new(sink));
    }

    let input = open_script(&args.script)?;
    replayer.run(input, out)?;
    if args.dump_state {
        replayer.dump_state(out)?;
    }
    Ok(())
}

fn open_script(path: &Path) -> Result<Box<dyn BufRead>> {
    if path.as_os_str() == "-" {
        return Ok(Box::new(BufReader::new(io::stdin())));
    }
    if !path.exists() {
        return Err(ReplayError::MissingScript {
            path: path.to_path_buf(),
        });
    }
    Ok(Box::new(BufReader::new(File::open(path)?)))
}

fn epoch_timestamp() -> String {
    timestamp(&DateTime::<Utc>::UNIX_EPOCH)
}

/// Install the stderr subscriber; `RUST_LOG` overrides the `warn` default.
pub fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let registry = tracing_subscriber::registry().with(filter);
    let installed = if json {
        registry
            .with(fmt::layer().json().with_writer(io::stderr))
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_writer(io::stderr))
            .try_init()
    };
    if let Err(error) = installed {
        eprintln!("tracing subscriber not installed: {error}");
    }
}
