use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use hellocrab::capture::{
    CaptureSession, DEFAULT_SNAPLEN, LiveSession, ReplaySession, SessionConfig, list_devices,
};
use hellocrab::filter::client_hello_filter;
use hellocrab::logging::init_logging;
use hellocrab::sniffer::Sniffer;
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use tracing::level_filters::LevelFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Prints one line per TLS ClientHello seen on an interface")]
struct Cli {
    /// Append logs to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Default log level; RUST_LOG overrides it
    #[arg(long, global = true, default_value = "info")]
    log_level: LevelFilter,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List capture devices that have an address
    #[command(alias = "l")]
    List,
    /// Capture ClientHello segments on a device
    #[command(alias = "r")]
    Run {
        /// Interface to capture on
        device: String,
        /// BPF expression to install instead of the ClientHello filter
        #[arg(long)]
        filter: Option<String>,
        #[arg(long, default_value_t = DEFAULT_SNAPLEN)]
        snaplen: i32,
        #[arg(long)]
        promisc: bool,
        /// Read timeout; without it reads block until a frame arrives
        #[arg(long)]
        timeout_ms: Option<u64>,
    },
    /// Run the same pipeline over a pcap or pcapng file
    Replay {
        file: PathBuf,
        #[arg(long, conflicts_with = "no_filter")]
        filter: Option<String>,
        /// Decode every Ethernet frame in the file
        #[arg(long)]
        no_filter: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let _guard = init_logging(cli.log_file.as_deref(), cli.log_level)
        .context("Failed to initialise logging")?;

    match cli.command {
        Command::List => list_command(),
        Command::Run {
            device,
            filter,
            snaplen,
            promisc,
            timeout_ms,
        } => {
            let mut config = SessionConfig::new(device)?;
            config.snaplen = snaplen;
            config.promiscuous = promisc;
            config.read_timeout = timeout_ms.map(Duration::from_millis);
            run_command(&config, filter.unwrap_or_else(client_hello_filter))
        }
        Command::Replay {
            file,
            filter,
            no_filter,
        } => {
            let filter = (!no_filter).then(|| filter.unwrap_or_else(client_hello_filter));
            replay_command(&file, filter.as_deref())
        }
    }
}

fn list_command() -> Result<()> {
    let devices = list_devices().context("Failed to list capture devices")?;
    if devices.is_empty() {
        println!("No devices found");
        return Ok(());
    }
    for device in devices {
        println!("{device}");
    }
    Ok(())
}

fn run_command(config: &SessionConfig, filter: String) -> Result<()> {
    let mut session = LiveSession::open(config)
        .with_context(|| format!("Failed to open capture on {}", config.device))?;
    session
        .install_filter(&filter)
        .with_context(|| format!("Failed to install filter {filter:?}"))?;
    info!(interface = %config.device, filter = %filter, "Sniffing");

    Sniffer::new(session, io::stdout().lock()).run()?;
    Ok(())
}

fn replay_command(file: &std::path::Path, filter: Option<&str>) -> Result<()> {
    let mut session = ReplaySession::open(file)
        .with_context(|| format!("Failed to open capture file {file:?}"))?;
    if let Some(filter) = filter {
        session
            .install_filter(filter)
            .with_context(|| format!("Failed to install filter {filter:?}"))?;
    }
    info!(path = ?file, filter = ?filter, "Replaying");

    Sniffer::new(session, io::stdout().lock()).run()?;
    Ok(())
}
