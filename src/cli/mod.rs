//! Command-line interface: echo responders, probers, single trials and loss sweeps

use crate::logging::LogFormat;
use crate::types::ProtocolSelection;
use clap::{Args, Parser, Subcommand};

/// Loss Latency - measure TCP/UDP echo round-trip latency under packet loss
#[derive(Parser, Debug, Clone)]
#[command(name = "losslat")]
#[command(version, about, long_about = None)]
#[command(after_long_help = crate::config::EnvManager::env_help())]
pub struct Cli {
    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Enable debug output (build info, per-probe log entries)
    #[arg(long, global = true)]
    pub debug: bool,

    /// Log line format on stderr
    #[arg(long, global = true, value_enum, value_name = "FORMAT")]
    pub log_format: Option<LogFormat>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the UDP echo responder
    UdpServer(UdpServerArgs),

    /// Run the TCP echo responder
    TcpServer(TcpServerArgs),

    /// Probe a UDP echo responder and print RTT statistics
    UdpClient(ClientArgs),

    /// Probe a TCP echo responder and print RTT statistics
    TcpClient(ClientArgs),

    /// Run one trial on the loopback interface and print the trial report
    Trial(TrialArgs),

    /// Run trials across loss levels and collect the P99 curve
    Sweep(SweepArgs),
}

/// Options shared by both responders
#[derive(Args, Debug, Clone)]
pub struct ServerArgs {
    /// Bind host
    #[arg(long, default_value = crate::defaults::DEFAULT_BIND_HOST)]
    pub host: String,

    /// Bind port [default: 9000]
    #[arg(long)]
    pub port: Option<u16>,

    /// Suppress per-echo log lines
    #[arg(long)]
    pub quiet: bool,
}

#[derive(Args, Debug, Clone)]
pub struct UdpServerArgs {
    #[command(flatten)]
    pub server: ServerArgs,

    /// Receive buffer size in bytes
    #[arg(long, default_value_t = crate::defaults::DEFAULT_UDP_BUF_SIZE)]
    pub buf: usize,
}

#[derive(Args, Debug, Clone)]
pub struct TcpServerArgs {
    #[command(flatten)]
    pub server: ServerArgs,

    /// Echo frame size in bytes [default: 8]
    #[arg(long)]
    pub size: Option<usize>,
}

/// Prober options
#[derive(Args, Debug, Clone)]
pub struct ClientArgs {
    /// Responder host
    #[arg(long)]
    pub host: String,

    /// Responder port [default: 9000]
    #[arg(long)]
    pub port: Option<u16>,

    /// Number of probes [default: 20]
    #[arg(long)]
    pub count: Option<u32>,

    /// Pause between probes in milliseconds [default: 50]
    #[arg(long)]
    pub interval_ms: Option<f64>,

    /// Per-probe timeout in seconds [default: 1.0]
    #[arg(long)]
    pub timeout: Option<f64>,

    /// Payload size in bytes [default: 8]
    #[arg(long)]
    pub size: Option<usize>,

    /// Print one line per probe before the summary
    #[arg(long)]
    pub verbose: bool,
}

/// Probe settings of a trial, shared by `trial` and `sweep`
#[derive(Args, Debug, Clone)]
pub struct TrialSettingsArgs {
    /// Number of probes per protocol
    #[arg(long)]
    pub count: Option<u32>,

    /// Pause between probes in milliseconds
    #[arg(long)]
    pub interval_ms: Option<f64>,

    /// Per-probe timeout in seconds [default: 1.0]
    #[arg(long)]
    pub timeout: Option<f64>,

    /// Echo port [default: 9000]
    #[arg(long)]
    pub port: Option<u16>,

    /// TCP payload size in bytes [default: 8]
    #[arg(long)]
    pub tcp_size: Option<usize>,
}

#[derive(Args, Debug, Clone)]
pub struct TrialArgs {
    /// Loss level in percent recorded for this trial
    #[arg(long, default_value_t = 0.0)]
    pub loss: f64,

    /// Protocols to probe
    #[arg(long, value_enum, default_value_t = ProtocolSelection::Both)]
    pub protocol: ProtocolSelection,

    /// Print one line per probe before each summary
    #[arg(long)]
    pub client_verbose: bool,

    #[command(flatten)]
    pub settings: TrialSettingsArgs,
}

#[derive(Args, Debug, Clone)]
pub struct SweepArgs {
    /// Loss levels in percent, space- or comma-separated [default: "1 3 6"]
    #[arg(long, value_name = "LEVELS")]
    pub loss_levels: Option<String>,

    /// Measurement harness command line [default: "python3 scripts/mn_latency.py"]
    #[arg(long, value_name = "CMD", conflicts_with = "loopback")]
    pub harness_cmd: Option<String>,

    /// Run trials in-process on the loopback interface (loss is not emulated)
    #[arg(long)]
    pub loopback: bool,

    /// Where to write the sweep series as JSON [default: plots/loss_sweep_p99.json]
    #[arg(long, value_name = "PATH")]
    pub output: Option<String>,

    #[command(flatten)]
    pub settings: TrialSettingsArgs,
}

impl Cli {
    /// Check if colors should be enabled
    pub fn use_colors(&self) -> bool {
        !self.no_color && supports_color()
    }

    /// Whether the subcommand asked for verbose output
    pub fn is_verbose(&self) -> bool {
        match &self.command {
            Command::UdpClient(args) | Command::TcpClient(args) => args.verbose,
            Command::Trial(args) => args.client_verbose,
            _ => false,
        }
    }
}

/// Check if the terminal supports color output
fn supports_color() -> bool {
    if let Ok(term) = std::env::var("TERM") {
        if term == "dumb" {
            return false;
        }
    }

    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }

    true
}
