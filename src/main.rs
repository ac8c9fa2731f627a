//! Loss Latency - Main CLI Application
//!
//! Echo responders, RTT probers, single loopback trials and loss sweeps.

use clap::Parser;
use loss_latency::{
    cli::Cli,
    config::{display_config_summary, load_config, AppConfig, CommandConfig},
    error::{ErrorReporter, Result},
    harness::{CommandHarness, LoopbackHarness, MeasurementHarness, TrialRequest},
    logging::LoggerFactory,
    models::{HarnessKind, ProbeConfig, ResponderConfig, SweepConfig, TrialSettings},
    output::{self, SweepFormatter},
    prober::RttProber,
    responder::{TcpEchoResponder, UdpEchoResponder},
    sweep::SweepAggregator,
    types::{Protocol, ProtocolSelection},
    VERSION, PKG_NAME,
};
use std::process;

#[tokio::main]
async fn main() {
    // Set up better panic handling
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Application panic: {}", panic_info);
        process::exit(99);
    }));

    let cli = Cli::parse();
    let reporter = ErrorReporter::new(cli.use_colors(), cli.debug);

    if let Err(e) = run_application(cli).await {
        reporter.report_error(&e);
        process::exit(e.exit_code());
    }
}

/// Main application logic
async fn run_application(cli: Cli) -> Result<()> {
    if cli.debug {
        eprintln!(
            "{} v{} (commit {}, built {})",
            PKG_NAME,
            VERSION,
            env!("GIT_COMMIT"),
            env!("BUILD_TIME")
        );
    }

    let config = load_config(cli)?;
    if config.global.debug {
        eprintln!("{}", display_config_summary(&config));
        eprintln!();
    }

    let factory = LoggerFactory::new(config.global.clone());
    let AppConfig { global, command } = config;

    let result = match command {
        CommandConfig::Responder { protocol, config } => run_responder(&factory, protocol, &config).await,
        CommandConfig::Probe { protocol, config } => run_probe(&factory, protocol, config).await,
        CommandConfig::Trial {
            loss_pct,
            protocols,
            settings,
            verbose,
        } => run_trial(&factory, loss_pct, protocols, settings, verbose).await,
        CommandConfig::Sweep(sweep) => run_sweep(&factory, &sweep, global.enable_color).await,
    };

    if let (Err(e), true) = (&result, global.debug) {
        factory
            .create_error_logger()
            .log_error(e, Some("command failed"), Some(factory.session_id()))
            .await;
    }
    result
}

/// Serve until Ctrl-C
async fn run_responder(factory: &LoggerFactory, protocol: Protocol, config: &ResponderConfig) -> Result<()> {
    let logger = factory.create_responder_logger(config.quiet).await;
    let shutdown = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    match protocol {
        Protocol::Udp => UdpEchoResponder::bind(config, logger).await?.serve_until(shutdown).await,
        Protocol::Tcp => TcpEchoResponder::bind(config, logger).await?.serve_until(shutdown).await,
    }
}

/// Probe once and print the run report; zero successes fail after the counts are shown
async fn run_probe(factory: &LoggerFactory, protocol: Protocol, config: ProbeConfig) -> Result<()> {
    let verbose = config.verbose;
    let prober = RttProber::new(config, factory.create_probe_logger().await)?;
    let run = prober.collect(protocol).await?;

    println!("{}", output::render_run(&run, verbose));
    run.finish()?;
    Ok(())
}

async fn run_trial(
    factory: &LoggerFactory,
    loss_pct: f64,
    protocols: ProtocolSelection,
    settings: TrialSettings,
    verbose: bool,
) -> Result<()> {
    let harness = LoopbackHarness::new(factory.config().clone());
    let request = TrialRequest {
        loss_pct,
        protocols,
        settings,
        client_verbose: verbose,
    };

    let runs = harness.run_protocols(&request).await?;
    println!("{}", output::render_trial(&runs, verbose));

    for run in runs {
        run.finish()?;
    }
    Ok(())
}

async fn run_sweep(factory: &LoggerFactory, config: &SweepConfig, enable_color: bool) -> Result<()> {
    let harness: Box<dyn MeasurementHarness> = match &config.harness {
        HarnessKind::Loopback => Box::new(LoopbackHarness::new(factory.config().clone())),
        HarnessKind::Command { .. } => Box::new(CommandHarness::from_config(config)?),
    };

    let aggregator = SweepAggregator::new(harness, factory.create_sweep_logger().await);
    let sweep = aggregator.run(&config.loss_levels, &config.trial).await?;

    println!("{}", SweepFormatter::new(enable_color).format_table(&sweep)?);
    let path = output::export_json(&sweep, &config.output_path)?;
    println!("{}", output::saved_line(&path));
    Ok(())
}
