//! Configuration parsing from CLI arguments and environment variables
//!
//! Layering, lowest to highest priority: built-in defaults, `.env` file,
//! `LOSSLAT_*` environment variables, command-line flags.

use crate::{
    cli::{ClientArgs, Cli, Command, ServerArgs, TrialSettingsArgs},
    config::env::EnvManager,
    error::Result,
    models::{Config, HarnessKind, ProbeConfig, ResponderConfig, SweepConfig, TrialSettings},
    types::{Protocol, ProtocolSelection},
};

/// Fully resolved settings of the selected subcommand
#[derive(Debug, Clone)]
pub enum CommandConfig {
    Responder {
        protocol: Protocol,
        config: ResponderConfig,
    },
    Probe {
        protocol: Protocol,
        config: ProbeConfig,
    },
    Trial {
        loss_pct: f64,
        protocols: ProtocolSelection,
        settings: TrialSettings,
        verbose: bool,
    },
    Sweep(SweepConfig),
}

/// Global settings plus the subcommand settings
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub global: Config,
    pub command: CommandConfig,
}

/// Configuration parser that combines CLI arguments with environment variables
pub struct ConfigParser {
    cli: Cli,
}

impl ConfigParser {
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Parse and build the complete configuration
    pub fn parse(&self) -> Result<AppConfig> {
        EnvManager::load_env_file()?;

        let mut global = Config::default();
        global.merge_from_env()?;
        self.apply_global_overrides(&mut global);

        let command = self.build_command_config()?;

        Ok(AppConfig { global, command })
    }

    fn apply_global_overrides(&self, config: &mut Config) {
        if self.cli.no_color || !self.cli.use_colors() {
            config.enable_color = false;
        }
        if let Some(format) = self.cli.log_format {
            config.log_format = format;
        }

        // CLI-only flags
        config.debug = self.cli.debug;
        config.verbose = self.cli.is_verbose();
    }

    fn build_command_config(&self) -> Result<CommandConfig> {
        match &self.cli.command {
            Command::UdpServer(args) => {
                let mut config = responder_config(&args.server)?;
                config.buf_size = args.buf;
                config.validate()?;
                Ok(CommandConfig::Responder {
                    protocol: Protocol::Udp,
                    config,
                })
            }
            Command::TcpServer(args) => {
                let mut config = responder_config(&args.server)?;
                if let Some(size) = args.size {
                    config.size = size;
                }
                config.validate()?;
                Ok(CommandConfig::Responder {
                    protocol: Protocol::Tcp,
                    config,
                })
            }
            Command::UdpClient(args) => Ok(CommandConfig::Probe {
                protocol: Protocol::Udp,
                config: probe_config(args)?,
            }),
            Command::TcpClient(args) => Ok(CommandConfig::Probe {
                protocol: Protocol::Tcp,
                config: probe_config(args)?,
            }),
            Command::Trial(args) => {
                let mut settings = TrialSettings::single_trial();
                settings.merge_from_env()?;
                apply_trial_overrides(&mut settings, &args.settings);
                settings.validate()?;

                Ok(CommandConfig::Trial {
                    loss_pct: args.loss,
                    protocols: args.protocol,
                    settings,
                    verbose: args.client_verbose,
                })
            }
            Command::Sweep(args) => {
                let mut config = SweepConfig::default();
                config.merge_from_env()?;

                if let Some(levels) = &args.loss_levels {
                    config.loss_levels = crate::sweep::parse_loss_levels(levels)?;
                }
                if let Some(command) = &args.harness_cmd {
                    config.harness = HarnessKind::from_command_line(command)?;
                }
                if args.loopback {
                    config.harness = HarnessKind::Loopback;
                }
                if let Some(output) = &args.output {
                    config.output_path = output.clone();
                }
                apply_trial_overrides(&mut config.trial, &args.settings);

                config.validate()?;
                Ok(CommandConfig::Sweep(config))
            }
        }
    }
}

fn responder_config(args: &ServerArgs) -> Result<ResponderConfig> {
    let mut config = ResponderConfig::default();
    config.merge_from_env()?;

    config.host = args.host.clone();
    if let Some(port) = args.port {
        config.port = port;
    }
    config.quiet = args.quiet;

    Ok(config)
}

fn probe_config(args: &ClientArgs) -> Result<ProbeConfig> {
    let mut config = ProbeConfig::default();
    config.merge_from_env()?;

    config.host = args.host.clone();
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(count) = args.count {
        config.count = count;
    }
    if let Some(interval_ms) = args.interval_ms {
        config.interval_ms = interval_ms;
    }
    if let Some(timeout) = args.timeout {
        config.timeout_secs = timeout;
    }
    if let Some(size) = args.size {
        config.payload_size = size;
    }
    config.verbose = args.verbose;

    config.validate()?;
    Ok(config)
}

fn apply_trial_overrides(settings: &mut TrialSettings, args: &TrialSettingsArgs) {
    if let Some(count) = args.count {
        settings.count = count;
    }
    if let Some(interval_ms) = args.interval_ms {
        settings.interval_ms = interval_ms;
    }
    if let Some(timeout) = args.timeout {
        settings.timeout_secs = timeout;
    }
    if let Some(port) = args.port {
        settings.port = port;
    }
    if let Some(tcp_size) = args.tcp_size {
        settings.tcp_size = tcp_size;
    }
}

/// Convenience function to load complete configuration from CLI arguments
pub fn load_config(cli: Cli) -> Result<AppConfig> {
    ConfigParser::new(cli).parse()
}

/// Display configuration summary for debug purposes
pub fn display_config_summary(config: &AppConfig) -> String {
    let mut summary = Vec::new();

    match &config.command {
        CommandConfig::Responder { protocol, config } => {
            summary.push(format!("Mode: {} echo responder", protocol));
            summary.push(format!("Bind: {}", config.bind_addr()));
            match protocol {
                Protocol::Udp => summary.push(format!("Receive Buffer: {} bytes", config.buf_size)),
                Protocol::Tcp => summary.push(format!("Frame Size: {} bytes", config.size)),
            }
            summary.push(format!("Quiet: {}", config.quiet));
        }
        CommandConfig::Probe { protocol, config } => {
            summary.push(format!("Mode: {} prober", protocol));
            summary.push(format!("Target: {}", config.target()));
            summary.push(format!("Probe Count: {}", config.count));
            summary.push(format!("Interval: {}ms", config.interval_ms));
            summary.push(format!("Timeout: {}s", config.timeout_secs));
            summary.push(format!("Payload Size: {} bytes", config.payload_size));
            summary.push(format!(
                "Connect Policy: {} attempts, {} backoff",
                config.connect_policy.max_attempts,
                config.connect_policy.backoff.name()
            ));
        }
        CommandConfig::Trial { loss_pct, protocols, settings, .. } => {
            summary.push(format!("Mode: loopback trial ({})", protocols.as_str()));
            summary.push(format!("Loss Level: {}%", loss_pct));
            summary.extend(trial_summary(settings));
        }
        CommandConfig::Sweep(sweep) => {
            let levels: Vec<String> = sweep.loss_levels.iter().map(|l| l.to_string()).collect();
            summary.push("Mode: loss sweep".to_string());
            summary.push(format!("Loss Levels: {}", levels.join(" ")));
            match &sweep.harness {
                HarnessKind::Loopback => summary.push("Harness: loopback".to_string()),
                HarnessKind::Command { program, args } => {
                    summary.push(format!("Harness: {} {}", program, args.join(" ")))
                }
            }
            summary.extend(trial_summary(&sweep.trial));
            summary.push(format!("Output: {}", sweep.output_path));
        }
    }

    summary.push(format!("Color Output: {}", config.global.enable_color));
    summary.push(format!("Debug: {}", config.global.debug));

    summary.join("\n")
}

fn trial_summary(settings: &TrialSettings) -> Vec<String> {
    vec![
        format!("Probe Count: {}", settings.count),
        format!("Interval: {}ms", settings.interval_ms),
        format!("Timeout: {}s", settings.timeout_secs),
        format!("Port: {}", settings.port),
        format!("TCP Payload Size: {} bytes", settings.tcp_size),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ENV_LOCK;
    use clap::Parser;
    use std::env;

    fn clear_env() {
        for (name, _, _) in EnvManager::get_supported_env_vars() {
            env::remove_var(name);
        }
    }

    fn parse(args: &[&str]) -> Result<AppConfig> {
        ConfigParser::new(Cli::parse_from(args)).parse()
    }

    #[test]
    fn test_client_defaults() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_env();

        let config = parse(&["losslat", "tcp-client", "--host", "10.0.0.2"]).unwrap();
        match config.command {
            CommandConfig::Probe { protocol, config } => {
                assert_eq!(protocol, Protocol::Tcp);
                assert_eq!(config.target(), "10.0.0.2:9000");
                assert_eq!(config.count, 20);
                assert_eq!(config.interval_ms, 50.0);
                assert_eq!(config.timeout_secs, 1.0);
                assert_eq!(config.payload_size, 8);
            }
            other => panic!("unexpected config {:?}", other),
        }
    }

    #[test]
    fn test_env_then_cli_priority() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_env();
        env::set_var("LOSSLAT_COUNT", "8");
        env::set_var("LOSSLAT_TIMEOUT", "2.5");

        let config = parse(&["losslat", "udp-client", "--host", "h2", "--count", "12"]).unwrap();
        clear_env();

        match config.command {
            CommandConfig::Probe { config, .. } => {
                // CLI beats env, env beats defaults
                assert_eq!(config.count, 12);
                assert_eq!(config.timeout_secs, 2.5);
            }
            other => panic!("unexpected config {:?}", other),
        }
    }

    #[test]
    fn test_invalid_env_value_is_config_error() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_env();
        env::set_var("LOSSLAT_PORT", "not-a-port");

        let result = parse(&["losslat", "tcp-server"]);
        clear_env();

        let error = result.unwrap_err();
        assert_eq!(error.category(), "CONFIG");
        assert!(error.to_string().contains("LOSSLAT_PORT"));
    }

    #[test]
    fn test_payload_too_small_rejected() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_env();

        let result = parse(&["losslat", "udp-client", "--host", "h2", "--count", "1000", "--size", "3"]);
        assert_eq!(result.unwrap_err().category(), "VALIDATION");
    }

    #[test]
    fn test_sweep_defaults_and_overrides() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_env();

        let config = parse(&["losslat", "sweep"]).unwrap();
        match config.command {
            CommandConfig::Sweep(sweep) => {
                assert_eq!(sweep.loss_levels, vec![1.0, 3.0, 6.0]);
                assert_eq!(sweep.trial.count, 200);
                assert_eq!(sweep.trial.interval_ms, 16.0);
                assert_eq!(sweep.output_path, "plots/loss_sweep_p99.json");
                assert_eq!(sweep.harness, HarnessKind::default());
            }
            other => panic!("unexpected config {:?}", other),
        }

        let config = parse(&[
            "losslat", "sweep", "--loss-levels", "0.5, 2", "--count", "50", "--loopback", "--output", "out.json",
        ])
        .unwrap();
        match config.command {
            CommandConfig::Sweep(sweep) => {
                assert_eq!(sweep.loss_levels, vec![0.5, 2.0]);
                assert_eq!(sweep.trial.count, 50);
                assert_eq!(sweep.harness, HarnessKind::Loopback);
                assert_eq!(sweep.output_path, "out.json");
            }
            other => panic!("unexpected config {:?}", other),
        }
    }

    #[test]
    fn test_trial_uses_single_run_defaults() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_env();

        let config = parse(&["losslat", "trial", "--loss", "3", "--client-verbose"]).unwrap();
        assert!(config.global.verbose);
        match config.command {
            CommandConfig::Trial { loss_pct, protocols, settings, verbose } => {
                assert_eq!(loss_pct, 3.0);
                assert_eq!(protocols, ProtocolSelection::Both);
                assert_eq!(settings.count, 20);
                assert_eq!(settings.interval_ms, 50.0);
                assert!(verbose);
            }
            other => panic!("unexpected config {:?}", other),
        }
    }

    #[test]
    fn test_global_overrides() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_env();

        let config = parse(&["losslat", "--no-color", "--debug", "--log-format", "compact", "udp-server"]).unwrap();
        assert!(!config.global.enable_color);
        assert!(config.global.debug);
        assert_eq!(config.global.log_format, crate::logging::LogFormat::Compact);
    }

    #[test]
    fn test_config_summary() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_env();

        let config = parse(&["losslat", "tcp-client", "--host", "10.0.0.2"]).unwrap();
        let summary = display_config_summary(&config);
        assert!(summary.contains("Mode: TCP prober"));
        assert!(summary.contains("Target: 10.0.0.2:9000"));
        assert!(summary.contains("Connect Policy: 5 attempts, fixed backoff"));
    }
}
