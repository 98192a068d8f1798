use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use cd_domain::config::ObservabilityConfig;
use cd_schedule::Engine;
use cd_cli::cli::{expr, Cli, Command, ConfigCommand};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Config(ConfigCommand::Validate) => {
            let (config, config_path) = cd_cli::cli::load_config()?;
            let valid = cd_cli::cli::config::validate(&config, &config_path);
            if !valid {
                std::process::exit(1);
            }
            Ok(())
        }
        Command::Config(ConfigCommand::Show) => {
            let (config, _config_path) = cd_cli::cli::load_config()?;
            cd_cli::cli::config::show(&config)
        }
        Command::Version => {
            println!("cadence {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Command::Parse { expression, json } => {
            engine()?;
            emit(expr::parse(&expression, json))
        }
        Command::Next { expression, from, count } => {
            let engine = engine()?;
            emit(expr::next(&engine, &expression, &from.unwrap_or_else(Utc::now), count))
        }
        Command::Prev { expression, from } => {
            let engine = engine()?;
            emit(expr::prev(&engine, &expression, &from.unwrap_or_else(Utc::now)))
        }
        Command::Match { expression, at } => {
            let engine = engine()?;
            emit(expr::matches(&engine, &expression, &at))
        }
        Command::End { expression, at } => {
            let engine = engine()?;
            emit(expr::end(&engine, &expression, &at))
        }
    }
}

/// Load config, install logging and build the engine the expression
/// commands share.
fn engine() -> anyhow::Result<Engine> {
    let (config, config_path) = cd_cli::cli::load_config()?;
    init_tracing(&config.observability);
    let engine = Engine::new(&config.engine)
        .with_context(|| format!("engine settings in {config_path}"))?;
    debug!(
        horizon_years = engine.horizon_years(),
        timezone = %engine.default_timezone(),
        "engine ready"
    );
    Ok(engine)
}

fn emit(output: anyhow::Result<String>) -> anyhow::Result<()> {
    match output {
        Ok(text) => {
            println!("{text}");
            Ok(())
        }
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(expr::exit_code(&e));
        }
    }
}

/// Logs go to stderr so command output on stdout stays machine-readable.
/// `RUST_LOG` wins over the configured filter.
fn init_tracing(obs: &ObservabilityConfig) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&obs.log_filter));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr);
    if obs.json_logs {
        builder.json().init();
    } else {
        builder.compact().init();
    }
}
