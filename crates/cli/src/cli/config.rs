use cd_domain::config::{Config, ConfigError, ConfigSeverity};

/// Validate the config and print any issues.  Returns `false` when at least
/// one error was found.
pub fn validate(config: &Config, config_path: &str) -> bool {
    let mut issues = config.validate();
    if !config.engine.default_timezone.trim().is_empty() {
        if let Err(e) = cd_schedule::validate_timezone(&config.engine.default_timezone) {
            issues.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "engine.default_timezone".into(),
                message: e.to_string(),
            });
        }
    }

    if issues.is_empty() {
        println!("Config OK ({config_path})");
        return true;
    }

    let error_count = issues
        .iter()
        .filter(|e| e.severity == ConfigSeverity::Error)
        .count();
    let warning_count = issues.len() - error_count;

    for issue in &issues {
        println!("{issue}");
    }

    println!(
        "\n{} error(s), {} warning(s) in {config_path}",
        error_count, warning_count,
    );

    error_count == 0
}

/// Dump the resolved config (with all defaults filled in) as TOML.
pub fn show(config: &Config) -> anyhow::Result<()> {
    let output = toml::to_string_pretty(config)
        .map_err(|e| anyhow::anyhow!("serializing config: {e}"))?;
    print!("{output}");
    Ok(())
}
