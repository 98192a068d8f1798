use cd_domain::config::{Config, ConfigSeverity};

#[test]
fn default_engine_uses_utc() {
    let config = Config::default();
    assert_eq!(config.engine.default_timezone, "UTC");
    assert_eq!(config.engine.search_horizon_years, 10);
}

#[test]
fn empty_file_parses_to_defaults() {
    let config: Config = toml::from_str("").unwrap();
    assert_eq!(config.engine.search_horizon_years, 10);
    assert_eq!(config.retry.max_retries, 0);
    assert_eq!(config.observability.log_filter, "warn");
}

#[test]
fn full_file_parses() {
    let toml_str = r#"
[engine]
search_horizon_years = 25
default_timezone = "America/New_York"

[retry]
max_retries = 3
retry_delay_ms = 1500

[observability]
log_filter = "debug"
json_logs = true
"#;
    let config: Config = toml::from_str(toml_str).unwrap();
    assert_eq!(config.engine.search_horizon_years, 25);
    assert_eq!(config.engine.default_timezone, "America/New_York");
    assert_eq!(config.retry.max_retries, 3);
    assert_eq!(config.retry.retry_delay().as_millis(), 1500);
    assert!(config.observability.json_logs);
    assert!(config.validate().is_empty());
}

#[test]
fn blank_timezone_fails_validation() {
    let toml_str = r#"
[engine]
default_timezone = "  "
"#;
    let config: Config = toml::from_str(toml_str).unwrap();
    let issues = config.validate();
    assert!(issues
        .iter()
        .any(|i| i.field == "engine.default_timezone" && i.severity == ConfigSeverity::Error));
}

#[test]
fn config_serializes_back_to_toml() {
    let config = Config::default();
    let rendered = toml::to_string_pretty(&config).unwrap();
    assert!(rendered.contains("[engine]"));
    assert!(rendered.contains("search_horizon_years = 10"));
}
