use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::model::Mode;
use crate::sort::SortKey;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5001";
pub const DEFAULT_CONFIG_FILE: &str = "flight-board.toml";
pub const DEFAULT_REFRESH_SECS: u64 = 60;
pub const MIN_REFRESH_SECS: u64 = 5;
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_ALLOW_HTTP: bool = true;
pub const DEFAULT_MODE: &str = "departures";
pub const DEFAULT_MOBILE_BREAKPOINT: u16 = 100;
pub const DEFAULT_THEME: &str = "default";
pub const DEFAULT_SORT: &str = "time";
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_LOG_FILE: &str = "flight-board.log";

#[derive(Debug, Clone)]
pub struct Config {
    pub base_url: String,
    pub refresh: Duration,
    pub timeout_secs: u64,
    pub insecure: bool,
    pub allow_http: bool,
    pub allow_insecure: bool,
    pub config_path: PathBuf,
    pub mode: String,
    pub search: String,
    pub mobile_breakpoint: u16,
    pub theme: String,
    pub sort: String,
    pub sort_desc: bool,
    pub log_enabled: bool,
    pub log_level: String,
    pub log_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            refresh: Duration::from_secs(DEFAULT_REFRESH_SECS),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            insecure: false,
            allow_http: DEFAULT_ALLOW_HTTP,
            allow_insecure: false,
            config_path: PathBuf::from(DEFAULT_CONFIG_FILE),
            mode: DEFAULT_MODE.to_string(),
            search: String::new(),
            mobile_breakpoint: DEFAULT_MOBILE_BREAKPOINT,
            theme: DEFAULT_THEME.to_string(),
            sort: DEFAULT_SORT.to_string(),
            sort_desc: false,
            log_enabled: false,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            log_file: DEFAULT_LOG_FILE.to_string(),
        }
    }
}

impl Config {
    /// `None` leaves the HTTP client on its own default.
    pub fn timeout(&self) -> Option<Duration> {
        if self.timeout_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.timeout_secs))
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    base_url: Option<String>,
    refresh_secs: Option<u64>,
    timeout_secs: Option<u64>,
    insecure: Option<bool>,
    allow_http: Option<bool>,
    allow_insecure: Option<bool>,
    mode: Option<String>,
    search: Option<String>,
    mobile_breakpoint: Option<u16>,
    theme: Option<String>,
    sort: Option<String>,
    sort_desc: Option<bool>,
    log_enabled: Option<bool>,
    log_level: Option<String>,
    log_file: Option<String>,
}

pub fn parse_args() -> Result<Config> {
    let args: Vec<String> = env::args().skip(1).collect();
    parse_from(&args, |key| env::var(key).ok())
}

fn parse_from<F>(args: &[String], env_lookup: F) -> Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    let mut explicit_config: Option<PathBuf> = None;
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "--config" {
            let value = iter
                .next()
                .ok_or_else(|| anyhow!("--config needs a value"))?;
            explicit_config = Some(PathBuf::from(value));
        }
    }

    let config_path = explicit_config
        .clone()
        .or_else(|| env_lookup("FLIGHT_BOARD_CONFIG").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

    let mut config = Config {
        config_path: config_path.clone(),
        ..Config::default()
    };

    if config_path.exists() {
        let file_config = load_file_config(&config_path)?;
        apply_file_config(&mut config, file_config);
    } else if explicit_config.is_some() {
        return Err(anyhow!("Config file not found: {}", config_path.display()));
    }

    apply_env(&mut config, &env_lookup);
    apply_cli(&mut config, args)?;

    validate(&config)?;
    Ok(config)
}

fn load_file_config(path: &Path) -> Result<FileConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config: {}", path.display()))?;
    let cfg: FileConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config: {}", path.display()))?;
    Ok(cfg)
}

fn apply_file_config(target: &mut Config, file: FileConfig) {
    if let Some(base_url) = file.base_url {
        target.base_url = base_url;
    }
    if let Some(refresh) = file.refresh_secs {
        target.refresh = Duration::from_secs(refresh.max(MIN_REFRESH_SECS));
    }
    if let Some(timeout) = file.timeout_secs {
        target.timeout_secs = timeout;
    }
    if let Some(insecure) = file.insecure {
        target.insecure = insecure;
    }
    if let Some(allow_http) = file.allow_http {
        target.allow_http = allow_http;
    }
    if let Some(allow_insecure) = file.allow_insecure {
        target.allow_insecure = allow_insecure;
    }
    if let Some(mode) = file.mode {
        target.mode = mode;
    }
    if let Some(search) = file.search {
        target.search = search;
    }
    if let Some(breakpoint) = file.mobile_breakpoint {
        target.mobile_breakpoint = breakpoint.max(1);
    }
    if let Some(theme) = file.theme {
        target.theme = theme;
    }
    if let Some(sort) = file.sort {
        target.sort = sort;
    }
    if let Some(sort_desc) = file.sort_desc {
        target.sort_desc = sort_desc;
    }
    if let Some(log_enabled) = file.log_enabled {
        target.log_enabled = log_enabled;
    }
    if let Some(log_level) = file.log_level {
        target.log_level = log_level;
    }
    if let Some(log_file) = file.log_file {
        target.log_file = log_file;
    }
}

fn flag_value(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn apply_env<F>(config: &mut Config, env_lookup: &F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = env_lookup("FLIGHT_BOARD_BASE_URL") {
        config.base_url = value;
    }
    if let Some(value) = env_lookup("FLIGHT_BOARD_REFRESH") {
        if let Ok(secs) = value.trim().parse::<u64>() {
            config.refresh = Duration::from_secs(secs.max(MIN_REFRESH_SECS));
        }
    }
    if let Some(value) = env_lookup("FLIGHT_BOARD_TIMEOUT") {
        if let Ok(secs) = value.trim().parse::<u64>() {
            config.timeout_secs = secs;
        }
    }
    if let Some(value) = env_lookup("FLIGHT_BOARD_INSECURE") {
        config.insecure = flag_value(&value);
    }
    if let Some(value) = env_lookup("FLIGHT_BOARD_ALLOW_HTTP") {
        config.allow_http = flag_value(&value);
    }
    if let Some(value) = env_lookup("FLIGHT_BOARD_ALLOW_INSECURE") {
        config.allow_insecure = flag_value(&value);
    }
    if let Some(value) = env_lookup("FLIGHT_BOARD_MODE") {
        config.mode = value;
    }
    if let Some(value) = env_lookup("FLIGHT_BOARD_SEARCH") {
        config.search = value;
    }
    if let Some(value) = env_lookup("FLIGHT_BOARD_BREAKPOINT") {
        if let Ok(cols) = value.trim().parse::<u16>() {
            config.mobile_breakpoint = cols.max(1);
        }
    }
    if let Some(value) = env_lookup("FLIGHT_BOARD_THEME") {
        config.theme = value;
    }
    if let Some(value) = env_lookup("FLIGHT_BOARD_SORT") {
        config.sort = value;
    }
    if let Some(value) = env_lookup("FLIGHT_BOARD_SORT_DESC") {
        config.sort_desc = flag_value(&value);
    }
    if let Some(value) = env_lookup("FLIGHT_BOARD_LOG_ENABLED") {
        config.log_enabled = flag_value(&value);
    }
    if let Some(value) = env_lookup("FLIGHT_BOARD_LOG_LEVEL") {
        config.log_level = value;
    }
    if let Some(value) = env_lookup("FLIGHT_BOARD_LOG_FILE") {
        config.log_file = value;
    }
}

fn apply_cli(config: &mut Config, args: &[String]) -> Result<()> {
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => {
                iter.next();
            }
            "--base-url" | "--url" => {
                config.base_url = iter
                    .next()
                    .ok_or_else(|| anyhow!("{arg} needs a value"))?
                    .to_string();
            }
            "--refresh" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--refresh needs a value"))?;
                let secs: u64 = value
                    .parse()
                    .with_context(|| format!("Invalid --refresh value: {value}"))?;
                config.refresh = Duration::from_secs(secs.max(MIN_REFRESH_SECS));
            }
            "--timeout" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--timeout needs a value"))?;
                config.timeout_secs = value
                    .parse()
                    .with_context(|| format!("Invalid --timeout value: {value}"))?;
            }
            "--insecure" => {
                config.insecure = true;
            }
            "--allow-http" => {
                config.allow_http = true;
            }
            "--allow-insecure" => {
                config.allow_insecure = true;
            }
            "--mode" => {
                config.mode = iter
                    .next()
                    .ok_or_else(|| anyhow!("--mode needs a value"))?
                    .to_string();
            }
            "--arrivals" => {
                config.mode = "arrivals".to_string();
            }
            "--departures" => {
                config.mode = "departures".to_string();
            }
            "--search" => {
                config.search = iter
                    .next()
                    .ok_or_else(|| anyhow!("--search needs a value"))?
                    .to_string();
            }
            "--breakpoint" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--breakpoint needs a value"))?;
                let cols: u16 = value
                    .parse()
                    .with_context(|| format!("Invalid --breakpoint value: {value}"))?;
                config.mobile_breakpoint = cols.max(1);
            }
            "--theme" => {
                config.theme = iter
                    .next()
                    .ok_or_else(|| anyhow!("--theme needs a value"))?
                    .to_string();
            }
            "--sort" => {
                config.sort = iter
                    .next()
                    .ok_or_else(|| anyhow!("--sort needs a value"))?
                    .to_string();
            }
            "--desc" => {
                config.sort_desc = true;
            }
            "--log" => {
                config.log_enabled = true;
            }
            "--no-log" => {
                config.log_enabled = false;
            }
            "--log-level" => {
                config.log_level = iter
                    .next()
                    .ok_or_else(|| anyhow!("--log-level needs a value"))?
                    .to_string();
            }
            "--log-file" => {
                config.log_file = iter
                    .next()
                    .ok_or_else(|| anyhow!("--log-file needs a value"))?
                    .to_string();
            }
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            other => {
                return Err(anyhow!("Unknown argument: {other}"));
            }
        }
    }
    Ok(())
}

fn print_help() {
    println!("hkg-flight-board");
    println!("Usage: hkg-flight-board [--base-url URL] [--refresh SECONDS] [--timeout SECONDS]");
    println!("       [--departures|--arrivals|--mode MODE] [--search TEXT]");
    println!("       [--breakpoint COLUMNS] [--theme default|amber|mono] [--sort FIELD] [--desc]");
    println!("       [--insecure] [--allow-http] [--allow-insecure] [--config PATH]");
    println!("       [--log] [--no-log] [--log-level LEVEL] [--log-file PATH]");
    println!("Environment: FLIGHT_BOARD_BASE_URL overrides the backend base URL");
    println!("Environment: FLIGHT_BOARD_CONFIG overrides config path");
    println!("Environment: FLIGHT_BOARD_REFRESH/TIMEOUT set refresh period and request timeout");
    println!("Environment: FLIGHT_BOARD_MODE/SEARCH set the initial board");
    println!("Environment: FLIGHT_BOARD_BREAKPOINT sets the card layout width threshold");
    println!("Environment: FLIGHT_BOARD_THEME selects the colour theme");
    println!("Environment: FLIGHT_BOARD_SORT/SORT_DESC set the initial sort column and direction");
    println!("Environment: FLIGHT_BOARD_INSECURE/ALLOW_HTTP/ALLOW_INSECURE control transport checks");
    println!("Environment: FLIGHT_BOARD_LOG_ENABLED/LEVEL/FILE configure logging");
    println!("Keys: q quit | d departures | a arrivals | tab switch | 1-7 sort column");
    println!("      / search | c clear search | r refresh | up/down/pgup/pgdn scroll | t theme");
}

fn validate(config: &Config) -> Result<()> {
    let url = config.base_url.trim();
    if url.is_empty() {
        return Err(anyhow!("Backend base URL is empty"));
    }
    if url.to_ascii_lowercase().starts_with("http://") && !config.allow_http {
        return Err(anyhow!(
            "Refusing insecure http URL (set allow_http=true or FLIGHT_BOARD_ALLOW_HTTP=1 to override)"
        ));
    }
    if Mode::from_str(&config.mode).is_none() {
        return Err(anyhow!(
            "Unknown mode: {} (expected departures or arrivals)",
            config.mode
        ));
    }
    if SortKey::from_str(&config.sort).is_none() {
        return Err(anyhow!(
            "Unknown sort column: {} (expected time, flight_numbers_only, location, terminal, location_secondary, gate or status)",
            config.sort
        ));
    }
    if config.insecure && !config.allow_insecure {
        return Err(anyhow!(
            "Refusing --insecure without explicit allow_insecure=true or FLIGHT_BOARD_ALLOW_INSECURE=1"
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::fs;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_file(name: &str) -> PathBuf {
        let mut dir = std::env::temp_dir();
        let suffix = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        dir.push(format!("flight-board-config-test-{suffix}-{name}"));
        let _ = fs::create_dir_all(&dir);
        dir.push(name);
        dir
    }

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn default_allows_http_url() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn http_url_rejected_when_disabled() {
        let cfg = Config {
            allow_http: false,
            ..Config::default()
        };
        let err = validate(&cfg).unwrap_err();
        assert!(err.to_string().contains("Refusing insecure http URL"));
    }

    #[test]
    fn insecure_needs_explicit_allow() {
        let cfg = Config {
            insecure: true,
            ..Config::default()
        };
        assert!(validate(&cfg).is_err());
        let cfg = Config {
            insecure: true,
            allow_insecure: true,
            ..Config::default()
        };
        assert!(validate(&cfg).is_ok());
    }

    #[test]
    fn load_file_config_parses_values() {
        let path = temp_file("config.toml");
        let content = r#"
base_url = "https://board.example.com"
refresh_secs = 30
timeout_secs = 0
mode = "arrivals"
search = "CX"
mobile_breakpoint = 90
theme = "amber"
log_enabled = true
log_level = "debug"
log_file = "board.log"
"#;
        fs::write(&path, content).unwrap();
        let file = load_file_config(&path).unwrap();
        assert_eq!(file.base_url.as_deref(), Some("https://board.example.com"));
        assert_eq!(file.refresh_secs, Some(30));
        assert_eq!(file.mobile_breakpoint, Some(90));

        let mut cfg = Config::default();
        apply_file_config(&mut cfg, file);
        assert_eq!(cfg.refresh, Duration::from_secs(30));
        assert_eq!(cfg.timeout(), None);
        assert_eq!(cfg.mode, "arrivals");
        assert_eq!(cfg.search, "CX");
        assert_eq!(cfg.theme, "amber");
        assert!(cfg.log_enabled);
        assert_eq!(cfg.log_file, "board.log");
        let _ = fs::remove_file(&path);
        let _ = fs::remove_dir(path.parent().unwrap());
    }

    #[test]
    fn apply_file_config_clamps() {
        let mut cfg = Config::default();
        apply_file_config(
            &mut cfg,
            FileConfig {
                refresh_secs: Some(1),
                mobile_breakpoint: Some(0),
                ..Default::default()
            },
        );
        assert_eq!(cfg.refresh, Duration::from_secs(MIN_REFRESH_SECS));
        assert_eq!(cfg.mobile_breakpoint, 1);
    }

    #[test]
    fn cli_overrides_env_which_overrides_defaults() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("FLIGHT_BOARD_BASE_URL", "https://env.example.com"),
            ("FLIGHT_BOARD_REFRESH", "120"),
            ("FLIGHT_BOARD_LOG_ENABLED", "yes"),
            ("FLIGHT_BOARD_CONFIG", "/nonexistent/flight-board.toml"),
        ]);
        let lookup = |key: &str| env.get(key).map(|v| v.to_string());

        let cfg = parse_from(&args(&["--arrivals", "--search", "KA"]), lookup).unwrap();
        assert_eq!(cfg.base_url, "https://env.example.com");
        assert_eq!(cfg.refresh, Duration::from_secs(120));
        assert!(cfg.log_enabled);
        assert_eq!(cfg.mode, "arrivals");
        assert_eq!(cfg.search, "KA");

        let cfg = parse_from(
            &args(&["--base-url", "https://cli.example.com", "--timeout", "3"]),
            lookup,
        )
        .unwrap();
        assert_eq!(cfg.base_url, "https://cli.example.com");
        assert_eq!(cfg.timeout(), Some(Duration::from_secs(3)));
    }

    #[test]
    fn sort_column_is_validated() {
        let cfg = parse_from(&args(&["--sort", "gate", "--desc"]), no_env).unwrap();
        assert_eq!(cfg.sort, "gate");
        assert!(cfg.sort_desc);
        let err = parse_from(&args(&["--sort", "airline"]), no_env).unwrap_err();
        assert!(err.to_string().contains("Unknown sort column"));
    }

    #[test]
    fn mode_is_validated() {
        let cfg = parse_from(&args(&["--mode", "arr"]), no_env).unwrap();
        assert_eq!(cfg.mode, "arr");
        let err = parse_from(&args(&["--mode", "sideways"]), no_env).unwrap_err();
        assert!(err.to_string().contains("Unknown mode"));
        let env = |key: &str| (key == "FLIGHT_BOARD_MODE").then(|| "cargo".to_string());
        assert!(parse_from(&args(&[]), env).is_err());
    }

    #[test]
    fn bad_arguments_are_errors() {
        assert!(parse_from(&args(&["--bogus"]), no_env).is_err());
        assert!(parse_from(&args(&["--refresh"]), no_env).is_err());
        assert!(parse_from(&args(&["--refresh", "soon"]), no_env).is_err());
        assert!(parse_from(&args(&["--config", "/nonexistent/board.toml"]), no_env).is_err());
    }
}
