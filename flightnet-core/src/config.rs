//! Configuration file management for flightnet.
//!
//! Reads/writes `~/.flightnet/config.yaml` with network endpoints, cache
//! TTLs, route construction settings, and directory file paths.

use std::path::PathBuf;

use crate::types::ConfigError;

/// Full configuration structure.
#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub networks: NetworksConfig,
    pub route: RouteConfig,
    pub directory: DirectoryConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct NetworksConfig {
    pub vatsim_url: String,
    pub vatsim_members_url: String,
    pub ivao_url: String,
    pub user_agent: String,
    pub vatsim_ttl_s: f64,
    pub ivao_ttl_s: f64,
    pub http_timeout_s: f64,
}

#[derive(Debug, Clone)]
pub struct RouteConfig {
    pub distance_threshold_km: f64,
}

#[derive(Debug, Clone)]
pub struct DirectoryConfig {
    pub airports: String,
    pub waypoints: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "127.0.0.1".into(),
                port: 8080,
            },
            networks: NetworksConfig {
                vatsim_url: "https://data.vatsim.net/v3/vatsim-data.json".into(),
                vatsim_members_url: "https://api.vatsim.net/v2/members".into(),
                ivao_url: "https://api.ivao.aero/v2/tracker/whazzup".into(),
                user_agent: "flightnet/0.1 (https://github.com/flightnet-dev/flightnet)".into(),
                vatsim_ttl_s: 15.0,
                ivao_ttl_s: 15.0,
                http_timeout_s: 10.0,
            },
            route: RouteConfig {
                distance_threshold_km: 1000.0,
            },
            directory: DirectoryConfig {
                airports: "data/airports.csv".into(),
                waypoints: "data/waypoints.csv".into(),
            },
        }
    }
}

/// Get the config directory path (`~/.flightnet/`).
pub fn config_dir() -> PathBuf {
    dirs_home().join(".flightnet")
}

/// Get the config file path.
pub fn config_file() -> PathBuf {
    config_dir().join("config.yaml")
}

fn dirs_home() -> PathBuf {
    std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
}

/// Load config from `~/.flightnet/config.yaml`.
///
/// Returns default config if file doesn't exist.
pub fn load_config() -> Config {
    let path = config_file();
    if !path.exists() {
        return Config::default();
    }

    let text = match std::fs::read_to_string(&path) {
        Ok(t) => t,
        Err(_) => return Config::default(),
    };

    parse_config(&text).unwrap_or_default()
}

/// Save config to `~/.flightnet/config.yaml`.
pub fn save_config(config: &Config) -> Result<PathBuf, ConfigError> {
    let dir = config_dir();
    std::fs::create_dir_all(&dir).map_err(|e| ConfigError(e.to_string()))?;

    let path = config_file();
    let text = serialize_config(config);
    std::fs::write(&path, text).map_err(|e| ConfigError(e.to_string()))?;

    Ok(path)
}

/// Parse simple YAML-like config text.
fn parse_config(text: &str) -> Option<Config> {
    let mut config = Config::default();
    let mut current_section: Option<String> = None;

    for line in text.lines() {
        let stripped = line.trim();
        if stripped.is_empty() || stripped.starts_with('#') {
            continue;
        }

        let is_indented = line.starts_with("  ") || line.starts_with('\t');

        if let Some((key, val)) = stripped.split_once(':') {
            let key = key.trim();
            let val = val.trim();

            if !is_indented {
                if val.is_empty() {
                    current_section = Some(key.to_string());
                } else {
                    current_section = None;
                }
            } else if let Some(ref section) = current_section {
                match section.as_str() {
                    "server" => match key {
                        "host" => {
                            if let Some(v) = parse_string_value(val) {
                                config.server.host = v;
                            }
                        }
                        "port" => {
                            if let Ok(v) = val.parse::<u16>() {
                                config.server.port = v;
                            }
                        }
                        _ => {}
                    },
                    "networks" => match key {
                        "vatsim_url" => {
                            if let Some(v) = parse_string_value(val) {
                                config.networks.vatsim_url = v;
                            }
                        }
                        "vatsim_members_url" => {
                            if let Some(v) = parse_string_value(val) {
                                config.networks.vatsim_members_url = v;
                            }
                        }
                        "ivao_url" => {
                            if let Some(v) = parse_string_value(val) {
                                config.networks.ivao_url = v;
                            }
                        }
                        "user_agent" => {
                            if let Some(v) = parse_string_value(val) {
                                config.networks.user_agent = v;
                            }
                        }
                        "vatsim_ttl_s" => {
                            if let Some(v) = parse_float_value(val) {
                                config.networks.vatsim_ttl_s = v;
                            }
                        }
                        "ivao_ttl_s" => {
                            if let Some(v) = parse_float_value(val) {
                                config.networks.ivao_ttl_s = v;
                            }
                        }
                        "http_timeout_s" => {
                            if let Some(v) = parse_float_value(val) {
                                config.networks.http_timeout_s = v;
                            }
                        }
                        _ => {}
                    },
                    "route" => {
                        if key == "distance_threshold_km" {
                            if let Some(v) = parse_float_value(val) {
                                config.route.distance_threshold_km = v;
                            }
                        }
                    }
                    "directory" => match key {
                        "airports" => {
                            if let Some(v) = parse_string_value(val) {
                                config.directory.airports = v;
                            }
                        }
                        "waypoints" => {
                            if let Some(v) = parse_string_value(val) {
                                config.directory.waypoints = v;
                            }
                        }
                        _ => {}
                    },
                    _ => {}
                }
            }
        }
    }

    Some(config)
}

fn parse_string_value(val: &str) -> Option<String> {
    if val == "null" || val == "~" || val.is_empty() {
        return None;
    }
    // Strip quotes
    if (val.starts_with('"') && val.ends_with('"'))
        || (val.starts_with('\'') && val.ends_with('\''))
    {
        return Some(val[1..val.len() - 1].to_string());
    }
    Some(val.to_string())
}

fn parse_float_value(val: &str) -> Option<f64> {
    if val == "null" || val == "~" || val.is_empty() {
        return None;
    }
    val.parse().ok()
}

/// Serialize config to YAML-like text.
fn serialize_config(config: &Config) -> String {
    let mut lines = vec!["# flightnet configuration".to_string(), String::new()];

    lines.push("server:".into());
    lines.push(format!("  host: \"{}\"", config.server.host));
    lines.push(format!("  port: {}", config.server.port));
    lines.push(String::new());

    lines.push("networks:".into());
    lines.push(format!("  vatsim_url: \"{}\"", config.networks.vatsim_url));
    lines.push(format!(
        "  vatsim_members_url: \"{}\"",
        config.networks.vatsim_members_url
    ));
    lines.push(format!("  ivao_url: \"{}\"", config.networks.ivao_url));
    lines.push(format!("  user_agent: \"{}\"", config.networks.user_agent));
    lines.push(format!("  vatsim_ttl_s: {}", config.networks.vatsim_ttl_s));
    lines.push(format!("  ivao_ttl_s: {}", config.networks.ivao_ttl_s));
    lines.push(format!("  http_timeout_s: {}", config.networks.http_timeout_s));
    lines.push(String::new());

    lines.push("route:".into());
    lines.push(format!(
        "  distance_threshold_km: {}",
        config.route.distance_threshold_km
    ));
    lines.push(String::new());

    lines.push("directory:".into());
    lines.push(format!("  airports: \"{}\"", config.directory.airports));
    lines.push(format!("  waypoints: \"{}\"", config.directory.waypoints));

    lines.join("\n") + "\n"
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
