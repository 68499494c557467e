use std::{collections::HashMap, fs, path::Path, time::Duration};

use guild_sidebar::SidebarConfig;
use serde::Deserialize;
use tracing::warn;

pub const DEFAULT_CONFIG_PATH: &str = "replay.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Settings {
    pub log_filter: String,
    pub inbox_capacity: usize,
    pub fetch_timeout_ms: u64,
    pub settle_timeout_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        let sidebar = SidebarConfig::default();
        Self {
            log_filter: "info".into(),
            inbox_capacity: sidebar.inbox_capacity,
            fetch_timeout_ms: sidebar.fetch_timeout.as_millis() as u64,
            settle_timeout_ms: 2000,
        }
    }
}

impl Settings {
    pub fn sidebar_config(&self) -> SidebarConfig {
        SidebarConfig::default()
            .with_inbox_capacity(self.inbox_capacity)
            .with_fetch_timeout(Duration::from_millis(self.fetch_timeout_ms))
    }

    pub fn settle_timeout(&self) -> Duration {
        Duration::from_millis(self.settle_timeout_ms)
    }
}

/// Defaults, then the key/value config file, then `APP__*` environment
/// variables.
pub fn load_settings(path: Option<&Path>) -> Settings {
    let mut settings = Settings::default();

    let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_PATH));
    if let Ok(raw) = fs::read_to_string(path) {
        apply_file_overrides(&mut settings, &raw);
    }

    apply_env_overrides(&mut settings, |key| std::env::var(key).ok());
    settings
}

fn apply_file_overrides(settings: &mut Settings, raw: &str) {
    let file_cfg = match toml::from_str::<HashMap<String, toml::Value>>(raw) {
        Ok(file_cfg) => file_cfg,
        Err(err) => {
            warn!("ignoring malformed config file: {err}");
            return;
        }
    };

    for (key, value) in file_cfg {
        let value = match value {
            toml::Value::String(s) => s,
            other => other.to_string(),
        };
        apply_override(settings, &key, &value);
    }
}

fn apply_env_overrides(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    for key in [
        "log_filter",
        "inbox_capacity",
        "fetch_timeout_ms",
        "settle_timeout_ms",
    ] {
        if let Some(value) = lookup(&format!("APP__{}", key.to_ascii_uppercase())) {
            apply_override(settings, key, &value);
        }
    }
}

fn apply_override(settings: &mut Settings, key: &str, value: &str) {
    match key {
        "log_filter" => settings.log_filter = value.to_string(),
        "inbox_capacity" => parse_into(key, value, &mut settings.inbox_capacity),
        "fetch_timeout_ms" => parse_into(key, value, &mut settings.fetch_timeout_ms),
        "settle_timeout_ms" => parse_into(key, value, &mut settings.settle_timeout_ms),
        _ => warn!(key, "unknown config key"),
    }
}

fn parse_into<T: std::str::FromStr>(key: &str, value: &str, slot: &mut T) {
    match value.trim().parse() {
        Ok(parsed) => *slot = parsed,
        Err(_) => warn!(key, value, "ignoring unparsable config value"),
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
