use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context};

const SETTINGS_FILE: &str = "dashboard.toml";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub server_bind: String,
    pub dataset_path: String,
    pub default_year: i32,
    pub broadcast_capacity: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_bind: "127.0.0.1:8050".into(),
            dataset_path: "data/sample_hotels.csv".into(),
            default_year: 2016,
            broadcast_capacity: 64,
        }
    }
}

pub fn load_settings() -> Settings {
    let file = fs::read_to_string(SETTINGS_FILE).ok();
    settings_from_sources(file.as_deref(), |key| std::env::var(key).ok())
}

/// Defaults, then `dashboard.toml`, then environment; later sources win.
pub(crate) fn settings_from_sources(
    file: Option<&str>,
    env: impl Fn(&str) -> Option<String>,
) -> Settings {
    let mut settings = Settings::default();

    if let Some(raw) = file {
        if let Ok(file_cfg) = toml::from_str::<HashMap<String, toml::Value>>(raw) {
            if let Some(v) = file_cfg.get("bind_addr").and_then(toml::Value::as_str) {
                settings.server_bind = v.to_string();
            }
            if let Some(v) = file_cfg.get("dataset_path").and_then(toml::Value::as_str) {
                settings.dataset_path = v.to_string();
            }
            if let Some(v) = file_cfg
                .get("default_year")
                .and_then(toml::Value::as_integer)
                .and_then(|year| i32::try_from(year).ok())
            {
                settings.default_year = v;
            }
        }
    }

    if let Some(v) = env("SERVER_BIND") {
        settings.server_bind = v;
    }
    if let Some(v) = env("APP__BIND_ADDR") {
        settings.server_bind = v;
    }

    if let Some(v) = env("DATASET_PATH") {
        settings.dataset_path = v;
    }
    if let Some(v) = env("APP__DATASET_PATH") {
        settings.dataset_path = v;
    }

    if let Some(v) = env("APP__DEFAULT_YEAR") {
        if let Ok(parsed) = v.parse::<i32>() {
            settings.default_year = parsed;
        }
    }

    if let Some(v) = env("APP__BROADCAST_CAPACITY") {
        if let Ok(parsed) = v.parse::<usize>() {
            settings.broadcast_capacity = parsed.max(1);
        }
    }

    settings
}

pub fn resolve_dataset_path(raw_dataset_path: &str) -> anyhow::Result<PathBuf> {
    let raw_dataset_path = raw_dataset_path.trim();
    let path = if raw_dataset_path.is_empty() {
        PathBuf::from(Settings::default().dataset_path)
    } else {
        Path::new(raw_dataset_path).to_path_buf()
    };

    let metadata = fs::metadata(&path)
        .with_context(|| format!("dataset file '{}' is not readable", path.display()))?;
    if !metadata.is_file() {
        bail!("dataset path '{}' is not a file", path.display());
    }

    Ok(path)
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
