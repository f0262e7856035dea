use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use serde::Deserialize;
use tracker::reports::MAX_KPI_MONTHS;

pub const DEFAULT_CONFIG_FILE: &str = "qtrack.toml";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Settings {
    pub local_storage_url: String,
    pub reference_prefix: String,
    pub seed_demo_data: bool,
    pub log_filter: String,
    pub kpi_months: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            local_storage_url: "sqlite://./data/qtrack-local.db".into(),
            reference_prefix: tracker::DEFAULT_REFERENCE_PREFIX.into(),
            seed_demo_data: true,
            log_filter: "info".into(),
            kpi_months: 6,
        }
    }
}

/// Defaults, then `path` (or `qtrack.toml` in the working directory), then
/// `QTRACK_*` and `APP__*` environment variables.
pub fn load_settings(path: Option<&Path>) -> anyhow::Result<Settings> {
    load_settings_with(path, |key| std::env::var(key).ok())
}

pub(crate) fn load_settings_with(
    path: Option<&Path>,
    env: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    let file = path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
    match fs::read_to_string(&file) {
        Ok(raw) => {
            let file_cfg = toml::from_str::<HashMap<String, toml::Value>>(&raw)
                .with_context(|| format!("failed to parse config file '{}'", file.display()))?;
            for (key, value) in file_cfg {
                let value = match value {
                    toml::Value::String(s) => s,
                    other => other.to_string(),
                };
                apply(&mut settings, &key, &value);
            }
        }
        // An explicit path must exist; the default file is optional.
        Err(err) if path.is_some() => {
            return Err(err).with_context(|| format!("failed to read '{}'", file.display()));
        }
        Err(_) => {}
    }

    for key in [
        "local_storage_url",
        "reference_prefix",
        "seed_demo_data",
        "log_filter",
        "kpi_months",
    ] {
        let upper = key.to_ascii_uppercase();
        if let Some(v) = env(&format!("QTRACK_{upper}")) {
            apply(&mut settings, key, &v);
        }
        if let Some(v) = env(&format!("APP__{upper}")) {
            apply(&mut settings, key, &v);
        }
    }

    Ok(settings)
}

fn apply(settings: &mut Settings, key: &str, value: &str) {
    match key {
        "local_storage_url" => settings.local_storage_url = value.to_string(),
        "reference_prefix" if !value.trim().is_empty() => {
            settings.reference_prefix = value.trim().to_string()
        }
        "seed_demo_data" => {
            if let Ok(parsed) = value.trim().parse::<bool>() {
                settings.seed_demo_data = parsed;
            }
        }
        "log_filter" => settings.log_filter = value.to_string(),
        "kpi_months" => {
            if let Ok(parsed) = value.trim().parse::<u32>() {
                settings.kpi_months = parsed.clamp(1, MAX_KPI_MONTHS);
            }
        }
        _ => {}
    }
}

pub fn prepare_database_url(raw_database_url: &str) -> anyhow::Result<String> {
    let database_url = normalize_database_url(raw_database_url);
    ensure_parent_dir_exists(&database_url)?;
    Ok(database_url)
}

pub(crate) fn normalize_database_url(raw_database_url: &str) -> String {
    let raw_database_url = raw_database_url.trim();

    if raw_database_url.is_empty() {
        return Settings::default().local_storage_url;
    }

    if raw_database_url.starts_with("sqlite::memory:") {
        return raw_database_url.to_string();
    }

    if let Some(path) = raw_database_url.strip_prefix("sqlite://") {
        if has_drive_letter(path) {
            return format!("sqlite:{}", path.replace('\\', "/"));
        }
        return raw_database_url.to_string();
    }

    if raw_database_url.contains("://") {
        return raw_database_url.to_string();
    }

    if let Some(path) = raw_database_url.strip_prefix("sqlite:") {
        let path = path.replace('\\', "/");
        if has_drive_letter(&path) {
            return format!("sqlite:{path}");
        }
        return format!("sqlite://{path}");
    }

    let path = raw_database_url.replace('\\', "/");
    if has_drive_letter(&path) {
        return format!("sqlite:{path}");
    }
    format!("sqlite://{path}")
}

fn has_drive_letter(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

fn ensure_parent_dir_exists(database_url: &str) -> anyhow::Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url.starts_with("sqlite::memory:") || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
