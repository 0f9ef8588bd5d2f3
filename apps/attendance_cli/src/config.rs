use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use url::Url;

pub const DEFAULT_CONFIG_FILE: &str = "attendance.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub backend_url: Option<String>,
    pub salesperson: String,
    pub request_timeout_seconds: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backend_url: None,
            salesperson: String::new(),
            request_timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileSettings {
    backend_url: Option<String>,
    salesperson: Option<String>,
    request_timeout_seconds: Option<u64>,
}

impl Settings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds.max(1))
    }

    /// The configured endpoint, validated as an absolute http(s) URL.
    pub fn backend_endpoint(&self) -> Result<Url> {
        let raw = self
            .backend_url
            .as_deref()
            .map(str::trim)
            .filter(|raw| !raw.is_empty())
            .ok_or_else(|| {
                anyhow!("no backend url configured; pass --backend-url or set ATTENDANCE_BACKEND_URL")
            })?;
        let url = Url::parse(raw).with_context(|| format!("invalid backend url '{raw}'"))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(anyhow!("backend url must be http or https, got '{}'", url.scheme()));
        }
        Ok(url)
    }
}

/// Defaults, then the TOML file, then environment. An explicitly named file
/// must exist; the default `attendance.toml` is optional.
pub fn load_settings(config_path: Option<&Path>) -> Result<Settings> {
    load_settings_with(config_path, |key| std::env::var(key).ok())
}

fn load_settings_with(
    config_path: Option<&Path>,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<Settings> {
    let mut settings = Settings::default();

    let (path, required) = match config_path {
        Some(path) => (path.to_path_buf(), true),
        None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
    };
    match fs::read_to_string(&path) {
        Ok(raw) => apply_file(&mut settings, &raw)
            .with_context(|| format!("failed to parse config file '{}'", path.display()))?,
        Err(err) if required => {
            return Err(err).with_context(|| format!("failed to read config file '{}'", path.display()))
        }
        Err(_) => {}
    }

    apply_env(&mut settings, lookup);
    Ok(settings)
}

fn apply_file(settings: &mut Settings, raw: &str) -> Result<()> {
    let file_cfg: FileSettings = toml::from_str(raw)?;
    if let Some(v) = file_cfg.backend_url {
        settings.backend_url = Some(v);
    }
    if let Some(v) = file_cfg.salesperson {
        settings.salesperson = v;
    }
    if let Some(v) = file_cfg.request_timeout_seconds {
        settings.request_timeout_seconds = v;
    }
    Ok(())
}

fn apply_env(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("ATTENDANCE_BACKEND_URL") {
        settings.backend_url = Some(v);
    }
    if let Some(v) = lookup("APP__BACKEND_URL") {
        settings.backend_url = Some(v);
    }

    if let Some(v) = lookup("ATTENDANCE_SALESPERSON") {
        settings.salesperson = v;
    }
    if let Some(v) = lookup("APP__SALESPERSON") {
        settings.salesperson = v;
    }

    if let Some(v) = lookup("APP__REQUEST_TIMEOUT_SECONDS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.request_timeout_seconds = parsed;
        }
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
