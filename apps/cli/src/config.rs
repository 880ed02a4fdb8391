use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use client_core::DEFAULT_ANALYZER_URL;
use serde::Deserialize;

const LOCAL_CONFIG_FILE: &str = "ipo_analyser.toml";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub analyzer_url: String,
    pub request_timeout_secs: Option<u64>,
    pub max_upload_bytes: Option<u64>,
    pub export_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            analyzer_url: DEFAULT_ANALYZER_URL.into(),
            request_timeout_secs: None,
            max_upload_bytes: None,
            export_dir: PathBuf::from("."),
        }
    }
}

impl Settings {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    analyzer_url: Option<String>,
    request_timeout_secs: Option<u64>,
    max_upload_bytes: Option<u64>,
    export_dir: Option<PathBuf>,
}

/// Defaults, then the first config file found, then environment variables.
pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if let Some(raw) = config_file_candidates()
        .iter()
        .find_map(|path| fs::read_to_string(path).ok())
    {
        apply_file(&mut settings, &raw);
    }

    apply_env(&mut settings, |key| std::env::var(key).ok());
    settings
}

fn config_file_candidates() -> Vec<PathBuf> {
    let mut candidates = vec![Path::new(LOCAL_CONFIG_FILE).to_path_buf()];
    if let Some(dir) = dirs::config_dir() {
        candidates.push(dir.join("ipo_analyser").join("config.toml"));
    }
    candidates
}

fn apply_file(settings: &mut Settings, raw: &str) {
    let Ok(file_cfg) = toml::from_str::<FileSettings>(raw) else {
        tracing::warn!("ignoring unreadable config file");
        return;
    };
    if let Some(v) = file_cfg.analyzer_url {
        settings.analyzer_url = v;
    }
    if let Some(v) = file_cfg.request_timeout_secs {
        settings.request_timeout_secs = Some(v);
    }
    if let Some(v) = file_cfg.max_upload_bytes {
        settings.max_upload_bytes = Some(v);
    }
    if let Some(v) = file_cfg.export_dir {
        settings.export_dir = v;
    }
}

fn apply_env(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("IPO_ANALYSER_URL") {
        settings.analyzer_url = v;
    }
    if let Some(v) = lookup("APP__ANALYZER_URL") {
        settings.analyzer_url = v;
    }

    if let Some(parsed) = lookup("APP__REQUEST_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
        settings.request_timeout_secs = Some(parsed);
    }
    if let Some(parsed) = lookup("APP__MAX_UPLOAD_BYTES").and_then(|v| v.parse().ok()) {
        settings.max_upload_bytes = Some(parsed);
    }

    if let Some(v) = lookup("APP__EXPORT_DIR") {
        settings.export_dir = PathBuf::from(v);
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
