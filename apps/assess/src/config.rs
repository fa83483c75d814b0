use std::{
    fs, io,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{bail, Context};
use client_core::DEFAULT_PREDICT_URL;
use serde::Deserialize;
use url::Url;

pub const DEFAULT_CONFIG_FILE: &str = "assess.toml";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub predict_url: String,
    pub request_timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            predict_url: DEFAULT_PREDICT_URL.into(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileSettings {
    predict_url: Option<String>,
    request_timeout_seconds: Option<u64>,
}

impl Settings {
    /// Applies a `--server-url` override on top of file/default settings.
    pub fn with_predict_url(mut self, predict_url: Option<String>) -> anyhow::Result<Self> {
        if let Some(predict_url) = predict_url {
            self.predict_url = predict_url;
        }
        validate_predict_url(&self.predict_url)?;
        Ok(self)
    }
}

/// Loads settings from `path`, or from `assess.toml` in the working
/// directory when no path is given. Only an explicitly named file must exist.
pub fn load_settings(path: Option<&Path>) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();
    let (path, required) = match path {
        Some(path) => (path.to_path_buf(), true),
        None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
    };

    match fs::read_to_string(&path) {
        Ok(raw) => {
            let file_cfg: FileSettings = toml::from_str(&raw)
                .with_context(|| format!("failed to parse config file '{}'", path.display()))?;
            if let Some(v) = file_cfg.predict_url {
                settings.predict_url = v;
            }
            if let Some(v) = file_cfg.request_timeout_seconds {
                settings.request_timeout = Duration::from_secs(v);
            }
            tracing::debug!(path = %path.display(), "loaded config file");
        }
        Err(err) if !required && err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to read config file '{}'", path.display()));
        }
    }

    validate_predict_url(&settings.predict_url)?;
    Ok(settings)
}

fn validate_predict_url(raw: &str) -> anyhow::Result<()> {
    let url = Url::parse(raw).with_context(|| format!("invalid prediction url '{raw}'"))?;
    if !matches!(url.scheme(), "http" | "https") {
        bail!("prediction url '{raw}' must use http or https");
    }
    Ok(())
}
