// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const APP_NAME: &str = "chatrecap";
const CONFIG_VERSION: i64 = 1;
const DEFAULT_SERVICE_URL: &str = "http://localhost:8000";
const DEFAULT_STEP_DEBOUNCE: &str = "450ms";
const DEFAULT_LOG_LEVEL: &str = "info";
const CONFIG_PATH_ENV: &str = "CHATRECAP_CONFIG_PATH";
const SERVICE_URL_ENV: &str = "CHATRECAP_SERVICE_URL";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub service: Service,
    #[serde(default)]
    pub ui: Ui,
    #[serde(default)]
    pub log: Log,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            service: Service::default(),
            ui: Ui::default(),
            log: Log::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Service {
    pub base_url: Option<String>,
    pub timeout: Option<String>,
}

impl Default for Service {
    fn default() -> Self {
        Self {
            base_url: Some(DEFAULT_SERVICE_URL.to_owned()),
            timeout: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Ui {
    pub step_debounce: Option<String>,
    pub export_dir: Option<String>,
}

impl Default for Ui {
    fn default() -> Self {
        Self {
            step_debounce: Some(DEFAULT_STEP_DEBOUNCE.to_owned()),
            export_dir: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Log {
    pub level: Option<String>,
    pub file: Option<String>,
}

impl Default for Log {
    fn default() -> Self {
        Self {
            level: Some(DEFAULT_LOG_LEVEL.to_owned()),
            file: None,
        }
    }
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os(CONFIG_PATH_ENV) {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!("cannot resolve config directory; set {CONFIG_PATH_ENV} to the config file")
        })?;

        let app_dir = config_root.join(APP_NAME);
        fs::create_dir_all(&app_dir)
            .with_context(|| format!("create config directory {}", app_dir.display()))?;
        Ok(app_dir.join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            let config = Self::default();
            config.validate(path)?;
            return Ok(config);
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let value: toml::Value = toml::from_str(&raw)
            .with_context(|| format!("parse TOML config {}", path.display()))?;

        let version = value
            .get("version")
            .and_then(toml::Value::as_integer)
            .ok_or_else(|| {
                anyhow!(
                    "config file {} is not versioned. Add `version = 1` and put values under [service], [ui], and [log]",
                    path.display()
                )
            })?;

        if version != CONFIG_VERSION {
            bail!(
                "unsupported config version {} in {}; expected version = 1. Run with --print-example-config for a template",
                version,
                path.display()
            );
        }

        let config: Config = value
            .try_into()
            .with_context(|| format!("decode config {}", path.display()))?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        chatrecap_api::validate_base_url(&self.service_base_url())
            .with_context(|| format!("service.base_url in {}", path.display()))?;

        if let Some(timeout) = &self.service.timeout {
            let parsed = parse_duration(timeout)?;
            if parsed <= Duration::ZERO {
                bail!(
                    "service.timeout in {} must be positive, got {}",
                    path.display(),
                    timeout
                );
            }
        }

        if let Some(debounce) = &self.ui.step_debounce {
            parse_duration(debounce)
                .with_context(|| format!("ui.step_debounce in {}", path.display()))?;
        }

        if let Some(level) = &self.log.level
            && level.trim().is_empty()
        {
            bail!("log.level in {} must not be empty", path.display());
        }

        Ok(())
    }

    /// `CHATRECAP_SERVICE_URL` wins over the file.
    pub fn service_base_url(&self) -> String {
        if let Some(url) = env::var_os(SERVICE_URL_ENV)
            && !url.is_empty()
        {
            return url.to_string_lossy().trim_end_matches('/').to_owned();
        }
        self.service
            .base_url
            .as_deref()
            .unwrap_or(DEFAULT_SERVICE_URL)
            .trim_end_matches('/')
            .to_owned()
    }

    pub fn service_timeout(&self) -> Result<Option<Duration>> {
        self.service
            .timeout
            .as_deref()
            .map(parse_duration)
            .transpose()
    }

    pub fn step_debounce(&self) -> Result<Duration> {
        parse_duration(
            self.ui
                .step_debounce
                .as_deref()
                .unwrap_or(DEFAULT_STEP_DEBOUNCE),
        )
    }

    pub fn export_dir(&self) -> Result<PathBuf> {
        match &self.ui.export_dir {
            Some(dir) => Ok(PathBuf::from(dir)),
            None => Ok(data_dir()?.join("exports")),
        }
    }

    pub fn log_level(&self) -> &str {
        self.log.level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn log_file(&self) -> Result<PathBuf> {
        match &self.log.file {
            Some(file) => Ok(PathBuf::from(file)),
            None => Ok(data_dir()?.join(format!("{APP_NAME}.log"))),
        }
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            "# chatrecap config\n# Place this file at: {}\n\nversion = 1\n\n[service]\nbase_url = \"{}\"\n# Optional. Unset means requests never time out.\n# timeout = \"30s\"\n\n[ui]\nstep_debounce = \"{}\"\n# Optional. Default is the platform data dir (for example ~/.local/share/chatrecap/exports)\n# export_dir = \"/absolute/path/to/exports\"\n\n[log]\nlevel = \"{}\"\n# file = \"/absolute/path/to/chatrecap.log\"\n",
            path.display(),
            DEFAULT_SERVICE_URL,
            DEFAULT_STEP_DEBOUNCE,
            DEFAULT_LOG_LEVEL,
        )
    }
}

fn data_dir() -> Result<PathBuf> {
    let root = dirs::data_dir().ok_or_else(|| {
        anyhow!("cannot resolve data directory; set ui.export_dir and log.file explicitly")
    })?;
    Ok(root.join(APP_NAME))
}

fn parse_duration(raw: &str) -> Result<Duration> {
    if let Some(value) = raw.strip_suffix("ms") {
        let millis: u64 = value
            .parse()
            .with_context(|| format!("invalid duration {raw:?}"))?;
        return Ok(Duration::from_millis(millis));
    }
    if let Some(value) = raw.strip_suffix('s') {
        let secs: u64 = value
            .parse()
            .with_context(|| format!("invalid duration {raw:?}"))?;
        return Ok(Duration::from_secs(secs));
    }
    if let Some(value) = raw.strip_suffix('m') {
        let mins: u64 = value
            .parse()
            .with_context(|| format!("invalid duration {raw:?}"))?;
        return Ok(Duration::from_secs(mins * 60));
    }

    bail!("invalid duration {raw:?}; use one of: <N>ms, <N>s, <N>m (for example 450ms or 30s)")
}
