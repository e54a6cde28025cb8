// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use kiqdash_app::ThemeMode;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const CONFIG_VERSION: i64 = 1;
const DEFAULT_TIMEOUT: &str = "5s";
const DEFAULT_REFRESH_INTERVAL: &str = "5s";
const DEFAULT_LOG_LEVEL: &str = "info";

pub const CONFIG_PATH_ENV: &str = "KIQDASH_CONFIG_PATH";
pub const REDIS_URL_ENV: &str = "REDIS_URL";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub redis: Redis,
    #[serde(default)]
    pub ui: Ui,
    #[serde(default)]
    pub log: Log,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            redis: Redis::default(),
            ui: Ui::default(),
            log: Log::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Redis {
    pub url: Option<String>,
    pub timeout: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Ui {
    pub theme: Option<String>,
    pub refresh_interval: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Log {
    pub path: Option<String>,
    pub level: Option<String>,
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os(CONFIG_PATH_ENV) {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!("cannot resolve config directory; set {CONFIG_PATH_ENV} to the config file")
        })?;
        Ok(config_root.join(kiqdash_store::APP_NAME).join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
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
                    "config file {} has no version; add `version = 1` and put values under [redis], [ui], and [log]",
                    path.display()
                )
            })?;
        if version != CONFIG_VERSION {
            bail!(
                "unsupported config version {} in {}; expected version = 1",
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
        if let Some(url) = &self.redis.url {
            kiqdash_store::validate_redis_url(url)
                .with_context(|| format!("invalid redis.url in {}", path.display()))?;
        }

        for (key, value) in [
            ("redis.timeout", &self.redis.timeout),
            ("ui.refresh_interval", &self.ui.refresh_interval),
        ] {
            if let Some(raw) = value
                && parse_duration(raw)? == Duration::ZERO
            {
                bail!("{key} in {} must be positive, got {raw}", path.display());
            }
        }

        if let Some(theme) = &self.ui.theme
            && ThemeMode::parse(theme).is_none()
        {
            bail!(
                "ui.theme in {} must be \"dark\" or \"light\", got {theme:?}",
                path.display()
            );
        }

        if let Some(level) = &self.log.level {
            EnvFilter::try_new(level)
                .with_context(|| format!("invalid log.level {level:?} in {}", path.display()))?;
        }

        Ok(())
    }

    /// The configured URL, then `REDIS_URL`, then the local default.
    pub fn redis_url(&self) -> String {
        if let Some(url) = &self.redis.url {
            return url.clone();
        }
        env::var(REDIS_URL_ENV)
            .ok()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| kiqdash_store::DEFAULT_REDIS_URL.to_owned())
    }

    pub fn redis_timeout(&self) -> Result<Duration> {
        parse_duration(self.redis.timeout.as_deref().unwrap_or(DEFAULT_TIMEOUT))
    }

    pub fn theme(&self) -> ThemeMode {
        self.ui
            .theme
            .as_deref()
            .and_then(ThemeMode::parse)
            .unwrap_or(ThemeMode::Dark)
    }

    pub fn refresh_interval(&self) -> Result<Duration> {
        parse_duration(
            self.ui
                .refresh_interval
                .as_deref()
                .unwrap_or(DEFAULT_REFRESH_INTERVAL),
        )
    }

    pub fn log_path(&self) -> Option<PathBuf> {
        self.log.path.as_deref().map(PathBuf::from)
    }

    pub fn log_level(&self) -> &str {
        self.log.level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            "# kiqdash config\n# Place this file at: {}\n\nversion = 1\n\n[redis]\n# Optional. Falls back to REDIS_URL, then {}\n# url = \"redis://127.0.0.1:6379/0\"\ntimeout = \"{}\"\n\n[ui]\ntheme = \"dark\"\nrefresh_interval = \"{}\"\n\n[log]\n# Optional. Nothing is logged unless a path is set.\n# path = \"/tmp/kiqdash.log\"\nlevel = \"{}\"\n",
            path.display(),
            kiqdash_store::DEFAULT_REDIS_URL,
            DEFAULT_TIMEOUT,
            DEFAULT_REFRESH_INTERVAL,
            DEFAULT_LOG_LEVEL,
        )
    }
}

pub fn parse_duration(raw: &str) -> Result<Duration> {
    let raw = raw.trim();
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
        let secs = mins
            .checked_mul(60)
            .ok_or_else(|| anyhow!("duration {raw:?} is too large"))?;
        return Ok(Duration::from_secs(secs));
    }

    bail!("invalid duration {raw:?}; use one of: <N>ms, <N>s, <N>m (for example 500ms or 5s)")
}
