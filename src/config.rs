use anyhow::Context;
use log::debug;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::charset;
use crate::engines::EngineTable;
use crate::error::{Result, WebSearchError};
use crate::opener::HostInfo;
use crate::platform;

pub const ENGINES_ENV: &str = "WEB_SEARCH_ENGINES";
pub const CONFIG_ENV: &str = "WEB_SEARCH_CONFIG";
pub const KERNEL_RELEASE_ENV: &str = "WEB_SEARCH_KERNEL_RELEASE";
pub const KERNEL_RELEASE_FILE: &str = "/proc/sys/kernel/osrelease";

/// Contents of `config.toml`.
#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Browser for web URLs; `$BROWSER` takes precedence.
    pub browser: Option<String>,

    /// Extra or replacement engines, name to template.
    pub engines: BTreeMap<String, String>,
}

impl Config {
    /// Loads `explicit` when given (it must exist), otherwise the first
    /// config file found in the usual places, otherwise defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => Self::find_config_path(),
        };

        let Some(path) = path else {
            debug!("No config file found, using built-in engines only");
            return Ok(Self::default());
        };

        debug!("Loading config from {}", path.display());
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    fn find_config_path() -> Option<PathBuf> {
        if let Some(xdg_config) = dirs::config_dir() {
            let xdg_path = xdg_config.join("websearch/config.toml");
            if xdg_path.exists() {
                return Some(xdg_path);
            }
        }

        if let Some(home) = dirs::home_dir() {
            let home_path = home.join(".websearch.toml");
            if home_path.exists() {
                return Some(home_path);
            }
        }

        let current_path = Path::new(".websearch.toml");
        if current_path.exists() {
            return Some(current_path.to_path_buf());
        }

        None
    }
}

/// Snapshot of every environment variable the program reads, taken once
/// at start-up.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    pub os_type: String,
    pub kernel_release: Option<String>,
    pub browser: Option<String>,
    pub charset: Option<String>,
    pub engines: Option<String>,
    pub config_path: Option<PathBuf>,
}

impl Environment {
    pub fn from_process() -> Self {
        let os_type = var(platform::OS_TYPE_ENV).unwrap_or_else(|| platform::default_os_type().to_string());
        let kernel_release = var(KERNEL_RELEASE_ENV).or_else(|| {
            fs::read_to_string(KERNEL_RELEASE_FILE)
                .ok()
                .map(|release| release.trim().to_string())
        });

        let explicit_charset = var(charset::ENCODING_ENV);
        let locale: Vec<Option<String>> = charset::LOCALE_VARS.iter().map(|name| var(name)).collect();
        let charset = charset::detect(
            explicit_charset.as_deref(),
            locale.iter().map(|value| value.as_deref()),
        )
        .map(str::to_string);

        Self {
            os_type,
            kernel_release,
            browser: var("BROWSER"),
            charset,
            engines: var(ENGINES_ENV),
            config_path: var(CONFIG_ENV).map(PathBuf::from),
        }
    }

    /// Host facts for the opener; `$BROWSER` wins over the config file.
    pub fn host_info(&self, config: &Config) -> HostInfo {
        HostInfo {
            os_type: self.os_type.clone(),
            kernel_release: self.kernel_release.clone(),
            browser: self.browser.clone().or_else(|| config.browser.clone()),
        }
    }
}

fn var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.is_empty())
}

/// Parses `WEB_SEARCH_ENGINES`: whitespace-separated `name template` pairs.
pub fn parse_engine_list(raw: &str) -> Result<Vec<(String, String)>> {
    let tokens: Vec<&str> = raw.split_whitespace().collect();
    if tokens.len() % 2 != 0 {
        return Err(WebSearchError::Config(format!(
            "{ENGINES_ENV} must hold name/template pairs, '{}' has no template",
            tokens[tokens.len() - 1]
        )));
    }

    Ok(tokens
        .chunks(2)
        .map(|pair| (pair[0].to_string(), pair[1].to_string()))
        .collect())
}

/// Built-in engines, then the config file, then the environment.
pub fn build_engine_table(config: &Config, environment: &Environment) -> Result<EngineTable> {
    let mut overrides: Vec<(String, String)> = config
        .engines
        .iter()
        .map(|(name, template)| (name.clone(), template.clone()))
        .collect();

    if let Some(raw) = &environment.engines {
        overrides.extend(parse_engine_list(raw)?);
    }

    EngineTable::builtin().with_overrides(overrides)
}
