// SPDX-FileCopyrightText: 2024 jellyfin-time-limiter contributors
//
// SPDX-License-Identifier: GPL-3.0-only

use std::{
    env, fmt, fs, io,
    path::{Path, PathBuf},
    str::FromStr,
    time::Duration,
};

use crate::error::{Error, Result};

const CONF_PATH: &str = "/etc/jellyfin-time-limiter.conf";
const CONF_PATH_ENV: &str = "JELLYFIN_TIME_LIMITER_CONF";

const DEFAULT_BASE_URL: &str = "http://localhost:8096";
const DEFAULT_MAX_WATCH_TIME_MINUTES: u32 = 90;
const DEFAULT_USAGE_PLUGIN_PATH: &str = "user_usage_stats";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_CLIENT_NAME: &str = "jellyfin-time-limiter";

/// What to assume when today's usage cannot be determined.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UsageFallback {
    /// Fail-permissive: keep or grant access
    Enable,
    /// Fail-closed: revoke access
    Disable,
}

impl UsageFallback {
    pub fn enabled(self) -> bool {
        self == Self::Enable
    }
}

impl FromStr for UsageFallback {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, String> {
        match s.to_ascii_lowercase().as_str() {
            "enable" | "enabled" => Ok(Self::Enable),
            "disable" | "disabled" => Ok(Self::Disable),
            _ => Err(format!("expected 'enable' or 'disable', got '{}'", s)),
        }
    }
}

impl fmt::Display for UsageFallback {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Self::Enable => "enable",
            Self::Disable => "disable",
        })
    }
}

/// Contents of the optional TOML file. Every key may be omitted.
#[doc(hidden)]
#[derive(Debug, Default, serde::Deserialize)]
pub struct ConfFile {
    base_url: Option<String>,
    auth_token: Option<String>,
    user_name: Option<String>,
    max_watch_time_minutes: Option<u32>,
    usage_plugin_path: Option<String>,
    on_usage_unavailable: Option<UsageFallback>,
    accept_invalid_certs: Option<bool>,
    request_timeout_secs: Option<u64>,
    log_file: Option<PathBuf>,
    log_level: Option<String>,
    lock_file: Option<PathBuf>,
    client_name: Option<String>,
}

impl ConfFile {
    pub fn read(path: &Path) -> Result<Self> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(err) => {
                return Err(Error::Configuration(format!(
                    "failed to read `{}`: {}",
                    path.display(),
                    err
                )))
            }
        };
        toml::from_slice(&bytes).map_err(|err| {
            Error::Configuration(format!("failed to parse `{}`: {}", path.display(), err))
        })
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub base_url: String,
    pub auth_token: String,
    pub user_name: String,
    pub max_watch_time_minutes: u32,
    pub usage_plugin_path: String,
    pub on_usage_unavailable: UsageFallback,
    pub accept_invalid_certs: bool,
    pub request_timeout: Duration,
    pub log_file: Option<PathBuf>,
    pub log_level: log::Level,
    pub lock_file: Option<PathBuf>,
    pub client_name: String,
}

fn parse<T: FromStr>(key: &str, value: &str) -> Result<T>
where
    T::Err: fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|err| Error::Configuration(format!("invalid {} '{}': {}", key, value, err)))
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(Error::Configuration(format!(
            "invalid {} '{}': expected a boolean",
            key, value
        ))),
    }
}

impl Config {
    /// Defaults, then the TOML file, then the process environment.
    pub fn load() -> Result<Self> {
        let path = env::var_os(CONF_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(CONF_PATH));
        let file = ConfFile::read(&path)?;
        Self::from_sources(file, |key| env::var(key).ok())
    }

    /// Build from a parsed file and an environment lookup. Empty environment
    /// values count as unset.
    pub fn from_sources<F>(file: ConfFile, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| env(key).filter(|value| !value.trim().is_empty());
        let required = |key: &str, file_value: Option<String>| {
            var(key)
                .or(file_value.filter(|value| !value.trim().is_empty()))
                .ok_or_else(|| Error::Configuration(format!("{} is not set", key)))
        };

        let auth_token = required("AUTH_TOKEN", file.auth_token)?;
        let user_name = required("USER_NAME", file.user_name)?;

        let max_watch_time_minutes = match var("MAX_WATCH_TIME_MINUTES") {
            Some(value) => parse("MAX_WATCH_TIME_MINUTES", &value)?,
            None => file
                .max_watch_time_minutes
                .unwrap_or(DEFAULT_MAX_WATCH_TIME_MINUTES),
        };
        let on_usage_unavailable = match var("ON_USAGE_UNAVAILABLE") {
            Some(value) => parse("ON_USAGE_UNAVAILABLE", &value)?,
            None => file.on_usage_unavailable.unwrap_or(UsageFallback::Enable),
        };
        let accept_invalid_certs = match var("ACCEPT_INVALID_CERTS") {
            Some(value) => parse_bool("ACCEPT_INVALID_CERTS", &value)?,
            None => file.accept_invalid_certs.unwrap_or(false),
        };
        let request_timeout_secs = match var("REQUEST_TIMEOUT_SECS") {
            Some(value) => parse("REQUEST_TIMEOUT_SECS", &value)?,
            None => file
                .request_timeout_secs
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        };
        let log_level = match var("LOG_LEVEL").or(file.log_level) {
            Some(value) => parse("LOG_LEVEL", &value)?,
            None => log::Level::Info,
        };

        Ok(Self {
            base_url: var("BASE_URL")
                .or(file.base_url)
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            auth_token,
            user_name,
            max_watch_time_minutes,
            usage_plugin_path: var("USAGE_PLUGIN_PATH")
                .or(file.usage_plugin_path)
                .unwrap_or_else(|| DEFAULT_USAGE_PLUGIN_PATH.to_string()),
            on_usage_unavailable,
            accept_invalid_certs,
            request_timeout: Duration::from_secs(request_timeout_secs),
            log_file: var("LOG_FILE").map(PathBuf::from).or(file.log_file),
            log_level,
            lock_file: var("LOCK_FILE").map(PathBuf::from).or(file.lock_file),
            client_name: var("CLIENT_NAME")
                .or(file.client_name)
                .unwrap_or_else(|| DEFAULT_CLIENT_NAME.to_string()),
        })
    }

    pub fn api_options(&self) -> jellyfin_client::Options {
        jellyfin_client::Options {
            base_url: self.base_url.clone(),
            client_name: self.client_name.clone(),
            token: self.auth_token.clone(),
            accept_invalid_certs: self.accept_invalid_certs,
            timeout: self.request_timeout,
        }
    }
}
