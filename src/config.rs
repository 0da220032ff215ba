// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Switch configuration.
//!
//! Settings come from three layers with a fixed precedence:
//!
//! 1. explicit values (constructor arguments, command-line flags)
//! 2. the configuration file (`$DLIPOWER_CONFIG` or `~/.dlipower.conf`)
//! 3. built-in defaults
//!
//! Each layer is a [`SwitchConfig`] with every field optional. Layers are
//! combined with [`SwitchConfig::merge`] and turned into concrete
//! [`Settings`] once, by [`SwitchConfig::resolve`].
//!
//! # Examples
//!
//! ```
//! use std::time::Duration;
//! use dlipower_lib::config::SwitchConfig;
//!
//! let file = SwitchConfig::new().with_hostname("10.0.0.5").with_password("1234");
//! let args = SwitchConfig::new().with_hostname("10.0.0.9");
//!
//! let settings = args.merge(file).resolve().unwrap();
//! assert_eq!(settings.hostname, "10.0.0.9");
//! assert_eq!(settings.password, "1234");
//! assert_eq!(settings.timeout, Duration::from_secs(20));
//! ```

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::protocol::HttpConfig;
use crate::retry::RetryPolicy;

/// Environment variable overriding the configuration file location.
pub const CONFIG_ENV: &str = "DLIPOWER_CONFIG";

/// File name of the configuration file in the home directory.
pub const CONFIG_FILE_NAME: &str = ".dlipower.conf";

/// Default switch address.
pub const DEFAULT_HOSTNAME: &str = "192.168.0.100";
/// Default user name.
pub const DEFAULT_USERID: &str = "admin";
/// Default password.
pub const DEFAULT_PASSWORD: &str = "admin";
/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);
/// Default delay between the OFF and ON phases of a reboot.
pub const DEFAULT_CYCLE_TIME: Duration = Duration::from_secs(3);

/// One layer of switch configuration. Unset fields fall through to the
/// next layer.
///
/// Serialized as a flat JSON object; durations are in seconds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwitchConfig {
    /// Host name or IP address of the switch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    /// User name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub userid: Option<String>,
    /// Password.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Request timeout in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<f64>,
    /// Reboot delay in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cycletime: Option<f64>,
    /// Attempts per request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retries: Option<u32>,
    /// Delay between attempts in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_delay: Option<f64>,
    /// Whether to talk HTTPS.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_https: Option<bool>,
}

impl SwitchConfig {
    /// Creates an empty layer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the host name or IP address.
    #[must_use]
    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = Some(hostname.into());
        self
    }

    /// Sets the user name.
    #[must_use]
    pub fn with_userid(mut self, userid: impl Into<String>) -> Self {
        self.userid = Some(userid.into());
        self
    }

    /// Sets the password.
    #[must_use]
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout.as_secs_f64());
        self
    }

    /// Sets the reboot delay.
    #[must_use]
    pub fn with_cycle_time(mut self, cycle_time: Duration) -> Self {
        self.cycletime = Some(cycle_time.as_secs_f64());
        self
    }

    /// Sets the number of attempts per request.
    #[must_use]
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = Some(retries);
        self
    }

    /// Sets the delay between attempts.
    #[must_use]
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = Some(delay.as_secs_f64());
        self
    }

    /// Enables or disables HTTPS.
    #[must_use]
    pub fn with_https(mut self, use_https: bool) -> Self {
        self.use_https = Some(use_https);
        self
    }

    /// Combines two layers; values set in `self` win over `lower`.
    #[must_use]
    pub fn merge(self, lower: SwitchConfig) -> SwitchConfig {
        SwitchConfig {
            hostname: self.hostname.or(lower.hostname),
            userid: self.userid.or(lower.userid),
            password: self.password.or(lower.password),
            timeout: self.timeout.or(lower.timeout),
            cycletime: self.cycletime.or(lower.cycletime),
            retries: self.retries.or(lower.retries),
            retry_delay: self.retry_delay.or(lower.retry_delay),
            use_https: self.use_https.or(lower.use_https),
        }
    }

    /// Fills unset fields with defaults and validates the result.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for zero attempts, a zero
    /// timeout, or negative/non-finite durations.
    pub fn resolve(self) -> Result<Settings, ConfigError> {
        let timeout = seconds("timeout", self.timeout, DEFAULT_TIMEOUT)?;
        if timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "timeout",
                message: "must be greater than zero".to_string(),
            });
        }

        let attempts = self.retries.unwrap_or(RetryPolicy::DEFAULT_ATTEMPTS);
        if attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "retries",
                message: "at least one attempt is required".to_string(),
            });
        }

        Ok(Settings {
            hostname: self
                .hostname
                .unwrap_or_else(|| DEFAULT_HOSTNAME.to_string()),
            userid: self.userid.unwrap_or_else(|| DEFAULT_USERID.to_string()),
            password: self
                .password
                .unwrap_or_else(|| DEFAULT_PASSWORD.to_string()),
            timeout,
            cycle_time: seconds("cycletime", self.cycletime, DEFAULT_CYCLE_TIME)?,
            retry: RetryPolicy {
                attempts,
                delay: seconds("retry_delay", self.retry_delay, RetryPolicy::DEFAULT_DELAY)?,
            },
            use_https: self.use_https.unwrap_or(false),
        })
    }

    /// Returns the configuration file location.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoConfigLocation`] if neither the environment
    /// variable nor a home directory is available.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return Ok(PathBuf::from(path));
        }
        dirs::home_dir()
            .map(|home| home.join(CONFIG_FILE_NAME))
            .ok_or(ConfigError::NoConfigLocation)
    }

    /// Loads a layer from a file. A missing file is an empty layer.
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Loads a layer from a file, logging and ignoring any failure.
    #[must_use]
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Ignoring configuration file {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// Writes this layer to a file, readable by the owner only.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let io_error = |source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        };

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(io_error)?;
        }

        let json = serde_json::to_string_pretty(self)?;

        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(path).map_err(io_error)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(fs::Permissions::from_mode(0o600))
                .map_err(io_error)?;
        }

        file.write_all(json.as_bytes()).map_err(io_error)?;
        file.write_all(b"\n").map_err(io_error)?;
        tracing::info!("Saved configuration to {}", path.display());
        Ok(())
    }
}

fn seconds(
    field: &'static str,
    value: Option<f64>,
    default: Duration,
) -> Result<Duration, ConfigError> {
    match value {
        None => Ok(default),
        Some(secs) => {
            Duration::try_from_secs_f64(secs).map_err(|e| ConfigError::InvalidValue {
                field,
                message: format!("{secs}: {e}"),
            })
        }
    }
}

/// Fully resolved switch settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Host name or IP address of the switch.
    pub hostname: String,
    /// User name.
    pub userid: String,
    /// Password.
    pub password: String,
    /// Request timeout.
    pub timeout: Duration,
    /// Delay between the OFF and ON phases of a reboot.
    pub cycle_time: Duration,
    /// Retry policy applied to every request.
    pub retry: RetryPolicy,
    /// Whether to talk HTTPS.
    pub use_https: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            hostname: DEFAULT_HOSTNAME.to_string(),
            userid: DEFAULT_USERID.to_string(),
            password: DEFAULT_PASSWORD.to_string(),
            timeout: DEFAULT_TIMEOUT,
            cycle_time: DEFAULT_CYCLE_TIME,
            retry: RetryPolicy::default(),
            use_https: false,
        }
    }
}

impl Settings {
    /// Builds the HTTP connection parameters.
    #[must_use]
    pub fn http_config(&self) -> HttpConfig {
        let config = HttpConfig::new(&self.hostname)
            .with_credentials(&self.userid, &self.password)
            .with_timeout(self.timeout);
        if self.use_https {
            config.with_https()
        } else {
            config
        }
    }

    /// Converts the settings back into a fully populated layer for saving.
    #[must_use]
    pub fn to_config(&self) -> SwitchConfig {
        SwitchConfig::new()
            .with_hostname(&self.hostname)
            .with_userid(&self.userid)
            .with_password(&self.password)
            .with_timeout(self.timeout)
            .with_cycle_time(self.cycle_time)
            .with_retries(self.retry.attempts)
            .with_retry_delay(self.retry.delay)
            .with_https(self.use_https)
    }
}
