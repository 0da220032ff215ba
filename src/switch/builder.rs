// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Switch builder.

use std::path::PathBuf;
use std::time::Duration;

use crate::config::{Settings, SwitchConfig};
use crate::error::Error;
use crate::protocol::{HttpTransport, Transport};
use crate::switch::PowerSwitch;

/// Builder for [`PowerSwitch`].
///
/// Values set on the builder win over the configuration file, which wins
/// over the defaults. No configuration file is read unless one is
/// requested.
///
/// # Examples
///
/// ```no_run
/// use std::time::Duration;
/// use dlipower_lib::PowerSwitch;
///
/// # fn example() -> dlipower_lib::Result<()> {
/// // Explicit settings only
/// let switch = PowerSwitch::builder()
///     .with_hostname("10.0.0.5")
///     .with_credentials("admin", "1234")
///     .with_cycle_time(Duration::from_secs(5))
///     .build()?;
///
/// // Fill unset values from ~/.dlipower.conf
/// let switch = PowerSwitch::builder()
///     .with_default_config_file()
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct SwitchBuilder {
    args: SwitchConfig,
    config_file: Option<PathBuf>,
}

impl SwitchBuilder {
    /// Creates a builder with nothing set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the host name or IP address, optionally with `:port`.
    #[must_use]
    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.args = self.args.with_hostname(hostname);
        self
    }

    /// Sets the credentials.
    #[must_use]
    pub fn with_credentials(
        mut self,
        userid: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.args = self.args.with_userid(userid).with_password(password);
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.args = self.args.with_timeout(timeout);
        self
    }

    /// Sets the reboot delay.
    #[must_use]
    pub fn with_cycle_time(mut self, cycle_time: Duration) -> Self {
        self.args = self.args.with_cycle_time(cycle_time);
        self
    }

    /// Sets the number of attempts per request.
    #[must_use]
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.args = self.args.with_retries(retries);
        self
    }

    /// Sets the delay between attempts.
    #[must_use]
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.args = self.args.with_retry_delay(delay);
        self
    }

    /// Enables or disables HTTPS.
    #[must_use]
    pub fn with_https(mut self, use_https: bool) -> Self {
        self.args = self.args.with_https(use_https);
        self
    }

    /// Overlays a whole configuration layer; its set fields replace
    /// anything set on the builder so far.
    #[must_use]
    pub fn with_config(mut self, config: SwitchConfig) -> Self {
        self.args = config.merge(self.args);
        self
    }

    /// Reads unset values from the given configuration file.
    #[must_use]
    pub fn with_config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_file = Some(path.into());
        self
    }

    /// Reads unset values from `$DLIPOWER_CONFIG` or `~/.dlipower.conf`.
    #[must_use]
    pub fn with_default_config_file(self) -> Self {
        match SwitchConfig::default_path() {
            Ok(path) => self.with_config_file(path),
            Err(e) => {
                tracing::warn!("{e}");
                self
            }
        }
    }

    /// Merges the layers into concrete settings.
    ///
    /// An unreadable configuration file is logged and ignored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a merged value is invalid.
    pub fn settings(&self) -> Result<Settings, Error> {
        let file = self
            .config_file
            .as_deref()
            .map(SwitchConfig::load_or_default)
            .unwrap_or_default();
        Ok(self.args.clone().merge(file).resolve()?)
    }

    /// Builds an HTTP switch.
    ///
    /// # Errors
    ///
    /// Returns error if the settings are invalid or the HTTP client cannot
    /// be created.
    pub fn build(self) -> Result<PowerSwitch<HttpTransport>, Error> {
        PowerSwitch::new(&self.settings()?)
    }

    /// Builds a switch on a custom transport.
    ///
    /// # Errors
    ///
    /// Returns error if the settings are invalid.
    pub fn build_with_transport<T: Transport>(self, transport: T) -> Result<PowerSwitch<T>, Error> {
        Ok(PowerSwitch::with_transport(transport, &self.settings()?))
    }
}
