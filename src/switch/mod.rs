// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! High-level switch abstraction.
//!
//! [`PowerSwitch`] owns the session with one device and keeps the last
//! outlet table it parsed. Every network-touching operation takes
//! `&mut self`, so requests to one switch never overlap; distinct switches
//! share nothing and can be driven concurrently.
//!
//! ```no_run
//! use dlipower_lib::PowerSwitch;
//!
//! # async fn example() -> dlipower_lib::Result<()> {
//! let mut switch = PowerSwitch::builder()
//!     .with_hostname("192.168.0.100")
//!     .with_credentials("admin", "1234")
//!     .build()?;
//!
//! switch.off("Cisco Router").await?;
//! switch.reboot(2u32).await?;
//! for (number, name, state) in switch.list_all().await? {
//!     println!("{number} {name} {state}");
//! }
//! # Ok(())
//! # }
//! ```

mod builder;

pub use builder::SwitchBuilder;

use std::fmt;
use std::time::Duration;

use crate::command::{Command, OutletCommand};
use crate::config::Settings;
use crate::error::{DeviceError, Error};
use crate::parser::parse_outlet_table;
use crate::protocol::{AuthScheme, HttpTransport, Request, Response, Transport};
use crate::retry::RetryPolicy;
use crate::types::{OutletCollection, OutletSelector, PowerState};

/// A web power switch.
///
/// The type parameter is the transport; it defaults to [`HttpTransport`].
/// Tests and simulations can plug in any other [`Transport`].
#[derive(Debug)]
pub struct PowerSwitch<T: Transport = HttpTransport> {
    transport: T,
    hostname: String,
    cycle_time: Duration,
    retry: RetryPolicy,
    snapshot: Option<OutletCollection>,
}

impl PowerSwitch<HttpTransport> {
    /// Creates a builder for an HTTP switch.
    #[must_use]
    pub fn builder() -> SwitchBuilder {
        SwitchBuilder::new()
    }

    /// Creates an HTTP switch from resolved settings.
    ///
    /// No request is sent until the first operation.
    ///
    /// # Errors
    ///
    /// Returns error if the address is invalid or the HTTP client cannot be
    /// created.
    pub fn new(settings: &Settings) -> Result<Self, Error> {
        let transport = settings.http_config().into_transport()?;
        Ok(Self::with_transport(transport, settings))
    }

    /// Returns the authentication scheme negotiated so far.
    #[must_use]
    pub fn auth_scheme(&self) -> AuthScheme {
        self.transport.auth_scheme()
    }
}

impl<T: Transport> PowerSwitch<T> {
    /// Creates a switch on top of an existing transport.
    ///
    /// Connection settings (address, credentials, timeout) are the
    /// transport's business; only the host name, cycle time and retry
    /// policy are taken from `settings`.
    pub fn with_transport(transport: T, settings: &Settings) -> Self {
        Self {
            transport,
            hostname: settings.hostname.clone(),
            cycle_time: settings.cycle_time,
            retry: settings.retry,
            snapshot: None,
        }
    }

    /// Returns the configured host name.
    #[must_use]
    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    /// Returns the delay between the OFF and ON phases of a reboot.
    #[must_use]
    pub fn cycle_time(&self) -> Duration {
        self.cycle_time
    }

    /// Returns the retry policy.
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Returns the underlying transport.
    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Returns the last parsed outlet table without contacting the switch.
    ///
    /// `None` until the first successful refresh.
    #[must_use]
    pub fn snapshot(&self) -> Option<&OutletCollection> {
        self.snapshot.as_ref()
    }

    // ========== Outlet State Model ==========

    /// Fetches and parses the status page, replacing the cached snapshot.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails after retries or the page cannot
    /// be parsed. The cached snapshot is left untouched on failure.
    pub async fn refresh(&mut self) -> Result<OutletCollection, Error> {
        let response = self.send(&OutletCommand::Status).await?;
        let outlets = parse_outlet_table(response.body())?;
        self.snapshot = Some(outlets.clone());
        Ok(outlets)
    }

    /// Resolves an outlet number or name to an outlet number.
    ///
    /// Uses the cached snapshot, fetching one first if there is none.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Lookup`] if the number is out of range or the name
    /// matches no outlet or several outlets.
    pub async fn resolve(&mut self, outlet: impl Into<OutletSelector>) -> Result<u32, Error> {
        let selector = outlet.into();
        if let Some(outlets) = &self.snapshot {
            return Ok(outlets.resolve(&selector)?);
        }
        let outlets = self.refresh().await?;
        Ok(outlets.resolve(&selector)?)
    }

    // ========== Command Executor ==========

    /// Returns the current state of an outlet.
    ///
    /// # Errors
    ///
    /// Returns error if the switch cannot be read or the outlet is unknown.
    pub async fn get_state(&mut self, outlet: impl Into<OutletSelector>) -> Result<PowerState, Error> {
        let outlets = self.refresh().await?;
        let number = outlets.resolve(&outlet.into())?;
        outlets
            .get_by_number(number)
            .map(|outlet| outlet.state())
            .ok_or_else(|| DeviceError::OutletMissing(number).into())
    }

    /// Switches an outlet and returns the state observed afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::StateNotConfirmed`] if the switch reports a
    /// different state after the request, or any transport, parse or
    /// lookup error on the way.
    pub async fn set_state(
        &mut self,
        outlet: impl Into<OutletSelector>,
        state: PowerState,
    ) -> Result<PowerState, Error> {
        let number = self.resolve(outlet).await?;
        tracing::debug!(outlet = number, %state, "Switching outlet");

        let response = self
            .send(&OutletCommand::SetState {
                outlet: number,
                state,
            })
            .await?;
        let outlets = self.confirm(response).await?;

        let observed = outlets
            .get_by_number(number)
            .map(|outlet| outlet.state())
            .ok_or(DeviceError::OutletMissing(number))?;
        if observed != state {
            return Err(DeviceError::StateNotConfirmed {
                outlet: number,
                expected: state,
                observed,
            }
            .into());
        }
        Ok(observed)
    }

    /// Turns an outlet on.
    ///
    /// # Errors
    ///
    /// Same as [`set_state`](Self::set_state).
    pub async fn on(&mut self, outlet: impl Into<OutletSelector>) -> Result<PowerState, Error> {
        self.set_state(outlet, PowerState::On).await
    }

    /// Turns an outlet off.
    ///
    /// # Errors
    ///
    /// Same as [`set_state`](Self::set_state).
    pub async fn off(&mut self, outlet: impl Into<OutletSelector>) -> Result<PowerState, Error> {
        self.set_state(outlet, PowerState::Off).await
    }

    /// Power-cycles an outlet: OFF, wait the cycle time, ON.
    ///
    /// The ON request is only sent once OFF has been confirmed.
    ///
    /// # Errors
    ///
    /// Returns the error of whichever phase failed.
    pub async fn reboot(&mut self, outlet: impl Into<OutletSelector>) -> Result<(), Error> {
        let number = self.resolve(outlet).await?;
        tracing::info!(outlet = number, cycle_time = ?self.cycle_time, "Rebooting outlet");

        self.set_state(number, PowerState::Off).await?;
        tokio::time::sleep(self.cycle_time).await;
        self.set_state(number, PowerState::On).await?;
        Ok(())
    }

    /// Renames an outlet.
    ///
    /// Returns `false` when the switch accepted the request but reports a
    /// different description afterwards, e.g. because the firmware cut a
    /// long name short.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the status page cannot be read.
    pub async fn rename(
        &mut self,
        outlet: impl Into<OutletSelector>,
        name: &str,
    ) -> Result<bool, Error> {
        let number = self.resolve(outlet).await?;
        let response = self
            .send(&OutletCommand::Rename {
                outlet: number,
                name: name.to_string(),
            })
            .await?;
        let outlets = self.confirm(response).await?;

        let description = outlets
            .get_by_number(number)
            .map(|outlet| outlet.description().to_string())
            .ok_or(DeviceError::OutletMissing(number))?;
        let confirmed = description == name.trim();
        if !confirmed {
            tracing::warn!(
                outlet = number,
                requested = name,
                reported = %description,
                "Switch reports a different outlet name after rename"
            );
        }
        Ok(confirmed)
    }

    /// Returns the current description of an outlet.
    ///
    /// # Errors
    ///
    /// Returns error if the switch cannot be read or the outlet is unknown.
    pub async fn outlet_name(&mut self, outlet: impl Into<OutletSelector>) -> Result<String, Error> {
        let outlets = self.refresh().await?;
        let number = outlets.resolve(&outlet.into())?;
        outlets
            .get_by_number(number)
            .map(|outlet| outlet.description().to_string())
            .ok_or_else(|| DeviceError::OutletMissing(number).into())
    }

    /// Refreshes and returns every outlet as `(number, name, state)`.
    ///
    /// # Errors
    ///
    /// Same as [`refresh`](Self::refresh).
    pub async fn list_all(&mut self) -> Result<Vec<(u32, String, PowerState)>, Error> {
        Ok(self.refresh().await?.to_tuples())
    }

    // ========== Verify ==========

    /// Returns true if the switch is reachable, accepts the credentials and
    /// serves a status page that parses.
    ///
    /// Connectivity, authentication and parse failures yield `Ok(false)`.
    ///
    /// # Errors
    ///
    /// Only errors that point at a local problem, such as an unusable
    /// address, are returned.
    pub async fn verify(&mut self) -> Result<bool, Error> {
        match self.refresh().await {
            Ok(_) => Ok(true),
            Err(err) if err.is_connectivity_error() || matches!(err, Error::Parse(_)) => {
                tracing::debug!(host = %self.hostname, error = %err, "Switch not verified");
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }

    // ========== Internals ==========

    /// Sends a command, retrying retryable transport errors.
    async fn send<C: Command>(&mut self, command: &C) -> Result<Response, Error> {
        let request = command.to_request();
        self.send_with_retry(&request).await
    }

    async fn send_with_retry(&mut self, request: &Request) -> Result<Response, Error> {
        let mut attempts = 0;
        loop {
            attempts += 1;
            let err = match self.transport.send(request).await {
                Ok(response) => return Ok(response),
                Err(err) => err,
            };

            if !err.is_retryable() {
                return Err(err.into());
            }
            if !self.retry.should_retry(attempts) {
                if attempts > 1 {
                    return Err(Error::RetriesExhausted {
                        attempts,
                        source: err,
                    });
                }
                return Err(err.into());
            }

            tracing::warn!(
                path = request.path(),
                attempt = attempts,
                remaining = self.retry.attempts - attempts,
                error = %err,
                "Request failed, retrying"
            );
            tokio::time::sleep(self.retry.delay).await;
        }
    }

    /// Reads the outlet table after a command.
    ///
    /// The firmware usually answers a command with the status page; when
    /// it does not, the page is fetched separately.
    async fn confirm(&mut self, response: Response) -> Result<OutletCollection, Error> {
        match parse_outlet_table(response.body()) {
            Ok(outlets) => {
                self.snapshot = Some(outlets.clone());
                Ok(outlets)
            }
            Err(err) => {
                tracing::debug!(error = %err, "Command response is not a status page, refreshing");
                self.refresh().await
            }
        }
    }
}

/// Renders the outlet table of the last snapshot.
impl<T: Transport> fmt::Display for PowerSwitch<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.snapshot {
            Some(outlets) => write!(f, "{outlets}"),
            None => write!(f, "{} (UNCONNECTED)", self.hostname),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProtocolError;
    use std::collections::VecDeque;

    const PAGE: &str = "<table><tr><th>#</th><th>Name</th><th>State</th></tr>\
        <tr><td>1</td><td>Router</td><td>ON</td></tr>\
        <tr><td>2</td><td>Modem</td><td>OFF</td></tr></table>";

    /// Replays canned results and records requested paths.
    #[derive(Debug, Default)]
    struct Scripted {
        replies: VecDeque<Result<Response, ProtocolError>>,
        paths: Vec<String>,
    }

    impl Scripted {
        fn new(replies: Vec<Result<Response, ProtocolError>>) -> Self {
            Self {
                replies: replies.into(),
                paths: Vec::new(),
            }
        }
    }

    impl Transport for Scripted {
        async fn send(&mut self, request: &Request) -> Result<Response, ProtocolError> {
            self.paths.push(request.path().to_string());
            self.replies
                .pop_front()
                .unwrap_or(Err(ProtocolError::ConnectionFailed("script ended".into())))
        }
    }

    fn page() -> Result<Response, ProtocolError> {
        Ok(Response::new(200, PAGE))
    }

    fn settings(attempts: u32) -> Settings {
        Settings {
            retry: RetryPolicy::new()
                .with_attempts(attempts)
                .with_delay(Duration::ZERO),
            ..Settings::default()
        }
    }

    #[tokio::test]
    async fn display_before_and_after_refresh() {
        let mut switch = PowerSwitch::with_transport(Scripted::new(vec![page()]), &settings(1));
        assert_eq!(switch.to_string(), "192.168.0.100 (UNCONNECTED)");

        switch.refresh().await.unwrap();
        assert!(switch.to_string().starts_with("Outlet\tName"));
    }

    #[tokio::test]
    async fn resolve_uses_cached_snapshot() {
        let mut switch = PowerSwitch::with_transport(Scripted::new(vec![page()]), &settings(1));
        assert_eq!(switch.resolve("modem").await.unwrap(), 2);
        assert_eq!(switch.resolve(1u32).await.unwrap(), 1);
        assert_eq!(switch.transport().paths, vec!["index.htm"]);
    }

    #[tokio::test]
    async fn command_response_page_confirms_state() {
        let changed = PAGE.replace("<td>Modem</td><td>OFF", "<td>Modem</td><td>ON");
        let transport = Scripted::new(vec![page(), Ok(Response::new(200, changed))]);
        let mut switch = PowerSwitch::with_transport(transport, &settings(1));

        assert_eq!(switch.on(2u32).await.unwrap(), PowerState::On);
        assert_eq!(switch.transport().paths, vec!["index.htm", "outlet?2=ON"]);
    }

    #[tokio::test]
    async fn unconfirmed_state_is_an_error() {
        let transport = Scripted::new(vec![page(), page()]);
        let mut switch = PowerSwitch::with_transport(transport, &settings(1));

        let err = switch.on(2u32).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Device(DeviceError::StateNotConfirmed {
                outlet: 2,
                expected: PowerState::On,
                observed: PowerState::Off,
            })
        ));
    }

    #[tokio::test]
    async fn single_attempt_failure_is_not_tagged_as_exhausted() {
        let transport = Scripted::new(vec![Err(ProtocolError::ConnectionFailed("reset".into()))]);
        let mut switch = PowerSwitch::with_transport(transport, &settings(1));

        let err = switch.refresh().await.unwrap_err();
        assert!(matches!(
            err,
            Error::Protocol(ProtocolError::ConnectionFailed(_))
        ));
    }

    #[tokio::test]
    async fn server_errors_are_retried() {
        let transport = Scripted::new(vec![Err(ProtocolError::UnexpectedStatus(503)), page()]);
        let mut switch = PowerSwitch::with_transport(transport, &settings(2));

        assert_eq!(switch.list_all().await.unwrap().len(), 2);
        assert_eq!(switch.transport().paths.len(), 2);
    }

    #[tokio::test]
    async fn client_errors_are_not_retried() {
        let transport = Scripted::new(vec![Err(ProtocolError::UnexpectedStatus(404)), page()]);
        let mut switch = PowerSwitch::with_transport(transport, &settings(3));

        assert!(switch.refresh().await.is_err());
        assert_eq!(switch.transport().paths.len(), 1);
    }

    #[tokio::test]
    async fn verify_propagates_local_errors() {
        let transport = Scripted::new(vec![Err(ProtocolError::InvalidAddress("x".into()))]);
        let mut switch = PowerSwitch::with_transport(transport, &settings(1));
        assert!(switch.verify().await.is_err());
    }
}
