// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the `dlipower_lib` library.
//!
//! Failures are grouped by concern: transport ([`ProtocolError`]), markup
//! interpretation ([`ParseError`]), outlet name resolution ([`LookupError`]),
//! outlet state confirmation ([`DeviceError`]), configuration
//! ([`ConfigError`]) and value validation ([`ValueError`]).
//!
//! Only connection failures, timeouts and server-side (5xx) statuses are
//! retried. When every attempt fails the last transport error is wrapped in
//! [`Error::RetriesExhausted`].

use std::time::Duration;

use thiserror::Error;

use crate::types::PowerState;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// Error occurred during value validation.
    #[error("value error: {0}")]
    Value(#[from] ValueError),

    /// Error occurred while talking to the switch.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// A retryable transport error persisted through every attempt.
    #[error("giving up after {attempts} attempts: {source}")]
    RetriesExhausted {
        /// Number of requests issued before giving up.
        attempts: u32,
        /// The error returned by the last attempt.
        #[source]
        source: ProtocolError,
    },

    /// The status page could not be understood.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// An outlet name or number could not be resolved.
    #[error("lookup error: {0}")]
    Lookup(#[from] LookupError),

    /// The switch did not end up in the requested state.
    #[error("device error: {0}")]
    Device(#[from] DeviceError),

    /// Configuration could not be loaded, saved or validated.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl Error {
    /// Returns the transport error behind this error, if any.
    ///
    /// Looks through [`Error::RetriesExhausted`] so callers can classify
    /// first-attempt and exhausted failures alike.
    #[must_use]
    pub fn protocol_error(&self) -> Option<&ProtocolError> {
        match self {
            Self::Protocol(err) | Self::RetriesExhausted { source: err, .. } => Some(err),
            _ => None,
        }
    }

    /// Returns true if the switch could not be reached, did not answer in
    /// time, or rejected the credentials.
    #[must_use]
    pub fn is_connectivity_error(&self) -> bool {
        matches!(
            self.protocol_error(),
            Some(
                ProtocolError::ConnectionFailed(_)
                    | ProtocolError::Timeout(_)
                    | ProtocolError::AuthenticationFailed
                    | ProtocolError::UnexpectedStatus(_)
            )
        )
    }
}

/// Errors related to value validation and constraints.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// An invalid power state string was provided.
    #[error("invalid power state: {0}")]
    InvalidPowerState(String),

    /// Outlet numbers start at 1.
    #[error("invalid outlet number: {0}")]
    InvalidOutletNumber(String),

    /// An outlet range expression could not be parsed.
    #[error("invalid outlet range: {0}")]
    InvalidRange(String),

    /// A fencing-agent action is not part of the supported vocabulary.
    #[error("unknown action: {0}")]
    UnknownAction(String),
}

/// Errors related to HTTP communication with the switch.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The HTTP client could not be built or failed in an unexpected way.
    #[error("HTTP client error: {0}")]
    Http(#[source] reqwest::Error),

    /// Connection to the switch failed (DNS, refused, reset).
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// No response arrived within the configured timeout.
    #[error("request timed out after {} ms", .0.as_millis())]
    Timeout(Duration),

    /// Both Basic and Digest credentials were rejected.
    #[error("authentication failed")]
    AuthenticationFailed,

    /// The switch answered with a non-success HTTP status.
    #[error("unexpected HTTP status {0}")]
    UnexpectedStatus(u16),

    /// Invalid URL or address.
    #[error("invalid address: {0}")]
    InvalidAddress(String),
}

impl ProtocolError {
    /// Returns true if repeating the request may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::ConnectionFailed(_) | Self::Timeout(_) => true,
            Self::UnexpectedStatus(status) => *status >= 500,
            Self::Http(_) | Self::AuthenticationFailed | Self::InvalidAddress(_) => false,
        }
    }
}

/// Errors related to interpreting the switch's HTML status page.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// No table on the page matches a known outlet table layout.
    #[error("no recognizable outlet table found")]
    UnrecognizedLayout,

    /// The outlet table ends before its closing tag.
    #[error("outlet table is truncated")]
    Truncated,

    /// A row's outlet number cell is not a positive integer.
    #[error("invalid outlet number {0:?}")]
    InvalidOutletNumber(String),

    /// A row's state cell is neither ON nor OFF.
    #[error("outlet {outlet} has invalid state {text:?}")]
    InvalidState {
        /// The outlet the row describes.
        outlet: u32,
        /// The state text as found on the page.
        text: String,
    },

    /// The same outlet number appears on more than one row.
    #[error("outlet {0} is listed more than once")]
    DuplicateOutlet(u32),

    /// An outlet number is absent from a table that lists every outlet.
    #[error("outlet {0} is missing from the outlet table")]
    MissingOutlet(u32),

    /// A data row does not have the cells its layout requires.
    #[error("row {row} has {found} cells, expected {expected}")]
    MissingCell {
        /// Zero-based index of the row within the table.
        row: usize,
        /// Number of cells found.
        found: usize,
        /// Number of cells the layout requires.
        expected: usize,
    },
}

/// Errors resolving an outlet name or number.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LookupError {
    /// No outlet carries this name.
    #[error("outlet name {0:?} unknown")]
    NotFound(String),

    /// More than one outlet carries this name.
    #[error("outlet name {name:?} matches outlets {matches:?}")]
    Ambiguous {
        /// The requested name.
        name: String,
        /// The outlet numbers sharing it.
        matches: Vec<u32>,
    },

    /// The outlet number is not present on the switch.
    #[error("outlet number {number} out of range 1..={count}")]
    OutOfRange {
        /// The requested outlet number.
        number: u32,
        /// Number of outlets on the switch.
        count: usize,
    },
}

/// Errors confirming the outcome of an outlet operation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeviceError {
    /// The switch accepted the request but reports another state.
    #[error("outlet {outlet} is {observed} after requesting {expected}")]
    StateNotConfirmed {
        /// The outlet that was switched.
        outlet: u32,
        /// The requested state.
        expected: PowerState,
        /// The state reported afterwards.
        observed: PowerState,
    },

    /// The outlet vanished from the status page after the operation.
    #[error("outlet {0} missing from status page")]
    OutletMissing(u32),
}

/// Errors related to the configuration file and settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read or written.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// The file involved.
        path: String,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid JSON.
    #[error("invalid configuration file: {0}")]
    Json(#[from] serde_json::Error),

    /// A setting has an unusable value.
    #[error("invalid value for {field}: {message}")]
    InvalidValue {
        /// The offending setting.
        field: &'static str,
        /// Why it was rejected.
        message: String,
    },

    /// No home directory to place the default configuration file in.
    #[error("could not determine the configuration file location")]
    NoConfigLocation,
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;
