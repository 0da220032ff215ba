// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Transport layer for talking to the switch's web interface.
//!
//! - [`HttpTransport`]: persistent `reqwest` session with Basic/Digest
//!   authentication negotiation
//! - [`Transport`]: the seam the rest of the library talks to, so an
//!   in-memory device can stand in for real hardware in tests

mod digest;
mod http;

pub use digest::{DigestChallenge, DigestCredentials};
pub use http::{AuthScheme, Credentials, HttpConfig, HttpTransport};

use reqwest::Method;

use crate::error::ProtocolError;

/// A request for one page of the switch's web interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    method: Method,
    path: String,
}

impl Request {
    /// Creates a GET request for a path relative to the switch root.
    ///
    /// The path may carry a query string, e.g. `outlet?1=ON`.
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            path: path.into(),
        }
    }

    /// Returns the HTTP method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the path relative to the switch root, without a leading `/`.
    #[must_use]
    pub fn path(&self) -> &str {
        self.path.trim_start_matches('/')
    }
}

/// Response from the switch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    status: u16,
    body: String,
}

impl Response {
    /// Creates a response with the given status and body.
    #[must_use]
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Returns the HTTP status code.
    #[must_use]
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Returns the raw HTML body.
    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }
}

/// Sends requests to one switch.
///
/// Implementations own their session state (cookies, negotiated
/// authentication scheme), hence `&mut self`.
#[allow(async_fn_in_trait)]
pub trait Transport {
    /// Sends a request and returns the successful response.
    ///
    /// # Errors
    ///
    /// - [`ProtocolError::ConnectionFailed`] on socket or DNS failure
    /// - [`ProtocolError::Timeout`] when the configured timeout elapses
    /// - [`ProtocolError::AuthenticationFailed`] when both Basic and Digest
    ///   credentials are rejected
    /// - [`ProtocolError::UnexpectedStatus`] for any other non-success status
    async fn send(&mut self, request: &Request) -> Result<Response, ProtocolError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_path_strips_leading_slash() {
        let request = Request::get("/outlet?1=ON");
        assert_eq!(request.path(), "outlet?1=ON");
        assert_eq!(request.method(), &Method::GET);
    }
}
