// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! HTTP transport for the switch's web interface.

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, WWW_AUTHENTICATE};
use reqwest::{Client, StatusCode, Url};

use crate::error::ProtocolError;
use crate::protocol::digest::{DigestChallenge, DigestCredentials};
use crate::protocol::{Request, Response, Transport};

// ============================================================================
// HttpConfig - Connection parameters for one switch
// ============================================================================

/// Connection parameters for one switch.
///
/// # Examples
///
/// ```
/// use dlipower_lib::protocol::HttpConfig;
/// use std::time::Duration;
///
/// let config = HttpConfig::new("192.168.0.100")
///     .with_https()
///     .with_credentials("admin", "1234")
///     .with_timeout(Duration::from_secs(5));
///
/// assert_eq!(config.base_url(), "https://192.168.0.100");
/// ```
#[derive(Debug, Clone)]
pub struct HttpConfig {
    host: String,
    port: Option<u16>,
    use_https: bool,
    credentials: Credentials,
    timeout: Duration,
}

impl HttpConfig {
    /// Default request timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

    /// Creates a configuration for the given host name or IP address.
    ///
    /// A host given as `http://...` or `https://...` keeps its scheme.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        let host = host.into();
        let (host, use_https) = if let Some(rest) = host.strip_prefix("https://") {
            (rest.to_string(), true)
        } else if let Some(rest) = host.strip_prefix("http://") {
            (rest.to_string(), false)
        } else {
            (host, false)
        };

        Self {
            host: host.trim_end_matches('/').to_string(),
            port: None,
            use_https,
            credentials: Credentials::default(),
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    /// Sets a custom port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Enables HTTPS.
    ///
    /// Self-signed certificates are accepted: the switches ship with one.
    #[must_use]
    pub fn with_https(mut self) -> Self {
        self.use_https = true;
        self
    }

    /// Sets authentication credentials.
    #[must_use]
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.credentials = Credentials {
            username: username.into(),
            password: password.into(),
        };
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the host.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns whether HTTPS is enabled.
    #[must_use]
    pub fn use_https(&self) -> bool {
        self.use_https
    }

    /// Returns the credentials.
    #[must_use]
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Returns the timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Builds the base URL from this configuration.
    #[must_use]
    pub fn base_url(&self) -> String {
        let scheme = if self.use_https { "https" } else { "http" };
        match self.port {
            Some(port) => format!("{scheme}://{}:{port}", self.host),
            None => format!("{scheme}://{}", self.host),
        }
    }

    /// Creates an [`HttpTransport`] from this configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the base URL is invalid or the HTTP client cannot be
    /// created.
    pub fn into_transport(self) -> Result<HttpTransport, ProtocolError> {
        let base_url = Url::parse(&format!("{}/", self.base_url()))
            .map_err(|e| ProtocolError::InvalidAddress(format!("{}: {e}", self.host)))?;

        let client = Client::builder()
            .timeout(self.timeout)
            .cookie_store(true)
            .danger_accept_invalid_certs(self.use_https)
            .build()
            .map_err(ProtocolError::Http)?;

        Ok(HttpTransport {
            base_url,
            client,
            credentials: self.credentials,
            timeout: self.timeout,
            scheme: AuthScheme::Unknown,
            digest: None,
        })
    }
}

// ============================================================================
// HttpTransport - Persistent session with auth negotiation
// ============================================================================

/// HTTP authentication credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Username for authentication.
    pub username: String,
    /// Password for authentication.
    pub password: String,
}

impl Default for Credentials {
    fn default() -> Self {
        Self {
            username: "admin".to_string(),
            password: "admin".to_string(),
        }
    }
}

/// Authentication scheme accepted by the switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthScheme {
    /// Not yet negotiated.
    #[default]
    Unknown,
    /// HTTP Basic.
    Basic,
    /// HTTP Digest.
    Digest,
}

/// HTTP session with one switch.
///
/// The first request goes out with Basic credentials. On `401` the same
/// request is repeated once with Digest credentials built from the
/// server's challenge. Whichever scheme succeeds is kept for the lifetime
/// of the transport.
///
/// # Examples
///
/// ```no_run
/// use dlipower_lib::protocol::{HttpConfig, Request, Transport};
///
/// # async fn example() -> dlipower_lib::Result<()> {
/// let mut transport = HttpConfig::new("192.168.0.100")
///     .with_credentials("admin", "1234")
///     .into_transport()?;
/// let response = transport.send(&Request::get("index.htm")).await?;
/// println!("{}", response.body());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct HttpTransport {
    base_url: Url,
    client: Client,
    credentials: Credentials,
    timeout: Duration,
    scheme: AuthScheme,
    digest: Option<DigestCredentials>,
}

enum Auth<'a> {
    Basic,
    Digest(&'a str),
}

impl HttpTransport {
    /// Returns the base URL of the switch.
    #[must_use]
    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    /// Returns the negotiated authentication scheme.
    #[must_use]
    pub fn auth_scheme(&self) -> AuthScheme {
        self.scheme
    }

    fn url_for(&self, request: &Request) -> Result<Url, ProtocolError> {
        self.base_url
            .join(request.path())
            .map_err(|e| ProtocolError::InvalidAddress(format!("{}: {e}", request.path())))
    }

    async fn execute(
        &self,
        request: &Request,
        url: &Url,
        auth: Auth<'_>,
    ) -> Result<reqwest::Response, ProtocolError> {
        let builder = self.client.request(request.method().clone(), url.clone());
        let builder = match auth {
            Auth::Basic => builder.basic_auth(
                &self.credentials.username,
                Some(&self.credentials.password),
            ),
            Auth::Digest(header) => builder.header(AUTHORIZATION, header),
        };

        builder.send().await.map_err(|e| self.classify(e))
    }

    async fn execute_digest(
        &mut self,
        request: &Request,
        url: &Url,
    ) -> Result<Option<reqwest::Response>, ProtocolError> {
        let uri = request_target(url);
        let Some(digest) = self.digest.as_mut() else {
            return Ok(None);
        };
        let header = digest.authorization(
            request.method().as_str(),
            &uri,
            &self.credentials.username,
            &self.credentials.password,
        );
        self.execute(request, url, Auth::Digest(&header))
            .await
            .map(Some)
    }

    /// Stores the Digest challenge carried by a `401` response, if any.
    fn accept_challenge(&mut self, response: &reqwest::Response) -> bool {
        let challenge = response
            .headers()
            .get_all(WWW_AUTHENTICATE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .find_map(DigestChallenge::parse);

        match challenge {
            Some(challenge) => {
                self.digest = Some(DigestCredentials::new(challenge));
                true
            }
            None => false,
        }
    }

    async fn send_digest(
        &mut self,
        request: &Request,
        url: &Url,
    ) -> Result<reqwest::Response, ProtocolError> {
        let Some(response) = self.execute_digest(request, url).await? else {
            return Err(ProtocolError::AuthenticationFailed);
        };
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        // The nonce may have expired; answer the fresh challenge once.
        tracing::debug!("Digest credentials rejected, retrying with new challenge");
        if !self.accept_challenge(&response) {
            return Err(ProtocolError::AuthenticationFailed);
        }
        match self.execute_digest(request, url).await? {
            Some(response) if response.status() != StatusCode::UNAUTHORIZED => Ok(response),
            _ => Err(ProtocolError::AuthenticationFailed),
        }
    }

    async fn authenticated(
        &mut self,
        request: &Request,
        url: &Url,
    ) -> Result<reqwest::Response, ProtocolError> {
        if self.scheme == AuthScheme::Digest {
            return self.send_digest(request, url).await;
        }

        let response = self.execute(request, url, Auth::Basic).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            if self.scheme == AuthScheme::Unknown {
                tracing::info!(url = %self.base_url, "Switch accepted Basic authentication");
                self.scheme = AuthScheme::Basic;
            }
            return Ok(response);
        }

        tracing::debug!("Basic credentials rejected, falling back to Digest");
        if !self.accept_challenge(&response) {
            return Err(ProtocolError::AuthenticationFailed);
        }
        let response = self.send_digest(request, url).await?;
        tracing::info!(url = %self.base_url, "Switch accepted Digest authentication");
        self.scheme = AuthScheme::Digest;
        Ok(response)
    }

    fn classify(&self, err: reqwest::Error) -> ProtocolError {
        if err.is_timeout() {
            ProtocolError::Timeout(self.timeout)
        } else if err.is_connect() || err.is_request() || err.is_body() || err.is_redirect() {
            ProtocolError::ConnectionFailed(err.to_string())
        } else {
            ProtocolError::Http(err)
        }
    }
}

impl Transport for HttpTransport {
    async fn send(&mut self, request: &Request) -> Result<Response, ProtocolError> {
        let url = self.url_for(request)?;

        tracing::debug!(
            method = %request.method(),
            url = %url,
            scheme = ?self.scheme,
            "Sending HTTP request"
        );

        let response = self.authenticated(request, &url).await?;
        let status = response.status();

        tracing::debug!(status = status.as_u16(), "Received HTTP response");

        if !status.is_success() {
            return Err(ProtocolError::UnexpectedStatus(status.as_u16()));
        }

        let body = response.text().await.map_err(|e| self.classify(e))?;
        Ok(Response::new(status.as_u16(), body))
    }
}

/// Returns the request target (path and query) used in the Digest `uri`.
fn request_target(url: &Url) -> String {
    match url.query() {
        Some(query) => format!("{}?{query}", url.path()),
        None => url.path().to_string(),
    }
}
