// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! HTTP Digest authentication (RFC 2617, MD5 family).

use std::collections::HashMap;

use md5::{Digest, Md5};

/// A parsed `WWW-Authenticate: Digest ...` challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestChallenge {
    realm: String,
    nonce: String,
    opaque: Option<String>,
    qop_auth: bool,
    algorithm: Algorithm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Algorithm {
    Md5,
    Md5Sess,
}

impl Algorithm {
    fn as_str(self) -> &'static str {
        match self {
            Self::Md5 => "MD5",
            Self::Md5Sess => "MD5-sess",
        }
    }
}

impl DigestChallenge {
    /// Parses a challenge header value.
    ///
    /// Returns `None` if the header is not a Digest challenge, lacks a
    /// nonce, or asks for an algorithm other than MD5/MD5-sess.
    #[must_use]
    pub fn parse(header: &str) -> Option<Self> {
        let header = header.trim();
        let (scheme, rest) = header.split_once(char::is_whitespace)?;
        if !scheme.eq_ignore_ascii_case("digest") {
            return None;
        }

        let params = parse_params(rest);
        let nonce = params.get("nonce")?.clone();
        let algorithm = match params.get("algorithm").map(String::as_str) {
            None => Algorithm::Md5,
            Some(name) if name.eq_ignore_ascii_case("md5") => Algorithm::Md5,
            Some(name) if name.eq_ignore_ascii_case("md5-sess") => Algorithm::Md5Sess,
            Some(_) => return None,
        };
        let qop_auth = params.get("qop").is_some_and(|qop| {
            qop.split(',')
                .any(|option| option.trim().eq_ignore_ascii_case("auth"))
        });

        Some(Self {
            realm: params.get("realm").cloned().unwrap_or_default(),
            nonce,
            opaque: params.get("opaque").cloned(),
            qop_auth,
            algorithm,
        })
    }

    /// Returns the protection realm.
    #[must_use]
    pub fn realm(&self) -> &str {
        &self.realm
    }

    /// Returns the server nonce.
    #[must_use]
    pub fn nonce(&self) -> &str {
        &self.nonce
    }
}

/// Digest state for one switch: the last challenge and its nonce count.
#[derive(Debug, Clone)]
pub struct DigestCredentials {
    challenge: DigestChallenge,
    nonce_count: u32,
}

impl DigestCredentials {
    /// Starts a digest session from a server challenge.
    #[must_use]
    pub fn new(challenge: DigestChallenge) -> Self {
        Self {
            challenge,
            nonce_count: 0,
        }
    }

    /// Builds the `Authorization` header for the next request.
    ///
    /// `uri` is the request target as sent on the request line (path and
    /// query). A fresh client nonce is drawn for every request.
    pub fn authorization(
        &mut self,
        method: &str,
        uri: &str,
        username: &str,
        password: &str,
    ) -> String {
        self.nonce_count += 1;
        let cnonce = uuid::Uuid::new_v4().simple().to_string();
        self.authorization_with(method, uri, username, password, &cnonce)
    }

    fn authorization_with(
        &self,
        method: &str,
        uri: &str,
        username: &str,
        password: &str,
        cnonce: &str,
    ) -> String {
        let challenge = &self.challenge;
        let nc = format!("{:08x}", self.nonce_count);

        let mut ha1 = md5_hex(&format!("{username}:{}:{password}", challenge.realm));
        if challenge.algorithm == Algorithm::Md5Sess {
            ha1 = md5_hex(&format!("{ha1}:{}:{cnonce}", challenge.nonce));
        }
        let ha2 = md5_hex(&format!("{method}:{uri}"));

        let response = if challenge.qop_auth {
            md5_hex(&format!("{ha1}:{}:{nc}:{cnonce}:auth:{ha2}", challenge.nonce))
        } else {
            md5_hex(&format!("{ha1}:{}:{ha2}", challenge.nonce))
        };

        let mut header = format!(
            "Digest username=\"{username}\", realm=\"{}\", nonce=\"{}\", uri=\"{uri}\", \
             algorithm={}, response=\"{response}\"",
            challenge.realm,
            challenge.nonce,
            challenge.algorithm.as_str()
        );
        if challenge.qop_auth {
            header.push_str(&format!(", qop=auth, nc={nc}, cnonce=\"{cnonce}\""));
        }
        if let Some(opaque) = &challenge.opaque {
            header.push_str(&format!(", opaque=\"{opaque}\""));
        }
        header
    }
}

fn md5_hex(input: &str) -> String {
    let digest = Md5::digest(input.as_bytes());
    digest.iter().map(|byte| format!("{byte:02x}")).collect()
}

/// Splits `key=value, key="quoted, value"` pairs. Keys are lowercased.
fn parse_params(input: &str) -> HashMap<String, String> {
    let mut params = HashMap::new();
    let mut rest = input.trim();

    while !rest.is_empty() {
        let Some(eq_pos) = rest.find('=') else {
            break;
        };
        let key = rest[..eq_pos]
            .trim()
            .trim_start_matches(',')
            .trim()
            .to_lowercase();
        rest = rest[eq_pos + 1..].trim_start();

        let value;
        if let Some(quoted) = rest.strip_prefix('"') {
            let end = quoted.find('"').unwrap_or(quoted.len());
            value = quoted[..end].to_string();
            rest = quoted.get(end + 1..).unwrap_or("");
        } else {
            let end = rest.find(',').unwrap_or(rest.len());
            value = rest[..end].trim().to_string();
            rest = &rest[end..];
        }
        rest = rest.trim_start().trim_start_matches(',').trim_start();

        params.insert(key, value);
    }

    params
}
