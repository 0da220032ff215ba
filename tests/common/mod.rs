// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! In-memory switch serving the administrator status page.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use dlipower_lib::protocol::{Request, Response, Transport};
use dlipower_lib::{PowerState, PowerSwitch, ProtocolError, Settings, SwitchConfig};

/// A failure injected into the next request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    /// Connection reset by peer.
    Reset,
    /// No answer within the timeout.
    Timeout,
    /// Credentials rejected.
    Unauthorized,
    /// HTTP 503.
    Unavailable,
    /// A page without an outlet table.
    Garbage,
}

impl Failure {
    fn into_result(self) -> Result<Response, ProtocolError> {
        match self {
            Self::Reset => Err(ProtocolError::ConnectionFailed(
                "connection reset by peer".to_string(),
            )),
            Self::Timeout => Err(ProtocolError::Timeout(Duration::from_secs(20))),
            Self::Unauthorized => Err(ProtocolError::AuthenticationFailed),
            Self::Unavailable => Err(ProtocolError::UnexpectedStatus(503)),
            Self::Garbage => Ok(Response::new(200, "<html><body>Please wait</body></html>")),
        }
    }
}

#[derive(Debug, Default)]
struct Inner {
    outlets: Vec<(String, PowerState)>,
    requests: Vec<String>,
    failures: VecDeque<Failure>,
    refuse_all: bool,
    ignore_commands: bool,
    name_limit: Option<usize>,
}

/// Simulated switch. Clones share the same device.
#[derive(Debug, Clone, Default)]
pub struct FakeDevice {
    inner: Arc<Mutex<Inner>>,
}

impl FakeDevice {
    pub fn new(outlets: &[(&str, PowerState)]) -> Self {
        let device = Self::default();
        device.lock().outlets = outlets
            .iter()
            .map(|(name, state)| ((*name).to_string(), *state))
            .collect();
        device
    }

    /// Eight outlets named after a real WebPowerSwitch.
    pub fn eight_port() -> Self {
        Self::new(&[
            ("Tuin beregening", PowerState::Off),
            ("killer robot", PowerState::On),
            ("Cisco Router", PowerState::Off),
            ("", PowerState::On),
            ("Shack Computer", PowerState::Off),
            ("Lamp & Fan", PowerState::On),
            ("2TB Drive", PowerState::On),
            ("", PowerState::Off),
        ])
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap()
    }

    /// Makes the next requests fail, in order.
    pub fn fail_next(&self, failures: &[Failure]) {
        self.lock().failures.extend(failures.iter().copied());
    }

    /// Refuses every connection from now on.
    pub fn refuse_all(&self) {
        self.lock().refuse_all = true;
    }

    /// Accepts outlet commands without acting on them.
    pub fn ignore_commands(&self) {
        self.lock().ignore_commands = true;
    }

    /// Cuts names longer than `limit` characters.
    pub fn limit_names(&self, limit: usize) {
        self.lock().name_limit = Some(limit);
    }

    pub fn requests(&self) -> Vec<String> {
        self.lock().requests.clone()
    }

    pub fn clear_requests(&self) {
        self.lock().requests.clear();
    }

    pub fn state(&self, outlet: u32) -> PowerState {
        self.lock().outlets[outlet as usize - 1].1
    }

    pub fn name(&self, outlet: u32) -> String {
        self.lock().outlets[outlet as usize - 1].0.clone()
    }
}

impl Transport for FakeDevice {
    async fn send(&mut self, request: &Request) -> Result<Response, ProtocolError> {
        let mut inner = self.lock();
        inner.requests.push(request.path().to_string());

        if inner.refuse_all {
            return Err(ProtocolError::ConnectionFailed(
                "connection refused".to_string(),
            ));
        }
        if let Some(failure) = inner.failures.pop_front() {
            return failure.into_result();
        }

        let path = request.path();
        if path == "index.htm" {
            return Ok(Response::new(200, inner.render()));
        }
        if let Some(command) = path.strip_prefix("outlet?") {
            let Some((outlet, state)) = command.split_once('=') else {
                return Err(ProtocolError::UnexpectedStatus(400));
            };
            let (Ok(outlet), Ok(state)) = (outlet.parse::<usize>(), state.parse::<PowerState>())
            else {
                return Err(ProtocolError::UnexpectedStatus(400));
            };
            if !inner.ignore_commands
                && let Some(entry) = inner.outlets.get_mut(outlet.wrapping_sub(1))
            {
                entry.1 = state;
            }
            return Ok(Response::new(200, inner.render()));
        }
        if let Some(command) = path.strip_prefix("unitnames.cgi?outname") {
            let Some((outlet, name)) = command.split_once('=') else {
                return Err(ProtocolError::UnexpectedStatus(400));
            };
            let (Ok(outlet), Ok(name)) = (outlet.parse::<usize>(), urlencoding::decode(name))
            else {
                return Err(ProtocolError::UnexpectedStatus(400));
            };
            let mut name = name.into_owned();
            if let Some(limit) = inner.name_limit {
                name = name.chars().take(limit).collect();
            }
            if !inner.ignore_commands
                && let Some(entry) = inner.outlets.get_mut(outlet.wrapping_sub(1))
            {
                entry.0 = name;
            }
            return Ok(Response::new(200, "<html><body>Saved</body></html>"));
        }

        Err(ProtocolError::UnexpectedStatus(404))
    }
}

impl Inner {
    fn render(&self) -> String {
        let mut html = String::from(
            "<html><head><title>Outlet Control</title></head><body>\n\
             <table width=\"98%\">\n\
             <tr><td>#</td><td>Name</td><td>State</td><td colspan=2>Action</td></tr>\n",
        );
        for (index, (name, state)) in self.outlets.iter().enumerate() {
            let number = index + 1;
            let toggle = match state {
                PowerState::On => "OFF",
                PowerState::Off => "ON",
            };
            let name = name
                .replace('&', "&amp;")
                .replace('<', "&lt;")
                .replace('>', "&gt;");
            html.push_str(&format!(
                "<tr><td align=center>{number}</td><td>{name}</td>\
                 <td><b>{state}</b></td>\
                 <td><a href=outlet?{number}={toggle}>Switch {toggle}</a></td>\
                 <td><a href=outlet?{number}=CCL>Cycle</a></td></tr>\n"
            ));
        }
        html.push_str("</table>\n</body></html>\n");
        html
    }
}

/// Settings with the given attempt count and a short retry delay.
pub fn settings(attempts: u32) -> Settings {
    SwitchConfig::new()
        .with_retries(attempts)
        .with_retry_delay(Duration::from_millis(100))
        .with_cycle_time(Duration::from_secs(3))
        .resolve()
        .unwrap()
}

/// A switch driving the given device.
pub fn switch(device: &FakeDevice, attempts: u32) -> PowerSwitch<FakeDevice> {
    PowerSwitch::with_transport(device.clone(), &settings(attempts))
}
