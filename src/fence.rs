// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Cluster fencing agent.
//!
//! Cluster managers call a fencing agent with `key=value` lines on stdin
//! (or equivalent flags) and read the outcome from its exit code:
//!
//! | Exit code | Meaning |
//! |-----------|---------|
//! | [`EXIT_SUCCESS`] | action done; for `status`, the plug is ON |
//! | [`EXIT_FAILURE`] | action failed or the switch is unreachable |
//! | [`EXIT_OFF`] | `status` only: the plug is OFF |
//!
//! # Examples
//!
//! ```
//! use dlipower_lib::fence::{FenceAction, FenceOptions};
//!
//! let options = FenceOptions::parse("action=reboot\nipaddr=10.0.0.5\nport=3\n").unwrap();
//! assert_eq!(options.action, FenceAction::Reboot);
//! assert_eq!(options.plug.as_deref(), Some("3"));
//! ```

use std::fmt;
use std::str::FromStr;

use crate::config::SwitchConfig;
use crate::error::ValueError;
use crate::protocol::Transport;
use crate::switch::PowerSwitch;
use crate::types::{OutletSelector, PowerState};

/// Action done.
pub const EXIT_SUCCESS: i32 = 0;
/// Action failed.
pub const EXIT_FAILURE: i32 = 1;
/// Plug is OFF (`status` only).
pub const EXIT_OFF: i32 = 2;

/// Actions of the fencing-agent vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FenceAction {
    /// Power the plug on.
    On,
    /// Power the plug off.
    Off,
    /// Power-cycle the plug.
    #[default]
    Reboot,
    /// Report the plug state.
    Status,
    /// Check that the switch is reachable.
    Monitor,
    /// List the plugs.
    List,
    /// Print the agent description.
    Metadata,
}

impl FenceAction {
    /// Returns the canonical action name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::On => "on",
            Self::Off => "off",
            Self::Reboot => "reboot",
            Self::Status => "status",
            Self::Monitor => "monitor",
            Self::List => "list",
            Self::Metadata => "metadata",
        }
    }

    /// Returns true if the action operates on a single plug.
    #[must_use]
    pub const fn needs_plug(self) -> bool {
        matches!(self, Self::On | Self::Off | Self::Reboot | Self::Status)
    }
}

impl fmt::Display for FenceAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FenceAction {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "on" | "enable" | "poweron" => Ok(Self::On),
            "off" | "disable" | "poweroff" => Ok(Self::Off),
            "reboot" | "cycle" => Ok(Self::Reboot),
            "status" => Ok(Self::Status),
            "monitor" => Ok(Self::Monitor),
            "list" => Ok(Self::List),
            "metadata" => Ok(Self::Metadata),
            _ => Err(ValueError::UnknownAction(s.to_string())),
        }
    }
}

/// Options passed to the fencing agent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FenceOptions {
    /// What to do.
    pub action: FenceAction,
    /// Switch address.
    pub ipaddr: Option<String>,
    /// User name.
    pub login: Option<String>,
    /// Password.
    pub passwd: Option<String>,
    /// Outlet number or name.
    pub plug: Option<String>,
    /// Whether to talk HTTPS.
    pub ssl: bool,
}

impl FenceOptions {
    /// Parses `key=value` lines as written by cluster managers.
    ///
    /// Blank lines and `#` comments are skipped; unknown keys are logged
    /// and ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError::UnknownAction`] for an unsupported action.
    pub fn parse(input: &str) -> Result<Self, ValueError> {
        let mut options = Self::default();
        for line in input.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (key, value) = line.split_once('=').unwrap_or((line, ""));
            options.set(key.trim(), value.trim())?;
        }
        Ok(options)
    }

    /// Sets one option by name.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError::UnknownAction`] for an unsupported action.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ValueError> {
        match key {
            "action" | "option" => self.action = value.parse()?,
            "ipaddr" | "ip" => self.ipaddr = Some(value.to_string()),
            "login" | "username" => self.login = Some(value.to_string()),
            "passwd" | "password" => self.passwd = Some(value.to_string()),
            "port" | "plug" => self.plug = Some(value.to_string()),
            "ssl" => self.ssl = is_enabled(value),
            _ => tracing::warn!(key, "Ignoring unknown fence option"),
        }
        Ok(())
    }

    /// Returns the switch settings carried by these options.
    #[must_use]
    pub fn config(&self) -> SwitchConfig {
        SwitchConfig {
            hostname: self.ipaddr.clone(),
            userid: self.login.clone(),
            password: self.passwd.clone(),
            use_https: self.ssl.then_some(true),
            ..SwitchConfig::default()
        }
    }
}

fn is_enabled(value: &str) -> bool {
    matches!(
        value.to_ascii_lowercase().as_str(),
        "" | "1" | "on" | "yes" | "true"
    )
}

/// Exit code and output lines of one agent run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FenceOutcome {
    /// Process exit code.
    pub exit_code: i32,
    /// Lines for stdout.
    pub output: Vec<String>,
}

impl FenceOutcome {
    fn success(output: Vec<String>) -> Self {
        Self {
            exit_code: EXIT_SUCCESS,
            output,
        }
    }

    fn failure(message: impl fmt::Display) -> Self {
        tracing::error!("{message}");
        Self {
            exit_code: EXIT_FAILURE,
            output: Vec::new(),
        }
    }
}

/// Carries out the requested action against a switch.
pub async fn run<T: Transport>(switch: &mut PowerSwitch<T>, options: &FenceOptions) -> FenceOutcome {
    let action = options.action;

    let plug = if action.needs_plug() {
        let Some(plug) = options.plug.as_deref() else {
            return FenceOutcome::failure(format!("action {action} requires a plug"));
        };
        match plug.parse::<OutletSelector>() {
            Ok(selector) => Some(selector),
            Err(e) => return FenceOutcome::failure(e),
        }
    } else {
        None
    };

    tracing::debug!(%action, plug = ?plug, host = switch.hostname(), "Running fence action");

    let result = match (action, plug) {
        (FenceAction::Metadata, _) => return FenceOutcome::success(vec![metadata()]),
        (FenceAction::Monitor, _) => match switch.verify().await {
            Ok(true) => return FenceOutcome::success(Vec::new()),
            Ok(false) => return FenceOutcome::failure("switch not reachable"),
            Err(e) => Err(e),
        },
        (FenceAction::List, _) => switch.list_all().await.map(|outlets| {
            outlets
                .into_iter()
                .map(|(number, name, _)| format!("{number},{name}"))
                .collect()
        }),
        (FenceAction::Status, Some(plug)) => match switch.get_state(plug).await {
            Ok(PowerState::On) => Ok(vec!["Status: ON".to_string()]),
            Ok(PowerState::Off) => {
                return FenceOutcome {
                    exit_code: EXIT_OFF,
                    output: vec!["Status: OFF".to_string()],
                };
            }
            Err(e) => Err(e),
        },
        (FenceAction::On, Some(plug)) => switch.on(plug).await.map(|_| Vec::new()),
        (FenceAction::Off, Some(plug)) => switch.off(plug).await.map(|_| Vec::new()),
        (FenceAction::Reboot, Some(plug)) => switch.reboot(plug).await.map(|()| Vec::new()),
        (_, None) => return FenceOutcome::failure(format!("action {action} requires a plug")),
    };

    match result {
        Ok(output) => FenceOutcome::success(output),
        Err(e) => FenceOutcome::failure(format!("{action} failed: {e}")),
    }
}

/// Returns the agent description in the cluster-manager XML format.
#[must_use]
pub fn metadata() -> String {
    const PARAMETERS: [(&str, &str, &str); 6] = [
        ("action", "string", "Fencing action"),
        ("ipaddr", "string", "IP address or hostname of the switch"),
        ("login", "string", "Login name"),
        ("passwd", "string", "Login password"),
        ("port", "string", "Outlet number or name"),
        ("ssl", "boolean", "Use HTTPS to connect"),
    ];
    const ACTIONS: [FenceAction; 7] = [
        FenceAction::On,
        FenceAction::Off,
        FenceAction::Reboot,
        FenceAction::Status,
        FenceAction::Monitor,
        FenceAction::List,
        FenceAction::Metadata,
    ];

    let mut xml = String::from(
        "<?xml version=\"1.0\" ?>\n\
         <resource-agent name=\"fence_dlipower\" shortdesc=\"Fence agent for Digital Loggers web power switches\">\n\
         <longdesc>Power-cycles cluster nodes through a Digital Loggers web power switch.</longdesc>\n\
         <parameters>\n",
    );
    for (name, kind, description) in PARAMETERS {
        xml.push_str(&format!(
            "\t<parameter name=\"{name}\" unique=\"0\" required=\"0\">\n\
             \t\t<content type=\"{kind}\"/>\n\
             \t\t<shortdesc lang=\"en\">{description}</shortdesc>\n\
             \t</parameter>\n"
        ));
    }
    xml.push_str("</parameters>\n<actions>\n");
    for action in ACTIONS {
        xml.push_str(&format!("\t<action name=\"{action}\"/>\n"));
    }
    xml.push_str("</actions>\n</resource-agent>");
    xml
}
