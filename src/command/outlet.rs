// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Outlet commands.

use crate::command::Command;
use crate::types::PowerState;

/// Commands understood by the outlet control pages.
///
/// # Examples
///
/// ```
/// use dlipower_lib::command::{Command, OutletCommand};
///
/// let rename = OutletCommand::Rename { outlet: 3, name: "Cable Modem".to_string() };
/// assert_eq!(rename.path(), "unitnames.cgi?outname3=Cable%20Modem");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutletCommand {
    /// Fetch the status page.
    Status,
    /// Switch one outlet on or off.
    SetState {
        /// The outlet number.
        outlet: u32,
        /// The desired state.
        state: PowerState,
    },
    /// Change an outlet's description.
    Rename {
        /// The outlet number.
        outlet: u32,
        /// The new description.
        name: String,
    },
}

impl Command for OutletCommand {
    fn path(&self) -> String {
        match self {
            Self::Status => "index.htm".to_string(),
            Self::SetState { outlet, state } => format!("outlet?{outlet}={state}"),
            Self::Rename { outlet, name } => {
                format!("unitnames.cgi?outname{outlet}={}", urlencoding::encode(name))
            }
        }
    }
}
