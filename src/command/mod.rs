// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Switch command definitions.
//!
//! The firmware is driven through plain page requests: the outlet number
//! and the action travel in the query string.
//!
//! | Command | Request |
//! |---------|---------|
//! | [`OutletCommand::Status`] | `GET index.htm` |
//! | [`OutletCommand::SetState`] | `GET outlet?<n>=ON` / `outlet?<n>=OFF` |
//! | [`OutletCommand::Rename`] | `GET unitnames.cgi?outname<n>=<name>` |
//!
//! # Examples
//!
//! ```
//! use dlipower_lib::command::{Command, OutletCommand};
//! use dlipower_lib::types::PowerState;
//!
//! let cmd = OutletCommand::SetState { outlet: 2, state: PowerState::Off };
//! assert_eq!(cmd.path(), "outlet?2=OFF");
//! ```

mod outlet;

pub use outlet::OutletCommand;

use crate::protocol::Request;

/// A command that can be sent to a switch.
pub trait Command {
    /// Returns the page path, including any query string.
    fn path(&self) -> String;

    /// Builds the HTTP request for this command.
    fn to_request(&self) -> Request {
        Request::get(self.path())
    }
}
