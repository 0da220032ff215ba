// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `dlipower_lib` - A Rust library to control Digital Loggers web power
//! switches.
//!
//! The switches have no machine-readable API. This library drives their
//! HTML administration pages over HTTP(S), with Basic or Digest
//! authentication, and turns the status page into typed outlet snapshots.
//!
//! # Supported Features
//!
//! - **Outlet control**: on, off, reboot (power cycle) by number or name
//! - **Status queries**: outlet table, single outlet state and name
//! - **Renaming**: with confirmation against the refreshed status page
//! - **Reachability**: [`PowerSwitch::verify`]
//! - **Fencing agent**: the cluster-manager action vocabulary, see [`fence`]
//!
//! # Supported Firmware
//!
//! WebPowerSwitch II to V and Ethernet Power Controller III status page
//! layouts, see [`parser`].
//!
//! # Quick Start
//!
//! ```no_run
//! use dlipower_lib::{PowerSwitch, PowerState};
//!
//! #[tokio::main]
//! async fn main() -> dlipower_lib::Result<()> {
//!     let mut switch = PowerSwitch::builder()
//!         .with_hostname("192.168.0.100")
//!         .with_credentials("admin", "1234")
//!         .build()?;
//!
//!     if !switch.verify().await? {
//!         eprintln!("switch not reachable");
//!         return Ok(());
//!     }
//!
//!     switch.set_state("Cisco Router", PowerState::Off).await?;
//!     switch.reboot(3u32).await?;
//!     println!("{switch}");
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration File
//!
//! Values not given explicitly can be read from `$DLIPOWER_CONFIG` or
//! `~/.dlipower.conf`:
//!
//! ```no_run
//! use dlipower_lib::PowerSwitch;
//!
//! # async fn example() -> dlipower_lib::Result<()> {
//! let mut switch = PowerSwitch::builder()
//!     .with_default_config_file()
//!     .build()?;
//! let outlets = switch.list_all().await?;
//! # Ok(())
//! # }
//! ```

pub mod command;
pub mod config;
pub mod error;
pub mod fence;
pub mod parser;
pub mod protocol;
mod retry;
mod switch;
pub mod types;

pub use config::{Settings, SwitchConfig};
pub use error::{
    ConfigError, DeviceError, Error, LookupError, ParseError, ProtocolError, Result, ValueError,
};
pub use protocol::{AuthScheme, HttpConfig, HttpTransport, Transport};
pub use retry::RetryPolicy;
pub use switch::{PowerSwitch, SwitchBuilder};
pub use types::{Outlet, OutletCollection, OutletSelector, PowerState, parse_outlet_range};
