// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value types describing a power switch's outlets.
//!
//! # Types
//!
//! - [`PowerState`] - ON/OFF state of an outlet
//! - [`Outlet`] - Immutable snapshot of one outlet (number, description, state)
//! - [`OutletCollection`] - Ordered snapshot of every outlet on a switch
//! - [`OutletSelector`] - An outlet addressed by number or by name

mod outlet;
mod power;
mod selector;

pub use outlet::{Outlet, OutletCollection};
pub use power::PowerState;
pub use selector::{OutletSelector, parse_outlet_range};
