// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Example program: list the outlets of a switch, then power-cycle one.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example status -- <host> <user> <password> [outlet]
//! ```
//!
//! # Example
//!
//! ```bash
//! cargo run --example status -- 192.168.0.100 admin 1234 "Cisco Router"
//! ```

use std::env;

use dlipower_lib::PowerSwitch;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    if !(4..=5).contains(&args.len()) {
        eprintln!("Usage: {} <host> <user> <password> [outlet]", args[0]);
        eprintln!();
        eprintln!("Example:");
        eprintln!("  cargo run --example status -- 192.168.0.100 admin 1234 3");
        std::process::exit(1);
    }

    let mut switch = PowerSwitch::builder()
        .with_hostname(&args[1])
        .with_credentials(&args[2], &args[3])
        .build()?;

    println!("Connecting to {}...", switch.hostname());
    if !switch.verify().await? {
        eprintln!("Switch is not reachable");
        std::process::exit(1);
    }

    let outlets = switch.refresh().await?;
    println!("{outlets}");

    if let Some(outlet) = args.get(4) {
        let number = switch.resolve(outlet.as_str()).await?;
        println!("Rebooting outlet {number} ({})...", switch.outlet_name(number).await?);
        switch.reboot(number).await?;
        println!("Outlet {number} is {}", switch.get_state(number).await?);
    }

    Ok(())
}
