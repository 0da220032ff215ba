// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Fencing agent for Digital Loggers web power switches.
//!
//! Options come from flags or, when no action flag is given, from
//! `key=value` lines on stdin:
//!
//! ```bash
//! fence_dlipower -o reboot -a 10.0.0.5 -l admin -p 1234 -n 3
//! printf 'action=status\nipaddr=10.0.0.5\nport=3\n' | fence_dlipower
//! ```

use std::process::ExitCode;

use argh::FromArgs;
use dlipower_lib::fence::{self, EXIT_FAILURE, FenceAction, FenceOptions};
use dlipower_lib::{Error, PowerSwitch};
use tokio::io::AsyncReadExt;
use tracing::Level;

#[derive(FromArgs)]
/// Fence agent for Digital Loggers web power switches.
struct Args {
    /// action: on, off, reboot, status, monitor, list or metadata
    #[argh(option, short = 'o')]
    action: Option<String>,

    /// IP address or hostname of the switch
    #[argh(option, short = 'a')]
    ipaddr: Option<String>,

    /// login name
    #[argh(option, short = 'l')]
    login: Option<String>,

    /// login password
    #[argh(option, short = 'p')]
    passwd: Option<String>,

    /// outlet number or name
    #[argh(option, short = 'n')]
    plug: Option<String>,

    /// connect over HTTPS
    #[argh(switch, short = 'z')]
    ssl: bool,

    /// log requests to stderr
    #[argh(switch, short = 'v')]
    verbose: bool,
}

impl Args {
    fn apply(&self, options: &mut FenceOptions) -> Result<(), Error> {
        let flags = [
            ("action", &self.action),
            ("ipaddr", &self.ipaddr),
            ("login", &self.login),
            ("passwd", &self.passwd),
            ("port", &self.plug),
        ];
        for (key, value) in flags {
            if let Some(value) = value {
                options.set(key, value)?;
            }
        }
        if self.ssl {
            options.ssl = true;
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args: Args = argh::from_env();

    let level = if args.verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let code = match run(&args).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("fence_dlipower: {e}");
            EXIT_FAILURE
        }
    };
    ExitCode::from(u8::try_from(code).unwrap_or(1))
}

async fn run(args: &Args) -> Result<i32, Error> {
    let mut options = if args.action.is_none() {
        let mut input = String::new();
        if let Err(e) = tokio::io::stdin().read_to_string(&mut input).await {
            tracing::warn!("Could not read options from stdin: {e}");
        }
        FenceOptions::parse(&input)?
    } else {
        FenceOptions::default()
    };
    args.apply(&mut options)?;

    if options.action == FenceAction::Metadata {
        println!("{}", fence::metadata());
        return Ok(fence::EXIT_SUCCESS);
    }

    let mut switch = PowerSwitch::builder()
        .with_config(options.config())
        .with_default_config_file()
        .build()?;

    let outcome = fence::run(&mut switch, &options).await;
    for line in &outcome.output {
        println!("{line}");
    }
    Ok(outcome.exit_code)
}
