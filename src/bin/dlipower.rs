// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Command-line control of a Digital Loggers web power switch.
//!
//! ```bash
//! # Outlet table
//! dlipower --hostname 192.168.0.100 --password 1234
//!
//! # Switch outlets by number, range or name
//! dlipower off 1-3,5
//! dlipower reboot "Cisco Router"
//!
//! # Remember the connection settings in ~/.dlipower.conf
//! dlipower --hostname 10.0.0.5 --password 1234 --save-settings list
//! ```

use std::process::ExitCode;

use argh::FromArgs;
use dlipower_lib::{
    ConfigError, OutletSelector, PowerState, PowerSwitch, Result, SwitchBuilder, SwitchConfig,
    parse_outlet_range,
};
use tracing::Level;

#[derive(FromArgs)]
/// Control a Digital Loggers web power switch.
struct Cli {
    /// hostname or IP address of the switch
    #[argh(option)]
    hostname: Option<String>,

    /// user name to log in with
    #[argh(option)]
    user: Option<String>,

    /// password to log in with
    #[argh(option)]
    password: Option<String>,

    /// request timeout in seconds
    #[argh(option)]
    timeout: Option<f64>,

    /// delay between off and on when rebooting, in seconds
    #[argh(option)]
    cycletime: Option<f64>,

    /// attempts per request
    #[argh(option)]
    retries: Option<u32>,

    /// connect over HTTPS
    #[argh(switch)]
    ssl: bool,

    /// save the settings to the configuration file
    #[argh(switch, long = "save-settings")]
    save_settings: bool,

    /// log requests to stderr
    #[argh(switch, short = 'v')]
    verbose: bool,

    #[argh(subcommand)]
    command: Option<Commands>,
}

impl Cli {
    fn config(&self) -> SwitchConfig {
        SwitchConfig {
            hostname: self.hostname.clone(),
            userid: self.user.clone(),
            password: self.password.clone(),
            timeout: self.timeout,
            cycletime: self.cycletime,
            retries: self.retries,
            retry_delay: None,
            use_https: self.ssl.then_some(true),
        }
    }
}

#[derive(FromArgs)]
#[argh(subcommand)]
enum Commands {
    List(ListArgs),
    Status(StatusArgs),
    On(OnArgs),
    Off(OffArgs),
    Reboot(RebootArgs),
    Name(NameArgs),
    Rename(RenameArgs),
    Verify(VerifyArgs),
}

#[derive(FromArgs)]
#[argh(subcommand, name = "list")]
/// print the outlet table
struct ListArgs {}

#[derive(FromArgs)]
#[argh(subcommand, name = "status")]
/// print the state of outlets
struct StatusArgs {
    /// outlets, e.g. 1-3,5 or a name
    #[argh(positional)]
    outlets: Vec<String>,
}

#[derive(FromArgs)]
#[argh(subcommand, name = "on")]
/// turn outlets on
struct OnArgs {
    /// outlets, e.g. 1-3,5 or a name
    #[argh(positional)]
    outlets: Vec<String>,
}

#[derive(FromArgs)]
#[argh(subcommand, name = "off")]
/// turn outlets off
struct OffArgs {
    /// outlets, e.g. 1-3,5 or a name
    #[argh(positional)]
    outlets: Vec<String>,
}

#[derive(FromArgs)]
#[argh(subcommand, name = "reboot")]
/// power-cycle outlets
struct RebootArgs {
    /// outlets, e.g. 1-3,5 or a name
    #[argh(positional)]
    outlets: Vec<String>,
}

#[derive(FromArgs)]
#[argh(subcommand, name = "name")]
/// print the names of outlets
struct NameArgs {
    /// outlets, e.g. 1-3,5
    #[argh(positional)]
    outlets: Vec<String>,
}

#[derive(FromArgs)]
#[argh(subcommand, name = "rename")]
/// change the name of an outlet
struct RenameArgs {
    /// outlet number or current name
    #[argh(positional)]
    outlet: String,

    /// new name
    #[argh(positional)]
    name: String,
}

#[derive(FromArgs)]
#[argh(subcommand, name = "verify")]
/// check that the switch is reachable and the login works
struct VerifyArgs {}

#[tokio::main]
async fn main() -> ExitCode {
    let cli: Cli = argh::from_env();

    let level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("dlipower: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config_path = SwitchConfig::default_path().ok();
    let mut builder = SwitchBuilder::new().with_config(cli.config());
    if let Some(path) = &config_path {
        builder = builder.with_config_file(path);
    }
    let settings = builder.settings()?;

    if cli.save_settings {
        let path = config_path.ok_or(ConfigError::NoConfigLocation)?;
        settings.to_config().save(&path)?;
    }

    let mut switch = PowerSwitch::new(&settings)?;

    match cli.command {
        None | Some(Commands::List(_)) => {
            switch.refresh().await?;
            print!("{switch}");
        }
        Some(Commands::Status(args)) => {
            let outlets = switch.refresh().await?;
            let mut states = Vec::new();
            for selector in parse_outlet_range(&args.outlets)? {
                let number = outlets.resolve(&selector)?;
                if let Some(outlet) = outlets.get_by_number(number) {
                    states.push(outlet.state().to_string());
                }
            }
            println!("{}", states.join(","));
        }
        Some(Commands::On(args)) => {
            set_all(&mut switch, &args.outlets, PowerState::On).await?;
        }
        Some(Commands::Off(args)) => {
            set_all(&mut switch, &args.outlets, PowerState::Off).await?;
        }
        Some(Commands::Reboot(args)) => {
            for selector in parse_outlet_range(&args.outlets)? {
                switch.reboot(selector).await?;
            }
        }
        Some(Commands::Name(args)) => {
            let outlets = switch.refresh().await?;
            let mut names = Vec::new();
            for selector in parse_outlet_range(&args.outlets)? {
                let number = outlets.resolve(&selector)?;
                if let Some(outlet) = outlets.get_by_number(number) {
                    names.push(outlet.description().to_string());
                }
            }
            println!("{}", names.join(","));
        }
        Some(Commands::Rename(args)) => {
            let selector: OutletSelector = args.outlet.parse()?;
            if !switch.rename(selector, &args.name).await? {
                eprintln!("dlipower: switch did not keep the name {:?}", args.name);
                return Ok(ExitCode::FAILURE);
            }
        }
        Some(Commands::Verify(_)) => {
            if !switch.verify().await? {
                eprintln!("dlipower: {} is not reachable", switch.hostname());
                return Ok(ExitCode::FAILURE);
            }
            println!("{} OK", switch.hostname());
        }
    }

    Ok(ExitCode::SUCCESS)
}

async fn set_all(switch: &mut PowerSwitch, outlets: &[String], state: PowerState) -> Result<()> {
    for selector in parse_outlet_range(outlets)? {
        switch.set_state(selector, state).await?;
    }
    Ok(())
}
