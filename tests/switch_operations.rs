// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Switch operations against a simulated device.

mod common;

use std::time::Duration;

use common::{FakeDevice, Failure, switch};
use dlipower_lib::{
    DeviceError, Error, LookupError, OutletSelector, ParseError, PowerState, ProtocolError,
};
use tokio::time::Instant;

// ============================================================================
// Outlet State Model
// ============================================================================

mod state_model {
    use super::*;

    #[tokio::test]
    async fn numbers_resolve_to_themselves() {
        let device = FakeDevice::eight_port();
        let mut switch = switch(&device, 1);

        for number in 1..=8u32 {
            assert_eq!(switch.resolve(number).await.unwrap(), number);
        }
        // One status page serves every lookup.
        assert_eq!(device.requests(), vec!["index.htm"]);
    }

    #[tokio::test]
    async fn unique_names_resolve_to_their_outlet() {
        let device = FakeDevice::eight_port();
        let mut switch = switch(&device, 1);

        assert_eq!(switch.resolve("Tuin beregening").await.unwrap(), 1);
        assert_eq!(switch.resolve("KILLER ROBOT").await.unwrap(), 2);
        assert_eq!(switch.resolve("Lamp & Fan").await.unwrap(), 6);
    }

    #[tokio::test]
    async fn duplicate_names_are_ambiguous() {
        let device = FakeDevice::new(&[
            ("spare", PowerState::Off),
            ("Router", PowerState::On),
            ("Spare", PowerState::On),
        ]);
        let mut switch = switch(&device, 1);

        let err = switch.resolve("spare").await.unwrap_err();
        assert!(matches!(
            err,
            Error::Lookup(LookupError::Ambiguous { ref matches, .. }) if *matches == vec![1, 3]
        ));
    }

    #[tokio::test]
    async fn unknown_name_and_number_are_lookup_errors() {
        let device = FakeDevice::eight_port();
        let mut switch = switch(&device, 1);

        assert!(matches!(
            switch.resolve("toaster").await,
            Err(Error::Lookup(LookupError::NotFound(_)))
        ));
        assert!(matches!(
            switch.resolve(9u32).await,
            Err(Error::Lookup(LookupError::OutOfRange { number: 9, count: 8 }))
        ));
    }

    #[tokio::test]
    async fn outlet_zero_as_text_is_out_of_range() {
        let device = FakeDevice::eight_port();
        let mut switch = switch(&device, 1);

        assert!(matches!(
            switch.resolve("0").await,
            Err(Error::Lookup(LookupError::OutOfRange { number: 0, count: 8 }))
        ));
    }

    #[tokio::test]
    async fn snapshot_is_cached_until_refresh() {
        let device = FakeDevice::eight_port();
        let mut switch = switch(&device, 1);
        assert!(switch.snapshot().is_none());

        let outlets = switch.refresh().await.unwrap();
        assert_eq!(outlets.len(), 8);
        assert_eq!(switch.snapshot(), Some(&outlets));

        let before = device.requests().len();
        let _ = switch.snapshot();
        assert_eq!(device.requests().len(), before);
    }

    #[tokio::test]
    async fn list_all_flattens_a_fresh_snapshot() {
        let device = FakeDevice::eight_port();
        let mut switch = switch(&device, 1);

        let outlets = switch.list_all().await.unwrap();
        assert_eq!(outlets.len(), 8);
        assert_eq!(outlets[0], (1, "Tuin beregening".to_string(), PowerState::Off));
        assert_eq!(outlets[3], (4, String::new(), PowerState::On));
        assert_eq!(outlets[5], (6, "Lamp & Fan".to_string(), PowerState::On));
    }

    #[tokio::test]
    async fn outlet_name_by_number() {
        let device = FakeDevice::eight_port();
        let mut switch = switch(&device, 1);

        assert_eq!(switch.outlet_name(3u32).await.unwrap(), "Cisco Router");
        assert_eq!(switch.outlet_name(8u32).await.unwrap(), "");
    }
}

// ============================================================================
// Command Executor
// ============================================================================

mod commands {
    use super::*;

    #[tokio::test]
    async fn set_then_get_round_trip() {
        let device = FakeDevice::eight_port();
        let mut switch = switch(&device, 1);

        assert_eq!(switch.set_state(1u32, PowerState::On).await.unwrap(), PowerState::On);
        assert_eq!(switch.get_state(1u32).await.unwrap(), PowerState::On);

        assert_eq!(switch.set_state(1u32, PowerState::Off).await.unwrap(), PowerState::Off);
        assert_eq!(switch.get_state(1u32).await.unwrap(), PowerState::Off);
        assert_eq!(device.state(1), PowerState::Off);
    }

    #[tokio::test]
    async fn set_state_twice_is_idempotent() {
        let device = FakeDevice::eight_port();
        let mut switch = switch(&device, 1);

        assert_eq!(switch.on("Cisco Router").await.unwrap(), PowerState::On);
        assert_eq!(switch.on("Cisco Router").await.unwrap(), PowerState::On);
        assert_eq!(device.state(3), PowerState::On);
    }

    #[tokio::test]
    async fn set_state_updates_snapshot() {
        let device = FakeDevice::eight_port();
        let mut switch = switch(&device, 1);

        switch.off(2u32).await.unwrap();
        let snapshot = switch.snapshot().unwrap();
        assert_eq!(snapshot.get_by_number(2).unwrap().state(), PowerState::Off);
    }

    #[tokio::test]
    async fn ignored_command_is_not_confirmed() {
        let device = FakeDevice::eight_port();
        device.ignore_commands();
        let mut switch = switch(&device, 1);

        let err = switch.on(1u32).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Device(DeviceError::StateNotConfirmed {
                outlet: 1,
                expected: PowerState::On,
                observed: PowerState::Off,
            })
        ));
    }

    #[tokio::test]
    async fn out_of_range_outlet_sends_no_command() {
        let device = FakeDevice::eight_port();
        let mut switch = switch(&device, 1);

        assert!(switch.off(12u32).await.is_err());
        assert_eq!(device.requests(), vec!["index.htm"]);
    }

    #[tokio::test(start_paused = true)]
    async fn reboot_waits_cycle_time_between_off_and_on() {
        let device = FakeDevice::eight_port();
        let mut switch = switch(&device, 1);
        switch.refresh().await.unwrap();
        device.clear_requests();

        let start = Instant::now();
        switch.reboot(2u32).await.unwrap();

        assert!(start.elapsed() >= Duration::from_secs(3));
        assert_eq!(device.requests(), vec!["outlet?2=OFF", "outlet?2=ON"]);
        assert_eq!(device.state(2), PowerState::On);
    }

    #[tokio::test(start_paused = true)]
    async fn reboot_never_sends_on_after_unconfirmed_off() {
        let device = FakeDevice::eight_port();
        device.ignore_commands();
        let mut switch = switch(&device, 1);

        let err = switch.reboot(2u32).await.unwrap_err();
        assert!(matches!(err, Error::Device(DeviceError::StateNotConfirmed { .. })));
        assert!(device.requests().iter().all(|path| path != "outlet?2=ON"));
    }

    #[tokio::test(start_paused = true)]
    async fn reboot_never_sends_on_after_failed_off() {
        let device = FakeDevice::eight_port();
        let mut switch = switch(&device, 1);
        switch.refresh().await.unwrap();
        device.fail_next(&[Failure::Unauthorized]);

        let err = switch.reboot("killer robot").await.unwrap_err();
        assert!(matches!(
            err,
            Error::Protocol(ProtocolError::AuthenticationFailed)
        ));
        assert!(device.requests().iter().all(|path| path != "outlet?2=ON"));
        assert_eq!(device.state(2), PowerState::On);
    }

    #[tokio::test]
    async fn rename_is_confirmed() {
        let device = FakeDevice::eight_port();
        let mut switch = switch(&device, 1);

        assert!(switch.rename(4u32, "Cable Modem").await.unwrap());
        assert_eq!(device.name(4), "Cable Modem");
        assert_eq!(switch.outlet_name(4u32).await.unwrap(), "Cable Modem");
        assert_eq!(switch.resolve("cable modem").await.unwrap(), 4);
    }

    #[tokio::test]
    async fn truncated_rename_returns_false() {
        let device = FakeDevice::eight_port();
        device.limit_names(8);
        let mut switch = switch(&device, 1);

        assert!(!switch.rename(4u32, "Very long outlet name").await.unwrap());
        assert_eq!(device.name(4), "Very lon");
    }

    #[tokio::test]
    async fn range_of_outlets() {
        let device = FakeDevice::eight_port();
        let mut switch = switch(&device, 1);

        for selector in dlipower_lib::parse_outlet_range(&["1-3", "Shack Computer"]).unwrap() {
            switch.on(selector).await.unwrap();
        }
        for number in [1, 2, 3, 5] {
            assert_eq!(device.state(number), PowerState::On);
        }
        assert_eq!(device.state(8), PowerState::Off);
    }

    #[tokio::test]
    async fn selectors_from_strings() {
        let device = FakeDevice::eight_port();
        let mut switch = switch(&device, 1);

        let selector: OutletSelector = "7".parse().unwrap();
        assert_eq!(switch.off(selector).await.unwrap(), PowerState::Off);
        assert_eq!(device.state(7), PowerState::Off);
    }
}

// ============================================================================
// Retry Policy
// ============================================================================

mod retries {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn two_resets_then_success_with_three_attempts() {
        let device = FakeDevice::eight_port();
        device.fail_next(&[Failure::Reset, Failure::Reset]);
        let mut switch = switch(&device, 3);

        let start = Instant::now();
        let outlets = switch.list_all().await.unwrap();

        assert_eq!(outlets.len(), 8);
        assert_eq!(device.requests().len(), 3);
        assert!(start.elapsed() >= Duration::from_millis(200));
    }

    #[tokio::test(start_paused = true)]
    async fn two_resets_exhaust_two_attempts() {
        let device = FakeDevice::eight_port();
        device.fail_next(&[Failure::Reset, Failure::Reset]);
        let mut switch = switch(&device, 2);

        let err = switch.list_all().await.unwrap_err();
        assert!(matches!(
            err,
            Error::RetriesExhausted {
                attempts: 2,
                source: ProtocolError::ConnectionFailed(_),
            }
        ));
        assert_eq!(device.requests().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn timeouts_are_retried() {
        let device = FakeDevice::eight_port();
        device.fail_next(&[Failure::Timeout, Failure::Unavailable]);
        let mut switch = switch(&device, 3);

        assert_eq!(switch.get_state(2u32).await.unwrap(), PowerState::On);
        assert_eq!(device.requests().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn commands_are_retried() {
        let device = FakeDevice::eight_port();
        let mut switch = switch(&device, 3);
        switch.refresh().await.unwrap();
        device.clear_requests();
        device.fail_next(&[Failure::Reset]);

        assert_eq!(switch.on(1u32).await.unwrap(), PowerState::On);
        assert_eq!(device.requests(), vec!["outlet?1=ON", "outlet?1=ON"]);
    }

    #[tokio::test(start_paused = true)]
    async fn parse_errors_are_not_retried() {
        let device = FakeDevice::eight_port();
        device.fail_next(&[Failure::Garbage]);
        let mut switch = switch(&device, 3);

        let err = switch.refresh().await.unwrap_err();
        assert!(matches!(err, Error::Parse(ParseError::UnrecognizedLayout)));
        assert_eq!(device.requests().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn authentication_errors_are_not_retried() {
        let device = FakeDevice::eight_port();
        device.fail_next(&[Failure::Unauthorized]);
        let mut switch = switch(&device, 3);

        let err = switch.refresh().await.unwrap_err();
        assert!(matches!(
            err,
            Error::Protocol(ProtocolError::AuthenticationFailed)
        ));
        assert_eq!(device.requests().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_refresh_keeps_previous_snapshot() {
        let device = FakeDevice::eight_port();
        let mut switch = switch(&device, 1);
        let outlets = switch.refresh().await.unwrap();

        device.fail_next(&[Failure::Garbage]);
        assert!(switch.refresh().await.is_err());
        assert_eq!(switch.snapshot(), Some(&outlets));
    }
}

// ============================================================================
// Verify
// ============================================================================

mod verify {
    use super::*;

    #[tokio::test]
    async fn reachable_switch_verifies() {
        let device = FakeDevice::eight_port();
        let mut switch = switch(&device, 1);
        assert!(switch.verify().await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn refused_connections_return_false() {
        let device = FakeDevice::eight_port();
        device.refuse_all();
        let mut switch = switch(&device, 3);

        assert!(!switch.verify().await.unwrap());
        assert_eq!(device.requests().len(), 3);
    }

    #[tokio::test]
    async fn rejected_credentials_return_false() {
        let device = FakeDevice::eight_port();
        device.fail_next(&[Failure::Unauthorized]);
        let mut switch = switch(&device, 1);
        assert!(!switch.verify().await.unwrap());
    }

    #[tokio::test]
    async fn unparsable_page_returns_false() {
        let device = FakeDevice::eight_port();
        device.fail_next(&[Failure::Garbage]);
        let mut switch = switch(&device, 1);
        assert!(!switch.verify().await.unwrap());
    }
}
