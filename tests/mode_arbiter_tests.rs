//! Mode arbiter timeout and indication tests

use aat_wifi_bridge::indication::{
    IndicationKind, IndicationMailbox, IndicationRequest, Layer, Led,
};
use aat_wifi_bridge::{AatMode, Indication, ModeArbiter};

const TICK_MS: i32 = 5;

fn drain(mailbox: &IndicationMailbox) -> Vec<IndicationRequest> {
    let mut out = Vec::new();
    while let Some(request) = mailbox.drain() {
        out.push(request);
    }
    out
}

#[test]
fn test_config_datagram_scenario() {
    // Datagram arrives, then 2005 ms of silence at the 5 ms ticker.
    let mailbox = IndicationMailbox::new();
    let arbiter = ModeArbiter::new(&mailbox);
    assert_eq!(arbiter.mode(), AatMode::Telemetry);

    arbiter.note_config_activity();
    assert_eq!(arbiter.mode(), AatMode::ConfigActive);

    for _ in 0..401 {
        arbiter.tick(TICK_MS);
    }
    assert_eq!(arbiter.mode(), AatMode::Telemetry);
}

#[test]
fn test_mode_holds_until_exact_timeout() {
    let mailbox = IndicationMailbox::new();
    let arbiter = ModeArbiter::new(&mailbox);

    arbiter.note_config_activity();

    // 1995 ms: still inside [t, t + timeout).
    for _ in 0..399 {
        arbiter.tick(TICK_MS);
        assert_eq!(arbiter.mode(), AatMode::ConfigActive);
    }

    // First tick at which accumulated elapsed time reaches the timeout.
    arbiter.tick(TICK_MS);
    assert_eq!(arbiter.mode(), AatMode::Telemetry);
}

#[test]
fn test_every_activity_rearms_and_pulses() {
    let mailbox = IndicationMailbox::new();
    let arbiter = ModeArbiter::new(&mailbox);

    arbiter.note_config_activity();
    drain(&mailbox);

    // 1.5 s in, more traffic: window restarts, pulse fires again.
    for _ in 0..300 {
        arbiter.tick(TICK_MS);
    }
    arbiter.note_config_activity();

    let requests = drain(&mailbox);
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].led, Led::AatConfigMode);
    assert_eq!(requests[0].layer, Layer::Override);
    assert_eq!(requests[0].indication.kind, IndicationKind::Blink);

    for _ in 0..399 {
        arbiter.tick(TICK_MS);
    }
    assert_eq!(arbiter.mode(), AatMode::ConfigActive);
    arbiter.tick(TICK_MS);
    assert_eq!(arbiter.mode(), AatMode::Telemetry);
}

#[test]
fn test_transition_indications_mirror_each_other() {
    let mailbox = IndicationMailbox::new();
    let arbiter = ModeArbiter::new(&mailbox);

    arbiter.note_config_activity();
    let entering = drain(&mailbox);
    assert_eq!(entering.len(), 3);
    assert_eq!(
        (entering[0].led, entering[0].indication),
        (Led::AatTelemetryMode, Indication::OFF)
    );
    assert_eq!(
        (entering[1].led, entering[1].indication),
        (Led::AatConfigMode, Indication::ON)
    );

    for _ in 0..400 {
        arbiter.tick(TICK_MS);
    }
    let leaving = drain(&mailbox);
    assert_eq!(leaving.len(), 2);
    assert_eq!(
        (leaving[0].led, leaving[0].indication),
        (Led::AatTelemetryMode, Indication::ON)
    );
    assert_eq!(
        (leaving[1].led, leaving[1].indication),
        (Led::AatConfigMode, Indication::OFF)
    );
}

#[test]
fn test_boot_indications_match_initial_mode() {
    let mailbox = IndicationMailbox::new();
    let arbiter = ModeArbiter::new(&mailbox);

    arbiter.publish_mode_indications();

    let requests = drain(&mailbox);
    assert_eq!(requests.len(), 2);
    assert_eq!(
        (requests[0].led, requests[0].indication),
        (Led::AatTelemetryMode, Indication::ON)
    );
    assert_eq!(
        (requests[1].led, requests[1].indication),
        (Led::AatConfigMode, Indication::OFF)
    );
}
