//! AAT line ownership arbitration.
//!
//! The AAT UART is a passive telemetry sink until a configuration session
//! shows up on the network. From then on the line belongs to the session,
//! and telemetry forwarding to it is suppressed until the session has been
//! silent for [`crate::config::AAT_CONFIG_TIMEOUT_MS`]:
//!
//! ```text
//!             config-path activity
//! Telemetry ──────────────────────▶ ConfigActive ──┐ re-armed by
//!     ▲                                    ▲───────┘ further activity
//!     └──────── timeout elapsed ───────────┘
//! ```
//!
//! Mode is decided from traffic timing alone; nothing in the byte streams
//! is parsed. All state lives in atomic scalars so the three tasks that
//! touch it (multiplexer, config proxy, ticker) never need a lock. The
//! arbiter also owns the indication side effects of every transition,
//! emitted as requests into the shared mailbox.

use core::sync::atomic::{AtomicBool, AtomicI32, Ordering};

use crate::config;
use crate::indication::{Indication, IndicationMailbox, Layer, Led};

/// Current owner of the AAT serial line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AatMode {
    /// Telemetry is forwarded to the AAT UART.
    Telemetry,
    /// A configuration session owns the AAT UART.
    ConfigActive,
}

pub struct ModeArbiter<'a> {
    config_active: AtomicBool,
    /// Remaining config-session hold time [ms]. Meaningful only while
    /// `config_active`.
    config_timeout_ms: AtomicI32,

    telem_active: AtomicBool,
    /// Remaining telemetry liveness window [ms].
    telem_timeout_ms: AtomicI32,

    requests: &'a IndicationMailbox,
}

impl<'a> ModeArbiter<'a> {
    /// Initial mode is `Telemetry`, telemetry stream considered stale.
    pub const fn new(requests: &'a IndicationMailbox) -> Self {
        Self {
            config_active: AtomicBool::new(false),
            config_timeout_ms: AtomicI32::new(0),
            telem_active: AtomicBool::new(false),
            telem_timeout_ms: AtomicI32::new(0),
            requests,
        }
    }

    #[inline]
    pub fn mode(&self) -> AatMode {
        if self.config_active.load(Ordering::Acquire) {
            AatMode::ConfigActive
        } else {
            AatMode::Telemetry
        }
    }

    /// True while telemetry forwarding to the AAT UART must be suppressed.
    #[inline]
    pub fn is_config_active(&self) -> bool {
        self.config_active.load(Ordering::Acquire)
    }

    /// Publish the primary indications for the current mode. Called once
    /// at startup so the indicators reflect the initial state.
    pub fn publish_mode_indications(&self) {
        let (telem_mode, config_mode) = if self.is_config_active() {
            (Indication::OFF, Indication::ON)
        } else {
            (Indication::ON, Indication::OFF)
        };
        self.requests
            .request(Led::AatTelemetryMode, Layer::Primary, telem_mode);
        self.requests
            .request(Led::AatConfigMode, Layer::Primary, config_mode);
    }

    /// Report configuration-path activity: an inbound datagram from the
    /// config peer, or outbound AAT bytes while a peer is known.
    ///
    /// Enters `ConfigActive` (or re-arms its timeout) and fires the
    /// attention pulse on the config indicator. Mode-level indication
    /// changes are emitted only on an actual transition.
    pub fn note_config_activity(&self) {
        self.config_timeout_ms
            .store(config::AAT_CONFIG_TIMEOUT_MS, Ordering::Release);

        let was_active = self.config_active.swap(true, Ordering::AcqRel);
        if !was_active {
            log::info!("AAT line switched to configuration mode");
            self.requests
                .request(Led::AatTelemetryMode, Layer::Primary, Indication::OFF);
            self.requests
                .request(Led::AatConfigMode, Layer::Primary, Indication::ON);
        }

        // Every event re-triggers the transient pulse, transition or not.
        self.requests.request(
            Led::AatConfigMode,
            Layer::Override,
            config::CONFIG_SESSION_PULSE,
        );
    }

    /// Report telemetry input activity. Re-arms the liveness window and
    /// lights the telemetry indicator on a stale-to-alive edge.
    pub fn note_telemetry_activity(&self) {
        self.telem_timeout_ms
            .store(config::TELEMETRY_ACTIVE_TIMEOUT_MS, Ordering::Release);

        if !self.telem_active.swap(true, Ordering::AcqRel) {
            self.requests
                .request(Led::Telemetry, Layer::Primary, Indication::ON);
        }
    }

    /// Advance both timers by `elapsed_ms`. Called from the config proxy
    /// task once per poll period.
    ///
    /// The countdown fields are also stored to by the activity paths; a
    /// re-arm racing this decrement costs at most one tick of reversion
    /// delay either way.
    pub fn tick(&self, elapsed_ms: i32) {
        if self.config_active.load(Ordering::Acquire) {
            let remaining =
                self.config_timeout_ms.fetch_sub(elapsed_ms, Ordering::AcqRel) - elapsed_ms;
            if remaining <= 0 && self.config_active.swap(false, Ordering::AcqRel) {
                log::info!("configuration session timed out, AAT line back to telemetry");
                self.requests
                    .request(Led::AatTelemetryMode, Layer::Primary, Indication::ON);
                self.requests
                    .request(Led::AatConfigMode, Layer::Primary, Indication::OFF);
            }
        }

        if self.telem_active.load(Ordering::Acquire) {
            let remaining =
                self.telem_timeout_ms.fetch_sub(elapsed_ms, Ordering::AcqRel) - elapsed_ms;
            if remaining <= 0 && self.telem_active.swap(false, Ordering::AcqRel) {
                self.requests
                    .request(Led::Telemetry, Layer::Primary, Indication::OFF);
            }
        }
    }
}
