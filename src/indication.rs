//! Layered LED indication.
//!
//! Each indicator runs a small state machine with two layers:
//!
//! ```text
//! requests ──▶ [ override (transient) ]──┐ selected layer
//!              [ primary  (persistent) ]─┴──▶ pin level
//! ```
//!
//! The primary layer holds the persistent state (mode, liveness); the
//! override layer carries transient patterns (activity flashes, attention
//! pulses) that mask the primary and auto-revert when exhausted. Only the
//! selected layer advances on a tick; the other is frozen at whatever
//! phase it held when last active.
//!
//! Cross-task indication changes travel through [`IndicationMailbox`], a
//! lock-free MPSC ring drained by the scheduler task once per tick.

use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicU32, Ordering};

use crate::io::IndicatorPin;

/// Number of indicator channels the bridge drives.
pub const LED_COUNT: usize = 3;

/// Request mailbox depth. Requests arrive at most a few per network poll,
/// the scheduler drains every 2 ms; 16 slots never fill in practice.
pub const MAILBOX_DEPTH: usize = 16;

/// Logical indicators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Led {
    /// Telemetry input activity.
    Telemetry = 0,
    /// AAT line owned by telemetry forwarding.
    AatTelemetryMode = 1,
    /// AAT line owned by a configuration session.
    AatConfigMode = 2,
}

impl Led {
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Which layer of a channel a request targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Layer {
    Primary,
    Override,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IndicationKind {
    Off,
    On,
    Blink,
}

/// A requested indicator behavior. Tick counts are in scheduler ticks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Indication {
    pub kind: IndicationKind,
    pub on_ticks: u16,
    pub off_ticks: u16,
    /// Number of blink cycles; 0 repeats until replaced.
    pub repeats: u16,
}

impl Indication {
    pub const OFF: Self = Self {
        kind: IndicationKind::Off,
        on_ticks: 0,
        off_ticks: 0,
        repeats: 0,
    };

    pub const ON: Self = Self {
        kind: IndicationKind::On,
        on_ticks: 0,
        off_ticks: 0,
        repeats: 0,
    };

    pub const fn blink(on_ticks: u16, off_ticks: u16, repeats: u16) -> Self {
        Self {
            kind: IndicationKind::Blink,
            on_ticks,
            off_ticks,
            repeats,
        }
    }
}

/// Blink cycle position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    /// Next edge turns the output on.
    Rising,
    /// On-period running; next edge turns the output off.
    Falling,
    /// Off-period running; ends in the cycle-complete check.
    Counting,
}

/// Outcome of advancing one layer by one tick.
enum Step {
    Level(bool),
    /// Finite blink ran out of cycles; the layer reverted itself to Off.
    Exhausted,
}

/// One layer of a channel: an indication plus its live phase state.
#[derive(Clone, Copy)]
struct LayerState {
    indication: Indication,
    phase: Phase,
    /// Ticks until the next edge.
    ticks: u16,
    cycles_left: u16,
    /// Output level this layer last held. Frozen while the layer is hidden.
    level: bool,
}

impl LayerState {
    const fn new() -> Self {
        Self {
            indication: Indication::OFF,
            phase: Phase::Rising,
            ticks: 1,
            cycles_left: 0,
            level: false,
        }
    }

    /// Install a new indication. Phase and counters always restart; the
    /// tick counter is armed to fire on the very next tick so a stale
    /// residual countdown never delays the new state.
    fn set(&mut self, indication: Indication) {
        self.indication = indication;
        self.phase = Phase::Rising;
        self.ticks = 1;
        self.cycles_left = indication.repeats;
        match indication.kind {
            IndicationKind::Off => self.level = false,
            IndicationKind::On => self.level = true,
            IndicationKind::Blink => {}
        }
    }

    fn advance(&mut self) -> Step {
        match self.indication.kind {
            IndicationKind::Off => {
                self.level = false;
                Step::Level(false)
            }
            IndicationKind::On => {
                self.level = true;
                Step::Level(true)
            }
            IndicationKind::Blink => {
                self.ticks = self.ticks.saturating_sub(1);
                if self.ticks > 0 {
                    return Step::Level(self.level);
                }
                match self.phase {
                    Phase::Rising => {
                        self.level = true;
                        self.ticks = self.indication.on_ticks;
                        self.phase = Phase::Falling;
                        Step::Level(true)
                    }
                    Phase::Falling => {
                        self.level = false;
                        self.ticks = self.indication.off_ticks;
                        self.phase = Phase::Counting;
                        Step::Level(false)
                    }
                    Phase::Counting => {
                        if self.indication.repeats > 0 {
                            self.cycles_left -= 1;
                            if self.cycles_left == 0 {
                                self.indication = Indication::OFF;
                                self.level = false;
                                return Step::Exhausted;
                            }
                        }
                        // Next cycle starts on this same tick.
                        self.level = true;
                        self.ticks = self.indication.on_ticks;
                        self.phase = Phase::Falling;
                        Step::Level(true)
                    }
                }
            }
        }
    }
}

const PRIMARY: usize = 0;
const OVERRIDE: usize = 1;

/// Two-layer indication state machine for one indicator.
pub struct LedChannel {
    layers: [LayerState; 2],
    override_active: bool,
    level: bool,
}

impl LedChannel {
    pub const fn new() -> Self {
        Self {
            layers: [LayerState::new(); 2],
            override_active: false,
            level: false,
        }
    }

    /// Install an indication on one layer.
    ///
    /// Any `On`/`Blink` set on the override layer selects it; `Off` on the
    /// override layer deselects it. Primary sets never move the selector.
    pub fn set(&mut self, layer: Layer, indication: Indication) {
        match layer {
            Layer::Primary => self.layers[PRIMARY].set(indication),
            Layer::Override => {
                self.layers[OVERRIDE].set(indication);
                self.override_active = indication.kind != IndicationKind::Off;
            }
        }
    }

    /// Advance the selected layer by one tick and return the level to
    /// drive. When a transient override exhausts, the selector pops back
    /// to primary and the primary's frozen state is re-applied on this
    /// same tick.
    pub fn tick(&mut self) -> bool {
        let selected = if self.override_active { OVERRIDE } else { PRIMARY };
        match self.layers[selected].advance() {
            Step::Level(level) => self.level = level,
            Step::Exhausted => {
                if selected == OVERRIDE {
                    self.override_active = false;
                    self.level = self.layers[PRIMARY].level;
                } else {
                    self.level = false;
                }
            }
        }
        self.level
    }

    /// Level the channel currently drives.
    #[inline]
    pub fn level(&self) -> bool {
        self.level
    }

    /// True while a transient override masks the primary layer.
    #[inline]
    pub fn override_active(&self) -> bool {
        self.override_active
    }
}

impl Default for LedChannel {
    fn default() -> Self {
        Self::new()
    }
}

/// One queued indication change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IndicationRequest {
    pub led: Led,
    pub layer: Layer,
    pub indication: Indication,
}

impl IndicationRequest {
    const EMPTY: Self = Self {
        led: Led::Telemetry,
        layer: Layer::Primary,
        indication: Indication::OFF,
    };
}

/// Lock-free MPSC mailbox for indication requests.
///
/// Any task may push (coordinated via atomic `fetch_add`); only the
/// scheduler task drains. Pushing never blocks; a full ring drops the
/// request and counts it.
pub struct IndicationMailbox {
    entries: UnsafeCell<[IndicationRequest; MAILBOX_DEPTH]>,
    write_idx: AtomicU32,
    read_idx: AtomicU32,
    dropped: AtomicU32,
}

// SAFETY: multiple producers coordinated by fetch_add on write_idx, single
// consumer (scheduler task). Each producer writes a unique slot.
unsafe impl Sync for IndicationMailbox {}
unsafe impl Send for IndicationMailbox {}

impl IndicationMailbox {
    const MASK: usize = MAILBOX_DEPTH - 1;

    pub const fn new() -> Self {
        assert!(
            MAILBOX_DEPTH.is_power_of_two(),
            "mailbox depth must be power of 2"
        );

        Self {
            entries: UnsafeCell::new([IndicationRequest::EMPTY; MAILBOX_DEPTH]),
            write_idx: AtomicU32::new(0),
            read_idx: AtomicU32::new(0),
            dropped: AtomicU32::new(0),
        }
    }

    /// Queue an indication change. Returns `false` if the ring was full
    /// and the request was dropped.
    pub fn request(&self, led: Led, layer: Layer, indication: Indication) -> bool {
        let write = self.write_idx.fetch_add(1, Ordering::AcqRel);
        let read = self.read_idx.load(Ordering::Acquire);

        if write.wrapping_sub(read) >= MAILBOX_DEPTH as u32 {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return false;
        }

        let idx = (write as usize) & Self::MASK;

        // SAFETY: fetch_add gave this producer a unique slot index.
        unsafe {
            (*self.entries.get())[idx] = IndicationRequest {
                led,
                layer,
                indication,
            };
        }

        true
    }

    /// Take the next queued request, if any. Scheduler task only.
    pub fn drain(&self) -> Option<IndicationRequest> {
        let read = self.read_idx.load(Ordering::Relaxed);
        let write = self.write_idx.load(Ordering::Acquire);

        if read == write {
            return None;
        }

        let idx = (read as usize) & Self::MASK;

        // SAFETY: single consumer, unique slot.
        let request = unsafe { (*self.entries.get())[idx] };

        self.read_idx.store(read.wrapping_add(1), Ordering::Release);
        Some(request)
    }

    /// Requests dropped because the ring was full.
    #[inline]
    pub fn dropped(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl Default for IndicationMailbox {
    fn default() -> Self {
        Self::new()
    }
}

/// Drives the physical indicators: drains the request mailbox, advances
/// every channel, writes pin levels on change.
pub struct LedScheduler<'a, P: IndicatorPin> {
    requests: &'a IndicationMailbox,
    channels: [LedChannel; LED_COUNT],
    pins: [P; LED_COUNT],
    driven: [Option<bool>; LED_COUNT],
}

impl<'a, P: IndicatorPin> LedScheduler<'a, P> {
    /// Pins in `Led` discriminant order.
    pub fn new(requests: &'a IndicationMailbox, pins: [P; LED_COUNT]) -> Self {
        Self {
            requests,
            channels: [LedChannel::new(), LedChannel::new(), LedChannel::new()],
            pins,
            driven: [None; LED_COUNT],
        }
    }

    /// One scheduler tick: apply pending requests, advance all channels,
    /// refresh the pins.
    pub fn tick(&mut self) {
        while let Some(request) = self.requests.drain() {
            self.channels[request.led.index()].set(request.layer, request.indication);
        }

        for (i, channel) in self.channels.iter_mut().enumerate() {
            let level = channel.tick();
            if self.driven[i] != Some(level) {
                self.pins[i].set(level);
                self.driven[i] = Some(level);
            }
        }
    }

    /// Channel state, for diagnostics and tests.
    pub fn channel(&self, led: Led) -> &LedChannel {
        &self.channels[led.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_on_applies_on_next_tick() {
        let mut channel = LedChannel::new();
        assert!(!channel.tick());

        channel.set(Layer::Primary, Indication::ON);
        assert!(channel.tick());
        assert!(channel.tick());
    }

    #[test]
    fn test_blink_single_cycle_timing() {
        let mut channel = LedChannel::new();
        channel.set(Layer::Primary, Indication::ON);
        channel.tick();

        // Override set "at tick 0"; ticks below are 1-based from here.
        channel.set(Layer::Override, Indication::blink(10, 40, 1));

        for tick in 1..=50 {
            let level = channel.tick();
            if tick <= 10 {
                assert!(level, "expected on at tick {}", tick);
            } else {
                assert!(!level, "expected off at tick {}", tick);
            }
        }

        // Cycle complete: override pops, primary's frozen On returns.
        assert!(channel.tick());
        assert!(!channel.override_active());
    }

    #[test]
    fn test_infinite_blink_repeats() {
        let mut channel = LedChannel::new();
        channel.set(Layer::Primary, Indication::blink(2, 3, 0));

        let mut pattern = [false; 15];
        for slot in pattern.iter_mut() {
            *slot = channel.tick();
        }
        // 2 on, 3 off, repeating with no gap.
        assert_eq!(
            pattern,
            [
                true, true, false, false, false, true, true, false, false, false, true, true,
                false, false, false
            ]
        );
    }

    #[test]
    fn test_override_off_reveals_primary() {
        let mut channel = LedChannel::new();
        channel.set(Layer::Primary, Indication::ON);
        channel.tick();

        channel.set(Layer::Override, Indication::blink(100, 100, 0));
        assert!(channel.override_active());

        channel.set(Layer::Override, Indication::OFF);
        assert!(!channel.override_active());
        assert!(channel.tick());
    }

    #[test]
    fn test_new_indication_overrides_stale_countdown() {
        let mut channel = LedChannel::new();
        channel.set(Layer::Primary, Indication::blink(100, 100, 0));
        channel.tick();
        assert!(channel.level());

        // Off must become visible on the very next tick, not after the
        // remaining 99 on-ticks.
        channel.set(Layer::Primary, Indication::OFF);
        assert!(!channel.tick());
    }

    #[test]
    fn test_mailbox_roundtrip() {
        let mailbox = IndicationMailbox::new();
        assert!(mailbox.drain().is_none());

        assert!(mailbox.request(Led::AatConfigMode, Layer::Primary, Indication::ON));

        let request = mailbox.drain().unwrap();
        assert_eq!(request.led, Led::AatConfigMode);
        assert_eq!(request.layer, Layer::Primary);
        assert_eq!(request.indication, Indication::ON);
        assert!(mailbox.drain().is_none());
    }

    #[test]
    fn test_mailbox_full_drops() {
        let mailbox = IndicationMailbox::new();

        for _ in 0..MAILBOX_DEPTH {
            assert!(mailbox.request(Led::Telemetry, Layer::Override, Indication::ON));
        }
        assert!(!mailbox.request(Led::Telemetry, Layer::Override, Indication::ON));
        assert_eq!(mailbox.dropped(), 1);
    }
}
