//! Telemetry fan-out.
//!
//! Drains the receiver UART and feeds two sinks with the identical byte
//! run: the downlink FIFO (towards the network broadcast) and the AAT
//! UART, the latter only while the mode arbiter says the line belongs to
//! telemetry. A chunk is never split across destinations.
//!
//! FIFO overflow drops the excess silently at the buffer level; this
//! component keeps the score and reports it in batches.

use crate::arbiter::ModeArbiter;
use crate::config;
use crate::indication::{IndicationMailbox, Layer, Led};
use crate::io::SerialPort;
use crate::ringbuf::ByteFifo;

/// Dropped-byte backlog that triggers one warning log.
const DROP_REPORT_THRESHOLD: u32 = 256;

pub struct TelemetryMux<'a, const N: usize> {
    fifo: &'a ByteFifo<N>,
    arbiter: &'a ModeArbiter<'a>,
    requests: &'a IndicationMailbox,
    buf: [u8; config::CHUNK_SIZE],
    dropped: u32,
    dropped_unreported: u32,
}

impl<'a, const N: usize> TelemetryMux<'a, N> {
    pub fn new(
        fifo: &'a ByteFifo<N>,
        arbiter: &'a ModeArbiter<'a>,
        requests: &'a IndicationMailbox,
    ) -> Self {
        Self {
            fifo,
            arbiter,
            requests,
            buf: [0; config::CHUNK_SIZE],
            dropped: 0,
            dropped_unreported: 0,
        }
    }

    /// One multiplexer cycle. Returns the number of bytes moved.
    pub fn poll<S: SerialPort, T: SerialPort>(&mut self, source: &mut S, aat: &mut T) -> usize {
        let pending = source.available();
        if pending == 0 {
            return 0;
        }

        let want = pending.min(config::CHUNK_SIZE);
        let count = source.read(&mut self.buf[..want]);
        if count == 0 {
            return 0;
        }

        let accepted = self.fifo.push(&self.buf[..count]);
        if accepted < count {
            self.note_drop((count - accepted) as u32);
        }

        self.arbiter.note_telemetry_activity();
        self.requests
            .request(Led::Telemetry, Layer::Override, config::ACTIVITY_PULSE);

        // Forwarding to the AAT UART is suppressed while a configuration
        // session owns the line; the network path above is unaffected.
        if !self.arbiter.is_config_active() {
            aat.write_all(&self.buf[..count]);
            self.requests.request(
                Led::AatTelemetryMode,
                Layer::Override,
                config::ACTIVITY_PULSE,
            );
        }

        count
    }

    /// Total downlink bytes lost to FIFO overflow since boot.
    #[inline]
    pub fn dropped(&self) -> u32 {
        self.dropped
    }

    fn note_drop(&mut self, count: u32) {
        self.dropped = self.dropped.wrapping_add(count);
        self.dropped_unreported += count;
        if self.dropped_unreported >= DROP_REPORT_THRESHOLD {
            log::warn!(
                "downlink FIFO full, dropped {} bytes ({} total)",
                self.dropped_unreported,
                self.dropped
            );
            self.dropped_unreported = 0;
        }
    }
}
