//! Telemetry network channel.
//!
//! Drains the downlink FIFO and broadcasts it to the subnet in chunks;
//! inbound datagrams are echoed back to their sender. The echo carries no
//! protocol semantics, it just keeps ground-station tooling able to probe
//! the link.

use crate::config;
use crate::io::{DatagramSocket, Endpoint};
use crate::ringbuf::ByteFifo;

pub struct TelemetryNetChannel<'a, const N: usize> {
    fifo: &'a ByteFifo<N>,
    broadcast: Endpoint,
    buf: [u8; config::CHUNK_SIZE],
}

impl<'a, const N: usize> TelemetryNetChannel<'a, N> {
    pub fn new(fifo: &'a ByteFifo<N>, broadcast: Endpoint) -> Self {
        Self {
            fifo,
            broadcast,
            buf: [0; config::CHUNK_SIZE],
        }
    }

    /// One channel cycle: at most one broadcast chunk out, at most one
    /// inbound datagram echoed.
    pub fn poll<D: DatagramSocket>(&mut self, socket: &mut D) {
        let available = self.fifo.available();
        if available > 0 {
            let want = available.min(config::CHUNK_SIZE);
            let count = self.fifo.get(&mut self.buf[..want]);
            if count > 0 && socket.send_to(&self.buf[..count], self.broadcast) {
                log::info!("downlink {} bytes", count);
            }
        }

        if let Some((count, from)) = socket.try_recv(&mut self.buf) {
            log::info!("received {} bytes from {}", count, from);
            socket.send_to(&self.buf[..count], from);
        }
    }
}
