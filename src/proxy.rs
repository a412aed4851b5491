//! Remote configuration relay.
//!
//! Bidirectional raw relay between one network peer and the AAT UART.
//! The peer is learned, not configured: the first datagram on the config
//! port names it, and the most recent sender keeps the slot. Until a peer
//! is known, AAT serial output is flushed so a chatty tracker cannot fill
//! driver buffers while nobody is listening.
//!
//! Every byte moved in either direction counts as configuration-path
//! activity and re-arms the mode arbiter. No acknowledgments, no framing;
//! at-most-once per direction.

use crate::arbiter::ModeArbiter;
use crate::config;
use crate::io::{DatagramSocket, Endpoint, SerialPort};

pub struct ConfigProxy<'a> {
    arbiter: &'a ModeArbiter<'a>,
    peer: Option<Endpoint>,
    buf: [u8; config::CHUNK_SIZE],
}

impl<'a> ConfigProxy<'a> {
    pub fn new(arbiter: &'a ModeArbiter<'a>) -> Self {
        Self {
            arbiter,
            peer: None,
            buf: [0; config::CHUNK_SIZE],
        }
    }

    /// One relay cycle: AAT serial towards the peer, then one inbound
    /// datagram towards the AAT serial line.
    pub fn poll<S: SerialPort, D: DatagramSocket>(&mut self, aat: &mut S, socket: &mut D) {
        self.poll_downlink(aat, socket);
        self.poll_uplink(aat, socket);
    }

    /// AAT serial output, forwarded to the learned peer in chunks.
    fn poll_downlink<S: SerialPort, D: DatagramSocket>(&mut self, aat: &mut S, socket: &mut D) {
        let peer = match self.peer {
            Some(peer) => peer,
            None => {
                // Nobody attached; drop whatever the tracker is saying.
                aat.discard_input();
                return;
            }
        };

        while aat.available() > 0 {
            let want = aat.available().min(config::CHUNK_SIZE);
            let count = aat.read(&mut self.buf[..want]);
            if count == 0 {
                break;
            }
            if socket.send_to(&self.buf[..count], peer) {
                log::info!("downlink {} bytes", count);
            }
            self.arbiter.note_config_activity();
        }
    }

    /// One inbound datagram, written verbatim to the AAT serial line.
    fn poll_uplink<S: SerialPort, D: DatagramSocket>(&mut self, aat: &mut S, socket: &mut D) {
        let (count, from) = match socket.try_recv(&mut self.buf) {
            Some(received) => received,
            None => return,
        };

        if self.peer != Some(from) {
            self.peer = Some(from);
            log::info!("client address: {}", from);
        }

        log::info!("uplink {} bytes", count);
        self.arbiter.note_config_activity();
        aat.write_all(&self.buf[..count]);
    }

    /// Learned peer, if any.
    #[inline]
    pub fn peer(&self) -> Option<Endpoint> {
        self.peer
    }
}
