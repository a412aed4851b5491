//! esp-idf implementations of the core I/O seams.
//!
//! Thin adapters only: UARTs behind [`SerialPort`], UDP sockets behind
//! [`DatagramSocket`], GPIO outputs behind [`IndicatorPin`]. Address-family
//! filtering happens here, so the relay logic upstream only ever sees IPv4
//! endpoints.

use std::io::ErrorKind;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, UdpSocket};
use std::sync::Arc;

use esp_idf_svc::hal::delay::NON_BLOCK;
use esp_idf_svc::hal::gpio::{AnyOutputPin, Output, PinDriver};
use esp_idf_svc::hal::uart::UartDriver;
use esp_idf_svc::sys;

use aat_wifi_bridge::io::{DatagramSocket, Endpoint, IndicatorPin, SerialPort};

/// Shared handle to one UART port.
///
/// The AAT port is written by both the multiplexer and the config proxy;
/// the mode arbiter keeps the two from talking over each other in time,
/// and the ESP-IDF driver serializes same-direction access underneath.
#[derive(Clone)]
pub struct BridgeUart<'d> {
    driver: Arc<UartDriver<'d>>,
}

// SAFETY: every driver call below goes through the installed ESP-IDF UART
// driver, which guards its TX and RX paths internally. No task in this
// firmware issues concurrent reads on the same port.
unsafe impl Send for BridgeUart<'_> {}
unsafe impl Sync for BridgeUart<'_> {}

impl<'d> BridgeUart<'d> {
    pub fn new(driver: UartDriver<'d>) -> Self {
        Self {
            driver: Arc::new(driver),
        }
    }
}

impl SerialPort for BridgeUart<'_> {
    fn available(&self) -> usize {
        let mut pending: sys::size_t = 0;
        // SAFETY: the driver is installed for the lifetime of the process.
        let result = unsafe { sys::uart_get_buffered_data_len(self.driver.port(), &mut pending) };
        if result == sys::ESP_OK {
            pending as usize
        } else {
            0
        }
    }

    fn read(&mut self, buf: &mut [u8]) -> usize {
        match self.driver.read(buf, NON_BLOCK) {
            Ok(count) => count,
            Err(e) => {
                log::error!("uart read failed: {}", e);
                0
            }
        }
    }

    fn write_all(&mut self, bytes: &[u8]) {
        let mut offset = 0;
        while offset < bytes.len() {
            match self.driver.write(&bytes[offset..]) {
                Ok(0) => break,
                Ok(count) => offset += count,
                Err(e) => {
                    log::error!("uart write failed: {}", e);
                    break;
                }
            }
        }
    }

    fn discard_input(&mut self) {
        // SAFETY: flushing the RX buffer of an installed driver.
        let _ = unsafe { sys::uart_flush_input(self.driver.port()) };
    }
}

/// Non-blocking UDP socket adapter.
pub struct BridgeSocket {
    socket: UdpSocket,
}

impl BridgeSocket {
    pub fn new(socket: UdpSocket) -> Self {
        Self { socket }
    }
}

impl DatagramSocket for BridgeSocket {
    fn try_recv(&mut self, buf: &mut [u8]) -> Option<(usize, Endpoint)> {
        match self.socket.recv_from(buf) {
            Ok((count, SocketAddr::V4(from))) => {
                Some((count, Endpoint::new(from.ip().octets(), from.port())))
            }
            Ok((_, SocketAddr::V6(from))) => {
                log::error!("IPv6 is not supported (datagram from {})", from);
                None
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock => None,
            Err(e) => {
                log::error!("error occurred during receiving: {}", e);
                None
            }
        }
    }

    fn send_to(&mut self, payload: &[u8], to: Endpoint) -> bool {
        let addr = SocketAddrV4::new(Ipv4Addr::from(to.addr), to.port);
        match self.socket.send_to(payload, addr) {
            Ok(_) => true,
            Err(e) => {
                log::error!("error occurred during sending: {}", e);
                false
            }
        }
    }
}

/// GPIO-driven indicator, active high.
pub struct LedPin<'d> {
    driver: PinDriver<'d, AnyOutputPin, Output>,
}

impl<'d> LedPin<'d> {
    pub fn new(driver: PinDriver<'d, AnyOutputPin, Output>) -> Self {
        Self { driver }
    }
}

impl IndicatorPin for LedPin<'_> {
    fn set(&mut self, on: bool) {
        let result = if on {
            self.driver.set_high()
        } else {
            self.driver.set_low()
        };
        if let Err(e) = result {
            log::error!("indicator write failed: {}", e);
        }
    }
}
