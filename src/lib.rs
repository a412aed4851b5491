//! # aat-wifi-bridge
//!
//! Core of the telemetry/AAT WiFi bridge: moves an opaque telemetry byte
//! stream from a receiver UART to a UDP broadcast, relays a remote
//! configuration session to the antenna tracker on a second UART, and
//! arbitrates who owns that second UART at any moment.
//!
//! ## Architecture
//!
//! ```text
//! telemetry UART ──▶ TelemetryMux ──▶ ByteFifo ──▶ TelemetryNetChannel ──▶ UDP 3151
//!                        │                                      (broadcast + echo)
//!                        ▼ (Telemetry mode only)
//!                     AAT UART ◀──▶ ConfigProxy ◀──▶ UDP 3140 (learned peer)
//!                        │               │
//!                        └── activity ──▶ ModeArbiter ──▶ IndicationMailbox ──▶ LedScheduler
//! ```
//!
//! Cross-task traffic flows exclusively through lock-free structures: the
//! SPSC [`ByteFifo`] for telemetry bytes, the MPSC [`IndicationMailbox`]
//! for indicator changes, and the atomic scalars inside [`ModeArbiter`].
//! No mutexes, no blocking reads; every task polls and sleeps its own
//! fixed period.
//!
//! Everything in this library is platform-free and runs on the host test
//! suite; the esp-idf glue lives in the `bridge` binary.

#![cfg_attr(not(test), no_std)]

pub mod arbiter;
pub mod config;
pub mod indication;
pub mod io;
pub mod mux;
pub mod netchan;
pub mod proxy;
pub mod ringbuf;

pub use arbiter::{AatMode, ModeArbiter};
pub use indication::{Indication, IndicationMailbox, Led, LedScheduler};
pub use io::{DatagramSocket, Endpoint, IndicatorPin, SerialPort};
pub use mux::TelemetryMux;
pub use netchan::TelemetryNetChannel;
pub use proxy::ConfigProxy;
pub use ringbuf::ByteFifo;
