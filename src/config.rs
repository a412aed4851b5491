//! Module: config
//!
//! Compile-time configuration for the bridge: network plan, UART wiring,
//! indicator pins and timing constants. One source of truth, mirrored
//! nowhere else.

use crate::indication::Indication;

// --- WiFi access point ---

pub const WIFI_SSID: &str = "esp32_wifi";
pub const WIFI_PASSWORD: &str = "11112222";
pub const WIFI_CHANNEL: u8 = 1;
pub const WIFI_MAX_STATIONS: u16 = 5;

/// Address the softAP interface owns; both UDP channels bind to it.
pub const LOCAL_IP: [u8; 4] = [192, 168, 1, 10];
pub const NETMASK_BITS: u8 = 24;

// --- UDP channels ---

pub const TELEMETRY_PORT: u16 = 3151;
pub const CONFIG_PORT: u16 = 3140;

// --- Serial wiring ---
//
// Telemetry UART carries the receiver downlink; AAT UART is shared between
// telemetry forwarding and the remote configuration session.

pub const UART_BAUD_RATE: u32 = 115_200;

pub const TELEMETRY_UART_RX_PIN: i32 = 16;
pub const TELEMETRY_UART_TX_PIN: i32 = 17;

pub const AAT_UART_RX_PIN: i32 = 18;
pub const AAT_UART_TX_PIN: i32 = 19;

// --- Indicators ---

/// Flashes while telemetry data is coming in from the receiver UART.
pub const TELEM_LED_PIN: i32 = 2;
/// Lit while the AAT UART receives the telemetry stream.
pub const AAT_TELEM_MODE_LED_PIN: i32 = 27;
/// Lit while the AAT UART is owned by a configuration session.
pub const AAT_CONFIG_MODE_LED_PIN: i32 = 25;

// --- Buffers and chunking ---

/// Largest serial read and datagram payload moved in one step.
pub const CHUNK_SIZE: usize = 256;

/// Telemetry downlink ring capacity. Sized for the worst-case burst the
/// receiver can produce between two network task wakeups at 115200 baud,
/// with generous margin.
pub const DOWNLINK_FIFO_CAPACITY: usize = 2048;

// --- Timing ---

/// Telemetry forwarding to the AAT UART stays disabled for this long after
/// the last configuration-path activity [ms].
pub const AAT_CONFIG_TIMEOUT_MS: i32 = 2000;

/// The telemetry stream counts as stale after this much silence [ms].
pub const TELEMETRY_ACTIVE_TIMEOUT_MS: i32 = 1000;

/// Poll period of both network tasks [ms]. Also the step by which the mode
/// arbiter timers are decremented.
pub const NET_TASK_PERIOD_MS: u32 = 5;
/// Poll period of the telemetry multiplexer [ms].
pub const MUX_TASK_PERIOD_MS: u32 = 3;
/// Indication scheduler tick period [ms].
pub const LED_TICK_PERIOD_MS: u32 = 2;

// --- Task priorities (FreeRTOS) ---
//
// The multiplexer must outrank the config proxy: both write the AAT UART,
// and a busy configuration session must not starve telemetry forwarding.

pub const TELEMETRY_NET_TASK_PRIORITY: u8 = 4;
pub const CONFIG_TASK_PRIORITY: u8 = 5;
pub const MUX_TASK_PRIORITY: u8 = 6;
pub const LED_TASK_PRIORITY: u8 = 2;

pub const NET_TASK_STACK_SIZE: usize = 4096;
pub const MUX_TASK_STACK_SIZE: usize = 4096;
pub const LED_TASK_STACK_SIZE: usize = 2048;

// --- Indication patterns (in LED scheduler ticks) ---

/// One-shot flash fired on data activity: 2 ms on, 48 ms dead time, so
/// back-to-back traffic reads as a steady flicker instead of a smear.
pub const ACTIVITY_PULSE: Indication = Indication::blink(1, 24, 1);

/// Attention pattern fired whenever a configuration session (re)grabs the
/// AAT line.
pub const CONFIG_SESSION_PULSE: Indication = Indication::blink(5, 5, 3);
