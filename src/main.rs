//! Bridge firmware entry point.
//!
//! Brings up the softAP with its static IP plan, installs both UART
//! drivers and the indicator pins, then hands everything to four tasks:
//!
//! | Task             | Period | Priority |
//! |------------------|--------|----------|
//! | telemetry_server | 5 ms   | 4        |
//! | config_server    | 5 ms   | 5        |
//! | telemetry_mux    | 3 ms   | 6        |
//! | indication       | 2 ms   | 2        |
//!
//! telemetry_mux must outrank config_server: both write the AAT UART, and
//! a busy configuration session must not starve telemetry forwarding.
//! Tasks run for the lifetime of the process; there is no teardown path.

#[cfg(target_os = "espidf")]
mod platform;

#[cfg(target_os = "espidf")]
mod app {
    use std::net::{Ipv4Addr, SocketAddrV4, UdpSocket};
    use std::thread;
    use std::time::Duration;

    use esp_idf_svc::eventloop::EspSystemEventLoop;
    use esp_idf_svc::hal::gpio::{AnyIOPin, PinDriver};
    use esp_idf_svc::hal::modem::Modem;
    use esp_idf_svc::hal::peripherals::Peripherals;
    use esp_idf_svc::hal::task::thread::ThreadSpawnConfiguration;
    use esp_idf_svc::hal::uart::{config as uart_config, UartDriver};
    use esp_idf_svc::hal::units::Hertz;
    use esp_idf_svc::ipv4::{self, Mask, RouterConfiguration, Subnet};
    use esp_idf_svc::log::EspLogger;
    use esp_idf_svc::netif::{EspNetif, NetifConfiguration, NetifStack};
    use esp_idf_svc::nvs::EspDefaultNvsPartition;
    use esp_idf_svc::sys::EspError;
    use esp_idf_svc::wifi::{
        AccessPointConfiguration, AuthMethod, Configuration, EspWifi, WifiDriver, WifiEvent,
    };

    use aat_wifi_bridge::indication::LED_COUNT;
    use aat_wifi_bridge::{
        config, ByteFifo, ConfigProxy, Endpoint, IndicationMailbox, LedScheduler, ModeArbiter,
        TelemetryMux, TelemetryNetChannel,
    };

    use crate::platform::{BridgeSocket, BridgeUart, LedPin};

    /// Receiver downlink ring: filled by the mux task, drained by the
    /// telemetry network task.
    static DOWNLINK_FIFO: ByteFifo<{ config::DOWNLINK_FIFO_CAPACITY }> = ByteFifo::new();
    static INDICATIONS: IndicationMailbox = IndicationMailbox::new();
    static ARBITER: ModeArbiter<'static> = ModeArbiter::new(&INDICATIONS);

    pub fn run() -> Result<(), EspError> {
        esp_idf_svc::sys::link_patches();
        EspLogger::initialize_default();

        log::info!("{}", env!("VERSION_STRING"));

        let peripherals = Peripherals::take()?;
        let sysloop = EspSystemEventLoop::take()?;
        let nvs = EspDefaultNvsPartition::take()?;
        let pins = peripherals.pins;

        // Both serial links run 115200 8N1, no flow control.
        let uart_cfg = uart_config::Config::default().baudrate(Hertz(config::UART_BAUD_RATE));

        let telemetry_uart = BridgeUart::new(UartDriver::new(
            peripherals.uart2,
            pins.gpio17,
            pins.gpio16,
            Option::<AnyIOPin>::None,
            Option::<AnyIOPin>::None,
            &uart_cfg,
        )?);

        let aat_uart = BridgeUart::new(UartDriver::new(
            peripherals.uart1,
            pins.gpio19,
            pins.gpio18,
            Option::<AnyIOPin>::None,
            Option::<AnyIOPin>::None,
            &uart_cfg,
        )?);

        // Indicator pins in `Led` discriminant order.
        let leds = [
            LedPin::new(PinDriver::output(pins.gpio2.downgrade_output())?),
            LedPin::new(PinDriver::output(pins.gpio27.downgrade_output())?),
            LedPin::new(PinDriver::output(pins.gpio25.downgrade_output())?),
        ];

        let _wifi = start_softap(peripherals.modem, &sysloop, nvs)?;
        let _wifi_events = sysloop.subscribe::<WifiEvent, _>(|event| match event {
            WifiEvent::ApStaConnected(_) => log::info!("station joined"),
            WifiEvent::ApStaDisconnected(_) => log::info!("station left"),
            _ => (),
        })?;

        ARBITER.publish_mode_indications();

        spawn_task(
            b"telemetry_server\0",
            config::NET_TASK_STACK_SIZE,
            config::TELEMETRY_NET_TASK_PRIORITY,
            telemetry_net_task,
        )?;

        {
            let aat = aat_uart.clone();
            spawn_task(
                b"config_server\0",
                config::NET_TASK_STACK_SIZE,
                config::CONFIG_TASK_PRIORITY,
                move || config_proxy_task(aat),
            )?;
        }

        spawn_task(
            b"telemetry_mux\0",
            config::MUX_TASK_STACK_SIZE,
            config::MUX_TASK_PRIORITY,
            move || telemetry_mux_task(telemetry_uart, aat_uart),
        )?;

        spawn_task(
            b"indication\0",
            config::LED_TASK_STACK_SIZE,
            config::LED_TASK_PRIORITY,
            move || indication_task(leds),
        )?;

        // Restore defaults for anything spawned later.
        ThreadSpawnConfiguration::default().set()?;

        loop {
            thread::sleep(Duration::from_secs(1));
        }
    }

    fn spawn_task<F>(
        name: &'static [u8],
        stack_size: usize,
        priority: u8,
        task: F,
    ) -> Result<(), EspError>
    where
        F: FnOnce() + Send + 'static,
    {
        ThreadSpawnConfiguration {
            name: Some(name),
            stack_size,
            priority,
            ..Default::default()
        }
        .set()?;

        // A failed spawn at boot is unrecoverable, like any other driver
        // install failure.
        thread::Builder::new()
            .stack_size(stack_size)
            .spawn(task)
            .expect("task spawn failed");

        Ok(())
    }

    fn start_softap(
        modem: Modem,
        sysloop: &EspSystemEventLoop,
        nvs: EspDefaultNvsPartition,
    ) -> Result<EspWifi<'static>, EspError> {
        // AP netif with the bridge's own IP plan; the DHCP server stays on
        // so stations get addresses and subnet broadcasts route.
        let ap_netif = EspNetif::new_with_conf(&NetifConfiguration {
            ip_configuration: Some(ipv4::Configuration::Router(RouterConfiguration {
                subnet: Subnet {
                    gateway: Ipv4Addr::from(config::LOCAL_IP),
                    mask: Mask(config::NETMASK_BITS),
                },
                dhcp_enabled: true,
                dns: None,
                secondary_dns: None,
            })),
            ..NetifConfiguration::wifi_default_router()
        })?;

        let mut wifi = EspWifi::wrap_all(
            WifiDriver::new(modem, sysloop.clone(), Some(nvs))?,
            EspNetif::new(NetifStack::Sta)?,
            ap_netif,
        )?;

        wifi.set_configuration(&Configuration::AccessPoint(AccessPointConfiguration {
            ssid: config::WIFI_SSID.try_into().unwrap(),
            password: config::WIFI_PASSWORD.try_into().unwrap(),
            channel: config::WIFI_CHANNEL,
            auth_method: AuthMethod::WPAWPA2Personal,
            max_connections: config::WIFI_MAX_STATIONS,
            ..Default::default()
        }))?;

        wifi.start()?;
        log::info!(
            "softAP started: SSID {} channel {}, ip {}",
            config::WIFI_SSID,
            config::WIFI_CHANNEL,
            Ipv4Addr::from(config::LOCAL_IP)
        );

        Ok(wifi)
    }

    fn open_socket(port: u16, broadcast: bool) -> std::io::Result<UdpSocket> {
        let socket = UdpSocket::bind(SocketAddrV4::new(Ipv4Addr::from(config::LOCAL_IP), port))?;
        socket.set_nonblocking(true)?;
        if broadcast {
            socket.set_broadcast(true)?;
        }
        Ok(socket)
    }

    fn telemetry_net_task() -> ! {
        let mut channel =
            TelemetryNetChannel::new(&DOWNLINK_FIFO, Endpoint::broadcast(config::TELEMETRY_PORT));

        loop {
            // Fresh socket on every attempt; bind failures are transient
            // network-stack races at boot.
            let socket = match open_socket(config::TELEMETRY_PORT, true) {
                Ok(socket) => socket,
                Err(e) => {
                    log::error!("unable to create socket: {}", e);
                    continue;
                }
            };
            log::info!("socket created and bound, port {}", config::TELEMETRY_PORT);

            let mut socket = BridgeSocket::new(socket);
            loop {
                channel.poll(&mut socket);
                thread::sleep(Duration::from_millis(config::NET_TASK_PERIOD_MS as u64));
            }
        }
    }

    fn config_proxy_task(mut aat: BridgeUart<'static>) -> ! {
        let mut proxy = ConfigProxy::new(&ARBITER);

        loop {
            let socket = match open_socket(config::CONFIG_PORT, false) {
                Ok(socket) => socket,
                Err(e) => {
                    log::error!("unable to create socket: {}", e);
                    continue;
                }
            };
            log::info!("socket created and bound, port {}", config::CONFIG_PORT);

            let mut socket = BridgeSocket::new(socket);
            loop {
                proxy.poll(&mut aat, &mut socket);
                // This task doubles as the mode ticker.
                ARBITER.tick(config::NET_TASK_PERIOD_MS as i32);
                thread::sleep(Duration::from_millis(config::NET_TASK_PERIOD_MS as u64));
            }
        }
    }

    fn telemetry_mux_task(mut source: BridgeUart<'static>, mut aat: BridgeUart<'static>) -> ! {
        let mut mux = TelemetryMux::new(&DOWNLINK_FIFO, &ARBITER, &INDICATIONS);

        loop {
            thread::sleep(Duration::from_millis(config::MUX_TASK_PERIOD_MS as u64));
            mux.poll(&mut source, &mut aat);
        }
    }

    fn indication_task(leds: [LedPin<'static>; LED_COUNT]) -> ! {
        let mut scheduler = LedScheduler::new(&INDICATIONS, leds);

        loop {
            thread::sleep(Duration::from_millis(config::LED_TICK_PERIOD_MS as u64));
            scheduler.tick();
        }
    }
}

#[cfg(target_os = "espidf")]
fn main() -> Result<(), esp_idf_svc::sys::EspError> {
    app::run()
}

#[cfg(not(target_os = "espidf"))]
fn main() {
    // Nothing to run off-chip; the core is exercised by `cargo test`.
}
