//! Weather station firmware: main entry point.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    Adapters (outer ring)                     │
//! │                                                              │
//! │  AirQualitySensor  OutdoorProbe   HttpServer   WifiAdapter   │
//! │  (BSEC / BME680)   (DS18B20)      (/simple,    (STA mode)    │
//! │                                    /all)                     │
//! │  ──────────────── Port Trait Boundary ───────────────────    │
//! │                                                              │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │  Poller per family ──▶ ReadingStore ──▶ views (JSON)   │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Boot order: logger, config, WiFi (blocks until associated), drivers,
//! pollers, HTTP server.  A fatal driver status stops the boot before any
//! poller or the server exists and hands the LED to the halt pattern; any
//! other start-up error is returned from `main`.
#![deny(unused_must_use)]

use std::time::{Duration, Instant};

use anyhow::Result;
use log::{info, warn};

use weather_station::adapters::wifi::{ConnectivityPort, WifiAdapter, WifiState};
use weather_station::config::{NetworkConfig, StationConfig};
use weather_station::drivers::delay::ThreadDelay;
use weather_station::drivers::status_led::{LedPattern, StatusLed};
use weather_station::error::Error;
use weather_station::pins;
use weather_station::sensors::{AirQualitySensor, OutdoorProbe};
use weather_station::station::Station;

/// Main loop tick: LED animation and WiFi supervision.
const TICK: Duration = Duration::from_millis(50);

fn main() -> Result<()> {
    // ── 1. Platform bootstrap ─────────────────────────────────
    init_platform()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Weather station v{}              ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let mut led = StatusLed::new(pins::STATUS_LED_GPIO);
    led.on();

    // ── 2. Configuration ──────────────────────────────────────
    let config = StationConfig::from_build_env()?;
    info!(
        "Config: {:?} variant, air-quality every {} ms, probe every {} ms, port {}",
        config.variant,
        config.air_quality.period_ms,
        config.outdoor_probe.period_ms,
        config.http_port
    );

    // ── 3. Network ────────────────────────────────────────────
    let mut wifi = WifiAdapter::new(&network_config()?).map_err(Error::from)?;
    attach_radio(&mut wifi)?;
    led.set_pattern(LedPattern::Connecting);
    led.tick(0);
    wifi.connect_blocking(&mut ThreadDelay).map_err(Error::from)?;
    match wifi.ip_address() {
        Some(ip) => info!("WiFi: connected, http://{}:{}/simple", ip, config.http_port),
        None => info!("WiFi: connected"),
    }

    // ── 4. Drivers + pollers ──────────────────────────────────
    let air = AirQualitySensor::new(air_quality_backend());
    let probe = config
        .variant
        .has_outdoor_probe()
        .then(|| OutdoorProbe::new(probe_bus()));

    let station = match Station::bring_up(config, air, probe) {
        Ok(station) => station,
        Err(e) if e.is_fatal_driver() => led.halt(&e),
        Err(e) => return Err(e.into()),
    };

    // ── 5. HTTP API ───────────────────────────────────────────
    let _server = start_http(&station)?;

    // ── 6. Supervision loop ───────────────────────────────────
    led.set_pattern(LedPattern::Heartbeat);
    supervise(&mut wifi, &mut led, &station)
}

fn supervise(wifi: &mut WifiAdapter, led: &mut StatusLed, station: &Station) -> ! {
    let tick_ms = TICK.as_millis() as u32;
    let mut was_connected = true;
    let mut elapsed_ms: u32 = 0;

    loop {
        wifi.poll(Instant::now());
        let connected = wifi.is_connected();
        if connected != was_connected {
            if connected {
                info!("WiFi: link restored");
            } else {
                warn!("WiFi: link lost ({:?})", wifi.state());
            }
            was_connected = connected;
        }
        led.set_pattern(match wifi.state() {
            WifiState::Connected => LedPattern::Heartbeat,
            _ => LedPattern::Connecting,
        });
        led.tick(tick_ms);

        elapsed_ms = elapsed_ms.wrapping_add(tick_ms);
        if elapsed_ms >= REPORT_MS {
            elapsed_ms = 0;
            report(station);
        }

        std::thread::sleep(TICK);
    }
}

// ───────────────────────────────────────────────────────────────
// ESP-IDF wiring
// ───────────────────────────────────────────────────────────────

/// How often the device logs a one-line store summary.
#[cfg(target_os = "espidf")]
const REPORT_MS: u32 = 60_000;

#[cfg(target_os = "espidf")]
fn init_platform() -> Result<()> {
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;
    Ok(())
}

#[cfg(target_os = "espidf")]
fn network_config() -> Result<NetworkConfig> {
    Ok(NetworkConfig::from_build_env()?)
}

#[cfg(target_os = "espidf")]
fn attach_radio(wifi: &mut WifiAdapter) -> Result<()> {
    use esp_idf_hal::peripherals::Peripherals;
    use esp_idf_svc::eventloop::EspSystemEventLoop;
    use esp_idf_svc::nvs::EspDefaultNvsPartition;
    use esp_idf_svc::wifi::{BlockingWifi, EspWifi};

    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;
    let radio = EspWifi::new(peripherals.modem, sysloop.clone(), Some(nvs))?;
    wifi.attach(BlockingWifi::wrap(radio, sysloop)?);
    Ok(())
}

#[cfg(target_os = "espidf")]
fn air_quality_backend() -> weather_station::sensors::air_quality::ShimBsec {
    weather_station::sensors::air_quality::ShimBsec::new(
        pins::BME680_I2C_ADDR,
        pins::I2C_SDA_GPIO,
        pins::I2C_SCL_GPIO,
    )
}

#[cfg(target_os = "espidf")]
fn probe_bus() -> weather_station::sensors::probe::ShimOneWire {
    weather_station::sensors::probe::ShimOneWire::new(pins::PROBE_ONEWIRE_GPIO)
}

#[cfg(target_os = "espidf")]
fn start_http(station: &Station) -> Result<weather_station::adapters::http::HttpServer> {
    Ok(station.serve(weather_station::adapters::http::HttpServer::start)?)
}

#[cfg(target_os = "espidf")]
fn report(station: &Station) {
    let snap = station.store().snapshot();
    info!(
        "STATUS | air-quality samples={} outdoor samples={}",
        snap.air_quality_samples, snap.outdoor_samples
    );
}

// ───────────────────────────────────────────────────────────────
// Host simulation wiring
// ───────────────────────────────────────────────────────────────

/// How often the simulation logs the `/simple` view.
#[cfg(not(target_os = "espidf"))]
const REPORT_MS: u32 = 10_000;

#[cfg(not(target_os = "espidf"))]
fn init_platform() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
fn network_config() -> Result<NetworkConfig> {
    let network = NetworkConfig::from_build_env()?;
    if network.ssid.is_empty() {
        return Ok(NetworkConfig::new("weather-sim", "")?);
    }
    Ok(network)
}

#[cfg(not(target_os = "espidf"))]
fn attach_radio(_wifi: &mut WifiAdapter) -> Result<()> {
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
fn air_quality_backend() -> weather_station::sensors::air_quality::SimBsec {
    weather_station::sensors::air_quality::SimBsec::new()
}

#[cfg(not(target_os = "espidf"))]
fn probe_bus() -> weather_station::sensors::probe::SimOneWire {
    weather_station::sensors::probe::SimOneWire::new()
}

#[cfg(not(target_os = "espidf"))]
fn start_http(station: &Station) -> Result<()> {
    station.serve(|_api, port| {
        info!("HTTP: simulation, no socket on port {}; views are logged instead", port);
        Ok(())
    })?;
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
fn report(station: &Station) {
    use weather_station::adapters::http::{Method, SIMPLE_ROUTE};

    let resp = station.api().handle(Method::Get, SIMPLE_ROUTE);
    info!(
        "GET {} -> {} {}",
        SIMPLE_ROUTE,
        resp.status,
        String::from_utf8_lossy(&resp.body)
    );
}
