//! WiFi station-mode adapter.
//!
//! The station is useless off-network, so start-up blocks in
//! [`WifiAdapter::connect_blocking`] until the first association succeeds.
//! After that the main loop calls [`ConnectivityPort::poll`] with the
//! current time; a lost link is retried on an exponential backoff
//! (2 s, 4 s, 8 s … capped at 60 s) that resets after every success.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: drives `BlockingWifi<EspWifi>` handed in
//!   through [`WifiAdapter::attach`].
//! - **all other targets**: a simulated radio that fails every tenth
//!   association, so the backoff path runs in host tests.

use core::fmt;
use core::net::Ipv4Addr;
use std::time::{Duration, Instant};

use embedded_hal::delay::DelayNs;
use log::{info, warn};

use crate::config::NetworkConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityError {
    InvalidSsid,
    InvalidPassword,
    ConnectionFailed,
    /// No radio driver has been attached (target builds only).
    NoDriver,
}

impl fmt::Display for ConnectivityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSsid => write!(f, "SSID invalid (must be 1-32 printable ASCII bytes)"),
            Self::InvalidPassword => write!(f, "password invalid (must be 8-64 bytes, or empty for open)"),
            Self::ConnectionFailed => write!(f, "association failed"),
            Self::NoDriver => write!(f, "WiFi driver not attached"),
        }
    }
}

/// Network link as seen by the main loop.
pub trait ConnectivityPort {
    fn is_connected(&self) -> bool;

    /// Supervise the link: notice drops, retry when the backoff expires.
    fn poll(&mut self, now: Instant);

    fn ip_address(&self) -> Option<Ipv4Addr>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WifiState {
    Disconnected,
    Connected,
    /// Waiting for the backoff to expire before retry number `attempt`.
    Backoff { attempt: u32 },
}

pub const INITIAL_BACKOFF: Duration = Duration::from_secs(2);
pub const MAX_BACKOFF: Duration = Duration::from_secs(60);

fn check_credentials(network: &NetworkConfig) -> Result<(), ConnectivityError> {
    let ssid = network.ssid.as_str();
    if ssid.is_empty() || !ssid.bytes().all(|b| (0x20..=0x7E).contains(&b)) {
        return Err(ConnectivityError::InvalidSsid);
    }
    if !network.password.is_empty() && network.password.len() < 8 {
        return Err(ConnectivityError::InvalidPassword);
    }
    Ok(())
}

#[cfg(target_os = "espidf")]
type Radio = esp_idf_svc::wifi::BlockingWifi<esp_idf_svc::wifi::EspWifi<'static>>;

pub struct WifiAdapter {
    network: NetworkConfig,
    state: WifiState,
    backoff: Duration,
    retry_at: Option<Instant>,
    ip: Option<Ipv4Addr>,
    #[cfg(target_os = "espidf")]
    radio: Option<Radio>,
    /// Simulation: association attempts so far.
    #[cfg(not(target_os = "espidf"))]
    sim_attempts: u32,
    #[cfg(not(target_os = "espidf"))]
    sim_link_up: bool,
}

impl WifiAdapter {
    /// Adapter for `network`, rejecting credentials the radio would refuse.
    pub fn new(network: &NetworkConfig) -> Result<Self, ConnectivityError> {
        check_credentials(network)?;
        Ok(Self {
            network: network.clone(),
            state: WifiState::Disconnected,
            backoff: INITIAL_BACKOFF,
            retry_at: None,
            ip: None,
            #[cfg(target_os = "espidf")]
            radio: None,
            #[cfg(not(target_os = "espidf"))]
            sim_attempts: 0,
            #[cfg(not(target_os = "espidf"))]
            sim_link_up: false,
        })
    }

    /// Hand over the radio driver built from the modem peripheral.
    #[cfg(target_os = "espidf")]
    pub fn attach(&mut self, radio: Radio) {
        self.radio = Some(radio);
    }

    pub fn state(&self) -> WifiState {
        self.state
    }

    /// Wait before the next retry.
    pub fn backoff(&self) -> Duration {
        self.backoff
    }

    /// Associate, retrying on the backoff until it works.
    ///
    /// Returns early only for errors no retry can fix.
    pub fn connect_blocking(&mut self, delay: &mut impl DelayNs) -> Result<(), ConnectivityError> {
        info!("WiFi: connecting to '{}'", self.network.ssid);
        loop {
            match self.attempt() {
                Ok(()) => return Ok(()),
                Err(ConnectivityError::ConnectionFailed) => {
                    delay.delay_ms(u32::try_from(self.backoff.as_millis()).unwrap_or(u32::MAX));
                    self.grow_backoff();
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn attempt(&mut self) -> Result<(), ConnectivityError> {
        match self.associate() {
            Ok(ip) => {
                self.ip = ip;
                self.state = WifiState::Connected;
                self.backoff = INITIAL_BACKOFF;
                self.retry_at = None;
                info!("WiFi: associated (IP={:?})", self.ip);
                Ok(())
            }
            Err(e) => {
                warn!("WiFi: {}", e);
                self.ip = None;
                let attempt = match self.state {
                    WifiState::Backoff { attempt } => attempt + 1,
                    _ => 1,
                };
                self.state = WifiState::Backoff { attempt };
                Err(e)
            }
        }
    }

    fn grow_backoff(&mut self) {
        self.backoff = (self.backoff * 2).min(MAX_BACKOFF);
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn associate(&mut self) -> Result<Option<Ipv4Addr>, ConnectivityError> {
        use esp_idf_svc::wifi::{AuthMethod, ClientConfiguration, Configuration};

        let auth_method = if self.network.password.is_empty() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        };
        let config = Configuration::Client(ClientConfiguration {
            ssid: self.network.ssid.clone(),
            password: self.network.password.clone(),
            auth_method,
            ..Default::default()
        });
        let radio = self.radio.as_mut().ok_or(ConnectivityError::NoDriver)?;

        let fail = |stage: &str, e: esp_idf_svc::sys::EspError| {
            warn!("WiFi(espidf): {} failed ({})", stage, e);
            ConnectivityError::ConnectionFailed
        };
        radio.set_configuration(&config).map_err(|e| fail("set_configuration", e))?;
        if !radio.is_started().unwrap_or(false) {
            radio.start().map_err(|e| fail("start", e))?;
        }
        radio.connect().map_err(|e| fail("connect", e))?;
        radio.wait_netif_up().map_err(|e| fail("netif up", e))?;

        Ok(radio.wifi().sta_netif().get_ip_info().ok().map(|info| info.ip))
    }

    #[cfg(not(target_os = "espidf"))]
    fn associate(&mut self) -> Result<Option<Ipv4Addr>, ConnectivityError> {
        self.sim_attempts = self.sim_attempts.wrapping_add(1);
        if self.sim_attempts % 10 == 3 {
            self.sim_link_up = false;
            return Err(ConnectivityError::ConnectionFailed);
        }
        self.sim_link_up = true;
        Ok(Some(Ipv4Addr::new(192, 168, 4, 20)))
    }

    #[cfg(target_os = "espidf")]
    fn link_up(&self) -> bool {
        self.radio
            .as_ref()
            .is_some_and(|r| r.is_connected().unwrap_or(false))
    }

    #[cfg(not(target_os = "espidf"))]
    fn link_up(&self) -> bool {
        self.sim_link_up
    }

    /// Simulation: drop the link as if the AP went away.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_drop_link(&mut self) {
        self.sim_link_up = false;
    }
}

impl ConnectivityPort for WifiAdapter {
    fn is_connected(&self) -> bool {
        self.state == WifiState::Connected && self.link_up()
    }

    fn poll(&mut self, now: Instant) {
        match self.state {
            WifiState::Connected if !self.link_up() => {
                warn!("WiFi: link lost, retrying in {:?}", self.backoff);
                self.ip = None;
                self.state = WifiState::Backoff { attempt: 1 };
                self.retry_at = Some(now + self.backoff);
            }
            WifiState::Backoff { attempt } if self.retry_at.is_none_or(|t| now >= t) => {
                info!("WiFi: reconnect attempt {}", attempt);
                if self.attempt().is_err() {
                    self.grow_backoff();
                    self.retry_at = Some(now + self.backoff);
                }
            }
            _ => {}
        }
    }

    fn ip_address(&self) -> Option<Ipv4Addr> {
        self.ip
    }
}
