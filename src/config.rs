//! Station configuration parameters
//!
//! All tunable parameters for the weather station.  Credentials and the
//! hardware variant are baked in at build time (see `build.rs`); everything
//! else has compiled-in defaults per variant.

use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Which sensors are fitted to the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    /// BME680 only.
    Single,
    /// BME680 indoors plus a DS18B20 outdoor probe.
    Dual,
}

impl Variant {
    pub fn has_outdoor_probe(self) -> bool {
        self == Self::Dual
    }
}

impl FromStr for Variant {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "single" => Ok(Self::Single),
            "dual" => Ok(Self::Dual),
            _ => Err(Error::Config("STATION_VARIANT must be 'single' or 'dual'")),
        }
    }
}

/// Timing and task parameters for one sensor family's poller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FamilyConfig {
    /// Sleep after a successful poll (milliseconds).
    pub period_ms: u32,
    /// Sleep after a not-ready or errored poll (milliseconds).
    pub retry_delay_ms: u32,
    /// FreeRTOS priority of the poller thread.
    pub priority: u8,
    /// Poller thread stack size (KiB).
    pub stack_kb: usize,
}

impl FamilyConfig {
    fn validate(&self, name: &'static str) -> Result<()> {
        if self.period_ms == 0 {
            return Err(Error::Config(name));
        }
        if self.retry_delay_ms == 0 || self.retry_delay_ms >= self.period_ms {
            return Err(Error::Config(name));
        }
        if self.stack_kb < 4 {
            return Err(Error::Config(name));
        }
        Ok(())
    }
}

/// Core station configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StationConfig {
    pub variant: Variant,
    /// TCP port of the JSON API.
    pub http_port: u16,
    /// BME680 + BSEC poller.
    pub air_quality: FamilyConfig,
    /// DS18B20 poller; ignored by the single-sensor variant.
    pub outdoor_probe: FamilyConfig,
}

impl StationConfig {
    /// Defaults for a given hardware variant.
    pub fn for_variant(variant: Variant) -> Self {
        let air_quality_period_ms = match variant {
            Variant::Single => 30_000,
            // The probe task runs at its own, faster period.
            Variant::Dual => 15_000,
        };
        Self {
            variant,
            http_port: 80,
            air_quality: FamilyConfig {
                period_ms: air_quality_period_ms,
                retry_delay_ms: 100,
                priority: 1,
                stack_kb: 10,
            },
            outdoor_probe: FamilyConfig {
                period_ms: 5_000,
                retry_delay_ms: 100,
                priority: 2,
                stack_kb: 6,
            },
        }
    }

    /// Build from the variant chosen at compile time (`STATION_VARIANT`).
    pub fn from_build_env() -> Result<Self> {
        let variant = match option_env!("STATION_VARIANT") {
            Some(v) => v.parse()?,
            None => Variant::Single,
        };
        let config = Self::for_variant(variant);
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the pollers cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.http_port == 0 {
            return Err(Error::Config("http_port must be non-zero"));
        }
        self.air_quality
            .validate("air_quality timing: need period > retry delay > 0 and stack >= 4 KiB")?;
        if self.variant.has_outdoor_probe() {
            self.outdoor_probe
                .validate("outdoor_probe timing: need period > retry delay > 0 and stack >= 4 KiB")?;
        }
        Ok(())
    }
}

impl Default for StationConfig {
    fn default() -> Self {
        Self::for_variant(Variant::Single)
    }
}

/// WiFi station credentials.
#[derive(Debug, Clone, Default)]
pub struct NetworkConfig {
    pub ssid: heapless::String<32>,
    pub password: heapless::String<64>,
}

impl NetworkConfig {
    /// Credentials from `WIFI_SSID` / `WIFI_PASS` at build time.
    pub fn from_build_env() -> Result<Self> {
        let ssid = option_env!("WIFI_SSID").unwrap_or("");
        let password = option_env!("WIFI_PASS").unwrap_or("");
        Self::new(ssid, password)
    }

    pub fn new(ssid: &str, password: &str) -> Result<Self> {
        let mut cfg = Self::default();
        cfg.ssid
            .push_str(ssid)
            .map_err(|_| Error::Config("WIFI_SSID longer than 32 bytes"))?;
        cfg.password
            .push_str(password)
            .map_err(|_| Error::Config("WIFI_PASS longer than 64 bytes"))?;
        Ok(cfg)
    }
}
