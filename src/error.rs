//! Unified error types for the weather station firmware.
//!
//! A single `Error` enum that every subsystem converts into, so startup can
//! surface any failure through one path.  Sensor-side variants are `Copy`
//! and travel through the poller and event sink without allocation.

use core::fmt;

use crate::adapters::wifi::ConnectivityError;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible startup or request-path operation funnels into this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A sensor driver failed to initialise or reported a device error.
    Driver(DriverError),
    /// The network could not be brought up.
    Comms(ConnectivityError),
    /// Configuration is invalid.
    Config(&'static str),
    /// A runtime service (thread, HTTP server) could not be started.
    Init(&'static str),
    /// A response body could not be serialised.
    Encode,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Driver(e) => write!(f, "driver: {e}"),
            Self::Comms(e) => write!(f, "comms: {e}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
            Self::Encode => write!(f, "JSON encoding failed"),
        }
    }
}

impl std::error::Error for Error {}

impl Error {
    /// True for the startup-only condition that must halt the station.
    pub fn is_fatal_driver(&self) -> bool {
        matches!(self, Self::Driver(DriverError::Fatal { .. }))
    }
}

// ---------------------------------------------------------------------------
// Driver errors
// ---------------------------------------------------------------------------

/// Which layer of a sensor stack produced a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusSource {
    /// The vendor signal-processing library (BSEC).
    Library,
    /// The sensor chip itself (BME680 register interface).
    Chip,
    /// The bus the sensor hangs off (I²C, 1-Wire).
    Bus,
}

impl fmt::Display for StatusSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Library => write!(f, "library"),
            Self::Chip => write!(f, "chip"),
            Self::Bus => write!(f, "bus"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverError {
    /// Non-recoverable status at initialisation; requires a power cycle.
    Fatal { source: StatusSource, code: i32 },
    /// The device reported an error status while polling.
    Device { source: StatusSource, code: i32 },
    /// The temperature probe returned its "disconnected" sentinel.
    ProbeDisconnected,
    /// `poll()` was called before a successful `initialize()`.
    NotInitialized,
    /// The vendor library produced a NaN or infinite output value.
    NonFiniteOutput,
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fatal { source, code } => write!(f, "fatal {source} status {code}"),
            Self::Device { source, code } => write!(f, "{source} error status {code}"),
            Self::ProbeDisconnected => write!(f, "probe disconnected"),
            Self::NotInitialized => write!(f, "driver not initialised"),
            Self::NonFiniteOutput => write!(f, "non-finite output value"),
        }
    }
}

impl From<DriverError> for Error {
    fn from(e: DriverError) -> Self {
        Self::Driver(e)
    }
}

impl From<ConnectivityError> for Error {
    fn from(e: ConnectivityError) -> Self {
        Self::Comms(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
