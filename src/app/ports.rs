//! Port traits: the hexagonal boundary between station logic and hardware.
//!
//! ```text
//!   sensors::* ──▶ SensorDriver ──▶ Poller ──▶ ReadingStore
//!                                     │
//!                                     └──▶ EventSink ──▶ adapters::log_sink
//! ```
//!
//! Driver adapters implement [`SensorDriver`]; the [`Poller`](super::poller::Poller)
//! consumes them via generics, so the polling core never touches a bus
//! directly and runs unchanged against mock drivers on the host.

use core::ffi::CStr;
use core::fmt;

use crate::error::{DriverError, StatusSource};

use super::store::ReadingBatch;

// ───────────────────────────────────────────────────────────────
// Sensor families
// ───────────────────────────────────────────────────────────────

/// A group of fields produced by one physical sensor and owned by one
/// poller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorFamily {
    /// BME680 driven by BSEC (indoor).
    AirQuality,
    /// DS18B20 on 1-Wire (outdoor, dual variant).
    OutdoorProbe,
}

impl SensorFamily {
    /// Short name used for log lines.
    pub const fn name(self) -> &'static str {
        match self {
            Self::AirQuality => "air-quality",
            Self::OutdoorProbe => "outdoor-probe",
        }
    }

    /// Poller task name, NUL-terminated for FreeRTOS.
    pub const fn task_name(self) -> &'static CStr {
        match self {
            Self::AirQuality => c"air-quality",
            Self::OutdoorProbe => c"outdoor-probe",
        }
    }
}

impl fmt::Display for SensorFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ───────────────────────────────────────────────────────────────
// Driver port (driven adapter: hardware → poller)
// ───────────────────────────────────────────────────────────────

/// Result of one non-blocking poll.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PollOutcome<R> {
    /// No new sample yet; try again shortly.
    NotReady,
    /// A complete set of fields for this family.
    Reading(R),
    /// The device reported an error this round.
    DeviceError(DriverError),
}

/// A recoverable status code; logged, startup continues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusWarning {
    pub source: StatusSource,
    pub code: i32,
}

/// Warnings one bring-up can carry: two vendor calls, two sources each.
pub const MAX_WARNINGS: usize = 4;

/// Non-fatal outcome of [`SensorDriver::initialize`]: every warning seen,
/// in the order the driver saw them.  Empty means a clean start.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DriverStatus {
    warnings: heapless::Vec<StatusWarning, MAX_WARNINGS>,
}

impl DriverStatus {
    pub const OK: Self = Self {
        warnings: heapless::Vec::new(),
    };

    pub fn warning(source: StatusSource, code: i32) -> Self {
        let mut status = Self::OK;
        status.push(source, code);
        status
    }

    pub fn push(&mut self, source: StatusSource, code: i32) {
        if self.warnings.push(StatusWarning { source, code }).is_err() {
            log::warn!("driver status: dropped {} warning {}", source, code);
        }
    }

    /// Append `other`'s warnings after this one's.
    pub fn merge(&mut self, other: DriverStatus) {
        for w in other.warnings {
            self.push(w.source, w.code);
        }
    }

    pub fn is_ok(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn warnings(&self) -> &[StatusWarning] {
        &self.warnings
    }
}

/// A physical sensor behind its vendor library.
pub trait SensorDriver {
    /// The batch this driver produces.
    type Reading: Into<ReadingBatch> + Copy;

    /// Which family the readings belong to.
    const FAMILY: SensorFamily;

    /// One-time bring-up.  `Err(DriverError::Fatal { .. })` means the
    /// station cannot run.
    fn initialize(&mut self) -> Result<DriverStatus, DriverError>;

    /// Run the driver once.  Must not block for longer than one bounded
    /// vendor step.
    fn poll(&mut self) -> PollOutcome<Self::Reading>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: pollers → logging)
// ───────────────────────────────────────────────────────────────

/// Pollers and startup emit structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}
