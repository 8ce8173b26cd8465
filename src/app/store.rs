//! Shared reading store: the latest value of every exposed sensor field.
//!
//! ```text
//!   air-quality poller ──apply_batch──▶ ┌──────────────────┐
//!                                       │ Mutex<Snapshot>  │ ──snapshot──▶ HTTP handlers
//!   outdoor-probe poller ─apply_batch─▶ └──────────────────┘
//! ```
//!
//! Each family's fields live in one `Option<..Reading>` that is replaced
//! whole, so a reader can only ever see a complete batch.  The lock is held
//! for a struct copy in or out and never across sensor I/O.

use std::sync::{Mutex, MutexGuard, PoisonError};

use super::ports::SensorFamily;

// ---------------------------------------------------------------------------
// Per-family batches
// ---------------------------------------------------------------------------

/// Everything the BME680 + BSEC stack produces in one step.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AirQualityReading {
    /// Uncompensated die temperature (°C).
    pub raw_temperature_c: f32,
    /// Barometric pressure (hPa).
    pub pressure_hpa: f32,
    /// Uncompensated relative humidity (%).
    pub raw_humidity_pct: f32,
    /// MOX gas sensor resistance (Ω).
    pub gas_resistance_ohm: f32,
    /// Indoor air-quality index (0–500 score).
    pub iaq: f32,
    /// BSEC calibration accuracy of the IAQ output (0–3).
    pub iaq_accuracy: u8,
    /// IAQ without the dynamic baseline (score).
    pub static_iaq: f32,
    /// Estimated CO2 concentration (ppm).
    pub co2_equivalent_ppm: f32,
    /// Estimated breath-VOC concentration (ppm).
    pub breath_voc_equivalent_ppm: f32,
    /// Heat-compensated ambient temperature (°C).
    pub temperature_c: f32,
    /// Heat-compensated relative humidity (%).
    pub humidity_pct: f32,
}

/// One DS18B20 conversion.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ProbeReading {
    pub temperature_c: f32,
}

/// The unit of atomic update: all fields owned by exactly one family.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReadingBatch {
    AirQuality(AirQualityReading),
    OutdoorProbe(ProbeReading),
}

impl ReadingBatch {
    pub fn family(&self) -> SensorFamily {
        match self {
            Self::AirQuality(_) => SensorFamily::AirQuality,
            Self::OutdoorProbe(_) => SensorFamily::OutdoorProbe,
        }
    }
}

impl From<AirQualityReading> for ReadingBatch {
    fn from(r: AirQualityReading) -> Self {
        Self::AirQuality(r)
    }
}

impl From<ProbeReading> for ReadingBatch {
    fn from(r: ProbeReading) -> Self {
        Self::OutdoorProbe(r)
    }
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// An immutable copy of the store at one instant.
///
/// `None` means the family has not produced a reading since boot.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ReadingSnapshot {
    pub air_quality: Option<AirQualityReading>,
    pub outdoor: Option<ProbeReading>,
    /// Batches applied by the air-quality poller since boot.
    pub air_quality_samples: u32,
    /// Batches applied by the outdoor-probe poller since boot.
    pub outdoor_samples: u32,
}

impl ReadingSnapshot {
    pub fn samples(&self, family: SensorFamily) -> u32 {
        match family {
            SensorFamily::AirQuality => self.air_quality_samples,
            SensorFamily::OutdoorProbe => self.outdoor_samples,
        }
    }
}

// ---------------------------------------------------------------------------
// ReadingStore
// ---------------------------------------------------------------------------

/// Process-wide store shared as `Arc<ReadingStore>` between pollers and
/// the HTTP handlers.
#[derive(Debug, Default)]
pub struct ReadingStore {
    fields: Mutex<ReadingSnapshot>,
}

impl ReadingStore {
    /// Empty store: every family reads as "no data".
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite exactly the fields owned by `batch`'s family.
    ///
    /// Returns that family's sample count after the write.
    pub fn apply_batch(&self, batch: ReadingBatch) -> u32 {
        let mut fields = self.lock();
        match batch {
            ReadingBatch::AirQuality(r) => {
                fields.air_quality = Some(r);
                fields.air_quality_samples = fields.air_quality_samples.wrapping_add(1);
                fields.air_quality_samples
            }
            ReadingBatch::OutdoorProbe(r) => {
                fields.outdoor = Some(r);
                fields.outdoor_samples = fields.outdoor_samples.wrapping_add(1);
                fields.outdoor_samples
            }
        }
    }

    /// Copy every field out under the lock.
    pub fn snapshot(&self) -> ReadingSnapshot {
        *self.lock()
    }

    // Each family's reading is replaced by one assignment, so a poisoned
    // lock still holds whole batches.
    fn lock(&self) -> MutexGuard<'_, ReadingSnapshot> {
        self.fields.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
