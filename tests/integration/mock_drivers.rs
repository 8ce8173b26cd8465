//! Mock sensor drivers for integration tests.
//!
//! Each mock replays a script of poll outcomes and counts its calls so
//! tests can assert on what the station did without touching a bus.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use weather_station::app::events::AppEvent;
use weather_station::app::ports::{DriverStatus, EventSink, PollOutcome, SensorDriver, SensorFamily};
use weather_station::app::store::{AirQualityReading, ProbeReading};
use weather_station::error::DriverError;

// ── Scripted driver ───────────────────────────────────────────

pub struct MockDriver<R> {
    init: Result<DriverStatus, DriverError>,
    script: VecDeque<PollOutcome<R>>,
    /// Shared so tests can still read it after the driver moved into a
    /// poller thread.
    pub init_calls: Arc<AtomicU32>,
}

#[allow(dead_code)]
impl<R> MockDriver<R> {
    pub fn new(script: Vec<PollOutcome<R>>) -> Self {
        Self {
            init: Ok(DriverStatus::OK),
            script: script.into(),
            init_calls: Arc::new(AtomicU32::new(0)),
        }
    }

    pub fn failing(error: DriverError) -> Self {
        Self {
            init: Err(error),
            ..Self::new(Vec::new())
        }
    }

    pub fn with_status(mut self, status: DriverStatus) -> Self {
        self.init = Ok(status);
        self
    }

    pub fn init_count(&self) -> u32 {
        self.init_calls.load(Ordering::SeqCst)
    }
}

pub type MockAir = MockDriver<AirQualityReading>;
pub type MockProbe = MockDriver<ProbeReading>;

impl SensorDriver for MockAir {
    type Reading = AirQualityReading;
    const FAMILY: SensorFamily = SensorFamily::AirQuality;

    fn initialize(&mut self) -> Result<DriverStatus, DriverError> {
        self.init_calls.fetch_add(1, Ordering::SeqCst);
        self.init.clone()
    }

    fn poll(&mut self) -> PollOutcome<AirQualityReading> {
        self.script.pop_front().unwrap_or(PollOutcome::NotReady)
    }
}

impl SensorDriver for MockProbe {
    type Reading = ProbeReading;
    const FAMILY: SensorFamily = SensorFamily::OutdoorProbe;

    fn initialize(&mut self) -> Result<DriverStatus, DriverError> {
        self.init_calls.fetch_add(1, Ordering::SeqCst);
        self.init.clone()
    }

    fn poll(&mut self) -> PollOutcome<ProbeReading> {
        self.script.pop_front().unwrap_or(PollOutcome::NotReady)
    }
}

// ── Readings ──────────────────────────────────────────────────

#[allow(dead_code)]
pub fn indoor(temperature_c: f32, humidity_pct: f32) -> AirQualityReading {
    AirQualityReading {
        raw_temperature_c: temperature_c + 1.5,
        pressure_hpa: 1012.0,
        raw_humidity_pct: humidity_pct - 3.0,
        gas_resistance_ohm: 140_000.0,
        iaq: 42.0,
        iaq_accuracy: 1,
        static_iaq: 44.0,
        co2_equivalent_ppm: 580.0,
        breath_voc_equivalent_ppm: 0.6,
        temperature_c,
        humidity_pct,
    }
}

// ── Event recorder ────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}
