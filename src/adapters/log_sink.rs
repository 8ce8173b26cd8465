//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured station events to the
//! ESP-IDF logger (UART / USB-CDC on the device, stderr in simulation).
//! Every applied batch becomes one `TELEM` line carrying all of its
//! fields with units.

use log::{Level, info, log, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;
use crate::app::store::ReadingBatch;
use crate::error::DriverError;

/// Level of a `FAULT` line.  Device faults and an unplugged probe are
/// errors; the rest only mean the driver is not usable yet.
pub fn fault_level(error: &DriverError) -> Level {
    match error {
        DriverError::Device { .. } | DriverError::ProbeDisconnected | DriverError::NonFiniteOutput => {
            Level::Error
        }
        DriverError::Fatal { .. } | DriverError::NotInitialized => Level::Warn,
    }
}

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::BatchApplied {
                batch: ReadingBatch::AirQuality(r),
                sample,
            } => {
                info!(
                    "TELEM | air-quality #{} | T={:.2}\u{00b0}C RH={:.2}% p={:.2}hPa | \
                     IAQ={:.1} (acc {}) sIAQ={:.1} | CO2eq={:.1}ppm bVOC={:.2}ppm | \
                     raw T={:.2}\u{00b0}C RH={:.2}% gas={:.0}\u{03a9}",
                    sample,
                    r.temperature_c,
                    r.humidity_pct,
                    r.pressure_hpa,
                    r.iaq,
                    r.iaq_accuracy,
                    r.static_iaq,
                    r.co2_equivalent_ppm,
                    r.breath_voc_equivalent_ppm,
                    r.raw_temperature_c,
                    r.raw_humidity_pct,
                    r.gas_resistance_ohm,
                );
            }
            AppEvent::BatchApplied {
                batch: ReadingBatch::OutdoorProbe(r),
                sample,
            } => {
                info!("TELEM | outdoor-probe #{} | T={:.2}\u{00b0}C", sample, r.temperature_c);
            }
            AppEvent::DriverReady(family) => {
                info!("START | {} ready", family);
            }
            AppEvent::DriverWarning { family, source, code } => {
                warn!("START | {} {:?} warning, status {}", family, source, code);
            }
            AppEvent::DeviceError {
                family,
                error,
                consecutive,
            } => {
                log!(
                    fault_level(error),
                    "FAULT | {}: {} ({} in a row)",
                    family,
                    error,
                    consecutive
                );
            }
            AppEvent::Recovered { family, failed_polls } => {
                info!("FAULT | {} recovered after {} failed polls", family, failed_polls);
            }
        }
    }
}
