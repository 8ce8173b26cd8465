//! BME680 air-quality sensor driven by Bosch BSEC.
//!
//! BSEC owns the chip: it schedules heater profiles, reads raw values over
//! I²C and runs the IAQ algorithm.  This adapter only sees "run once, maybe
//! get a full output set" plus the two status codes BSEC exposes (library
//! and chip), and maps them onto the [`SensorDriver`] contract.
//!
//! Status codes follow the vendor convention: `0` ok, `> 0` warning,
//! `< 0` error.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: calls the `sensor_shim` C component, which wraps the BSEC
//! static library.  On host/test: a deterministic simulated backend.

use log::{debug, info, warn};

use crate::app::ports::{DriverStatus, PollOutcome, SensorDriver, SensorFamily};
use crate::app::store::AirQualityReading;
use crate::error::{DriverError, StatusSource};

/// Library and chip status after a BSEC call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BsecStatus {
    pub library: i32,
    pub chip: i32,
}

impl BsecStatus {
    pub const OK: Self = Self { library: 0, chip: 0 };

    fn has_warning(self) -> bool {
        self.library > 0 || self.chip > 0
    }
}

/// One full BSEC output set, in the library's native units.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BsecOutputs {
    pub raw_temperature: f32,
    /// Pascals.
    pub pressure: f32,
    pub raw_humidity: f32,
    pub gas_resistance: f32,
    pub iaq: f32,
    pub iaq_accuracy: u8,
    pub static_iaq: f32,
    pub co2_equivalent: f32,
    pub breath_voc_equivalent: f32,
    /// Heat-compensated.
    pub temperature: f32,
    /// Heat-compensated.
    pub humidity: f32,
}

impl BsecOutputs {
    fn is_finite(&self) -> bool {
        [
            self.raw_temperature,
            self.pressure,
            self.raw_humidity,
            self.gas_resistance,
            self.iaq,
            self.static_iaq,
            self.co2_equivalent,
            self.breath_voc_equivalent,
            self.temperature,
            self.humidity,
        ]
        .iter()
        .all(|v| v.is_finite())
    }
}

impl From<BsecOutputs> for AirQualityReading {
    fn from(o: BsecOutputs) -> Self {
        Self {
            raw_temperature_c: o.raw_temperature,
            pressure_hpa: o.pressure / 100.0,
            raw_humidity_pct: o.raw_humidity,
            gas_resistance_ohm: o.gas_resistance,
            iaq: o.iaq,
            iaq_accuracy: o.iaq_accuracy.min(3),
            static_iaq: o.static_iaq,
            co2_equivalent_ppm: o.co2_equivalent,
            breath_voc_equivalent_ppm: o.breath_voc_equivalent,
            temperature_c: o.temperature,
            humidity_pct: o.humidity,
        }
    }
}

/// The vendor library as seen by the adapter.
pub trait BsecBackend {
    /// Attach to the chip.
    fn begin(&mut self) -> BsecStatus;

    /// Subscribe to every output the station reports, low-power rate.
    fn subscribe(&mut self) -> BsecStatus;

    /// One scheduling step.  `None` when no new output set is due yet.
    fn run(&mut self) -> Option<BsecOutputs>;

    /// Status left by the last call.
    fn status(&self) -> BsecStatus;
}

fn by_source(status: BsecStatus) -> [(StatusSource, i32); 2] {
    [
        (StatusSource::Library, status.library),
        (StatusSource::Chip, status.chip),
    ]
}

/// Classify a status pair: errors are fatal, every warning is kept.
///
/// The library status is checked before the chip status.
pub fn check_status(status: BsecStatus) -> Result<DriverStatus, DriverError> {
    let checks = by_source(status);
    if let Some(&(source, code)) = checks.iter().find(|(_, code)| *code < 0) {
        return Err(DriverError::Fatal { source, code });
    }
    let mut result = DriverStatus::OK;
    for &(source, code) in checks.iter().filter(|(_, code)| *code > 0) {
        result.push(source, code);
    }
    Ok(result)
}

fn runtime_error(status: BsecStatus) -> Option<DriverError> {
    if status.library < 0 {
        Some(DriverError::Device {
            source: StatusSource::Library,
            code: status.library,
        })
    } else if status.chip < 0 {
        Some(DriverError::Device {
            source: StatusSource::Chip,
            code: status.chip,
        })
    } else {
        None
    }
}

/// [`SensorDriver`] for the indoor BME680.
pub struct AirQualitySensor<B> {
    backend: B,
    initialised: bool,
    /// Last warning pair logged while polling; repeats stay quiet.
    last_warning: BsecStatus,
    runtime_warnings: u32,
}

impl<B: BsecBackend> AirQualitySensor<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            initialised: false,
            last_warning: BsecStatus::OK,
            runtime_warnings: 0,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Warning codes logged by `poll` so far.
    pub fn runtime_warnings(&self) -> u32 {
        self.runtime_warnings
    }

    fn log_runtime_warnings(&mut self, status: BsecStatus) {
        if !status.has_warning() {
            self.last_warning = BsecStatus::OK;
            return;
        }
        if status == self.last_warning {
            return;
        }
        for (source, code) in by_source(status) {
            if code > 0 {
                warn!("BME680: {} warning, status {}", source, code);
                self.runtime_warnings += 1;
            }
        }
        self.last_warning = status;
    }
}

impl<B: BsecBackend> SensorDriver for AirQualitySensor<B> {
    type Reading = AirQualityReading;
    const FAMILY: SensorFamily = SensorFamily::AirQuality;

    fn initialize(&mut self) -> Result<DriverStatus, DriverError> {
        let mut status = check_status(self.backend.begin())?;
        status.merge(check_status(self.backend.subscribe())?);
        self.initialised = true;
        info!("BME680: BSEC attached and subscribed");
        Ok(status)
    }

    fn poll(&mut self) -> PollOutcome<AirQualityReading> {
        if !self.initialised {
            return PollOutcome::DeviceError(DriverError::NotInitialized);
        }
        let outputs = self.backend.run();
        let status = self.backend.status();
        self.log_runtime_warnings(status);
        if let Some(outputs) = outputs {
            if !outputs.is_finite() {
                debug!("BME680: dropped output set with a non-finite value");
                return PollOutcome::DeviceError(DriverError::NonFiniteOutput);
            }
            return PollOutcome::Reading(outputs.into());
        }
        match runtime_error(status) {
            Some(e) => {
                debug!("BME680: run failed ({})", e);
                PollOutcome::DeviceError(e)
            }
            None => PollOutcome::NotReady,
        }
    }
}

// ───────────────────────────────────────────────────────────────
// ESP-IDF backend (sensor_shim component)
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub use shim::ShimBsec;

#[cfg(target_os = "espidf")]
mod shim {
    use super::{BsecBackend, BsecOutputs, BsecStatus};

    #[repr(C)]
    #[derive(Default)]
    struct RawStatus {
        library: i32,
        chip: i32,
    }

    #[repr(C)]
    #[derive(Default)]
    struct RawOutputs {
        raw_temperature: f32,
        pressure: f32,
        raw_humidity: f32,
        gas_resistance: f32,
        iaq: f32,
        iaq_accuracy: u8,
        static_iaq: f32,
        co2_equivalent: f32,
        breath_voc_equivalent: f32,
        temperature: f32,
        humidity: f32,
    }

    // Declared in components/sensor_shim/include/sensor_shim.h.
    unsafe extern "C" {
        fn ws_bsec_begin(i2c_addr: u8, sda_gpio: i32, scl_gpio: i32, status: *mut RawStatus);
        fn ws_bsec_subscribe_lp(status: *mut RawStatus);
        fn ws_bsec_run(out: *mut RawOutputs, status: *mut RawStatus) -> bool;
    }

    /// BSEC reached through the C shim.  Only one instance may exist.
    pub struct ShimBsec {
        i2c_addr: u8,
        sda_gpio: i32,
        scl_gpio: i32,
        last: BsecStatus,
    }

    impl ShimBsec {
        pub fn new(i2c_addr: u8, sda_gpio: i32, scl_gpio: i32) -> Self {
            Self {
                i2c_addr,
                sda_gpio,
                scl_gpio,
                last: BsecStatus::OK,
            }
        }

        fn record(&mut self, raw: &RawStatus) -> BsecStatus {
            self.last = BsecStatus {
                library: raw.library,
                chip: raw.chip,
            };
            self.last
        }
    }

    impl BsecBackend for ShimBsec {
        fn begin(&mut self) -> BsecStatus {
            let mut raw = RawStatus::default();
            // SAFETY: `raw` outlives the call; the shim only writes it.
            unsafe { ws_bsec_begin(self.i2c_addr, self.sda_gpio, self.scl_gpio, &mut raw) };
            self.record(&raw)
        }

        fn subscribe(&mut self) -> BsecStatus {
            let mut raw = RawStatus::default();
            // SAFETY: as above.
            unsafe { ws_bsec_subscribe_lp(&mut raw) };
            self.record(&raw)
        }

        fn run(&mut self) -> Option<BsecOutputs> {
            let mut out = RawOutputs::default();
            let mut raw = RawStatus::default();
            // SAFETY: both out-pointers are valid for the duration of the call.
            let fresh = unsafe { ws_bsec_run(&mut out, &mut raw) };
            self.record(&raw);
            fresh.then_some(BsecOutputs {
                raw_temperature: out.raw_temperature,
                pressure: out.pressure,
                raw_humidity: out.raw_humidity,
                gas_resistance: out.gas_resistance,
                iaq: out.iaq,
                iaq_accuracy: out.iaq_accuracy,
                static_iaq: out.static_iaq,
                co2_equivalent: out.co2_equivalent,
                breath_voc_equivalent: out.breath_voc_equivalent,
                temperature: out.temperature,
                humidity: out.humidity,
            })
        }

        fn status(&self) -> BsecStatus {
            self.last
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Host simulation backend
// ───────────────────────────────────────────────────────────────

/// Synthetic BSEC: a short warm-up, then a new output set every
/// `every`-th run with slowly drifting values.
#[cfg(not(target_os = "espidf"))]
pub struct SimBsec {
    runs: u32,
    warm_up_runs: u32,
    every: u32,
    samples: u32,
}

#[cfg(not(target_os = "espidf"))]
impl SimBsec {
    pub fn new() -> Self {
        Self {
            runs: 0,
            warm_up_runs: 5,
            every: 3,
            samples: 0,
        }
    }
}

#[cfg(not(target_os = "espidf"))]
impl Default for SimBsec {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(not(target_os = "espidf"))]
impl BsecBackend for SimBsec {
    fn begin(&mut self) -> BsecStatus {
        BsecStatus::OK
    }

    fn subscribe(&mut self) -> BsecStatus {
        BsecStatus::OK
    }

    fn run(&mut self) -> Option<BsecOutputs> {
        self.runs = self.runs.wrapping_add(1);
        if self.runs <= self.warm_up_runs || self.runs % self.every != 0 {
            return None;
        }
        self.samples = self.samples.wrapping_add(1);
        // Triangle wave over 40 samples keeps values plausible forever.
        let phase = (self.samples % 40) as f32;
        let drift = if phase < 20.0 { phase } else { 40.0 - phase } / 20.0;
        Some(BsecOutputs {
            raw_temperature: 23.0 + drift,
            pressure: 101_325.0 - 150.0 * drift,
            raw_humidity: 38.0 + 4.0 * drift,
            gas_resistance: 120_000.0 + 30_000.0 * drift,
            iaq: 25.0 + 50.0 * drift,
            iaq_accuracy: (self.samples / 10).min(3) as u8,
            static_iaq: 30.0 + 40.0 * drift,
            co2_equivalent: 500.0 + 200.0 * drift,
            breath_voc_equivalent: 0.5 + drift,
            temperature: 21.5 + drift,
            humidity: 45.0 + 3.0 * drift,
        })
    }

    fn status(&self) -> BsecStatus {
        BsecStatus::OK
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct FakeBsec {
        begin: BsecStatus,
        subscribe: BsecStatus,
        next: Option<BsecOutputs>,
        after_run: BsecStatus,
    }

    impl BsecBackend for FakeBsec {
        fn begin(&mut self) -> BsecStatus {
            self.begin
        }
        fn subscribe(&mut self) -> BsecStatus {
            self.subscribe
        }
        fn run(&mut self) -> Option<BsecOutputs> {
            self.next.take()
        }
        fn status(&self) -> BsecStatus {
            self.after_run
        }
    }

    #[test]
    fn negative_library_status_is_fatal() {
        assert_eq!(
            check_status(BsecStatus { library: -12, chip: 0 }),
            Err(DriverError::Fatal {
                source: StatusSource::Library,
                code: -12
            })
        );
    }

    #[test]
    fn chip_error_wins_over_library_warning() {
        assert_eq!(
            check_status(BsecStatus { library: 10, chip: -2 }),
            Err(DriverError::Fatal {
                source: StatusSource::Chip,
                code: -2
            })
        );
    }

    #[test]
    fn positive_status_is_a_warning() {
        assert_eq!(
            check_status(BsecStatus { library: 0, chip: 2 }),
            Ok(DriverStatus::warning(StatusSource::Chip, 2))
        );
        assert_eq!(check_status(BsecStatus::OK), Ok(DriverStatus::OK));
    }

    #[test]
    fn library_and_chip_warnings_are_both_kept() {
        let status = check_status(BsecStatus { library: 10, chip: 3 }).unwrap();
        let codes: Vec<_> = status.warnings().iter().map(|w| (w.source, w.code)).collect();
        assert_eq!(codes, vec![(StatusSource::Library, 10), (StatusSource::Chip, 3)]);
    }

    #[test]
    fn initialize_keeps_begin_and_subscribe_warnings() {
        let mut s = AirQualitySensor::new(FakeBsec {
            begin: BsecStatus { library: 10, chip: 3 },
            subscribe: BsecStatus { library: 14, chip: 0 },
            ..Default::default()
        });
        let status = s.initialize().unwrap();
        let codes: Vec<_> = status.warnings().iter().map(|w| w.code).collect();
        assert_eq!(codes, vec![10, 3, 14]);
    }

    #[test]
    fn runtime_warning_is_logged_once_per_change() {
        let mut s = AirQualitySensor::new(FakeBsec {
            after_run: BsecStatus { library: 2, chip: 0 },
            ..Default::default()
        });
        s.initialize().unwrap();
        assert_eq!(s.poll(), PollOutcome::NotReady, "a warning is not an error");
        s.poll();
        assert_eq!(s.runtime_warnings(), 1);

        s.backend.after_run = BsecStatus::OK;
        s.poll();
        s.backend.after_run = BsecStatus { library: 2, chip: 1 };
        s.poll();
        assert_eq!(s.runtime_warnings(), 3);
    }

    #[test]
    fn non_finite_output_is_not_published() {
        let mut s = AirQualitySensor::new(FakeBsec {
            next: Some(BsecOutputs {
                iaq: f32::NAN,
                pressure: 101_325.0,
                ..Default::default()
            }),
            ..Default::default()
        });
        s.initialize().unwrap();
        assert_eq!(s.poll(), PollOutcome::DeviceError(DriverError::NonFiniteOutput));
    }

    #[test]
    fn poll_before_initialize_is_an_error() {
        let mut s = AirQualitySensor::new(FakeBsec::default());
        assert_eq!(s.poll(), PollOutcome::DeviceError(DriverError::NotInitialized));
    }

    #[test]
    fn subscribe_failure_aborts_initialisation() {
        let mut s = AirQualitySensor::new(FakeBsec {
            subscribe: BsecStatus { library: -36, chip: 0 },
            ..Default::default()
        });
        assert!(s.initialize().is_err());
        assert_eq!(s.poll(), PollOutcome::DeviceError(DriverError::NotInitialized));
    }

    #[test]
    fn reading_converts_pressure_to_hpa() {
        let mut s = AirQualitySensor::new(FakeBsec {
            next: Some(BsecOutputs {
                pressure: 101_325.0,
                iaq_accuracy: 7,
                ..Default::default()
            }),
            ..Default::default()
        });
        s.initialize().unwrap();
        let PollOutcome::Reading(r) = s.poll() else {
            panic!("expected a reading");
        };
        assert!((r.pressure_hpa - 1013.25).abs() < 1e-3);
        assert_eq!(r.iaq_accuracy, 3, "accuracy clamps to 0-3");
    }

    #[test]
    fn no_output_without_error_is_not_ready() {
        let mut s = AirQualitySensor::new(FakeBsec::default());
        s.initialize().unwrap();
        assert_eq!(s.poll(), PollOutcome::NotReady);
    }

    #[test]
    fn runtime_chip_error_is_a_device_error() {
        let mut s = AirQualitySensor::new(FakeBsec {
            after_run: BsecStatus { library: 0, chip: -2 },
            ..Default::default()
        });
        s.initialize().unwrap();
        assert_eq!(
            s.poll(),
            PollOutcome::DeviceError(DriverError::Device {
                source: StatusSource::Chip,
                code: -2
            })
        );
    }

    #[test]
    fn simulator_warms_up_then_produces() {
        let mut s = AirQualitySensor::new(SimBsec::new());
        s.initialize().unwrap();
        let outcomes: Vec<_> = (0..12).map(|_| s.poll()).collect();
        assert!(outcomes[..5].iter().all(|o| *o == PollOutcome::NotReady));
        assert!(outcomes.iter().any(|o| matches!(o, PollOutcome::Reading(_))));
    }
}
