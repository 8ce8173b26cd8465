//! DS18B20 outdoor temperature probe on a 1-Wire bus.
//!
//! Conversions run asynchronously: the first poll starts one, later polls
//! answer not-ready until the chip reports it finished, then read the
//! scratchpad.  The poller's short retry delay paces the wait, so no
//! thread ever blocks for the ~750 ms a 12-bit conversion takes.
//!
//! The vendor library reports a missing or unplugged probe as exactly
//! −127 °C; that value is never published.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: calls the `sensor_shim` C component (1-Wire + DS18B20).
//! On host/test: reads from a static `AtomicU32` (f32 bits) for injection.

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicU32, Ordering};

use log::info;

use crate::app::ports::{DriverStatus, PollOutcome, SensorDriver, SensorFamily};
use crate::app::store::ProbeReading;
use crate::error::{DriverError, StatusSource};

/// What the library returns when the probe does not answer.
pub const DEVICE_DISCONNECTED_C: f32 = -127.0;

/// The 1-Wire bus with one DS18B20 on it.
pub trait ProbeBus {
    /// Set up the bus.  `Err(code)` with a negative bus status on failure.
    fn begin(&mut self) -> Result<(), i32>;

    /// Start a conversion on every device on the bus.
    fn request_conversion(&mut self);

    fn conversion_done(&mut self) -> bool;

    /// Temperature of the first device, °C.
    fn read_celsius(&mut self) -> f32;
}

/// [`SensorDriver`] for the outdoor probe.
pub struct OutdoorProbe<B> {
    bus: B,
    initialised: bool,
    converting: bool,
}

impl<B: ProbeBus> OutdoorProbe<B> {
    pub fn new(bus: B) -> Self {
        Self {
            bus,
            initialised: false,
            converting: false,
        }
    }
}

impl<B: ProbeBus> SensorDriver for OutdoorProbe<B> {
    type Reading = ProbeReading;
    const FAMILY: SensorFamily = SensorFamily::OutdoorProbe;

    fn initialize(&mut self) -> Result<DriverStatus, DriverError> {
        self.bus.begin().map_err(|code| DriverError::Fatal {
            source: StatusSource::Bus,
            code,
        })?;
        self.initialised = true;
        info!("DS18B20: 1-Wire bus up");
        Ok(DriverStatus::OK)
    }

    fn poll(&mut self) -> PollOutcome<ProbeReading> {
        if !self.initialised {
            return PollOutcome::DeviceError(DriverError::NotInitialized);
        }
        if !self.converting {
            self.bus.request_conversion();
            self.converting = true;
            return PollOutcome::NotReady;
        }
        if !self.bus.conversion_done() {
            return PollOutcome::NotReady;
        }
        self.converting = false;

        let celsius = self.bus.read_celsius();
        if celsius == DEVICE_DISCONNECTED_C || !celsius.is_finite() {
            return PollOutcome::DeviceError(DriverError::ProbeDisconnected);
        }
        PollOutcome::Reading(ProbeReading {
            temperature_c: celsius,
        })
    }
}

// ───────────────────────────────────────────────────────────────
// ESP-IDF bus (sensor_shim component)
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub use shim::ShimOneWire;

#[cfg(target_os = "espidf")]
mod shim {
    use super::ProbeBus;

    // Declared in components/sensor_shim/include/sensor_shim.h.
    unsafe extern "C" {
        fn ws_probe_begin(gpio: i32) -> i32;
        fn ws_probe_request_conversion();
        fn ws_probe_conversion_done() -> bool;
        fn ws_probe_read_celsius() -> f32;
    }

    pub struct ShimOneWire {
        gpio: i32,
    }

    impl ShimOneWire {
        pub fn new(gpio: i32) -> Self {
            Self { gpio }
        }
    }

    impl ProbeBus for ShimOneWire {
        fn begin(&mut self) -> Result<(), i32> {
            // SAFETY: plain value arguments; the shim owns the bus state.
            match unsafe { ws_probe_begin(self.gpio) } {
                code if code < 0 => Err(code),
                _ => Ok(()),
            }
        }

        fn request_conversion(&mut self) {
            // SAFETY: no arguments.
            unsafe { ws_probe_request_conversion() }
        }

        fn conversion_done(&mut self) -> bool {
            // SAFETY: no arguments.
            unsafe { ws_probe_conversion_done() }
        }

        fn read_celsius(&mut self) -> f32 {
            // SAFETY: no arguments.
            unsafe { ws_probe_read_celsius() }
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Host simulation bus
// ───────────────────────────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
static SIM_PROBE_BITS: AtomicU32 = AtomicU32::new(0x4120_0000); // 10.0

/// Set the temperature the simulated probe reports next.
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_probe_celsius(celsius: f32) {
    SIM_PROBE_BITS.store(celsius.to_bits(), Ordering::Relaxed);
}

/// Make the simulated probe read as unplugged.
#[cfg(not(target_os = "espidf"))]
pub fn sim_disconnect_probe() {
    sim_set_probe_celsius(DEVICE_DISCONNECTED_C);
}

/// Simulated bus: conversions finish on the second check.
#[cfg(not(target_os = "espidf"))]
#[derive(Default)]
pub struct SimOneWire {
    checks: u8,
}

#[cfg(not(target_os = "espidf"))]
impl SimOneWire {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(not(target_os = "espidf"))]
impl ProbeBus for SimOneWire {
    fn begin(&mut self) -> Result<(), i32> {
        Ok(())
    }

    fn request_conversion(&mut self) {
        self.checks = 0;
    }

    fn conversion_done(&mut self) -> bool {
        self.checks = self.checks.saturating_add(1);
        self.checks >= 2
    }

    fn read_celsius(&mut self) -> f32 {
        f32::from_bits(SIM_PROBE_BITS.load(Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    struct FakeBus {
        begin: Result<(), i32>,
        requests: u32,
        done: VecDeque<bool>,
        value: f32,
    }

    impl FakeBus {
        fn reading(value: f32) -> Self {
            Self {
                begin: Ok(()),
                requests: 0,
                done: VecDeque::new(),
                value,
            }
        }
    }

    impl ProbeBus for FakeBus {
        fn begin(&mut self) -> Result<(), i32> {
            self.begin
        }
        fn request_conversion(&mut self) {
            self.requests += 1;
        }
        fn conversion_done(&mut self) -> bool {
            self.done.pop_front().unwrap_or(true)
        }
        fn read_celsius(&mut self) -> f32 {
            self.value
        }
    }

    fn ready(bus: FakeBus) -> OutdoorProbe<FakeBus> {
        let mut p = OutdoorProbe::new(bus);
        p.initialize().unwrap();
        p
    }

    #[test]
    fn bus_failure_is_fatal() {
        let mut p = OutdoorProbe::new(FakeBus {
            begin: Err(-3),
            ..FakeBus::reading(0.0)
        });
        assert_eq!(
            p.initialize(),
            Err(DriverError::Fatal {
                source: StatusSource::Bus,
                code: -3
            })
        );
    }

    #[test]
    fn first_poll_starts_a_conversion() {
        let mut p = ready(FakeBus::reading(12.25));
        assert_eq!(p.poll(), PollOutcome::NotReady);
        assert_eq!(p.bus.requests, 1);
        assert_eq!(
            p.poll(),
            PollOutcome::Reading(ProbeReading { temperature_c: 12.25 })
        );
    }

    #[test]
    fn pending_conversion_is_not_ready() {
        let mut bus = FakeBus::reading(3.0);
        bus.done = VecDeque::from([false, false]);
        let mut p = ready(bus);
        assert_eq!(p.poll(), PollOutcome::NotReady);
        assert_eq!(p.poll(), PollOutcome::NotReady);
        assert_eq!(p.poll(), PollOutcome::NotReady);
        assert!(matches!(p.poll(), PollOutcome::Reading(_)));
        assert_eq!(p.bus.requests, 1, "no second request while one is pending");
    }

    #[test]
    fn disconnected_sentinel_is_an_error() {
        let mut p = ready(FakeBus::reading(DEVICE_DISCONNECTED_C));
        p.poll();
        assert_eq!(
            p.poll(),
            PollOutcome::DeviceError(DriverError::ProbeDisconnected)
        );
        // The next poll starts over with a fresh conversion.
        assert_eq!(p.poll(), PollOutcome::NotReady);
        assert_eq!(p.bus.requests, 2);
    }

    #[test]
    fn below_zero_is_a_reading() {
        let mut p = ready(FakeBus::reading(-18.5));
        p.poll();
        assert_eq!(
            p.poll(),
            PollOutcome::Reading(ProbeReading { temperature_c: -18.5 })
        );
    }

    #[test]
    fn simulated_probe_follows_injected_values() {
        let mut p = OutdoorProbe::new(SimOneWire::new());
        p.initialize().unwrap();
        fn next_result(p: &mut OutdoorProbe<SimOneWire>) -> PollOutcome<ProbeReading> {
            loop {
                match p.poll() {
                    PollOutcome::NotReady => continue,
                    outcome => return outcome,
                }
            }
        }

        sim_set_probe_celsius(4.5);
        assert_eq!(
            next_result(&mut p),
            PollOutcome::Reading(ProbeReading { temperature_c: 4.5 })
        );

        sim_disconnect_probe();
        assert_eq!(
            next_result(&mut p),
            PollOutcome::DeviceError(DriverError::ProbeDisconnected)
        );

        sim_set_probe_celsius(10.0);
        assert!(matches!(next_result(&mut p), PollOutcome::Reading(_)));
    }

    #[test]
    fn uninitialised_probe_reports_error() {
        let mut p = OutdoorProbe::new(FakeBus::reading(1.0));
        assert_eq!(p.poll(), PollOutcome::DeviceError(DriverError::NotInitialized));
    }
}
