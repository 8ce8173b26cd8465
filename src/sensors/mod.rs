//! Sensor adapters: each one implements [`SensorDriver`] for one family.
//!
//! [`SensorDriver`]: crate::app::ports::SensorDriver

pub mod air_quality;
pub mod probe;

pub use air_quality::{AirQualitySensor, BsecBackend, BsecOutputs, BsecStatus};
pub use probe::{DEVICE_DISCONNECTED_C, OutdoorProbe, ProbeBus};
