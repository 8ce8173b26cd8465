//! Outbound application events.
//!
//! Pollers and station startup emit these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other side
//! decide what to do with them; today that is the serial log.

use crate::error::{DriverError, StatusSource};

use super::ports::SensorFamily;
use super::store::ReadingBatch;

/// Structured events emitted by the station core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// A driver came up cleanly.
    DriverReady(SensorFamily),

    /// A driver came up with a recoverable warning status.
    DriverWarning {
        family: SensorFamily,
        source: StatusSource,
        code: i32,
    },

    /// A batch was written to the store.
    BatchApplied {
        batch: ReadingBatch,
        /// Running count of batches for this family, including this one.
        sample: u32,
    },

    /// A poll failed.  Emitted for the first error of a streak and then
    /// periodically while it lasts.
    DeviceError {
        family: SensorFamily,
        error: DriverError,
        consecutive: u32,
    },

    /// A family produced a reading again after a device-error streak.
    Recovered {
        family: SensorFamily,
        failed_polls: u32,
    },
}
