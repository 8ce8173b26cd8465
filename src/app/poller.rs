//! Periodic sensor poller: one per sensor family.
//!
//! ```text
//!            ┌──────┐  step()  ┌─────────┐  Reading    ┌───────────────┐
//!            │ Idle │ ───────▶ │ Polling │ ──────────▶ │ ApplyAndSleep │ ── period ──┐
//!            └──────┘          └─────────┘             └───────────────┘             │
//!                                 ▲   │ NotReady / DeviceError                       │
//!                                 │   ▼                                              │
//!                                 │ ┌──────────────────────┐                         │
//!                                 └─│ RetryAfterShortDelay │ ◀── retry_delay         │
//!                                 │ └──────────────────────┘                         │
//!                                 └──────────────────────────────────────────────────┘
//! ```
//!
//! Sensor I/O happens in [`Poller::step`] before the store lock is taken;
//! the store only sees finished batches.  The period timer starts after a
//! successful write, so not-ready rounds never shorten it.

use std::sync::Arc;
use std::time::Duration;

use embedded_hal::delay::DelayNs;
use log::{info, trace};

use crate::config::FamilyConfig;

use super::events::AppEvent;
use super::ports::{EventSink, PollOutcome, SensorDriver, SensorFamily};
use super::store::{ReadingBatch, ReadingStore};

/// While a device-error streak lasts, re-report it every this many polls.
pub const ERROR_REPORT_INTERVAL: u32 = 50;

/// How long the poller sleeps in each situation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollTiming {
    /// After a batch was applied.
    pub period: Duration,
    /// After a not-ready or errored poll.
    pub retry_delay: Duration,
}

impl From<&FamilyConfig> for PollTiming {
    fn from(c: &FamilyConfig) -> Self {
        Self {
            period: Duration::from_millis(c.period_ms.into()),
            retry_delay: Duration::from_millis(c.retry_delay_ms.into()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerState {
    /// Constructed, not polled yet.
    Idle,
    /// Inside the driver call.
    Polling,
    /// A batch was written; sleeping for the full period.
    ApplyAndSleep,
    /// Nothing written; sleeping for the short retry delay.
    RetryAfterShortDelay,
}

/// Drives one [`SensorDriver`] and publishes its readings to the store.
pub struct Poller<D, S> {
    driver: D,
    store: Arc<ReadingStore>,
    sink: S,
    timing: PollTiming,
    state: PollerState,
    error_streak: u32,
    not_ready_streak: u32,
}

impl<D, S> Poller<D, S>
where
    D: SensorDriver,
    S: EventSink,
{
    /// The driver must already be initialised.
    pub fn new(driver: D, store: Arc<ReadingStore>, sink: S, timing: PollTiming) -> Self {
        Self {
            driver,
            store,
            sink,
            timing,
            state: PollerState::Idle,
            error_streak: 0,
            not_ready_streak: 0,
        }
    }

    pub fn family(&self) -> SensorFamily {
        D::FAMILY
    }

    pub fn state(&self) -> PollerState {
        self.state
    }

    pub fn timing(&self) -> PollTiming {
        self.timing
    }

    /// Consecutive polls that ended in a device error.
    pub fn error_streak(&self) -> u32 {
        self.error_streak
    }

    /// Consecutive polls that ended not-ready.
    pub fn not_ready_streak(&self) -> u32 {
        self.not_ready_streak
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Run one loop body and return how long to sleep before the next.
    pub fn step(&mut self) -> Duration {
        self.state = PollerState::Polling;

        match self.driver.poll() {
            PollOutcome::Reading(reading) => {
                let batch: ReadingBatch = reading.into();
                debug_assert_eq!(batch.family(), D::FAMILY, "driver produced a foreign batch");

                let sample = self.store.apply_batch(batch);

                if self.error_streak > 0 {
                    self.sink.emit(&AppEvent::Recovered {
                        family: D::FAMILY,
                        failed_polls: self.error_streak,
                    });
                }
                self.error_streak = 0;
                self.not_ready_streak = 0;
                self.sink.emit(&AppEvent::BatchApplied { batch, sample });

                self.state = PollerState::ApplyAndSleep;
                self.timing.period
            }

            PollOutcome::NotReady => {
                self.not_ready_streak = self.not_ready_streak.saturating_add(1);
                trace!("{}: not ready ({} in a row)", D::FAMILY, self.not_ready_streak);
                self.state = PollerState::RetryAfterShortDelay;
                self.timing.retry_delay
            }

            PollOutcome::DeviceError(error) => {
                self.error_streak = self.error_streak.saturating_add(1);
                if self.error_streak == 1 || self.error_streak % ERROR_REPORT_INTERVAL == 0 {
                    self.sink.emit(&AppEvent::DeviceError {
                        family: D::FAMILY,
                        error,
                        consecutive: self.error_streak,
                    });
                }
                self.state = PollerState::RetryAfterShortDelay;
                self.timing.retry_delay
            }
        }
    }

    /// Poll forever.  Sleeping goes through `delay`, which suspends only
    /// the calling thread.
    pub fn run(mut self, delay: &mut impl DelayNs) -> ! {
        info!(
            "{} poller running (period {:?}, retry {:?})",
            D::FAMILY,
            self.timing.period,
            self.timing.retry_delay
        );
        loop {
            let wait = self.step();
            delay.delay_ms(duration_to_ms(wait));
        }
    }
}

fn duration_to_ms(d: Duration) -> u32 {
    u32::try_from(d.as_millis()).unwrap_or(u32::MAX)
}
