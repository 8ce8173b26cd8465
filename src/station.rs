//! Station bring-up: the composition root between drivers, store and API.
//!
//! Ordering matters.  Every driver is initialised before any poller thread
//! exists, and the HTTP server is only started once [`Station::bring_up`]
//! has succeeded, so a fatal driver error leaves nothing running.

use std::sync::Arc;
use std::thread::JoinHandle;

use log::{info, warn};

use crate::adapters::http::HttpApi;
use crate::adapters::log_sink::LogEventSink;
use crate::app::events::AppEvent;
use crate::app::poller::{PollTiming, Poller};
use crate::app::ports::{DriverStatus, EventSink, SensorDriver};
use crate::app::store::ReadingStore;
use crate::config::{FamilyConfig, StationConfig, Variant};
use crate::drivers::delay::ThreadDelay;
use crate::drivers::task_pin;
use crate::error::{Error, Result};

/// A running station: drivers up, one poller thread per family.
pub struct Station {
    config: StationConfig,
    store: Arc<ReadingStore>,
    pollers: Vec<JoinHandle<()>>,
}

impl Station {
    /// Initialise every driver, then start the pollers.
    ///
    /// `probe` is only used by the dual variant; the dual variant without
    /// one is a configuration error.
    pub fn bring_up<A, P>(config: StationConfig, mut air: A, probe: Option<P>) -> Result<Self>
    where
        A: SensorDriver + Send + 'static,
        P: SensorDriver + Send + 'static,
    {
        config.validate()?;
        let mut sink = LogEventSink::new();

        initialize_driver(&mut air, &mut sink)?;
        let probe = match (config.variant.has_outdoor_probe(), probe) {
            (true, Some(mut probe)) => {
                initialize_driver(&mut probe, &mut sink)?;
                Some(probe)
            }
            (true, None) => return Err(Error::Init("dual variant without outdoor probe")),
            (false, Some(_)) => {
                warn!("single variant: outdoor probe ignored");
                None
            }
            (false, None) => None,
        };

        let store = Arc::new(ReadingStore::new());
        let mut pollers = vec![spawn_poller(air, &store, &config.air_quality)?];
        if let Some(probe) = probe {
            pollers.push(spawn_poller(probe, &store, &config.outdoor_probe)?);
        }

        info!(
            "station up: {:?} variant, {} poller(s)",
            config.variant,
            pollers.len()
        );
        Ok(Self {
            config,
            store,
            pollers,
        })
    }

    /// Start the HTTP server through `start` on the configured port.
    pub fn serve<S>(&self, start: impl FnOnce(HttpApi, u16) -> Result<S>) -> Result<S> {
        start(self.api(), self.config.http_port)
    }

    /// Read-only API over this station's store.
    pub fn api(&self) -> HttpApi {
        HttpApi::new(self.store.clone(), self.config.variant)
    }

    pub fn store(&self) -> &Arc<ReadingStore> {
        &self.store
    }

    pub fn variant(&self) -> Variant {
        self.config.variant
    }

    pub fn config(&self) -> &StationConfig {
        &self.config
    }

    pub fn poller_count(&self) -> usize {
        self.pollers.len()
    }
}

/// Bring up the station, then hand its API to `start_server`.
///
/// `start_server` is never called when bring-up fails.
pub fn start<A, P, S>(
    config: StationConfig,
    air: A,
    probe: Option<P>,
    start_server: impl FnOnce(HttpApi, u16) -> Result<S>,
) -> Result<(Station, S)>
where
    A: SensorDriver + Send + 'static,
    P: SensorDriver + Send + 'static,
{
    let station = Station::bring_up(config, air, probe)?;
    let server = station.serve(start_server)?;
    Ok((station, server))
}

/// Run `initialize` and report its outcome.  Fatal statuses propagate.
pub fn initialize_driver<D: SensorDriver>(driver: &mut D, sink: &mut impl EventSink) -> Result<()> {
    let status: DriverStatus = driver.initialize()?;
    if status.is_ok() {
        sink.emit(&AppEvent::DriverReady(D::FAMILY));
    }
    for w in status.warnings() {
        sink.emit(&AppEvent::DriverWarning {
            family: D::FAMILY,
            source: w.source,
            code: w.code,
        });
    }
    Ok(())
}

fn spawn_poller<D>(driver: D, store: &Arc<ReadingStore>, family: &FamilyConfig) -> Result<JoinHandle<()>>
where
    D: SensorDriver + Send + 'static,
{
    let poller = Poller::new(driver, store.clone(), LogEventSink::new(), PollTiming::from(family));
    task_pin::spawn_pinned(
        family.priority,
        family.stack_kb,
        D::FAMILY.task_name(),
        move || poller.run(&mut ThreadDelay),
    )
}
