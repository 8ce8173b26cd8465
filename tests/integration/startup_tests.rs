//! Integration tests for station bring-up ordering.

use std::cell::Cell;

use weather_station::app::ports::{DriverStatus, PollOutcome};
use weather_station::config::{StationConfig, Variant};
use weather_station::error::{DriverError, Error, StatusSource};
use weather_station::station::{self, Station};

use crate::mock_drivers::{MockAir, MockProbe, indoor};

#[test]
fn fatal_init_never_starts_http() {
    let started = Cell::new(false);
    let fatal = DriverError::Fatal {
        source: StatusSource::Library,
        code: -36,
    };

    let result = station::start(
        StationConfig::default(),
        MockAir::failing(fatal),
        None::<MockProbe>,
        |_api, _port| {
            started.set(true);
            Ok(())
        },
    );

    assert!(matches!(result, Err(Error::Driver(e)) if e == fatal));
    assert!(!started.get(), "HTTP starter must not run after a fatal init");
}

#[test]
fn fatal_probe_init_stops_dual_station() {
    let air = MockAir::new(Vec::new());
    let air_inits = air.init_calls.clone();
    let result = Station::bring_up(
        StationConfig::for_variant(Variant::Dual),
        air,
        Some(MockProbe::failing(DriverError::Fatal {
            source: StatusSource::Bus,
            code: -1,
        })),
    );
    assert!(result.is_err());
    assert_eq!(air_inits.load(std::sync::atomic::Ordering::SeqCst), 1);
}

#[test]
fn warning_does_not_stop_startup() {
    let air = MockAir::new(Vec::new()).with_status(DriverStatus::warning(StatusSource::Chip, 2));
    let (station, port) =
        station::start(StationConfig::default(), air, None::<MockProbe>, |_api, port| Ok(port))
            .expect("warnings are not fatal");
    assert_eq!(port, 80);
    assert_eq!(station.poller_count(), 1);
}

#[test]
fn running_station_publishes_readings() {
    let mut config = StationConfig::for_variant(Variant::Single);
    config.air_quality.period_ms = 1_000;
    config.air_quality.retry_delay_ms = 5;
    let air = MockAir::new(vec![
        PollOutcome::NotReady,
        PollOutcome::Reading(indoor(21.5, 45.0)),
    ]);

    let station = Station::bring_up(config, air, None::<MockProbe>).unwrap();

    let mut published = None;
    for _ in 0..200 {
        if let Some(r) = station.store().snapshot().air_quality {
            published = Some(r);
            break;
        }
        std::thread::sleep(std::time::Duration::from_millis(5));
    }
    assert_eq!(published.map(|r| r.temperature_c), Some(21.5));
}
