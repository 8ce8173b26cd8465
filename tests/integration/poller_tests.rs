//! Integration tests for driver → poller → store.

use std::sync::Arc;
use std::time::Duration;

use weather_station::adapters::http::{HttpApi, Method};
use weather_station::app::events::AppEvent;
use weather_station::app::poller::{PollTiming, Poller, PollerState};
use weather_station::app::ports::{PollOutcome, SensorFamily};
use weather_station::app::store::{ProbeReading, ReadingSnapshot, ReadingStore};
use weather_station::config::{StationConfig, Variant};
use weather_station::error::DriverError;

use crate::mock_drivers::{MockAir, MockProbe, RecordingSink, indoor};

fn probe_timing() -> PollTiming {
    PollTiming::from(&StationConfig::for_variant(Variant::Dual).outdoor_probe)
}

#[test]
fn default_timings_match_variant() {
    let single = StationConfig::for_variant(Variant::Single);
    let dual = StationConfig::for_variant(Variant::Dual);
    assert_eq!(PollTiming::from(&single.air_quality).period, Duration::from_secs(30));
    assert_eq!(PollTiming::from(&dual.air_quality).period, Duration::from_secs(15));
    assert_eq!(probe_timing().period, Duration::from_secs(5));
    assert_eq!(probe_timing().retry_delay, Duration::from_millis(100));
}

#[test]
fn disconnected_probe_keeps_stale_value_and_serves_200() {
    let store = Arc::new(ReadingStore::new());
    let mut poller = Poller::new(
        MockProbe::new(vec![
            PollOutcome::Reading(ProbeReading { temperature_c: 3.5 }),
            PollOutcome::DeviceError(DriverError::ProbeDisconnected),
            PollOutcome::DeviceError(DriverError::ProbeDisconnected),
        ]),
        store.clone(),
        RecordingSink::default(),
        probe_timing(),
    );

    assert_eq!(poller.step(), Duration::from_secs(5));
    let after_good = store.snapshot();
    assert_eq!(poller.step(), Duration::from_millis(100));
    assert_eq!(poller.step(), Duration::from_millis(100));
    assert_eq!(store.snapshot(), after_good);

    let resp = HttpApi::new(store, Variant::Dual).handle(Method::Get, "/simple");
    assert_eq!(resp.status, 200);
    let body = String::from_utf8(resp.body).unwrap();
    assert!(body.contains(r#"{"type":"outdoor_temperature","value":3.5,"unit":"°C"}"#));

    let errors = poller
        .sink()
        .events
        .iter()
        .filter(|e| matches!(e, AppEvent::DeviceError { .. }))
        .count();
    assert_eq!(errors, 1, "a streak is reported once, not per poll");
}

#[test]
fn pollers_of_both_families_share_one_store() {
    let store = Arc::new(ReadingStore::new());
    let timing = probe_timing();
    let mut air = Poller::new(
        MockAir::new(vec![PollOutcome::Reading(indoor(22.0, 40.0))]),
        store.clone(),
        RecordingSink::default(),
        timing,
    );
    let mut probe = Poller::new(
        MockProbe::new(vec![PollOutcome::Reading(ProbeReading { temperature_c: -1.0 })]),
        store.clone(),
        RecordingSink::default(),
        timing,
    );

    air.step();
    probe.step();

    let snap = store.snapshot();
    assert_eq!(snap.air_quality.map(|r| r.temperature_c), Some(22.0));
    assert_eq!(snap.outdoor.map(|r| r.temperature_c), Some(-1.0));
    assert_eq!(snap.samples(SensorFamily::AirQuality), 1);
    assert_eq!(snap.samples(SensorFamily::OutdoorProbe), 1);
}

#[test]
fn not_ready_rounds_leave_store_untouched() {
    let store = Arc::new(ReadingStore::new());
    let mut poller = Poller::new(
        MockAir::new(vec![PollOutcome::NotReady; 20]),
        store.clone(),
        RecordingSink::default(),
        probe_timing(),
    );
    for _ in 0..20 {
        assert_eq!(poller.step(), Duration::from_millis(100));
    }
    assert_eq!(poller.state(), PollerState::RetryAfterShortDelay);
    assert_eq!(store.snapshot(), ReadingSnapshot::default());
}
