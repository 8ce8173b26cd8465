//! Integration tests for store → views → HTTP responses.

use std::sync::Arc;

use serde_json::Value;
use weather_station::adapters::http::{HttpApi, Method, JSON_CONTENT_TYPE};
use weather_station::app::store::{ProbeReading, ReadingBatch, ReadingStore};
use weather_station::app::view::NO_DATA;
use weather_station::config::Variant;

use crate::mock_drivers::indoor;

fn get(api: &HttpApi, path: &str) -> Vec<Value> {
    let resp = api.handle(Method::Get, path);
    assert_eq!(resp.status, 200, "{} must always answer 200", path);
    assert_eq!(resp.content_type, JSON_CONTENT_TYPE);
    serde_json::from_slice(&resp.body).expect("body is a JSON array")
}

fn entry<'a>(entries: &'a [Value], kind: &str) -> &'a Value {
    entries
        .iter()
        .find(|e| e["type"] == kind)
        .unwrap_or_else(|| panic!("no {} entry", kind))
}

#[test]
fn empty_store_all_reports_sentinels_with_units() {
    let api = HttpApi::new(Arc::new(ReadingStore::new()), Variant::Dual);
    let entries = get(&api, "/all");

    assert_eq!(entries.len(), 12);
    for e in &entries {
        assert_eq!(e["value"].as_f64(), Some(f64::from(NO_DATA)), "{}", e);
        assert!(!e["unit"].as_str().unwrap_or("").is_empty(), "{}", e);
    }
}

#[test]
fn applied_batch_shows_in_simple_view() {
    let store = Arc::new(ReadingStore::new());
    store.apply_batch(ReadingBatch::AirQuality(indoor(21.5, 45.0)));
    let entries = get(&HttpApi::new(store, Variant::Single), "/simple");

    let temp = entry(&entries, "temperature");
    assert_eq!(temp["value"].as_f64(), Some(21.5));
    assert_eq!(temp["unit"], "°C");
    let hum = entry(&entries, "humidity");
    assert_eq!(hum["value"].as_f64(), Some(45.0));
    assert_eq!(hum["unit"], "%");
}

#[test]
fn simple_is_a_subset_of_all() {
    let store = Arc::new(ReadingStore::new());
    store.apply_batch(ReadingBatch::AirQuality(indoor(19.0, 50.0)));
    store.apply_batch(ReadingBatch::OutdoorProbe(ProbeReading { temperature_c: -4.0 }));
    let api = HttpApi::new(store, Variant::Dual);

    let all = get(&api, "/all");
    for e in get(&api, "/simple") {
        assert!(all.contains(&e), "{} missing from /all", e);
    }
}

#[test]
fn single_variant_has_no_outdoor_field() {
    let api = HttpApi::new(Arc::new(ReadingStore::new()), Variant::Single);
    let all = get(&api, "/all");
    assert!(all.iter().all(|e| e["type"] != "outdoor_temperature"));
}

#[test]
fn outdoor_field_keeps_last_good_value() {
    let store = Arc::new(ReadingStore::new());
    store.apply_batch(ReadingBatch::OutdoorProbe(ProbeReading { temperature_c: 7.25 }));
    // A disconnected probe never writes; the store keeps what it had.
    let api = HttpApi::new(store, Variant::Dual);
    let simple = get(&api, "/simple");
    assert_eq!(entry(&simple, "outdoor_temperature")["value"].as_f64(), Some(7.25));
}
