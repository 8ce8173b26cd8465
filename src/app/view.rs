//! Reading views: what the HTTP API shows for a snapshot.
//!
//! Pure functions over a [`ReadingSnapshot`]: no I/O, no locking.  Field
//! names and units come from one static table so the two views can never
//! disagree about a unit.

use serde::Serialize;

use crate::config::Variant;
use crate::error::{Error, Result};

use super::store::{AirQualityReading, ReadingSnapshot};

/// Value reported for a field whose family has not produced a reading yet.
pub const NO_DATA: f32 = 0.0;

/// Every field the station can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Temperature,
    OutdoorTemperature,
    Humidity,
    Pressure,
    Iaq,
    RawTemperature,
    RawHumidity,
    GasResistance,
    IaqAccuracy,
    StaticIaq,
    Co2Equivalent,
    BreathVocEquivalent,
}

/// `(field, JSON type tag, unit)` for every field.
pub const FIELD_TABLE: [(Field, &str, &str); 12] = [
    (Field::Temperature, "temperature", "°C"),
    (Field::OutdoorTemperature, "outdoor_temperature", "°C"),
    (Field::Humidity, "humidity", "%"),
    (Field::Pressure, "pressure", "hPa"),
    (Field::Iaq, "iaq", "score"),
    (Field::RawTemperature, "raw_temperature", "°C"),
    (Field::RawHumidity, "raw_humidity", "%"),
    (Field::GasResistance, "gas_resistance", "Ω"),
    (Field::IaqAccuracy, "iaq_accuracy", "0-3"),
    (Field::StaticIaq, "static_iaq", "score"),
    (Field::Co2Equivalent, "co2_equivalent", "ppm"),
    (Field::BreathVocEquivalent, "breath_voc_equivalent", "ppm"),
];

const FULL_ONLY: [Field; 7] = [
    Field::RawTemperature,
    Field::RawHumidity,
    Field::GasResistance,
    Field::IaqAccuracy,
    Field::StaticIaq,
    Field::Co2Equivalent,
    Field::BreathVocEquivalent,
];

impl Field {
    fn entry(self) -> (&'static str, &'static str) {
        FIELD_TABLE
            .iter()
            .find(|(f, _, _)| *f == self)
            .map_or(("unknown", ""), |(_, name, unit)| (*name, *unit))
    }

    /// JSON `type` tag.
    pub fn name(self) -> &'static str {
        self.entry().0
    }

    pub fn unit(self) -> &'static str {
        self.entry().1
    }

    /// This field's value in `snap`, or the no-data sentinel.
    pub fn value(self, snap: &ReadingSnapshot) -> Value {
        if self == Self::OutdoorTemperature {
            return Value::Float(snap.outdoor.map_or(NO_DATA, |r| r.temperature_c));
        }
        let Some(aq) = snap.air_quality else {
            return match self {
                Self::IaqAccuracy => Value::Int(0),
                _ => Value::Float(NO_DATA),
            };
        };
        air_quality_value(self, &aq)
    }
}

fn air_quality_value(field: Field, aq: &AirQualityReading) -> Value {
    let v = match field {
        Field::Temperature => aq.temperature_c,
        Field::Humidity => aq.humidity_pct,
        Field::Pressure => aq.pressure_hpa,
        Field::Iaq => aq.iaq,
        Field::RawTemperature => aq.raw_temperature_c,
        Field::RawHumidity => aq.raw_humidity_pct,
        Field::GasResistance => aq.gas_resistance_ohm,
        Field::IaqAccuracy => return Value::Int(aq.iaq_accuracy),
        Field::StaticIaq => aq.static_iaq,
        Field::Co2Equivalent => aq.co2_equivalent_ppm,
        Field::BreathVocEquivalent => aq.breath_voc_equivalent_ppm,
        Field::OutdoorTemperature => NO_DATA,
    };
    Value::Float(v)
}

/// A JSON number; the accuracy field is an integer, the rest are floats.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Float(f32),
    Int(u8),
}

/// One `{"type", "value", "unit"}` element of a response.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReadingEntry {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub value: Value,
    pub unit: &'static str,
}

impl ReadingEntry {
    fn of(field: Field, snap: &ReadingSnapshot) -> Self {
        Self {
            kind: field.name(),
            value: field.value(snap),
            unit: field.unit(),
        }
    }
}

/// Fields of the simple view, in response order.
pub fn simple_fields(variant: Variant) -> Vec<Field> {
    let mut fields = vec![Field::Temperature];
    if variant.has_outdoor_probe() {
        fields.push(Field::OutdoorTemperature);
    }
    fields.extend([Field::Humidity, Field::Pressure, Field::Iaq]);
    fields
}

/// Fields of the full view, in response order.
pub fn full_fields(variant: Variant) -> Vec<Field> {
    let mut fields = FULL_ONLY.to_vec();
    fields.extend(simple_fields(variant));
    fields
}

/// Headline readings: temperatures, humidity, pressure, IAQ.
pub fn build_simple_view(snap: &ReadingSnapshot, variant: Variant) -> Vec<ReadingEntry> {
    simple_fields(variant)
        .into_iter()
        .map(|f| ReadingEntry::of(f, snap))
        .collect()
}

/// Every field the station knows about.
pub fn build_full_view(snap: &ReadingSnapshot, variant: Variant) -> Vec<ReadingEntry> {
    full_fields(variant)
        .into_iter()
        .map(|f| ReadingEntry::of(f, snap))
        .collect()
}

/// Serialise a view as a top-level JSON array.
pub fn render_json(entries: &[ReadingEntry]) -> Result<Vec<u8>> {
    serde_json::to_vec(entries).map_err(|_| Error::Encode)
}
