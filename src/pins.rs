//! GPIO / peripheral pin assignments for the weather station board.
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// I²C bus (BME680)
// ---------------------------------------------------------------------------

pub const I2C_SDA_GPIO: i32 = 21;
pub const I2C_SCL_GPIO: i32 = 22;

/// BME680 with SDO pulled high.
pub const BME680_I2C_ADDR: u8 = 0x77;

// ---------------------------------------------------------------------------
// 1-Wire bus (DS18B20 outdoor probe, dual variant)
// ---------------------------------------------------------------------------

/// Data line, 4.7 kΩ pull-up to 3V3.
pub const PROBE_ONEWIRE_GPIO: i32 = 4;

// ---------------------------------------------------------------------------
// Status LED
// ---------------------------------------------------------------------------

/// On-board blue LED of the ESP32 DevKit (active HIGH).
pub const STATUS_LED_GPIO: i32 = 2;
