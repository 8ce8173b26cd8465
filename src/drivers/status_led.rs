//! Single-colour status LED with a small pattern engine.
//!
//! | Pattern    | Meaning                        | Rate   |
//! |------------|--------------------------------|--------|
//! | Off        | idle, not started              | n/a    |
//! | Solid      | booting                        | n/a    |
//! | Heartbeat  | running, short blip per second | 1 Hz   |
//! | Connecting | waiting for the network        | 4 Hz   |
//! | Error      | fatal start-up fault, halted   | 8 Hz   |
//!
//! ## Dual-target design
//!
//! On ESP-IDF: configures the pin as a push-pull output and drives it with
//! `gpio_set_level`.
//! On host/test: tracks the level in-memory only.

use std::time::Duration;

use log::error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedPattern {
    Off,
    Solid,
    Heartbeat,
    Connecting,
    Error,
}

impl LedPattern {
    /// LED level `phase_ms` into the pattern.
    pub fn level_at(self, phase_ms: u32) -> bool {
        match self {
            Self::Off => false,
            Self::Solid => true,
            Self::Heartbeat => phase_ms % 1000 < 50,
            Self::Connecting => phase_ms % 250 < 125,
            Self::Error => phase_ms % 125 < 63,
        }
    }
}

pub struct StatusLed {
    gpio: i32,
    pattern: LedPattern,
    phase_ms: u32,
    level: bool,
}

impl StatusLed {
    pub fn new(gpio: i32) -> Self {
        configure_output(gpio);
        let mut led = Self {
            gpio,
            pattern: LedPattern::Off,
            phase_ms: 0,
            level: true,
        };
        led.write(false);
        led
    }

    /// Switch pattern; the phase restarts only when it actually changes.
    pub fn set_pattern(&mut self, pattern: LedPattern) {
        if pattern != self.pattern {
            self.pattern = pattern;
            self.phase_ms = 0;
        }
    }

    pub fn on(&mut self) {
        self.set_pattern(LedPattern::Solid);
        self.write(true);
    }

    pub fn off(&mut self) {
        self.set_pattern(LedPattern::Off);
        self.write(false);
    }

    pub fn pattern(&self) -> LedPattern {
        self.pattern
    }

    pub fn is_on(&self) -> bool {
        self.level
    }

    /// Advance by `delta_ms` and update the pin.
    pub fn tick(&mut self, delta_ms: u32) {
        self.phase_ms = self.phase_ms.wrapping_add(delta_ms);
        self.write(self.pattern.level_at(self.phase_ms));
    }

    /// Report a fatal start-up fault and never return.
    ///
    /// On the device the LED flashes the error pattern forever so the
    /// fault is visible without a serial console.  On the host the process
    /// exits with status 1.
    pub fn halt(mut self, reason: &dyn core::fmt::Display) -> ! {
        error!("FATAL: {} - halting", reason);
        self.set_pattern(LedPattern::Error);
        halt_loop(&mut self)
    }

    fn write(&mut self, on: bool) {
        if on != self.level {
            set_level(self.gpio, on);
            self.level = on;
        }
    }
}

const HALT_TICK: Duration = Duration::from_millis(20);

#[cfg(target_os = "espidf")]
fn halt_loop(led: &mut StatusLed) -> ! {
    loop {
        led.tick(HALT_TICK.as_millis() as u32);
        std::thread::sleep(HALT_TICK);
    }
}

#[cfg(not(target_os = "espidf"))]
fn halt_loop(led: &mut StatusLed) -> ! {
    // A few flashes so a watching simulation log shows the pattern.
    for _ in 0..10 {
        led.tick(HALT_TICK.as_millis() as u32);
    }
    std::process::exit(1)
}

#[cfg(target_os = "espidf")]
fn configure_output(gpio: i32) {
    use esp_idf_sys::*;

    let cfg = gpio_config_t {
        pin_bit_mask: 1u64 << gpio,
        mode: gpio_mode_t_GPIO_MODE_OUTPUT,
        pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
    };
    // SAFETY: plain struct by pointer, read during the call only.
    let ret = unsafe { gpio_config(&cfg) };
    if ret != ESP_OK as i32 {
        // An LED that cannot light is not worth failing start-up over.
        log::warn!("status LED: gpio_config({}) failed ({})", gpio, ret);
    }
}

#[cfg(not(target_os = "espidf"))]
fn configure_output(_gpio: i32) {}

#[cfg(target_os = "espidf")]
fn set_level(gpio: i32, on: bool) {
    // SAFETY: the pin was configured as an output in `configure_output`.
    unsafe {
        esp_idf_sys::gpio_set_level(gpio, u32::from(on));
    }
}

#[cfg(not(target_os = "espidf"))]
fn set_level(_gpio: i32, _on: bool) {}
