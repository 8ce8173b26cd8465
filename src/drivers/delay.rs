//! `DelayNs` that suspends only the calling thread.
//!
//! `std::thread::sleep` maps to `vTaskDelay` on ESP-IDF, so other tasks
//! (the HTTP server, the other poller) keep running.

use std::time::Duration;

use embedded_hal::delay::DelayNs;

#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadDelay;

impl DelayNs for ThreadDelay {
    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(Duration::from_nanos(ns.into()));
    }

    fn delay_ms(&mut self, ms: u32) {
        std::thread::sleep(Duration::from_millis(ms.into()));
    }
}
