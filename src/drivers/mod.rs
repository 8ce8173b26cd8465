//! Board-level helpers: status LED, task spawning, thread delay.

pub mod delay;
pub mod status_led;
pub mod task_pin;
