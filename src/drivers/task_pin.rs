//! Poller task spawning with explicit FreeRTOS priority and stack size.
//!
//! `std::thread` on ESP-IDF is pthreads over FreeRTOS tasks, and the only
//! way to choose a task's priority, stack and core is
//! `esp_pthread_set_cfg()`.  That call stores thread-local settings
//! consumed by the *next* `pthread_create()` from the same thread, so the
//! configure-then-spawn pair below must not be interleaved with other
//! thread creation on the calling thread.  Host builds spawn a plain named
//! thread with the requested stack.
//!
//! The stored config keeps pointing at the task name after the call
//! returns, which is why names are `&'static CStr`.

use core::ffi::CStr;
use std::thread::JoinHandle;

use crate::error::{Error, Result};

/// Core 1 (APP_CPU).  WiFi, lwIP and the `httpd` task live on core 0.
#[cfg(target_os = "espidf")]
const APP_CPU: i32 = 1;

fn display_name(name: &'static CStr) -> &'static str {
    name.to_str().unwrap_or("task")
}

/// Spawn `f` as a task pinned to the application core.
#[cfg(target_os = "espidf")]
pub fn spawn_pinned(
    priority: u8,
    stack_kb: usize,
    name: &'static CStr,
    f: impl FnOnce() + Send + 'static,
) -> Result<JoinHandle<()>> {
    // SAFETY: `cfg` outlives the call, and `name` is static, so the pointer
    // left in thread-local storage never dangles.
    unsafe {
        let mut cfg = esp_idf_sys::esp_create_default_pthread_config();
        cfg.pin_to_core = APP_CPU;
        cfg.prio = priority as _;
        cfg.stack_size = (stack_kb * 1024) as _;
        cfg.thread_name = name.as_ptr();
        let ret = esp_idf_sys::esp_pthread_set_cfg(&cfg);
        if ret != esp_idf_sys::ESP_OK as i32 {
            log::error!("esp_pthread_set_cfg failed: {}", ret);
            return Err(Error::Init("task config"));
        }
    }

    let display = display_name(name);
    log::info!(
        "Spawning '{}' on APP_CPU (pri={}, stack={}KB)",
        display,
        priority,
        stack_kb
    );

    std::thread::Builder::new()
        .name(display.into())
        .stack_size(stack_kb * 1024)
        .spawn(f)
        .map_err(|_| Error::Init("task spawn"))
}

/// Simulation fallback: ignores core affinity and priority.
#[cfg(not(target_os = "espidf"))]
pub fn spawn_pinned(
    priority: u8,
    stack_kb: usize,
    name: &'static CStr,
    f: impl FnOnce() + Send + 'static,
) -> Result<JoinHandle<()>> {
    let display = display_name(name);
    log::info!(
        "Spawning '{}' (sim, pri={} ignored, stack={}KB)",
        display,
        priority,
        stack_kb
    );

    std::thread::Builder::new()
        .name(display.into())
        .stack_size(stack_kb * 1024)
        .spawn(f)
        .map_err(|_| Error::Init("task spawn"))
}
