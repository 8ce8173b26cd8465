//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises a specific subsystem
//! against mock drivers.  All tests run on the host (x86_64) with no
//! real hardware required.

mod http_tests;
mod mock_drivers;
mod poller_tests;
mod startup_tests;
