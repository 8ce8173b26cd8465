//! Application core: pure station logic, zero I/O.
//!
//! Readings flow one way: drivers behind the [`ports::SensorDriver`] trait
//! are driven by a [`poller::Poller`] per family, which writes whole
//! batches into the shared [`store::ReadingStore`].  [`view`] turns a store
//! snapshot into the JSON the HTTP adapter serves.

pub mod events;
pub mod poller;
pub mod ports;
pub mod store;
pub mod view;
