//! Low-power blink demo library.
//!
//! Exposes the pure-logic modules for integration testing. All
//! ESP-IDF-specific code lives in [`adapters::esp`], guarded by
//! `#[cfg(target_os = "espidf")]`.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod datetime;
pub mod drivers;
pub mod error;
pub mod pins;
pub mod startup;
pub mod wake;
