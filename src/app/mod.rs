//! Application core — the duty-cycle sequencing, zero I/O.
//!
//! The worker talks to the board only through the **port traits** in
//! [`ports`] (plus `embedded-hal`'s `OutputPin` and `DelayNs`), keeping
//! this layer testable without real peripherals.

pub mod events;
pub mod ports;
pub mod worker;
