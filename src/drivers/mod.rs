//! Peripheral drivers built on `embedded-hal` traits.

pub mod led;
