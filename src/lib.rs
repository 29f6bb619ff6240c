//! Firmware library for a door-mounted WS2812 matrix driven from a host over a serial link.
//!
//! The host streams whole frames (`'*'` followed by the pixel bytes of every real LED in
//! column-major order). The board maps them into a bank-ordered buffer, stepping over the dummy
//! pixels that pad the short bank around the door handle, and flushes all banks in parallel.
//!
//! - [`door_layout`]: compile-time geometry, the logical-to-physical mapping, and the pixel
//!   buffer.
//! - [`frame_receiver`]: start-of-frame scanning, the split payload read, and flush-on-complete.
//! - [`bank_driver`]: bit-plane transposition and the PIO output stage.
//!
//! # Glossary
//!
//! - **Bank:** one independent LED chain on its own GPIO pin, wired serpentine through
//!   `columns_per_bank` columns.
//! - **Dummy pixels:** buffer slots with no physical LED, inserted so the short bank's strip
//!   lines up with the others.
//! - **PIO ([Programmable I/O](https://medium.com/data-science/nine-pico-pio-wats-with-rust-part-1-9d062067dc25)):**
//!   Pico 1 has 2. Pico 2 has 3. One state machine drives every bank.
#![cfg_attr(not(feature = "host"), no_std)]
#![cfg_attr(not(feature = "host"), no_main)]
#![allow(async_fn_in_trait, reason = "single-threaded embedded")]

// Compile-time checks: exactly one board must be selected (unless testing with host feature)
#[cfg(all(not(any(feature = "pico1", feature = "pico2")), not(feature = "host")))]
compile_error!("Must enable exactly one board feature: 'pico1' or 'pico2'");

#[cfg(all(feature = "pico1", feature = "pico2"))]
compile_error!("Cannot enable both 'pico1' and 'pico2' features simultaneously");

#[cfg(all(not(feature = "arm"), not(feature = "host")))]
compile_error!("Must enable the 'arm' architecture feature");

mod log;

pub mod bank_driver;
pub mod door_layout;
mod error;
pub mod frame_receiver;
// PIO and UART interrupt bindings shared by the demos
#[cfg(not(feature = "host"))]
#[doc(hidden)]
pub mod irqs;

// Re-export error types and result (used throughout)
pub use crate::error::{Error, Result};
