//! Bank-parallel WS2812 output.
//!
//! WS2812 strips take 24 bits per LED, MSB first. Driving every bank at once means clocking out
//! one bit of every bank per bit period, so the bank-ordered [`PixelBuffer`] is transposed into
//! *bit planes*: one 32-bit word per bit period, bit `k` holding bank `k`'s level.
//!
//! ```text
//! plane[(strip_pixel * 3 + channel) * 8 + bit]  bit k  =  bit (7 - bit) of bank k's byte
//! ```
//!
//! [`fill_bit_planes`] does the transposition and runs on any target. The PIO/DMA driver that
//! streams the planes out lives in [`parallel_ws2812`](crate::bank_driver::parallel_ws2812)
//! on hardware builds.
//!
//! [`PixelBuffer`]: crate::door_layout::PixelBuffer

#[cfg(not(feature = "host"))]
pub mod parallel_ws2812;

use crate::door_layout::{BITS_PER_PIXEL, BYTES_PER_PIXEL, DoorGeometry};
use crate::{Error, Result};

/// Banks one bit-plane word can carry.
pub const MAX_BANKS: usize = u32::BITS as usize;

/// WS2812 bit period on the wire (800 kHz), in nanoseconds.
pub const WS2812_BIT_NANOS: u64 = 1250;

/// Low time that latches the shifted data into the strips.
pub const LATCH_MICROS: u64 = 55;

/// Upper bound on one display update for `geometry`: transposition, DMA transfer and latch.
///
/// The transposition is budgeted at twice the wire time, which covers an RP2040 at its default
/// clock.
#[must_use]
pub const fn show_duration_micros(geometry: &DoorGeometry) -> u64 {
    let wire_micros = geometry.bit_plane_len() as u64 * WS2812_BIT_NANOS / 1000;
    wire_micros * 3 + LATCH_MICROS
}

/// Transpose bank-ordered pixel bytes into bit planes for parallel output.
///
/// `buffer` is the physical buffer (at least [`DoorGeometry::buffer_pixels`] × 3 bytes) and
/// `planes` must hold exactly [`DoorGeometry::bit_plane_len`] words. Every word is
/// overwritten; unused high bits are zero.
///
/// # Errors
///
/// Returns [`Error::TooManyBanks`] if the geometry has more banks than a word has bits, or
/// [`Error::BufferLengthMismatch`] if either slice has the wrong size.
pub fn fill_bit_planes(geometry: &DoorGeometry, buffer: &[u8], planes: &mut [u32]) -> Result<()> {
    if geometry.num_banks() > MAX_BANKS {
        return Err(Error::TooManyBanks(geometry.num_banks()));
    }
    let pixel_bytes = geometry.buffer_pixels() * BYTES_PER_PIXEL;
    if buffer.len() < pixel_bytes {
        return Err(Error::BufferLengthMismatch {
            expected: pixel_bytes,
            actual: buffer.len(),
        });
    }
    if planes.len() != geometry.bit_plane_len() {
        return Err(Error::BufferLengthMismatch {
            expected: geometry.bit_plane_len(),
            actual: planes.len(),
        });
    }

    for (strip_pixel, pixel_planes) in planes.chunks_exact_mut(BITS_PER_PIXEL).enumerate() {
        for (channel, channel_planes) in pixel_planes.chunks_exact_mut(8).enumerate() {
            channel_planes.fill(0);
            for bank in 0..geometry.num_banks() {
                let offset = geometry
                    .buffer_offset(bank, strip_pixel)
                    .ok_or(Error::IndexOutOfBounds)?
                    + channel;
                let byte = *buffer.get(offset).ok_or(Error::IndexOutOfBounds)?;
                for (bit, plane) in channel_planes.iter_mut().enumerate() {
                    let level = u32::from(byte >> (7 - bit) & 1);
                    *plane |= level << bank;
                }
            }
        }
    }
    Ok(())
}
