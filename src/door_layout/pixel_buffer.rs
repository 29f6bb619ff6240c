//! The bank-ordered byte buffer a frame is received into.
//!
//! See [`PixelBuffer`].

use core::ops::{Deref, DerefMut};

use smart_leds::RGB8;

use super::{BYTES_PER_PIXEL, DoorGeometry};
use crate::{Error, Result};

/// Bank-ordered pixel bytes for the whole door, three bytes per slot.
///
/// Allocated once at startup (a `StaticCell` on hardware) and mutated in place every frame.
/// `LEN` must equal [`DoorGeometry::buffer_len`] for the geometry it is used with; methods that
/// take a geometry check this and return [`Error::BufferLengthMismatch`] otherwise.
///
/// Buffers deref to `[u8; LEN]`, so segment writes can borrow byte ranges directly.
///
/// # Example
///
/// ```rust
/// use door_display::door_layout::{PixelBuffer, TEST_RIG, TEST_RIG_BUFFER_LEN};
/// use smart_leds::RGB8;
///
/// let mut buffer = PixelBuffer::<TEST_RIG_BUFFER_LEN>::new();
/// buffer.set_pixel(3, RGB8::new(1, 2, 3)).unwrap();
/// assert_eq!(buffer.pixel(3), Some(RGB8::new(1, 2, 3)));
/// assert_eq!(&buffer[9..12], &[1, 2, 3]);
/// assert!(buffer.check_geometry(&TEST_RIG).is_ok());
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
#[repr(C, align(4))]
pub struct PixelBuffer<const LEN: usize>([u8; LEN]);

impl<const LEN: usize> PixelBuffer<LEN> {
    /// Number of bytes in this buffer.
    pub const LEN: usize = LEN;

    /// Create a new all-zero (black) buffer.
    #[must_use]
    pub const fn new() -> Self {
        Self([0; LEN])
    }

    /// Confirm this buffer has the length `geometry` derives.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BufferLengthMismatch`] when the lengths differ.
    pub const fn check_geometry(&self, geometry: &DoorGeometry) -> Result<()> {
        if geometry.buffer_len() == LEN {
            Ok(())
        } else {
            Err(Error::BufferLengthMismatch {
                expected: geometry.buffer_len(),
                actual: LEN,
            })
        }
    }

    /// Color stored at physical pixel `index`.
    #[must_use]
    pub fn pixel(&self, index: usize) -> Option<RGB8> {
        let start = index.checked_mul(BYTES_PER_PIXEL)?;
        match self.0.get(start..start.checked_add(BYTES_PER_PIXEL)?)? {
            &[r, g, b] => Some(RGB8::new(r, g, b)),
            _ => None,
        }
    }

    /// Write one color to physical pixel `index`.
    ///
    /// Bytes are stored in the order given; channel ordering is the sender's concern.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IndexOutOfBounds`] if the pixel does not fit in the buffer.
    pub fn set_pixel(&mut self, index: usize, color: RGB8) -> Result<()> {
        let start = index
            .checked_mul(BYTES_PER_PIXEL)
            .ok_or(Error::IndexOutOfBounds)?;
        let end = start
            .checked_add(BYTES_PER_PIXEL)
            .ok_or(Error::IndexOutOfBounds)?;
        let slot = self.0.get_mut(start..end).ok_or(Error::IndexOutOfBounds)?;
        slot.copy_from_slice(&[color.r, color.g, color.b]);
        Ok(())
    }

    /// The bytes of one bank's strip segment.
    #[must_use]
    pub fn bank_strip(&self, geometry: &DoorGeometry, bank: usize) -> Option<&[u8]> {
        let start = geometry.buffer_offset(bank, 0)?;
        let len = geometry.strip_length() * BYTES_PER_PIXEL;
        self.0.get(start..start.checked_add(len)?)
    }

    /// Copy a whole logical frame into place one pixel at a time through
    /// [`DoorGeometry::physical_pixel`].
    ///
    /// Produces the same buffer as a successful receive of `frame`. Dummy slots and the tail
    /// are left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BufferLengthMismatch`] if this buffer or `frame` has the wrong length
    /// for `geometry`.
    pub fn load_logical_frame(&mut self, geometry: &DoorGeometry, frame: &[u8]) -> Result<()> {
        self.check_geometry(geometry)?;
        if frame.len() != geometry.frame_len() {
            return Err(Error::BufferLengthMismatch {
                expected: geometry.frame_len(),
                actual: frame.len(),
            });
        }
        for (logical_pixel, color) in frame.chunks_exact(BYTES_PER_PIXEL).enumerate() {
            let physical_pixel = geometry
                .physical_pixel(logical_pixel)
                .ok_or(Error::IndexOutOfBounds)?;
            let start = physical_pixel * BYTES_PER_PIXEL;
            self.0
                .get_mut(start..start + BYTES_PER_PIXEL)
                .ok_or(Error::IndexOutOfBounds)?
                .copy_from_slice(color);
        }
        Ok(())
    }

    /// Decode the buffer back into logical (wire) order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BufferLengthMismatch`] if this buffer or `frame` has the wrong length
    /// for `geometry`.
    pub fn read_logical_frame(&self, geometry: &DoorGeometry, frame: &mut [u8]) -> Result<()> {
        self.check_geometry(geometry)?;
        if frame.len() != geometry.frame_len() {
            return Err(Error::BufferLengthMismatch {
                expected: geometry.frame_len(),
                actual: frame.len(),
            });
        }
        for (logical_pixel, color) in frame.chunks_exact_mut(BYTES_PER_PIXEL).enumerate() {
            let physical_pixel = geometry
                .physical_pixel(logical_pixel)
                .ok_or(Error::IndexOutOfBounds)?;
            let start = physical_pixel * BYTES_PER_PIXEL;
            color.copy_from_slice(
                self.0
                    .get(start..start + BYTES_PER_PIXEL)
                    .ok_or(Error::IndexOutOfBounds)?,
            );
        }
        Ok(())
    }

    /// Set every real LED to `color`, leaving dummy slots and the tail alone.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BufferLengthMismatch`] if this buffer has the wrong length for
    /// `geometry`.
    pub fn fill_real(&mut self, geometry: &DoorGeometry, color: RGB8) -> Result<()> {
        self.check_geometry(geometry)?;
        for logical_pixel in 0..geometry.real_num_leds() {
            let physical_pixel = geometry
                .physical_pixel(logical_pixel)
                .ok_or(Error::IndexOutOfBounds)?;
            self.set_pixel(physical_pixel, color)?;
        }
        Ok(())
    }
}

impl<const LEN: usize> Default for PixelBuffer<LEN> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const LEN: usize> Deref for PixelBuffer<LEN> {
    type Target = [u8; LEN];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<const LEN: usize> DerefMut for PixelBuffer<LEN> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}
