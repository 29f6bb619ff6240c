//! Compile-time description of the door's LED geometry and where each byte of a host frame
//! lands in the bank-ordered pixel buffer.
//!
//! See [`DoorGeometry`] for the derivations and [`PixelBuffer`] for the buffer they describe.

pub mod pixel_buffer;

pub use pixel_buffer::PixelBuffer;

// ============================================================================
// Constants
// ============================================================================

/// Bytes per pixel, on the wire and in the buffer (one per color channel).
pub const BYTES_PER_PIXEL: usize = 3;

/// Bits clocked out per pixel (8 per channel).
pub const BITS_PER_PIXEL: usize = BYTES_PER_PIXEL * 8;

/// The DMA hardware moves whole 32-bit words.
const WORD_BYTES: usize = 4;

/// Bench test rig: 4 banks with one 10-LED column each, no cutout.
pub const TEST_RIG: DoorGeometry = DoorGeometry::new(10, 4, 1, 4);

/// Byte length of the [`PixelBuffer`] for [`TEST_RIG`].
pub const TEST_RIG_BUFFER_LEN: usize = TEST_RIG.buffer_len();

/// Word length of the bit-plane display buffer for [`TEST_RIG`].
pub const TEST_RIG_BIT_PLANE_LEN: usize = TEST_RIG.bit_plane_len();

/// The full door: 50 columns of 124 LEDs, four columns per bank.
///
/// The 28-LED handle cutout sits entirely inside bank 11, so that bank's strip is 28 LEDs short
/// and gets 28 dummy pixels to keep bank 12 aligned. Bank 12 only carries two columns; its unused
/// tail needs no padding.
pub const DOOR: DoorGeometry = DoorGeometry::new(124, 50, 4, 13)
    .with_blank_pixels(28)
    .with_dummy_pixels(28, 11);

/// Byte length of the [`PixelBuffer`] for [`DOOR`].
pub const DOOR_BUFFER_LEN: usize = DOOR.buffer_len();

/// Word length of the bit-plane display buffer for [`DOOR`].
pub const DOOR_BIT_PLANE_LEN: usize = DOOR.bit_plane_len();

// ============================================================================
// DoorGeometry
// ============================================================================

/// Compile-time description of an LED door: its visible grid, how columns are grouped into
/// output banks, and the irregularities (blank and dummy pixels) the buffer must absorb.
///
/// The host streams the *logical frame*: every physically present LED, column-major, three bytes
/// each. The DMA hardware wants the *physical buffer*: `num_banks` strip segments of equal
/// length laid end to end. The two orders agree everywhere except at the dummy gap, a run of
/// `num_dummy_pixels` slots at the end of the short bank's segment that no logical pixel maps to.
///
/// ```text
/// bank:       0          1      ...  short bank            ...  last
///        [ strip ][ strip ] ... [ real LEDs | dummy ][ strip ] ... [ strip | tail ]
/// bytes: 0 ...................... dummy_start ^   ^ dummy_end ....................
///        |------ first segment ------|           |------ second segment ------|
/// ```
///
/// A frame therefore arrives as two contiguous segments: `[0, dummy_start_index)` and
/// `[dummy_end_index, dummy_end_index + second_segment_len)`. With no dummy pixels the gap has
/// zero width at the end of the frame and the second segment is empty.
///
/// ## Validation
///
/// Geometries are validated when constructed. Building one in a `const` item turns every
/// violation into a compile error:
/// - all dimensions must be positive and the columns must fit in the banks
/// - blank pixels must leave at least one real LED
/// - the short bank must exist and its dummy gap must fit inside one strip
/// - the first segment must be non-empty and hold only real pixels
/// - the second segment must end inside the buffer
///
/// # Example
///
/// ```rust
/// use door_display::door_layout::DoorGeometry;
///
/// // 3 banks of 2 columns, 5 LEDs tall, 4 LEDs missing from bank 1.
/// const GEOMETRY: DoorGeometry = DoorGeometry::new(5, 6, 2, 3)
///     .with_blank_pixels(4)
///     .with_dummy_pixels(4, 1);
///
/// const _: () = assert!(GEOMETRY.real_num_leds() == 26);
/// const _: () = assert!(GEOMETRY.dummy_start_index() == 16 * 3);
/// const _: () = assert!(GEOMETRY.dummy_end_index() == 20 * 3);
/// const _: () = assert!(GEOMETRY.first_segment_len() + GEOMETRY.second_segment_len() == 26 * 3);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DoorGeometry {
    leds_per_column: usize,
    num_columns: usize,
    columns_per_bank: usize,
    num_banks: usize,
    num_blank_pixels: usize,
    num_dummy_pixels: usize,
    short_bank: usize,
}

impl DoorGeometry {
    /// A full rectangular grid: no blank pixels, no dummy gap.
    #[must_use]
    pub const fn new(
        leds_per_column: usize,
        num_columns: usize,
        columns_per_bank: usize,
        num_banks: usize,
    ) -> Self {
        Self {
            leds_per_column,
            num_columns,
            columns_per_bank,
            num_banks,
            num_blank_pixels: 0,
            num_dummy_pixels: 0,
            short_bank: 0,
        }
        .validated()
    }

    /// Subtract physically absent LEDs from the grid.
    #[must_use]
    pub const fn with_blank_pixels(self, num_blank_pixels: usize) -> Self {
        Self {
            num_blank_pixels,
            ..self
        }
        .validated()
    }

    /// Pad the end of `short_bank`'s strip segment with `num_dummy_pixels` placeholder slots.
    ///
    /// With zero dummy pixels there is no gap and `short_bank` is ignored.
    #[must_use]
    pub const fn with_dummy_pixels(self, num_dummy_pixels: usize, short_bank: usize) -> Self {
        Self {
            num_dummy_pixels,
            short_bank: if num_dummy_pixels == 0 { 0 } else { short_bank },
            ..self
        }
        .validated()
    }

    const fn validated(self) -> Self {
        assert!(self.leds_per_column > 0, "leds_per_column must be positive");
        assert!(self.num_columns > 0, "num_columns must be positive");
        assert!(self.columns_per_bank > 0, "columns_per_bank must be positive");
        assert!(self.num_banks > 0, "num_banks must be positive");
        assert!(
            self.num_columns <= self.columns_per_bank * self.num_banks,
            "columns do not fit in the banks"
        );
        assert!(
            self.num_blank_pixels < self.leds_per_column * self.num_columns,
            "blank pixels must leave at least one real LED"
        );
        assert!(self.short_bank < self.num_banks, "short bank out of range");
        assert!(
            self.num_dummy_pixels <= self.strip_length(),
            "dummy gap must fit inside one strip"
        );
        assert!(
            self.dummy_start_index() > 0,
            "first segment must not be empty"
        );
        assert!(
            self.dummy_start_index() <= self.frame_len(),
            "first segment must hold only real pixels"
        );
        assert!(
            self.dummy_end_index() + self.second_segment_len()
                <= self.buffer_pixels() * BYTES_PER_PIXEL,
            "second segment runs past the end of the buffer"
        );
        self
    }

    /// LEDs in one column of the door.
    #[must_use]
    pub const fn leds_per_column(&self) -> usize {
        self.leds_per_column
    }

    /// Visible columns across the door.
    #[must_use]
    pub const fn num_columns(&self) -> usize {
        self.num_columns
    }

    /// Columns wired in series on one bank's strip.
    #[must_use]
    pub const fn columns_per_bank(&self) -> usize {
        self.columns_per_bank
    }

    /// Output banks (parallel DMA channels).
    #[must_use]
    pub const fn num_banks(&self) -> usize {
        self.num_banks
    }

    /// Grid positions with no LED installed.
    #[must_use]
    pub const fn num_blank_pixels(&self) -> usize {
        self.num_blank_pixels
    }

    /// Placeholder slots at the end of the short bank's segment.
    #[must_use]
    pub const fn num_dummy_pixels(&self) -> usize {
        self.num_dummy_pixels
    }

    /// Bank whose strip is padded with dummy pixels.
    #[must_use]
    pub const fn short_bank(&self) -> usize {
        self.short_bank
    }

    /// Physically present LEDs, which is also the pixel count of one logical frame.
    #[must_use]
    pub const fn real_num_leds(&self) -> usize {
        self.leds_per_column * self.num_columns - self.num_blank_pixels
    }

    /// Pixel slots per bank. Every bank gets the same length.
    #[must_use]
    pub const fn strip_length(&self) -> usize {
        self.leds_per_column * self.columns_per_bank
    }

    /// Pixel slots across all banks.
    #[must_use]
    pub const fn buffer_pixels(&self) -> usize {
        self.strip_length() * self.num_banks
    }

    /// Bytes in the physical buffer, rounded up to whole 32-bit words.
    #[must_use]
    pub const fn buffer_len(&self) -> usize {
        (self.buffer_pixels() * BYTES_PER_PIXEL).next_multiple_of(WORD_BYTES)
    }

    /// Words in the DMA bit-plane buffer: one word per bit of one strip.
    #[must_use]
    pub const fn bit_plane_len(&self) -> usize {
        self.strip_length() * BITS_PER_PIXEL
    }

    /// Payload bytes following a start-of-frame marker.
    #[must_use]
    pub const fn frame_len(&self) -> usize {
        self.real_num_leds() * BYTES_PER_PIXEL
    }

    /// First buffer byte of the dummy gap, which is also the length of the first segment.
    #[must_use]
    pub const fn dummy_start_index(&self) -> usize {
        self.dummy_end_index() - self.num_dummy_pixels * BYTES_PER_PIXEL
    }

    /// One past the last buffer byte of the dummy gap, where the second segment starts.
    #[must_use]
    pub const fn dummy_end_index(&self) -> usize {
        if self.num_dummy_pixels == 0 {
            self.frame_len()
        } else {
            (self.short_bank + 1) * self.strip_length() * BYTES_PER_PIXEL
        }
    }

    /// Bytes read straight into `[0, dummy_start_index)`.
    #[must_use]
    pub const fn first_segment_len(&self) -> usize {
        self.dummy_start_index()
    }

    /// Bytes read into the buffer starting at `dummy_end_index`. Zero without a dummy gap.
    #[must_use]
    pub const fn second_segment_len(&self) -> usize {
        self.frame_len() - self.dummy_start_index()
    }

    /// Buffer byte offset of pixel `strip_pixel` on `bank`'s strip.
    #[must_use]
    pub const fn buffer_offset(&self, bank: usize, strip_pixel: usize) -> Option<usize> {
        if bank >= self.num_banks || strip_pixel >= self.strip_length() {
            return None;
        }
        Some((bank * self.strip_length() + strip_pixel) * BYTES_PER_PIXEL)
    }

    /// `(bank, strip_pixel)` of a physical buffer pixel.
    #[must_use]
    pub const fn bank_position(&self, physical_pixel: usize) -> Option<(usize, usize)> {
        if physical_pixel >= self.buffer_pixels() {
            return None;
        }
        let strip_length = self.strip_length();
        Some((physical_pixel / strip_length, physical_pixel % strip_length))
    }

    /// Physical buffer pixel that logical pixel `logical_pixel` is written to.
    #[must_use]
    pub const fn physical_pixel(&self, logical_pixel: usize) -> Option<usize> {
        if logical_pixel >= self.real_num_leds() {
            return None;
        }
        if logical_pixel < self.dummy_start_index() / BYTES_PER_PIXEL {
            Some(logical_pixel)
        } else {
            Some(logical_pixel + self.num_dummy_pixels)
        }
    }

    /// Logical pixel stored in physical buffer pixel `physical_pixel`.
    ///
    /// `None` for dummy slots and for the unused tail after the last real pixel.
    #[must_use]
    pub const fn logical_pixel(&self, physical_pixel: usize) -> Option<usize> {
        let gap_start = self.dummy_start_index() / BYTES_PER_PIXEL;
        if physical_pixel < gap_start {
            return Some(physical_pixel);
        }
        if physical_pixel < gap_start + self.num_dummy_pixels {
            return None;
        }
        let logical_pixel = physical_pixel - self.num_dummy_pixels;
        if logical_pixel < self.real_num_leds() {
            Some(logical_pixel)
        } else {
            None
        }
    }

    /// Whether `physical_pixel` lies in the dummy gap.
    #[must_use]
    pub const fn is_dummy(&self, physical_pixel: usize) -> bool {
        let gap_start = self.dummy_start_index() / BYTES_PER_PIXEL;
        physical_pixel >= gap_start && physical_pixel < gap_start + self.num_dummy_pixels
    }
}
