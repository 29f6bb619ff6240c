//! Start-of-frame scanning and split reads from a serial byte stream into the bank-ordered
//! pixel buffer.
//!
//! See [`FrameReceiver`] for the state machine, and [`Transport`] / [`DisplayDriver`] for the
//! collaborators it drives.
//!
//! # Wire protocol
//!
//! ```text
//! '*' (0x2A)  then  real_num_leds × 3 payload bytes, column-major, no length, no checksum
//! ```
//!
//! The marker is not escaped. A `'*'` inside a payload is read as payload; a `'*'` seen while
//! scanning always starts a frame. A frame cut short is dropped and the display keeps showing
//! the previous one.
//!
//! # Example
//!
//! ```ignore
//! let mut receiver = FrameReceiver::new(DOOR);
//! receiver.start(buffer, &mut display).await?;
//! receiver.run(&mut transport, buffer, &mut display).await
//! ```

pub mod serial_transport;

use core::convert::Infallible;

use embassy_time::Duration;
use smart_leds::RGB8;

use crate::door_layout::{DoorGeometry, PixelBuffer};
use crate::log::{door_debug, door_info, door_warn};
use crate::Result;

// ============================================================================
// Constants
// ============================================================================

/// Byte that starts every frame on the wire.
pub const START_OF_FRAME: u8 = b'*';

/// Default window for each bounded payload read.
///
/// Shorter than one frame interval, so a stalled host costs at most a couple of windows.
pub const READ_TIMEOUT_DEFAULT: Duration = Duration::from_millis(50);

/// Dim white shown on every real LED at startup.
pub const STARTUP_COLOR: RGB8 = RGB8::new(4, 4, 4);

// ============================================================================
// Collaborators
// ============================================================================

/// Byte source the receiver reads frames from.
pub trait Transport {
    /// Poll for the next byte.
    ///
    /// Returns `None` when no byte is available (or the read failed); the receiver simply
    /// polls again on its next iteration.
    async fn read_byte(&mut self) -> Option<u8>;

    /// Read up to `buffer.len()` bytes, giving up once `timeout` passes without data.
    ///
    /// Returns the number of bytes written to the front of `buffer`.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying transport fails.
    async fn read_bytes(&mut self, buffer: &mut [u8], timeout: Duration) -> Result<usize>;
}

/// Output stage that latches a complete pixel buffer onto the LEDs.
///
/// Individual pixels are written with [`PixelBuffer::set_pixel`]; the driver only sees whole
/// buffers.
pub trait DisplayDriver<const LEN: usize> {
    /// One-time hardware setup. Called once before the first [`show`](Self::show).
    ///
    /// # Errors
    ///
    /// Returns an error if the output hardware cannot be configured.
    fn begin(&mut self) -> Result<()>;

    /// Send `buffer` to the LEDs, returning once the transfer is under way.
    ///
    /// # Errors
    ///
    /// Returns an error if `buffer` does not fit the driver's geometry.
    async fn show(&mut self, buffer: &PixelBuffer<LEN>) -> Result<()>;
}

// ============================================================================
// Receiver state and outcomes
// ============================================================================

/// Where the receiver is within one loop iteration.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(not(feature = "host"), derive(defmt::Format))]
pub enum ReceiverState {
    /// Scanning the stream for [`START_OF_FRAME`].
    Idle,
    /// Marker seen, payload reads in progress.
    Receiving,
}

/// Result of one receive attempt, consumed immediately.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(not(feature = "host"), derive(defmt::Format))]
pub enum TransferOutcome {
    /// Exactly the expected payload arrived and the display was flushed.
    Complete,
    /// The frame was dropped: short read, timeout, or transport error.
    Incomplete {
        /// Payload bytes that did arrive.
        received: usize,
        /// Payload bytes a complete frame carries.
        expected: usize,
    },
}

/// Running counters kept by a [`FrameReceiver`]. All counters wrap.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[cfg_attr(not(feature = "host"), derive(defmt::Format))]
pub struct ReceiverStats {
    /// Frames received in full and handed to the display.
    pub frames_shown: u32,
    /// Frames abandoned after their marker because the payload was short.
    pub frames_dropped: u32,
    /// Complete frames whose display flush failed.
    pub flush_failures: u32,
    /// Bytes discarded while scanning for a marker.
    pub bytes_skipped: u32,
}

// ============================================================================
// FrameReceiver
// ============================================================================

/// Turns a timing-bounded byte stream into validated buffer writes and display flushes.
///
/// Each call to [`poll`](Self::poll) is one iteration of the firmware loop:
///
/// 1. Poll one byte. Anything but [`START_OF_FRAME`] is discarded.
/// 2. On the marker, read [`first_segment_len`](DoorGeometry::first_segment_len) bytes into the
///    start of the buffer.
/// 3. If the geometry has a dummy gap, read
///    [`second_segment_len`](DoorGeometry::second_segment_len) bytes into the buffer starting at
///    [`dummy_end_index`](DoorGeometry::dummy_end_index), stepping over the gap.
/// 4. If exactly [`frame_len`](DoorGeometry::frame_len) bytes arrived, flush the display.
///    Otherwise drop the frame; bytes already written stay until the next frame overwrites them.
///
/// The receiver is back in [`ReceiverState::Idle`] after every iteration, whatever happened.
/// Nothing is retried and nothing is reported to the host.
#[derive(Clone, Debug)]
pub struct FrameReceiver {
    geometry: DoorGeometry,
    read_timeout: Duration,
    state: ReceiverState,
    stats: ReceiverStats,
}

impl FrameReceiver {
    /// Create a receiver for `geometry` using [`READ_TIMEOUT_DEFAULT`].
    #[must_use]
    pub const fn new(geometry: DoorGeometry) -> Self {
        Self {
            geometry,
            read_timeout: READ_TIMEOUT_DEFAULT,
            state: ReceiverState::Idle,
            stats: ReceiverStats {
                frames_shown: 0,
                frames_dropped: 0,
                flush_failures: 0,
                bytes_skipped: 0,
            },
        }
    }

    /// Replace the window used for each bounded payload read.
    #[must_use]
    pub const fn with_read_timeout(self, read_timeout: Duration) -> Self {
        Self {
            read_timeout,
            ..self
        }
    }

    /// The geometry frames are mapped through.
    #[must_use]
    pub const fn geometry(&self) -> &DoorGeometry {
        &self.geometry
    }

    /// Window used for each bounded payload read.
    #[must_use]
    pub const fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    /// Current state. Always [`ReceiverState::Idle`] between calls to [`poll`](Self::poll).
    #[must_use]
    pub const fn state(&self) -> ReceiverState {
        self.state
    }

    /// Counters accumulated so far.
    #[must_use]
    pub const fn stats(&self) -> ReceiverStats {
        self.stats
    }

    /// Bring up the display and light every real LED dim white, so a freshly installed door
    /// shows at a glance whether every strip is wired.
    ///
    /// # Errors
    ///
    /// Returns an error if `buffer` does not match the geometry or the display fails to start.
    pub async fn start<D, const LEN: usize>(
        &mut self,
        buffer: &mut PixelBuffer<LEN>,
        display: &mut D,
    ) -> Result<()>
    where
        D: DisplayDriver<LEN>,
    {
        buffer.check_geometry(&self.geometry)?;
        display.begin()?;
        buffer.fill_real(&self.geometry, STARTUP_COLOR)?;
        door_info!(
            "Setting all {} LEDs to dim white",
            self.geometry.real_num_leds()
        );
        display.show(buffer).await
    }

    /// Run the receive loop forever.
    ///
    /// # Errors
    ///
    /// Returns an error only if `buffer` does not match the geometry; every per-frame failure is
    /// absorbed.
    pub async fn run<T, D, const LEN: usize>(
        &mut self,
        transport: &mut T,
        buffer: &mut PixelBuffer<LEN>,
        display: &mut D,
    ) -> Result<Infallible>
    where
        T: Transport,
        D: DisplayDriver<LEN>,
    {
        buffer.check_geometry(&self.geometry)?;
        door_info!(
            "Waiting for frames of {} bytes",
            self.geometry.frame_len()
        );
        loop {
            let _ = self.poll(transport, buffer, display).await;
        }
    }

    /// One loop iteration: poll a byte and, if it is the marker, receive and maybe show a
    /// frame.
    ///
    /// Returns `None` when no frame was started.
    pub async fn poll<T, D, const LEN: usize>(
        &mut self,
        transport: &mut T,
        buffer: &mut PixelBuffer<LEN>,
        display: &mut D,
    ) -> Option<TransferOutcome>
    where
        T: Transport,
        D: DisplayDriver<LEN>,
    {
        let byte = transport.read_byte().await?;
        if byte != START_OF_FRAME {
            self.stats.bytes_skipped = self.stats.bytes_skipped.wrapping_add(1);
            return None;
        }

        door_debug!("SOF received");
        self.state = ReceiverState::Receiving;
        let outcome = self.receive(transport, buffer).await;
        self.state = ReceiverState::Idle;

        match outcome {
            TransferOutcome::Complete => {
                if display.show(buffer).await.is_ok() {
                    door_debug!("Frame shown");
                    self.stats.frames_shown = self.stats.frames_shown.wrapping_add(1);
                } else {
                    door_warn!("Display flush failed");
                    self.stats.flush_failures = self.stats.flush_failures.wrapping_add(1);
                }
            }
            TransferOutcome::Incomplete { received, expected } => {
                door_warn!(
                    "Dropped frame: {} of {} bytes received",
                    received,
                    expected
                );
                self.stats.frames_dropped = self.stats.frames_dropped.wrapping_add(1);
            }
        }
        Some(outcome)
    }

    async fn receive<T, const LEN: usize>(
        &self,
        transport: &mut T,
        buffer: &mut PixelBuffer<LEN>,
    ) -> TransferOutcome
    where
        T: Transport,
    {
        let geometry = &self.geometry;
        let expected = geometry.frame_len();
        let incomplete = |received| TransferOutcome::Incomplete { received, expected };

        let first_len = geometry.first_segment_len();
        let Some(first_segment) = buffer.get_mut(..first_len) else {
            return incomplete(0);
        };
        let mut received = match transport.read_bytes(first_segment, self.read_timeout).await {
            Ok(count) if count > 0 => count,
            Ok(_) => return incomplete(0),
            Err(_) => {
                door_warn!("Serial read failed before any payload");
                return incomplete(0);
            }
        };
        door_debug!("Num bytes received: {}", received);
        // A short first segment already rules the frame out; stop here so the rest of the
        // stream is scanned for the next marker.
        if received < first_len {
            return incomplete(received);
        }

        let second_len = geometry.second_segment_len();
        if second_len > 0 {
            let second_start = geometry.dummy_end_index();
            let Some(second_segment) = buffer.get_mut(second_start..second_start + second_len)
            else {
                return incomplete(received);
            };
            match transport.read_bytes(second_segment, self.read_timeout).await {
                Ok(count) => received += count,
                Err(_) => {
                    door_warn!("Serial read failed after {} bytes", received);
                    return incomplete(received);
                }
            }
            door_debug!("Num bytes received after dummy gap: {}", received);
        }

        if received == expected {
            TransferOutcome::Complete
        } else {
            incomplete(received)
        }
    }
}
