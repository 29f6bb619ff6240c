//! [`Transport`] over any `embedded_io_async::Read` byte stream, such as an
//! `embassy_rp::uart::BufferedUart`.
//!
//! See [`SerialTransport`].

use embassy_time::{Duration, with_timeout};
use embedded_io_async::{Error as _, Read};

use super::Transport;
use crate::bank_driver::show_duration_micros;
use crate::door_layout::{DOOR, DoorGeometry, TEST_RIG};
use crate::{Error, Result};

/// How long [`SerialTransport::read_byte`] waits before reporting that no byte is available.
pub const POLL_INTERVAL_DEFAULT: Duration = Duration::from_millis(10);

/// Baud rate the host opens the serial link at.
pub const SERIAL_BAUD_DEFAULT: u32 = 921_600;

/// UART receive ring size for [`DOOR`] at [`SERIAL_BAUD_DEFAULT`].
pub const DOOR_RX_BUFFER_LEN: usize = rx_buffer_len(&DOOR, SERIAL_BAUD_DEFAULT);

/// UART receive ring size for [`TEST_RIG`] at [`SERIAL_BAUD_DEFAULT`].
pub const TEST_RIG_RX_BUFFER_LEN: usize = rx_buffer_len(&TEST_RIG, SERIAL_BAUD_DEFAULT);

/// Bytes a UART receive ring must hold so a host streaming back to back at `baud` loses nothing
/// while one display update on `geometry` keeps the receiver away from the link.
///
/// The link has no flow control. Assumes 8N1 framing and rounds up to a power of two.
#[must_use]
pub const fn rx_buffer_len(geometry: &DoorGeometry, baud: u32) -> usize {
    let bytes_per_second = baud as u64 / 10;
    let backlog = show_duration_micros(geometry) * bytes_per_second / 1_000_000 + 1;
    (backlog as usize).next_power_of_two()
}

/// Bounded reads over an async serial reader.
///
/// Each read is bounded by an inactivity window: [`read_bytes`](Transport::read_bytes) keeps
/// filling its buffer while data keeps arriving and returns early once the line has been quiet
/// for the whole window.
///
/// ```ignore
/// let uart = BufferedUart::new(p.UART0, p.PIN_0, p.PIN_1, Uart0Irqs, tx_buf, rx_buf, config);
/// let mut transport = SerialTransport::new(uart);
/// ```
pub struct SerialTransport<R> {
    reader: R,
    poll_interval: Duration,
}

impl<R: Read> SerialTransport<R> {
    /// Wrap `reader`, polling with [`POLL_INTERVAL_DEFAULT`].
    #[must_use]
    pub const fn new(reader: R) -> Self {
        Self {
            reader,
            poll_interval: POLL_INTERVAL_DEFAULT,
        }
    }

    /// Replace the window [`read_byte`](Transport::read_byte) waits for a byte.
    #[must_use]
    pub fn with_poll_interval(self, poll_interval: Duration) -> Self {
        Self {
            poll_interval,
            ..self
        }
    }

    /// Give back the wrapped reader.
    #[must_use]
    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: Read> Transport for SerialTransport<R> {
    async fn read_byte(&mut self) -> Option<u8> {
        let mut byte = [0_u8; 1];
        match with_timeout(self.poll_interval, self.reader.read(&mut byte)).await {
            Ok(Ok(1)) => {
                let [value] = byte;
                Some(value)
            }
            _ => None,
        }
    }

    async fn read_bytes(&mut self, buffer: &mut [u8], timeout: Duration) -> Result<usize> {
        let mut filled = 0;
        loop {
            let Some(remaining) = buffer.get_mut(filled..) else {
                break;
            };
            if remaining.is_empty() {
                break;
            }
            match with_timeout(timeout, self.reader.read(remaining)).await {
                Ok(Ok(0)) | Err(_) => break,
                Ok(Ok(count)) => filled += count,
                Ok(Err(err)) => return Err(Error::TransportRead(err.kind())),
            }
        }
        Ok(filled)
    }
}
