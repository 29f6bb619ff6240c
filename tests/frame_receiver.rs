#![allow(missing_docs)]
//! Host-level tests for the frame receiver against a scripted byte stream.

use std::collections::VecDeque;

use door_display::door_layout::{DoorGeometry, PixelBuffer, TEST_RIG, TEST_RIG_BUFFER_LEN};
use door_display::frame_receiver::{
    DisplayDriver, FrameReceiver, READ_TIMEOUT_DEFAULT, ReceiverState, ReceiverStats,
    START_OF_FRAME, STARTUP_COLOR, TransferOutcome, Transport,
};
use door_display::{Error, Result};
use embassy_futures::block_on;
use embassy_time::Duration;
use embedded_io_async::ErrorKind;
use smart_leds::RGB8;

// 3 banks of 2 columns, 5 LEDs tall, 4 LEDs missing from bank 1.
const SMALL: DoorGeometry = DoorGeometry::new(5, 6, 2, 3)
    .with_blank_pixels(4)
    .with_dummy_pixels(4, 1);
const SMALL_BUFFER_LEN: usize = SMALL.buffer_len();

// ============================================================================
// Scripted transport
// ============================================================================

/// One step of what the host does on the wire.
enum Step {
    /// Bytes that arrive back to back.
    Data(VecDeque<u8>),
    /// The line goes quiet long enough for any pending read to time out.
    Silence,
    /// The UART reports an error.
    Fault,
}

#[derive(Default)]
struct ScriptedTransport {
    steps: VecDeque<Step>,
    timeouts: Vec<Duration>,
}

impl ScriptedTransport {
    fn new() -> Self {
        Self::default()
    }

    fn data(mut self, bytes: &[u8]) -> Self {
        self.steps.push_back(Step::Data(bytes.iter().copied().collect()));
        self
    }

    fn frame(self, payload: &[u8]) -> Self {
        self.data(&[START_OF_FRAME]).data(payload)
    }

    fn silence(mut self) -> Self {
        self.steps.push_back(Step::Silence);
        self
    }

    fn fault(mut self) -> Self {
        self.steps.push_back(Step::Fault);
        self
    }

    fn is_exhausted(&self) -> bool {
        self.steps.is_empty()
    }

    fn next_data_byte(&mut self) -> Option<u8> {
        let Some(Step::Data(bytes)) = self.steps.front_mut() else {
            return None;
        };
        let byte = bytes.pop_front();
        if bytes.is_empty() {
            self.steps.pop_front();
        }
        byte
    }
}

impl Transport for ScriptedTransport {
    async fn read_byte(&mut self) -> Option<u8> {
        match self.steps.front() {
            Some(Step::Data(_)) => self.next_data_byte(),
            Some(Step::Silence | Step::Fault) => {
                self.steps.pop_front();
                None
            }
            None => None,
        }
    }

    async fn read_bytes(&mut self, buffer: &mut [u8], timeout: Duration) -> Result<usize> {
        self.timeouts.push(timeout);
        let mut filled = 0;
        while filled < buffer.len() {
            match self.steps.front() {
                Some(Step::Data(_)) => {
                    if let Some(byte) = self.next_data_byte() {
                        buffer[filled] = byte;
                        filled += 1;
                    }
                }
                Some(Step::Silence) => {
                    self.steps.pop_front();
                    break;
                }
                Some(Step::Fault) => {
                    self.steps.pop_front();
                    return Err(Error::TransportRead(ErrorKind::Other));
                }
                None => break,
            }
        }
        Ok(filled)
    }
}

// ============================================================================
// Recording display
// ============================================================================

#[derive(Default)]
struct RecordingDisplay {
    begins: usize,
    shown: Vec<Vec<u8>>,
    fail_show: bool,
}

impl<const LEN: usize> DisplayDriver<LEN> for RecordingDisplay {
    fn begin(&mut self) -> Result<()> {
        self.begins += 1;
        Ok(())
    }

    async fn show(&mut self, buffer: &PixelBuffer<LEN>) -> Result<()> {
        if self.fail_show {
            return Err(Error::IndexOutOfBounds);
        }
        self.shown.push(buffer.to_vec());
        Ok(())
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn sample_frame(geometry: &DoorGeometry, seed: u8) -> Vec<u8> {
    (0..geometry.frame_len())
        .map(|i| (i as u8).wrapping_mul(7).wrapping_add(seed))
        .collect()
}

fn decode<const LEN: usize>(geometry: &DoorGeometry, snapshot: &[u8]) -> Vec<u8> {
    let mut buffer = PixelBuffer::<LEN>::new();
    buffer.copy_from_slice(snapshot);
    let mut frame = vec![0; geometry.frame_len()];
    buffer.read_logical_frame(geometry, &mut frame).unwrap();
    frame
}

fn poll_until_exhausted<const LEN: usize>(
    receiver: &mut FrameReceiver,
    transport: &mut ScriptedTransport,
    buffer: &mut PixelBuffer<LEN>,
    display: &mut RecordingDisplay,
) -> Vec<TransferOutcome> {
    let mut outcomes = Vec::new();
    while !transport.is_exhausted() {
        if let Some(outcome) = block_on(receiver.poll(transport, buffer, display)) {
            outcomes.push(outcome);
        }
        assert_eq!(receiver.state(), ReceiverState::Idle);
    }
    outcomes
}

// ============================================================================
// Tests
// ============================================================================

#[test]
fn complete_frame_flushes_once_and_skips_the_gap() {
    let frame = sample_frame(&SMALL, 1);
    let mut transport = ScriptedTransport::new().frame(&frame);
    let mut buffer = PixelBuffer::<SMALL_BUFFER_LEN>::new();
    let mut display = RecordingDisplay::default();
    let mut receiver = FrameReceiver::new(SMALL);

    let outcome = block_on(receiver.poll(&mut transport, &mut buffer, &mut display));

    assert_eq!(outcome, Some(TransferOutcome::Complete));
    assert_eq!(receiver.state(), ReceiverState::Idle);
    assert_eq!(display.shown.len(), 1);
    assert_eq!(&buffer[..48], &frame[..48]);
    assert_eq!(&buffer[48..60], &[0; 12]);
    assert_eq!(&buffer[60..90], &frame[48..]);
    assert_eq!(
        decode::<SMALL_BUFFER_LEN>(&SMALL, &display.shown[0]),
        frame
    );
    assert_eq!(
        receiver.stats(),
        ReceiverStats {
            frames_shown: 1,
            ..ReceiverStats::default()
        }
    );
}

#[test]
fn receive_matches_per_pixel_mapping() {
    let frame = sample_frame(&SMALL, 9);
    let mut transport = ScriptedTransport::new().frame(&frame);
    let mut received = PixelBuffer::<SMALL_BUFFER_LEN>::new();
    let mut display = RecordingDisplay::default();
    let mut receiver = FrameReceiver::new(SMALL);
    block_on(receiver.poll(&mut transport, &mut received, &mut display));

    let mut mapped = PixelBuffer::<SMALL_BUFFER_LEN>::new();
    mapped.load_logical_frame(&SMALL, &frame).unwrap();
    assert_eq!(received, mapped);
}

#[test]
fn geometry_without_gap_reads_in_one_segment() {
    let frame = sample_frame(&TEST_RIG, 3);
    let mut transport = ScriptedTransport::new().frame(&frame);
    let mut buffer = PixelBuffer::<TEST_RIG_BUFFER_LEN>::new();
    let mut display = RecordingDisplay::default();
    let mut receiver = FrameReceiver::new(TEST_RIG);

    let outcome = block_on(receiver.poll(&mut transport, &mut buffer, &mut display));

    assert_eq!(outcome, Some(TransferOutcome::Complete));
    assert_eq!(transport.timeouts.len(), 1);
    assert_eq!(&buffer[..], &frame[..]);
    assert_eq!(display.shown.len(), 1);
}

#[test]
fn noise_never_flushes() {
    let mut transport = ScriptedTransport::new()
        .data(b"hello door")
        .silence()
        .data(&[0, 255, b'#']);
    let mut buffer = PixelBuffer::<SMALL_BUFFER_LEN>::new();
    let mut display = RecordingDisplay::default();
    let mut receiver = FrameReceiver::new(SMALL);

    let outcomes = poll_until_exhausted(&mut receiver, &mut transport, &mut buffer, &mut display);

    assert!(outcomes.is_empty());
    assert!(display.shown.is_empty());
    assert_eq!(buffer, PixelBuffer::new());
    assert_eq!(receiver.stats().bytes_skipped, 13);
    assert!(transport.timeouts.is_empty());
}

#[test]
fn empty_stream_polls_nothing() {
    let mut transport = ScriptedTransport::new();
    let mut buffer = PixelBuffer::<SMALL_BUFFER_LEN>::new();
    let mut display = RecordingDisplay::default();
    let mut receiver = FrameReceiver::new(SMALL);

    let outcome = block_on(receiver.poll(&mut transport, &mut buffer, &mut display));

    assert_eq!(outcome, None);
    assert_eq!(receiver.stats(), ReceiverStats::default());
}

#[test]
fn short_first_segment_is_dropped_then_next_frame_shows() {
    let frame = sample_frame(&SMALL, 5);
    let mut transport = ScriptedTransport::new()
        .frame(&frame[..10])
        .silence()
        .frame(&frame);
    let mut buffer = PixelBuffer::<SMALL_BUFFER_LEN>::new();
    let mut display = RecordingDisplay::default();
    let mut receiver = FrameReceiver::new(SMALL);

    let outcomes = poll_until_exhausted(&mut receiver, &mut transport, &mut buffer, &mut display);

    assert_eq!(
        outcomes,
        [
            TransferOutcome::Incomplete {
                received: 10,
                expected: 78
            },
            TransferOutcome::Complete,
        ]
    );
    assert_eq!(display.shown.len(), 1);
    assert_eq!(
        decode::<SMALL_BUFFER_LEN>(&SMALL, &display.shown[0]),
        frame
    );
    let stats = receiver.stats();
    assert_eq!(stats.frames_dropped, 1);
    assert_eq!(stats.frames_shown, 1);
}

#[test]
fn short_second_segment_is_dropped_without_flush() {
    let frame = sample_frame(&SMALL, 2);
    let mut transport = ScriptedTransport::new().frame(&frame[..60]).silence();
    let mut buffer = PixelBuffer::<SMALL_BUFFER_LEN>::new();
    let mut display = RecordingDisplay::default();
    let mut receiver = FrameReceiver::new(SMALL);

    let outcome = block_on(receiver.poll(&mut transport, &mut buffer, &mut display));

    assert_eq!(
        outcome,
        Some(TransferOutcome::Incomplete {
            received: 60,
            expected: 78
        })
    );
    assert!(display.shown.is_empty());
    assert_eq!(transport.timeouts.len(), 2);
    // Partial bytes stay in the buffer until the next frame overwrites them.
    assert_eq!(&buffer[60..72], &frame[48..60]);
    assert_eq!(&buffer[72..90], &[0; 18]);
}

#[test]
fn marker_with_no_payload_is_dropped() {
    let mut transport = ScriptedTransport::new().data(&[START_OF_FRAME]).silence();
    let mut buffer = PixelBuffer::<SMALL_BUFFER_LEN>::new();
    let mut display = RecordingDisplay::default();
    let mut receiver = FrameReceiver::new(SMALL);

    let outcome = block_on(receiver.poll(&mut transport, &mut buffer, &mut display));

    assert_eq!(
        outcome,
        Some(TransferOutcome::Incomplete {
            received: 0,
            expected: 78
        })
    );
    assert!(display.shown.is_empty());
    assert_eq!(transport.timeouts.len(), 1);
}

#[test]
fn transport_fault_drops_frame_and_recovers() {
    let frame = sample_frame(&SMALL, 4);
    let mut transport = ScriptedTransport::new()
        .frame(&frame[..48])
        .fault()
        .frame(&frame);
    let mut buffer = PixelBuffer::<SMALL_BUFFER_LEN>::new();
    let mut display = RecordingDisplay::default();
    let mut receiver = FrameReceiver::new(SMALL);

    let outcomes = poll_until_exhausted(&mut receiver, &mut transport, &mut buffer, &mut display);

    assert_eq!(
        outcomes,
        [
            TransferOutcome::Incomplete {
                received: 48,
                expected: 78
            },
            TransferOutcome::Complete,
        ]
    );
    assert_eq!(display.shown.len(), 1);
}

#[test]
fn marker_byte_inside_payload_is_data() {
    let frame = vec![START_OF_FRAME; SMALL.frame_len()];
    let mut transport = ScriptedTransport::new().frame(&frame);
    let mut buffer = PixelBuffer::<SMALL_BUFFER_LEN>::new();
    let mut display = RecordingDisplay::default();
    let mut receiver = FrameReceiver::new(SMALL);

    let outcomes = poll_until_exhausted(&mut receiver, &mut transport, &mut buffer, &mut display);

    assert_eq!(outcomes, [TransferOutcome::Complete]);
    assert_eq!(
        decode::<SMALL_BUFFER_LEN>(&SMALL, &display.shown[0]),
        frame
    );
}

#[test]
fn trailing_bytes_after_frame_are_scanned_as_noise() {
    let frame = sample_frame(&SMALL, 6);
    let mut transport = ScriptedTransport::new().frame(&frame).data(b"xyz");
    let mut buffer = PixelBuffer::<SMALL_BUFFER_LEN>::new();
    let mut display = RecordingDisplay::default();
    let mut receiver = FrameReceiver::new(SMALL);

    let outcomes = poll_until_exhausted(&mut receiver, &mut transport, &mut buffer, &mut display);

    assert_eq!(outcomes, [TransferOutcome::Complete]);
    assert_eq!(receiver.stats().bytes_skipped, 3);
}

#[test]
fn repeated_frame_gives_identical_buffers() {
    let frame = sample_frame(&SMALL, 8);
    let mut transport = ScriptedTransport::new().frame(&frame).frame(&frame);
    let mut buffer = PixelBuffer::<SMALL_BUFFER_LEN>::new();
    let mut display = RecordingDisplay::default();
    let mut receiver = FrameReceiver::new(SMALL);

    poll_until_exhausted(&mut receiver, &mut transport, &mut buffer, &mut display);

    assert_eq!(display.shown.len(), 2);
    assert_eq!(display.shown[0], display.shown[1]);
}

#[test]
fn failed_flush_is_counted() {
    let frame = sample_frame(&SMALL, 0);
    let mut transport = ScriptedTransport::new().frame(&frame);
    let mut buffer = PixelBuffer::<SMALL_BUFFER_LEN>::new();
    let mut display = RecordingDisplay {
        fail_show: true,
        ..RecordingDisplay::default()
    };
    let mut receiver = FrameReceiver::new(SMALL);

    let outcome = block_on(receiver.poll(&mut transport, &mut buffer, &mut display));

    assert_eq!(outcome, Some(TransferOutcome::Complete));
    assert_eq!(receiver.stats().frames_shown, 0);
    assert_eq!(receiver.stats().flush_failures, 1);
}

#[test]
fn read_timeout_is_passed_to_every_bounded_read() {
    let frame = sample_frame(&SMALL, 0);
    let mut transport = ScriptedTransport::new().frame(&frame);
    let mut buffer = PixelBuffer::<SMALL_BUFFER_LEN>::new();
    let mut display = RecordingDisplay::default();
    let timeout = Duration::from_millis(20);
    let mut receiver = FrameReceiver::new(SMALL).with_read_timeout(timeout);
    assert_eq!(receiver.read_timeout(), timeout);
    assert_eq!(FrameReceiver::new(SMALL).read_timeout(), READ_TIMEOUT_DEFAULT);

    block_on(receiver.poll(&mut transport, &mut buffer, &mut display));

    assert_eq!(transport.timeouts, [timeout, timeout]);
}

#[test]
fn start_lights_real_leds_dim_white() {
    let mut buffer = PixelBuffer::<SMALL_BUFFER_LEN>::new();
    let mut display = RecordingDisplay::default();
    let mut receiver = FrameReceiver::new(SMALL);

    block_on(receiver.start(&mut buffer, &mut display)).unwrap();

    assert_eq!(display.begins, 1);
    assert_eq!(display.shown.len(), 1);
    for physical in 0..SMALL.buffer_pixels() {
        let expected = if SMALL.is_dummy(physical) {
            RGB8::default()
        } else {
            STARTUP_COLOR
        };
        assert_eq!(buffer.pixel(physical), Some(expected), "pixel {physical}");
    }
}

#[test]
fn mismatched_buffer_is_rejected_before_hardware_starts() {
    let mut buffer = PixelBuffer::<TEST_RIG_BUFFER_LEN>::new();
    let mut display = RecordingDisplay::default();
    let mut transport = ScriptedTransport::new();
    let mut receiver = FrameReceiver::new(SMALL);

    let started = block_on(receiver.start(&mut buffer, &mut display));
    assert!(matches!(
        started,
        Err(Error::BufferLengthMismatch {
            expected: 92,
            actual: 120
        })
    ));
    assert_eq!(display.begins, 0);

    let ran = block_on(receiver.run(&mut transport, &mut buffer, &mut display));
    assert!(ran.is_err());
}
