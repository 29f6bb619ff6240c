//! One PIO state machine driving every bank's WS2812 strip in parallel.
//!
//! See [`ParallelWs2812`].

use embassy_rp::Peri;
use embassy_rp::clocks::clk_sys_freq;
use embassy_rp::dma::{AnyChannel, Channel};
use embassy_rp::pio::program::{
    Assembler, MovDestination, MovOperation, MovSource, OutDestination,
};
use embassy_rp::pio::{
    Common, Config, Direction, FifoJoin, Instance, LoadedProgram, Pin, ShiftConfig,
    ShiftDirection, StateMachine,
};
use embassy_time::Timer;
use fixed::types::U24F8;
use heapless::Vec;

use super::{LATCH_MICROS, MAX_BANKS, fill_bit_planes};
use crate::door_layout::{DoorGeometry, PixelBuffer};
use crate::frame_receiver::DisplayDriver;
use crate::log::door_info;
use crate::{Error, Result};

// High for T1, data for T2, low for T3 (in PIO cycles). The `out` takes one of the T3 cycles.
const T1: u8 = 3;
const T2: u8 = 3;
const T3: u8 = 4;
const CYCLES_PER_BIT: u32 = (T1 + T2 + T3) as u32;

fn load_parallel_ws2812_program<'d, PIO: Instance>(
    common: &mut Common<'d, PIO>,
) -> LoadedProgram<'d, PIO> {
    let mut assembler: Assembler<32> = Assembler::new();

    let mut wrap_target = assembler.label();
    let mut wrap_source = assembler.label();
    assembler.bind(&mut wrap_target);
    assembler.out(OutDestination::X, 32);
    assembler.mov_with_delay(
        MovDestination::PINS,
        MovOperation::Invert,
        MovSource::NULL,
        T1 - 1,
    );
    assembler.mov_with_delay(MovDestination::PINS, MovOperation::None, MovSource::X, T2 - 1);
    assembler.mov_with_delay(
        MovDestination::PINS,
        MovOperation::None,
        MovSource::NULL,
        T3 - 2,
    );
    assembler.bind(&mut wrap_source);

    let program = assembler.assemble_with_wrap(wrap_source, wrap_target);
    common.load_program(&program)
}

/// Bank-parallel WS2812 output: bank `k` is wired to the `k`th of `num_banks` consecutive GPIO
/// pins, and all banks shift out together from one state machine fed by DMA.
///
/// `PLANES` must equal [`DoorGeometry::bit_plane_len`]; the bit-plane buffer is borrowed for
/// the driver's lifetime (a `StaticCell` on hardware) so DMA always reads from memory the
/// driver owns.
///
/// Each [`show`](DisplayDriver::show) transposes the pixel buffer into bit planes, DMAs them to
/// the state machine, and holds the lines low for the latch period.
///
/// ```ignore
/// let Pio { mut common, sm0, .. } = Pio::new(p.PIO0, Pio0Irqs);
/// let pins = [common.make_pio_pin(p.PIN_2), common.make_pio_pin(p.PIN_3), /* ... */];
/// let mut display = ParallelWs2812::new(&mut common, sm0, p.DMA_CH0, &pins, planes, DOOR)?;
/// ```
pub struct ParallelWs2812<'d, P: Instance, const S: usize, const PLANES: usize> {
    geometry: DoorGeometry,
    sm: StateMachine<'d, P, S>,
    dma: Peri<'d, AnyChannel>,
    planes: &'d mut [u32; PLANES],
}

impl<'d, P: Instance, const S: usize, const PLANES: usize> ParallelWs2812<'d, P, S, PLANES> {
    /// Load the program and configure `sm` to drive `pins` (which must be consecutive GPIOs,
    /// one per bank, in bank order). The state machine starts on
    /// [`begin`](DisplayDriver::begin).
    ///
    /// # Errors
    ///
    /// Returns an error if the pin count, bank count, or `PLANES` do not fit `geometry`.
    pub fn new(
        common: &mut Common<'d, P>,
        mut sm: StateMachine<'d, P, S>,
        dma: Peri<'d, impl Channel>,
        pins: &[Pin<'d, P>],
        planes: &'d mut [u32; PLANES],
        geometry: DoorGeometry,
    ) -> Result<Self> {
        if geometry.num_banks() > MAX_BANKS {
            return Err(Error::TooManyBanks(geometry.num_banks()));
        }
        if pins.len() != geometry.num_banks() {
            return Err(Error::BankPinCount {
                expected: geometry.num_banks(),
                actual: pins.len(),
            });
        }
        if PLANES != geometry.bit_plane_len() {
            return Err(Error::BufferLengthMismatch {
                expected: geometry.bit_plane_len(),
                actual: PLANES,
            });
        }

        let program = load_parallel_ws2812_program(common);
        let pin_refs: Vec<&Pin<'d, P>, MAX_BANKS> = pins.iter().collect();

        let mut cfg = Config::default();
        cfg.set_out_pins(&pin_refs);
        cfg.use_program(&program, &[]);

        let clock_freq = U24F8::from_num(clk_sys_freq() / 1000);
        let ws2812_freq = U24F8::from_num(800);
        let bit_freq = ws2812_freq * CYCLES_PER_BIT;
        cfg.clock_divider = clock_freq / bit_freq;

        cfg.fifo_join = FifoJoin::TxOnly;
        cfg.shift_out = ShiftConfig {
            auto_fill: true,
            threshold: 32,
            direction: ShiftDirection::Left,
        };

        sm.set_config(&cfg);
        sm.set_pin_dirs(Direction::Out, &pin_refs);

        Ok(Self {
            geometry,
            sm,
            dma: dma.into(),
            planes,
        })
    }
}

impl<P: Instance, const S: usize, const PLANES: usize, const LEN: usize> DisplayDriver<LEN>
    for ParallelWs2812<'_, P, S, PLANES>
{
    fn begin(&mut self) -> Result<()> {
        self.planes.fill(0);
        self.sm.set_enable(true);
        door_info!(
            "Parallel WS2812 output started: {} banks of {} LEDs",
            self.geometry.num_banks(),
            self.geometry.strip_length()
        );
        Ok(())
    }

    async fn show(&mut self, buffer: &PixelBuffer<LEN>) -> Result<()> {
        buffer.check_geometry(&self.geometry)?;
        fill_bit_planes(&self.geometry, buffer.as_slice(), self.planes.as_mut_slice())?;
        self.sm
            .tx()
            .dma_push(self.dma.reborrow(), self.planes.as_slice(), false)
            .await;
        Timer::after_micros(LATCH_MICROS).await;
        Ok(())
    }
}
