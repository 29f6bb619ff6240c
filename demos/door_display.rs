#![allow(missing_docs)]
#![no_std]
#![no_main]

use core::convert::Infallible;

use defmt::info;
use door_display::Result;
use door_display::bank_driver::parallel_ws2812::ParallelWs2812;
use door_display::door_layout::{DOOR, DOOR_BIT_PLANE_LEN, DOOR_BUFFER_LEN, PixelBuffer};
use door_display::frame_receiver::FrameReceiver;
use door_display::frame_receiver::serial_transport::{
    DOOR_RX_BUFFER_LEN, SERIAL_BAUD_DEFAULT, SerialTransport,
};
use door_display::irqs::{Pio0Irqs, Uart0Irqs};
use embassy_executor::Spawner;
use embassy_rp::pio::Pio;
use embassy_rp::uart::{BufferedUart, Config as UartConfig};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

static PIXELS: StaticCell<PixelBuffer<DOOR_BUFFER_LEN>> = StaticCell::new();
static BIT_PLANES: StaticCell<[u32; DOOR_BIT_PLANE_LEN]> = StaticCell::new();
static UART_TX: StaticCell<[u8; 16]> = StaticCell::new();
// Holds everything the host sends while a frame is being shown.
static UART_RX: StaticCell<[u8; DOOR_RX_BUFFER_LEN]> = StaticCell::new();

#[embassy_executor::main]
async fn main(spawner: Spawner) -> ! {
    let err = inner_main(spawner).await.unwrap_err();
    core::panic!("{err}");
}

async fn inner_main(_spawner: Spawner) -> Result<Infallible> {
    let p = embassy_rp::init(Default::default());

    let mut uart_config = UartConfig::default();
    uart_config.baudrate = SERIAL_BAUD_DEFAULT;
    let uart = BufferedUart::new(
        p.UART0,
        p.PIN_0,
        p.PIN_1,
        Uart0Irqs,
        UART_TX.init([0; 16]),
        UART_RX.init_with(|| [0; DOOR_RX_BUFFER_LEN]),
        uart_config,
    );
    let mut transport = SerialTransport::new(uart);

    // Banks 0..=12 on GPIO 2..=14, in bank order.
    let Pio { mut common, sm0, .. } = Pio::new(p.PIO0, Pio0Irqs);
    let pins = [
        common.make_pio_pin(p.PIN_2),
        common.make_pio_pin(p.PIN_3),
        common.make_pio_pin(p.PIN_4),
        common.make_pio_pin(p.PIN_5),
        common.make_pio_pin(p.PIN_6),
        common.make_pio_pin(p.PIN_7),
        common.make_pio_pin(p.PIN_8),
        common.make_pio_pin(p.PIN_9),
        common.make_pio_pin(p.PIN_10),
        common.make_pio_pin(p.PIN_11),
        common.make_pio_pin(p.PIN_12),
        common.make_pio_pin(p.PIN_13),
        common.make_pio_pin(p.PIN_14),
    ];
    let planes = BIT_PLANES.init_with(|| [0; DOOR_BIT_PLANE_LEN]);
    let mut display = ParallelWs2812::new(&mut common, sm0, p.DMA_CH0, &pins, planes, DOOR)?;

    let buffer = PIXELS.init_with(PixelBuffer::new);
    info!(
        "Door: {} LEDs, {} banks, frames of {} bytes",
        DOOR.real_num_leds(),
        DOOR.num_banks(),
        DOOR.frame_len()
    );

    let mut receiver = FrameReceiver::new(DOOR);
    receiver.start(buffer, &mut display).await?;
    receiver.run(&mut transport, buffer, &mut display).await
}
