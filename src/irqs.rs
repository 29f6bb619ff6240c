//! Internal interrupt bindings shared by the output driver and the serial link.

#![cfg(not(feature = "host"))]

::embassy_rp::bind_interrupts! {
    pub struct Pio0Irqs {
        PIO0_IRQ_0 => ::embassy_rp::pio::InterruptHandler<::embassy_rp::peripherals::PIO0>;
    }
}

::embassy_rp::bind_interrupts! {
    pub struct Uart0Irqs {
        UART0_IRQ => ::embassy_rp::uart::BufferedInterruptHandler<::embassy_rp::peripherals::UART0>;
    }
}
