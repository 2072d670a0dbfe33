use uart_16550::MmioSerialPort;

use crate::CharDevice;

/// A 16550-compatible UART behind memory-mapped registers.
pub struct Uart16550 {
    port: MmioSerialPort,
}

impl Uart16550 {
    /// Programs the UART at `base` for 38400 baud, 8N1, FIFO enabled.
    ///
    /// # Safety
    /// `base` must be the register block of a 16550-compatible UART that
    /// nothing else drives.
    pub unsafe fn new(base: usize) -> Self {
        let mut port = unsafe { MmioSerialPort::new(base) };
        port.init();
        log::trace!("uart16550 at {:#x}", base);
        Self { port }
    }
}

impl CharDevice for Uart16550 {
    fn get(&mut self) -> Option<u8> {
        self.port.try_receive().ok()
    }

    fn put(&mut self, byte: u8) {
        self.port.send_raw(byte);
    }
}
