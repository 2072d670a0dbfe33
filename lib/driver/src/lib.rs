//! Devices the loader drives itself. Only the console so far.

#![cfg_attr(not(test), no_std)]

pub mod console;
pub mod uart;

pub use console::{console_getchar, console_print, console_putchar, init_uart16550};

/// A byte-oriented device usable as the console.
pub trait CharDevice: Send + Sync {
    /// Returns the next received byte, if one is waiting.
    fn get(&mut self) -> Option<u8>;

    /// Sends one byte, waiting until the device accepts it.
    fn put(&mut self, byte: u8);

    fn puts(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.put(byte);
        }
    }
}
