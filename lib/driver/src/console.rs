use core::fmt::{self, Write};

use spin::{Mutex, Once};

use crate::{CharDevice, uart::Uart16550};

static CONSOLE: Once<Mutex<Uart16550>> = Once::new();

/// Makes the UART at `base` the console. Later calls are ignored.
///
/// # Safety
/// See [`Uart16550::new`].
pub unsafe fn init_uart16550(base: usize) {
    CONSOLE.call_once(|| Mutex::new(unsafe { Uart16550::new(base) }));
}

/// Writes one byte to the console. Dropped while there is no console.
pub fn console_putchar(c: u8) {
    if let Some(console) = CONSOLE.get() {
        console.lock().put(c);
    }
}

/// Reads one byte from the console without waiting.
pub fn console_getchar() -> Option<u8> {
    CONSOLE.get().and_then(|console| console.lock().get())
}

struct Stdout;

impl Write for Stdout {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        if let Some(console) = CONSOLE.get() {
            write_crlf(&mut *console.lock(), s);
        }
        Ok(())
    }
}

/// Writes `s` to `device`, sending `\r\n` for every `\n`.
fn write_crlf<D: CharDevice + ?Sized>(device: &mut D, s: &str) {
    for line in s.split_inclusive('\n') {
        match line.strip_suffix('\n') {
            Some(body) => {
                device.puts(body.as_bytes());
                device.puts(b"\r\n");
            }
            None => device.puts(line.as_bytes()),
        }
    }
}

pub fn console_print(args: fmt::Arguments<'_>) {
    static PRINT_MUTEX: Mutex<()> = Mutex::new(());
    let _lock = PRINT_MUTEX.lock();
    // Stdout never fails.
    let _ = Stdout.write_fmt(args);
}

#[macro_export]
macro_rules! print {
    ($fmt: literal $(, $($arg: tt)+)?) => {
        $crate::console::console_print(format_args!($fmt $(, $($arg)+)?))
    }
}

#[macro_export]
macro_rules! println {
    ($fmt: literal $(, $($arg: tt)+)?) => {
        $crate::console::console_print(format_args!(concat!($fmt, "\n") $(, $($arg)+)?))
    }
}
