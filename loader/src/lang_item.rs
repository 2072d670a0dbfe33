use core::panic::PanicInfo;

use arch::hart::{hart_id, park};
use driver::println;

#[panic_handler]
fn panic_handler(info: &PanicInfo) -> ! {
    println!("[hart {}] {}", hart_id(), info);
    park()
}
