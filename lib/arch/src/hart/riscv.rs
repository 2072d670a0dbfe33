use core::arch::asm;

use riscv::register::mhartid;

/// Id of the executing hart. Re-read on every call, never cached.
pub fn hart_id() -> usize {
    mhartid::read()
}

/// Parks the executing hart forever.
///
/// The trap vector is pointed at the wait loop itself, so an interrupt that
/// wakes the hart, or the deliberate illegal instruction executed when `wfi`
/// retires early, lands back in the loop.
pub fn park() -> ! {
    unsafe {
        asm!(
            "la     {tmp}, 2f",
            "csrw   mtvec, {tmp}",
            ".align 2",
            "2:",
            "wfi",
            "unimp",
            "j      2b",
            tmp = out(reg) _,
            options(noreturn),
        )
    }
}
