//! Machine-mode trap configuration.

use core::arch::asm;

use riscv::register::{
    mepc, mscratch, mtval,
    mtvec::{self, Mtvec, TrapMode},
    pmpaddr0,
};

pub use super::consts::*;

/// Installs `vector` as the direct-mode machine trap vector and `scratch`
/// as the stack the vector switches to.
///
/// # Safety
/// `vector` must be a 4-byte aligned trap entry and `scratch` the top of a
/// stack owned by the executing hart.
pub unsafe fn init_machine_trap(vector: usize, scratch: usize) {
    let mut mtvec = Mtvec::from_bits(0);
    mtvec.set_address(vector);
    mtvec.set_trap_mode(TrapMode::Direct);
    unsafe {
        mtvec::write(mtvec);
        mscratch::write(scratch);
    }
}

/// Grants lower privilege levels read/write/execute access to the whole
/// physical address space through PMP entry 0.
///
/// # Safety
/// Must run in machine mode.
pub unsafe fn open_pmp() {
    unsafe {
        pmpaddr0::write(usize::MAX);
        asm!("csrw pmpcfg0, {}", in(reg) PMP_NAPOT_RWX);
    }
}

/// Hands the given exceptions and interrupts to supervisor mode.
///
/// # Safety
/// Must run in machine mode.
pub unsafe fn delegate_traps(exceptions: usize, interrupts: usize) {
    unsafe {
        asm!(
            "csrw medeleg, {exceptions}",
            "csrw mideleg, {interrupts}",
            exceptions = in(reg) exceptions,
            interrupts = in(reg) interrupts,
        );
    }
}

pub fn mtval() -> usize {
    mtval::read()
}

/// # Safety
/// The next `mret` resumes at `pc`.
pub unsafe fn set_mepc(pc: usize) {
    unsafe { mepc::write(pc) }
}
