pub use super::consts::*;

/// # Safety
/// Has no effect off-target.
pub unsafe fn init_machine_trap(_vector: usize, _scratch: usize) {}

/// # Safety
/// Has no effect off-target.
pub unsafe fn open_pmp() {}

/// # Safety
/// Has no effect off-target.
pub unsafe fn delegate_traps(_exceptions: usize, _interrupts: usize) {}

pub fn mtval() -> usize {
    0
}

/// # Safety
/// Has no effect off-target.
pub unsafe fn set_mepc(_pc: usize) {}
