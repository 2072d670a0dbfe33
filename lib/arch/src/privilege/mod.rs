//! Non-returning transfers of control to the payload.
//!
//! Both transfers go through `mret`: `mstatus.MPP` selects the privilege the
//! payload runs at and `mstatus.MPIE` is cleared so that it starts with
//! machine interrupts disabled. Arguments travel in `a0`..`a3`.

/// `mstatus.MPP`
pub const MSTATUS_MPP: usize = 3 << 11;
/// `mstatus.MPP` holding supervisor mode
pub const MSTATUS_MPP_S: usize = 1 << 11;
/// `mstatus.MPP` holding machine mode
pub const MSTATUS_MPP_M: usize = 3 << 11;
/// `mstatus.MPIE`
pub const MSTATUS_MPIE: usize = 1 << 7;

cfg_if::cfg_if! {
    if #[cfg(any(target_arch = "riscv32", target_arch = "riscv64"))] {
        mod riscv;
        pub use riscv::*;
    } else {
        mod host;
        pub use host::*;
    }
}
