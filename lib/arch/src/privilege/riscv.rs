use core::arch::asm;

use super::{MSTATUS_MPIE, MSTATUS_MPP, MSTATUS_MPP_M, MSTATUS_MPP_S};

/// Enters `entry` in supervisor mode with
/// `a0 = hart_id`, `a1 = dtb`, `a2 = live_harts`.
///
/// # Safety
/// `entry` and `dtb` must be valid under the translation already enabled on
/// this hart.
pub unsafe fn enter_supervisor_mode(
    entry: usize,
    hart_id: usize,
    dtb: usize,
    live_harts: usize,
) -> ! {
    unsafe {
        asm!(
            "csrc   mstatus, {clear}",
            "csrs   mstatus, {set}",
            "csrw   mepc, {entry}",
            "mret",
            clear = in(reg) MSTATUS_MPP | MSTATUS_MPIE,
            set = in(reg) MSTATUS_MPP_S,
            entry = in(reg) entry,
            in("a0") hart_id,
            in("a1") dtb,
            in("a2") live_harts,
            options(noreturn),
        )
    }
}

/// Enters `entry` in machine mode with
/// `a0 = hart_id`, `a1 = dtb`, `a2 = live_harts`, `a3 = call_vector`.
///
/// # Safety
/// `entry` must be machine-mode code and `call_vector` the address of the
/// loader's call-vector table.
pub unsafe fn enter_machine_mode(
    entry: usize,
    hart_id: usize,
    dtb: usize,
    live_harts: usize,
    call_vector: usize,
) -> ! {
    unsafe {
        asm!(
            "csrc   mstatus, {clear}",
            "csrs   mstatus, {set}",
            "csrw   mepc, {entry}",
            "mret",
            clear = in(reg) MSTATUS_MPP | MSTATUS_MPIE,
            set = in(reg) MSTATUS_MPP_M,
            entry = in(reg) entry,
            in("a0") hart_id,
            in("a1") dtb,
            in("a2") live_harts,
            in("a3") call_vector,
            options(noreturn),
        )
    }
}
