/// # Safety
/// Never returns; there is nothing to transfer to off-target.
pub unsafe fn enter_supervisor_mode(
    entry: usize,
    hart_id: usize,
    _dtb: usize,
    _live_harts: usize,
) -> ! {
    unimplemented!("hart {hart_id}: supervisor entry at {entry:#x} needs a RISC-V hart")
}

/// # Safety
/// Never returns; there is nothing to transfer to off-target.
pub unsafe fn enter_machine_mode(
    entry: usize,
    hart_id: usize,
    _dtb: usize,
    _live_harts: usize,
    _call_vector: usize,
) -> ! {
    unimplemented!("hart {hart_id}: machine entry at {entry:#x} needs a RISC-V hart")
}
