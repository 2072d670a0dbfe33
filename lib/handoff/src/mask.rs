use config::device::MAX_HARTS;

/// Mask bit of `hart_id`, or zero when the id has no bit.
pub const fn hart_bit(hart_id: usize) -> usize {
    if hart_id < MAX_HARTS { 1 << hart_id } else { 0 }
}

/// Returns whether `hart_id` is in `mask`. Ids without a bit never are.
pub const fn is_set(mask: usize, hart_id: usize) -> bool {
    mask & hart_bit(hart_id) != 0
}

/// Harts that run the payload: present and not disabled.
pub const fn live_harts(present: usize, disabled: usize) -> usize {
    !disabled & present
}
