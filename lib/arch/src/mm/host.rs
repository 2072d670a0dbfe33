/// # Safety
/// Has no effect off-target.
pub unsafe fn enable_paging(satp: usize) {
    log::trace!("host: satp {satp:#x} ignored");
}
