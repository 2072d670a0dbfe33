use riscv::register::satp::{self, Satp};

/// Enables address translation with the given `satp` value and drops any
/// stale translations.
///
/// # Safety
/// `satp` must name a root table that maps the code executing after this
/// call, or the caller must leave the current privilege level right away.
pub unsafe fn enable_paging(bits: usize) {
    unsafe {
        satp::write(Satp::from_bits(bits));
    }
    riscv::asm::sfence_vma_all();
}
