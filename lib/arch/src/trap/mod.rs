mod consts {
    /// Exception codes in `mcause`.
    pub const CAUSE_MISALIGNED_FETCH: usize = 0;
    pub const CAUSE_ILLEGAL_INSTRUCTION: usize = 2;
    pub const CAUSE_BREAKPOINT: usize = 3;
    pub const CAUSE_USER_ECALL: usize = 8;
    pub const CAUSE_SUPERVISOR_ECALL: usize = 9;
    pub const CAUSE_MACHINE_ECALL: usize = 11;
    pub const CAUSE_FETCH_PAGE_FAULT: usize = 12;
    pub const CAUSE_LOAD_PAGE_FAULT: usize = 13;
    pub const CAUSE_STORE_PAGE_FAULT: usize = 15;

    /// Supervisor software, timer and external interrupts.
    pub const IRQ_S_SOFT: usize = 1;
    pub const IRQ_S_TIMER: usize = 5;
    pub const IRQ_S_EXT: usize = 9;

    /// Exceptions a supervisor-mode payload handles itself.
    pub const SUPERVISOR_EXCEPTIONS: usize = (1 << CAUSE_MISALIGNED_FETCH)
        | (1 << CAUSE_BREAKPOINT)
        | (1 << CAUSE_USER_ECALL)
        | (1 << CAUSE_FETCH_PAGE_FAULT)
        | (1 << CAUSE_LOAD_PAGE_FAULT)
        | (1 << CAUSE_STORE_PAGE_FAULT);

    /// Interrupts a supervisor-mode payload handles itself.
    pub const SUPERVISOR_INTERRUPTS: usize =
        (1 << IRQ_S_SOFT) | (1 << IRQ_S_TIMER) | (1 << IRQ_S_EXT);

    /// `pmpcfg` byte: NAPOT region, readable, writable, executable.
    pub const PMP_NAPOT_RWX: usize = 0x1f;

    /// Set in `mcause` for interrupts.
    pub const CAUSE_INTERRUPT: usize = 1 << (usize::BITS - 1);
}

cfg_if::cfg_if! {
    if #[cfg(any(target_arch = "riscv32", target_arch = "riscv64"))] {
        mod riscv;
        pub use riscv::*;
    } else {
        mod host;
        pub use host::*;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delegation_masks() {
        assert_eq!(SUPERVISOR_EXCEPTIONS, 0xb109);
        assert_eq!(SUPERVISOR_INTERRUPTS, 0x222);
        assert_eq!(CAUSE_INTERRUPT.leading_zeros(), 0);
    }
}
