//! Addresses fixed by the linker script.
//!
//! Off-target builds have no such symbols; every region there is empty at
//! address zero.

#![cfg_attr(not(target_os = "none"), allow(dead_code))]

use config::mm::{BOOT_STACK_SIZE, HART_STACK_SIZE};

/// Stack tops inside the slot of one hart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackTops {
    /// Where `_start` points `sp`.
    pub boot: usize,
    /// Loaded into `mscratch`. Traps never touch the boot stack.
    pub trap: usize,
}

/// Splits the stack slot of `hart_id`, with the slots starting at `base`.
pub const fn hart_stack_tops(base: usize, hart_id: usize) -> StackTops {
    let slot = base + hart_id * HART_STACK_SIZE;
    StackTops {
        boot: slot + BOOT_STACK_SIZE,
        trap: slot + HART_STACK_SIZE,
    }
}

cfg_if::cfg_if! {
    if #[cfg(target_os = "none")] {
        unsafe extern "C" {
            static _loader_start: u8;
            static _payload_start: u8;
            static _payload_end: u8;
            static _end: u8;
        }

        pub fn loader_start() -> usize {
            &raw const _loader_start as usize
        }

        pub fn payload_start() -> usize {
            &raw const _payload_start as usize
        }

        pub fn payload_end() -> usize {
            &raw const _payload_end as usize
        }

        /// End of the loader image, embedded payload included.
        pub fn loader_end() -> usize {
            &raw const _end as usize
        }

        pub use crate::entry::stack_tops;
    } else {
        pub fn loader_start() -> usize {
            0
        }

        pub fn payload_start() -> usize {
            0
        }

        pub fn payload_end() -> usize {
            0
        }

        pub fn loader_end() -> usize {
            0
        }

        pub fn stack_tops(_hart_id: usize) -> StackTops {
            StackTops { boot: 0, trap: 0 }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::mm::MACHINE_TRAP_STACK_SIZE;

    #[test]
    fn trap_stack_sits_above_boot_stack() {
        let base = 0x8010_0000;
        let hart0 = hart_stack_tops(base, 0);
        let hart1 = hart_stack_tops(base, 1);
        assert_eq!(hart0.trap - hart0.boot, MACHINE_TRAP_STACK_SIZE);
        assert!(hart0.boot > base);
        // A trap frame pushed below `trap` stays above the running stack.
        assert!(hart0.trap - MACHINE_TRAP_STACK_SIZE >= hart0.boot);
        assert_eq!(hart0.trap, hart1.trap - HART_STACK_SIZE);
        assert!(hart1.boot - BOOT_STACK_SIZE >= hart0.trap);
        assert_eq!(hart1.boot % 16, 0);
    }
}
