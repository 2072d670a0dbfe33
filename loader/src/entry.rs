use core::{
    arch::global_asm,
    sync::atomic::{AtomicUsize, Ordering},
};

use config::{
    device::MAX_HARTS,
    mm::{BOOT_STACK_SIZE, HART_STACK_SHIFT, HART_STACK_SIZE},
};

use crate::{
    boot,
    layout::{StackTops, hart_stack_tops},
};

#[repr(C, align(16))]
pub struct HartStacks([[u8; HART_STACK_SIZE]; MAX_HARTS]);

/// One stack slot per hart. The loader runs on the lower part; the top
/// part belongs to the machine trap vector.
#[unsafe(link_section = ".hart_stacks")]
pub static mut HART_STACKS: HartStacks = HartStacks([[0; HART_STACK_SIZE]; MAX_HARTS]);

/// First hart to increment this becomes the boot hart.
static HART_LOTTERY: AtomicUsize = AtomicUsize::new(0);

// a0 = hart id, a1 = device tree, as left by the previous stage.
// Harts without a stack park right away.
global_asm!(
    ".pushsection .text.entry, \"ax\"",
    ".global _start",
    "_start:",
    "   csrr    a0, mhartid",
    "   li      t0, {max_harts}",
    "   bgeu    a0, t0, 2f",
    "   la      sp, {stacks}",
    "   slli    t0, a0, {stack_shift}",
    "   add     sp, sp, t0",
    "   li      t0, {boot_stack}",
    "   add     sp, sp, t0",
    "   call    {rust_entry}",
    "2:",
    "   la      t0, 3f",
    "   csrw    mtvec, t0",
    ".align 2",
    "3:",
    "   wfi",
    "   unimp",
    "   j       3b",
    ".popsection",
    max_harts = const MAX_HARTS,
    stacks = sym HART_STACKS,
    stack_shift = const HART_STACK_SHIFT,
    boot_stack = const BOOT_STACK_SIZE,
    rust_entry = sym rust_entry,
);

extern "C" fn rust_entry(hart_id: usize, dtb: usize) -> ! {
    if HART_LOTTERY.fetch_add(1, Ordering::AcqRel) == 0 {
        boot::boot_loader(hart_id, dtb)
    } else {
        boot::boot_other_hart(hart_id)
    }
}

/// Stack tops inside the slot of `hart_id`.
pub fn stack_tops(hart_id: usize) -> StackTops {
    hart_stack_tops(&raw const HART_STACKS as usize, hart_id)
}
