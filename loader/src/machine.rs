//! Machine-mode services: per-hart setup, the trap path serving the
//! payload, and the call vector handed to machine-mode payloads.

use arch::{
    hart::park,
    trap::{
        CAUSE_ILLEGAL_INSTRUCTION, CAUSE_INTERRUPT, CAUSE_MACHINE_ECALL, CAUSE_SUPERVISOR_ECALL,
        SUPERVISOR_EXCEPTIONS, SUPERVISOR_INTERRUPTS, delegate_traps, init_machine_trap, mtval,
        open_pmp, set_mepc,
    },
};
use config::{
    board::{BOOT_MODE, BootMode},
    sbi::{ENOSYS, SBI_CONSOLE_GETCHAR, SBI_CONSOLE_PUTCHAR, SBI_SHUTDOWN},
};
use driver::console;

use crate::layout;

/// General-purpose registers saved by the trap vector, indexed by number.
#[repr(C)]
#[derive(Debug, Default)]
pub struct TrapFrame {
    pub regs: [usize; 32],
}

impl TrapFrame {
    const A0: usize = 10;
    const A7: usize = 17;
}

/// Entry points a machine-mode payload calls directly, in place of the
/// `ecall`s a supervisor-mode payload would make.
#[repr(C)]
pub struct CallVector {
    pub trap: extern "C" fn(&mut TrapFrame, usize, usize),
    pub illegal_insn: extern "C" fn(&mut TrapFrame, usize, usize),
    pub console_putchar: extern "C" fn(usize),
    pub console_getchar: extern "C" fn() -> isize,
}

#[unsafe(link_section = ".rodata.call_vector")]
pub static CALL_VECTOR: CallVector = CallVector {
    trap: mcall_trap,
    illegal_insn: illegal_insn_trap,
    console_putchar: call_console_putchar,
    console_getchar: call_console_getchar,
};

extern "C" fn call_console_putchar(c: usize) {
    console::console_putchar(c as u8);
}

/// Next console byte, or -1 when none is waiting.
extern "C" fn call_console_getchar() -> isize {
    console::console_getchar().map_or(-1, isize::from)
}

#[derive(Debug, PartialEq, Eq)]
enum McallOutcome {
    Return(isize),
    Shutdown,
}

fn handle_mcall(which: usize, arg0: usize) -> McallOutcome {
    match which {
        SBI_CONSOLE_PUTCHAR => {
            call_console_putchar(arg0);
            McallOutcome::Return(0)
        }
        SBI_CONSOLE_GETCHAR => McallOutcome::Return(call_console_getchar()),
        SBI_SHUTDOWN => McallOutcome::Shutdown,
        _ => McallOutcome::Return(ENOSYS),
    }
}

/// Serves an environment call: `a7` selects the call, `a0` carries the
/// argument and receives the result. Execution resumes after the `ecall`.
pub extern "C" fn mcall_trap(frame: &mut TrapFrame, _mcause: usize, mepc: usize) {
    match handle_mcall(frame.regs[TrapFrame::A7], frame.regs[TrapFrame::A0]) {
        McallOutcome::Return(ret) => {
            frame.regs[TrapFrame::A0] = ret as usize;
            unsafe { set_mepc(mepc + 4) };
        }
        McallOutcome::Shutdown => {
            log::info!("shutdown requested");
            park()
        }
    }
}

/// Reports an instruction the payload could not execute and parks the hart.
pub extern "C" fn illegal_insn_trap(_frame: &mut TrapFrame, _mcause: usize, mepc: usize) {
    log::error!("illegal instruction {:#x} at {:#x}", mtval(), mepc);
    park()
}

/// Rust side of the machine trap vector.
pub extern "C" fn machine_trap(frame: &mut TrapFrame, mcause: usize, mepc: usize) {
    match mcause {
        CAUSE_SUPERVISOR_ECALL | CAUSE_MACHINE_ECALL => mcall_trap(frame, mcause, mepc),
        CAUSE_ILLEGAL_INSTRUCTION => illegal_insn_trap(frame, mcause, mepc),
        cause if cause & CAUSE_INTERRUPT != 0 => {
            log::warn!("unexpected interrupt {:#x}", cause & !CAUSE_INTERRUPT);
        }
        cause => {
            log::error!(
                "unhandled trap {} at {:#x}, mtval {:#x}",
                cause,
                mepc,
                mtval()
            );
            park()
        }
    }
}

/// Prepares the executing hart for handing control to the payload.
pub fn init_hart(hart_id: usize) {
    let stacks = layout::stack_tops(hart_id);
    log::trace!(
        "hart {}: boot stack top {:#x}, trap stack top {:#x}",
        hart_id,
        stacks.boot,
        stacks.trap
    );
    unsafe {
        open_pmp();
        init_machine_trap(trap_vector(), stacks.trap);
        if BOOT_MODE == BootMode::Supervisor {
            delegate_traps(SUPERVISOR_EXCEPTIONS, SUPERVISOR_INTERRUPTS);
        }
    }
}

cfg_if::cfg_if! {
    if #[cfg(all(target_os = "none", any(target_arch = "riscv32", target_arch = "riscv64")))] {
        use core::{arch::global_asm, mem::size_of};

        cfg_if::cfg_if! {
            if #[cfg(target_arch = "riscv64")] {
                macro_rules! store { () => { "sd" } }
                macro_rules! load { () => { "ld" } }
            } else {
                macro_rules! store { () => { "sw" } }
                macro_rules! load { () => { "lw" } }
            }
        }

        // Saves the interrupted registers on the mscratch stack, calls
        // `machine_trap(frame, mcause, mepc)` and restores them.
        global_asm!(
            ".pushsection .text.trap, \"ax\"",
            ".align 2",
            ".global machine_trap_vector",
            "machine_trap_vector:",
            "   csrrw   sp, mscratch, sp",
            "   addi    sp, sp, -{frame}",
            ".irp n, 1,3,4,5,6,7,8,9,10,11,12,13,14,15,16,17,18,19,20,21,22,23,24,25,26,27,28,29,30,31",
            concat!("   ", store!(), "  x\\n, \\n*{xlen}(sp)"),
            ".endr",
            "   csrr    t0, mscratch",
            concat!("   ", store!(), "  t0, 2*{xlen}(sp)"),
            "   mv      a0, sp",
            "   csrr    a1, mcause",
            "   csrr    a2, mepc",
            "   call    {handler}",
            ".irp n, 1,3,4,5,6,7,8,9,10,11,12,13,14,15,16,17,18,19,20,21,22,23,24,25,26,27,28,29,30,31",
            concat!("   ", load!(), "  x\\n, \\n*{xlen}(sp)"),
            ".endr",
            "   addi    sp, sp, {frame}",
            "   csrrw   sp, mscratch, sp",
            "   mret",
            ".popsection",
            frame = const size_of::<TrapFrame>(),
            xlen = const size_of::<usize>(),
            handler = sym machine_trap,
        );

        unsafe extern "C" {
            fn machine_trap_vector();
        }

        fn trap_vector() -> usize {
            machine_trap_vector as usize
        }
    } else {
        fn trap_vector() -> usize {
            0
        }
    }
}
