/// Highest number of harts the loader reserves stacks for. Harts with a
/// larger id park at reset.
pub const MAX_HARTS: usize = 8;

const _: () = assert!(MAX_HARTS <= usize::BITS as usize);

/// Compatible string of the UART used as the loader console.
pub const CONSOLE_COMPATIBLE: &str = "ns16550a";

/// Nodes declaring any of these compatible strings are removed from the
/// tree handed to the payload. The local timer and the debug module belong
/// to machine mode.
pub const BLOCKED_COMPATIBLES: &[&str] = &["riscv,clint0", "riscv,debug-013"];

/// Platform interrupt controllers whose machine-mode contexts are redacted.
pub const PLIC_COMPATIBLES: &[&str] = &["riscv,plic0"];

/// Interrupt cause of the machine external interrupt.
pub const IRQ_M_EXT: u32 = 11;

/// Value of `device_type` on hart nodes.
pub const CPU_DEVICE_TYPE: &str = "cpu";
/// `status` of a hart that may run the payload.
pub const HART_STATUS_OKAY: &str = "okay";
/// `status` written over harts the loader disables.
pub const HART_STATUS_MASKED: &str = "masked";

/// Properties under `/chosen` locating a preloaded payload.
pub const CHOSEN_KERNEL_START: &str = "riscv,kernel-start";
pub const CHOSEN_KERNEL_END: &str = "riscv,kernel-end";
