//! Build-time choices about how control is handed to the payload.

/// Privilege level the payload is entered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootMode {
    /// Payload runs in machine mode and receives the call-vector table.
    Machine,
    /// Payload runs in supervisor mode with translation enabled.
    Supervisor,
}

#[cfg(feature = "machine-mode")]
pub const BOOT_MODE: BootMode = BootMode::Machine;
#[cfg(not(feature = "machine-mode"))]
pub const BOOT_MODE: BootMode = BootMode::Supervisor;

/// Dump the filtered device tree before publishing the entry point.
pub const PRINT_DEVICE_TREE: bool = cfg!(feature = "print-device-tree");

/// Print the boot banner.
pub const SHOW_LOGO: bool = cfg!(feature = "logo");
