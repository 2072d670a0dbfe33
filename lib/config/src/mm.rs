//! Module defining constants related to memory layout and address translation.

use strum::{EnumString, IntoStaticStr};

/// Start of physical memory
pub const RAM_START: usize = 0x8000_0000;
/// Physical base the payload is linked to run from. Must be aligned to the
/// leaf granule of every scheme (1 GiB).
pub const KERNEL_START_PHYS: usize = RAM_START;

/// Page size
pub const PAGE_SIZE: usize = 4096;
/// Width of page offset
pub const PAGE_OFFSET_WIDTH: usize = 12;
/// Offset of the physical page number inside a page table entry. Same for
/// Sv32, Sv39 and Sv48.
pub const PTE_PPN_OFFSET: usize = 10;

/// Megapage of the two-level 32-bit scheme
pub const SV32_MEGAPAGE_SIZE: usize = 4 * 1024 * 1024;
/// Megapage of the 64-bit schemes
pub const SV64_MEGAPAGE_SIZE: usize = 2 * 1024 * 1024;
/// Gigapage of the 64-bit schemes
pub const GIGAPAGE_SIZE: usize = 1024 * 1024 * 1024;

/// Virtual minus physical address of the payload under Sv32.
pub const SV32_VIRT_OFFSET: usize = 0x4000_0000;
/// Virtual minus physical address of the payload under Sv39 and Sv48.
/// `0x8000_0000` lands at `0xffff_ffff_c000_0000`.
pub const SV64_VIRT_OFFSET: u64 = 0xffff_ffff_4000_0000;

/// Root slot (Sv39) or root and intermediate slot (Sv48) of the kernel gigapage.
pub const KERNEL_SLOT: usize = 0o777;
/// Root slot pointing back at the root table as a next-level table.
pub const RECURSIVE_SLOT: usize = 0o774;
/// Root slot mapping the root table itself as read/write data.
pub const RECURSIVE_RW_SLOT: usize = 0o775;

/// log2 of the per-hart machine stack size
pub const HART_STACK_SHIFT: usize = 14;
/// Size of the per-hart machine stack
pub const HART_STACK_SIZE: usize = 1 << HART_STACK_SHIFT;
/// Top part of each hart's stack slot, used only by the machine trap vector
pub const MACHINE_TRAP_STACK_SIZE: usize = 4096;
/// Part of each hart's stack slot the loader itself runs on
pub const BOOT_STACK_SIZE: usize = HART_STACK_SIZE - MACHINE_TRAP_STACK_SIZE;

const _: () = assert!(MACHINE_TRAP_STACK_SIZE % 16 == 0 && BOOT_STACK_SIZE >= 4096);

/// Address-translation layout the loader builds for the payload.
///
/// Exactly one scheme is active per build, see [`PAGING_SCHEME`]. The
/// `strum` names are the `mmu-type` strings hart nodes declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr, EnumString)]
pub enum PagingScheme {
    /// 32-bit virtual addresses, two levels of 1024-entry tables.
    #[strum(serialize = "riscv,sv32")]
    Sv32,
    /// 39-bit virtual addresses, three levels of 512-entry tables.
    #[strum(serialize = "riscv,sv39")]
    Sv39,
    /// 48-bit virtual addresses, four levels of 512-entry tables.
    #[strum(serialize = "riscv,sv48")]
    Sv48,
}

impl PagingScheme {
    /// Megapage size, also the alignment of the relocated device tree.
    pub const fn megapage_size(self) -> usize {
        match self {
            Self::Sv32 => SV32_MEGAPAGE_SIZE,
            Self::Sv39 | Self::Sv48 => SV64_MEGAPAGE_SIZE,
        }
    }

    /// Offset added to a physical payload address to get its virtual address.
    pub const fn virt_offset(self) -> usize {
        match self {
            Self::Sv32 => SV32_VIRT_OFFSET,
            // Truncates on 32-bit targets, where the 64-bit schemes are never selected.
            Self::Sv39 | Self::Sv48 => SV64_VIRT_OFFSET as usize,
        }
    }

    /// Mode field of `satp`, already shifted into place.
    pub const fn satp_mode(self) -> usize {
        match self {
            Self::Sv32 => 1 << 31,
            Self::Sv39 => (8u64 << 60) as usize,
            Self::Sv48 => (9u64 << 60) as usize,
        }
    }

    /// Returns whether a hart declaring `mmu_type` can run under this scheme.
    ///
    /// An Sv48 hart also implements Sv39; Sv32 only exists on 32-bit harts.
    pub fn runs_on(self, mmu_type: &str) -> bool {
        let Ok(hart) = mmu_type.parse::<PagingScheme>() else {
            return false;
        };
        matches!(
            (self, hart),
            (Self::Sv32, Self::Sv32)
                | (Self::Sv39, Self::Sv39 | Self::Sv48)
                | (Self::Sv48, Self::Sv48)
        )
    }

    /// Name of the scheme as written in `mmu-type`.
    pub fn mmu_type(self) -> &'static str {
        self.into()
    }
}

#[cfg(all(feature = "sv32", any(feature = "sv39", feature = "sv48")))]
compile_error!("select exactly one of the `sv32`, `sv39` and `sv48` features");
#[cfg(all(feature = "sv39", feature = "sv48"))]
compile_error!("select exactly one of the `sv32`, `sv39` and `sv48` features");

cfg_if::cfg_if! {
    if #[cfg(feature = "sv32")] {
        /// Paging scheme selected for this build.
        pub const PAGING_SCHEME: PagingScheme = PagingScheme::Sv32;
    } else if #[cfg(feature = "sv48")] {
        /// Paging scheme selected for this build.
        pub const PAGING_SCHEME: PagingScheme = PagingScheme::Sv48;
    } else {
        /// Paging scheme selected for this build.
        pub const PAGING_SCHEME: PagingScheme = PagingScheme::Sv39;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kernel_slot_matches_virtual_base() {
        let va = (KERNEL_START_PHYS as u64).wrapping_add(SV64_VIRT_OFFSET);
        assert_eq!(va, 0xffff_ffff_c000_0000);
        assert_eq!((va >> 30) & 0x1ff, KERNEL_SLOT as u64);
        assert_eq!((va >> 39) & 0x1ff, KERNEL_SLOT as u64);
    }

    #[test]
    fn mmu_type_compatibility() {
        assert!(PagingScheme::Sv39.runs_on("riscv,sv39"));
        assert!(PagingScheme::Sv39.runs_on("riscv,sv48"));
        assert!(!PagingScheme::Sv48.runs_on("riscv,sv39"));
        assert!(PagingScheme::Sv32.runs_on("riscv,sv32"));
        assert!(!PagingScheme::Sv32.runs_on("riscv,sv39"));
        assert!(!PagingScheme::Sv39.runs_on("riscv,none"));
        assert_eq!(PagingScheme::Sv48.mmu_type(), "riscv,sv48");
    }

    #[test]
    fn megapage_follows_table_width() {
        assert_eq!(PagingScheme::Sv32.megapage_size(), PAGE_SIZE << 10);
        assert_eq!(PagingScheme::Sv39.megapage_size(), PAGE_SIZE << 9);
    }
}
