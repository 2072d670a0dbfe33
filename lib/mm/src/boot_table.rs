//! Boot page tables handed to a supervisor-mode payload.
//!
//! Each scheme maps the payload's physical load region at a fixed high
//! virtual base:
//!
//! - Sv32: one megapage leaf per 4 MiB block from the payload base up to the
//!   end of the relocated device tree, at `pa + 0x4000_0000`.
//! - Sv39: one gigapage leaf `0x8000_0000 -> 0xffff_ffff_c000_0000` in root
//!   slot `0o777`, plus recursive entries in slots `0o774` (pointer) and
//!   `0o775` (read/write) so the payload can later edit its own tables.
//! - Sv48: as Sv39, with root slot `0o777` pointing at an intermediate table
//!   whose slot `0o777` holds the gigapage leaf.

use config::mm::{
    GIGAPAGE_SIZE, KERNEL_SLOT, PAGE_OFFSET_WIDTH, PagingScheme, RECURSIVE_RW_SLOT,
    RECURSIVE_SLOT, SV32_MEGAPAGE_SIZE, SV32_VIRT_OFFSET,
};

use crate::{
    page_table::{Sv32Table, Sv64Table},
    pte::{PageTableEntry, Pte32, Pte64, PteFlags},
};

/// Flags of the payload mapping.
const KERNEL_FLAGS: PteFlags = PteFlags::R
    .union(PteFlags::W)
    .union(PteFlags::X)
    .union(PteFlags::A)
    .union(PteFlags::D);

/// Flags of the read/write recursive entry.
const RECURSIVE_RW_FLAGS: PteFlags = PteFlags::R
    .union(PteFlags::W)
    .union(PteFlags::A)
    .union(PteFlags::D);

/// Physical region the boot tables must cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KernelLayout {
    /// Physical base of the payload.
    pub phys_start: usize,
    /// End of the relocated device tree. Only the Sv32 layout maps up to it;
    /// the gigapage of the 64-bit layouts covers it implicitly.
    pub map_end: usize,
}

/// Fills `root` with the Sv32 layout.
pub fn build_sv32(root: &mut Sv32Table, layout: &KernelLayout) {
    let mut pa = layout.phys_start & !(SV32_MEGAPAGE_SIZE - 1);
    while pa < layout.map_end {
        let slot = (pa as u64 + SV32_VIRT_OFFSET as u64) / SV32_MEGAPAGE_SIZE as u64;
        if slot >= root.entries().len() as u64 {
            log::warn!("sv32: {pa:#x} does not fit below 4 GiB, mapping stops");
            break;
        }
        root[slot as usize] = Pte32::new(pa >> PAGE_OFFSET_WIDTH, KERNEL_FLAGS);
        pa += SV32_MEGAPAGE_SIZE;
    }
    log::debug!(
        "sv32: mapped {:#x}..{:#x} at +{:#x}",
        layout.phys_start,
        pa,
        SV32_VIRT_OFFSET
    );
}

/// Fills `root` with the Sv39 layout.
pub fn build_sv39(root: &mut Sv64Table, layout: &KernelLayout) {
    root[KERNEL_SLOT] = kernel_gigapage(layout);
    install_recursive(root);
    log::debug!("sv39: kernel gigapage in slot {KERNEL_SLOT:#o}");
}

/// Fills `root` and `intermediate` with the Sv48 layout.
pub fn build_sv48(root: &mut Sv64Table, intermediate: &mut Sv64Table, layout: &KernelLayout) {
    root[KERNEL_SLOT] = Pte64::pointer(intermediate.ppn());
    intermediate[KERNEL_SLOT] = kernel_gigapage(layout);
    install_recursive(root);
    log::debug!("sv48: kernel gigapage in slot {KERNEL_SLOT:#o} of the intermediate table");
}

fn kernel_gigapage(layout: &KernelLayout) -> Pte64 {
    debug_assert_eq!(
        layout.phys_start % GIGAPAGE_SIZE,
        0,
        "payload base must be gigapage aligned"
    );
    Pte64::new(layout.phys_start >> PAGE_OFFSET_WIDTH, KERNEL_FLAGS)
}

fn install_recursive(root: &mut Sv64Table) {
    let root_ppn = root.ppn();
    root[RECURSIVE_SLOT] = Pte64::pointer(root_ppn);
    root[RECURSIVE_RW_SLOT] = Pte64::new(root_ppn, RECURSIVE_RW_FLAGS);
}

/// The boot tables of the scheme selected for this build.
///
/// Only one variant is ever constructed per build; which one is decided by
/// the `sv32`/`sv39`/`sv48` features, never by probing the hardware.
pub enum BootPageTables<'a> {
    Sv32 {
        root: &'a mut Sv32Table,
    },
    Sv39 {
        root: &'a mut Sv64Table,
    },
    Sv48 {
        root: &'a mut Sv64Table,
        intermediate: &'a mut Sv64Table,
    },
}

impl BootPageTables<'_> {
    pub fn scheme(&self) -> PagingScheme {
        match self {
            Self::Sv32 { .. } => PagingScheme::Sv32,
            Self::Sv39 { .. } => PagingScheme::Sv39,
            Self::Sv48 { .. } => PagingScheme::Sv48,
        }
    }

    /// Replaces whatever the tables held with the layout of the variant.
    /// Called by the boot hart before any hart enables translation.
    pub fn build(&mut self, layout: &KernelLayout) {
        match self {
            Self::Sv32 { root } => {
                root.clear();
                build_sv32(root, layout);
            }
            Self::Sv39 { root } => {
                root.clear();
                build_sv39(root, layout);
            }
            Self::Sv48 { root, intermediate } => {
                root.clear();
                intermediate.clear();
                build_sv48(root, intermediate, layout);
            }
        }
    }

    /// Physical page number of the root table.
    pub fn root_ppn(&self) -> usize {
        match self {
            Self::Sv32 { root } => root.ppn(),
            Self::Sv39 { root } | Self::Sv48 { root, .. } => root.ppn(),
        }
    }

    /// Value to write to `satp` to enable these tables.
    pub fn satp(&self) -> usize {
        self.scheme().satp_mode() | self.root_ppn()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::mm::{KERNEL_START_PHYS, SV64_VIRT_OFFSET};

    const RWX: PteFlags = PteFlags::RWX_MASK;

    fn layout(map_end: usize) -> KernelLayout {
        KernelLayout {
            phys_start: KERNEL_START_PHYS,
            map_end,
        }
    }

    fn assert_recursive(root: &Sv64Table) {
        let ptr = root[RECURSIVE_SLOT];
        assert!(ptr.is_pointer());
        assert_eq!(ptr.ppn(), root.ppn());
        let rw = root[RECURSIVE_RW_SLOT];
        assert!(rw.is_leaf());
        assert_eq!(rw.ppn(), root.ppn());
        assert_eq!(rw.permissions(), PteFlags::R | PteFlags::W);
    }

    #[test]
    fn sv32_maps_up_to_device_tree_end() {
        let mut root = Box::new(Sv32Table::empty());
        // Device tree placed at the third megapage, ending inside it.
        build_sv32(&mut root, &layout(0x8080_0000 + 0x2000));

        let first = (KERNEL_START_PHYS + SV32_VIRT_OFFSET) / SV32_MEGAPAGE_SIZE;
        assert_eq!(first, 768);
        for i in 0..3 {
            let pte = root[first + i];
            assert!(pte.is_leaf());
            assert_eq!(pte.permissions(), RWX);
            assert_eq!(pte.ppn(), (KERNEL_START_PHYS + i * SV32_MEGAPAGE_SIZE) >> 12);
        }
        assert_eq!(root.valid_entries().count(), 3);
    }

    #[test]
    fn sv32_maps_boundary_megapage_once() {
        let mut root = Box::new(Sv32Table::empty());
        build_sv32(&mut root, &layout(0x8040_0000));
        assert_eq!(root.valid_entries().count(), 1);
        assert_eq!(root[768].ppn(), 0x80000);
    }

    #[test]
    fn sv39_gigapage_and_recursive_slots() {
        let mut root = Box::new(Sv64Table::empty());
        build_sv39(&mut root, &layout(0));

        let leaf = root[KERNEL_SLOT];
        assert!(leaf.is_leaf());
        assert_eq!(leaf.ppn(), 0x80000);
        assert_eq!(leaf.permissions(), RWX);
        assert_recursive(&root);
        assert_eq!(root.valid_entries().count(), 3);

        let va = (KERNEL_START_PHYS as u64).wrapping_add(SV64_VIRT_OFFSET);
        assert_eq!(((va >> 30) & 0x1ff) as usize, KERNEL_SLOT);
    }

    #[test]
    fn sv48_goes_through_intermediate_table() {
        let mut root = Box::new(Sv64Table::empty());
        let mut p3 = Box::new(Sv64Table::empty());
        build_sv48(&mut root, &mut p3, &layout(0));

        let top = root[KERNEL_SLOT];
        assert!(top.is_pointer());
        assert_eq!(top.ppn(), p3.ppn());

        let leaf = p3[KERNEL_SLOT];
        assert!(leaf.is_leaf());
        assert_eq!(leaf.ppn(), 0x80000);
        assert_eq!(leaf.permissions(), RWX);
        assert_eq!(p3.valid_entries().count(), 1);

        assert_recursive(&root);
    }

    #[test]
    fn variant_reports_scheme_and_satp() {
        let mut root = Box::new(Sv64Table::empty());
        let mut p3 = Box::new(Sv64Table::empty());
        let root_ppn = root.ppn();
        let mut tables = BootPageTables::Sv48 {
            root: &mut root,
            intermediate: &mut p3,
        };
        tables.build(&layout(0));
        assert_eq!(tables.scheme(), PagingScheme::Sv48);
        assert_eq!(tables.root_ppn(), root_ppn);
        assert_eq!(tables.satp(), (9usize << 60) | root_ppn);
    }

    #[test]
    fn rebuilding_drops_previous_mappings() {
        let mut root = Box::new(Sv32Table::empty());
        let mut tables = BootPageTables::Sv32 { root: &mut root };
        tables.build(&layout(0x80c0_0000));
        tables.build(&layout(0x8000_1000));
        drop(tables);
        assert_eq!(root.valid_entries().count(), 1);
        assert!(root[768].is_leaf());
    }

    #[test]
    fn variant_dispatches_sv32_builder() {
        let mut root = Box::new(Sv32Table::empty());
        let mut tables = BootPageTables::Sv32 { root: &mut root };
        tables.build(&layout(0x8000_1000));
        assert_eq!(tables.satp() & (1 << 31), 1 << 31);
        drop(tables);
        assert!(root[768].is_leaf());
    }
}
