//! Module for page table entries.
//!
//! This module provides the [`PageTableEntry`] trait with two encodings: the
//! 32-bit entry of Sv32 and the 64-bit entry shared by Sv39 and Sv48. Both
//! keep the flags in the low byte and the physical page number from bit 10.

use core::{fmt::Debug, ops::Range};

use bit_field::BitField;
use bitflags::bitflags;

use config::mm::PTE_PPN_OFFSET;

bitflags! {
    /// Flags for a page table entry.
    ///
    /// - `V`: Valid. When set, the PTE is valid. If one of the R, W, or X bits
    ///   is set, the PTE points to a physical page. Otherwise, the PTE points
    ///   to a next-level page table.
    /// - `R`, `W`, `X`: Read, write and execute permission of a leaf.
    /// - `U`: User. Accessible in user mode.
    /// - `G`: Global. Mapped in all address spaces.
    /// - `A`, `D`: Accessed and dirty. Set up front on boot mappings so that
    ///   harts without hardware A/D updates do not fault on first use.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PteFlags: u8 {
        const V = 1 << 0;
        const R = 1 << 1;
        const W = 1 << 2;
        const X = 1 << 3;
        const U = 1 << 4;
        const G = 1 << 5;
        const A = 1 << 6;
        const D = 1 << 7;

        /// Bits granting access permissions.
        const RWX_MASK = Self::R.bits() | Self::W.bits() | Self::X.bits();
    }
}

/// A page table entry of one of the supported schemes.
pub trait PageTableEntry: Copy + Debug {
    /// The invalid (unmapped) entry.
    const INVALID: Self;
    /// Width in bits of the physical page number field.
    const PPN_WIDTH: usize;

    /// Creates a valid entry for `ppn`. `V` is always added to `flags`.
    fn new(ppn: usize, flags: PteFlags) -> Self;

    /// Returns the physical page number in the entry.
    fn ppn(self) -> usize;

    /// Returns the flags in the entry.
    fn flags(self) -> PteFlags;

    /// Creates a pointer to a next-level table at `ppn`.
    fn pointer(ppn: usize) -> Self {
        Self::new(ppn, PteFlags::empty())
    }

    /// Bits of the physical page number field.
    fn ppn_bits() -> Range<usize> {
        PTE_PPN_OFFSET..PTE_PPN_OFFSET + Self::PPN_WIDTH
    }

    /// Returns whether the entry is valid.
    fn is_valid(self) -> bool {
        self.flags().contains(PteFlags::V)
    }

    /// Returns whether the entry maps memory, as opposed to pointing at a table.
    fn is_leaf(self) -> bool {
        self.is_valid() && self.flags().intersects(PteFlags::RWX_MASK)
    }

    /// Returns whether the entry points at a next-level table.
    fn is_pointer(self) -> bool {
        self.is_valid() && !self.flags().intersects(PteFlags::RWX_MASK)
    }

    /// Returns the permission bits of the entry.
    fn permissions(self) -> PteFlags {
        self.flags() & PteFlags::RWX_MASK
    }
}

/// A page table entry defined in Sv32: 22-bit physical page number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(transparent)]
pub struct Pte32 {
    bits: u32,
}

/// A page table entry defined in Sv39 and Sv48: 44-bit physical page number,
/// upper 10 bits reserved and kept zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(transparent)]
pub struct Pte64 {
    bits: u64,
}

impl Pte32 {
    pub fn bits(self) -> u32 {
        self.bits
    }
}

impl Pte64 {
    pub fn bits(self) -> u64 {
        self.bits
    }
}

impl PageTableEntry for Pte32 {
    const INVALID: Self = Self { bits: 0 };
    const PPN_WIDTH: usize = 22;

    fn new(ppn: usize, flags: PteFlags) -> Self {
        let mask = (1u32 << Self::PPN_WIDTH) - 1;
        let mut bits = (flags | PteFlags::V).bits() as u32;
        bits.set_bits(Self::ppn_bits(), ppn as u32 & mask);
        Self { bits }
    }

    fn ppn(self) -> usize {
        self.bits.get_bits(Self::ppn_bits()) as usize
    }

    fn flags(self) -> PteFlags {
        PteFlags::from_bits_truncate(self.bits as u8)
    }
}

impl PageTableEntry for Pte64 {
    const INVALID: Self = Self { bits: 0 };
    const PPN_WIDTH: usize = 44;

    fn new(ppn: usize, flags: PteFlags) -> Self {
        let mask = (1u64 << Self::PPN_WIDTH) - 1;
        let mut bits = (flags | PteFlags::V).bits() as u64;
        bits.set_bits(Self::ppn_bits(), ppn as u64 & mask);
        Self { bits }
    }

    fn ppn(self) -> usize {
        self.bits.get_bits(Self::ppn_bits()) as usize
    }

    fn flags(self) -> PteFlags {
        PteFlags::from_bits_truncate(self.bits as u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaf_encoding_matches_hardware_layout() {
        let pte = Pte64::new(0x80000, PteFlags::R | PteFlags::W | PteFlags::X);
        assert_eq!(pte.bits(), (0x80000 << 10) | 0b1111);
        assert!(pte.is_leaf());
        assert_eq!(pte.ppn(), 0x80000);
    }

    #[test]
    fn pointer_has_no_permissions() {
        let pte = Pte32::pointer(0x12345);
        assert_eq!(pte.bits(), (0x12345 << 10) | 1);
        assert!(pte.is_pointer());
        assert!(!pte.is_leaf());
        assert_eq!(pte.permissions(), PteFlags::empty());
    }

    #[test]
    fn oversized_ppn_is_truncated_to_field() {
        let pte = Pte32::new(usize::MAX, PteFlags::R);
        assert_eq!(pte.ppn(), (1 << 22) - 1);
        assert_eq!(pte.flags(), PteFlags::V | PteFlags::R);
    }

    #[test]
    fn invalid_entry() {
        assert!(!Pte64::INVALID.is_valid());
        assert!(!Pte64::INVALID.is_leaf());
        assert!(!Pte64::INVALID.is_pointer());
    }
}
