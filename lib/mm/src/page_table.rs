//! Statically sized, page-aligned page tables.
//!
//! Boot tables live in the loader image and are never allocated. The loader
//! runs untranslated, so the address of a table is its physical address.

use core::ops::{Index, IndexMut};

use config::mm::PAGE_OFFSET_WIDTH;

use crate::pte::{PageTableEntry, Pte32, Pte64};

/// One page worth of entries.
#[derive(Debug)]
#[repr(C, align(4096))]
pub struct PageTable<E, const N: usize> {
    entries: [E; N],
}

/// Root table of the Sv32 scheme.
pub type Sv32Table = PageTable<Pte32, 1024>;
/// Any level of an Sv39 or Sv48 table walk.
pub type Sv64Table = PageTable<Pte64, 512>;

impl<E: PageTableEntry, const N: usize> PageTable<E, N> {
    /// Creates a table with every entry invalid.
    pub const fn empty() -> Self {
        Self {
            entries: [E::INVALID; N],
        }
    }

    /// Physical page number of the table.
    pub fn ppn(&self) -> usize {
        self as *const Self as usize >> PAGE_OFFSET_WIDTH
    }

    /// Invalidates every entry.
    pub fn clear(&mut self) {
        self.entries.fill(E::INVALID);
    }

    pub fn entries(&self) -> &[E; N] {
        &self.entries
    }

    /// Iterates over the valid entries together with their slot.
    pub fn valid_entries(&self) -> impl Iterator<Item = (usize, E)> + '_ {
        self.entries
            .iter()
            .copied()
            .enumerate()
            .filter(|(_, pte)| pte.is_valid())
    }
}

impl<E, const N: usize> Index<usize> for PageTable<E, N> {
    type Output = E;

    fn index(&self, slot: usize) -> &E {
        &self.entries[slot]
    }
}

impl<E, const N: usize> IndexMut<usize> for PageTable<E, N> {
    fn index_mut(&mut self, slot: usize) -> &mut E {
        &mut self.entries[slot]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pte::PteFlags;

    #[test]
    fn tables_fill_exactly_one_page() {
        assert_eq!(core::mem::size_of::<Sv32Table>(), 4096);
        assert_eq!(core::mem::size_of::<Sv64Table>(), 4096);
        assert_eq!(core::mem::align_of::<Sv64Table>(), 4096);
    }

    #[test]
    fn ppn_is_address_shifted() {
        let table = Box::new(Sv64Table::empty());
        let addr = &*table as *const Sv64Table as usize;
        assert_eq!(addr % 4096, 0);
        assert_eq!(table.ppn(), addr >> 12);
    }

    #[test]
    fn clear_drops_all_entries() {
        let mut table = Box::new(Sv32Table::empty());
        table[3] = Pte32::new(1, PteFlags::R);
        table[1023] = Pte32::pointer(2);
        assert_eq!(table.valid_entries().count(), 2);
        table.clear();
        assert_eq!(table.valid_entries().count(), 0);
    }
}
