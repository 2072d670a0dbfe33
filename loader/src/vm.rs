//! Statically allocated boot page tables.
//!
//! The boot hart fills them through [`boot_tables`] before publishing the
//! entry point; afterwards every hart only reads [`satp`].

use config::mm::{PAGE_OFFSET_WIDTH, PAGING_SCHEME};
use mm::BootPageTables;

cfg_if::cfg_if! {
    if #[cfg(feature = "sv32")] {
        use mm::Sv32Table;

        static mut ROOT: Sv32Table = Sv32Table::empty();

        /// # Safety
        /// Only the boot hart may call this, once, before publication.
        pub unsafe fn boot_tables() -> BootPageTables<'static> {
            BootPageTables::Sv32 {
                root: unsafe { &mut *(&raw mut ROOT) },
            }
        }
    } else if #[cfg(feature = "sv48")] {
        use mm::Sv64Table;

        static mut ROOT: Sv64Table = Sv64Table::empty();
        static mut INTERMEDIATE: Sv64Table = Sv64Table::empty();

        /// # Safety
        /// Only the boot hart may call this, once, before publication.
        pub unsafe fn boot_tables() -> BootPageTables<'static> {
            BootPageTables::Sv48 {
                root: unsafe { &mut *(&raw mut ROOT) },
                intermediate: unsafe { &mut *(&raw mut INTERMEDIATE) },
            }
        }
    } else {
        use mm::Sv64Table;

        static mut ROOT: Sv64Table = Sv64Table::empty();

        /// # Safety
        /// Only the boot hart may call this, once, before publication.
        pub unsafe fn boot_tables() -> BootPageTables<'static> {
            BootPageTables::Sv39 {
                root: unsafe { &mut *(&raw mut ROOT) },
            }
        }
    }
}

/// `satp` value enabling the boot tables.
pub fn satp() -> usize {
    PAGING_SCHEME.satp_mode() | (&raw const ROOT as usize >> PAGE_OFFSET_WIDTH)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn satp_names_the_static_root() {
        assert_eq!(satp() & !PAGING_SCHEME.satp_mode(), &raw const ROOT as usize >> 12);
        assert_eq!(satp() & PAGING_SCHEME.satp_mode(), PAGING_SCHEME.satp_mode());
    }
}
