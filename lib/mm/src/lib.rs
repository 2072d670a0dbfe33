#![cfg_attr(not(test), no_std)]

pub mod boot_table;
pub mod page_table;
pub mod pte;

pub use boot_table::{BootPageTables, KernelLayout};
pub use page_table::{PageTable, Sv32Table, Sv64Table};
pub use pte::{PageTableEntry, Pte32, Pte64, PteFlags};
