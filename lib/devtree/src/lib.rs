//! Flattened device tree handling for the boot path.
//!
//! The loader copies the firmware's tree past the payload and edits the copy
//! in place before the payload sees it. Every edit keeps the blob size
//! unchanged: values are rewritten inside their slots and removed nodes are
//! overwritten with `FDT_NOP` tokens.

#![cfg_attr(not(test), no_std)]

#[cfg(any(test, feature = "builder"))]
extern crate alloc;

#[cfg(any(test, feature = "builder"))]
pub mod builder;
pub mod error;
pub mod filter;
pub mod header;
pub mod print;
pub mod query;
pub mod relocate;
pub mod scan;

pub use error::{DtbError, DtbResult};
pub use filter::{FilterConfig, FilterReport, HartMasks, filter_dtb};
pub use header::{FdtHeader, fdt_size};
pub use print::print_tree;
pub use query::{ChosenPayload, query_chosen, query_uart16550};
pub use relocate::{dtb_output, relocate, relocate_raw};
pub use scan::{FdtVisitor, ScanNode, ScanProp, scan};
