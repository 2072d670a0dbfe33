//! Architecture access for the loader.
//!
//! Every module has a `riscv` implementation and a `host` one. The host
//! variant exists so that the workspace builds and tests off-target; it never
//! performs a real privilege transfer.

#![cfg_attr(not(test), no_std)]

pub mod hart;
pub mod mm;
pub mod privilege;
pub mod trap;
