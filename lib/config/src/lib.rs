#![cfg_attr(not(test), no_std)]

pub mod board;
pub mod device;
pub mod mm;
pub mod sbi;
