//! Cross-hart state of the boot sequence.
//!
//! One hart (the boot hart) fills in [`BOOT_STATE`] and publishes the entry
//! point; every hart, the boot hart included, then waits for the entry point
//! and asks [`BootState::wait_and_decide`] what to do. The state is written
//! once before publication and only read afterwards.

#![cfg_attr(not(test), no_std)]

mod entry;
mod mask;
mod state;

pub use entry::{EntryPoint, PublishError};
pub use mask::{hart_bit, is_set, live_harts};
pub use state::{BOOT_STATE, BootState, Handoff, HartFate};
