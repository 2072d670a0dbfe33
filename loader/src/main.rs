//! Machine-mode boot loader.
//!
//! Every hart enters at `_start`. One of them relocates and filters the
//! device tree, builds the boot page tables and publishes the payload entry
//! point; all of them then wait for that entry point and either enter the
//! payload or park.

#![cfg_attr(target_os = "none", no_std, no_main)]

mod boot;
#[cfg(target_os = "none")]
mod entry;
#[cfg(target_os = "none")]
mod lang_item;
mod layout;
mod logging;
mod machine;
#[cfg(target_os = "none")]
mod payload;
mod vm;

#[cfg(not(target_os = "none"))]
fn main() {
    println!("the loader only runs on bare-metal RISC-V targets");
}
