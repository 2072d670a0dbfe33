//! The payload image linked into the loader.

use core::arch::global_asm;

global_asm!(
    ".pushsection .payload, \"a\"",
    concat!(".incbin \"", env!("PAYLOAD_PATH"), "\""),
    ".popsection",
);
