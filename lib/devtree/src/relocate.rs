//! Placement and copying of the device tree handed to the payload.

use core::{ptr, slice};

use crate::{
    error::{DtbError, DtbResult},
    header::{fdt_size, fdt_size_at},
};

/// Where the relocated tree goes: `end` rounded up to the next `megapage`
/// boundary. An `end` already on a boundary is kept.
pub const fn dtb_output(end: usize, megapage: usize) -> usize {
    end.div_ceil(megapage) * megapage
}

/// Copies the tree in `src` to the front of `dst` and returns the copy.
///
/// Only the declared size is copied; trailing bytes of `src` are ignored.
pub fn relocate<'a>(src: &[u8], dst: &'a mut [u8]) -> DtbResult<&'a mut [u8]> {
    let size = fdt_size(src)?;
    if size > src.len() {
        return Err(DtbError::Truncated {
            needed: size,
            available: src.len(),
        });
    }
    let available = dst.len();
    let out = dst
        .get_mut(..size)
        .ok_or(DtbError::OutputTooSmall { needed: size, available })?;
    out.copy_from_slice(&src[..size]);
    Ok(out)
}

/// Copies the tree at physical address `src` to physical address `dst`.
///
/// # Safety
/// `src` must hold a tree whose declared size is readable, `dst` must have
/// room for it, and nothing else may reference the destination range for
/// the returned lifetime.
pub unsafe fn relocate_raw(src: usize, dst: usize) -> DtbResult<&'static mut [u8]> {
    let size = unsafe { fdt_size_at(src)? };
    log::debug!("dtb: {:#x} -> {:#x}, {} bytes", src, dst, size);
    unsafe {
        ptr::copy(src as *const u8, dst as *mut u8, size);
        Ok(slice::from_raw_parts_mut(dst as *mut u8, size))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::FdtBuilder;
    use alloc::vec;

    const MIB: usize = 1 << 20;

    #[test]
    fn output_rounds_up_to_megapage() {
        assert_eq!(dtb_output(0x8020_1234, 2 * MIB), 0x8040_0000);
        assert_eq!(dtb_output(0x8040_0000, 2 * MIB), 0x8040_0000);
        assert_eq!(dtb_output(0x8000_0001, 4 * MIB), 0x8040_0000);
        assert_eq!(dtb_output(0x8080_0000, 4 * MIB), 0x8080_0000);
    }

    #[test]
    fn copy_is_byte_identical_for_declared_size() {
        let tree = FdtBuilder::new()
            .begin_node("")
            .prop_str("model", "test")
            .end_node()
            .finish();
        let mut src = tree.clone();
        src.extend_from_slice(&[0xaa; 32]);
        let mut dst = vec![0u8; tree.len() + 64];

        let copy = relocate(&src, &mut dst).unwrap();
        assert_eq!(copy, &tree[..]);
        assert!(dst[tree.len()..].iter().all(|&b| b == 0));
    }

    #[test]
    fn relocate_raw_copies_between_addresses() {
        let tree = FdtBuilder::new().begin_node("").end_node().finish();
        let mut dst = vec![0u8; tree.len()];
        let copy = unsafe { relocate_raw(tree.as_ptr() as usize, dst.as_mut_ptr() as usize) }
            .unwrap();
        assert_eq!(copy.len(), tree.len());
        assert_eq!(dst, tree);
    }

    #[test]
    fn small_output_is_an_error() {
        let tree = FdtBuilder::new().begin_node("").end_node().finish();
        let mut dst = vec![0u8; 8];
        assert_eq!(
            relocate(&tree, &mut dst),
            Err(DtbError::OutputTooSmall {
                needed: tree.len(),
                available: 8
            })
        );
    }
}
