//! Flattened device tree header and low-level accessors.

use core::{ops::Range, slice};

use crate::error::{DtbError, DtbResult};

pub const FDT_MAGIC: u32 = 0xd00d_feed;
pub const FDT_HEADER_SIZE: usize = 40;

pub const FDT_BEGIN_NODE: u32 = 1;
pub const FDT_END_NODE: u32 = 2;
pub const FDT_PROP: u32 = 3;
pub const FDT_NOP: u32 = 4;
pub const FDT_END: u32 = 9;

/// Header of a flattened device tree. All fields are big-endian in the blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FdtHeader {
    pub magic: u32,
    pub total_size: u32,
    pub off_dt_struct: u32,
    pub off_dt_strings: u32,
    pub off_mem_rsvmap: u32,
    pub version: u32,
    pub last_comp_version: u32,
    pub boot_cpuid_phys: u32,
    pub size_dt_strings: u32,
    pub size_dt_struct: u32,
}

impl FdtHeader {
    /// Reads the header at the start of `blob`. Only the header itself has
    /// to be present; see [`FdtHeader::validate`] for the rest.
    pub fn parse(blob: &[u8]) -> DtbResult<Self> {
        let field = |i: usize| read_be32(blob, i * 4);
        let header = Self {
            magic: field(0)?,
            total_size: field(1)?,
            off_dt_struct: field(2)?,
            off_dt_strings: field(3)?,
            off_mem_rsvmap: field(4)?,
            version: field(5)?,
            last_comp_version: field(6)?,
            boot_cpuid_phys: field(7)?,
            size_dt_strings: field(8)?,
            size_dt_struct: field(9)?,
        };
        if header.magic != FDT_MAGIC {
            return Err(DtbError::BadMagic(header.magic));
        }
        Ok(header)
    }

    pub fn total_size(&self) -> usize {
        self.total_size as usize
    }

    /// Checks that the blob holds `total_size` bytes, that both blocks lie
    /// inside it and that the structure block is token aligned.
    pub fn validate(&self, available: usize) -> DtbResult<()> {
        if available < self.total_size() {
            return Err(DtbError::Truncated {
                needed: self.total_size(),
                available,
            });
        }
        let within = |r: Range<usize>| r.start <= r.end && r.end <= self.total_size();
        if self.total_size() < FDT_HEADER_SIZE
            || self.off_dt_struct % 4 != 0
            || !within(self.struct_range())
            || !within(self.strings_range())
        {
            return Err(DtbError::BadLayout);
        }
        Ok(())
    }

    /// Byte range of the structure block. Trees older than version 17 do not
    /// record its size, so it runs to the end of the blob.
    pub fn struct_range(&self) -> Range<usize> {
        let start = self.off_dt_struct as usize;
        if self.version >= 17 {
            start..start.saturating_add(self.size_dt_struct as usize)
        } else {
            start..self.total_size()
        }
    }

    pub fn strings_range(&self) -> Range<usize> {
        let start = self.off_dt_strings as usize;
        start..start.saturating_add(self.size_dt_strings as usize)
    }
}

/// Declared total size of the tree in `blob`.
pub fn fdt_size(blob: &[u8]) -> DtbResult<usize> {
    FdtHeader::parse(blob).map(|header| header.total_size())
}

/// Declared total size of the tree at physical address `addr`.
///
/// # Safety
/// `addr` must point to at least [`FDT_HEADER_SIZE`] readable bytes.
pub unsafe fn fdt_size_at(addr: usize) -> DtbResult<usize> {
    let header = unsafe { slice::from_raw_parts(addr as *const u8, FDT_HEADER_SIZE) };
    fdt_size(header)
}

pub fn read_be32(blob: &[u8], offset: usize) -> DtbResult<u32> {
    offset
        .checked_add(4)
        .and_then(|end| blob.get(offset..end))
        .map(|b| u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
        .ok_or(DtbError::Truncated {
            needed: offset.saturating_add(4),
            available: blob.len(),
        })
}

pub fn write_be32(blob: &mut [u8], offset: usize, value: u32) {
    blob[offset..offset + 4].copy_from_slice(&value.to_be_bytes());
}

/// Reads the NUL-terminated string at `offset`, without the terminator.
pub fn read_cstr(blob: &[u8], offset: usize) -> DtbResult<&str> {
    let rest = blob.get(offset..).ok_or(DtbError::BadString { offset })?;
    let len = rest
        .iter()
        .position(|&b| b == 0)
        .ok_or(DtbError::BadString { offset })?;
    core::str::from_utf8(&rest[..len]).map_err(|_| DtbError::BadString { offset })
}

/// Overwrites `range` of the structure block with `FDT_NOP` tokens.
pub fn nop_range(blob: &mut [u8], range: Range<usize>) {
    debug_assert!(range.start % 4 == 0 && range.end % 4 == 0);
    for offset in range.step_by(4) {
        write_be32(blob, offset, FDT_NOP);
    }
}

pub const fn align4(offset: usize) -> usize {
    (offset + 3) & !3
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::FdtBuilder;

    #[test]
    fn parses_generated_header() {
        let blob = FdtBuilder::new().begin_node("").end_node().finish();
        let header = FdtHeader::parse(&blob).unwrap();
        assert_eq!(header.total_size(), blob.len());
        assert_eq!(fdt_size(&blob), Ok(blob.len()));
        assert!(header.validate(blob.len()).is_ok());
    }

    #[test]
    fn rejects_bad_magic_and_short_input() {
        let mut blob = FdtBuilder::new().begin_node("").end_node().finish();
        assert!(matches!(fdt_size(&blob[..8]), Err(DtbError::Truncated { .. })));
        blob[0] = 0;
        assert!(matches!(fdt_size(&blob), Err(DtbError::BadMagic(_))));
    }

    #[test]
    fn validate_catches_truncation() {
        let blob = FdtBuilder::new().begin_node("").end_node().finish();
        let header = FdtHeader::parse(&blob).unwrap();
        assert_eq!(
            header.validate(blob.len() - 4),
            Err(DtbError::Truncated {
                needed: blob.len(),
                available: blob.len() - 4
            })
        );
    }

    #[test]
    fn validate_rejects_unaligned_structure_block() {
        let blob = FdtBuilder::new().begin_node("").end_node().finish();
        let mut header = FdtHeader::parse(&blob).unwrap();
        header.off_dt_struct += 2;
        header.size_dt_struct -= 4;
        assert_eq!(header.validate(blob.len()), Err(DtbError::BadLayout));
        header.off_dt_struct -= 2;
        assert_eq!(header.validate(blob.len()), Ok(()));
    }

    #[test]
    fn reads_near_address_space_end_fail() {
        let blob = [0u8; 8];
        assert_eq!(
            read_be32(&blob, usize::MAX - 1),
            Err(DtbError::Truncated {
                needed: usize::MAX,
                available: 8
            })
        );
        assert_eq!(read_be32(&blob, 4), Ok(0));
    }

    #[test]
    fn cstr_needs_terminator() {
        assert_eq!(read_cstr(b"cpu\0rest", 0), Ok("cpu"));
        assert_eq!(read_cstr(b"cpu", 0), Err(DtbError::BadString { offset: 0 }));
    }
}
