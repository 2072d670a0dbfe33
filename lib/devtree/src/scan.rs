//! Callback-driven walk over the structure block.
//!
//! A visitor sees three events per node: `open` when the node begins (its
//! scratch state has just been reset), `prop` for each of the node's own
//! properties, and `done` when the node ends. Children are reported between
//! a parent's properties and its `done`, each with its own scratch state, so
//! a parent's findings survive its children.
//!
//! `done` receives the blob mutably; that is where filters edit it. Edits
//! must keep every token where it is.

use core::array;

use crate::{
    error::{DtbError, DtbResult},
    header::{
        FDT_BEGIN_NODE, FDT_END, FDT_END_NODE, FDT_NOP, FDT_PROP, FdtHeader, align4, read_be32,
        read_cstr,
    },
};

/// Deepest node nesting the scanner follows.
pub const MAX_DEPTH: usize = 16;

const DEFAULT_ADDRESS_CELLS: u32 = 2;
const DEFAULT_SIZE_CELLS: u32 = 1;

/// A node being scanned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanNode {
    /// Offset of the node's `FDT_BEGIN_NODE` token.
    pub begin: usize,
    /// Offset just past the node's `FDT_END_NODE` token. Zero until `done`.
    pub end: usize,
    /// Zero for the root node.
    pub depth: usize,
    name_offset: usize,
    name_len: usize,
    /// `#address-cells` this node declares for its children.
    pub address_cells: u32,
    /// `#size-cells` this node declares for its children.
    pub size_cells: u32,
    /// `#address-cells` governing this node's own `reg`.
    pub parent_address_cells: u32,
    /// `#size-cells` governing this node's own `reg`.
    pub parent_size_cells: u32,
}

impl ScanNode {
    /// Name of the node, unit address included.
    pub fn name<'a>(&self, blob: &'a [u8]) -> &'a str {
        core::str::from_utf8(&blob[self.name_offset..self.name_offset + self.name_len])
            .unwrap_or("")
    }
}

/// A property of the node being scanned.
#[derive(Debug)]
pub struct ScanProp<'a> {
    pub name: &'a str,
    pub value: &'a [u8],
    /// Offset of the value in the blob.
    pub value_offset: usize,
    pub node: &'a ScanNode,
}

impl<'a> ScanProp<'a> {
    /// The value up to its first NUL, when it is text.
    pub fn as_str(&self) -> Option<&'a str> {
        let len = self.value.iter().position(|&b| b == 0)?;
        core::str::from_utf8(&self.value[..len]).ok()
    }

    /// The entries of a string-list value such as `compatible`.
    pub fn strings(&self) -> impl Iterator<Item = &'a str> + 'a {
        let value = self.value;
        let terminated = value.strip_suffix(&[0u8]).unwrap_or(value);
        terminated
            .split(|&b| b == 0)
            .filter_map(|s| core::str::from_utf8(s).ok())
            .filter(|s| !s.is_empty())
    }

    /// Returns whether a string-list value contains `needle`.
    pub fn contains_str(&self, needle: &str) -> bool {
        self.strings().any(|s| s == needle)
    }

    /// The `index`-th 32-bit cell.
    pub fn cell(&self, index: usize) -> Option<u32> {
        let bytes = self.value.get(index * 4..index * 4 + 4)?;
        Some(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Number of 32-bit cells in the value.
    pub fn cell_count(&self) -> usize {
        self.value.len() / 4
    }

    /// First address of a `reg`-style value, decoded with the parent's
    /// `#address-cells`. Wider addresses keep their low 64 bits.
    pub fn address(&self) -> Option<u64> {
        let cells = self.node.parent_address_cells as usize;
        if cells == 0 || self.cell_count() < cells {
            return None;
        }
        (0..cells).try_fold(0u64, |acc, i| Some((acc << 32) | self.cell(i)? as u64))
    }
}

/// Receiver of scan events.
pub trait FdtVisitor {
    /// Per-node state, reset to `Default` when each node opens.
    type Scratch: Default;

    fn open(&mut self, _node: &ScanNode, _scratch: &mut Self::Scratch) {}

    fn prop(&mut self, prop: &ScanProp<'_>, scratch: &mut Self::Scratch);

    fn done(&mut self, node: &ScanNode, scratch: &mut Self::Scratch, blob: &mut [u8]);
}

/// Walks every node of the tree in `blob`, reporting events to `visitor`.
pub fn scan<V: FdtVisitor>(blob: &mut [u8], visitor: &mut V) -> DtbResult<()> {
    let header = FdtHeader::parse(blob)?;
    header.validate(blob.len())?;
    let strings = header.strings_range();
    let structure = header.struct_range();

    let mut nodes = [ScanNode::default(); MAX_DEPTH];
    let mut scratch: [V::Scratch; MAX_DEPTH] = array::from_fn(|_| V::Scratch::default());
    let mut depth = 0;
    let mut pos = structure.start;

    loop {
        if pos + 4 > structure.end {
            return Err(DtbError::Truncated {
                needed: pos + 4,
                available: structure.end,
            });
        }
        let token = read_be32(blob, pos)?;
        match token {
            FDT_BEGIN_NODE => {
                if depth == MAX_DEPTH {
                    return Err(DtbError::TooDeep);
                }
                let name_offset = pos + 4;
                let name_len = read_cstr(&blob[..structure.end], name_offset)?.len();
                let (parent_address_cells, parent_size_cells) = match depth {
                    0 => (DEFAULT_ADDRESS_CELLS, DEFAULT_SIZE_CELLS),
                    d => (nodes[d - 1].address_cells, nodes[d - 1].size_cells),
                };
                nodes[depth] = ScanNode {
                    begin: pos,
                    end: 0,
                    depth,
                    name_offset,
                    name_len,
                    address_cells: DEFAULT_ADDRESS_CELLS,
                    size_cells: DEFAULT_SIZE_CELLS,
                    parent_address_cells,
                    parent_size_cells,
                };
                scratch[depth] = V::Scratch::default();
                visitor.open(&nodes[depth], &mut scratch[depth]);
                depth += 1;
                pos = align4(name_offset + name_len + 1);
            }
            FDT_END_NODE => {
                if depth == 0 {
                    return Err(DtbError::BadToken { offset: pos, token });
                }
                depth -= 1;
                pos += 4;
                nodes[depth].end = pos;
                let node = nodes[depth];
                visitor.done(&node, &mut scratch[depth], blob);
            }
            FDT_PROP => {
                if depth == 0 {
                    return Err(DtbError::BadToken { offset: pos, token });
                }
                let len = read_be32(blob, pos + 4)? as usize;
                let name_offset = read_be32(blob, pos + 8)? as usize;
                let value_offset = pos + 12;
                let value_end = value_offset
                    .checked_add(len)
                    .filter(|&end| end <= structure.end)
                    .ok_or(DtbError::Truncated {
                        needed: value_offset.saturating_add(len),
                        available: structure.end,
                    })?;
                let name_at = strings
                    .start
                    .checked_add(name_offset)
                    .ok_or(DtbError::BadString { offset: name_offset })?;
                let name = read_cstr(&blob[..strings.end], name_at)?;
                let value = &blob[value_offset..value_end];

                let node = &mut nodes[depth - 1];
                match (name, read_be32(value, 0)) {
                    ("#address-cells", Ok(cells)) => node.address_cells = cells,
                    ("#size-cells", Ok(cells)) => node.size_cells = cells,
                    _ => {}
                }

                let prop = ScanProp {
                    name,
                    value,
                    value_offset,
                    node: &nodes[depth - 1],
                };
                visitor.prop(&prop, &mut scratch[depth - 1]);
                pos = align4(value_end);
            }
            FDT_NOP => pos += 4,
            FDT_END if depth == 0 => return Ok(()),
            _ => return Err(DtbError::BadToken { offset: pos, token }),
        }
    }
}
