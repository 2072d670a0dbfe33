//! Minimal flattened device tree writer for synthesising test blobs.

use alloc::{string::String, vec::Vec};

use crate::header::{
    FDT_BEGIN_NODE, FDT_END, FDT_END_NODE, FDT_HEADER_SIZE, FDT_MAGIC, FDT_NOP, FDT_PROP,
};

const RESERVE_MAP_SIZE: usize = 16;

#[derive(Default)]
pub struct FdtBuilder {
    structure: Vec<u8>,
    strings: Vec<u8>,
    names: Vec<(String, u32)>,
}

impl FdtBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn token(&mut self, token: u32) {
        self.structure.extend_from_slice(&token.to_be_bytes());
    }

    fn pad(&mut self) {
        while self.structure.len() % 4 != 0 {
            self.structure.push(0);
        }
    }

    fn string_offset(&mut self, name: &str) -> u32 {
        if let Some((_, offset)) = self.names.iter().find(|(n, _)| n == name) {
            return *offset;
        }
        let offset = self.strings.len() as u32;
        self.strings.extend_from_slice(name.as_bytes());
        self.strings.push(0);
        self.names.push((name.into(), offset));
        offset
    }

    pub fn begin_node(mut self, name: &str) -> Self {
        self.token(FDT_BEGIN_NODE);
        self.structure.extend_from_slice(name.as_bytes());
        self.structure.push(0);
        self.pad();
        self
    }

    pub fn end_node(mut self) -> Self {
        self.token(FDT_END_NODE);
        self
    }

    pub fn nop(mut self) -> Self {
        self.token(FDT_NOP);
        self
    }

    pub fn prop(mut self, name: &str, value: &[u8]) -> Self {
        let name_offset = self.string_offset(name);
        self.token(FDT_PROP);
        self.token(value.len() as u32);
        self.token(name_offset);
        self.structure.extend_from_slice(value);
        self.pad();
        self
    }

    pub fn prop_str(self, name: &str, value: &str) -> Self {
        self.prop_strs(name, &[value])
    }

    pub fn prop_strs(self, name: &str, values: &[&str]) -> Self {
        let mut value = Vec::new();
        for s in values {
            value.extend_from_slice(s.as_bytes());
            value.push(0);
        }
        self.prop(name, &value)
    }

    pub fn prop_u32(self, name: &str, value: u32) -> Self {
        self.prop_cells(name, &[value])
    }

    pub fn prop_cells(self, name: &str, cells: &[u32]) -> Self {
        let value: Vec<u8> = cells.iter().flat_map(|c| c.to_be_bytes()).collect();
        self.prop(name, &value)
    }

    /// Terminates the structure block and lays out the blob: header, an
    /// empty reservation map, structure block, strings block.
    pub fn finish(mut self) -> Vec<u8> {
        self.token(FDT_END);
        let off_mem_rsvmap = FDT_HEADER_SIZE;
        let off_dt_struct = off_mem_rsvmap + RESERVE_MAP_SIZE;
        let off_dt_strings = off_dt_struct + self.structure.len();
        let total_size = off_dt_strings + self.strings.len();

        let header = [
            FDT_MAGIC,
            total_size as u32,
            off_dt_struct as u32,
            off_dt_strings as u32,
            off_mem_rsvmap as u32,
            17, // version
            16, // last compatible version
            0,  // boot cpu
            self.strings.len() as u32,
            self.structure.len() as u32,
        ];
        let mut blob: Vec<u8> = header.iter().flat_map(|w| w.to_be_bytes()).collect();
        blob.resize(off_dt_struct, 0);
        blob.extend_from_slice(&self.structure);
        blob.extend_from_slice(&self.strings);
        blob
    }
}
