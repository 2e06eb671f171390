//! Synthetic archive builder shared by unit tests across the crate.

use super::archive::NAME_LEN;
use super::pad_name;

const HEADER_SIZE: usize = 12;
const DIR_ENTRY_SIZE: usize = 16;

/// Builds archive bytes: header, then directory, then data blocks.
pub(crate) struct ArchiveBuilder {
    tag: &'static [u8; 4],
    entries: Vec<(i32, i32, [u8; NAME_LEN])>,
    data: Vec<u8>,
}

impl ArchiveBuilder {
    pub fn new(tag: &'static [u8; 4]) -> Self {
        Self {
            tag,
            entries: Vec::new(),
            data: Vec::new(),
        }
    }

    /// Append a lump; its data lands after the directory.
    pub fn lump(mut self, name: &str, data: &[u8]) -> Self {
        let offset = self.data.len() as i32; // relative, patched in build()
        self.entries
            .push((offset, data.len() as i32, pad_name(name)));
        self.data.extend_from_slice(data);
        self
    }

    /// Append a zero-length virtual marker.
    pub fn marker(self, name: &str) -> Self {
        self.lump(name, &[])
    }

    pub fn build(self) -> Vec<u8> {
        let dir_offset = HEADER_SIZE;
        let data_offset = dir_offset + self.entries.len() * DIR_ENTRY_SIZE;
        let mut out = Vec::new();
        out.extend_from_slice(self.tag);
        out.extend((self.entries.len() as i32).to_le_bytes());
        out.extend((dir_offset as i32).to_le_bytes());
        for (offset, size, name) in &self.entries {
            let abs = if *size == 0 {
                0
            } else {
                offset + data_offset as i32
            };
            out.extend(abs.to_le_bytes());
            out.extend(size.to_le_bytes());
            out.extend_from_slice(name);
        }
        out.extend_from_slice(&self.data);
        out
    }
}
