//! WAD archive parser.
//!
//! Reads the whole file into memory, parses the 16-byte directory entries
//! and materialises every lump as a named byte blob.  Both `IWAD` (internal)
//! and `PWAD` (patch) archives are accepted.

use std::collections::HashMap;
use std::path::Path;
use std::{fs, io};

use byteorder::{LittleEndian as LE, ReadBytesExt};
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// Size (in bytes) of the archive header.
const HEADER_SIZE: usize = 12;
/// Size (in bytes) of one directory entry.
const DIR_ENTRY_SIZE: usize = 16;
/// Length of a lump name on disk (NUL-padded).
pub const NAME_LEN: usize = 8;

/// Errors raised while opening or navigating an archive.
#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("archive not found at `{0}`")]
    FileNotFound(String),

    /// Underlying I/O failure other than a missing file.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Unknown magic, negative lump count or negative directory offset.
    #[error("invalid archive header: {0}")]
    InvalidHeader(String),

    /// Directory or lump data extends past end of file, or an entry
    /// carries a negative offset/size.
    #[error("invalid archive directory: {0}")]
    InvalidDirectory(String),

    #[error("lump `{0}` not found")]
    LumpNotFound(String),

    /// Lump byte length is not a multiple of the record size.
    #[error("lump `{name}` ({size} bytes) cannot be read as records of {record_size} bytes")]
    BadLumpInterpret {
        name: String,
        size: usize,
        record_size: usize,
    },
}

/// Kind of archive, from the header tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArchiveKind {
    /// `IWAD` — a complete, self-contained archive.
    Internal,
    /// `PWAD` — a patch archive layered over an internal one.
    Patch,
}

/// A named byte blob from the archive directory.
///
/// A lump with `data.is_empty()` is a *virtual* marker: it exists only to
/// name a position in the directory (level markers work this way).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Lump {
    pub name: String,
    pub data: Vec<u8>,
}

/// An archive resident in memory.
#[derive(Debug, Default)]
pub struct Archive {
    kind: Option<ArchiveKind>,
    lumps: Vec<Lump>,
    /// Name → index of the *first* lump with that name.  Duplicate names
    /// are common (every level reuses `THINGS`, `VERTEXES`, …); multi-hop
    /// [`Archive::find`] disambiguates them.
    first_occurrence: HashMap<String, usize>,
}

impl Archive {
    // ------------------------------------------------------------------ //
    // Opening / closing
    // ------------------------------------------------------------------ //

    /// Open and parse the archive at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ArchiveError> {
        let mut archive = Self::default();
        archive.load(path)?;
        Ok(archive)
    }

    /// (Re)load this archive from `path`, releasing any previous state.
    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> Result<(), ArchiveError> {
        self.close();
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => ArchiveError::FileNotFound(path.display().to_string()),
            _ => ArchiveError::Io(e),
        })?;
        self.parse(&bytes)
    }

    /// Parse an archive already held in memory.  Useful for synthetic
    /// archives in tests and for callers that manage I/O themselves.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ArchiveError> {
        let mut archive = Self::default();
        archive.parse(bytes)?;
        Ok(archive)
    }

    /// Release all state.  Idempotent; the archive can be re-`load`ed.
    pub fn close(&mut self) {
        self.kind = None;
        self.lumps.clear();
        self.first_occurrence.clear();
    }

    pub fn is_open(&self) -> bool {
        self.kind.is_some()
    }

    /// Kind of the loaded archive, `None` when closed.
    pub fn kind(&self) -> Option<ArchiveKind> {
        self.kind
    }

    pub fn lump_count(&self) -> usize {
        self.lumps.len()
    }

    // ------------------------------------------------------------------ //
    // Lookup
    // ------------------------------------------------------------------ //

    /// Resolve a chain of lump names and return the last one found.
    ///
    /// The first name is looked up in the first-occurrence table; every
    /// subsequent name is searched *forward* from there.  This is how a
    /// level's lumps are addressed: `find(&["E1M1", "VERTEXES"])` is the
    /// vertex lump of map `E1M1`, not the one of some later map.
    pub fn find(&self, names: &[&str]) -> Result<&Lump, ArchiveError> {
        if !self.is_open() {
            return Err(ArchiveError::LumpNotFound(
                "archive is closed".to_string(),
            ));
        }
        let (first, rest) = names
            .split_first()
            .ok_or_else(|| ArchiveError::LumpNotFound(String::new()))?;
        let mut idx = *self
            .first_occurrence
            .get(*first)
            .ok_or_else(|| ArchiveError::LumpNotFound(first.to_string()))?;

        for name in rest {
            idx = self.lumps[idx..]
                .iter()
                .position(|l| l.name == *name)
                .map(|off| idx + off)
                .ok_or_else(|| ArchiveError::LumpNotFound(name.to_string()))?;
        }
        Ok(&self.lumps[idx])
    }

    /// Lumps in directory order.
    pub fn iter(&self) -> impl Iterator<Item = &Lump> {
        self.lumps.iter()
    }

    /// Directory indices of every level marker (`E#M#`, `MAP##`).
    /// Markers are virtual lumps; their data is always empty.
    pub fn level_markers(&self) -> Vec<usize> {
        static RE: Lazy<Regex> =
            Lazy::new(|| Regex::new(r"^(E[1-4]M[1-9]|MAP[0-3][0-9])$").unwrap());

        self.lumps
            .iter()
            .enumerate()
            .filter(|(_, l)| l.data.is_empty() && RE.is_match(&l.name))
            .map(|(i, _)| i)
            .collect()
    }

    pub fn lump(&self, idx: usize) -> Option<&Lump> {
        self.lumps.get(idx)
    }

    // ------------------------------------------------------------------ //
    // Parsing
    // ------------------------------------------------------------------ //

    fn parse(&mut self, bytes: &[u8]) -> Result<(), ArchiveError> {
        if bytes.len() < HEADER_SIZE {
            return Err(ArchiveError::InvalidHeader(format!(
                "file is {} bytes, shorter than the {HEADER_SIZE}-byte header",
                bytes.len()
            )));
        }

        let mut cursor = &bytes[..HEADER_SIZE];
        let mut tag = [0u8; 4];
        io::Read::read_exact(&mut cursor, &mut tag)?;
        let kind = match &tag {
            b"IWAD" => ArchiveKind::Internal,
            b"PWAD" => ArchiveKind::Patch,
            _ => {
                return Err(ArchiveError::InvalidHeader(format!(
                    "unknown archive tag {:?}",
                    String::from_utf8_lossy(&tag)
                )));
            }
        };

        let num_lumps = cursor.read_i32::<LE>()?;
        let dir_offset = cursor.read_i32::<LE>()?;
        if num_lumps < 0 {
            return Err(ArchiveError::InvalidHeader(format!(
                "negative lump count {num_lumps}"
            )));
        }
        if dir_offset < 0 {
            return Err(ArchiveError::InvalidHeader(format!(
                "negative directory offset {dir_offset}"
            )));
        }

        let num_lumps = num_lumps as usize;
        let dir_start = dir_offset as usize;
        let dir_end = dir_start + num_lumps * DIR_ENTRY_SIZE;
        if dir_end > bytes.len() {
            return Err(ArchiveError::InvalidDirectory(format!(
                "directory [{dir_start}..{dir_end}] extends past end of file ({} bytes)",
                bytes.len()
            )));
        }

        let mut lumps = Vec::with_capacity(num_lumps);
        let mut first_occurrence = HashMap::with_capacity(num_lumps);
        let mut cursor = &bytes[dir_start..dir_end];
        for _ in 0..num_lumps {
            let offset = cursor.read_i32::<LE>()?;
            let size = cursor.read_i32::<LE>()?;
            let mut raw_name = [0u8; NAME_LEN];
            io::Read::read_exact(&mut cursor, &mut raw_name)?;

            let name = trim_name(&raw_name).to_string();
            if offset < 0 {
                return Err(ArchiveError::InvalidDirectory(format!(
                    "lump `{name}` has negative offset {offset}"
                )));
            }
            if size < 0 {
                return Err(ArchiveError::InvalidDirectory(format!(
                    "lump `{name}` has negative size {size}"
                )));
            }

            // Virtual marker: no data to read.
            let data = if size == 0 {
                Vec::new()
            } else {
                let start = offset as usize;
                let end = start + size as usize;
                if end > bytes.len() {
                    return Err(ArchiveError::InvalidDirectory(format!(
                        "lump `{name}` data [{start}..{end}] extends past end of file ({} bytes)",
                        bytes.len()
                    )));
                }
                bytes[start..end].to_vec()
            };

            first_occurrence.entry(name.clone()).or_insert(lumps.len());
            lumps.push(Lump { name, data });
        }

        self.kind = Some(kind);
        self.lumps = lumps;
        self.first_occurrence = first_occurrence;
        Ok(())
    }
}

/// View of an 8-byte NUL-padded name, terminated at the first NUL.
pub fn trim_name(raw: &[u8; NAME_LEN]) -> &str {
    let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    std::str::from_utf8(&raw[..end]).unwrap_or("?")
}

/// NUL-pad a name back to its 8-byte on-disk form.  Longer names are
/// truncated; the archive format cannot represent them.
pub fn pad_name(name: &str) -> [u8; NAME_LEN] {
    let mut out = [0u8; NAME_LEN];
    let bytes = name.as_bytes();
    let n = bytes.len().min(NAME_LEN);
    out[..n].copy_from_slice(&bytes[..n]);
    out
}

// ==========================================================================
// Tests
// ==========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wad::testwad::ArchiveBuilder;

    #[test]
    fn single_lump_parses() {
        // Header "IWAD", one entry: offset 28, size 4, name "HELLO\0\0\0".
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"IWAD");
        bytes.extend(1i32.to_le_bytes());
        bytes.extend(12i32.to_le_bytes());
        bytes.extend(28i32.to_le_bytes());
        bytes.extend(4i32.to_le_bytes());
        bytes.extend_from_slice(b"HELLO\0\0\0");
        bytes.extend_from_slice(&[0xDE, 0xAD, 0xBE, 0xEF]);

        let archive = Archive::from_bytes(&bytes).unwrap();
        assert_eq!(archive.kind(), Some(ArchiveKind::Internal));
        assert_eq!(archive.lump_count(), 1);

        let lump = archive.find(&["HELLO"]).unwrap();
        assert_eq!(lump.name, "HELLO");
        assert_eq!(lump.data, vec![0xDE, 0xAD, 0xBE, 0xEF]);
    }

    #[test]
    fn virtual_marker_has_no_data() {
        let bytes = ArchiveBuilder::new(b"IWAD")
            .marker("E1M1")
            .lump("THINGS", &[1, 0])
            .build();
        let archive = Archive::from_bytes(&bytes).unwrap();

        let marker = archive.find(&["E1M1"]).unwrap();
        assert_eq!(marker.name, "E1M1");
        assert!(marker.data.is_empty());
    }

    #[test]
    fn multi_hop_find_respects_order() {
        // Two levels sharing lump names; each hop must search forward
        // from the previous match.
        let bytes = ArchiveBuilder::new(b"IWAD")
            .marker("E1M1")
            .lump("THINGS", &[1])
            .marker("E1M2")
            .lump("THINGS", &[2])
            .build();
        let archive = Archive::from_bytes(&bytes).unwrap();

        assert_eq!(archive.find(&["E1M1", "THINGS"]).unwrap().data, vec![1]);
        assert_eq!(archive.find(&["E1M2", "THINGS"]).unwrap().data, vec![2]);
    }

    #[test]
    fn first_occurrence_wins() {
        let bytes = ArchiveBuilder::new(b"IWAD")
            .lump("DUP", &[1])
            .lump("DUP", &[2])
            .build();
        let archive = Archive::from_bytes(&bytes).unwrap();
        assert_eq!(archive.find(&["DUP"]).unwrap().data, vec![1]);
    }

    #[test]
    fn patch_archives_accepted() {
        let bytes = ArchiveBuilder::new(b"PWAD").lump("X", &[0]).build();
        let archive = Archive::from_bytes(&bytes).unwrap();
        assert_eq!(archive.kind(), Some(ArchiveKind::Patch));
    }

    #[test]
    fn unknown_tag_rejected() {
        let bytes = ArchiveBuilder::new(b"ZWAD").build();
        let err = Archive::from_bytes(&bytes).unwrap_err();
        assert!(matches!(err, ArchiveError::InvalidHeader(_)));
    }

    #[test]
    fn negative_counts_rejected() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"IWAD");
        bytes.extend((-1i32).to_le_bytes());
        bytes.extend(12i32.to_le_bytes());
        let err = Archive::from_bytes(&bytes).unwrap_err();
        assert!(matches!(err, ArchiveError::InvalidHeader(_)));

        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"IWAD");
        bytes.extend(0i32.to_le_bytes());
        bytes.extend((-12i32).to_le_bytes());
        let err = Archive::from_bytes(&bytes).unwrap_err();
        assert!(matches!(err, ArchiveError::InvalidHeader(_)));
    }

    #[test]
    fn directory_past_eof_rejected() {
        // Header claims one entry but the file ends at the header.
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"IWAD");
        bytes.extend(1i32.to_le_bytes());
        bytes.extend(12i32.to_le_bytes());
        let err = Archive::from_bytes(&bytes).unwrap_err();
        assert!(matches!(err, ArchiveError::InvalidDirectory(_)));
    }

    #[test]
    fn lump_data_past_eof_rejected() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"IWAD");
        bytes.extend(1i32.to_le_bytes());
        bytes.extend(12i32.to_le_bytes());
        bytes.extend(1_000i32.to_le_bytes()); // way past EOF
        bytes.extend(4i32.to_le_bytes());
        bytes.extend_from_slice(b"BAD\0\0\0\0\0");
        let err = Archive::from_bytes(&bytes).unwrap_err();
        assert!(matches!(err, ArchiveError::InvalidDirectory(_)));
    }

    #[test]
    fn missing_file_reported() {
        let err = Archive::open("no/such/archive.wad").unwrap_err();
        assert!(matches!(err, ArchiveError::FileNotFound(_)));
    }

    #[test]
    fn open_from_disk_roundtrips() {
        let bytes = ArchiveBuilder::new(b"IWAD").lump("DISK", &[7, 7]).build();
        let tmp = tempfile::NamedTempFile::new().expect("tempfile");
        std::fs::write(tmp.path(), &bytes).unwrap();

        let archive = Archive::open(tmp.path()).unwrap();
        assert_eq!(archive.find(&["DISK"]).unwrap().data, vec![7, 7]);
    }

    #[test]
    fn close_is_idempotent_and_find_fails_after() {
        let bytes = ArchiveBuilder::new(b"IWAD").lump("X", &[0]).build();
        let mut archive = Archive::from_bytes(&bytes).unwrap();
        archive.close();
        archive.close();
        assert!(!archive.is_open());
        assert!(matches!(
            archive.find(&["X"]),
            Err(ArchiveError::LumpNotFound(_))
        ));
    }

    #[test]
    fn level_markers_found() {
        let bytes = ArchiveBuilder::new(b"IWAD")
            .lump("PLAYPAL", &[0])
            .marker("E1M1")
            .lump("THINGS", &[0])
            .marker("MAP01")
            .marker("S_START") // not a level marker
            .build();
        let archive = Archive::from_bytes(&bytes).unwrap();
        assert_eq!(archive.level_markers(), vec![1, 3]);
    }

    #[test]
    fn name_trim_and_pad_roundtrip() {
        let raw = *b"HELLO\0\0\0";
        assert_eq!(trim_name(&raw), "HELLO");
        assert_eq!(pad_name("HELLO"), raw);
        // Full-width name, no NUL.
        let raw = *b"EIGHTCHR";
        assert_eq!(trim_name(&raw), "EIGHTCHR");
        assert_eq!(pad_name("EIGHTCHR"), raw);
    }
}
