mod archive;
mod lumps;

pub use archive::{pad_name, trim_name, Archive, ArchiveError, ArchiveKind, Lump, NAME_LEN};
pub use lumps::{
    encode_records, records, RawLinedef, RawNode, RawSector, RawSeg, RawSidedef, RawSubsector,
    RawThing, RawVertex, NO_SIDEDEF, SUBSECTOR_CHILD_BIT,
};

#[cfg(test)]
pub(crate) mod testwad;
