//! Typed lump records.
//!
//! Level lumps are packed arrays of little-endian records; the structs here
//! mirror the on-disk layout field for field and are decoded with bincode's
//! fixed-int little-endian configuration.  The `Encode` derives exist so a
//! decoded lump can be written back byte-exact.

use bincode::{config, decode_from_slice, encode_into_slice, Decode, Encode};
use std::mem;

use super::archive::{ArchiveError, Lump, NAME_LEN};

/// Raw linedef sidedef index meaning "no sidedef on this side".
pub const NO_SIDEDEF: i16 = -1;

/// High bit of a raw node child: set when the child is a subsector index.
pub const SUBSECTOR_CHILD_BIT: u16 = 0x8000;

/*=======================================================================*/
/*                         Raw binary records                            */
/*=======================================================================*/

#[repr(C)]
#[derive(Clone, Copy, Decode, Encode, Debug, PartialEq, Eq)]
pub struct RawThing {
    pub x: i16,
    pub y: i16,
    /// Binary angle: `degrees * 32767 / 180`.
    pub angle: i16,
    pub kind: i16,
    pub flags: i16,
}

#[repr(C)]
#[derive(Clone, Copy, Decode, Encode, Debug, PartialEq, Eq)]
pub struct RawLinedef {
    pub start_vertex: i16,
    pub end_vertex: i16,
    pub flags: i16,
    pub special: i16,
    pub tag: i16,
    /// [`NO_SIDEDEF`] when the side is absent.
    pub front_sidedef: i16,
    pub back_sidedef: i16,
}

#[repr(C)]
#[derive(Clone, Copy, Decode, Encode, Debug, PartialEq, Eq)]
pub struct RawSidedef {
    pub x_offset: i16,
    pub y_offset: i16,
    pub upper_name: [u8; NAME_LEN],
    pub lower_name: [u8; NAME_LEN],
    pub middle_name: [u8; NAME_LEN],
    pub sector: i16,
}

#[repr(C)]
#[derive(Clone, Copy, Decode, Encode, Debug, PartialEq, Eq)]
pub struct RawVertex {
    pub x: i16,
    pub y: i16,
}

#[repr(C)]
#[derive(Clone, Copy, Decode, Encode, Debug, PartialEq, Eq)]
pub struct RawSeg {
    pub start_vertex: i16,
    pub end_vertex: i16,
    pub angle: i16,
    pub linedef: i16,
    /// 0: seg runs along the front of its linedef, 1: along the back.
    pub direction: i16,
    pub offset: i16,
}

#[repr(C)]
#[derive(Clone, Copy, Decode, Encode, Debug, PartialEq, Eq)]
pub struct RawSubsector {
    pub seg_count: i16,
    pub first_seg: i16,
}

#[repr(C)]
#[derive(Clone, Copy, Decode, Encode, Debug, PartialEq, Eq)]
pub struct RawNode {
    pub partition_x: i16,
    pub partition_y: i16,
    pub partition_dx: i16,
    pub partition_dy: i16,
    /// top, bottom, left, right.
    pub right_bbox: [i16; 4],
    pub left_bbox: [i16; 4],
    /// [`SUBSECTOR_CHILD_BIT`] set → subsector index in the low 15 bits.
    pub right_child: u16,
    pub left_child: u16,
}

#[repr(C)]
#[derive(Clone, Copy, Decode, Encode, Debug, PartialEq, Eq)]
pub struct RawSector {
    pub floor_height: i16,
    pub ceiling_height: i16,
    pub floor_name: [u8; NAME_LEN],
    pub ceiling_name: [u8; NAME_LEN],
    pub light_level: i16,
    pub special: i16,
    pub tag: i16,
}

/*=======================================================================*/
/*                         Decode / encode                               */
/*=======================================================================*/

fn codec_config() -> impl config::Config + Copy {
    config::standard()
        .with_fixed_int_encoding()
        .with_little_endian()
}

/// Decode a lump as a packed array of `T`.
///
/// An empty lump decodes to an empty vector; a length that is not a
/// multiple of `size_of::<T>()` is [`ArchiveError::BadLumpInterpret`].
pub fn records<T: Decode<()>>(lump: &Lump) -> Result<Vec<T>, ArchiveError> {
    let record_size = mem::size_of::<T>();
    if lump.data.len() % record_size != 0 {
        return Err(ArchiveError::BadLumpInterpret {
            name: lump.name.clone(),
            size: lump.data.len(),
            record_size,
        });
    }

    let cfg = codec_config();
    let mut out = Vec::with_capacity(lump.data.len() / record_size);
    let mut slice = lump.data.as_slice();
    while !slice.is_empty() {
        let (value, read) = decode_from_slice::<T, _>(slice, cfg).map_err(|_| {
            ArchiveError::BadLumpInterpret {
                name: lump.name.clone(),
                size: lump.data.len(),
                record_size,
            }
        })?;
        out.push(value);
        slice = &slice[read..];
    }
    Ok(out)
}

/// Encode records back into packed lump bytes.
pub fn encode_records<T: Encode>(records: &[T]) -> Vec<u8> {
    let record_size = mem::size_of::<T>();
    let cfg = codec_config();
    let mut out = vec![0u8; records.len() * record_size];
    for (i, record) in records.iter().enumerate() {
        // Fixed-int encoding of a repr(C) record always fills exactly
        // record_size bytes.
        let written = encode_into_slice(record, &mut out[i * record_size..], cfg)
            .expect("record encode cannot fail");
        debug_assert_eq!(written, record_size);
    }
    out
}

/*=======================================================================*/
/*                                Tests                                  */
/*=======================================================================*/
