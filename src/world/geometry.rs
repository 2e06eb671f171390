//! In-memory map representation.
//!
//! Everything is arena-allocated: the [`Map`] owns flat vectors of each
//! entity kind and all cross-references are indices into those vectors.
//! That makes the reference cycles of the format (sector ↔ linedef ↔
//! sidedef ↔ sector, node ↔ node) trivially representable without any
//! reference counting.

use bitflags::bitflags;
use glam::Vec2;

pub type VertexId = u16;
pub type SectorId = u16;
pub type SidedefId = u16;
pub type LinedefId = u16;
pub type SegId = u16;
pub type SubsectorId = u16;
pub type NodeId = u16;

/// A 2-D map-space point.  Coordinates are whole map units on disk and are
/// widened to `f32` once, at load time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Vertex {
    pub pos: Vec2,
}

/// A map object: position, facing and type.  Only the player start is
/// consumed by the viewer; the rest are kept for completeness.
#[derive(Clone, Debug)]
pub struct Thing {
    pub pos: Vec2,
    /// Facing angle in degrees.
    pub angle: f32,
    pub kind: i16,
    pub flags: i16,
}

/// A horizontal region with a floor and a ceiling.
#[derive(Clone, Debug)]
pub struct Sector {
    pub floor_height: i16,
    pub ceiling_height: i16,
    pub floor_texture: String,
    pub ceiling_texture: String,
    pub light_level: i16,
    pub special: i16,
    pub tag: i16,
    /// Linedefs with a side facing into this sector (filled by the
    /// loader's fixup pass).
    pub linedefs: Vec<LinedefId>,
}

/// One face of a wall.
#[derive(Clone, Debug)]
pub struct Sidedef {
    pub x_offset: i16,
    pub y_offset: i16,
    pub upper_texture: String,
    pub lower_texture: String,
    pub middle_texture: String,
    /// The sector this side faces into.
    pub sector: SectorId,
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct LinedefFlags: u16 {
        const IMPASSABLE      = 0x0001;
        const BLOCK_MONSTERS  = 0x0002;
        const TWO_SIDED       = 0x0004;
        const UPPER_UNPEGGED  = 0x0010;
        const LOWER_UNPEGGED  = 0x0020;
        const SECRET          = 0x0040;
        const BLOCK_SOUND     = 0x0080;
        const NOT_ON_MAP      = 0x0200;
        const ALREADY_ON_MAP  = 0x1000;
    }
}

/// A wall between two vertices.  One-sided lines are solid walls; lines
/// with both sides are "windows" between two sectors.
#[derive(Clone, Debug)]
pub struct Linedef {
    pub start: VertexId,
    pub end: VertexId,
    pub flags: LinedefFlags,
    pub special: i16,
    pub tag: i16,
    pub front: Option<SidedefId>,
    pub back: Option<SidedefId>,
}

impl Linedef {
    pub fn is_two_sided(&self) -> bool {
        self.front.is_some() && self.back.is_some()
    }
}

/// A BSP-generated fragment of a linedef.
#[derive(Clone, Debug)]
pub struct Seg {
    pub start: VertexId,
    pub end: VertexId,
    pub linedef: LinedefId,
    /// The side of the parent linedef facing the subsector that owns
    /// this seg (resolved from the wire's direction field at load).
    pub sidedef: SidedefId,
    /// Radians, converted from the wire's binary-angle encoding.
    pub angle: f32,
    /// Texel offset along the parent linedef.
    pub offset: i16,
}

/// A convex cell of the partition: a contiguous run of segs.
#[derive(Clone, Copy, Debug)]
pub struct Subsector {
    pub first_seg: SegId,
    pub seg_count: u16,
}

/// One child of a BSP node.  The wire encodes the distinction in the
/// index's sign bit; in memory it is an explicit tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BspChild {
    Node(NodeId),
    Subsector(SubsectorId),
}

/// An interior node of the BSP tree: an oriented partition line and two
/// children.  Children are never absent.
#[derive(Clone, Debug)]
pub struct Node {
    pub partition_start: Vec2,
    pub partition_end: Vec2,
    pub right: BspChild,
    pub left: BspChild,
}

/// A fully linked level.  Immutable once the loader returns it.
#[derive(Debug)]
pub struct Map {
    pub name: String,
    pub things: Vec<Thing>,
    pub vertices: Vec<Vertex>,
    pub sectors: Vec<Sector>,
    pub sidedefs: Vec<Sidedef>,
    pub linedefs: Vec<Linedef>,
    pub segs: Vec<Seg>,
    pub subsectors: Vec<Subsector>,
    pub nodes: Vec<Node>,
    /// Index of the BSP root (the last node in the lump).
    pub bsp_root: NodeId,
}

impl Map {
    /// Seg ids of a subsector, in stored order.
    pub fn seg_ids_of(&self, ss: SubsectorId) -> impl Iterator<Item = SegId> {
        let ss = self.subsectors[ss as usize];
        ss.first_seg..ss.first_seg + ss.seg_count
    }

    /// The sector a subsector lies in, read off its first seg's sidedef.
    pub fn sector_of_subsector(&self, ss: SubsectorId) -> SectorId {
        let seg = &self.segs[self.subsectors[ss as usize].first_seg as usize];
        self.sidedefs[seg.sidedef as usize].sector
    }

    /// The sidedef on the far side of a seg's linedef, if the line has
    /// one.  `None` means the seg belongs to a solid one-sided wall.
    pub fn opposite_sidedef(&self, seg: &Seg) -> Option<SidedefId> {
        let linedef = &self.linedefs[seg.linedef as usize];
        if linedef.front == Some(seg.sidedef) {
            linedef.back
        } else {
            linedef.front
        }
    }

    /// The sector on the far side of a seg, if any.
    pub fn opposite_sector(&self, seg: &Seg) -> Option<SectorId> {
        self.opposite_sidedef(seg)
            .map(|sd| self.sidedefs[sd as usize].sector)
    }

    /// The player-1 start, when the map has one.
    pub fn player_start(&self) -> Option<&Thing> {
        self.things.iter().find(|t| t.kind == 1)
    }

    /// Axis-aligned bounds of all vertices, `None` for an empty map.
    pub fn bounding_box(&self) -> Option<(Vec2, Vec2)> {
        let first = self.vertices.first()?.pos;
        let (min, max) = self
            .vertices
            .iter()
            .fold((first, first), |(lo, hi), v| (lo.min(v.pos), hi.max(v.pos)));
        Some((min, max))
    }
}
