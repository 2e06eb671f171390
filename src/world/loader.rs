//! Level loader and linker.
//!
//! Decodes a level's lump group from an open archive and stitches the raw
//! indices into a fully linked [`Map`].  Decoding runs in dependency
//! order so every cross-reference can be validated as it is resolved;
//! whatever cannot be resolved while a lump is being walked (the
//! sector → linedef back-references) is filled by a fixup pass at the end.

use std::f32::consts::PI;

use glam::Vec2;
use log::info;
use thiserror::Error;

use crate::wad::{
    records, trim_name, Archive, ArchiveError, Lump, RawLinedef, RawNode, RawSector, RawSeg,
    RawSidedef, RawSubsector, RawThing, RawVertex, NO_SIDEDEF, SUBSECTOR_CHILD_BIT,
};
use crate::world::geometry::{
    BspChild, Linedef, LinedefFlags, Map, Node, Sector, Seg, Sidedef, Subsector, Thing, Vertex,
};

#[derive(Error, Debug)]
pub enum MapError {
    /// Out-of-range index, malformed record or missing required lump.
    #[error("invalid map data: {0}")]
    InvalidData(String),

    #[error(transparent)]
    Archive(#[from] ArchiveError),
}

/// Convert the wire's binary-angle encoding (`degrees * 32767 / 180`).
fn binary_angle_to_degrees(raw: i16) -> f32 {
    raw as f32 * 180.0 / 32767.0
}

fn binary_angle_to_radians(raw: i16) -> f32 {
    raw as f32 * PI / 32767.0
}

/// Validate a raw cross-reference against the arena it points into.
fn check_index(raw: i16, len: usize, what: &str) -> Result<u16, MapError> {
    if raw >= 0 && (raw as usize) < len {
        Ok(raw as u16)
    } else {
        Err(MapError::InvalidData(format!(
            "{what} index {raw} out of range (arena holds {len})"
        )))
    }
}

/// A level lump that must exist for the map to load at all.
fn required_lump<'w>(
    archive: &'w Archive,
    level: &str,
    lump_name: &'static str,
) -> Result<&'w Lump, MapError> {
    archive.find(&[level, lump_name]).map_err(|_| {
        MapError::InvalidData(format!(
            "level `{level}` is missing required lump `{lump_name}`"
        ))
    })
}

/// Decode the level named `name` from `archive` into a linked [`Map`].
pub fn load_map(archive: &Archive, name: &str) -> Result<Map, MapError> {
    archive.find(&[name]).map_err(|_| {
        MapError::InvalidData(format!("level marker `{name}` not found in archive"))
    })?;
    let lump = |lump_name: &'static str| required_lump(archive, name, lump_name);

    /*----- 1. Vertices: everything else points at them -----------------*/
    let vertices: Vec<Vertex> = records::<RawVertex>(lump("VERTEXES")?)?
        .into_iter()
        .map(|r| Vertex {
            pos: Vec2::new(r.x as f32, r.y as f32),
        })
        .collect();

    /*----- 2. Sectors (linedef back-refs stay empty until fixup) -------*/
    let mut sectors: Vec<Sector> = records::<RawSector>(lump("SECTORS")?)?
        .into_iter()
        .map(|r| Sector {
            floor_height: r.floor_height,
            ceiling_height: r.ceiling_height,
            floor_texture: trim_name(&r.floor_name).to_string(),
            ceiling_texture: trim_name(&r.ceiling_name).to_string(),
            light_level: r.light_level,
            special: r.special,
            tag: r.tag,
            linedefs: Vec::new(),
        })
        .collect();

    /*----- 3. Sidedefs reference sectors -------------------------------*/
    let sidedefs: Vec<Sidedef> = records::<RawSidedef>(lump("SIDEDEFS")?)?
        .into_iter()
        .map(|r| {
            Ok(Sidedef {
                x_offset: r.x_offset,
                y_offset: r.y_offset,
                upper_texture: trim_name(&r.upper_name).to_string(),
                lower_texture: trim_name(&r.lower_name).to_string(),
                middle_texture: trim_name(&r.middle_name).to_string(),
                sector: check_index(r.sector, sectors.len(), "sidedef sector")?,
            })
        })
        .collect::<Result<_, MapError>>()?;

    /*----- 4. Linedefs reference vertices and sidedefs ------------------*/
    let linedefs: Vec<Linedef> = records::<RawLinedef>(lump("LINEDEFS")?)?
        .into_iter()
        .map(|r| {
            let side = |raw: i16, which: &str| -> Result<Option<u16>, MapError> {
                if raw == NO_SIDEDEF {
                    Ok(None)
                } else {
                    check_index(raw, sidedefs.len(), which).map(Some)
                }
            };
            let linedef = Linedef {
                start: check_index(r.start_vertex, vertices.len(), "linedef start vertex")?,
                end: check_index(r.end_vertex, vertices.len(), "linedef end vertex")?,
                flags: LinedefFlags::from_bits_truncate(r.flags as u16),
                special: r.special,
                tag: r.tag,
                front: side(r.front_sidedef, "linedef front sidedef")?,
                back: side(r.back_sidedef, "linedef back sidedef")?,
            };
            if linedef.front.is_none() && linedef.back.is_none() {
                return Err(MapError::InvalidData(
                    "linedef has neither a front nor a back sidedef".to_string(),
                ));
            }
            Ok(linedef)
        })
        .collect::<Result<_, MapError>>()?;

    /*----- 5. Segs resolve their facing sidedef through `direction` ----*/
    let segs: Vec<Seg> = records::<RawSeg>(lump("SEGS")?)?
        .into_iter()
        .map(|r| {
            let linedef_id = check_index(r.linedef, linedefs.len(), "seg linedef")?;
            let linedef = &linedefs[linedef_id as usize];
            let facing = if r.direction == 0 {
                linedef.front
            } else {
                linedef.back
            };
            let sidedef = facing.ok_or_else(|| {
                MapError::InvalidData(format!(
                    "seg faces side {} of linedef {linedef_id}, which has no sidedef there",
                    r.direction
                ))
            })?;
            Ok(Seg {
                start: check_index(r.start_vertex, vertices.len(), "seg start vertex")?,
                end: check_index(r.end_vertex, vertices.len(), "seg end vertex")?,
                linedef: linedef_id,
                sidedef,
                angle: binary_angle_to_radians(r.angle),
                offset: r.offset,
            })
        })
        .collect::<Result<_, MapError>>()?;

    /*----- 6. Subsectors hold contiguous seg runs ----------------------*/
    let subsectors: Vec<Subsector> = records::<RawSubsector>(lump("SSECTORS")?)?
        .into_iter()
        .map(|r| {
            let first = check_index(r.first_seg, segs.len(), "subsector first seg")?;
            if r.seg_count <= 0 || first as usize + r.seg_count as usize > segs.len() {
                return Err(MapError::InvalidData(format!(
                    "subsector seg run {}+{} outside seg arena ({})",
                    r.first_seg,
                    r.seg_count,
                    segs.len()
                )));
            }
            Ok(Subsector {
                first_seg: first,
                seg_count: r.seg_count as u16,
            })
        })
        .collect::<Result<_, MapError>>()?;

    /*----- 7. Nodes: the child sign bit becomes an explicit tag --------*/
    let raw_nodes = records::<RawNode>(lump("NODES")?)?;
    let node_count = raw_nodes.len();
    let nodes: Vec<Node> = raw_nodes
        .into_iter()
        .map(|r| {
            let start = Vec2::new(r.partition_x as f32, r.partition_y as f32);
            let delta = Vec2::new(r.partition_dx as f32, r.partition_dy as f32);
            Ok(Node {
                partition_start: start,
                partition_end: start + delta,
                right: decode_child(r.right_child, node_count, subsectors.len())?,
                left: decode_child(r.left_child, node_count, subsectors.len())?,
            })
        })
        .collect::<Result<_, MapError>>()?;
    if nodes.is_empty() {
        return Err(MapError::InvalidData(format!(
            "level `{name}` has no BSP nodes"
        )));
    }
    let bsp_root = (nodes.len() - 1) as u16;

    /*----- 8. Things (the viewer only consumes the player start) -------*/
    let things: Vec<Thing> = records::<RawThing>(lump("THINGS")?)?
        .into_iter()
        .map(|r| Thing {
            pos: Vec2::new(r.x as f32, r.y as f32),
            angle: binary_angle_to_degrees(r.angle),
            kind: r.kind,
            flags: r.flags,
        })
        .collect();

    let mut map = Map {
        name: name.to_string(),
        things,
        vertices,
        sectors: Vec::new(),
        sidedefs,
        linedefs,
        segs,
        subsectors,
        nodes,
        bsp_root,
    };

    /*----- 9. Fixup: linedefs → facing sectors -------------------------*/
    // Each side credits the sector *its own* sidedef faces, once.
    for (i, linedef) in map.linedefs.iter().enumerate() {
        for sidedef in [linedef.front, linedef.back].into_iter().flatten() {
            let sector = map.sidedefs[sidedef as usize].sector;
            sectors[sector as usize].linedefs.push(i as u16);
        }
    }
    map.sectors = sectors;

    info!(
        "loaded level {}: {} vertices, {} linedefs, {} segs, {} subsectors, {} nodes, {} sectors",
        map.name,
        map.vertices.len(),
        map.linedefs.len(),
        map.segs.len(),
        map.subsectors.len(),
        map.nodes.len(),
        map.sectors.len()
    );
    Ok(map)
}

fn decode_child(raw: u16, nodes: usize, subsectors: usize) -> Result<BspChild, MapError> {
    if raw & SUBSECTOR_CHILD_BIT != 0 {
        let idx = raw & !SUBSECTOR_CHILD_BIT;
        if (idx as usize) < subsectors {
            Ok(BspChild::Subsector(idx))
        } else {
            Err(MapError::InvalidData(format!(
                "node child subsector index {idx} out of range ({subsectors})"
            )))
        }
    } else if (raw as usize) < nodes {
        Ok(BspChild::Node(raw))
    } else {
        Err(MapError::InvalidData(format!(
            "node child node index {raw} out of range ({nodes})"
        )))
    }
}

/*=======================================================================*/
/*                                Tests                                  */
/*=======================================================================*/
