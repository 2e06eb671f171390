mod bsp;
mod camera;
mod geometry;
mod loader;

pub use bsp::{BspError, Side};
pub use camera::Camera;
pub use geometry::{
    BspChild, Linedef, LinedefFlags, LinedefId, Map, Node, NodeId, Sector, SectorId, Seg, SegId,
    Sidedef, SidedefId, Subsector, SubsectorId, Thing, Vertex, VertexId,
};
pub use loader::{load_map, MapError};

#[cfg(test)]
pub(crate) use geometry::testmap;
