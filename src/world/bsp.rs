//! BSP point location and front-to-back traversal.

use glam::Vec2;
use std::ops::ControlFlow;
use thiserror::Error;

use super::geometry::{BspChild, Map, Node, NodeId, SubsectorId};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum BspError {
    /// A child was requested with the wrong tag, or the tree has no nodes.
    #[error("invalid node access: {0}")]
    InvalidNodeAccess(String),
}

/// Side of a partition line.  The encoding is fixed: segs were
/// precomputed against it, so the sign convention below must not change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

impl Node {
    /// Which side of the partition line `point` lies on.
    ///
    /// Negative cross product → [`Side::Left`]; zero or positive →
    /// [`Side::Right`].
    pub fn side_of(&self, point: Vec2) -> Side {
        let d = self.partition_end - self.partition_start;
        let r = point - self.partition_start;
        if r.x * d.y - r.y * d.x < 0.0 {
            Side::Left
        } else {
            Side::Right
        }
    }

    pub fn child(&self, side: Side) -> BspChild {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }

    /// The child on `side`, which must be an interior node.
    pub fn node_child(&self, side: Side) -> Result<NodeId, BspError> {
        match self.child(side) {
            BspChild::Node(id) => Ok(id),
            BspChild::Subsector(_) => Err(BspError::InvalidNodeAccess(
                "subsector child requested as a node".to_string(),
            )),
        }
    }

    /// The child on `side`, which must be a terminal subsector.
    pub fn subsector_child(&self, side: Side) -> Result<SubsectorId, BspError> {
        match self.child(side) {
            BspChild::Subsector(id) => Ok(id),
            BspChild::Node(_) => Err(BspError::InvalidNodeAccess(
                "node child requested as a subsector".to_string(),
            )),
        }
    }
}

impl Map {
    pub fn node(&self, id: NodeId) -> Result<&Node, BspError> {
        self.nodes
            .get(id as usize)
            .ok_or_else(|| BspError::InvalidNodeAccess(format!("node {id} out of range")))
    }

    /// Descend from the root to the subsector containing `point`.
    ///
    /// Terminates because the tree is strictly binary and finite; cost is
    /// O(depth).
    pub fn locate(&self, point: Vec2) -> Result<SubsectorId, BspError> {
        if self.nodes.is_empty() {
            return Err(BspError::InvalidNodeAccess(
                "map has no BSP nodes".to_string(),
            ));
        }
        let mut node = self.node(self.bsp_root)?;
        loop {
            match node.child(node.side_of(point)) {
                BspChild::Subsector(id) => return Ok(id),
                BspChild::Node(id) => node = self.node(id)?,
            }
        }
    }

    /// Visit subsectors front-to-back as seen from `eye`, starting at
    /// node `from` (`bsp_root` for the whole tree).  At every node the
    /// child on the eye's side is visited first.  `visit` may break to
    /// stop early (e.g. once the whole screen is occluded).
    pub fn walk_front_to_back<F>(
        &self,
        from: NodeId,
        eye: Vec2,
        visit: &mut F,
    ) -> Result<ControlFlow<()>, BspError>
    where
        F: FnMut(SubsectorId) -> ControlFlow<()>,
    {
        if self.nodes.is_empty() {
            return Err(BspError::InvalidNodeAccess(
                "map has no BSP nodes".to_string(),
            ));
        }
        self.walk_child(BspChild::Node(from), eye, visit)
    }

    fn walk_child<F>(
        &self,
        child: BspChild,
        eye: Vec2,
        visit: &mut F,
    ) -> Result<ControlFlow<()>, BspError>
    where
        F: FnMut(SubsectorId) -> ControlFlow<()>,
    {
        match child {
            BspChild::Subsector(id) => Ok(visit(id)),
            BspChild::Node(id) => {
                let node = self.node(id)?;
                let near = node.side_of(eye);
                if self.walk_child(node.child(near), eye, visit)?.is_break() {
                    return Ok(ControlFlow::Break(()));
                }
                self.walk_child(node.child(near.opposite()), eye, visit)
            }
        }
    }
}
