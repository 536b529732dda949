//! Tile node list.
//!
//! Nodes are deduplicated on lon/lat: adding a point that lies within
//! [`PROXIMITY_EPSILON`] of an existing node returns the existing index.

use crate::geodesy::fake_normal;
use crate::geometry::Point3;

/// Two nodes closer than this in both lon and lat are the same node.
pub const PROXIMITY_EPSILON: f64 = 0.000001;

/// A mesh vertex with its optional surface normal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileNode {
    pub point: Point3,
    pub normal: Option<Point3>,
    /// Elevation came from the source data and must not be re-sampled.
    pub fixed_elevation: bool,
}

impl TileNode {
    pub fn new(point: Point3) -> Self {
        Self {
            point,
            normal: None,
            fixed_elevation: false,
        }
    }

    /// The stored normal, or the straight-up normal at this point.
    pub fn normal_or_fake(&self) -> Point3 {
        self.normal.unwrap_or_else(|| fake_normal(self.point))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeList {
    nodes: Vec<TileNode>,
}

impl NodeList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of the node at `p`, if any.
    pub fn find(&self, p: Point3) -> Option<usize> {
        self.nodes
            .iter()
            .position(|n| n.point.same_location(p, PROXIMITY_EPSILON))
    }

    /// Add `p` unless a node already sits there; returns its index.
    pub fn unique_add(&mut self, p: Point3) -> usize {
        match self.find(p) {
            Some(i) => i,
            None => {
                self.nodes.push(TileNode::new(p));
                self.nodes.len() - 1
            }
        }
    }

    /// Like [`unique_add`](Self::unique_add), but the node's elevation is
    /// taken from `p` and marked fixed even if the node already existed.
    pub fn unique_add_fixed_elevation(&mut self, p: Point3) -> usize {
        let i = self.unique_add(p);
        let node = &mut self.nodes[i];
        node.point.z = p.z;
        node.fixed_elevation = true;
        i
    }

    /// Add `p` and set its normal, overwriting any previous normal.
    pub fn unique_add_with_normal(&mut self, p: Point3, normal: Point3) -> usize {
        let i = self.unique_add(p);
        self.nodes[i].normal = Some(normal);
        i
    }

    pub fn set_normal(&mut self, index: usize, normal: Point3) {
        if let Some(node) = self.nodes.get_mut(index) {
            node.normal = Some(normal);
        }
    }

    /// Give every node without a normal its fake normal.
    pub fn fill_missing_normals(&mut self) {
        for node in self.nodes.iter_mut().filter(|n| n.normal.is_none()) {
            node.normal = Some(fake_normal(node.point));
        }
    }

    pub fn get(&self, index: usize) -> Option<&TileNode> {
        self.nodes.get(index)
    }

    pub fn point(&self, index: usize) -> Option<Point3> {
        self.nodes.get(index).map(|n| n.point)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TileNode> {
        self.nodes.iter()
    }

    pub fn points(&self) -> impl Iterator<Item = Point3> + '_ {
        self.nodes.iter().map(|n| n.point)
    }
}
