//! Tile-edge matching.
//!
//! Neighboring tiles are built one after another, each with its own node
//! set. To keep the mesh watertight, both sides of a shared border must
//! use exactly the same vertices. [`TileMatcher`] takes care of that:
//!
//! ```text
//!   load_neighbor_shared   read what built neighbors published
//!   split_tile             sort own nodes into corners / edges / body,
//!                          dropping own nodes on borders a neighbor owns
//!   (triangulation)
//!   assemble_tile          rebuild the node and segment lists
//!   write_shared           publish every border no neighbor owned
//! ```
//!
//! Each of the eight borders (four corners, four edges) carries a
//! [`RelationState`]. It starts `Unresolved` and moves once, either to
//! `ResolvedByNeighbor` or to `ResolvedBySelf`.

use tracing::{debug, info, trace};

use crate::bucket::Bucket;
use crate::construct::TileConstruct;
use crate::error::Result;
use crate::geodesy::fake_normal;
use crate::geometry::{Point3, SG_EPSILON};
use crate::nodes::{NodeList, TileNode};
use crate::shared::{Relation, ResolvedData, SharedBoundaryStore, SharedNode};
use crate::triseg::{TriSegment, TriSegmentList};

/// Who decided the nodes on a border.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RelationState {
    #[default]
    Unresolved,
    ResolvedByNeighbor,
    ResolvedBySelf,
}

impl RelationState {
    pub fn is_resolved(self) -> bool {
        self != RelationState::Unresolved
    }
}

/// A segment detached from its node list, kept by endpoint coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentEnds {
    pub p1: Point3,
    pub p2: Point3,
    pub boundary_marker: i32,
}

/// Per-tile matching state. Reused across tiles; see
/// [`load_neighbor_shared`](Self::load_neighbor_shared).
#[derive(Debug, Clone, Default)]
pub struct TileMatcher {
    corners: [Option<SharedNode>; 4],
    edges: [Vec<SharedNode>; 4],
    states: [RelationState; 8],
    body_nodes: Vec<TileNode>,
    body_segments: Vec<SegmentEnds>,
    edge_segments: [Vec<SegmentEnds>; 4],
}

/// Tile corner at sea level with a straight-up normal.
fn fallback_corner(construct: &TileConstruct, relation: Relation) -> SharedNode {
    let ((min_x, min_y), (max_x, max_y)) = construct.bounds();
    let (x, y) = match relation {
        Relation::Se => (max_x, min_y),
        Relation::Ne => (max_x, max_y),
        Relation::Nw => (min_x, max_y),
        _ => (min_x, min_y),
    };
    let p = Point3::new(x, y, 0.0);
    SharedNode::new(p, fake_normal(p))
}

/// Slot of an edge relation in the edge arrays.
fn edge_slot(relation: Relation) -> usize {
    relation.index() - 4
}

impl TileMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, relation: Relation) -> RelationState {
        self.states[relation.index()]
    }

    /// Node of a corner relation, once known.
    pub fn corner(&self, relation: Relation) -> Option<&SharedNode> {
        if !relation.is_corner() {
            return None;
        }
        self.corners[relation.index()].as_ref()
    }

    /// Nodes of an edge relation (empty for corners).
    pub fn edge_nodes(&self, relation: Relation) -> &[SharedNode] {
        if relation.is_corner() {
            return &[];
        }
        &self.edges[edge_slot(relation)]
    }

    pub fn body_nodes(&self) -> &[TileNode] {
        &self.body_nodes
    }

    pub fn body_segments(&self) -> &[SegmentEnds] {
        &self.body_segments
    }

    /// Segments lying on an edge (empty for corners).
    pub fn edge_segments(&self, relation: Relation) -> &[SegmentEnds] {
        if relation.is_corner() {
            return &[];
        }
        &self.edge_segments[edge_slot(relation)]
    }

    // ========================================================================
    // LOADING
    // ========================================================================

    /// Copy what `bucket` published under `search` into `dest`.
    ///
    /// Corners keep the last node found, edges append. A published empty
    /// edge resolves `dest` with no nodes. Returns whether anything was
    /// found; missing data is not an error.
    pub fn scan_share_file(
        &mut self,
        store: &dyn SharedBoundaryStore,
        bucket: &Bucket,
        search: Relation,
        dest: Relation,
    ) -> bool {
        let Some(data) = store.read(bucket, search) else {
            trace!(bucket = bucket.index(), search = search.tag(), "nothing shared");
            return false;
        };

        match data {
            ResolvedData::Nodes(nodes) => {
                trace!(
                    bucket = bucket.index(),
                    search = search.tag(),
                    dest = dest.tag(),
                    nodes = nodes.len(),
                    "found shared nodes"
                );
                if dest.is_corner() {
                    if let Some(last) = nodes.last() {
                        self.corners[dest.index()] = Some(*last);
                    }
                } else {
                    self.edges[edge_slot(dest)].extend(nodes);
                }
            }
            ResolvedData::Empty => {
                trace!(bucket = bucket.index(), dest = dest.tag(), "shared edge is empty");
            }
        }

        self.states[dest.index()] = RelationState::ResolvedByNeighbor;
        true
    }

    /// Consult every neighbor that may hold `relation`.
    pub fn load_shared(
        &mut self,
        construct: &TileConstruct,
        store: &dyn SharedBoundaryStore,
        relation: Relation,
    ) {
        for &(dx, dy, theirs) in relation.neighbor_sources() {
            let neighbor = construct.bucket.offset(dx, dy);
            self.scan_share_file(store, &neighbor, theirs, relation);
        }
    }

    /// Start a tile: forget everything, then read all neighbor data.
    pub fn load_neighbor_shared(&mut self, construct: &TileConstruct, store: &dyn SharedBoundaryStore) {
        info!(bucket = construct.bucket.index(), "loading shared edge data");

        *self = Self::default();
        store.start_pass();

        for relation in Relation::CORNERS {
            self.load_shared(construct, store, relation);
        }
        for edge in &mut self.edges {
            edge.clear();
        }
        for relation in Relation::EDGES {
            self.load_shared(construct, store, relation);
        }

        let resolved = self.states.iter().filter(|s| s.is_resolved()).count();
        debug!(resolved, "neighbor borders resolved");
    }

    /// Fill still-unresolved borders from this tile's own published data.
    pub fn load_missing_shared(&mut self, construct: &TileConstruct, store: &dyn SharedBoundaryStore) {
        for relation in Relation::ALL {
            if self.state(relation).is_resolved() {
                continue;
            }
            if self.scan_share_file(store, &construct.bucket, relation, relation) {
                self.states[relation.index()] = RelationState::ResolvedBySelf;
            }
        }
    }

    // ========================================================================
    // SPLITTING
    // ========================================================================

    /// Sort the construct's nodes and segments by where they lie on the tile.
    pub fn split_tile(&mut self, construct: &TileConstruct) {
        let ((min_x, min_y), (max_x, max_y)) = construct.bounds();
        debug!(
            bucket = construct.bucket.index(),
            nodes = construct.nodes.len(),
            "splitting tile"
        );

        for relation in Relation::CORNERS {
            if !self.state(relation).is_resolved() {
                self.corners[relation.index()] = Some(fallback_corner(construct, relation));
            }
        }
        for relation in Relation::EDGES {
            if !self.state(relation).is_resolved() {
                self.edges[edge_slot(relation)].clear();
            }
        }
        self.body_nodes.clear();

        let near = |a: f64, b: f64| (a - b).abs() < SG_EPSILON;

        for node in construct.nodes.iter() {
            let p = node.point;
            let relation = if near(p.x, min_x) && near(p.y, min_y) {
                Some(Relation::Sw)
            } else if near(p.x, max_x) && near(p.y, min_y) {
                Some(Relation::Se)
            } else if near(p.x, max_x) && near(p.y, max_y) {
                Some(Relation::Ne)
            } else if near(p.x, min_x) && near(p.y, max_y) {
                Some(Relation::Nw)
            } else if near(p.x, min_x) {
                Some(Relation::West)
            } else if near(p.x, max_x) {
                Some(Relation::East)
            } else if near(p.y, max_y) {
                Some(Relation::North)
            } else if near(p.y, min_y) {
                Some(Relation::South)
            } else {
                None
            };

            let Some(relation) = relation else {
                self.body_nodes.push(*node);
                continue;
            };
            if self.state(relation).is_resolved() {
                continue;
            }

            let shared = SharedNode::new(p, node.normal_or_fake());
            if relation.is_corner() {
                self.corners[relation.index()] = Some(shared);
            } else {
                self.edges[edge_slot(relation)].push(shared);
            }
        }

        self.body_segments.clear();
        for list in &mut self.edge_segments {
            list.clear();
        }

        for seg in construct.segments.iter() {
            let (Some(p1), Some(p2)) = (construct.nodes.point(seg.n1), construct.nodes.point(seg.n2)) else {
                debug!(n1 = seg.n1, n2 = seg.n2, "segment references a missing node");
                continue;
            };
            let ends = SegmentEnds {
                p1,
                p2,
                boundary_marker: seg.boundary_marker,
            };

            let edge = if near(p1.y, p2.y) {
                if near(p1.y, max_y) {
                    Some(Relation::North)
                } else if near(p1.y, min_y) {
                    Some(Relation::South)
                } else {
                    None
                }
            } else if near(p1.x, p2.x) {
                if near(p1.x, max_x) {
                    Some(Relation::East)
                } else if near(p1.x, min_x) {
                    Some(Relation::West)
                } else {
                    None
                }
            } else {
                None
            };

            match edge {
                Some(relation) => self.edge_segments[edge_slot(relation)].push(ends),
                None => self.body_segments.push(ends),
            }
        }

        debug!(
            body_nodes = self.body_nodes.len(),
            body_segments = self.body_segments.len(),
            "tile split"
        );
    }

    // ========================================================================
    // PUBLISHING
    // ========================================================================

    /// Publish every border this tile owns.
    ///
    /// Borders a neighbor already published are skipped; the rest become
    /// `ResolvedBySelf`.
    pub fn write_shared(
        &mut self,
        construct: &TileConstruct,
        store: &mut dyn SharedBoundaryStore,
    ) -> Result<()> {
        let mut records = Vec::new();

        for relation in Relation::ALL {
            if self.state(relation) == RelationState::ResolvedByNeighbor {
                continue;
            }

            let data = if relation.is_corner() {
                match self.corners[relation.index()] {
                    Some(node) => ResolvedData::Nodes(vec![node]),
                    None => continue,
                }
            } else {
                let nodes = &self.edges[edge_slot(relation)];
                if nodes.is_empty() {
                    ResolvedData::Empty
                } else {
                    ResolvedData::Nodes(nodes.clone())
                }
            };
            records.push((relation, data));
        }

        store.publish(&construct.bucket, &records)?;

        for (relation, _) in &records {
            self.states[relation.index()] = RelationState::ResolvedBySelf;
        }
        Ok(())
    }

    // ========================================================================
    // ASSEMBLY
    // ========================================================================

    /// Rebuild the construct's nodes and segments from the split state.
    ///
    /// Corners come first, then the north, south, east and west edge
    /// nodes (elevation fixed), then the body. The four tile borders are
    /// added corner to corner, split at every edge node, with boundary
    /// marker 1; body segments are re-attached by coordinate.
    pub fn assemble_tile(&self, construct: &mut TileConstruct) {
        let mut nodes = NodeList::new();
        let mut segments = TriSegmentList::new();

        let mut corner_index = [0usize; 4];
        for relation in Relation::CORNERS {
            let node = self.corners[relation.index()]
                .unwrap_or_else(|| fallback_corner(construct, relation));
            corner_index[relation.index()] = nodes.unique_add_with_normal(node.point, node.normal);
        }

        for relation in Relation::EDGES {
            for node in &self.edges[edge_slot(relation)] {
                let i = nodes.unique_add_fixed_elevation(node.point);
                nodes.set_normal(i, node.normal);
            }
        }

        for node in &self.body_nodes {
            match node.normal {
                Some(normal) => nodes.unique_add_with_normal(node.point, normal),
                None => nodes.unique_add(node.point),
            };
        }

        let [sw, se, ne, nw] = corner_index;
        for (a, b) in [(sw, se), (se, ne), (ne, nw), (nw, sw)] {
            segments.unique_divide_and_add(&nodes, TriSegment::new(a, b, 1));
        }

        for seg in &self.body_segments {
            let n1 = nodes.unique_add(seg.p1);
            let n2 = nodes.unique_add(seg.p2);
            segments.unique_divide_and_add(&nodes, TriSegment::new(n1, n2, seg.boundary_marker));
        }

        nodes.fill_missing_normals();

        info!(
            bucket = construct.bucket.index(),
            nodes = nodes.len(),
            segments = segments.len(),
            "assembled tile"
        );
        construct.nodes = nodes;
        construct.segments = segments;
    }
}

// ============================================================================
// TESTS
// ============================================================================
