//! Triangulation input segments.

use crate::geometry::{Point3, SG_EPSILON};
use crate::nodes::{NodeList, PROXIMITY_EPSILON};

/// An edge between two node indices.
///
/// `boundary_marker` is 1 for tile border segments, 0 otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TriSegment {
    pub n1: usize,
    pub n2: usize,
    pub boundary_marker: i32,
}

impl TriSegment {
    pub fn new(n1: usize, n2: usize, boundary_marker: i32) -> Self {
        Self {
            n1,
            n2,
            boundary_marker,
        }
    }

    /// Same endpoints, in either direction.
    pub fn same_edge(&self, other: &TriSegment) -> bool {
        (self.n1 == other.n1 && self.n2 == other.n2) || (self.n1 == other.n2 && self.n2 == other.n1)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TriSegmentList {
    segments: Vec<TriSegment>,
}

impl TriSegmentList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `seg` unless the same edge is already present; returns its index.
    pub fn unique_add(&mut self, seg: TriSegment) -> usize {
        if let Some(i) = self.segments.iter().position(|s| s.same_edge(&seg)) {
            return i;
        }
        self.segments.push(seg);
        self.segments.len() - 1
    }

    /// Add `seg`, first splitting it at every node lying on it.
    ///
    /// Works along the segment's dominant axis: a node strictly between the
    /// endpoints whose distance from the line is under
    /// [`PROXIMITY_EPSILON`] splits the segment (the closest such node
    /// wins), and both halves are added the same way.
    pub fn unique_divide_and_add(&mut self, nodes: &NodeList, seg: TriSegment) {
        let (Some(p0), Some(p1)) = (nodes.point(seg.n1), nodes.point(seg.n2)) else {
            return;
        };

        let xdist = (p0.x - p1.x).abs();
        let ydist = (p0.y - p1.y).abs();
        if xdist == 0.0 && ydist == 0.0 {
            self.unique_add(seg);
            return;
        }

        // (u, v): u along the dominant axis, v across it
        let along_x = xdist > ydist;
        let uv = |p: Point3| if along_x { (p.x, p.y) } else { (p.y, p.x) };

        let (a, b) = (uv(p0), uv(p1));
        let (lo, hi) = if a.0 < b.0 { (a, b) } else { (b, a) };
        let slope = (lo.1 - hi.1) / (lo.0 - hi.0);
        let intercept = hi.1 - slope * hi.0;

        let mut best: Option<(usize, f64)> = None;
        for (i, p) in nodes.points().enumerate() {
            let (u, v) = uv(p);
            if u > lo.0 + SG_EPSILON && u < hi.0 - SG_EPSILON {
                let err = (v - (slope * u + intercept)).abs();
                if err < PROXIMITY_EPSILON && best.is_none_or(|(_, min)| err < min) {
                    best = Some((i, err));
                }
            }
        }

        match best {
            Some((extra, _)) => {
                self.unique_divide_and_add(nodes, TriSegment::new(seg.n1, extra, seg.boundary_marker));
                self.unique_divide_and_add(nodes, TriSegment::new(extra, seg.n2, seg.boundary_marker));
            }
            None => {
                self.unique_add(seg);
            }
        }
    }

    pub fn get(&self, index: usize) -> Option<&TriSegment> {
        self.segments.get(index)
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn clear(&mut self) {
        self.segments.clear();
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TriSegment> {
        self.segments.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nodes(points: &[(f64, f64)]) -> NodeList {
        let mut list = NodeList::new();
        for &(x, y) in points {
            list.unique_add(Point3::new(x, y, 0.0));
        }
        list
    }

    #[test]
    fn reversed_segments_are_duplicates() {
        let mut segs = TriSegmentList::new();
        assert_eq!(segs.unique_add(TriSegment::new(0, 1, 0)), 0);
        assert_eq!(segs.unique_add(TriSegment::new(1, 0, 1)), 0);
        assert_eq!(segs.unique_add(TriSegment::new(1, 2, 0)), 1);
        assert_eq!(segs.len(), 2);
    }

    #[test]
    fn splits_at_nodes_on_the_segment() {
        // 0 ---- 2 -- 3 ---- 1 along x, plus an off-line node 4
        let list = nodes(&[(0.0, 0.0), (1.0, 0.0), (0.25, 0.0), (0.6, 1e-7), (0.5, 0.1)]);
        let mut segs = TriSegmentList::new();
        segs.unique_divide_and_add(&list, TriSegment::new(0, 1, 1));

        let got: Vec<(usize, usize)> = segs.iter().map(|s| (s.n1, s.n2)).collect();
        assert_eq!(got, vec![(0, 2), (2, 3), (3, 1)]);
        assert!(segs.iter().all(|s| s.boundary_marker == 1));
    }

    #[test]
    fn splits_vertical_segments() {
        let list = nodes(&[(5.0, 0.0), (5.0, 2.0), (5.0, 1.0)]);
        let mut segs = TriSegmentList::new();
        segs.unique_divide_and_add(&list, TriSegment::new(1, 0, 0));

        let got: Vec<(usize, usize)> = segs.iter().map(|s| (s.n1, s.n2)).collect();
        assert_eq!(got, vec![(1, 2), (2, 0)]);
    }

    #[test]
    fn endpoints_and_near_misses_do_not_split() {
        let list = nodes(&[(0.0, 0.0), (1.0, 1.0), (0.5, 0.5 + 1e-5)]);
        let mut segs = TriSegmentList::new();
        segs.unique_divide_and_add(&list, TriSegment::new(0, 1, 0));
        assert_eq!(segs.len(), 1);
    }
}
