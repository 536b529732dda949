//! Polygon boolean operations.
//!
//! The heavy lifting (union, difference, intersection) is done by
//! `geo::BooleanOps`. This module converts between our contour-list
//! polygons (hole flags, elevations) and `geo::MultiPolygon`, and carries
//! known elevations through the operations.

use std::collections::HashMap;

use geo::{BooleanOps, Coord, LineString, MultiPolygon};
use tracing::trace;

use crate::geometry::{Contour, NO_ELEVATION, Point3, Polygon, SG_EPSILON};

/// Shape type used while clipping.
pub type Shape = MultiPolygon<f64>;

// ============================================================================
// POINT IN POLYGON (Ray Casting Algorithm)
// ============================================================================

/// Test if a point is inside a ring using ray casting.
///
/// Casts a ray to the right and counts edge crossings.
/// Odd crossings = inside, even = outside.
#[inline]
pub fn point_in_polygon(px: f64, py: f64, ring: &[Point3]) -> bool {
    let n = ring.len();
    if n < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = n - 1;

    for i in 0..n {
        let (xi, yi) = (ring[i].x, ring[i].y);
        let (xj, yj) = (ring[j].x, ring[j].y);

        if ((yi > py) != (yj > py)) && (px < (xj - xi) * (py - yi) / (yj - yi) + xi) {
            inside = !inside;
        }

        j = i;
    }

    inside
}

// ============================================================================
// ELEVATION CARRY-OVER
// ============================================================================

/// Known elevations keyed by lon/lat.
///
/// Boolean operations only see 2D coordinates, and `geo` snaps them to an
/// integer grid internally, so output vertices can drift from the input by
/// a few ulps. An output vertex within [`SG_EPSILON`] of an input vertex
/// gets that vertex's elevation back; vertices created at edge crossings
/// stay at [`NO_ELEVATION`].
#[derive(Debug, Default)]
pub struct ElevationIndex {
    cells: HashMap<(i64, i64), Vec<Point3>>,
}

impl ElevationIndex {
    pub fn from_polygons<'a>(polygons: impl IntoIterator<Item = &'a Polygon>) -> Self {
        let mut cells: HashMap<(i64, i64), Vec<Point3>> = HashMap::new();
        for poly in polygons {
            for p in poly.points().filter(|p| p.has_elevation()) {
                cells.entry(cell(p.x, p.y)).or_default().push(*p);
            }
        }
        Self { cells }
    }

    /// Elevation of the closest known vertex, or [`NO_ELEVATION`].
    pub fn lookup(&self, x: f64, y: f64) -> f64 {
        let (cx, cy) = cell(x, y);
        let target = Point3::flat(x, y);

        let mut best: Option<(f64, f64)> = None;
        for dx in -1..=1 {
            for dy in -1..=1 {
                let Some(points) = self.cells.get(&(cx + dx, cy + dy)) else {
                    continue;
                };
                for p in points.iter().filter(|p| p.same_location(target, SG_EPSILON)) {
                    let d = p.distance_2d(target);
                    if best.is_none_or(|(min, _)| d < min) {
                        best = Some((d, p.z));
                    }
                }
            }
        }
        best.map_or(NO_ELEVATION, |(_, z)| z)
    }
}

#[inline]
fn cell(x: f64, y: f64) -> (i64, i64) {
    ((x / SG_EPSILON).floor() as i64, (y / SG_EPSILON).floor() as i64)
}

// ============================================================================
// CONVERSION
// ============================================================================

fn ring_to_line_string(contour: &Contour) -> LineString<f64> {
    LineString::new(
        contour
            .points
            .iter()
            .map(|p| Coord { x: p.x, y: p.y })
            .collect(),
    )
}

fn line_string_to_points(ring: &LineString<f64>, elevations: &ElevationIndex) -> Vec<Point3> {
    let mut coords: Vec<Coord<f64>> = ring.0.clone();
    // geo rings are closed; ours are not
    if coords.len() > 1 && coords.first() == coords.last() {
        coords.pop();
    }
    coords
        .into_iter()
        .map(|c| Point3::new(c.x, c.y, elevations.lookup(c.x, c.y)))
        .collect()
}

/// Pick the outer ring a hole belongs to: the one holding most of the
/// hole's vertices, the smaller ring on a tie.
fn owning_outer(hole: &Contour, outers: &[&Contour]) -> Option<usize> {
    outers
        .iter()
        .enumerate()
        .map(|(i, outer)| {
            let inside = hole
                .points
                .iter()
                .filter(|p| point_in_polygon(p.x, p.y, &outer.points))
                .count();
            (i, inside, outer.area())
        })
        .filter(|&(_, inside, _)| inside > 0)
        .max_by(|a, b| {
            a.1.cmp(&b.1)
                .then(b.2.partial_cmp(&a.2).unwrap_or(std::cmp::Ordering::Equal))
        })
        .map(|(i, _, _)| i)
}

fn boxes_overlap(a: Option<(f64, f64, f64, f64)>, b: Option<(f64, f64, f64, f64)>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a.0 <= b.2 && b.0 <= a.2 && a.1 <= b.3 && b.1 <= a.3,
        _ => false,
    }
}

/// Convert a contour-list polygon into a `geo` multipolygon.
///
/// Holes are attached to the outer ring that encloses them. Outer rings
/// whose bounding boxes overlap are unioned so the result is a valid
/// multipolygon even when a loader handed us overlapping rings.
pub fn to_shape(poly: &Polygon) -> Shape {
    let outers: Vec<&Contour> = poly
        .contours
        .iter()
        .filter(|c| !c.hole && c.len() >= 3)
        .collect();

    let mut interiors: Vec<Vec<LineString<f64>>> = vec![Vec::new(); outers.len()];
    for hole in poly.contours.iter().filter(|c| c.hole && c.len() >= 3) {
        match owning_outer(hole, &outers) {
            Some(owner) => interiors[owner].push(ring_to_line_string(hole)),
            None => trace!(points = hole.len(), "dropping hole outside every outer ring"),
        }
    }

    let any_overlap = outers.iter().enumerate().any(|(i, a)| {
        outers[i + 1..]
            .iter()
            .any(|b| boxes_overlap(a.bounding_box(), b.bounding_box()))
    });

    let polygons: Vec<geo::Polygon<f64>> = outers
        .iter()
        .zip(interiors)
        .map(|(outer, holes)| geo::Polygon::new(ring_to_line_string(outer), holes))
        .collect();

    if !any_overlap {
        return MultiPolygon::new(polygons);
    }

    polygons
        .into_iter()
        .fold(MultiPolygon::new(Vec::new()), |acc, p| {
            acc.union(&MultiPolygon::new(vec![p]))
        })
}

/// Convert a `geo` multipolygon back into a contour-list polygon.
///
/// Each polygon contributes its exterior followed by its interiors.
pub fn from_shape(shape: &Shape, elevations: &ElevationIndex) -> Polygon {
    let mut result = Polygon::new();
    for poly in &shape.0 {
        let outer = line_string_to_points(poly.exterior(), elevations);
        if outer.len() < 3 {
            continue;
        }
        result.add_contour(outer, false);
        for interior in poly.interiors() {
            let hole = line_string_to_points(interior, elevations);
            if hole.len() >= 3 {
                result.add_contour(hole, true);
            }
        }
    }
    result
}

/// Number of rings (exteriors plus interiors) in a shape.
pub fn shape_contour_count(shape: &Shape) -> usize {
    shape.0.iter().map(|p| 1 + p.interiors().len()).sum()
}

/// Union of many polygons.
pub fn union_all<'a>(polygons: impl IntoIterator<Item = &'a Polygon>) -> Shape {
    polygons
        .into_iter()
        .fold(MultiPolygon::new(Vec::new()), |acc, p| {
            if acc.0.is_empty() {
                to_shape(p)
            } else {
                acc.union(&to_shape(p))
            }
        })
}

// ============================================================================
// BOOLEAN OPERATIONS
// ============================================================================
//
// ## Rust Lesson #24: Function Pointers
//
// All three operations share the same convert / operate / convert-back
// shape, so they pass the `geo` method in as a plain `fn` value.

fn apply(a: &Polygon, b: &Polygon, op: fn(&Shape, &Shape) -> Shape) -> Polygon {
    let elevations = ElevationIndex::from_polygons([a, b]);
    from_shape(&op(&to_shape(a), &to_shape(b)), &elevations)
}

/// `a ∪ b`
pub fn polygon_union(a: &Polygon, b: &Polygon) -> Polygon {
    apply(a, b, |x, y| x.union(y))
}

/// `a − b`
pub fn polygon_diff(a: &Polygon, b: &Polygon) -> Polygon {
    apply(a, b, |x, y| x.difference(y))
}

/// `a ∩ b`
pub fn polygon_int(a: &Polygon, b: &Polygon) -> Polygon {
    apply(a, b, |x, y| x.intersection(y))
}

// ============================================================================
// TESTS
// ============================================================================
