//! Core geometry types for terrasplice.
//!
//! ## Rust Lesson #3: Structs & Derives
//!
//! The `#[derive(...)]` macro auto-generates common functionality:
//! - `Debug` = print with `{:?}`
//! - `Clone` = can duplicate the value
//! - `Copy` = can copy implicitly (small stack values only)
//! - `PartialEq` = can compare with `==`
//!
//! Coordinates are geodetic: `x` is longitude, `y` is latitude (both in
//! degrees) and `z` is an elevation in meters, or [`NO_ELEVATION`] when the
//! source did not provide one.

use serde::{Deserialize, Serialize};

/// Elevation sentinel for points whose height is not known yet.
pub const NO_ELEVATION: f64 = -9999.0;

/// Coordinate tolerance used when comparing lon/lat values.
pub const SG_EPSILON: f64 = 0.0000001;

/// A 3D point: lon, lat, elevation.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// One ring of a polygon.
///
/// Rings are stored open: the first point is not repeated at the end.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Contour {
    pub points: Vec<Point3>,
    /// True when this ring cuts a hole out of the polygon.
    pub hole: bool,
}

/// A polygon made of outer rings and holes.
///
/// ## Rust Lesson #4: Ownership & Vec
///
/// This struct OWNS its contours - when it's dropped, they're freed.
/// Passing `&Polygon` lends it out read-only; clipping produces new
/// polygons instead of mutating the inputs.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Polygon {
    pub contours: Vec<Contour>,
}

// ============================================================================
// IMPLEMENTATIONS (methods)
// ============================================================================

impl Point3 {
    #[inline]
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// A point with no known elevation.
    #[inline]
    pub fn flat(x: f64, y: f64) -> Self {
        Self { x, y, z: NO_ELEVATION }
    }

    #[inline]
    pub fn has_elevation(&self) -> bool {
        self.z > NO_ELEVATION + 1.0
    }

    /// Planar distance, ignoring elevation.
    #[inline]
    pub fn distance_2d(&self, other: Point3) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// True when lon and lat agree within `epsilon`.
    #[inline]
    pub fn same_location(&self, other: Point3, epsilon: f64) -> bool {
        (self.x - other.x).abs() < epsilon && (self.y - other.y).abs() < epsilon
    }

    #[inline]
    pub fn sub(&self, other: Point3) -> Point3 {
        Point3::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }

    #[inline]
    pub fn dot(&self, other: Point3) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    #[inline]
    pub fn length(&self) -> f64 {
        self.dot(*self).sqrt()
    }

    /// Unit vector in the same direction, or the zero vector.
    pub fn normalized(&self) -> Point3 {
        let len = self.length();
        if len > 0.0 {
            Point3::new(self.x / len, self.y / len, self.z / len)
        } else {
            Point3::default()
        }
    }
}

impl Contour {
    pub fn new(points: Vec<Point3>, hole: bool) -> Self {
        Self { points, hole }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Signed shoelace area in squared degrees (positive = CCW).
    #[inline]
    pub fn signed_area(&self) -> f64 {
        signed_area_of_points(&self.points)
    }

    /// Unsigned planar area in squared degrees.
    ///
    /// This is not a metric area; it shrinks toward the poles. The sliver
    /// thresholds are tuned against this value.
    #[inline]
    pub fn area(&self) -> f64 {
        self.signed_area().abs()
    }

    /// Smallest angle (radians) between the two edges meeting at any vertex.
    ///
    /// Vertices with a zero-length edge are skipped. Returns 0.0 for
    /// rings with fewer than three points.
    pub fn min_angle(&self) -> f64 {
        let n = self.points.len();
        if n < 3 {
            return 0.0;
        }

        let mut min_angle = std::f64::consts::PI;
        let mut found = false;
        for i in 0..n {
            let prev = self.points[(i + n - 1) % n];
            let cur = self.points[i];
            let next = self.points[(i + 1) % n];

            if let Some(angle) = vertex_angle(prev, cur, next) {
                found = true;
                min_angle = min_angle.min(angle);
            }
        }

        if found { min_angle } else { 0.0 }
    }

    /// Bounding box as (min_x, min_y, max_x, max_y).
    pub fn bounding_box(&self) -> Option<(f64, f64, f64, f64)> {
        bounding_box_of_points(&self.points)
    }
}

impl Polygon {
    pub fn new() -> Self {
        Self::default()
    }

    /// A polygon with a single outer ring.
    pub fn from_points(points: Vec<Point3>) -> Self {
        Self {
            contours: vec![Contour::new(points, false)],
        }
    }

    /// Axis-aligned rectangle from `min` to `max`, counter-clockwise.
    pub fn rectangle(min: (f64, f64), max: (f64, f64)) -> Self {
        Self::from_points(vec![
            Point3::flat(min.0, min.1),
            Point3::flat(max.0, min.1),
            Point3::flat(max.0, max.1),
            Point3::flat(min.0, max.1),
        ])
    }

    pub fn add_contour(&mut self, points: Vec<Point3>, hole: bool) {
        self.contours.push(Contour::new(points, hole));
    }

    #[inline]
    pub fn contour_count(&self) -> usize {
        self.contours.len()
    }

    /// True when the polygon has no contours at all.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.contours.is_empty()
    }

    pub fn remove_contour(&mut self, index: usize) -> Contour {
        self.contours.remove(index)
    }

    /// Filled area: outer rings minus holes.
    pub fn area(&self) -> f64 {
        self.contours
            .iter()
            .map(|c| if c.hole { -c.area() } else { c.area() })
            .sum()
    }

    /// All points of all contours.
    pub fn points(&self) -> impl Iterator<Item = &Point3> + '_ {
        self.contours.iter().flat_map(|c| c.points.iter())
    }

    /// Bounding box over every contour as (min_x, min_y, max_x, max_y).
    pub fn bounding_box(&self) -> Option<(f64, f64, f64, f64)> {
        self.contours
            .iter()
            .filter_map(Contour::bounding_box)
            .reduce(|a, b| (a.0.min(b.0), a.1.min(b.1), a.2.max(b.2), a.3.max(b.3)))
    }
}

/// Angle at `cur` between the edges to `prev` and `next`, in radians.
fn vertex_angle(prev: Point3, cur: Point3, next: Point3) -> Option<f64> {
    let (ax, ay) = (prev.x - cur.x, prev.y - cur.y);
    let (bx, by) = (next.x - cur.x, next.y - cur.y);
    let la = (ax * ax + ay * ay).sqrt();
    let lb = (bx * bx + by * by).sqrt();
    if la == 0.0 || lb == 0.0 {
        return None;
    }
    let cos = ((ax * bx + ay * by) / (la * lb)).clamp(-1.0, 1.0);
    Some(cos.acos())
}

/// Calculate signed area of a point sequence using the shoelace formula.
///
/// Returns:
/// - Positive value for counter-clockwise winding
/// - Negative value for clockwise winding
pub fn signed_area_of_points(points: &[Point3]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }

    let mut area = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        area += points[i].x * points[j].y;
        area -= points[j].x * points[i].y;
    }
    area / 2.0
}

fn bounding_box_of_points(points: &[Point3]) -> Option<(f64, f64, f64, f64)> {
    if points.is_empty() {
        return None;
    }

    let min_x = points.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
    let min_y = points.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
    let max_x = points.iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max);
    let max_y = points.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);

    Some((min_x, min_y, max_x, max_y))
}

// ============================================================================
// TESTS
// ============================================================================
