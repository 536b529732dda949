//! Priority-ordered area clipping.
//!
//! This is the HOT PATH of tile construction: every land-use polygon that
//! touches a tile goes through [`Clipper::clip_all`], which turns a pile of
//! overlapping areas into a puzzle of disjoint pieces covering the whole
//! tile.
//!
//! ## Algorithm
//!
//! 1. Build the tile rectangle (`safety_base`) and the land, water and
//!    island masks.
//! 2. Walk area types in priority order and polygons in insertion order,
//!    keeping a running union (`accum`) of everything placed so far.
//! 3. Each polygon keeps only the part not already claimed.
//! 4. Whatever part of the tile nobody claimed becomes ocean.
//!
//! Slivers produced along the way are moved onto adjacent polygons.

use std::path::Path;

use geo::{BooleanOps, MultiPolygon};
use tracing::{debug, info, trace};

use crate::area::AreaType;
use crate::clip::{ElevationIndex, Shape, from_shape, to_shape, union_all};
use crate::config::ClipperConfig;
use crate::error::Result;
use crate::geometry::{Point3, Polygon, SG_EPSILON};
use crate::poly_file::{GridTransform, PolyRecord, read_grid_poly_file, read_poly_file};
use crate::sliver::{merge_slivers, move_slivers};

/// One polygon list per area type, plus the tile rectangle.
#[derive(Debug, Clone)]
pub struct PolyBucket {
    polys: [Vec<Polygon>; AreaType::COUNT],
    /// The full tile footprint.
    pub safety_base: Polygon,
}

impl Default for PolyBucket {
    fn default() -> Self {
        Self::new()
    }
}

impl PolyBucket {
    pub fn new() -> Self {
        Self {
            polys: std::array::from_fn(|_| Vec::new()),
            safety_base: Polygon::new(),
        }
    }

    #[inline]
    pub fn get(&self, area: AreaType) -> &[Polygon] {
        &self.polys[area.index()]
    }

    #[inline]
    pub fn get_mut(&mut self, area: AreaType) -> &mut Vec<Polygon> {
        &mut self.polys[area.index()]
    }

    #[inline]
    pub fn push(&mut self, area: AreaType, poly: Polygon) {
        self.polys[area.index()].push(poly);
    }

    pub fn clear(&mut self) {
        for list in &mut self.polys {
            list.clear();
        }
        self.safety_base = Polygon::new();
    }

    /// Non-empty lists in priority order.
    pub fn iter(&self) -> impl Iterator<Item = (AreaType, &[Polygon])> + '_ {
        AreaType::PRIORITY
            .iter()
            .map(|&area| (area, self.get(area)))
            .filter(|(_, list)| !list.is_empty())
    }

    /// Total number of polygons over all area types.
    pub fn len(&self) -> usize {
        self.polys.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Deduplicated set of points whose elevation is fixed by the source data.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FixedElevations {
    points: Vec<Point3>,
}

impl FixedElevations {
    /// Add a point unless one already sits at the same location.
    ///
    /// Returns the index of the stored point.
    pub fn unique_add(&mut self, p: Point3) -> usize {
        if let Some(i) = self
            .points
            .iter()
            .position(|q| q.same_location(p, SG_EPSILON))
        {
            return i;
        }
        self.points.push(p);
        self.points.len() - 1
    }

    pub fn points(&self) -> &[Point3] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }
}

/// Clips per-area polygons into a gap-free, overlap-free tile cover.
#[derive(Debug, Clone, Default)]
pub struct Clipper {
    config: ClipperConfig,
    polys_in: PolyBucket,
    polys_clipped: PolyBucket,
    fixed_elevations: FixedElevations,
}

impl Clipper {
    pub fn new(config: ClipperConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &ClipperConfig {
        &self.config
    }

    /// Forget all input, output and fixed elevations.
    pub fn init(&mut self) {
        self.polys_in.clear();
        self.polys_clipped.clear();
        self.fixed_elevations.clear();
    }

    /// Load a polygon definition file (lon/lat coordinates).
    pub fn load_polys(&mut self, path: &Path) -> Result<()> {
        info!(path = %path.display(), "loading polygons");
        let records = read_poly_file(path)?;
        self.add_records(records);
        Ok(())
    }

    /// Load a polygon definition file in OSGB36 grid coordinates.
    pub fn load_osgb36_polys(&mut self, path: &Path, transform: &dyn GridTransform) -> Result<()> {
        info!(path = %path.display(), "loading OSGB36 polygons");
        let records = read_grid_poly_file(path, transform)?;
        self.add_records(records);
        Ok(())
    }

    fn add_records(&mut self, records: Vec<PolyRecord>) {
        for record in records {
            if record.is_3d {
                for p in record.polygon.points().filter(|p| p.has_elevation()) {
                    self.fixed_elevations.unique_add(*p);
                }
            }
            self.add_poly(record.area, record.polygon);
        }
    }

    /// Queue a polygon for clipping.
    pub fn add_poly(&mut self, area: AreaType, poly: Polygon) {
        trace!(%area, contours = poly.contour_count(), "adding polygon");
        self.polys_in.push(area, poly);
    }

    /// Queue a polygon by raw area slot index.
    pub fn add_poly_index(&mut self, index: usize, poly: Polygon) -> Result<()> {
        let area = AreaType::from_index(index)?;
        self.add_poly(area, poly);
        Ok(())
    }

    pub fn polys_in(&self) -> &PolyBucket {
        &self.polys_in
    }

    /// Copy of the clip result.
    pub fn polys_clipped(&self) -> PolyBucket {
        self.polys_clipped.clone()
    }

    /// Move the clip result out, leaving an empty bucket behind.
    pub fn take_polys_clipped(&mut self) -> PolyBucket {
        std::mem::take(&mut self.polys_clipped)
    }

    /// Copy of the fixed elevation set.
    pub fn fixed_elevations(&self) -> FixedElevations {
        self.fixed_elevations.clone()
    }

    /// Clip every queued polygon against the others and the tile rectangle.
    ///
    /// `min` and `max` are the (lon, lat) corners of the tile.
    pub fn clip_all(&mut self, min: (f64, f64), max: (f64, f64)) -> Result<()> {
        info!(?min, ?max, polygons = self.polys_in.len(), "clipping tile");

        self.polys_clipped.clear();
        let safety_base = Polygon::rectangle(min, max);
        self.polys_in.safety_base = safety_base.clone();
        self.polys_clipped.safety_base = safety_base.clone();

        // ## Rust Lesson #14: Iterators & Collecting
        //
        // `flat_map` flattens every matching area's list into one stream of
        // polygons for the union.
        let land_mask = union_all(
            self.polys_in
                .iter()
                .filter(|(area, _)| area.is_landmass_area())
                .flat_map(|(_, list)| list.iter()),
        );
        let water_mask = union_all(
            self.polys_in
                .iter()
                .filter(|(area, _)| area.is_water_area())
                .flat_map(|(_, list)| list.iter()),
        );
        let island_mask = union_all(
            self.polys_in
                .iter()
                .filter(|(area, _)| area.is_island_area())
                .flat_map(|(_, list)| list.iter()),
        );
        debug!(
            land = land_mask.0.len(),
            water = water_mask.0.len(),
            island = island_mask.0.len(),
            "built masks"
        );

        let clip_to_land = !self.config.ignore_landmass && !land_mask.0.is_empty();
        if !clip_to_land {
            debug!("no landmass clipping for this tile");
        }

        let mut accum: Shape = MultiPolygon::new(Vec::new());
        let thresholds = self.config.slivers;

        for area in AreaType::PRIORITY {
            for current in self.polys_in.get(area) {
                let mut shape = to_shape(current);

                if clip_to_land && !area.is_hole_area() {
                    shape = shape.intersection(&land_mask);
                }
                if area.is_water_area() && !island_mask.0.is_empty() {
                    shape = shape.difference(&island_mask);
                }

                let (diff, union) = if accum.0.is_empty() {
                    (shape.clone(), shape)
                } else {
                    (shape.difference(&accum), shape.union(&accum))
                };

                let mut result = from_shape(&diff, &ElevationIndex::from_polygons([current]));
                if !result.is_empty() {
                    let slivers = move_slivers(&mut result, &thresholds);
                    if !slivers.is_empty() {
                        merge_slivers(&mut self.polys_clipped, slivers);
                    }
                    if !result.is_empty() {
                        self.polys_clipped.push(area, result);
                    }
                }

                accum = union;
            }
        }

        // Whatever is left of the tile belongs to the ocean.
        let remains_shape = to_shape(&safety_base).difference(&accum);
        let mut remains = from_shape(&remains_shape, &ElevationIndex::default());
        if !remains.is_empty() {
            let slivers = move_slivers(&mut remains, &thresholds);
            if !slivers.is_empty() {
                merge_slivers(&mut self.polys_clipped, slivers);
            }
            if !remains.is_empty() {
                debug!(area = remains.area(), "unclaimed tile area becomes ocean");
                self.polys_clipped.push(AreaType::Ocean, remains);
            }
        }

        info!(polygons = self.polys_clipped.len(), "clipping done");
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clip::polygon_int;

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Polygon {
        Polygon::rectangle((x0, y0), (x1, y1))
    }

    fn area_of(list: &[Polygon]) -> f64 {
        list.iter().map(Polygon::area).sum()
    }

    fn total_area(bucket: &PolyBucket) -> f64 {
        bucket.iter().map(|(_, list)| area_of(list)).sum()
    }

    #[test]
    fn two_overlapping_squares() {
        let mut clipper = Clipper::default();
        clipper.add_poly_index(5, rect(0.0, 0.0, 2.0, 2.0)).unwrap();
        clipper.add_poly_index(20, rect(1.0, 1.0, 3.0, 3.0)).unwrap();
        clipper.clip_all((0.0, 0.0), (3.0, 3.0)).unwrap();

        let out = clipper.polys_clipped();
        let first = out.get(AreaType::Railroad);
        let second = out.get(AreaType::Bog);
        assert_eq!(first.len(), 1);
        assert!((first[0].area() - 4.0).abs() < 1e-9);
        assert_eq!(second.len(), 1);
        assert!((second[0].area() - 3.0).abs() < 1e-9);
        // the L-shape does not reach into the first square
        assert!(polygon_int(&second[0], &rect(0.0, 0.0, 2.0, 2.0)).area() < 1e-9);

        // the two corners nobody claimed fall to the ocean
        assert!((area_of(out.get(AreaType::Ocean)) - 2.0).abs() < 1e-9);
        assert!((total_area(&out) - 9.0).abs() < 1e-9);
    }

    #[test]
    fn first_polygon_of_a_type_wins_the_overlap() {
        let a = rect(0.0, 0.0, 2.0, 2.0);
        let b = rect(1.0, 0.0, 4.0, 2.0);

        let mut clipper = Clipper::default();
        clipper.add_poly(AreaType::Town, a.clone());
        clipper.add_poly(AreaType::Town, b.clone());
        clipper.clip_all((0.0, 0.0), (4.0, 2.0)).unwrap();
        let town = clipper.polys_clipped().get(AreaType::Town).to_vec();
        assert!((town[0].area() - 4.0).abs() < 1e-9);
        assert!((town[1].area() - 4.0).abs() < 1e-9);

        clipper.init();
        clipper.add_poly(AreaType::Town, b);
        clipper.add_poly(AreaType::Town, a);
        clipper.clip_all((0.0, 0.0), (4.0, 2.0)).unwrap();
        let town = clipper.polys_clipped().get(AreaType::Town).to_vec();
        assert!((town[0].area() - 6.0).abs() < 1e-9);
        assert!((town[1].area() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn order_within_a_type_does_not_matter_without_overlap() {
        let a = rect(0.0, 0.0, 1.0, 1.0);
        let b = rect(2.0, 2.0, 3.0, 3.0);

        let run = |polys: [&Polygon; 2]| {
            let mut clipper = Clipper::default();
            for p in polys {
                clipper.add_poly(AreaType::Sand, p.clone());
            }
            clipper.clip_all((0.0, 0.0), (3.0, 3.0)).unwrap();
            let out = clipper.polys_clipped();
            (area_of(out.get(AreaType::Sand)), area_of(out.get(AreaType::Ocean)))
        };

        let (sand1, ocean1) = run([&a, &b]);
        let (sand2, ocean2) = run([&b, &a]);
        assert!((sand1 - sand2).abs() < 1e-12);
        assert!((ocean1 - ocean2).abs() < 1e-12);
        assert!((sand1 - 2.0).abs() < 1e-9);
    }

    #[test]
    fn output_is_disjoint_and_covers_the_tile() {
        let mut clipper = Clipper::default();
        clipper.add_poly(AreaType::Default, rect(0.0, 0.0, 4.0, 4.0));
        clipper.add_poly(AreaType::Lake, rect(0.5, 0.5, 2.5, 2.5));
        clipper.add_poly(AreaType::Urban, rect(2.0, 2.0, 3.5, 3.5));
        clipper.add_poly(AreaType::GrassCover, rect(0.0, 1.0, 4.0, 3.0));
        clipper.add_poly(AreaType::Airport, rect(3.0, 0.0, 4.0, 1.0));
        clipper.clip_all((0.0, 0.0), (4.0, 4.0)).unwrap();

        let out = clipper.polys_clipped();
        assert!((total_area(&out) - 16.0).abs() < 1e-9);

        let all: Vec<(AreaType, &Polygon)> = out
            .iter()
            .flat_map(|(area, list)| list.iter().map(move |p| (area, p)))
            .collect();
        for (i, (ta, pa)) in all.iter().enumerate() {
            for (tb, pb) in &all[i + 1..] {
                let overlap = polygon_int(pa, pb).area();
                assert!(overlap < 1e-9, "{ta} and {tb} overlap by {overlap}");
            }
        }
    }

    #[test]
    fn areas_are_clipped_to_landmass() {
        let mut clipper = Clipper::default();
        clipper.add_poly(AreaType::Default, rect(0.0, 0.0, 1.0, 2.0));
        clipper.add_poly(AreaType::Town, rect(0.0, 0.0, 2.0, 2.0));
        clipper.add_poly(AreaType::Hole, rect(1.5, 1.5, 2.0, 2.0));
        clipper.clip_all((0.0, 0.0), (2.0, 2.0)).unwrap();

        let out = clipper.polys_clipped();
        assert!((area_of(out.get(AreaType::Town)) - 2.0).abs() < 1e-9);
        // holes are not limited to land
        assert!((area_of(out.get(AreaType::Hole)) - 0.25).abs() < 1e-9);
        assert!((area_of(out.get(AreaType::Ocean)) - 1.75).abs() < 1e-9);
        assert!(area_of(out.get(AreaType::Default)) < 1e-9);
    }

    #[test]
    fn ignore_landmass_keeps_areas_off_land() {
        let mut clipper = Clipper::new(ClipperConfig::default().with_ignore_landmass(true));
        clipper.add_poly(AreaType::Default, rect(0.0, 0.0, 1.0, 2.0));
        clipper.add_poly(AreaType::Town, rect(0.0, 0.0, 2.0, 2.0));
        clipper.clip_all((0.0, 0.0), (2.0, 2.0)).unwrap();

        let out = clipper.polys_clipped();
        assert!((area_of(out.get(AreaType::Town)) - 4.0).abs() < 1e-9);
        assert!(out.get(AreaType::Ocean).is_empty());
    }

    #[test]
    fn islands_are_cut_out_of_lakes() {
        let mut clipper = Clipper::default();
        clipper.add_poly(AreaType::Default, rect(0.0, 0.0, 3.0, 3.0));
        clipper.add_poly(AreaType::Lake, rect(0.0, 0.0, 3.0, 3.0));
        clipper.add_poly(AreaType::Island, rect(1.0, 1.0, 2.0, 2.0));
        clipper.clip_all((0.0, 0.0), (3.0, 3.0)).unwrap();

        let out = clipper.polys_clipped();
        let lake = out.get(AreaType::Lake);
        assert_eq!(lake.len(), 1);
        assert_eq!(lake[0].contour_count(), 2);
        assert!((lake[0].area() - 8.0).abs() < 1e-9);
        assert!((area_of(out.get(AreaType::Island)) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn tiny_leftover_is_merged_not_made_ocean() {
        // Town stops 1e-7 short of the tile's north edge; the leftover
        // strip has area 2e-9 and belongs to the town, not the ocean.
        let top = 0.01 + 1e-7;
        let mut clipper = Clipper::default();
        clipper.add_poly(AreaType::Town, rect(0.0, 0.0, 0.02, 0.01));
        clipper.clip_all((0.0, 0.0), (0.02, top)).unwrap();

        let out = clipper.polys_clipped();
        assert!(out.get(AreaType::Ocean).is_empty());
        let town = out.get(AreaType::Town);
        assert_eq!(town.len(), 1);
        assert_eq!(town[0].contour_count(), 1);
        assert!((town[0].area() - 0.02 * top).abs() < 1e-12);
    }

    #[test]
    fn fixed_elevations_deduplicate() {
        let mut set = FixedElevations::default();
        assert_eq!(set.unique_add(Point3::new(1.0, 2.0, 3.0)), 0);
        assert_eq!(set.unique_add(Point3::new(1.0, 2.0, 4.0)), 0);
        assert_eq!(set.unique_add(Point3::new(1.0, 2.5, 3.0)), 1);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn out_of_range_slot_is_rejected() {
        let mut clipper = Clipper::default();
        assert!(clipper.add_poly_index(AreaType::COUNT, rect(0.0, 0.0, 1.0, 1.0)).is_err());
        assert!(clipper.polys_in().is_empty());
    }

    #[test]
    fn init_clears_everything() {
        let mut clipper = Clipper::default();
        clipper.add_poly(AreaType::Lake, rect(0.0, 0.0, 1.0, 1.0));
        clipper.clip_all((0.0, 0.0), (1.0, 1.0)).unwrap();
        clipper.init();
        assert!(clipper.polys_in().is_empty());
        assert!(clipper.polys_clipped().is_empty());
        assert!(clipper.fixed_elevations().is_empty());
    }
}
