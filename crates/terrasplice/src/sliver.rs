//! Sliver removal.
//!
//! Clipping many overlapping polygons against each other leaves thin or
//! tiny contours behind. They are pulled out of the clip result and glued
//! onto a neighboring polygon that has already been placed, so the tile
//! stays fully covered without degenerate triangles.

use tracing::{debug, trace};

use crate::area::AreaType;
use crate::clip::polygon_union;
use crate::clipper::PolyBucket;
use crate::config::SliverThresholds;
use crate::geometry::Polygon;

/// Remove sliver contours from `poly`.
///
/// Sliver holes are deleted outright. Sliver outer rings are returned as a
/// separate polygon so they can be merged elsewhere. Contours are visited
/// from the last index down so removals don't shift unvisited indices.
pub fn move_slivers(poly: &mut Polygon, thresholds: &SliverThresholds) -> Polygon {
    let mut slivers = Polygon::new();

    for i in (0..poly.contour_count()).rev() {
        let contour = &poly.contours[i];
        let area = contour.area();
        let angle = contour.min_angle();

        if !thresholds.is_sliver(angle, area) {
            continue;
        }

        let contour = poly.remove_contour(i);
        if contour.hole {
            trace!(area, angle = angle.to_degrees(), "deleting sliver hole");
        } else {
            trace!(area, angle = angle.to_degrees(), "moving sliver");
            slivers.contours.push(contour);
        }
    }

    slivers
}

/// Merge each sliver contour into the first adjacent clipped polygon.
///
/// Candidates are searched by area priority, then insertion order, never
/// in the hole list. A candidate is adjacent when its union with the
/// sliver does not add a contour. First fit wins; slivers with no
/// adjacent polygon are dropped. Returns how many slivers were merged.
pub fn merge_slivers(clipped: &mut PolyBucket, slivers: Polygon) -> usize {
    let mut merged = 0;

    'slivers: for contour in slivers.contours {
        let sliver = Polygon {
            contours: vec![contour],
        };

        for area in AreaType::PRIORITY {
            if area.is_hole_area() {
                continue;
            }

            for poly in clipped.get_mut(area).iter_mut() {
                let result = polygon_union(poly, &sliver);
                if result.contour_count() <= poly.contour_count() {
                    trace!(%area, "merged sliver");
                    *poly = result;
                    merged += 1;
                    continue 'slivers;
                }
            }
        }

        debug!(
            area = sliver.area(),
            "dropping sliver with no adjacent polygon"
        );
    }

    merged
}
