//! Polygon file in, clipped tile out.

use std::fs::{self, File};

use terrasplice::debug_svg::write_clipped_svg;
use terrasplice::{
    AreaType, Bucket, Clipper, ClipperConfig, Point3, Polygon, polygon_int, write_polys,
};

/// Landmass over the whole tile, a lake, an airport with known elevation
/// and a town overlapping both.
fn write_sources(path: &std::path::Path, bucket: &Bucket) {
    let ((x0, y0), (x1, y1)) = (bucket.min(), bucket.max());
    let (w, h) = (x1 - x0, y1 - y0);
    let at = |fx: f64, fy: f64| (x0 + w * fx, y0 + h * fy);

    let land = Polygon::rectangle(at(0.0, 0.0), at(1.0, 0.8));
    let lake = Polygon::rectangle(at(0.1, 0.1), at(0.5, 0.5));
    let town = Polygon::rectangle(at(0.4, 0.4), at(0.9, 0.9));
    let airport = Polygon::from_points(
        [at(0.6, 0.1), at(0.8, 0.1), at(0.8, 0.3), at(0.6, 0.3)]
            .into_iter()
            .map(|(x, y)| Point3::new(x, y, 12.5))
            .collect(),
    );

    let file = File::create(path).unwrap();
    write_polys(
        file,
        [
            (AreaType::Default, &land),
            (AreaType::Town, &town),
            (AreaType::Lake, &lake),
            (AreaType::Airport, &airport),
        ],
    )
    .unwrap();
}

#[test]
fn loaded_tile_clips_into_a_disjoint_cover() {
    let dir = tempfile::tempdir().unwrap();
    let bucket = Bucket::new(-122.375, 37.619);
    let source = dir.path().join("areas.poly");
    write_sources(&source, &bucket);

    let config = ClipperConfig::from_yaml_str("slivers:\n  max_tiny_area: 1.0e-10\n").unwrap();
    let mut clipper = Clipper::new(config);
    clipper.load_polys(&source).unwrap();
    assert_eq!(clipper.fixed_elevations().len(), 4);

    clipper.clip_all(bucket.min(), bucket.max()).unwrap();
    let out = clipper.polys_clipped();

    let tile_area = bucket.width() * bucket.height();
    let total: f64 = out
        .iter()
        .flat_map(|(_, list)| list.iter())
        .map(Polygon::area)
        .sum();
    assert!((total - tile_area).abs() < 1e-9, "total {total} vs {tile_area}");

    // the town only keeps land not taken by the lake and airport
    let town: f64 = out.get(AreaType::Town).iter().map(Polygon::area).sum();
    let expected_town = tile_area * (0.5 * 0.4 - 0.1 * 0.1);
    assert!((town - expected_town).abs() < 1e-9, "town {town} vs {expected_town}");

    // the strip north of the landmass is ocean
    let ocean: f64 = out.get(AreaType::Ocean).iter().map(Polygon::area).sum();
    assert!((ocean - tile_area * 0.2).abs() < 1e-9);

    // airport corners keep their elevation through the clip
    let airport = &out.get(AreaType::Airport)[0];
    assert!(airport.points().all(|p| p.z == 12.5));

    let pieces: Vec<&Polygon> = out.iter().flat_map(|(_, list)| list.iter()).collect();
    for (i, a) in pieces.iter().enumerate() {
        for b in &pieces[i + 1..] {
            assert!(polygon_int(a, b).area() < 1e-9);
        }
    }

    let svg_path = dir.path().join("tile.svg");
    write_clipped_svg(File::create(&svg_path).unwrap(), &out).unwrap();
    let svg = fs::read_to_string(&svg_path).unwrap();
    assert!(svg.contains("id=\"Airport\""));
    assert!(svg.contains("id=\"Ocean\""));
}
