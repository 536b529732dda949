//! Polygon definition files.
//!
//! A file is a whitespace separated stream of records:
//!
//! ```text
//! #3D            <- optional, "#2D" or a bare area name means 2D
//! Lake           <- area type name
//! 1              <- contour count
//! 4              <- point count of contour 0
//! 0              <- hole flag
//! -122.40 37.60 12.0
//! ...
//! ```
//!
//! Lines starting with `#` are comments unless they begin with the `#2D` /
//! `#3D` markers. A contour whose last point repeats its first is stored
//! without the duplicate. Files may be gzip compressed.

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;

use flate2::read::MultiGzDecoder;

use crate::area::AreaType;
use crate::error::{Error, Result};
use crate::geometry::{NO_ELEVATION, Point3, Polygon, SG_EPSILON};

/// Converts national grid coordinates to WGS84 lon/lat degrees.
///
/// Implemented by the caller's coordinate-transform service.
pub trait GridTransform {
    fn to_wgs84(&self, easting: f64, northing: f64) -> (f64, f64);
}

/// One parsed record.
#[derive(Debug, Clone, PartialEq)]
pub struct PolyRecord {
    pub area: AreaType,
    pub polygon: Polygon,
    /// True for `#3D` records, whose elevations are authoritative.
    pub is_3d: bool,
}

/// Upper bound on the capacity reserved from a contour's point count.
const MAX_POINT_HINT: usize = 4096;

/// Read a whole file, transparently gunzipping it.
pub fn read_text(path: &Path) -> Result<String> {
    let mut raw = Vec::new();
    File::open(path)
        .and_then(|mut f| f.read_to_end(&mut raw))
        .map_err(|e| Error::io("cannot open", path, e))?;

    if raw.starts_with(&[0x1f, 0x8b]) {
        let mut text = String::new();
        MultiGzDecoder::new(raw.as_slice())
            .read_to_string(&mut text)
            .map_err(|e| Error::io("cannot decompress", path, e))?;
        Ok(text)
    } else {
        String::from_utf8(raw).map_err(|_| Error::invalid(path, "file is not UTF-8 text"))
    }
}

/// Load every record of a polygon file in lon/lat.
pub fn read_poly_file(path: &Path) -> Result<Vec<PolyRecord>> {
    parse_polys(&read_text(path)?, path, None)
}

/// Load a polygon file whose coordinates are grid eastings/northings.
pub fn read_grid_poly_file(path: &Path, transform: &dyn GridTransform) -> Result<Vec<PolyRecord>> {
    parse_polys(&read_text(path)?, path, Some(transform))
}

// ============================================================================
// TOKENIZER
// ============================================================================

struct Tokens<'a> {
    inner: std::vec::IntoIter<&'a str>,
    path: &'a Path,
}

impl<'a> Tokens<'a> {
    fn new(text: &'a str, path: &'a Path) -> Self {
        let words: Vec<&str> = text
            .lines()
            .filter(|line| {
                let line = line.trim_start();
                !line.starts_with('#') || line.starts_with("#2D") || line.starts_with("#3D")
            })
            .flat_map(str::split_whitespace)
            .collect();
        Self {
            inner: words.into_iter(),
            path,
        }
    }

    fn next_word(&mut self) -> Option<&'a str> {
        self.inner.next()
    }

    fn expect_word(&mut self, what: &str) -> Result<&'a str> {
        self.inner
            .next()
            .ok_or_else(|| Error::invalid(self.path, format!("unexpected end of data, expected {what}")))
    }

    fn number<T: std::str::FromStr>(&mut self, what: &str) -> Result<T> {
        let word = self.expect_word(what)?;
        word.parse()
            .map_err(|_| Error::invalid(self.path, format!("expected {what}, found '{word}'")))
    }
}

// ============================================================================
// PARSER
// ============================================================================

/// Parse polygon records from text.
///
/// `path` is only used in error messages.
pub fn parse_polys(
    text: &str,
    path: &Path,
    transform: Option<&dyn GridTransform>,
) -> Result<Vec<PolyRecord>> {
    let mut tokens = Tokens::new(text, path);
    let mut records = Vec::new();

    while let Some(first) = tokens.next_word() {
        let (is_3d, name) = match first {
            "#2D" => (false, tokens.expect_word("area name")?),
            "#3D" => (true, tokens.expect_word("area name")?),
            // legacy files have no marker
            name => (false, name),
        };
        let area = AreaType::from_name(name)?;

        let contours: usize = tokens.number("contour count")?;
        let mut polygon = Polygon::new();

        for _ in 0..contours {
            let count: usize = tokens.number("point count")?;
            if count < 3 {
                return Err(Error::invalid(
                    path,
                    format!("{area} polygon has a contour with {count} points (need 3)"),
                ));
            }
            let hole: i64 = tokens.number("hole flag")?;

            // count is untrusted; a short stream fails on the first missing number
            let mut points = Vec::with_capacity(count.min(MAX_POINT_HINT));
            for _ in 0..count {
                let x: f64 = tokens.number("x coordinate")?;
                let y: f64 = tokens.number("y coordinate")?;
                let z = if is_3d {
                    tokens.number("z coordinate")?
                } else {
                    NO_ELEVATION
                };
                points.push(Point3::new(x, y, z));
            }

            let start = points[0];
            let last = points[count - 1];
            if (start.x - last.x).abs() < SG_EPSILON
                && (start.y - last.y).abs() < SG_EPSILON
                && (start.z - last.z).abs() < SG_EPSILON
            {
                points.pop();
            }

            if let Some(t) = transform {
                for p in &mut points {
                    let (lon, lat) = t.to_wgs84(p.x, p.y);
                    p.x = lon;
                    p.y = lat;
                }
            }

            polygon.add_contour(points, hole != 0);
        }

        records.push(PolyRecord {
            area,
            polygon,
            is_3d,
        });
    }

    Ok(records)
}

// ============================================================================
// WRITER
// ============================================================================

/// Write polygons in the definition format.
///
/// Records with any known elevation are written as `#3D`. Coordinates use
/// Rust's shortest round-trip formatting, so reading the output back gives
/// identical values.
pub fn write_polys<'a, W: Write>(
    mut out: W,
    records: impl IntoIterator<Item = (AreaType, &'a Polygon)>,
) -> io::Result<()> {
    for (area, polygon) in records {
        let is_3d = polygon.points().any(|p| p.has_elevation());
        writeln!(out, "{}", if is_3d { "#3D" } else { "#2D" })?;
        writeln!(out, "{}", area.name())?;
        writeln!(out, "{}", polygon.contour_count())?;
        for contour in &polygon.contours {
            writeln!(out, "{}", contour.len())?;
            writeln!(out, "{}", contour.hole as i32)?;
            for p in &contour.points {
                if is_3d {
                    writeln!(out, "{} {} {}", p.x, p.y, p.z)?;
                } else {
                    writeln!(out, "{} {}", p.x, p.y)?;
                }
            }
        }
    }
    Ok(())
}
