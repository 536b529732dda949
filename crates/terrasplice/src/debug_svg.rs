//! SVG dump of a clipped tile, for eyeballing clip results.
//!
//! Each area type gets one `<g id="AreaName">` holding one `<path>` per
//! polygon. Holes render through `fill-rule="evenodd"`. Latitude is
//! negated so north is up.

use std::io::{self, Write};

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};

use crate::area::AreaType;
use crate::clipper::PolyBucket;
use crate::geometry::Polygon;

const WATER: &str = "#4a90d9";
const HOLE: &str = "#ffffff";
const PALETTE: [&str; 6] = ["#c8b27a", "#8fbf6a", "#b0b0b0", "#d98c5f", "#6a9f8f", "#e0d890"];

fn fill_color(area: AreaType) -> &'static str {
    if area.is_hole_area() {
        HOLE
    } else if area.is_water_area() {
        WATER
    } else {
        PALETTE[area.index() % PALETTE.len()]
    }
}

/// Path data for all contours of `poly`, with y flipped.
fn path_data(poly: &Polygon) -> String {
    let mut d = String::new();
    for contour in &poly.contours {
        for (i, p) in contour.points.iter().enumerate() {
            let cmd = if i == 0 { 'M' } else { 'L' };
            d.push_str(&format!("{cmd}{},{} ", p.x, -p.y));
        }
        d.push_str("Z ");
    }
    d.trim_end().to_string()
}

/// Write the clipped polygons of one tile as an SVG document.
///
/// The view box is the bucket's `safety_base`, or the polygons' extent
/// when no tile rectangle is set.
pub fn write_clipped_svg<W: Write>(out: W, clipped: &PolyBucket) -> io::Result<()> {
    let extent = clipped.safety_base.bounding_box().or_else(|| {
        clipped
            .iter()
            .flat_map(|(_, list)| list.iter())
            .filter_map(Polygon::bounding_box)
            .reduce(|a, b| (a.0.min(b.0), a.1.min(b.1), a.2.max(b.2), a.3.max(b.3)))
    });
    let (min_x, min_y, max_x, max_y) = extent.unwrap_or((0.0, 0.0, 1.0, 1.0));
    let view_box = format!("{} {} {} {}", min_x, -max_y, max_x - min_x, max_y - min_y);

    let mut writer = Writer::new_with_indent(out, b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut svg = BytesStart::new("svg");
    svg.push_attribute(("xmlns", "http://www.w3.org/2000/svg"));
    svg.push_attribute(("viewBox", view_box.as_str()));
    writer.write_event(Event::Start(svg))?;

    for (area, list) in clipped.iter() {
        let mut group = BytesStart::new("g");
        group.push_attribute(("id", area.name()));
        group.push_attribute(("fill", fill_color(area)));
        group.push_attribute(("fill-rule", "evenodd"));
        group.push_attribute(("stroke", "none"));
        writer.write_event(Event::Start(group))?;

        for poly in list.iter().filter(|p| !p.is_empty()) {
            let d = path_data(poly);
            let mut path = BytesStart::new("path");
            path.push_attribute(("d", d.as_str()));
            writer.write_event(Event::Empty(path))?;
        }

        writer.write_event(Event::End(BytesEnd::new("g")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("svg")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipper::Clipper;

    fn find_group<'a>(group: &'a usvg::Group, id: &str) -> Option<&'a usvg::Group> {
        if group.id() == id {
            return Some(group);
        }
        group.children().iter().find_map(|child| match child {
            usvg::Node::Group(g) => find_group(g, id),
            _ => None,
        })
    }

    fn path_count(group: &usvg::Group) -> usize {
        group
            .children()
            .iter()
            .map(|child| match child {
                usvg::Node::Path(_) => 1,
                usvg::Node::Group(g) => path_count(g),
                _ => 0,
            })
            .sum()
    }

    #[test]
    fn clipped_tile_renders_one_group_per_area() {
        let mut clipper = Clipper::default();
        clipper.add_poly(AreaType::Lake, Polygon::rectangle((0.0, 0.0), (2.0, 2.0)));
        clipper.add_poly(AreaType::Town, Polygon::rectangle((1.0, 1.0), (3.0, 3.0)));
        clipper.clip_all((0.0, 0.0), (3.0, 3.0)).unwrap();

        let mut buf = Vec::new();
        write_clipped_svg(&mut buf, &clipper.polys_clipped()).unwrap();
        let text = String::from_utf8(buf).unwrap();

        let tree = usvg::Tree::from_str(&text, &usvg::Options::default()).unwrap();
        for id in ["Lake", "Town", "Ocean"] {
            let group = find_group(tree.root(), id).unwrap_or_else(|| panic!("no group {id}"));
            assert_eq!(path_count(group), 1, "{id}");
        }
        assert!(find_group(tree.root(), "Bog").is_none());
        assert_eq!(tree.size().width(), 3.0);
    }

    #[test]
    fn holes_use_even_odd() {
        let mut poly = Polygon::rectangle((0.0, 0.0), (4.0, 4.0));
        poly.add_contour(Polygon::rectangle((1.0, 1.0), (2.0, 2.0)).contours[0].points.clone(), true);
        assert_eq!(path_data(&poly).matches('Z').count(), 2);
        assert!(path_data(&poly).starts_with("M0,-0 L4,-0"));
    }
}
