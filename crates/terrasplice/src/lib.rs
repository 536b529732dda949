//! # terrasplice
//!
//! Area clipping and tile-edge matching for FlightGear scenery tiles.
//!
//! Two engines live here:
//!
//! - [`Clipper`] turns overlapping land-use polygons into a gap-free,
//!   overlap-free cover of one tile, highest priority area first.
//! - [`TileMatcher`] makes neighboring tiles agree on the vertices along
//!   their shared borders.
//!
//! ## Rust Lesson #7: Modules
//!
//! Every module is declared here with `mod`; `pub use` lifts the types
//! callers need to the crate root so they can write
//! `terrasplice::Clipper` instead of `terrasplice::clipper::Clipper`.

pub mod area;
pub mod bucket;
pub mod clip;
pub mod clipper;
pub mod config;
pub mod construct;
pub mod debug_svg;
pub mod error;
pub mod geodesy;
pub mod geometry;
pub mod matcher;
pub mod nodes;
pub mod poly_file;
pub mod shared;
pub mod sliver;
pub mod triseg;

// Re-export common types at crate root for convenience.
pub use area::AreaType;
pub use bucket::Bucket;
pub use clip::{polygon_diff, polygon_int, polygon_union};
pub use clipper::{Clipper, FixedElevations, PolyBucket};
pub use config::{ClipperConfig, SliverThresholds};
pub use construct::TileConstruct;
pub use error::{Error, Result};
pub use geometry::{Contour, NO_ELEVATION, Point3, Polygon, SG_EPSILON};
pub use matcher::{RelationState, TileMatcher};
pub use nodes::{NodeList, TileNode};
pub use poly_file::{GridTransform, PolyRecord, write_polys};
pub use shared::{
    FileShareStore, MemoryShareStore, Relation, ResolvedData, SharedBoundaryStore, SharedNode,
};
pub use triseg::{TriSegment, TriSegmentList};
