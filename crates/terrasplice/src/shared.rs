//! Shared tile-boundary data.
//!
//! When a tile is built it publishes the nodes on its four corners and four
//! edges. Tiles built later read their neighbors' records and reuse those
//! nodes verbatim, so both sides of a tile border end up with identical
//! vertices. The first tile to publish a border wins.
//!
//! # File format
//!
//! One gzip compressed text file per tile at
//! `<work_base>/Shared/<bucket base path>/<bucket index>.gz`, one record
//! per line:
//!
//! ```text
//! sw_node -122.500000 37.500000 12.000000
//! sw_normal 0.123456 -0.765432 0.612345
//! n_node ...
//! n_normal ...
//! e_null -999.0 -999.0 -999.0
//! ```
//!
//! A `_null` record says the edge was processed and has no interior nodes.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use flate2::Compression;
use flate2::write::GzEncoder;
use tracing::{debug, info};

use crate::bucket::Bucket;
use crate::error::{Error, Result};
use crate::geodesy::fake_normal;
use crate::geometry::Point3;
use crate::poly_file::read_text;

/// Where a boundary lies relative to its tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    Sw,
    Se,
    Ne,
    Nw,
    North,
    South,
    East,
    West,
}

impl Relation {
    pub const ALL: [Relation; 8] = [
        Relation::Sw,
        Relation::Se,
        Relation::Ne,
        Relation::Nw,
        Relation::North,
        Relation::South,
        Relation::East,
        Relation::West,
    ];

    pub const CORNERS: [Relation; 4] = [Relation::Sw, Relation::Se, Relation::Ne, Relation::Nw];

    pub const EDGES: [Relation; 4] = [
        Relation::North,
        Relation::South,
        Relation::East,
        Relation::West,
    ];

    /// Position in [`Relation::ALL`].
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Record prefix in shared files.
    pub fn tag(self) -> &'static str {
        match self {
            Relation::Sw => "sw",
            Relation::Se => "se",
            Relation::Ne => "ne",
            Relation::Nw => "nw",
            Relation::North => "n",
            Relation::South => "s",
            Relation::East => "e",
            Relation::West => "w",
        }
    }

    pub fn is_corner(self) -> bool {
        matches!(self, Relation::Sw | Relation::Se | Relation::Ne | Relation::Nw)
    }

    /// Neighbors that may already hold this boundary, as
    /// `(dx, dy, relation on the neighbor)`.
    ///
    /// A corner touches three neighbors, listed in rotational order; an
    /// edge touches one.
    pub fn neighbor_sources(self) -> &'static [(i32, i32, Relation)] {
        match self {
            Relation::Sw => &[(-1, 0, Relation::Se), (-1, -1, Relation::Ne), (0, -1, Relation::Nw)],
            Relation::Se => &[(0, -1, Relation::Ne), (1, -1, Relation::Nw), (1, 0, Relation::Sw)],
            Relation::Ne => &[(1, 0, Relation::Nw), (1, 1, Relation::Sw), (0, 1, Relation::Se)],
            Relation::Nw => &[(0, 1, Relation::Sw), (-1, 1, Relation::Se), (-1, 0, Relation::Ne)],
            Relation::North => &[(0, 1, Relation::South)],
            Relation::South => &[(0, -1, Relation::North)],
            Relation::East => &[(1, 0, Relation::West)],
            Relation::West => &[(-1, 0, Relation::East)],
        }
    }
}

/// A boundary vertex with its surface normal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SharedNode {
    pub point: Point3,
    pub normal: Point3,
}

impl SharedNode {
    pub fn new(point: Point3, normal: Point3) -> Self {
        Self { point, normal }
    }
}

/// What a tile published for one relation.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedData {
    Nodes(Vec<SharedNode>),
    /// Processed, with no nodes.
    Empty,
}

/// Storage for published boundary data.
pub trait SharedBoundaryStore {
    /// What `bucket` published for `relation`, or `None` if nothing was
    /// published (or it can't be read).
    fn read(&self, bucket: &Bucket, relation: Relation) -> Option<ResolvedData>;

    /// Publish `records` as the complete boundary data of `bucket`.
    fn publish(&mut self, bucket: &Bucket, records: &[(Relation, ResolvedData)]) -> Result<()>;

    /// Called before a tile reads its neighbors. Stores that cache what
    /// they read drop it here.
    fn start_pass(&self) {}
}

// ============================================================================
// FILE STORE
// ============================================================================

/// Shared files under `<work_base>/Shared`.
///
/// Adjacent tiles must not be built concurrently: a tile reads its
/// neighbors' files before publishing its own, with no locking.
///
/// Each file is decoded once per pass; [`start_pass`] forgets the decoded
/// text and [`publish`] forgets the published tile.
///
/// [`start_pass`]: SharedBoundaryStore::start_pass
/// [`publish`]: SharedBoundaryStore::publish
#[derive(Debug, Clone)]
pub struct FileShareStore {
    root: PathBuf,
    /// Decoded file text by bucket index; `None` when missing or unreadable.
    cache: RefCell<HashMap<i64, Option<Rc<str>>>>,
}

impl FileShareStore {
    pub fn new(work_base: impl AsRef<Path>) -> Self {
        Self {
            root: work_base.as_ref().join("Shared"),
            cache: RefCell::new(HashMap::new()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Compressed file path for `bucket`.
    pub fn file_path(&self, bucket: &Bucket) -> PathBuf {
        self.dir(bucket).join(format!("{}.gz", bucket.index()))
    }

    fn dir(&self, bucket: &Bucket) -> PathBuf {
        self.root.join(bucket.base_path())
    }

    fn load(&self, bucket: &Bucket) -> Option<String> {
        let gz = self.file_path(bucket);
        let plain = self.dir(bucket).join(bucket.index().to_string());
        let path = [gz, plain].into_iter().find(|p| p.exists())?;

        match read_text(&path) {
            Ok(text) => Some(text),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "unreadable shared file");
                None
            }
        }
    }

    fn text(&self, bucket: &Bucket) -> Option<Rc<str>> {
        if let Some(hit) = self.cache.borrow().get(&bucket.index()) {
            return hit.clone();
        }
        let text: Option<Rc<str>> = self.load(bucket).map(Rc::from);
        self.cache.borrow_mut().insert(bucket.index(), text.clone());
        text
    }
}

impl SharedBoundaryStore for FileShareStore {
    fn read(&self, bucket: &Bucket, relation: Relation) -> Option<ResolvedData> {
        let Some(text) = self.text(bucket) else {
            debug!(bucket = bucket.index(), "no shared data");
            return None;
        };
        extract(&text, relation)
    }

    fn publish(&mut self, bucket: &Bucket, records: &[(Relation, ResolvedData)]) -> Result<()> {
        let dir = self.dir(bucket);
        fs::create_dir_all(&dir).map_err(|e| Error::io("cannot create directory", &dir, e))?;

        let path = self.file_path(bucket);
        info!(path = %path.display(), "writing shared edge data");

        let file = File::create(&path).map_err(|e| Error::io("cannot create", &path, e))?;
        let mut out = GzEncoder::new(BufWriter::new(file), Compression::best());
        write_records(&mut out, records).map_err(|e| Error::io("cannot write", &path, e))?;
        out.finish()
            .and_then(|mut w| w.flush())
            .map_err(|e| Error::io("cannot write", &path, e))?;
        self.cache.get_mut().remove(&bucket.index());
        Ok(())
    }

    fn start_pass(&self) {
        self.cache.borrow_mut().clear();
    }
}

fn write_records<W: Write>(out: &mut W, records: &[(Relation, ResolvedData)]) -> std::io::Result<()> {
    for (relation, data) in records {
        let tag = relation.tag();
        match data {
            ResolvedData::Nodes(nodes) => {
                for n in nodes {
                    let (p, v) = (n.point, n.normal);
                    writeln!(out, "{tag}_node {:.6} {:.6} {:.6}", p.x, p.y, p.z)?;
                    writeln!(out, "{tag}_normal {:.6} {:.6} {:.6}", v.x, v.y, v.z)?;
                }
            }
            ResolvedData::Empty => writeln!(out, "{tag}_null -999.0 -999.0 -999.0")?,
        }
    }
    Ok(())
}

/// Pull the records for `relation` out of a shared file.
fn extract(text: &str, relation: Relation) -> Option<ResolvedData> {
    let tag = relation.tag();
    let mut nodes = Vec::new();
    let mut pending: Option<Point3> = None;
    let mut null = false;

    for line in text.lines() {
        let mut words = line.split_whitespace();
        let Some(name) = words.next() else { continue };
        let Some(kind) = name.strip_prefix(tag).and_then(|r| r.strip_prefix('_')) else {
            continue;
        };

        let values: Vec<f64> = words.filter_map(|w| w.parse().ok()).collect();
        let [x, y, z] = values[..] else {
            debug!(line, "malformed shared record");
            continue;
        };
        let p = Point3::new(x, y, z);

        match kind {
            "node" => {
                if let Some(prev) = pending.replace(p) {
                    nodes.push(SharedNode::new(prev, fake_normal(prev)));
                }
            }
            "normal" => match pending.take() {
                Some(node) => nodes.push(SharedNode::new(node, p)),
                None => debug!(line, "normal without node"),
            },
            "null" => null = true,
            _ => {}
        }
    }
    if let Some(prev) = pending {
        nodes.push(SharedNode::new(prev, fake_normal(prev)));
    }

    if !nodes.is_empty() {
        Some(ResolvedData::Nodes(nodes))
    } else if null {
        Some(ResolvedData::Empty)
    } else {
        None
    }
}

// ============================================================================
// MEMORY STORE
// ============================================================================

/// In-process store keyed by bucket index.
#[derive(Debug, Clone, Default)]
pub struct MemoryShareStore {
    tiles: HashMap<i64, Vec<(Relation, ResolvedData)>>,
}

impl MemoryShareStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, bucket: &Bucket) -> bool {
        self.tiles.contains_key(&bucket.index())
    }
}

impl SharedBoundaryStore for MemoryShareStore {
    fn read(&self, bucket: &Bucket, relation: Relation) -> Option<ResolvedData> {
        let records = self.tiles.get(&bucket.index())?;
        records
            .iter()
            .find(|(r, _)| *r == relation)
            .map(|(_, data)| data.clone())
    }

    fn publish(&mut self, bucket: &Bucket, records: &[(Relation, ResolvedData)]) -> Result<()> {
        self.tiles.insert(bucket.index(), records.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::construct::TileConstruct;
    use crate::matcher::{RelationState, TileMatcher};

    fn node(x: f64, y: f64, z: f64) -> SharedNode {
        SharedNode::new(Point3::new(x, y, z), Point3::new(0.1, 0.2, 0.97))
    }

    #[test]
    fn corners_consult_corners_and_edges_consult_edges() {
        for relation in Relation::ALL {
            for &(_, _, theirs) in relation.neighbor_sources() {
                assert_eq!(relation.is_corner(), theirs.is_corner());
            }
        }
        assert_eq!(Relation::North.neighbor_sources(), &[(0, 1, Relation::South)]);
        assert_eq!(Relation::Sw.neighbor_sources().len(), 3);
    }

    #[test]
    fn tags_do_not_collide() {
        let text = "nw_node 1 2 3\nnw_normal 0 0 1\nn_node 4 5 6\nn_normal 0 1 0\n";
        assert_eq!(
            extract(text, Relation::North),
            Some(ResolvedData::Nodes(vec![SharedNode::new(
                Point3::new(4.0, 5.0, 6.0),
                Point3::new(0.0, 1.0, 0.0)
            )]))
        );
        assert!(matches!(extract(text, Relation::Nw), Some(ResolvedData::Nodes(n)) if n.len() == 1));
        assert_eq!(extract(text, Relation::West), None);
    }

    #[test]
    fn null_record_means_empty() {
        assert_eq!(
            extract("e_null -999.0 -999.0 -999.0\n", Relation::East),
            Some(ResolvedData::Empty)
        );
    }

    #[test]
    fn file_round_trip_at_six_decimals() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileShareStore::new(dir.path());
        let bucket = Bucket::new(-122.375, 37.619);

        let records = vec![
            (Relation::Sw, ResolvedData::Nodes(vec![node(-122.5, 37.5, 12.25)])),
            (
                Relation::North,
                ResolvedData::Nodes(vec![node(-122.4, 37.625, 1.0), node(-122.3123456789, 37.625, 2.0)]),
            ),
            (Relation::East, ResolvedData::Empty),
        ];
        store.publish(&bucket, &records).unwrap();

        let path = dir.path().join("Shared/w130n30/w123n37/942050.gz");
        assert!(path.exists());
        assert_eq!(store.file_path(&bucket), path);

        let Some(ResolvedData::Nodes(north)) = store.read(&bucket, Relation::North) else {
            panic!("north edge missing");
        };
        assert_eq!(north.len(), 2);
        assert!((north[1].point.x - -122.312346).abs() < 1e-9);
        assert!((north[1].normal.z - 0.97).abs() < 1e-9);

        assert_eq!(store.read(&bucket, Relation::East), Some(ResolvedData::Empty));
        assert_eq!(store.read(&bucket, Relation::South), None);
        assert_eq!(store.read(&bucket.offset(1, 0), Relation::West), None);
    }

    #[test]
    fn plain_text_files_are_read() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileShareStore::new(dir.path());
        let bucket = Bucket::new(8.54, 47.45);
        let tile_dir = dir.path().join("Shared").join(bucket.base_path());
        fs::create_dir_all(&tile_dir).unwrap();
        fs::write(tile_dir.join(bucket.index().to_string()), "s_null -999.0 -999.0 -999.0\n").unwrap();

        assert_eq!(store.read(&bucket, Relation::South), Some(ResolvedData::Empty));
    }

    #[test]
    fn unreadable_neighbor_file_leaves_the_border_unresolved() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileShareStore::new(dir.path());
        let tile = Bucket::new(-122.375, 37.619);
        let west = tile.offset(-1, 0);

        store
            .publish(&west, &[(Relation::East, ResolvedData::Nodes(vec![node(-122.5, 37.55, 3.0)]))])
            .unwrap();
        let path = store.file_path(&west);
        let bytes = fs::read(&path).unwrap();
        fs::write(&path, &bytes[..bytes.len() - 4]).unwrap();

        store.start_pass();
        assert_eq!(store.read(&west, Relation::East), None);

        let construct = TileConstruct::new(tile);
        let mut matcher = TileMatcher::new();
        matcher.load_neighbor_shared(&construct, &store);
        for relation in [Relation::West, Relation::Sw, Relation::Nw] {
            assert_eq!(matcher.state(relation), RelationState::Unresolved, "{relation:?}");
        }
    }

    #[test]
    fn files_are_decoded_once_per_pass() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileShareStore::new(dir.path());
        let mut other = FileShareStore::new(dir.path());
        let bucket = Bucket::new(8.54, 47.45);

        store.publish(&bucket, &[(Relation::North, ResolvedData::Empty)]).unwrap();
        assert_eq!(store.read(&bucket, Relation::North), Some(ResolvedData::Empty));

        // rewritten behind the store's back: the decoded text is kept
        other.publish(&bucket, &[(Relation::South, ResolvedData::Empty)]).unwrap();
        assert_eq!(store.read(&bucket, Relation::South), None);

        store.start_pass();
        assert_eq!(store.read(&bucket, Relation::South), Some(ResolvedData::Empty));
        assert_eq!(store.read(&bucket, Relation::North), None);

        // publishing through the store itself is seen at once
        store.publish(&bucket, &[(Relation::East, ResolvedData::Empty)]).unwrap();
        assert_eq!(store.read(&bucket, Relation::East), Some(ResolvedData::Empty));
    }

    #[test]
    fn memory_store_replaces_on_publish() {
        let mut store = MemoryShareStore::new();
        let bucket = Bucket::new(8.54, 47.45);
        store
            .publish(&bucket, &[(Relation::West, ResolvedData::Empty)])
            .unwrap();
        store
            .publish(&bucket, &[(Relation::East, ResolvedData::Empty)])
            .unwrap();
        assert!(store.contains(&bucket));
        assert_eq!(store.read(&bucket, Relation::West), None);
        assert_eq!(store.read(&bucket, Relation::East), Some(ResolvedData::Empty));
    }
}
