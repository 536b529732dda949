//! Per-tile working state handed between build stages.

use crate::bucket::Bucket;
use crate::nodes::NodeList;
use crate::triseg::TriSegmentList;

#[derive(Debug, Clone)]
pub struct TileConstruct {
    pub bucket: Bucket,
    pub nodes: NodeList,
    pub segments: TriSegmentList,
}

impl TileConstruct {
    pub fn new(bucket: Bucket) -> Self {
        Self {
            bucket,
            nodes: NodeList::new(),
            segments: TriSegmentList::new(),
        }
    }

    /// South-west and north-east corners of the tile as (lon, lat).
    pub fn bounds(&self) -> ((f64, f64), (f64, f64)) {
        (self.bucket.min(), self.bucket.max())
    }
}
