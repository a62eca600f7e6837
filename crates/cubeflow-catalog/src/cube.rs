//! Cube aggregate root.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cubeflow_core::SegmentId;

use crate::segment::Segment;

/// An analytical cube and the segments folded into it.
///
/// `version` is the optimistic concurrency token checked by
/// [`CatalogStore::update_cube`](crate::store::CatalogStore::update_cube).
/// Callers never bump it themselves; the store does on every accepted write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cube {
    /// Cube name, unique within the catalog.
    pub name: String,
    /// Segments in display order.
    pub segments: Vec<Segment>,
    /// Version of the stored cube this snapshot was read from.
    pub version: u64,
    /// When the stored cube was last written.
    pub last_modified: Option<DateTime<Utc>>,
}

impl Cube {
    /// Creates an empty, never-persisted cube.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            segments: Vec::new(),
            version: 0,
            last_modified: None,
        }
    }

    /// Returns the segments in display order.
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Looks up a segment by id.
    #[must_use]
    pub fn segment_by_id(&self, id: &SegmentId) -> Option<&Segment> {
        self.segments.iter().find(|s| &s.id == id)
    }

    /// Looks up a segment by id for mutation.
    #[must_use]
    pub fn segment_by_id_mut(&mut self, id: &SegmentId) -> Option<&mut Segment> {
        self.segments.iter_mut().find(|s| &s.id == id)
    }

    /// Appends a segment.
    pub fn add_segment(&mut self, segment: Segment) {
        self.segments.push(segment);
    }

    /// Removes every segment whose id is in `ids`.
    ///
    /// Returns the removed segments in their original order. Ids that match
    /// no segment are ignored.
    pub fn remove_segments(&mut self, ids: &HashSet<SegmentId>) -> Vec<Segment> {
        let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.segments)
            .into_iter()
            .partition(|s| ids.contains(&s.id));
        self.segments = kept;
        removed
    }

    /// Returns the segments visible to queries.
    pub fn ready_segments(&self) -> impl Iterator<Item = &Segment> {
        self.segments.iter().filter(|s| s.status.is_ready())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::SegmentStatus;

    fn cube_with(ids: &[&str]) -> Cube {
        let mut cube = Cube::new("sales_cube");
        for id in ids {
            cube.add_segment(Segment::new(SegmentId::new(*id), *id));
        }
        cube
    }

    #[test]
    fn segment_lookup_by_id() {
        let cube = cube_with(&["s1", "s2"]);
        assert!(cube.segment_by_id(&SegmentId::new("s2")).is_some());
        assert!(cube.segment_by_id(&SegmentId::new("s3")).is_none());
    }

    #[test]
    fn remove_segments_keeps_order_and_ignores_unknown_ids() {
        let mut cube = cube_with(&["s1", "s2", "s3", "m1"]);
        let ids: HashSet<SegmentId> = ["s3", "s1", "s9"].into_iter().map(SegmentId::new).collect();

        let removed = cube.remove_segments(&ids);

        let removed_ids: Vec<&str> = removed.iter().map(|s| s.id.as_str()).collect();
        let kept_ids: Vec<&str> = cube.segments().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(removed_ids, vec!["s1", "s3"]);
        assert_eq!(kept_ids, vec!["s2", "m1"]);
    }

    #[test]
    fn ready_segments_filters_status() {
        let mut cube = cube_with(&["s1", "s2"]);
        cube.segment_by_id_mut(&SegmentId::new("s1")).unwrap().status = SegmentStatus::Ready;
        assert_eq!(cube.ready_segments().count(), 1);
    }
}
