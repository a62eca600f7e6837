//! Segment model and lifecycle status.
//!
//! A segment is one slice of source data folded into a cube. Build steps
//! create segments in [`SegmentStatus::New`]; finalization steps promote them
//! to [`SegmentStatus::Ready`]; merges retire them by removing them from the
//! owning cube.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cubeflow_core::{JobId, SegmentId};

/// Lifecycle status of a segment.
///
/// ```text
/// ┌─────┐  finalize build/merge  ┌───────┐  merged away  ┌─────────┐
/// │ NEW │───────────────────────►│ READY │──────────────►│ retired │
/// └─────┘                        └───────┘               └─────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SegmentStatus {
    /// Created by a build or merge job, not yet queryable.
    #[default]
    New,
    /// Data is built and committed, visible to queries.
    Ready,
    /// Built but waiting on a dependent step before becoming queryable.
    ReadyPending,
}

impl SegmentStatus {
    /// Returns true if the segment is visible to queries.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }

    /// Returns a lowercase label suitable for metrics and logs.
    #[must_use]
    pub const fn as_label(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Ready => "ready",
            Self::ReadyPending => "ready_pending",
        }
    }
}

impl fmt::Display for SegmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::New => write!(f, "NEW"),
            Self::Ready => write!(f, "READY"),
            Self::ReadyPending => write!(f, "READY_PENDING"),
        }
    }
}

/// A bounded slice of a cube's data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    /// Unique id within the owning cube.
    pub id: SegmentId,
    /// Human readable name, usually the covered time range.
    pub name: String,
    /// Lifecycle status.
    pub status: SegmentStatus,
    /// Size of the built segment data in kilobytes.
    pub size_kb: u64,
    /// Number of source records folded into this segment.
    pub source_records: u64,
    /// Total byte size of the source records folded into this segment.
    pub source_records_size: u64,
    /// Job that last built or rebuilt this segment.
    pub last_build_job_id: Option<JobId>,
    /// When this segment was last built.
    pub last_build_time: Option<DateTime<Utc>>,
}

impl Segment {
    /// Creates an empty segment in status NEW.
    #[must_use]
    pub fn new(id: SegmentId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            status: SegmentStatus::New,
            size_kb: 0,
            source_records: 0,
            source_records_size: 0,
            last_build_job_id: None,
            last_build_time: None,
        }
    }

    /// Sets the source statistics.
    #[must_use]
    pub fn with_source_stats(mut self, records: u64, records_size: u64) -> Self {
        self.source_records = records;
        self.source_records_size = records_size;
        self
    }

    /// Sets the status.
    #[must_use]
    pub fn with_status(mut self, status: SegmentStatus) -> Self {
        self.status = status;
        self
    }

    /// Records a completed build and promotes the segment to READY.
    pub fn mark_ready(&mut self, size_kb: u64, job_id: JobId, built_at: DateTime<Utc>) {
        self.size_kb = size_kb;
        self.last_build_job_id = Some(job_id);
        self.last_build_time = Some(built_at);
        self.status = SegmentStatus::Ready;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_segment_starts_in_new_status() {
        let segment = Segment::new(SegmentId::new("s1"), "20240101_20240201");
        assert_eq!(segment.status, SegmentStatus::New);
        assert!(segment.last_build_job_id.is_none());
    }

    #[test]
    fn mark_ready_records_build() {
        let now = Utc::now();
        let mut segment = Segment::new(SegmentId::new("m1"), "merged");
        segment.mark_ready(2048, JobId::new("job-1"), now);

        assert_eq!(segment.status, SegmentStatus::Ready);
        assert_eq!(segment.size_kb, 2048);
        assert_eq!(segment.last_build_job_id, Some(JobId::new("job-1")));
        assert_eq!(segment.last_build_time, Some(now));
    }

    #[test]
    fn segment_serializes_catalog_fields_only() {
        let segment = Segment::new(SegmentId::new("s1"), "20240101_20240201");
        let value = serde_json::to_value(&segment).unwrap();
        let mut keys: Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            vec![
                "id",
                "last_build_job_id",
                "last_build_time",
                "name",
                "size_kb",
                "source_records",
                "source_records_size",
                "status",
            ]
        );
    }

    #[test]
    fn status_serializes_screaming_case() {
        let json = serde_json::to_string(&SegmentStatus::ReadyPending).unwrap();
        assert_eq!(json, "\"READY_PENDING\"");
        assert_eq!(SegmentStatus::ReadyPending.to_string(), "READY_PENDING");
    }
}
