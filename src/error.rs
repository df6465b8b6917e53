//! Error type for index-checked track operations.
//!
//! Only programmer errors (bad node or segment indices) are reported here.
//! Degenerate geometry and bad configuration are resolved with fallbacks.

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TrackError {
    #[error("node index {index} out of range (len {len})")]
    NodeOutOfRange { index: usize, len: usize },
    #[error("segment index {index} out of range (count {count})")]
    SegmentOutOfRange { index: usize, count: usize },
    #[error("node {index} does not lie on the curve")]
    NodeOffCurve { index: usize },
}

pub type Result<T> = std::result::Result<T, TrackError>;
