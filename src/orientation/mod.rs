//! Orientation inference.
//!
//! Each accepted detection in each sampled frame casts a body-axis vote and, on
//! the matching axis, a head-side vote. The tallies for one video reduce to a
//! single [`Verdict`].
//!
//! Every person above the confidence threshold votes, so crowded footage is
//! decided by the crowd rather than by one primary subject.

pub mod verdict;
pub mod vote;

pub use verdict::{BodyAxis, HeadPosition, Verdict};
pub use vote::{cast_votes, vote_for, DetectionVote, HeadSide, VoteTally};
