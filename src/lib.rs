//! This crate implements an advanced line and character diff engine.  It
//! deliberately does not aim for minimal diffs: alignments are biased
//! toward what a human reader expects, using boundary scores, word
//! coverage and the removal of coincidental matches, and relocated blocks
//! can be reported as moves instead of unrelated deletions and
//! insertions.
//!
//! ```rust
//! use lines_diff::{compute_diff_from_text, DiffOptions};
//!
//! let diff = compute_diff_from_text(
//!     "fn main() {\n    greet(\"hi\");\n}\n",
//!     "fn main() {\n    greet(\"hello\");\n}\n",
//!     &DiffOptions::default(),
//! );
//! assert_eq!(diff.changes.len(), 1);
//! assert_eq!(diff.changes[0].original.to_string(), "[2, 3)");
//! assert_eq!(diff.changes[0].modified.to_string(), "[2, 3)");
//! ```
//!
//! ## Functionality
//!
//! * [`compute_diff`] / [`compute_diff_from_text`]: the engine entry
//!   points, producing a [`LinesDiff`] with ordered line level changes,
//!   character level inner mappings and optional move detection.
//! * [`algorithms`]: the underlying diff kernels behind a common
//!   sequence abstraction, usable on their own.
//!
//! ## Features
//!
//! The crate has no mandatory dependencies.
//!
//! * `serde`: implements `Serialize` and `Deserialize` for the result and
//!   geometry types.
pub mod algorithms;

mod deadline;
mod engine;
mod geometry;
mod mappings;

pub use crate::engine::{compute_diff, compute_diff_from_text, DiffOptions};
pub use crate::geometry::{LineRange, LineRangeSet, OffsetRange, Position, TextRange};
pub use crate::mappings::{
    DetailedLineRangeMapping, LineRangeMapping, LinesDiff, MovedText, OffsetPair, RangeMapping,
    SequenceDiff,
};
