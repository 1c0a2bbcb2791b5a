//! Document-structure recovery: run filtering, chunk merging and text
//! normalization.

mod filter;
mod merger;
mod normalize;

pub use filter::{Exclusion, LineFilter, PageExclusions, HEADING_OVERRIDE_SIZE, RANGE_SENTINEL};
pub use merger::{merge_runs, ChunkMerger};
pub use normalize::{CaptionFilter, TextFilter, TextNormalizer};
