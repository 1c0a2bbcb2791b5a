//! Layout input: glyph runs from an external layout provider.

mod provider;
mod runs;

pub use provider::{JsonLayoutProvider, LayoutParams, LayoutProvider};
pub use runs::{round_size, Glyph, LayoutDump, LayoutLine, LayoutPage, RunBuilder};
