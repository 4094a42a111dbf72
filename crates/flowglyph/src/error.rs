use thiserror::Error;

use crate::batch::GlyphPart;

/// Configuration problems detected before any sample is batched.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BuildError {
    #[error("{0} prototype mesh has no vertices")]
    EmptyPrototype(GlyphPart),

    #[error("{part} prototype index {index} out of range ({vertices} vertices)")]
    IndexOutOfRange {
        part: GlyphPart,
        index: u32,
        vertices: usize,
    },

    #[error("{part} prototype index count {count} is not a multiple of 3")]
    IncompleteTriangle { part: GlyphPart, count: usize },
}
