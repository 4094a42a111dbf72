//! FLOWGLYPH: flow-field measurement tables -> temperature-banded glyph meshes.
//!
//! - Parses a comma-separated table of per-point flow samples (one header row).
//! - Classifies each sample into one of seven temperature bands.
//! - Places a directional glyph (shaft + head) per sample, oriented along the
//!   velocity and scaled by its magnitude.
//! - Merges every glyph part of a band into one combined mesh, so a host can
//!   draw the whole field with at most 14 draw calls.
//!
//! Table layout (0-indexed columns, at least 20 per row):
//!   0..=2   : measurement location (glyph position)
//!   3..=8   : two auxiliary vectors (kept, unused)
//!   9..=11  : original position (kept, unused)
//!   12..=14 : velocity u, v, w
//!   15..=17 : energy components (averaged)
//!   18      : pressure
//!   19      : temperature
//!
//! The crate never touches host resources: materials, scene parenting and the
//! corrective orientation of the assembly belong to the caller.

pub mod band;
pub mod batch;
pub mod error;
pub mod mesh;
pub mod parser;
pub mod prototype;
pub mod sample;
pub mod transform;

pub use band::{classify, TemperatureBand};
pub use batch::{
    build_batches, BatchKey, CombinedMesh, GlyphBatches, GlyphParams, GlyphPart, Prototypes,
    DENSITY_SCALE,
};
pub use error::BuildError;
pub use mesh::{Aabb, Mesh, Vertex};
pub use parser::{
    parse_table, parse_table_with, read_table_file, ParseOptions, ParseSummary, ParsedTable,
    REQUIRED_FIELDS,
};
pub use sample::FlowSample;
pub use transform::{look_rotation, InstanceTransform};
