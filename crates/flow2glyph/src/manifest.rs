//! Host-side description of a build: which file holds which batch, and which
//! material each temperature band is drawn with.

use flowglyph::{Aabb, BatchKey, CombinedMesh, GlyphParams, GlyphPart, ParseSummary, TemperatureBand};
use serde::Serialize;

/// Orientation applied to the whole glyph assembly by the host, in degrees
/// (x, y, z Euler). The core geometry is left in table coordinates.
pub const ASSEMBLY_EULER_DEG: [f32; 3] = [0.0, -90.0, 90.0];

/// Default material transparency.
pub const DEFAULT_ALPHA: f32 = 0.75;

/// Base RGB per band; alpha comes from configuration.
pub fn band_rgb(band: TemperatureBand) -> [f32; 3] {
    match band {
        TemperatureBand::Red => [1.0, 0.0, 0.0],
        TemperatureBand::LightBlue => [0.678, 0.847, 0.902],
        TemperatureBand::Green => [0.0, 0.502, 0.0],
        TemperatureBand::LightGreen => [0.565, 0.933, 0.565],
        TemperatureBand::Yellow => [1.0, 1.0, 0.0],
        TemperatureBand::Orange => [1.0, 0.647, 0.0],
        TemperatureBand::Blue => [0.0, 0.0, 1.0],
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Material {
    pub band: TemperatureBand,
    pub rgba: [f32; 4],
    /// "alpha": src-alpha / one-minus-src-alpha, no depth writes.
    pub blend: &'static str,
    pub depth_write: bool,
}

impl Material {
    pub fn for_band(band: TemperatureBand, alpha: f32) -> Self {
        let [r, g, b] = band_rgb(band);
        let alpha = alpha.clamp(0.0, 1.0);
        let transparent = alpha < 1.0;

        Self {
            band,
            rgba: [r, g, b, alpha],
            blend: if transparent { "alpha" } else { "opaque" },
            depth_write: !transparent,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchEntry {
    pub name: String,
    pub band: TemperatureBand,
    pub part: GlyphPart,
    pub file: String,
    pub instances: usize,
    pub vertices: usize,
    pub triangles: usize,
    pub bounds: Aabb,
}

impl BatchEntry {
    pub fn new(key: &BatchKey, combined: &CombinedMesh, file: String) -> Self {
        Self {
            name: key.object_name(),
            band: key.band,
            part: key.part,
            file,
            instances: combined.instances,
            vertices: combined.mesh.vertex_count(),
            triangles: combined.mesh.triangle_count(),
            bounds: combined.mesh.bounds(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Manifest {
    pub source: String,
    pub parse: ParseSummary,
    pub params: GlyphParams,
    pub assembly_euler_deg: [f32; 3],
    pub materials: Vec<Material>,
    pub batches: Vec<BatchEntry>,
}

impl Manifest {
    /// Materials are listed for every band, used or not, so the host can
    /// configure them once up front.
    pub fn new(source: String, parse: ParseSummary, params: GlyphParams, alpha: f32) -> Self {
        Self {
            source,
            parse,
            params,
            assembly_euler_deg: ASSEMBLY_EULER_DEG,
            materials: TemperatureBand::ALL
                .iter()
                .map(|&band| Material::for_band(band, alpha))
                .collect(),
            batches: Vec::new(),
        }
    }
}
