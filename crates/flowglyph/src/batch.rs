//! Glyph placement and per-band mesh merging.
//!
//! Every sample contributes one shaft and one head instance. Instances are
//! bucketed by temperature band and each bucket is baked into a single mesh,
//! so the output never holds more than `2 * TemperatureBand::COUNT` meshes.

use std::collections::BTreeMap;

use glam::Vec3;
use log::{debug, info};
use rayon::prelude::*;
use serde::Serialize;

use crate::band::{classify, TemperatureBand};
use crate::error::BuildError;
use crate::mesh::Mesh;
use crate::sample::FlowSample;
use crate::transform::{look_rotation, InstanceTransform};

/// Shrinks every glyph to reduce overlap in dense fields.
pub const DENSITY_SCALE: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum GlyphPart {
    Shaft,
    Head,
}

impl GlyphPart {
    pub const ALL: [GlyphPart; 2] = [GlyphPart::Shaft, GlyphPart::Head];

    pub fn name(self) -> &'static str {
        match self {
            GlyphPart::Shaft => "shaft",
            GlyphPart::Head => "head",
        }
    }
}

impl std::fmt::Display for GlyphPart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GlyphParams {
    /// Shaft length per unit of velocity magnitude.
    pub length_multiplier: f32,
    /// Shaft thickness per unit of velocity magnitude.
    pub thickness_multiplier: f32,
    /// Head size relative to the shaft thickness.
    pub head_scale: f32,
    pub density_scale: f32,
    /// Reserved for chunked building; accepted and ignored.
    pub batch_size_hint: usize,
}

impl Default for GlyphParams {
    fn default() -> Self {
        Self {
            length_multiplier: 1.0,
            thickness_multiplier: 0.1,
            head_scale: 1.0,
            density_scale: DENSITY_SCALE,
            batch_size_hint: 500,
        }
    }
}

/// Validated shaft and head meshes.
#[derive(Debug, Clone)]
pub struct Prototypes {
    shaft: Mesh,
    head: Mesh,
    shaft_depth: f32,
}

impl Prototypes {
    /// Check both meshes up front so a bad prototype fails the build before
    /// any sample is touched.
    pub fn new(shaft: Mesh, head: Mesh) -> Result<Self, BuildError> {
        validate(&shaft, GlyphPart::Shaft)?;
        validate(&head, GlyphPart::Head)?;

        let shaft_depth = shaft.bounds().size().z;
        debug!(
            "Prototypes: shaft {} verts (depth {:.4}), head {} verts",
            shaft.vertex_count(),
            shaft_depth,
            head.vertex_count()
        );

        Ok(Self {
            shaft,
            head,
            shaft_depth,
        })
    }

    #[inline]
    pub fn shaft(&self) -> &Mesh {
        &self.shaft
    }

    #[inline]
    pub fn head(&self) -> &Mesh {
        &self.head
    }

    /// Extent of the shaft prototype along its long (+Z) axis.
    #[inline]
    pub fn shaft_depth(&self) -> f32 {
        self.shaft_depth
    }

    #[inline]
    pub fn mesh(&self, part: GlyphPart) -> &Mesh {
        match part {
            GlyphPart::Shaft => &self.shaft,
            GlyphPart::Head => &self.head,
        }
    }
}

fn validate(mesh: &Mesh, part: GlyphPart) -> Result<(), BuildError> {
    if mesh.is_empty() {
        return Err(BuildError::EmptyPrototype(part));
    }

    if mesh.indices.len() % 3 != 0 {
        return Err(BuildError::IncompleteTriangle {
            part,
            count: mesh.indices.len(),
        });
    }

    if let Some(&index) = mesh
        .indices
        .iter()
        .find(|&&i| i as usize >= mesh.vertex_count())
    {
        return Err(BuildError::IndexOutOfRange {
            part,
            index,
            vertices: mesh.vertex_count(),
        });
    }

    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct BatchKey {
    pub band: TemperatureBand,
    pub part: GlyphPart,
}

impl BatchKey {
    /// Object name handed to the host, e.g. `ArrowShaftBatch_Orange`.
    pub fn object_name(&self) -> String {
        match self.part {
            GlyphPart::Shaft => format!("ArrowShaftBatch_{}", self.band),
            GlyphPart::Head => format!("ArrowHeadBatch_{}", self.band),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CombinedMesh {
    pub mesh: Mesh,
    /// Number of prototype copies baked into `mesh`.
    pub instances: usize,
}

/// Result of one build: at most one mesh per (band, part).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GlyphBatches {
    batches: BTreeMap<BatchKey, CombinedMesh>,
}

impl GlyphBatches {
    pub fn get(&self, band: TemperatureBand, part: GlyphPart) -> Option<&CombinedMesh> {
        self.batches.get(&BatchKey { band, part })
    }

    /// Entries in band order, shaft before head.
    pub fn iter(&self) -> impl Iterator<Item = (&BatchKey, &CombinedMesh)> {
        self.batches.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.batches.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    pub fn total_vertices(&self) -> usize {
        self.batches.values().map(|c| c.mesh.vertex_count()).sum()
    }
}

/// Shaft and head placement for one sample, or `None` for a sample with no
/// usable velocity.
pub fn glyph_transforms(
    sample: &FlowSample,
    shaft_depth: f32,
    params: &GlyphParams,
) -> Option<(InstanceTransform, InstanceTransform)> {
    if sample.magnitude.is_nan() || sample.magnitude <= 0.0 {
        return None;
    }

    let scaled_length = sample.magnitude * params.length_multiplier * params.density_scale;
    let thickness = sample.magnitude * params.thickness_multiplier * params.density_scale;
    let rotation = look_rotation(sample.direction);

    let shaft = InstanceTransform {
        translation: sample.measured_position,
        rotation,
        scale: Vec3::new(thickness, thickness, scaled_length),
    };

    let head = InstanceTransform {
        translation: sample.measured_position
            + rotation * Vec3::new(0.0, 0.0, scaled_length * shaft_depth),
        rotation,
        scale: Vec3::splat(thickness * params.head_scale * params.density_scale),
    };

    Some((shaft, head))
}

fn merge(prototype: &Mesh, transforms: &[InstanceTransform]) -> CombinedMesh {
    let mut mesh = Mesh::with_capacity(
        prototype.vertex_count() * transforms.len(),
        prototype.indices.len() * transforms.len(),
    );

    for t in transforms {
        mesh.append_transformed(prototype, &t.to_mat4(), &t.normal_matrix());
    }

    CombinedMesh {
        mesh,
        instances: transforms.len(),
    }
}

/// Place, bucket and merge glyphs for `samples`.
///
/// Samples without a positive magnitude are skipped. Bands that receive no
/// sample produce no entry. Prototype problems were already rejected by
/// [`Prototypes::new`], so building itself cannot fail.
pub fn build_batches(
    samples: &[FlowSample],
    prototypes: &Prototypes,
    params: &GlyphParams,
) -> GlyphBatches {
    debug!(
        "Building glyphs for {} samples (batch size hint {}, ignored)",
        samples.len(),
        params.batch_size_hint
    );

    // ------------------------------------------------------------------------
    // 1  Per-sample transforms (independent, order preserving).
    // ------------------------------------------------------------------------
    let shaft_depth = prototypes.shaft_depth();
    let placed: Vec<(TemperatureBand, InstanceTransform, InstanceTransform)> = samples
        .par_iter()
        .filter_map(|sample| {
            glyph_transforms(sample, shaft_depth, params)
                .map(|(shaft, head)| (classify(sample.temperature), shaft, head))
        })
        .collect();

    let skipped = samples.len() - placed.len();
    if skipped > 0 {
        debug!("Skipped {} samples without a usable velocity", skipped);
    }

    // ------------------------------------------------------------------------
    // 2  Bucket by band.
    // ------------------------------------------------------------------------
    let mut shafts: [Vec<InstanceTransform>; TemperatureBand::COUNT] = Default::default();
    let mut heads: [Vec<InstanceTransform>; TemperatureBand::COUNT] = Default::default();

    for (band, shaft, head) in placed {
        shafts[band.index()].push(shaft);
        heads[band.index()].push(head);
    }

    // ------------------------------------------------------------------------
    // 3  Merge each non-empty (band, part) bucket; buckets are independent.
    // ------------------------------------------------------------------------
    let jobs: Vec<(BatchKey, &[InstanceTransform])> = TemperatureBand::ALL
        .iter()
        .flat_map(|&band| {
            [
                (BatchKey { band, part: GlyphPart::Shaft }, shafts[band.index()].as_slice()),
                (BatchKey { band, part: GlyphPart::Head }, heads[band.index()].as_slice()),
            ]
        })
        .filter(|(_, transforms)| !transforms.is_empty())
        .collect();

    let batches: BTreeMap<BatchKey, CombinedMesh> = jobs
        .into_par_iter()
        .map(|(key, transforms)| (key, merge(prototypes.mesh(key.part), transforms)))
        .collect();

    for (key, combined) in &batches {
        debug!(
            "{}: {} instances, {} verts, {} tris",
            key.object_name(),
            combined.instances,
            combined.mesh.vertex_count(),
            combined.mesh.triangle_count()
        );
    }

    let batches = GlyphBatches { batches };
    info!(
        "Built {} glyph batches ({} vertices) from {} samples",
        batches.len(),
        batches.total_vertices(),
        samples.len()
    );

    batches
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::Vertex;
    use crate::prototype;

    fn sample(position: Vec3, velocity: Vec3, temperature: f32) -> FlowSample {
        let magnitude = velocity.length();
        FlowSample {
            measured_position: position,
            aux_vectors: [Vec3::ZERO; 2],
            original_position: Vec3::ZERO,
            direction: velocity / magnitude,
            magnitude,
            energy: 0.0,
            pressure: 0.0,
            temperature,
        }
    }

    fn prototypes() -> Prototypes {
        Prototypes::new(prototype::cylinder(6), prototype::cone(6)).unwrap()
    }

    #[test]
    fn test_rejects_empty_prototypes() {
        let err = Prototypes::new(Mesh::default(), prototype::cone(6)).unwrap_err();
        assert_eq!(err, BuildError::EmptyPrototype(GlyphPart::Shaft));

        let err = Prototypes::new(prototype::cylinder(6), Mesh::default()).unwrap_err();
        assert_eq!(err, BuildError::EmptyPrototype(GlyphPart::Head));
    }

    #[test]
    fn test_rejects_bad_indices() {
        let mut broken = prototype::cone(4);
        broken.indices.push(999);
        broken.indices.extend_from_slice(&[0, 0]);
        let err = Prototypes::new(prototype::cylinder(4), broken).unwrap_err();
        assert!(matches!(err, BuildError::IndexOutOfRange { index: 999, .. }));

        let mut ragged = prototype::cylinder(4);
        ragged.indices.pop();
        let err = Prototypes::new(ragged, prototype::cone(4)).unwrap_err();
        assert!(matches!(err, BuildError::IncompleteTriangle { .. }));
    }

    #[test]
    fn test_transform_parameters() {
        let params = GlyphParams {
            length_multiplier: 2.0,
            thickness_multiplier: 0.2,
            head_scale: 3.0,
            ..GlyphParams::default()
        };
        let s = sample(Vec3::new(1.0, 2.0, 3.0), Vec3::new(4.0, 0.0, 0.0), 22.5);
        let (shaft, head) = glyph_transforms(&s, 1.0, &params).unwrap();

        // length = 4 * 2 * 0.5, thickness = 4 * 0.2 * 0.5
        assert!((shaft.scale - Vec3::new(0.4, 0.4, 4.0)).length() < 1e-6);
        assert_eq!(shaft.translation, Vec3::new(1.0, 2.0, 3.0));
        assert!((head.translation - Vec3::new(5.0, 2.0, 3.0)).length() < 1e-5);
        assert!((head.scale - Vec3::splat(0.4 * 3.0 * 0.5)).length() < 1e-6);
        assert_eq!(shaft.rotation, head.rotation);
    }

    #[test]
    fn test_head_sits_on_shaft_tip() {
        let protos = prototypes();
        let s = sample(Vec3::new(-2.0, 1.0, 0.5), Vec3::new(1.0, -2.0, 2.0), 30.0);
        let (shaft, head) = glyph_transforms(&s, protos.shaft_depth(), &GlyphParams::default()).unwrap();

        let tip = shaft.to_mat4().transform_point3(Vec3::Z);
        assert!((tip - head.translation).length() < 1e-5);
    }

    #[test]
    fn test_zero_magnitude_is_skipped() {
        let mut still = sample(Vec3::ZERO, Vec3::X, 22.0);
        still.magnitude = 0.0;
        let mut nan = still;
        nan.magnitude = f32::NAN;

        assert!(glyph_transforms(&still, 1.0, &GlyphParams::default()).is_none());
        assert!(glyph_transforms(&nan, 1.0, &GlyphParams::default()).is_none());

        let batches = build_batches(&[still, nan], &prototypes(), &GlyphParams::default());
        assert!(batches.is_empty());
    }

    #[test]
    fn test_empty_input_builds_nothing() {
        let batches = build_batches(&[], &prototypes(), &GlyphParams::default());
        assert!(batches.is_empty());
        assert_eq!(batches.total_vertices(), 0);
    }

    #[test]
    fn test_vertex_count_matches_instances() {
        let protos = prototypes();
        let samples: Vec<FlowSample> = (0..50)
            .map(|i| {
                sample(
                    Vec3::new(i as f32, 0.0, 0.0),
                    Vec3::new(1.0, (i % 3) as f32, 0.5),
                    15.0 + i as f32 * 0.5,
                )
            })
            .collect();

        let batches = build_batches(&samples, &protos, &GlyphParams::default());
        assert!(batches.len() <= 14);

        for (key, combined) in batches.iter() {
            let proto = protos.mesh(key.part);
            let expected = samples
                .iter()
                .filter(|s| classify(s.temperature) == key.band)
                .count();
            assert_eq!(combined.instances, expected);
            assert_eq!(combined.mesh.vertex_count(), expected * proto.vertex_count());
            assert_eq!(combined.mesh.indices.len(), expected * proto.indices.len());
        }
    }

    #[test]
    fn test_build_is_repeatable() {
        let protos = prototypes();
        let samples: Vec<FlowSample> = (0..200)
            .map(|i| {
                let f = i as f32;
                sample(
                    Vec3::new(f.sin(), f.cos(), f * 0.01),
                    Vec3::new(f.cos() + 1.5, f.sin(), 0.3),
                    19.0 + (i % 10) as f32,
                )
            })
            .collect();

        let first = build_batches(&samples, &protos, &GlyphParams::default());
        let second = build_batches(&samples, &protos, &GlyphParams::default());
        assert_eq!(first, second);
    }

    #[test]
    fn test_indices_exceed_sixteen_bits() {
        // 1000-vertex strip prototype, 70 instances => 70_000 vertices in one batch.
        let strip = Mesh {
            vertices: (0..1000)
                .map(|i| Vertex::new(Vec3::new(i as f32, 0.0, (i % 2) as f32), Vec3::Y))
                .collect(),
            indices: (0..998u32).flat_map(|i| [i, i + 1, i + 2]).collect(),
        };
        let protos = Prototypes::new(strip.clone(), strip).unwrap();
        let samples: Vec<FlowSample> = (0..70)
            .map(|i| sample(Vec3::new(0.0, i as f32, 0.0), Vec3::Z, 26.0))
            .collect();

        let batches = build_batches(&samples, &protos, &GlyphParams::default());
        let shaft = batches.get(TemperatureBand::Orange, GlyphPart::Shaft).unwrap();

        assert_eq!(shaft.mesh.vertex_count(), 70_000);
        assert_eq!(shaft.mesh.indices.iter().copied().max(), Some(69_999));
        assert_eq!(&shaft.mesh.indices[shaft.mesh.indices.len() - 3..], &[69_997, 69_998, 69_999]);
    }

    #[test]
    fn test_zero_scale_yields_degenerate_geometry() {
        let params = GlyphParams {
            length_multiplier: 0.0,
            thickness_multiplier: 0.0,
            ..GlyphParams::default()
        };
        let s = sample(Vec3::new(3.0, 3.0, 3.0), Vec3::Y, 24.5);
        let batches = build_batches(&[s], &prototypes(), &params);

        let shaft = batches.get(TemperatureBand::Yellow, GlyphPart::Shaft).unwrap();
        assert!(shaft
            .mesh
            .vertices
            .iter()
            .all(|v| Vec3::from(v.position) == Vec3::splat(3.0)));
        assert!(shaft
            .mesh
            .vertices
            .iter()
            .all(|v| v.normal.iter().all(|c| c.is_finite())));
    }

    #[test]
    fn test_object_names() {
        let key = BatchKey {
            band: TemperatureBand::LightBlue,
            part: GlyphPart::Head,
        };
        assert_eq!(key.object_name(), "ArrowHeadBatch_LightBlue");
    }
}
