use glam::Vec3;

/// One accepted row of the flow table.
///
/// Only rows whose 20 fields parsed and whose velocity has a finite, non-zero
/// magnitude become samples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlowSample {
    /// Measurement location; this is where the glyph is placed.
    pub measured_position: Vec3,
    /// Columns 3..=8. Parsed and carried along, not consumed by batching.
    pub aux_vectors: [Vec3; 2],
    /// Columns 9..=11. Parsed and carried along, not consumed by batching.
    pub original_position: Vec3,
    /// Unit velocity direction.
    pub direction: Vec3,
    /// Velocity magnitude (> 0).
    pub magnitude: f32,
    /// Mean of the three energy components.
    pub energy: f32,
    pub pressure: f32,
    pub temperature: f32,
}

impl FlowSample {
    /// Velocity vector reconstructed from direction and magnitude.
    #[inline]
    pub fn velocity(&self) -> Vec3 {
        self.direction * self.magnitude
    }
}
