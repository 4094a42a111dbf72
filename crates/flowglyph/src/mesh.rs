//! CPU-side triangle meshes.
//!
//! Vertex layout is `#[repr(C)]` + `Pod` so a host can upload
//! `bytemuck::cast_slice(&mesh.vertices)` straight into a vertex buffer.
//! Indices are always `u32`: combined meshes routinely pass 65535 vertices.

use glam::{Mat3, Mat4, Vec3};
use serde::Serialize;

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

impl Vertex {
    #[inline]
    pub fn new(position: Vec3, normal: Vec3) -> Self {
        Self {
            position: position.to_array(),
            normal: normal.to_array(),
        }
    }
}

/// Axis-aligned bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Aabb {
    pub min: [f32; 3],
    pub max: [f32; 3],
}

impl Aabb {
    /// Bounds that contain nothing; the first `extend` snaps to that point.
    pub const EMPTY: Aabb = Aabb {
        min: [f32::INFINITY; 3],
        max: [f32::NEG_INFINITY; 3],
    };

    #[inline]
    pub fn extend(&mut self, p: [f32; 3]) {
        for axis in 0..3 {
            self.min[axis] = self.min[axis].min(p[axis]);
            self.max[axis] = self.max[axis].max(p[axis]);
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.min[0] > self.max[0]
    }

    /// Extent along each axis; zero for empty bounds.
    pub fn size(&self) -> Vec3 {
        if self.is_empty() {
            return Vec3::ZERO;
        }
        Vec3::from(self.max) - Vec3::from(self.min)
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    /// Triangle list.
    pub indices: Vec<u32>,
}

impl Mesh {
    #[inline]
    pub fn with_capacity(v: usize, i: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(v),
            indices: Vec::with_capacity(i),
        }
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn bounds(&self) -> Aabb {
        let mut aabb = Aabb::EMPTY;
        for v in &self.vertices {
            aabb.extend(v.position);
        }
        aabb
    }

    /// Append `other` with every vertex baked through `transform`, offsetting
    /// indices by the current vertex count.
    ///
    /// `normal_matrix` maps object-space normals; degenerate results become
    /// zero vectors instead of NaN.
    pub fn append_transformed(&mut self, other: &Mesh, transform: &Mat4, normal_matrix: &Mat3) {
        let base = self.vertices.len() as u32;

        self.vertices.extend(other.vertices.iter().map(|v| {
            let position = transform.transform_point3(Vec3::from(v.position));
            let normal = (*normal_matrix * Vec3::from(v.normal)).normalize_or_zero();
            Vertex::new(position, normal)
        }));

        self.indices
            .extend(other.indices.iter().map(|&idx| base + idx));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Quat;

    fn triangle() -> Mesh {
        Mesh {
            vertices: vec![
                Vertex::new(Vec3::ZERO, Vec3::Z),
                Vertex::new(Vec3::X, Vec3::Z),
                Vertex::new(Vec3::Y, Vec3::Z),
            ],
            indices: vec![0, 1, 2],
        }
    }

    #[test]
    fn test_append_offsets_indices() {
        let tri = triangle();
        let mut combined = Mesh::default();

        combined.append_transformed(&tri, &Mat4::IDENTITY, &Mat3::IDENTITY);
        combined.append_transformed(
            &tri,
            &Mat4::from_translation(Vec3::new(0.0, 0.0, 5.0)),
            &Mat3::IDENTITY,
        );

        assert_eq!(combined.vertex_count(), 6);
        assert_eq!(combined.indices, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(combined.vertices[4].position, [1.0, 0.0, 5.0]);
    }

    #[test]
    fn test_normals_follow_rotation() {
        let rot = Quat::from_rotation_x(std::f32::consts::FRAC_PI_2);
        let mut combined = Mesh::default();
        combined.append_transformed(&triangle(), &Mat4::from_quat(rot), &Mat3::from_quat(rot));

        let n = Vec3::from(combined.vertices[0].normal);
        assert!((n - Vec3::NEG_Y).length() < 1e-6);
    }

    #[test]
    fn test_zero_normal_matrix_gives_zero_normals() {
        let mut combined = Mesh::default();
        combined.append_transformed(&triangle(), &Mat4::from_scale(Vec3::ZERO), &Mat3::ZERO);

        assert!(combined.vertices.iter().all(|v| v.normal == [0.0; 3]));
        assert!(combined.vertices.iter().all(|v| v.position == [0.0; 3]));
    }

    #[test]
    fn test_bounds() {
        let mesh = triangle();
        let b = mesh.bounds();
        assert_eq!(b.min, [0.0, 0.0, 0.0]);
        assert_eq!(b.max, [1.0, 1.0, 0.0]);
        assert_eq!(b.size(), Vec3::new(1.0, 1.0, 0.0));
        assert_eq!(Mesh::default().bounds().size(), Vec3::ZERO);
    }

    #[test]
    fn test_vertex_is_tightly_packed() {
        assert_eq!(std::mem::size_of::<Vertex>(), 24);
        let mesh = triangle();
        let bytes: &[u8] = bytemuck::cast_slice(&mesh.vertices);
        assert_eq!(bytes.len(), 72);
    }
}
