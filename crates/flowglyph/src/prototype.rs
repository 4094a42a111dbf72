//! Procedural glyph prototypes.
//!
//! Both shapes point down +Z and start at the origin, so a shaft scaled by
//! `(t, t, L)` ends exactly at `L * depth` where the head is placed.

use std::f32::consts::TAU;

use glam::Vec3;

use crate::mesh::{Mesh, Vertex};

const RADIUS: f32 = 0.5;
const MIN_SEGMENTS: u32 = 3;

#[inline]
fn ring(segments: u32) -> impl Iterator<Item = (f32, f32)> {
    (0..segments).map(move |i| {
        let angle = TAU * i as f32 / segments as f32;
        let (sin, cos) = angle.sin_cos();
        (cos, sin)
    })
}

/// Append a flat disc at height `z` facing `normal` (±Z).
fn push_cap(mesh: &mut Mesh, segments: u32, z: f32, normal: Vec3) {
    let center = mesh.vertices.len() as u32;
    mesh.vertices.push(Vertex::new(Vec3::new(0.0, 0.0, z), normal));

    for (cos, sin) in ring(segments) {
        mesh.vertices
            .push(Vertex::new(Vec3::new(cos * RADIUS, sin * RADIUS, z), normal));
    }

    for i in 0..segments {
        let a = center + 1 + i;
        let b = center + 1 + (i + 1) % segments;
        if normal.z > 0.0 {
            mesh.indices.extend_from_slice(&[center, a, b]);
        } else {
            mesh.indices.extend_from_slice(&[center, b, a]);
        }
    }
}

/// Closed cylinder, radius 0.5, from z = 0 to z = 1.
pub fn cylinder(segments: u32) -> Mesh {
    let segments = segments.max(MIN_SEGMENTS);
    let mut mesh = Mesh::with_capacity(
        (segments * 4 + 2) as usize,
        (segments * 12) as usize,
    );

    // Side wall: bottom ring, then top ring, radial normals.
    for z in [0.0, 1.0] {
        for (cos, sin) in ring(segments) {
            mesh.vertices.push(Vertex::new(
                Vec3::new(cos * RADIUS, sin * RADIUS, z),
                Vec3::new(cos, sin, 0.0),
            ));
        }
    }

    for i in 0..segments {
        let j = (i + 1) % segments;
        let (b0, b1) = (i, j);
        let (t0, t1) = (segments + i, segments + j);
        mesh.indices.extend_from_slice(&[b0, b1, t1, b0, t1, t0]);
    }

    push_cap(&mut mesh, segments, 0.0, Vec3::NEG_Z);
    push_cap(&mut mesh, segments, 1.0, Vec3::Z);

    mesh
}

/// Cone with a base of radius 0.5 at z = 0 and its apex at z = 1.
pub fn cone(segments: u32) -> Mesh {
    let segments = segments.max(MIN_SEGMENTS);
    let mut mesh = Mesh::with_capacity(
        (segments * 3 + 1) as usize,
        (segments * 6) as usize,
    );

    // Slant normal of a cone with height 1 and radius r: (cos, sin, r), normalized.
    for (cos, sin) in ring(segments) {
        let normal = Vec3::new(cos, sin, RADIUS).normalize();
        mesh.vertices
            .push(Vertex::new(Vec3::new(cos * RADIUS, sin * RADIUS, 0.0), normal));
    }

    // One apex vertex per segment so each face keeps its own normal.
    for i in 0..segments {
        let mid = TAU * (i as f32 + 0.5) / segments as f32;
        let (sin, cos) = mid.sin_cos();
        let normal = Vec3::new(cos, sin, RADIUS).normalize();
        mesh.vertices.push(Vertex::new(Vec3::Z, normal));
    }

    for i in 0..segments {
        let j = (i + 1) % segments;
        mesh.indices.extend_from_slice(&[i, j, segments + i]);
    }

    push_cap(&mut mesh, segments, 0.0, Vec3::NEG_Z);

    mesh
}
