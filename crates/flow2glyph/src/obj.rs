//! Minimal Wavefront OBJ reader/writer for prototypes and batch export.

use std::io::{BufRead, BufReader, Read, Write};

use anyhow::{bail, Context, Result};
use flowglyph::{Mesh, Vertex};
use glam::Vec3;

/// Resolve a 1-based (or negative, relative) OBJ index against `len` items.
fn resolve_index(raw: &str, len: usize) -> Result<usize> {
    let i: i64 = raw.parse().with_context(|| format!("Bad index {raw:?}"))?;
    let resolved = match i {
        0 => bail!("OBJ indices are 1-based, found 0"),
        i if i > 0 => (i - 1) as usize,
        i => {
            let back = i.unsigned_abs() as usize;
            if back > len {
                bail!("Relative index {i} reaches before the first element");
            }
            len - back
        }
    };

    if resolved >= len {
        bail!("Index {i} out of range ({len} elements)");
    }

    Ok(resolved)
}

fn parse_vec3<'a>(mut parts: impl Iterator<Item = &'a str>, what: &str) -> Result<Vec3> {
    let mut next = |axis: &str| -> Result<f32> {
        parts
            .next()
            .with_context(|| format!("Missing {what} {axis} coordinate"))?
            .parse::<f32>()
            .with_context(|| format!("Bad {what} {axis} coordinate"))
    };

    Ok(Vec3::new(next("x")?, next("y")?, next("z")?))
}

/// Read `v`, `vn` and `f` records. Polygons are fan-triangulated.
///
/// Faces that reference a normal keep it per corner; corners without one get
/// the face normal. Every face corner becomes its own vertex.
pub fn read_obj<R: Read>(reader: R) -> Result<Mesh> {
    let mut positions: Vec<Vec3> = Vec::new();
    let mut normals: Vec<Vec3> = Vec::new();
    let mut mesh = Mesh::default();

    for (line_no, line_result) in BufReader::new(reader).lines().enumerate() {
        let line = line_result?;
        let trimmed = line.trim();
        let mut parts = trimmed.split_whitespace();

        match parts.next() {
            Some("v") => positions.push(
                parse_vec3(parts, "vertex").with_context(|| format!("line {}", line_no + 1))?,
            ),
            Some("vn") => normals.push(
                parse_vec3(parts, "normal").with_context(|| format!("line {}", line_no + 1))?,
            ),
            Some("f") => {
                let mut corners: Vec<(Vec3, Option<Vec3>)> = Vec::with_capacity(4);

                for token in parts {
                    // v, v/vt, v//vn, v/vt/vn
                    let mut refs = token.split('/');
                    let v = resolve_index(refs.next().unwrap_or(""), positions.len())
                        .with_context(|| format!("line {}", line_no + 1))?;
                    let vn = match refs.nth(1) {
                        Some(raw) if !raw.is_empty() => Some(
                            normals[resolve_index(raw, normals.len())
                                .with_context(|| format!("line {}", line_no + 1))?],
                        ),
                        _ => None,
                    };
                    corners.push((positions[v], vn));
                }

                if corners.len() < 3 {
                    bail!("line {}: face with {} corners", line_no + 1, corners.len());
                }

                let face_normal = (corners[1].0 - corners[0].0)
                    .cross(corners[2].0 - corners[0].0)
                    .normalize_or_zero();

                for k in 1..corners.len() - 1 {
                    for &(p, n) in [&corners[0], &corners[k], &corners[k + 1]] {
                        mesh.indices.push(mesh.vertices.len() as u32);
                        mesh.vertices.push(Vertex::new(p, n.unwrap_or(face_normal)));
                    }
                }
            }
            _ => {}
        }
    }

    // A point-only file still counts as a prototype.
    if mesh.vertices.is_empty() {
        mesh.vertices = positions
            .into_iter()
            .map(|p| Vertex::new(p, Vec3::ZERO))
            .collect();
    }

    Ok(mesh)
}

/// Write `mesh` as one OBJ object with per-vertex normals.
pub fn write_obj<W: Write>(writer: &mut W, name: &str, mesh: &Mesh) -> Result<()> {
    writeln!(writer, "o {name}")?;

    for v in &mesh.vertices {
        let [x, y, z] = v.position;
        writeln!(writer, "v {x} {y} {z}")?;
    }

    for v in &mesh.vertices {
        let [x, y, z] = v.normal;
        writeln!(writer, "vn {x} {y} {z}")?;
    }

    for tri in mesh.indices.chunks_exact(3) {
        let (a, b, c) = (tri[0] + 1, tri[1] + 1, tri[2] + 1);
        writeln!(writer, "f {a}//{a} {b}//{b} {c}//{c}")?;
    }

    writer.flush()?;

    Ok(())
}
