use glam::{Mat3, Mat4, Quat, Vec3};

/// Reference up axis for glyph orientation.
pub const UP: Vec3 = Vec3::Y;

/// Where and how one prototype mesh is placed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InstanceTransform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl InstanceTransform {
    #[inline]
    pub fn to_mat4(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }

    /// Inverse-transpose of the linear part, i.e. `R * S^-1`.
    ///
    /// With a zero scale component the inverse does not exist; normals then
    /// only follow the rotation.
    pub fn normal_matrix(&self) -> Mat3 {
        let rotation = Mat3::from_quat(self.rotation);
        if self.scale.cmpeq(Vec3::ZERO).any() || !self.scale.is_finite() {
            return rotation;
        }
        rotation * Mat3::from_diagonal(self.scale.recip())
    }
}

/// Rotation taking +Z to `forward` while keeping +Y as close to [`UP`] as
/// possible (a left-handed-style "look rotation" expressed with glam's
/// column basis).
///
/// When `forward` is parallel or antiparallel to [`UP`] the basis is
/// undefined; the shortest arc from +Z is used instead. Zero or non-finite
/// input yields the identity.
pub fn look_rotation(forward: Vec3) -> Quat {
    let forward = forward.normalize_or_zero();
    if forward == Vec3::ZERO {
        return Quat::IDENTITY;
    }

    let right = UP.cross(forward);
    if right.length_squared() < 1e-12 {
        return Quat::from_rotation_arc(Vec3::Z, forward);
    }

    let right = right.normalize();
    let up = forward.cross(right);
    Quat::from_mat3(&Mat3::from_cols(right, up, forward)).normalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: Vec3, b: Vec3) {
        assert!((a - b).length() < 1e-5, "{a:?} != {b:?}");
    }

    #[test]
    fn test_look_rotation_maps_z_to_forward() {
        let dirs = [
            Vec3::X,
            Vec3::NEG_X,
            Vec3::Z,
            Vec3::NEG_Z,
            Vec3::new(1.0, 2.0, 3.0).normalize(),
            Vec3::new(-0.3, -0.9, 0.1).normalize(),
        ];

        for dir in dirs {
            let q = look_rotation(dir);
            assert!(q.is_normalized());
            assert_close(q * Vec3::Z, dir);
        }
    }

    #[test]
    fn test_look_rotation_keeps_up_vertical() {
        let q = look_rotation(Vec3::X);
        assert_close(q * Vec3::Y, Vec3::Y);
        assert_close(q * Vec3::X, Vec3::NEG_Z);
    }

    #[test]
    fn test_look_rotation_parallel_to_up() {
        for dir in [Vec3::Y, Vec3::NEG_Y] {
            let q = look_rotation(dir);
            assert!(q.is_finite());
            assert_close(q * Vec3::Z, dir);
        }
    }

    #[test]
    fn test_look_rotation_zero_is_identity() {
        assert_eq!(look_rotation(Vec3::ZERO), Quat::IDENTITY);
        assert_eq!(look_rotation(Vec3::NAN), Quat::IDENTITY);
    }

    #[test]
    fn test_normal_matrix_for_degenerate_scale() {
        let t = InstanceTransform {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::new(0.0, 1.0, 1.0),
        };
        assert_eq!(t.normal_matrix(), Mat3::IDENTITY);
    }

    #[test]
    fn test_normal_matrix_stays_perpendicular() {
        let t = InstanceTransform {
            translation: Vec3::new(4.0, 5.0, 6.0),
            rotation: look_rotation(Vec3::new(1.0, 1.0, 0.0)),
            scale: Vec3::new(0.1, 0.1, 3.0),
        };

        // A slanted surface: tangent (1, 0, -1), normal (1, 0, 1).
        let tangent = t.to_mat4().transform_vector3(Vec3::new(1.0, 0.0, -1.0));
        let normal = t.normal_matrix() * Vec3::new(1.0, 0.0, 1.0);
        assert!(tangent.dot(normal).abs() < 1e-4);
    }
}
