//! Instance transformation data.
//!
//! Level documents describe placed objects as position, rotation and scale.
//! [`Instance`] keeps those three parts together and composes them into a
//! model matrix in translate · rotate · scale order.

use cgmath::{One, Rotation};

/// Per-instance transformation: position, rotation (as quaternion), and scale.
#[derive(Clone, Debug, PartialEq)]
pub struct Instance {
    pub position: cgmath::Vector3<f32>,
    pub rotation: cgmath::Quaternion<f32>,
    pub scale: cgmath::Vector3<f32>,
}

impl Instance {
    /// Create a new instance with identity transformation (no move, rotate, or scale).
    pub fn new() -> Self {
        Self {
            position: cgmath::Vector3::new(0.0, 0.0, 0.0),
            // `Quaternion::one()` is the identity quaternion (no rotation)
            rotation: cgmath::Quaternion::one(),
            scale: cgmath::Vector3::new(1.0, 1.0, 1.0),
        }
    }

    pub fn to_matrix(&self) -> cgmath::Matrix4<f32> {
        cgmath::Matrix4::from_translation(self.position)
            * cgmath::Matrix4::from(self.rotation)
            * cgmath::Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }

    /// Unit +Z of the rotated frame.
    pub fn local_z(&self) -> cgmath::Vector3<f32> {
        self.rotation.rotate_vector(cgmath::Vector3::unit_z())
    }
}

impl Default for Instance {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{Deg, Rotation3, Vector3, Vector4};

    #[test]
    fn matrix_scales_then_rotates_then_translates() {
        let instance = Instance {
            position: Vector3::new(1.0, 2.0, 3.0),
            rotation: cgmath::Quaternion::from_angle_z(Deg(90.0)),
            scale: Vector3::new(2.0, 1.0, 1.0),
        };
        let p = instance.to_matrix() * Vector4::new(1.0, 0.0, 0.0, 1.0);
        // (1,0,0) -> scale (2,0,0) -> rotate (0,2,0) -> translate (1,4,3)
        assert!((p.x - 1.0).abs() < 1e-5);
        assert!((p.y - 4.0).abs() < 1e-5);
        assert!((p.z - 3.0).abs() < 1e-5);
    }

    #[test]
    fn local_z_follows_rotation() {
        let instance = Instance {
            rotation: cgmath::Quaternion::from_angle_y(Deg(90.0)),
            ..Default::default()
        };
        let z = instance.local_z();
        assert!((z.x - 1.0).abs() < 1e-5);
        assert!(z.z.abs() < 1e-5);
    }
}
