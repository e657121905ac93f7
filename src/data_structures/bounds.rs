//! Bounding volumes and frustum culling.
//!
//! Object-space boxes are computed once when geometry is uploaded. Each frame
//! a renderer moves its box into world space with [`Aabb::transform`] and asks
//! the camera [`Frustum`] whether anything of it can be visible.

use cgmath::{InnerSpace, Matrix, Matrix4, Point3, Vector3, Vector4};

/// Axis-aligned bounding box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: Point3<f32>,
    pub max: Point3<f32>,
}

impl Aabb {
    pub fn new(min: Point3<f32>, max: Point3<f32>) -> Self {
        Self { min, max }
    }

    /// The smallest box containing all `points`. An empty iterator yields an
    /// inverted box that contains nothing and fails every frustum test.
    pub fn from_points<I>(points: I) -> Self
    where
        I: IntoIterator<Item = Point3<f32>>,
    {
        let inverted = Self {
            min: Point3::new(f32::INFINITY, f32::INFINITY, f32::INFINITY),
            max: Point3::new(f32::NEG_INFINITY, f32::NEG_INFINITY, f32::NEG_INFINITY),
        };
        points.into_iter().fold(inverted, |mut bbox, p| {
            bbox.min = Point3::new(bbox.min.x.min(p.x), bbox.min.y.min(p.y), bbox.min.z.min(p.z));
            bbox.max = Point3::new(bbox.max.x.max(p.x), bbox.max.y.max(p.y), bbox.max.z.max(p.z));
            bbox
        })
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    pub fn corners(&self) -> [Point3<f32>; 8] {
        let (a, b) = (self.min, self.max);
        [
            Point3::new(a.x, a.y, a.z),
            Point3::new(b.x, a.y, a.z),
            Point3::new(a.x, b.y, a.z),
            Point3::new(b.x, b.y, a.z),
            Point3::new(a.x, a.y, b.z),
            Point3::new(b.x, a.y, b.z),
            Point3::new(a.x, b.y, b.z),
            Point3::new(b.x, b.y, b.z),
        ]
    }

    /// Box around the eight corners after transformation by `matrix`.
    pub fn transform(&self, matrix: &Matrix4<f32>) -> Self {
        if self.is_empty() {
            return *self;
        }
        Self::from_points(self.corners().into_iter().map(|corner| {
            let v = matrix * corner.to_homogeneous();
            Point3::new(v.x, v.y, v.z)
        }))
    }
}

/// A plane `normal · p + distance = 0` with the inside on the positive side.
#[derive(Clone, Copy, Debug)]
pub struct Plane {
    pub normal: Vector3<f32>,
    pub distance: f32,
}

impl Plane {
    fn from_row(v: Vector4<f32>) -> Self {
        let normal = v.truncate();
        let len = normal.magnitude();
        Self {
            normal: normal / len,
            distance: v.w / len,
        }
    }

    pub fn signed_distance(&self, p: Point3<f32>) -> f32 {
        self.normal.dot(Vector3::new(p.x, p.y, p.z)) + self.distance
    }
}

/// The six clip planes of a view-projection matrix.
#[derive(Clone, Copy, Debug)]
pub struct Frustum {
    pub planes: [Plane; 6],
}

impl Frustum {
    /// Extract planes from a `projection * view` matrix that maps depth to
    /// the wgpu clip range `0..=w`.
    pub fn from_view_projection(m: &Matrix4<f32>) -> Self {
        let (r0, r1, r2, r3) = (m.row(0), m.row(1), m.row(2), m.row(3));
        Self {
            planes: [
                Plane::from_row(r3 + r0),
                Plane::from_row(r3 - r0),
                Plane::from_row(r3 + r1),
                Plane::from_row(r3 - r1),
                Plane::from_row(r2),
                Plane::from_row(r3 - r2),
            ],
        }
    }

    /// Conservative test: `false` only when the box lies entirely behind
    /// one of the planes.
    pub fn contains(&self, bbox: &Aabb) -> bool {
        if bbox.is_empty() {
            return false;
        }
        self.planes.iter().all(|plane| {
            // the corner furthest along the plane normal
            let p = Point3::new(
                if plane.normal.x >= 0.0 { bbox.max.x } else { bbox.min.x },
                if plane.normal.y >= 0.0 { bbox.max.y } else { bbox.min.y },
                if plane.normal.z >= 0.0 { bbox.max.z } else { bbox.min.z },
            );
            plane.signed_distance(p) >= 0.0
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::OPENGL_TO_WGPU_MATRIX;

    fn unit_box_at(x: f32, y: f32, z: f32) -> Aabb {
        Aabb::new(
            Point3::new(x - 0.5, y - 0.5, z - 0.5),
            Point3::new(x + 0.5, y + 0.5, z + 0.5),
        )
    }

    fn camera_frustum() -> Frustum {
        // camera at the origin looking down -Z
        let projection =
            OPENGL_TO_WGPU_MATRIX * cgmath::perspective(cgmath::Deg(60.0), 1.0, 0.1, 100.0);
        let view = Matrix4::look_to_rh(
            Point3::new(0.0, 0.0, 0.0),
            Vector3::new(0.0, 0.0, -1.0),
            Vector3::unit_y(),
        );
        Frustum::from_view_projection(&(projection * view))
    }

    #[test]
    fn from_points_encloses_every_point() {
        let bbox = Aabb::from_points([
            Point3::new(1.0, -2.0, 3.0),
            Point3::new(-1.0, 4.0, 0.5),
            Point3::new(0.0, 0.0, -6.0),
        ]);
        assert_eq!(bbox.min, Point3::new(-1.0, -2.0, -6.0));
        assert_eq!(bbox.max, Point3::new(1.0, 4.0, 3.0));
    }

    #[test]
    fn transform_encloses_rotated_corners() {
        let bbox = Aabb::new(Point3::new(0.0, 0.0, 0.0), Point3::new(2.0, 1.0, 1.0));
        let matrix = Matrix4::from_translation(Vector3::new(10.0, 0.0, 0.0))
            * Matrix4::from_angle_y(cgmath::Deg(90.0));
        let moved = bbox.transform(&matrix);
        for corner in bbox.corners() {
            let v = matrix * corner.to_homogeneous();
            assert!(v.x >= moved.min.x - 1e-4 && v.x <= moved.max.x + 1e-4);
            assert!(v.y >= moved.min.y - 1e-4 && v.y <= moved.max.y + 1e-4);
            assert!(v.z >= moved.min.z - 1e-4 && v.z <= moved.max.z + 1e-4);
        }
        // rotating +X onto -Z
        assert!((moved.min.z + 2.0).abs() < 1e-4);
        assert!((moved.min.x - 10.0).abs() < 1e-4);
    }

    #[test]
    fn frustum_keeps_visible_boxes() {
        let frustum = camera_frustum();
        assert!(frustum.contains(&unit_box_at(0.0, 0.0, -10.0)));
        // straddling the near plane still counts
        assert!(frustum.contains(&unit_box_at(0.0, 0.0, 0.0)));
    }

    #[test]
    fn frustum_rejects_boxes_outside() {
        let frustum = camera_frustum();
        assert!(!frustum.contains(&unit_box_at(0.0, 0.0, 10.0)));
        assert!(!frustum.contains(&unit_box_at(50.0, 0.0, -10.0)));
        assert!(!frustum.contains(&unit_box_at(0.0, 0.0, -200.0)));
        assert!(!frustum.contains(&Aabb::from_points([])));
    }
}
