//! Placement of level instances in world space.
//!
//! [`LevelLayout::build`] resolves every instance of a [`LevelDocument`]
//! against the asset cache and freezes its model matrix. Any name that does
//! not resolve aborts the whole build; there is no partially placed level.
//!
//! Level units are one trile wide and everything is scaled by
//! [`GLOBAL_SCALE`] on the way to world space. Art objects and background
//! planes are authored half a unit off from triles, which
//! [`INSTANCE_OFFSET`] compensates for.

use cgmath::{Deg, Matrix4, Quaternion, Vector2, Vector3};

use crate::{
    data_structures::instance::Instance,
    error::{LevelError, Result},
    level::{
        cache::{PlaneSource, SceneAssets, TrileLookup},
        xml::{ArtObjectInstanceDesc, BackgroundPlaneDesc, LevelDocument},
    },
};

pub const GLOBAL_SCALE: f32 = 50.0;

/// Y rotation in degrees for trile orientations 0..=3.
pub const ORIENTATIONS: [f32; 4] = [180.0, 270.0, 0.0, 90.0];

pub const INSTANCE_OFFSET: Vector3<f32> = Vector3::new(-0.5, -0.5, -0.5);

/// Distance background planes are pushed along their facing to avoid
/// z-fighting with the triles behind them.
pub const PLANE_NUDGE: f32 = 0.005;

/// Plane world size is its frame size in pixels over this.
pub const PIXELS_PER_UNIT: f32 = 16.0;

/// World-space light direction before the view transform.
pub const LIGHT_DIRECTION: [f32; 4] = [1.0, 1.0, 1.0, 0.0];

pub fn orientation_degrees(orientation: u8) -> Result<f32> {
    ORIENTATIONS
        .get(orientation as usize)
        .copied()
        .ok_or(LevelError::InvalidOrientation(orientation as i64))
}

fn global_scale() -> Matrix4<f32> {
    Matrix4::from_scale(GLOBAL_SCALE)
}

pub fn trile_model_matrix(position: Vector3<f32>, orientation: u8) -> Result<Matrix4<f32>> {
    let degrees = orientation_degrees(orientation)?;
    Ok(global_scale() * Matrix4::from_translation(position) * Matrix4::from_angle_y(Deg(degrees)))
}

pub fn art_object_model_matrix(desc: &ArtObjectInstanceDesc) -> Matrix4<f32> {
    let instance = Instance {
        position: desc.position + INSTANCE_OFFSET,
        rotation: desc.rotation,
        scale: desc.scale,
    };
    global_scale() * instance.to_matrix()
}

/// Offset position of a plane, pushed along its rotated +Z.
pub fn background_plane_position(position: Vector3<f32>, rotation: Quaternion<f32>) -> Vector3<f32> {
    let facing = Instance {
        rotation,
        ..Default::default()
    }
    .local_z();
    position + INSTANCE_OFFSET + facing * PLANE_NUDGE
}

pub fn background_plane_model_matrix(desc: &BackgroundPlaneDesc, dimensions: (u32, u32)) -> Matrix4<f32> {
    let instance = Instance {
        position: background_plane_position(desc.position, desc.rotation),
        rotation: desc.rotation,
        scale: desc.scale,
    };
    let (width, height) = dimensions;
    global_scale()
        * instance.to_matrix()
        * Matrix4::from_nonuniform_scale(
            width as f32 / PIXELS_PER_UNIT,
            height as f32 / PIXELS_PER_UNIT,
            1.0,
        )
}

fn address_mode(repeat: bool) -> wgpu::AddressMode {
    if repeat {
        wgpu::AddressMode::Repeat
    } else {
        wgpu::AddressMode::ClampToEdge
    }
}

/// Animation start offset for the `index`th plane, spread over `duration`.
pub fn plane_phase(index: usize, duration: f32) -> f32 {
    const GOLDEN_RATIO_FRACT: f32 = 0.618_034;
    (index as f32 * GOLDEN_RATIO_FRACT).fract() * duration
}

#[derive(Debug)]
pub struct PlacedTrile<'a, G> {
    pub id: i32,
    pub geometry: &'a G,
    pub model_matrix: Matrix4<f32>,
}

#[derive(Debug)]
pub struct PlacedArtObject<'a, O> {
    pub name: String,
    pub data: &'a O,
    pub model_matrix: Matrix4<f32>,
}

#[derive(Debug)]
pub struct PlacedPlane<'a, P> {
    pub name: String,
    pub data: &'a P,
    pub model_matrix: Matrix4<f32>,
    /// Texture tiling factor, the instance's unrotated x/y scale.
    pub raw_scale: Vector2<f32>,
    pub double_sided: bool,
    pub address_mode_u: wgpu::AddressMode,
    pub address_mode_v: wgpu::AddressMode,
    pub phase: f32,
}

pub type TrileGeometry<A> = <<A as SceneAssets>::Trileset as TrileLookup>::Geometry;

/// A level with every instance resolved and placed.
pub struct LevelLayout<'a, A: SceneAssets> {
    pub trileset: &'a A::Trileset,
    pub sky: &'a A::Sky,
    pub triles: Vec<PlacedTrile<'a, TrileGeometry<A>>>,
    pub art_objects: Vec<PlacedArtObject<'a, A::ArtObject>>,
    pub background_planes: Vec<PlacedPlane<'a, A::Plane>>,
    pub base_diffuse: f32,
    pub base_ambient: f32,
}

impl<'a, A: SceneAssets> LevelLayout<'a, A> {
    pub fn build(document: &LevelDocument, assets: &'a A) -> Result<Self> {
        let trileset = assets.trileset(&document.trile_set_name)?;

        let mut triles = Vec::with_capacity(document.triles.len());
        for instance in &document.triles {
            // negative ids are empty slots
            if instance.id < 0 {
                continue;
            }
            let geometry = trileset.trile(instance.id).ok_or_else(|| LevelError::UnknownTrile {
                trileset: trileset.name().to_string(),
                id: instance.id,
            })?;
            triles.push(PlacedTrile {
                id: instance.id,
                geometry,
                model_matrix: trile_model_matrix(instance.position, instance.orientation)?,
            });
        }

        let sky = assets.sky(&document.sky_name)?;

        let art_objects = document
            .art_objects
            .iter()
            .map(|instance| {
                Ok(PlacedArtObject {
                    name: instance.name.to_lowercase(),
                    data: assets.art_object(&instance.name)?,
                    model_matrix: art_object_model_matrix(instance),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let background_planes = document
            .background_planes
            .iter()
            .enumerate()
            .map(|(index, plane)| {
                let data = assets.background_plane(&plane.texture_name)?;
                let duration = data.animation().map(|a| a.duration()).unwrap_or(0.0);
                Ok(PlacedPlane {
                    name: plane.texture_name.to_lowercase(),
                    data,
                    model_matrix: background_plane_model_matrix(plane, data.dimensions()),
                    raw_scale: Vector2::new(plane.scale.x, plane.scale.y),
                    double_sided: plane.double_sided,
                    address_mode_u: address_mode(plane.x_texture_repeat),
                    address_mode_v: address_mode(plane.y_texture_repeat),
                    phase: plane_phase(index, duration),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            trileset,
            sky,
            triles,
            art_objects,
            background_planes,
            base_diffuse: document.base_diffuse,
            base_ambient: document.base_ambient,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::HashMap;

    use cgmath::{InnerSpace, Rotation3, SquareMatrix, Vector4, Zero};

    use super::*;
    use crate::level::{
        animation::PlaneAnimation,
        cache::Catalog,
        xml::{TrileInstanceDesc, tests::VILLAGE},
    };

    pub(crate) struct FakeTrileset {
        name: String,
        triles: HashMap<i32, &'static str>,
    }

    impl TrileLookup for FakeTrileset {
        type Geometry = &'static str;

        fn name(&self) -> &str {
            &self.name
        }

        fn trile(&self, id: i32) -> Option<&&'static str> {
            self.triles.get(&id)
        }
    }

    pub(crate) struct FakePlane(u32, u32);

    impl PlaneSource for FakePlane {
        fn dimensions(&self) -> (u32, u32) {
            (self.0, self.1)
        }

        fn animation(&self) -> Option<&PlaneAnimation> {
            None
        }
    }

    pub(crate) struct FakeAssets {
        trilesets: Catalog<FakeTrileset>,
        art_objects: Catalog<&'static str>,
        planes: Catalog<FakePlane>,
        skies: Catalog<&'static str>,
    }

    impl FakeAssets {
        pub(crate) fn village() -> Self {
            let mut trilesets = Catalog::new(LevelError::UnknownTrileset);
            trilesets.insert(
                "village",
                FakeTrileset {
                    name: "village".to_string(),
                    triles: HashMap::from([(3, "grass"), (7, "stone")]),
                },
            );
            let mut art_objects = Catalog::new(LevelError::UnknownArtObject);
            art_objects.insert("treeao", "tree");
            let mut planes = Catalog::new(LevelError::UnknownBackgroundPlane);
            planes.insert("waterfall_a", FakePlane(32, 48));
            let mut skies = Catalog::new(LevelError::UnknownSky);
            skies.insert("blue", "blue sky");
            Self {
                trilesets,
                art_objects,
                planes,
                skies,
            }
        }
    }

    impl SceneAssets for FakeAssets {
        type Trileset = FakeTrileset;
        type ArtObject = &'static str;
        type Plane = FakePlane;
        type Sky = &'static str;

        fn trileset(&self, name: &str) -> Result<&FakeTrileset> {
            self.trilesets.resolve(name)
        }

        fn art_object(&self, name: &str) -> Result<&&'static str> {
            self.art_objects.resolve(name)
        }

        fn background_plane(&self, name: &str) -> Result<&FakePlane> {
            self.planes.resolve(name)
        }

        fn sky(&self, name: &str) -> Result<&&'static str> {
            self.skies.resolve(name)
        }
    }

    fn origin(matrix: &Matrix4<f32>) -> Vector3<f32> {
        (matrix * Vector4::new(0.0, 0.0, 0.0, 1.0)).truncate()
    }

    fn assert_close(a: Vector3<f32>, b: Vector3<f32>) {
        assert!((a - b).magnitude() < 1e-4, "{a:?} != {b:?}");
    }

    fn village_document() -> LevelDocument {
        LevelDocument::parse(VILLAGE).unwrap()
    }

    fn trile(id: i32) -> TrileInstanceDesc {
        TrileInstanceDesc {
            id,
            orientation: 0,
            position: Vector3::zero(),
        }
    }

    #[test]
    fn negative_trile_ids_are_skipped() {
        let mut document = village_document();
        document.triles = vec![trile(3), trile(-1), trile(7), trile(-5), trile(3)];
        let assets = FakeAssets::village();
        let layout = LevelLayout::build(&document, &assets).unwrap();
        assert_eq!(layout.triles.len(), 3);
        assert_eq!(
            layout.triles.iter().map(|t| *t.geometry).collect::<Vec<_>>(),
            vec!["grass", "stone", "grass"]
        );
    }

    #[test]
    fn orientations_rotate_about_y() {
        let expected = [
            Vector3::new(-1.0, 0.0, 0.0),
            Vector3::new(0.0, 0.0, 1.0),
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(0.0, 0.0, -1.0),
        ];
        for (orientation, expected) in expected.into_iter().enumerate() {
            let m = trile_model_matrix(Vector3::zero(), orientation as u8).unwrap();
            let x = (m * Vector4::unit_x()).truncate() / GLOBAL_SCALE;
            assert_close(x, expected);
        }
        assert!(orientation_degrees(4).is_err());
    }

    #[test]
    fn triles_are_scaled_into_world_space() {
        let m = trile_model_matrix(Vector3::new(1.0, 2.0, 3.0), 2).unwrap();
        assert_close(origin(&m), Vector3::new(50.0, 100.0, 150.0));
    }

    #[test]
    fn art_objects_are_offset_before_rotation_and_scale() {
        let desc = ArtObjectInstanceDesc {
            name: "treeao".to_string(),
            position: Vector3::zero(),
            rotation: Quaternion::from_angle_y(Deg(90.0)),
            scale: Vector3::new(3.0, 3.0, 3.0),
        };
        let m = art_object_model_matrix(&desc);
        assert_close(origin(&m), Vector3::new(-25.0, -25.0, -25.0));

        let identity = ArtObjectInstanceDesc {
            rotation: Quaternion::from_sv(1.0, Vector3::zero()),
            scale: Vector3::new(1.0, 1.0, 1.0),
            ..desc
        };
        assert_close(origin(&art_object_model_matrix(&identity)), Vector3::new(-25.0, -25.0, -25.0));
    }

    #[test]
    fn planes_are_nudged_along_their_facing() {
        let rotation = Quaternion::from_angle_y(Deg(90.0));
        let p = background_plane_position(Vector3::new(1.0, 1.0, 1.0), rotation);
        // +Z rotated 90 degrees about Y is +X
        assert_close(p, Vector3::new(0.5 + PLANE_NUDGE, 0.5, 0.5));

        let identity = Quaternion::from_sv(1.0, Vector3::zero());
        let nudge = background_plane_position(Vector3::zero(), identity) - INSTANCE_OFFSET;
        assert!((nudge.magnitude() - PLANE_NUDGE).abs() < 1e-7);
    }

    #[test]
    fn plane_at_origin_lands_at_offset_plus_nudge() {
        let desc = BackgroundPlaneDesc {
            texture_name: "waterfall_a".to_string(),
            position: Vector3::zero(),
            rotation: Quaternion::from_sv(1.0, Vector3::zero()),
            scale: Vector3::new(1.0, 1.0, 1.0),
            double_sided: false,
            x_texture_repeat: false,
            y_texture_repeat: false,
            clamp_texture: false,
        };
        let m = background_plane_model_matrix(&desc, (16, 16));
        assert_close(origin(&m), Vector3::new(-25.0, -25.0, -25.0 + 0.25));
    }

    #[test]
    fn plane_size_follows_texture_dimensions() {
        let assets = FakeAssets::village();
        let layout = LevelLayout::build(&village_document(), &assets).unwrap();
        let plane = &layout.background_planes[0];
        // 90 degrees about Y: local x maps to world -z
        let x = (plane.model_matrix * Vector4::unit_x()).truncate();
        let y = (plane.model_matrix * Vector4::unit_y()).truncate();
        assert!((x.magnitude() - 50.0 * 2.0 * 2.0).abs() < 1e-2);
        assert!((y.magnitude() - 50.0 * 3.0 * 3.0).abs() < 1e-2);
        assert_eq!(plane.raw_scale, Vector2::new(2.0, 3.0));
        assert!(plane.double_sided);
        assert_eq!(plane.address_mode_u, wgpu::AddressMode::ClampToEdge);
        assert_eq!(plane.address_mode_v, wgpu::AddressMode::Repeat);
    }

    #[test]
    fn builds_village() {
        let assets = FakeAssets::village();
        let layout = LevelLayout::build(&village_document(), &assets).unwrap();
        assert_eq!(layout.triles.len(), 2);
        assert_eq!(layout.art_objects.len(), 1);
        assert_eq!(layout.background_planes.len(), 1);
        assert_eq!(*layout.sky, "blue sky");
        assert_eq!(layout.base_ambient, 0.35);
    }

    #[test]
    fn unresolved_names_abort_the_build() {
        let assets = FakeAssets::village();

        let mut document = village_document();
        document.trile_set_name = "Cave".to_string();
        assert!(matches!(
            LevelLayout::build(&document, &assets),
            Err(LevelError::UnknownTrileset(_))
        ));

        let mut document = village_document();
        document.triles.push(trile(99));
        assert!(matches!(
            LevelLayout::build(&document, &assets),
            Err(LevelError::UnknownTrile { id: 99, .. })
        ));

        let mut document = village_document();
        document.sky_name = "Night".to_string();
        assert!(matches!(
            LevelLayout::build(&document, &assets),
            Err(LevelError::UnknownSky(_))
        ));

        let mut document = village_document();
        document.art_objects[0].name = "Bench".to_string();
        assert!(matches!(
            LevelLayout::build(&document, &assets),
            Err(LevelError::UnknownArtObject(_))
        ));

        let mut document = village_document();
        document.background_planes[0].texture_name = "Fog".to_string();
        assert!(matches!(
            LevelLayout::build(&document, &assets),
            Err(LevelError::UnknownBackgroundPlane(_))
        ));
    }

    #[test]
    fn plane_phases_stay_inside_the_loop() {
        for index in 0..32 {
            let phase = plane_phase(index, 2.0);
            assert!((0.0..2.0).contains(&phase));
        }
        assert_eq!(plane_phase(0, 2.0), 0.0);
        assert_ne!(plane_phase(1, 2.0), plane_phase(2, 2.0));
    }

    #[test]
    fn identity_rotation_keeps_axes() {
        let m = Matrix4::from(Quaternion::from_sv(1.0, Vector3::zero()));
        assert_eq!(m, Matrix4::identity());
    }
}
