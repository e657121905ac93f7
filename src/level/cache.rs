//! Pre-loaded level assets.
//!
//! The asset loader fills a [`ModelCache`] before any level is built. Each
//! kind of asset lives in its own [`Catalog`], keyed by lower-cased name, and
//! level construction only ever reads from it.
//!
//! Layout code is written against the [`SceneAssets`] trait rather than the
//! GPU-backed cache so that placement can be checked without a device.

use std::{collections::HashMap, sync::Arc};

use crate::{
    data_structures::{geometry::GeometryData, texture::Texture},
    error::{LevelError, Result},
    level::animation::PlaneAnimation,
};

/// Case-insensitive name → asset map.
#[derive(Debug)]
pub struct Catalog<T> {
    entries: HashMap<String, T>,
    missing: fn(String) -> LevelError,
}

impl<T> Catalog<T> {
    /// `missing` builds the error reported for an unknown name.
    pub fn new(missing: fn(String) -> LevelError) -> Self {
        Self {
            entries: HashMap::new(),
            missing,
        }
    }

    /// Returns the entry previously stored under the same name, if any.
    pub fn insert(&mut self, name: &str, value: T) -> Option<T> {
        self.entries.insert(name.to_lowercase(), value)
    }

    pub fn resolve(&self, name: &str) -> Result<&T> {
        let key = name.to_lowercase();
        match self.entries.get(&key) {
            Some(value) => Ok(value),
            None => Err((self.missing)(key)),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Something drawn with one diffuse texture and its sampler.
pub trait SurfaceSource {
    fn texture(&self) -> &Texture;
    fn sampler(&self) -> &wgpu::Sampler;
}

pub trait TrileLookup {
    type Geometry;

    fn name(&self) -> &str;
    fn trile(&self, id: i32) -> Option<&Self::Geometry>;
}

pub trait PlaneSource {
    /// Pixel size of one displayed frame.
    fn dimensions(&self) -> (u32, u32);
    fn animation(&self) -> Option<&PlaneAnimation>;
}

/// Read access to every asset a level can reference.
pub trait SceneAssets {
    type Trileset: TrileLookup;
    type ArtObject;
    type Plane: PlaneSource;
    type Sky;

    fn trileset(&self, name: &str) -> Result<&Self::Trileset>;
    fn art_object(&self, name: &str) -> Result<&Self::ArtObject>;
    fn background_plane(&self, name: &str) -> Result<&Self::Plane>;
    fn sky(&self, name: &str) -> Result<&Self::Sky>;
}

#[derive(Debug)]
pub struct TrilesetData {
    pub name: String,
    pub texture: Texture,
    pub sampler: wgpu::Sampler,
    pub triles: HashMap<i32, Arc<GeometryData>>,
}

impl SurfaceSource for TrilesetData {
    fn texture(&self) -> &Texture {
        &self.texture
    }

    fn sampler(&self) -> &wgpu::Sampler {
        &self.sampler
    }
}

impl TrileLookup for TrilesetData {
    type Geometry = Arc<GeometryData>;

    fn name(&self) -> &str {
        &self.name
    }

    fn trile(&self, id: i32) -> Option<&Arc<GeometryData>> {
        self.triles.get(&id)
    }
}

#[derive(Debug)]
pub struct ArtObjectData {
    pub name: String,
    pub texture: Texture,
    pub sampler: wgpu::Sampler,
    pub geometry: Arc<GeometryData>,
}

impl SurfaceSource for ArtObjectData {
    fn texture(&self) -> &Texture {
        &self.texture
    }

    fn sampler(&self) -> &wgpu::Sampler {
        &self.sampler
    }
}

#[derive(Debug)]
pub struct BackgroundPlaneData {
    pub name: String,
    pub texture: Texture,
    pub animation: Option<PlaneAnimation>,
}

impl BackgroundPlaneData {
    pub fn new(name: &str, texture: Texture, animation: Option<PlaneAnimation>) -> Self {
        Self {
            name: name.to_lowercase(),
            texture,
            animation,
        }
    }
}

impl PlaneSource for BackgroundPlaneData {
    fn dimensions(&self) -> (u32, u32) {
        match &self.animation {
            Some(animation) => animation.frame_dimensions(),
            None => (self.texture.width, self.texture.height),
        }
    }

    fn animation(&self) -> Option<&PlaneAnimation> {
        self.animation.as_ref()
    }
}

#[derive(Debug)]
pub struct SkyData {
    pub name: String,
    pub background: Texture,
    /// Cloud shadow maps projected onto the level; the first one is used.
    pub shadows: Vec<Texture>,
}

#[derive(Debug)]
pub struct ModelCache {
    pub trilesets: Catalog<TrilesetData>,
    pub art_objects: Catalog<ArtObjectData>,
    pub background_planes: Catalog<BackgroundPlaneData>,
    pub skies: Catalog<SkyData>,
}

impl Default for ModelCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelCache {
    pub fn new() -> Self {
        Self {
            trilesets: Catalog::new(LevelError::UnknownTrileset),
            art_objects: Catalog::new(LevelError::UnknownArtObject),
            background_planes: Catalog::new(LevelError::UnknownBackgroundPlane),
            skies: Catalog::new(LevelError::UnknownSky),
        }
    }

    pub fn add_trileset(&mut self, data: TrilesetData) {
        let name = data.name.clone();
        if self.trilesets.insert(&name, data).is_some() {
            log::warn!("Trile set {name} loaded twice, keeping the latest");
        }
    }

    pub fn add_art_object(&mut self, data: ArtObjectData) {
        let name = data.name.clone();
        if self.art_objects.insert(&name, data).is_some() {
            log::warn!("Art object {name} loaded twice, keeping the latest");
        }
    }

    pub fn add_background_plane(&mut self, data: BackgroundPlaneData) {
        let name = data.name.clone();
        if self.background_planes.insert(&name, data).is_some() {
            log::warn!("Background plane {name} loaded twice, keeping the latest");
        }
    }

    pub fn add_sky(&mut self, data: SkyData) {
        let name = data.name.clone();
        if self.skies.insert(&name, data).is_some() {
            log::warn!("Sky {name} loaded twice, keeping the latest");
        }
    }
}

impl SceneAssets for ModelCache {
    type Trileset = TrilesetData;
    type ArtObject = ArtObjectData;
    type Plane = BackgroundPlaneData;
    type Sky = SkyData;

    fn trileset(&self, name: &str) -> Result<&TrilesetData> {
        self.trilesets.resolve(name)
    }

    fn art_object(&self, name: &str) -> Result<&ArtObjectData> {
        self.art_objects.resolve(name)
    }

    fn background_plane(&self, name: &str) -> Result<&BackgroundPlaneData> {
        self.background_planes.resolve(name)
    }

    fn sky(&self, name: &str) -> Result<&SkyData> {
        self.skies.resolve(name)
    }
}
