//! Asset file loading.
//!
//! Paths are relative to the asset root: the configured directory on native
//! targets, `<origin>/assets/` on the web. Level documents, background plane
//! textures and sky textures are read from plain files here; trile sets and
//! art objects come from the game's packed containers and are inserted into
//! the [`ModelCache`] by the caller.

use std::path::Path;

use anyhow::Context as _;

use crate::{
    data_structures::texture::Texture,
    level::{
        animation::PlaneAnimation,
        cache::{BackgroundPlaneData, ModelCache, SkyData},
        xml::LevelDocument,
    },
};

#[cfg(target_arch = "wasm32")]
fn format_url(file_name: &str) -> anyhow::Result<reqwest::Url> {
    let window = web_sys::window().ok_or_else(|| anyhow::anyhow!("no window"))?;
    let origin = window
        .location()
        .origin()
        .map_err(|_| anyhow::anyhow!("no origin"))?;
    let base = reqwest::Url::parse(&format!("{origin}/assets/"))?;
    Ok(base.join(file_name)?)
}

#[cfg_attr(target_arch = "wasm32", allow(unused_variables))]
pub async fn load_string(root: &Path, file_name: &str) -> anyhow::Result<String> {
    #[cfg(target_arch = "wasm32")]
    let txt = {
        let url = format_url(file_name)?;
        reqwest::get(url).await?.text().await?
    };
    #[cfg(not(target_arch = "wasm32"))]
    let txt = {
        let path = root.join(file_name);
        tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("reading {}", path.display()))?
    };

    Ok(txt)
}

#[cfg_attr(target_arch = "wasm32", allow(unused_variables))]
pub async fn load_binary(root: &Path, file_name: &str) -> anyhow::Result<Vec<u8>> {
    #[cfg(target_arch = "wasm32")]
    let data = {
        let url = format_url(file_name)?;
        reqwest::get(url).await?.bytes().await?.to_vec()
    };
    #[cfg(not(target_arch = "wasm32"))]
    let data = {
        let path = root.join(file_name);
        tokio::fs::read(&path)
            .await
            .with_context(|| format!("reading {}", path.display()))?
    };

    Ok(data)
}

pub async fn load_texture(
    root: &Path,
    file_name: &str,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
) -> anyhow::Result<Texture> {
    let data = load_binary(root, file_name).await?;
    Texture::from_bytes(device, queue, &data, file_name, None)
}

pub fn level_path(name: &str) -> String {
    format!("xml/{}.xml", name.to_lowercase())
}

pub fn background_plane_path(name: &str) -> String {
    format!("background planes/{}.png", name.to_lowercase())
}

/// Frame descriptor of an animated plane; static planes have none.
pub fn background_plane_animation_path(name: &str) -> String {
    format!("background planes/{}.xml", name.to_lowercase())
}

pub fn sky_path(name: &str) -> String {
    format!("skies/{}.png", name.to_lowercase())
}

pub fn sky_shadows_path(name: &str) -> String {
    format!("skies/{}_shadows.png", name.to_lowercase())
}

pub async fn load_level_document(root: &Path, name: &str) -> anyhow::Result<LevelDocument> {
    let text = load_string(root, &level_path(name)).await?;
    let document = LevelDocument::parse(&text).with_context(|| format!("parsing level {name}"))?;
    log::info!(
        "Parsed level {}: {} triles, {} art objects, {} background planes",
        name,
        document.triles.len(),
        document.art_objects.len(),
        document.background_planes.len()
    );
    Ok(document)
}

/// The animation of plane `name` over a `width` x `height` atlas, or `None`
/// when the plane has no frame descriptor.
pub async fn load_plane_animation(
    root: &Path,
    name: &str,
    width: u32,
    height: u32,
) -> anyhow::Result<Option<PlaneAnimation>> {
    let text = match load_string(root, &background_plane_animation_path(name)).await {
        Ok(text) => text,
        Err(e) => {
            log::debug!("Background plane {name} is static: {e:#}");
            return Ok(None);
        }
    };
    let animation = PlaneAnimation::from_xml(&text, width, height)
        .with_context(|| format!("parsing animation of background plane {name}"))?;
    log::info!(
        "Background plane {} is animated: {} frames over {:.2}s",
        name,
        animation.frames().len(),
        animation.duration()
    );
    Ok(Some(animation))
}

/// A background plane texture plus its animation, if it has one.
pub async fn load_background_plane(
    root: &Path,
    name: &str,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
) -> anyhow::Result<BackgroundPlaneData> {
    let texture = load_texture(root, &background_plane_path(name), device, queue).await?;
    let animation = load_plane_animation(root, name, texture.width, texture.height).await?;
    Ok(BackgroundPlaneData::new(name, texture, animation))
}

/// A sky and its shadow map; a missing shadow map leaves the list empty.
pub async fn load_sky(
    root: &Path,
    name: &str,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
) -> anyhow::Result<SkyData> {
    let background = load_texture(root, &sky_path(name), device, queue).await?;
    let shadows = match load_texture(root, &sky_shadows_path(name), device, queue).await {
        Ok(shadow) => vec![shadow],
        Err(e) => {
            log::warn!("No shadows for sky {name}: {e:#}");
            Vec::new()
        }
    };
    Ok(SkyData {
        name: name.to_lowercase(),
        background,
        shadows,
    })
}

/// Load the sky and every background plane `document` references that the
/// cache does not hold yet.
pub async fn load_level_assets(
    root: &Path,
    document: &LevelDocument,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    cache: &mut ModelCache,
) -> anyhow::Result<()> {
    let mut plane_names: Vec<String> = document
        .background_planes
        .iter()
        .map(|plane| plane.texture_name.to_lowercase())
        .filter(|name| cache.background_planes.resolve(name).is_err())
        .collect();
    plane_names.sort();
    plane_names.dedup();

    let planes = futures::future::join_all(
        plane_names
            .iter()
            .map(|name| load_background_plane(root, name, device, queue)),
    )
    .await;
    for plane in planes {
        cache.add_background_plane(plane?);
    }

    if cache.skies.resolve(&document.sky_name).is_err() {
        cache.add_sky(load_sky(root, &document.sky_name, device, queue).await?);
    }
    if cache.trilesets.is_empty() {
        log::warn!(
            "No trile sets cached; level needs {}",
            document.trile_set_name
        );
    }
    log::info!(
        "Asset cache: {} trile sets, {} art objects, {} background planes, {} skies",
        cache.trilesets.len(),
        cache.art_objects.len(),
        cache.background_planes.len(),
        cache.skies.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn asset_paths_are_lower_case() {
        assert_eq!(level_path("VILLAGE"), "xml/village.xml");
        assert_eq!(
            background_plane_path("Waterfall_A"),
            "background planes/waterfall_a.png"
        );
        assert_eq!(
            background_plane_animation_path("Waterfall_A"),
            "background planes/waterfall_a.xml"
        );
        assert_eq!(sky_path("Blue"), "skies/blue.png");
        assert_eq!(sky_shadows_path("Blue"), "skies/blue_shadows.png");
    }

    #[tokio::test]
    async fn missing_files_name_the_path() {
        let err = load_string(Path::new("/nonexistent"), "xml/none.xml")
            .await
            .unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/xml/none.xml"));
    }

    #[tokio::test]
    async fn planes_without_descriptor_are_static() {
        let animation = load_plane_animation(Path::new("/nonexistent"), "Rocks", 64, 64)
            .await
            .unwrap();
        assert!(animation.is_none());
    }

    #[tokio::test]
    async fn plane_descriptor_is_loaded_next_to_the_atlas() {
        let root = std::env::temp_dir().join(format!("scene-viewer-anim-{}", std::process::id()));
        tokio::fs::create_dir_all(root.join("background planes")).await.unwrap();
        tokio::fs::write(
            root.join(background_plane_animation_path("Waterfall_A")),
            r#"<AnimatedTexture actualWidth="16" actualHeight="16">
  <Frames>
    <Frame duration="0.5"><Rectangle x="0" y="0" w="16" h="16" /></Frame>
    <Frame duration="0.5"><Rectangle x="16" y="0" w="16" h="16" /></Frame>
  </Frames>
</AnimatedTexture>"#,
        )
        .await
        .unwrap();

        let animation = load_plane_animation(&root, "Waterfall_A", 32, 16).await.unwrap().unwrap();
        assert_eq!(animation.frame_dimensions(), (16, 16));
        assert_eq!(animation.frames().len(), 2);

        tokio::fs::write(root.join(background_plane_animation_path("Broken")), "<AnimatedTexture")
            .await
            .unwrap();
        assert!(load_plane_animation(&root, "Broken", 32, 16).await.is_err());

        tokio::fs::remove_dir_all(&root).await.unwrap();
    }
}
