//! Level document parsing.
//!
//! A level XML file is turned into a [`LevelDocument`]: plain owned
//! descriptors with every attribute already validated. Nothing here touches
//! the asset cache or the GPU, so a document that parses can still fail to
//! resolve later in [`crate::level::layout`].
//!
//! Elements are located the way a CSS descendant selector would: the path
//! `["ArtObjects", "Entry", "ArtObjectInstance"]` matches every
//! `ArtObjectInstance` that has an `Entry` ancestor below an `ArtObjects`
//! ancestor, in document order.

use cgmath::{Quaternion, Vector3};
use roxmltree::{Document, Node};

use crate::error::{LevelError, Result};

#[derive(Clone, Debug, PartialEq)]
pub struct TrileInstanceDesc {
    /// Negative ids are placeholders without geometry.
    pub id: i32,
    /// Index into the orientation table, always 0..=3.
    pub orientation: u8,
    pub position: Vector3<f32>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ArtObjectInstanceDesc {
    pub name: String,
    pub position: Vector3<f32>,
    pub rotation: Quaternion<f32>,
    pub scale: Vector3<f32>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BackgroundPlaneDesc {
    pub texture_name: String,
    pub position: Vector3<f32>,
    pub rotation: Quaternion<f32>,
    pub scale: Vector3<f32>,
    pub double_sided: bool,
    pub x_texture_repeat: bool,
    pub y_texture_repeat: bool,
    pub clamp_texture: bool,
}

/// Everything the scene assembler reads from one level file.
#[derive(Clone, Debug, PartialEq)]
pub struct LevelDocument {
    pub trile_set_name: String,
    pub sky_name: String,
    pub base_diffuse: f32,
    pub base_ambient: f32,
    pub triles: Vec<TrileInstanceDesc>,
    pub art_objects: Vec<ArtObjectInstanceDesc>,
    pub background_planes: Vec<BackgroundPlaneDesc>,
}

impl LevelDocument {
    pub fn parse(text: &str) -> Result<Self> {
        let document = Document::parse(text)?;
        let root = document.root();
        let level = first_descendant(root, &["Level"]).ok_or_else(|| LevelError::MissingElement {
            parent: "document".to_string(),
            path: "Level".to_string(),
        })?;

        let triles = select_descendants(root, &["TrileInstance"])
            .into_iter()
            .map(parse_trile_instance)
            .collect::<Result<Vec<_>>>()?;
        let art_objects = select_descendants(root, &["ArtObjects", "Entry", "ArtObjectInstance"])
            .into_iter()
            .map(parse_art_object_instance)
            .collect::<Result<Vec<_>>>()?;
        let background_planes =
            select_descendants(root, &["BackgroundPlanes", "Entry", "BackgroundPlane"])
                .into_iter()
                .map(parse_background_plane)
                .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            trile_set_name: required_attribute(level, "trileSetName")?.to_string(),
            sky_name: required_attribute(level, "skyName")?.to_string(),
            base_diffuse: number_attribute(level, "baseDiffuse")?,
            base_ambient: number_attribute(level, "baseAmbient")?,
            triles,
            art_objects,
            background_planes,
        })
    }
}

/// Boolean attributes hold exactly `True` or `False`.
pub fn parse_boolean(value: &str) -> Result<bool> {
    match value {
        "True" => Ok(true),
        "False" => Ok(false),
        _ => Err(LevelError::InvalidBoolean {
            value: value.to_string(),
        }),
    }
}

/// `<Vector3 x=".." y=".." z=".."/>`
pub fn parse_vector3(node: Node) -> Result<Vector3<f32>> {
    expect_tag(node, "Vector3")?;
    Ok(Vector3::new(
        number_attribute(node, "x")?,
        number_attribute(node, "y")?,
        number_attribute(node, "z")?,
    ))
}

/// `<Quaternion x=".." y=".." z=".." w=".."/>`
pub fn parse_quaternion(node: Node) -> Result<Quaternion<f32>> {
    expect_tag(node, "Quaternion")?;
    Ok(Quaternion::new(
        number_attribute(node, "w")?,
        number_attribute(node, "x")?,
        number_attribute(node, "y")?,
        number_attribute(node, "z")?,
    ))
}

/// Placeholders (negative ids) keep only their id; orientation and position
/// are not read for them.
fn parse_trile_instance(node: Node) -> Result<TrileInstanceDesc> {
    let id: i32 = number_attribute(node, "trileId")?;
    if id < 0 {
        return Ok(TrileInstanceDesc {
            id,
            orientation: 0,
            position: Vector3::new(0.0, 0.0, 0.0),
        });
    }

    let orientation: i64 = number_attribute(node, "orientation")?;
    let orientation = u8::try_from(orientation)
        .ok()
        .filter(|o| *o < 4)
        .ok_or(LevelError::InvalidOrientation(orientation))?;
    Ok(TrileInstanceDesc {
        id,
        orientation,
        position: parse_vector3(required_descendant(node, &["Position", "Vector3"])?)?,
    })
}

fn parse_art_object_instance(node: Node) -> Result<ArtObjectInstanceDesc> {
    Ok(ArtObjectInstanceDesc {
        name: required_attribute(node, "name")?.to_string(),
        position: parse_vector3(required_descendant(node, &["Position", "Vector3"])?)?,
        rotation: parse_quaternion(required_descendant(node, &["Rotation", "Quaternion"])?)?,
        scale: parse_vector3(required_descendant(node, &["Scale", "Vector3"])?)?,
    })
}

fn parse_background_plane(node: Node) -> Result<BackgroundPlaneDesc> {
    Ok(BackgroundPlaneDesc {
        texture_name: required_attribute(node, "textureName")?.to_string(),
        position: parse_vector3(required_descendant(node, &["Position", "Vector3"])?)?,
        rotation: parse_quaternion(required_descendant(node, &["Rotation", "Quaternion"])?)?,
        scale: parse_vector3(required_descendant(node, &["Scale", "Vector3"])?)?,
        double_sided: parse_boolean(required_attribute(node, "doubleSided")?)?,
        x_texture_repeat: parse_boolean(required_attribute(node, "xTextureRepeat")?)?,
        y_texture_repeat: parse_boolean(required_attribute(node, "yTextureRepeat")?)?,
        clamp_texture: parse_boolean(required_attribute(node, "clampTexture")?)?,
    })
}

/// All elements matching the descendant path below `node`, in document order.
pub fn select_descendants<'a, 'input>(
    node: Node<'a, 'input>,
    path: &[&str],
) -> Vec<Node<'a, 'input>> {
    let Some((name, rest)) = path.split_first() else {
        return Vec::new();
    };
    let mut found: Vec<Node> = node
        .descendants()
        .skip(1)
        .filter(|n| n.has_tag_name(*name))
        .flat_map(|n| {
            if rest.is_empty() {
                vec![n]
            } else {
                select_descendants(n, rest)
            }
        })
        .collect();
    // nested matches of an intermediate step select the same nodes twice
    found.sort_by_key(|n| n.id().get());
    found.dedup_by_key(|n| n.id());
    found
}

pub fn first_descendant<'a, 'input>(
    node: Node<'a, 'input>,
    path: &[&str],
) -> Option<Node<'a, 'input>> {
    select_descendants(node, path).into_iter().next()
}

fn required_descendant<'a, 'input>(
    node: Node<'a, 'input>,
    path: &[&str],
) -> Result<Node<'a, 'input>> {
    first_descendant(node, path).ok_or_else(|| LevelError::MissingElement {
        parent: node.tag_name().name().to_string(),
        path: path.join(" "),
    })
}

pub(crate) fn required_attribute<'a>(node: Node<'a, '_>, attribute: &str) -> Result<&'a str> {
    node.attribute(attribute)
        .ok_or_else(|| LevelError::MissingAttribute {
            element: node.tag_name().name().to_string(),
            attribute: attribute.to_string(),
        })
}

pub(crate) fn number_attribute<T: std::str::FromStr>(node: Node, attribute: &str) -> Result<T> {
    let value = required_attribute(node, attribute)?;
    value.trim().parse().map_err(|_| LevelError::InvalidNumber {
        attribute: attribute.to_string(),
        value: value.to_string(),
    })
}

fn expect_tag(node: Node, tag: &str) -> Result<()> {
    if node.has_tag_name(tag) {
        Ok(())
    } else {
        Err(LevelError::MissingElement {
            parent: node
                .parent_element()
                .map(|p| p.tag_name().name().to_string())
                .unwrap_or_default(),
            path: tag.to_string(),
        })
    }
}
