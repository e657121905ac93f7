//! Frame animation for background planes.
//!
//! An animated plane texture is an atlas; each frame shows one rectangle of
//! it for a fixed time. The renderer feeds the current rectangle to the
//! shader as a texture scale/bias applied after tiling.
//!
//! Animations come from a descriptor stored next to the atlas:
//!
//! ```xml
//! <AnimatedTexture actualWidth="16" actualHeight="32">
//!   <Frames>
//!     <Frame duration="0.1"><Rectangle x="0" y="0" w="16" h="32" /></Frame>
//!     <Frame duration="0.1"><Rectangle x="16" y="0" w="16" h="32" /></Frame>
//!   </Frames>
//! </AnimatedTexture>
//! ```
//!
//! Durations are seconds, rectangles are atlas pixels.

use roxmltree::Document;

use crate::{
    error::{LevelError, Result},
    level::xml::{first_descendant, number_attribute, select_descendants},
};

/// Texture-space rectangle, all components in 0..1.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TexRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl TexRect {
    pub const FULL: TexRect = TexRect {
        x: 0.0,
        y: 0.0,
        width: 1.0,
        height: 1.0,
    };

    /// Pixel rectangle of a `texture_width` x `texture_height` atlas.
    pub fn from_pixels(x: u32, y: u32, width: u32, height: u32, texture_width: u32, texture_height: u32) -> Self {
        let tw = texture_width.max(1) as f32;
        let th = texture_height.max(1) as f32;
        Self {
            x: x as f32 / tw,
            y: y as f32 / th,
            width: width as f32 / tw,
            height: height as f32 / th,
        }
    }

    pub fn scale_bias(&self) -> [f32; 4] {
        [self.width, self.height, self.x, self.y]
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnimationFrame {
    /// Seconds.
    pub duration: f32,
    pub rect: TexRect,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PlaneAnimation {
    frame_width: u32,
    frame_height: u32,
    frames: Vec<AnimationFrame>,
    duration: f32,
}

impl PlaneAnimation {
    /// `frame_width`/`frame_height` are the pixel size of one frame, which
    /// is what the plane's world size is derived from.
    pub fn new(frame_width: u32, frame_height: u32, frames: Vec<AnimationFrame>) -> Self {
        let duration = frames.iter().map(|f| f.duration).sum();
        Self {
            frame_width,
            frame_height,
            frames,
            duration,
        }
    }

    pub fn frame_dimensions(&self) -> (u32, u32) {
        (self.frame_width, self.frame_height)
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }

    pub fn frames(&self) -> &[AnimationFrame] {
        &self.frames
    }

    /// The frame on screen at `time` seconds; the animation loops.
    pub fn frame_at(&self, time: f32) -> Option<&AnimationFrame> {
        if self.duration <= 0.0 {
            return self.frames.first();
        }
        let t = time.rem_euclid(self.duration);
        let mut end = 0.0;
        for frame in &self.frames {
            end += frame.duration;
            if t < end {
                return Some(frame);
            }
        }
        // float accumulation can leave t a hair past the last end
        self.frames.last()
    }
}

impl PlaneAnimation {
    /// Parse an animated texture descriptor for a `texture_width` x
    /// `texture_height` atlas. A descriptor without frames is an error.
    pub fn from_xml(text: &str, texture_width: u32, texture_height: u32) -> Result<Self> {
        let document = Document::parse(text)?;
        let root = first_descendant(document.root(), &["AnimatedTexture"]).ok_or_else(|| {
            LevelError::MissingElement {
                parent: "document".to_string(),
                path: "AnimatedTexture".to_string(),
            }
        })?;

        let frames = select_descendants(root, &["Frame"])
            .into_iter()
            .map(|frame| {
                let rect = first_descendant(frame, &["Rectangle"]).ok_or_else(|| {
                    LevelError::MissingElement {
                        parent: "Frame".to_string(),
                        path: "Rectangle".to_string(),
                    }
                })?;
                Ok(AnimationFrame {
                    duration: number_attribute(frame, "duration")?,
                    rect: TexRect::from_pixels(
                        number_attribute(rect, "x")?,
                        number_attribute(rect, "y")?,
                        number_attribute(rect, "w")?,
                        number_attribute(rect, "h")?,
                        texture_width,
                        texture_height,
                    ),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        if frames.is_empty() {
            return Err(LevelError::MissingElement {
                parent: "AnimatedTexture".to_string(),
                path: "Frames Frame".to_string(),
            });
        }

        Ok(Self::new(
            number_attribute(root, "actualWidth")?,
            number_attribute(root, "actualHeight")?,
            frames,
        ))
    }
}

/// Scale/bias of the texture rectangle to show at `time`. Static planes
/// show the whole texture.
pub fn calc_tex_scale_bias(animation: Option<&PlaneAnimation>, time: f32) -> [f32; 4] {
    animation
        .and_then(|a| a.frame_at(time))
        .map(|f| f.rect.scale_bias())
        .unwrap_or(TexRect::FULL.scale_bias())
}
