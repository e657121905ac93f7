//! Viewer configuration.
//!
//! Everything here has a sensible default; the only environment override is
//! the asset root, read from `SCENE_VIEWER_ASSETS`.

use std::path::PathBuf;

pub const ASSET_ROOT_ENV: &str = "SCENE_VIEWER_ASSETS";

#[derive(Clone, Debug)]
pub struct ViewerConfig {
    pub title: String,
    pub clear_colour: wgpu::Color,
    /// right/left, height, forward/backward
    pub camera_position: [f32; 3],
    pub camera_yaw: cgmath::Deg<f32>,
    pub camera_pitch: cgmath::Deg<f32>,
    pub fovy: cgmath::Deg<f32>,
    pub znear: f32,
    pub zfar: f32,
    pub camera_speed: f32,
    pub camera_sensitivity: f32,
    /// Directory every asset path is resolved against on native targets.
    pub asset_root: PathBuf,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            title: "scene-viewer".to_string(),
            clear_colour: wgpu::Color {
                r: 0.1,
                g: 0.1,
                b: 0.12,
                a: 1.0,
            },
            camera_position: [0.0, 600.0, 1200.0],
            camera_yaw: cgmath::Deg(-90.0),
            camera_pitch: cgmath::Deg(-20.0),
            fovy: cgmath::Deg(45.0),
            znear: 1.0,
            zfar: 40000.0,
            camera_speed: 800.0,
            camera_sensitivity: 0.4,
            asset_root: PathBuf::from("./assets"),
        }
    }
}

impl ViewerConfig {
    /// Defaults with the asset root taken from `SCENE_VIEWER_ASSETS` when set.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(root) = std::env::var_os(ASSET_ROOT_ENV) {
            log::info!("Using asset root {:?} from {}", root, ASSET_ROOT_ENV);
            config.asset_root = PathBuf::from(root);
        }
        config
    }
}

