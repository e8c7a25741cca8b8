//! The experiments.
//!
//! A scene owns its ECS world and its GPU resources. The app calls
//! [`Scene::update`] once per frame with the frame's time and input, then
//! [`Scene::render`] to record compute and draw passes into the frame's
//! encoder.
//!
//! | Kind | Name | What it shows |
//! |------|------|---------------|
//! | [`SceneKind::Plasma`] | `plasma` | spawner streams bent by masses |
//! | [`SceneKind::PlasmaField`] | `plasma-field` | two counter-flowing columns |
//! | [`SceneKind::MouseExplosions`] | `mouse-explosions` | bursts at the pointer |
//! | [`SceneKind::JellyfishRockets`] | `jellyfish-rockets` | CPU ECS cells leaving trails |

mod editing;
mod gravity;
mod jellyfish;
mod mouse_explosions;
mod plasma;
mod plasma_field;

use std::fmt;
use std::str::FromStr;

use glam::Vec2;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

pub use editing::{apply_edit, editable_entities, edits_from_input, Edit};
pub use jellyfish::JellyfishScene;
pub use mouse_explosions::MouseExplosionsScene;
pub use plasma::PlasmaScene;
pub use plasma_field::PlasmaFieldScene;

use crate::config::LabConfig;
use crate::gpu::{FrameContext, ViewBinding};
use crate::input::{Input, KeyCode};
use crate::time::Time;
use crate::{ConfigError, InstanceBufferError};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SceneKind {
    #[default]
    Plasma,
    PlasmaField,
    MouseExplosions,
    JellyfishRockets,
}

impl SceneKind {
    pub const ALL: [SceneKind; 4] = [
        SceneKind::Plasma,
        SceneKind::PlasmaField,
        SceneKind::MouseExplosions,
        SceneKind::JellyfishRockets,
    ];

    /// Name used on the command line and in config files.
    pub fn name(self) -> &'static str {
        match self {
            SceneKind::Plasma => "plasma",
            SceneKind::PlasmaField => "plasma-field",
            SceneKind::MouseExplosions => "mouse-explosions",
            SceneKind::JellyfishRockets => "jellyfish-rockets",
        }
    }

    /// Human readable title.
    pub fn label(self) -> &'static str {
        match self {
            SceneKind::Plasma => "Plasma",
            SceneKind::PlasmaField => "Plasma Field",
            SceneKind::MouseExplosions => "Mouse Explosions",
            SceneKind::JellyfishRockets => "Jellyfish Rockets",
        }
    }

    /// Scene bound to a number key.
    pub fn from_key(key: KeyCode) -> Option<Self> {
        match key {
            KeyCode::Key1 => Some(SceneKind::Plasma),
            KeyCode::Key2 => Some(SceneKind::PlasmaField),
            KeyCode::Key3 => Some(SceneKind::MouseExplosions),
            KeyCode::Key4 => Some(SceneKind::JellyfishRockets),
            _ => None,
        }
    }
}

impl fmt::Display for SceneKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SceneKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SceneKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| ConfigError::UnknownScene(s.to_string()))
    }
}

/// Per-frame input handed to [`Scene::update`].
pub struct UpdateContext<'a> {
    pub time: &'a Time,
    pub input: &'a Input,
    /// World to clip scale of the current window.
    pub view_scale: Vec2,
    /// The pointer is over a control panel and should not act on the scene.
    pub pointer_captured: bool,
}

impl UpdateContext<'_> {
    /// Pointer in world coordinates.
    pub fn pointer(&self) -> Vec2 {
        self.input.world_position(self.view_scale)
    }

    /// Pointer is over the scene itself.
    pub fn pointer_active(&self) -> bool {
        self.input.mouse_inside() && !self.pointer_captured
    }
}

/// GPU handles needed to build a scene.
pub struct SceneGpu<'a> {
    pub device: &'a wgpu::Device,
    pub format: wgpu::TextureFormat,
    pub view: &'a ViewBinding,
}

pub trait Scene {
    fn kind(&self) -> SceneKind;

    fn name(&self) -> &'static str {
        self.kind().label()
    }

    fn update(&mut self, ctx: &UpdateContext);

    /// Record this frame's compute and draw passes.
    ///
    /// A capacity error leaves the encoder in a usable state; the caller
    /// decides whether to submit it.
    fn render(&mut self, frame: &mut FrameContext) -> Result<(), InstanceBufferError>;

    /// Restart the simulation. GPU buffers are refilled on the next render.
    fn reset(&mut self);

    /// Scene specific controls.
    #[cfg(feature = "egui")]
    fn ui(&mut self, _ui: &mut egui::Ui) {}
}

/// Build the scene for `kind`.
pub fn create_scene(kind: SceneKind, config: &LabConfig, gpu: &SceneGpu) -> Box<dyn Scene> {
    log::info!("starting scene {}", kind);
    match kind {
        SceneKind::Plasma => Box::new(PlasmaScene::new(config, gpu)),
        SceneKind::PlasmaField => Box::new(PlasmaFieldScene::new(config, gpu)),
        SceneKind::MouseExplosions => Box::new(MouseExplosionsScene::new(config, gpu)),
        SceneKind::JellyfishRockets => Box::new(JellyfishScene::new(config, gpu)),
    }
}

/// Scene RNG, reproducible when the config carries a seed.
pub(crate) fn scene_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn test_names_round_trip() {
        for kind in SceneKind::ALL {
            assert_eq!(kind.name().parse::<SceneKind>().unwrap(), kind);
            assert_eq!(kind.to_string(), kind.name());
        }
    }

    #[test]
    fn test_unknown_name() {
        let err = "fireworks".parse::<SceneKind>().unwrap_err();
        assert!(matches!(err, ConfigError::UnknownScene(name) if name == "fireworks"));
    }

    #[test]
    fn test_serde_uses_cli_names() {
        let json = serde_json::to_string(&SceneKind::MouseExplosions).unwrap();
        assert_eq!(json, "\"mouse-explosions\"");
    }

    #[test]
    fn test_number_keys() {
        assert_eq!(SceneKind::from_key(KeyCode::Key3), Some(SceneKind::MouseExplosions));
        assert_eq!(SceneKind::from_key(KeyCode::M), None);
    }

    #[test]
    fn test_seeded_rng_repeats() {
        let a: u32 = scene_rng(Some(3)).gen();
        let b: u32 = scene_rng(Some(3)).gen();
        assert_eq!(a, b);
    }
}
