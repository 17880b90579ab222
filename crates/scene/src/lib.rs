//! Scene Adapter: engine-agnostic scene construction interface.
//!
//! # Invariants
//! - The scene host owns every object once it is created; callers hold only
//!   [`EntityId`](starroom_common::EntityId) handles.
//! - Construction is declarative: callers describe nodes and materials, the
//!   host decides how to realize them.
//!
//! [`RetainedScene`] is an in-memory host that records what was built. It
//! backs the CLI and tests; an engine binding implements [`SceneHost`]
//! the same way.

mod camera;
mod host;
mod renderer;
mod retained;

pub use camera::ArcRotateCamera;
pub use host::{
    ActionManager, ActionTrigger, CubeTexture, MaterialHandle, MeshDesc, MeshShape, SceneError,
    SceneHost, SceneNode, StandardMaterial, TextureCoordinatesMode,
};
pub use renderer::{DebugTextRenderer, SceneRenderer};
pub use retained::{RetainedScene, SceneCommand, SceneObject};

pub fn crate_info() -> &'static str {
    "starroom-scene v0.1.0"
}
