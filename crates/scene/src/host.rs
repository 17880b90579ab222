use crate::camera::ArcRotateCamera;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use starroom_common::{Color3, Color4, EntityId, Transform};

/// Errors reported by a scene host.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("unknown entity: {0:?}")]
    UnknownEntity(EntityId),
    #[error("unknown material: {0:?}")]
    UnknownMaterial(MaterialHandle),
    #[error("entity {0:?} is not a camera")]
    NotACamera(EntityId),
    #[error("entity {0:?} is not a mesh")]
    NotAMesh(EntityId),
}

/// A handle referencing a material created in a scene host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MaterialHandle(pub u64);

/// How a texture's coordinates are computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TextureCoordinatesMode {
    #[default]
    Explicit,
    Spherical,
    Skybox,
}

/// Six-faced cube texture loaded from `<root_url>_px.jpg` and siblings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CubeTexture {
    pub root_url: String,
    pub coordinates_mode: TextureCoordinatesMode,
}

/// Blinn-Phong material description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardMaterial {
    pub diffuse_color: Color3,
    pub specular_color: Color3,
    pub emissive_color: Color3,
    pub reflection_texture: Option<CubeTexture>,
    pub back_face_culling: bool,
}

impl Default for StandardMaterial {
    fn default() -> Self {
        Self {
            diffuse_color: Color3::WHITE,
            specular_color: Color3::WHITE,
            emissive_color: Color3::BLACK,
            reflection_texture: None,
            back_face_culling: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MeshShape {
    Box { size: f32 },
    Sphere { diameter: f32, segments: u32 },
}

/// A mesh to build: shape, material and placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshDesc {
    pub shape: MeshShape,
    pub material: Option<MaterialHandle>,
    pub transform: Transform,
    /// Rendered as if infinitely far away (ignores camera translation).
    pub infinite_distance: bool,
}

impl MeshDesc {
    pub fn new(shape: MeshShape) -> Self {
        Self {
            shape,
            material: None,
            transform: Transform::default(),
            infinite_distance: false,
        }
    }

    pub fn with_material(mut self, material: MaterialHandle) -> Self {
        self.material = Some(material);
        self
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }
}

/// A declarative scene node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SceneNode {
    HemisphericLight {
        direction: Vec3,
        intensity: f32,
        ground_color: Color3,
    },
    PointLight {
        position: Vec3,
        intensity: f32,
    },
    Camera(ArcRotateCamera),
    Mesh(MeshDesc),
}

impl SceneNode {
    pub fn kind(&self) -> &'static str {
        match self {
            SceneNode::HemisphericLight { .. } => "hemispheric-light",
            SceneNode::PointLight { .. } => "point-light",
            SceneNode::Camera(_) => "camera",
            SceneNode::Mesh(_) => "mesh",
        }
    }
}

/// What fires a registered action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionTrigger {
    OnPick,
    OnKeyDown(String),
    OnKeyUp(String),
}

/// Scene-level action registry. Installed empty; gameplay code registers
/// named actions against triggers later.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionManager {
    actions: Vec<(ActionTrigger, String)>,
}

impl ActionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, trigger: ActionTrigger, action: impl Into<String>) {
        self.actions.push((trigger, action.into()));
    }

    /// Names of the actions bound to `trigger`, in registration order.
    pub fn actions_for<'a>(&'a self, trigger: &'a ActionTrigger) -> impl Iterator<Item = &'a str> + 'a {
        self.actions
            .iter()
            .filter(move |(t, _)| t == trigger)
            .map(|(_, name)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

/// Engine-agnostic scene construction interface. All scene backends
/// implement this trait.
///
/// Objects belong to the host once created. Callers keep the returned ids
/// to update or dispose them later.
pub trait SceneHost {
    fn set_clear_color(&mut self, color: Color4);

    fn create_material(&mut self, name: &str, material: StandardMaterial) -> MaterialHandle;

    /// Build a node. Fails if it references a material the host does not know.
    fn spawn(&mut self, name: &str, node: SceneNode) -> Result<EntityId, SceneError>;

    /// Move a mesh.
    fn set_transform(&mut self, entity: EntityId, transform: Transform) -> Result<(), SceneError>;

    /// Bind pointer and keyboard input on the render canvas to a camera.
    fn attach_control(&mut self, camera: EntityId) -> Result<(), SceneError>;

    fn install_action_manager(&mut self, actions: ActionManager);

    /// Destroy an object and release its resources.
    fn dispose(&mut self, entity: EntityId) -> Result<(), SceneError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_manager_starts_empty() {
        let actions = ActionManager::new();
        assert!(actions.is_empty());
        assert_eq!(actions.len(), 0);
    }

    #[test]
    fn actions_filter_by_trigger() {
        let mut actions = ActionManager::new();
        actions.register(ActionTrigger::OnKeyDown("w".into()), "thrust");
        actions.register(ActionTrigger::OnPick, "select");
        actions.register(ActionTrigger::OnKeyDown("w".into()), "trail");

        let trigger = ActionTrigger::OnKeyDown("w".into());
        let names: Vec<&str> = actions.actions_for(&trigger).collect();
        assert_eq!(names, ["thrust", "trail"]);
    }

    #[test]
    fn standard_material_defaults() {
        let m = StandardMaterial::default();
        assert!(m.back_face_culling);
        assert!(m.reflection_texture.is_none());
        assert_eq!(m.diffuse_color, Color3::WHITE);
    }

    #[test]
    fn mesh_desc_builder() {
        let desc = MeshDesc::new(MeshShape::Box { size: 2.0 })
            .with_material(MaterialHandle(3))
            .with_transform(Transform::from_position(Vec3::X));
        assert_eq!(desc.material, Some(MaterialHandle(3)));
        assert_eq!(desc.transform.position, Vec3::X);
        assert!(!desc.infinite_distance);
    }
}
