use crate::host::{
    ActionManager, MaterialHandle, SceneError, SceneHost, SceneNode, StandardMaterial,
};
use serde::{Deserialize, Serialize};
use starroom_common::{Color4, EntityId, Transform};
use std::collections::BTreeMap;

/// A command record produced by every call into the retained scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SceneCommand {
    ClearColorSet(Color4),
    MaterialCreated { handle: MaterialHandle, name: String },
    Spawned { id: EntityId, name: String, kind: String },
    TransformSet { id: EntityId, transform: Transform },
    ControlAttached { camera: EntityId },
    ActionManagerInstalled,
    Disposed { id: EntityId, name: String },
}

/// One live object in the scene.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneObject {
    pub name: String,
    pub node: SceneNode,
}

/// In-memory scene host that keeps every live object and logs every call.
///
/// Objects are stored in a BTreeMap keyed by EntityId, so iteration order is
/// independent of creation order.
#[derive(Debug, Clone)]
pub struct RetainedScene {
    objects: BTreeMap<EntityId, SceneObject>,
    materials: BTreeMap<MaterialHandle, (String, StandardMaterial)>,
    next_material: u64,
    clear_color: Color4,
    controlled_camera: Option<EntityId>,
    action_manager: Option<ActionManager>,
    command_log: Vec<SceneCommand>,
}

impl Default for RetainedScene {
    fn default() -> Self {
        Self {
            objects: BTreeMap::new(),
            materials: BTreeMap::new(),
            next_material: 0,
            clear_color: Color4::new(0.2, 0.2, 0.3, 1.0),
            controlled_camera: None,
            action_manager: None,
            command_log: Vec::new(),
        }
    }
}

impl RetainedScene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn get(&self, id: EntityId) -> Option<&SceneObject> {
        self.objects.get(&id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.objects.contains_key(&id)
    }

    pub fn objects(&self) -> &BTreeMap<EntityId, SceneObject> {
        &self.objects
    }

    /// First live object with the given name.
    pub fn find_by_name(&self, name: &str) -> Option<(EntityId, &SceneObject)> {
        self.objects
            .iter()
            .find(|(_, obj)| obj.name == name)
            .map(|(id, obj)| (*id, obj))
    }

    /// Number of live objects whose name starts with `prefix`.
    pub fn count_with_prefix(&self, prefix: &str) -> usize {
        self.objects
            .values()
            .filter(|obj| obj.name.starts_with(prefix))
            .count()
    }

    pub fn material(&self, handle: MaterialHandle) -> Option<&StandardMaterial> {
        self.materials.get(&handle).map(|(_, m)| m)
    }

    pub fn material_count(&self) -> usize {
        self.materials.len()
    }

    pub fn clear_color(&self) -> Color4 {
        self.clear_color
    }

    pub fn controlled_camera(&self) -> Option<EntityId> {
        self.controlled_camera
    }

    pub fn action_manager(&self) -> Option<&ActionManager> {
        self.action_manager.as_ref()
    }

    /// Read-only access to the command log.
    pub fn commands(&self) -> &[SceneCommand] {
        &self.command_log
    }

    /// Drain and return the command log.
    pub fn drain_commands(&mut self) -> Vec<SceneCommand> {
        std::mem::take(&mut self.command_log)
    }

    fn object_mut(&mut self, id: EntityId) -> Result<&mut SceneObject, SceneError> {
        self.objects
            .get_mut(&id)
            .ok_or(SceneError::UnknownEntity(id))
    }
}

impl SceneHost for RetainedScene {
    fn set_clear_color(&mut self, color: Color4) {
        self.clear_color = color;
        self.command_log.push(SceneCommand::ClearColorSet(color));
    }

    fn create_material(&mut self, name: &str, material: StandardMaterial) -> MaterialHandle {
        let handle = MaterialHandle(self.next_material);
        self.next_material += 1;
        self.materials.insert(handle, (name.to_owned(), material));
        self.command_log.push(SceneCommand::MaterialCreated {
            handle,
            name: name.to_owned(),
        });
        handle
    }

    fn spawn(&mut self, name: &str, node: SceneNode) -> Result<EntityId, SceneError> {
        if let SceneNode::Mesh(desc) = &node {
            if let Some(handle) = desc.material {
                if !self.materials.contains_key(&handle) {
                    return Err(SceneError::UnknownMaterial(handle));
                }
            }
        }
        let id = EntityId::new();
        tracing::trace!(id = %id.short(), name, kind = node.kind(), "object spawned");
        self.command_log.push(SceneCommand::Spawned {
            id,
            name: name.to_owned(),
            kind: node.kind().to_owned(),
        });
        self.objects.insert(
            id,
            SceneObject {
                name: name.to_owned(),
                node,
            },
        );
        Ok(id)
    }

    fn set_transform(&mut self, entity: EntityId, transform: Transform) -> Result<(), SceneError> {
        match &mut self.object_mut(entity)?.node {
            SceneNode::Mesh(desc) => desc.transform = transform,
            _ => return Err(SceneError::NotAMesh(entity)),
        }
        self.command_log.push(SceneCommand::TransformSet {
            id: entity,
            transform,
        });
        Ok(())
    }

    fn attach_control(&mut self, camera: EntityId) -> Result<(), SceneError> {
        match self.object_mut(camera)?.node {
            SceneNode::Camera(_) => {}
            _ => return Err(SceneError::NotACamera(camera)),
        }
        self.controlled_camera = Some(camera);
        self.command_log.push(SceneCommand::ControlAttached { camera });
        Ok(())
    }

    fn install_action_manager(&mut self, actions: ActionManager) {
        self.action_manager = Some(actions);
        self.command_log.push(SceneCommand::ActionManagerInstalled);
    }

    fn dispose(&mut self, entity: EntityId) -> Result<(), SceneError> {
        let obj = self
            .objects
            .remove(&entity)
            .ok_or(SceneError::UnknownEntity(entity))?;
        if self.controlled_camera == Some(entity) {
            self.controlled_camera = None;
        }
        tracing::trace!(id = %entity.short(), name = %obj.name, "object disposed");
        self.command_log.push(SceneCommand::Disposed {
            id: entity,
            name: obj.name,
        });
        Ok(())
    }
}
