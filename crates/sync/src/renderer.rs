use crate::config::ShipConfig;
use starroom_common::{EntityId, ParticipantId};
use starroom_scene::{MaterialHandle, MeshDesc, MeshShape, SceneError, SceneHost, SceneNode, StandardMaterial};
use starroom_session::PlayerState;
use std::collections::BTreeMap;

/// Builds the visual representation of one participant.
///
/// The synchronizer owns the returned entity ids and disposes them when the
/// participant leaves; renderers only create and update.
pub trait ParticipantRenderer {
    /// Build the entities for a newly seen participant.
    fn spawn(
        &mut self,
        host: &mut dyn SceneHost,
        session_id: &ParticipantId,
        player: &PlayerState,
    ) -> Result<Vec<EntityId>, SceneError>;

    /// Bring previously spawned entities in line with a changed player state.
    fn update(
        &mut self,
        host: &mut dyn SceneHost,
        entities: &[EntityId],
        player: &PlayerState,
    ) -> Result<(), SceneError>;

    /// Whether a change from `old` to `new` can't be applied in place and
    /// the participant's entities must be rebuilt.
    fn needs_respawn(&self, old: &PlayerState, new: &PlayerState) -> bool {
        let _ = (old, new);
        false
    }
}

/// Prefix of every spaceship mesh name; the participant id follows.
pub const SHIP_NAME_PREFIX: &str = "ship:";

/// Renders each participant as one box-shaped ship.
///
/// Materials are created lazily, one per ship model, and reused. A renderer
/// instance is bound to a single scene host.
#[derive(Debug, Clone)]
pub struct SpaceshipRenderer {
    config: ShipConfig,
    materials: BTreeMap<String, MaterialHandle>,
}

impl SpaceshipRenderer {
    pub fn new(config: ShipConfig) -> Self {
        Self {
            config,
            materials: BTreeMap::new(),
        }
    }

    fn material_for(&mut self, host: &mut dyn SceneHost, model: &str) -> MaterialHandle {
        if let Some(handle) = self.materials.get(model) {
            return *handle;
        }
        let color = self
            .config
            .model_colors
            .get(model)
            .copied()
            .unwrap_or(self.config.fallback_color);
        let handle = host.create_material(
            &format!("shipMaterial:{model}"),
            StandardMaterial {
                diffuse_color: color,
                ..StandardMaterial::default()
            },
        );
        self.materials.insert(model.to_owned(), handle);
        handle
    }
}

impl Default for SpaceshipRenderer {
    fn default() -> Self {
        Self::new(ShipConfig::default())
    }
}

impl ParticipantRenderer for SpaceshipRenderer {
    fn spawn(
        &mut self,
        host: &mut dyn SceneHost,
        session_id: &ParticipantId,
        player: &PlayerState,
    ) -> Result<Vec<EntityId>, SceneError> {
        let material = self.material_for(host, &player.model);
        let desc = MeshDesc::new(MeshShape::Box {
            size: self.config.size,
        })
        .with_material(material)
        .with_transform(player.transform());
        let id = host.spawn(
            &format!("{SHIP_NAME_PREFIX}{session_id}"),
            SceneNode::Mesh(desc),
        )?;
        Ok(vec![id])
    }

    fn update(
        &mut self,
        host: &mut dyn SceneHost,
        entities: &[EntityId],
        player: &PlayerState,
    ) -> Result<(), SceneError> {
        for id in entities {
            host.set_transform(*id, player.transform())?;
        }
        Ok(())
    }

    /// The material is chosen per model at spawn, so a model switch rebuilds
    /// the ship.
    fn needs_respawn(&self, old: &PlayerState, new: &PlayerState) -> bool {
        old.model != new.model
    }
}
