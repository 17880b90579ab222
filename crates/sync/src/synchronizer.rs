use crate::config::{SceneConfig, SyncPolicy};
use crate::entity::derive_entity_list;
use crate::renderer::{ParticipantRenderer, SpaceshipRenderer};
use glam::Vec3;
use serde::Serialize;
use starroom_common::{Color3, EntityId, ParticipantId, Transform};
use starroom_scene::{
    ActionManager, ArcRotateCamera, CubeTexture, MeshDesc, MeshShape, SceneError, SceneHost,
    SceneNode, StandardMaterial, TextureCoordinatesMode,
};
use starroom_session::{CameraState, PlayerState, Session};
use std::collections::BTreeMap;

/// Errors from scene setup and synchronization.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("no camera state for local participant {0}")]
    MissingCameraState(ParticipantId),
    #[error("scene already initialized")]
    AlreadyInitialized,
    #[error("scene not initialized")]
    NotInitialized,
    #[error("scene host error: {0}")]
    Scene(#[from] SceneError),
}

/// Ids of the fixed objects built by [`Synchronizer::initialize_scene`].
#[derive(Debug, Clone, PartialEq)]
pub struct SceneSetup {
    pub camera: EntityId,
    pub ambient_light: EntityId,
    pub sun_light: EntityId,
    pub skybox: EntityId,
    pub planets: Vec<EntityId>,
}

/// Entities rendered for one participant, plus the state they show.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedParticipant {
    pub entities: Vec<EntityId>,
    pub player: PlayerState,
}

/// Outcome of one synchronization pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SyncReport {
    pub revision: u64,
    pub created: Vec<ParticipantId>,
    pub updated: Vec<ParticipantId>,
    pub removed: Vec<ParticipantId>,
    pub unchanged: usize,
    /// Participants rendered after the pass.
    pub rendered: usize,
}

impl SyncReport {
    pub fn is_noop(&self) -> bool {
        self.created.is_empty() && self.updated.is_empty() && self.removed.is_empty()
    }
}

/// Maps a room session onto a scene host.
///
/// Exactly one set of participant entities exists per player in the session
/// after each pass, keyed by ParticipantId. The session is only read.
pub struct Synchronizer<S, R = SpaceshipRenderer> {
    session: S,
    config: SceneConfig,
    renderer: R,
    rendered: BTreeMap<ParticipantId, RenderedParticipant>,
    setup: Option<SceneSetup>,
    last_revision: Option<u64>,
}

impl<S: Session> Synchronizer<S, SpaceshipRenderer> {
    /// Synchronizer rendering participants as spaceships.
    pub fn new(session: S, config: SceneConfig) -> Self {
        let renderer = SpaceshipRenderer::new(config.ship.clone());
        Self::with_renderer(session, config, renderer)
    }
}

impl<S: Session, R: ParticipantRenderer> Synchronizer<S, R> {
    pub fn with_renderer(session: S, config: SceneConfig, renderer: R) -> Self {
        Self {
            session,
            config,
            renderer,
            rendered: BTreeMap::new(),
            setup: None,
            last_revision: None,
        }
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    /// Mutable access for the network layer feeding the session.
    pub fn session_mut(&mut self) -> &mut S {
        &mut self.session
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn setup(&self) -> Option<&SceneSetup> {
        self.setup.as_ref()
    }

    pub fn is_initialized(&self) -> bool {
        self.setup.is_some()
    }

    /// Number of participants with rendered entities.
    pub fn rendered_count(&self) -> usize {
        self.rendered.len()
    }

    pub fn rendered(&self) -> &BTreeMap<ParticipantId, RenderedParticipant> {
        &self.rendered
    }

    pub fn entities_for(&self, id: &ParticipantId) -> Option<&[EntityId]> {
        self.rendered.get(id).map(|r| r.entities.as_slice())
    }

    /// Build lights, skybox, camera and decor in a fresh scene.
    ///
    /// The local participant's camera state is looked up first; when it is
    /// missing nothing is issued to the host. If the host rejects a node
    /// part way through, the objects built so far are disposed again so a
    /// retry starts from an empty scene. Materials have no disposal call and
    /// stay with the host.
    pub fn initialize_scene(&mut self, host: &mut dyn SceneHost) -> Result<&SceneSetup, SyncError> {
        if self.setup.is_some() {
            return Err(SyncError::AlreadyInitialized);
        }
        let local = self.session.session_id();
        let Some(camera_state) = self.session.state().camera(local).copied() else {
            tracing::warn!(participant = %local, "local participant has no camera state");
            return Err(SyncError::MissingCameraState(local.clone()));
        };
        let _span = tracing::info_span!("initialize_scene", participant = %local).entered();

        let mut built = Vec::new();
        let setup = match build_scene(&self.config, &camera_state, host, &mut built) {
            Ok(setup) => setup,
            Err(e) => {
                tracing::warn!(built = built.len(), "scene initialization failed: {e}");
                for id in built.into_iter().rev() {
                    if let Err(dispose_err) = host.dispose(id) {
                        tracing::warn!(id = %id.short(), "rollback dispose failed: {dispose_err}");
                    }
                }
                return Err(e.into());
            }
        };

        tracing::info!(planets = setup.planets.len(), "scene initialized");
        Ok(self.setup.insert(setup))
    }

    /// Initialize the scene and run the first pass.
    pub fn mount(&mut self, host: &mut dyn SceneHost) -> Result<SyncReport, SyncError> {
        self.initialize_scene(host)?;
        self.synchronize(host)
    }

    /// Bring the participant entities in line with the session state.
    pub fn synchronize(&mut self, host: &mut dyn SceneHost) -> Result<SyncReport, SyncError> {
        if self.setup.is_none() {
            tracing::warn!("synchronize called before scene initialization");
            return Err(SyncError::NotInitialized);
        }
        let revision = self.session.revision();
        let _span = tracing::info_span!("synchronize", revision).entered();

        let report = match self.config.policy {
            SyncPolicy::Reconcile => self.reconcile(host, revision),
            SyncPolicy::FullReissue => self.reissue(host, revision),
        }
        .inspect_err(|e| tracing::warn!(rendered = self.rendered.len(), "synchronize failed: {e}"))?;
        self.last_revision = Some(revision);

        debug_assert_eq!(self.rendered.len(), self.session.state().players.len());
        tracing::trace!(
            created = report.created.len(),
            updated = report.updated.len(),
            removed = report.removed.len(),
            rendered = report.rendered,
            "synchronize complete"
        );
        Ok(report)
    }

    /// Run a pass only if the session revision moved since the last one.
    pub fn synchronize_if_changed(
        &mut self,
        host: &mut dyn SceneHost,
    ) -> Result<Option<SyncReport>, SyncError> {
        if self.last_revision == Some(self.session.revision()) {
            return Ok(None);
        }
        self.synchronize(host).map(Some)
    }

    /// Dispose every participant entity. Fixed scene objects stay with the host.
    ///
    /// A participant stays tracked until its entities are disposed, so a
    /// failed teardown can be retried.
    pub fn teardown(&mut self, host: &mut dyn SceneHost) -> Result<usize, SyncError> {
        let ids: Vec<ParticipantId> = self.rendered.keys().cloned().collect();
        let count = ids.len();
        for id in ids {
            release(&mut self.rendered, host, &id).inspect_err(|e| {
                tracing::warn!(participant = %id, "teardown failed: {e}");
            })?;
        }
        self.last_revision = None;
        Ok(count)
    }

    fn reconcile(&mut self, host: &mut dyn SceneHost, revision: u64) -> Result<SyncReport, SyncError> {
        let players = &self.session.state().players;
        let mut report = SyncReport {
            revision,
            ..SyncReport::default()
        };

        // Departed = rendered but no longer in the player map
        let departed: Vec<ParticipantId> = self
            .rendered
            .keys()
            .filter(|id| !players.contains_key(*id))
            .cloned()
            .collect();
        for id in departed {
            release(&mut self.rendered, host, &id)?;
            report.removed.push(id);
        }

        for entry in derive_entity_list(players) {
            let id = entry.participant_id;
            let Some(existing) = self.rendered.get(id) else {
                materialize(&mut self.renderer, &mut self.rendered, host, id, entry.player_state)?;
                report.created.push(id.clone());
                continue;
            };
            if existing.player == *entry.player_state {
                report.unchanged += 1;
                continue;
            }
            if self.renderer.needs_respawn(&existing.player, entry.player_state) {
                release(&mut self.rendered, host, id)?;
                materialize(&mut self.renderer, &mut self.rendered, host, id, entry.player_state)?;
                report.updated.push(id.clone());
                continue;
            }

            match self.renderer.update(host, &existing.entities, entry.player_state) {
                Ok(()) => {
                    if let Some(existing) = self.rendered.get_mut(id) {
                        existing.player = entry.player_state.clone();
                    }
                    report.updated.push(id.clone());
                }
                // The host released the entity behind our back; rebuild it
                Err(SceneError::UnknownEntity(entity)) => {
                    tracing::warn!(participant = %id, entity = %entity.short(), "stale entity, respawning");
                    release(&mut self.rendered, host, id)?;
                    materialize(&mut self.renderer, &mut self.rendered, host, id, entry.player_state)?;
                    report.created.push(id.clone());
                }
                Err(e) => return Err(e.into()),
            }
        }

        report.rendered = self.rendered.len();
        Ok(report)
    }

    fn reissue(&mut self, host: &mut dyn SceneHost, revision: u64) -> Result<SyncReport, SyncError> {
        let mut report = SyncReport {
            revision,
            ..SyncReport::default()
        };
        let ids: Vec<ParticipantId> = self.rendered.keys().cloned().collect();
        for id in ids {
            release(&mut self.rendered, host, &id)?;
            report.removed.push(id);
        }

        for entry in derive_entity_list(&self.session.state().players) {
            materialize(
                &mut self.renderer,
                &mut self.rendered,
                host,
                entry.participant_id,
                entry.player_state,
            )?;
            report.created.push(entry.participant_id.clone());
        }

        report.rendered = self.rendered.len();
        Ok(report)
    }
}

/// Build the fixed scene objects, pushing every spawned id into `built`.
fn build_scene(
    cfg: &SceneConfig,
    camera_state: &CameraState,
    host: &mut dyn SceneHost,
    built: &mut Vec<EntityId>,
) -> Result<SceneSetup, SceneError> {
    host.set_clear_color(cfg.clear_color);

    let ambient_light = host.spawn(
        "light",
        SceneNode::HemisphericLight {
            direction: Vec3::Y,
            intensity: cfg.ambient.intensity,
            ground_color: cfg.ambient.ground_color,
        },
    )?;
    built.push(ambient_light);
    let sun_light = host.spawn(
        "sunLight",
        SceneNode::PointLight {
            position: cfg.sun.position,
            intensity: cfg.sun.intensity,
        },
    )?;
    built.push(sun_light);

    let camera = ArcRotateCamera::new(
        camera_state.alpha,
        camera_state.beta,
        camera_state.radius,
        camera_state.position,
    )
    .with_radius_limits(cfg.camera.lower_radius_limit, cfg.camera.upper_radius_limit);
    let camera = host.spawn("camera", SceneNode::Camera(camera))?;
    built.push(camera);

    let sky_material = host.create_material(
        "skyMaterial",
        StandardMaterial {
            diffuse_color: Color3::BLACK,
            specular_color: Color3::BLACK,
            reflection_texture: Some(CubeTexture {
                root_url: cfg.skybox.texture_root.clone(),
                coordinates_mode: TextureCoordinatesMode::Skybox,
            }),
            back_face_culling: false,
            ..StandardMaterial::default()
        },
    );
    let skybox = host.spawn(
        "skyBox",
        SceneNode::Mesh(MeshDesc {
            infinite_distance: true,
            ..MeshDesc::new(MeshShape::Box {
                size: cfg.skybox.size,
            })
            .with_material(sky_material)
        }),
    )?;
    built.push(skybox);

    let mut planets = Vec::with_capacity(cfg.planets.len());
    for planet in &cfg.planets {
        let material = host.create_material(
            &format!("planetMaterial:{}", planet.name),
            StandardMaterial {
                diffuse_color: planet.color,
                emissive_color: if planet.emissive {
                    planet.color
                } else {
                    Color3::BLACK
                },
                ..StandardMaterial::default()
            },
        );
        let desc = MeshDesc::new(MeshShape::Sphere {
            diameter: planet.diameter,
            segments: 32,
        })
        .with_material(material)
        .with_transform(Transform::from_position(planet.position));
        let id = host.spawn(&planet.name, SceneNode::Mesh(desc))?;
        built.push(id);
        planets.push(id);
    }

    host.attach_control(camera)?;
    host.install_action_manager(ActionManager::new());

    Ok(SceneSetup {
        camera,
        ambient_light,
        sun_light,
        skybox,
        planets,
    })
}

/// Spawn a participant's entities and start tracking them.
fn materialize<R: ParticipantRenderer>(
    renderer: &mut R,
    rendered: &mut BTreeMap<ParticipantId, RenderedParticipant>,
    host: &mut dyn SceneHost,
    id: &ParticipantId,
    player: &PlayerState,
) -> Result<(), SceneError> {
    let entities = renderer.spawn(host, id, player)?;
    tracing::debug!(participant = %id, entities = entities.len(), "participant spawned");
    rendered.insert(
        id.clone(),
        RenderedParticipant {
            entities,
            player: player.clone(),
        },
    );
    Ok(())
}

/// Dispose a participant's entities, then stop tracking it.
///
/// Entities the host no longer knows count as disposed. On any other host
/// error the participant stays tracked.
fn release(
    rendered: &mut BTreeMap<ParticipantId, RenderedParticipant>,
    host: &mut dyn SceneHost,
    id: &ParticipantId,
) -> Result<(), SceneError> {
    let Some(participant) = rendered.get(id) else {
        return Ok(());
    };
    tracing::debug!(participant = %id, entities = participant.entities.len(), "participant disposed");
    for entity in &participant.entities {
        match host.dispose(*entity) {
            Ok(()) => {}
            Err(SceneError::UnknownEntity(_)) => {
                tracing::debug!(participant = %id, entity = %entity.short(), "entity already released");
            }
            Err(e) => return Err(e),
        }
    }
    rendered.remove(id);
    Ok(())
}
