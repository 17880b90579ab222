use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use starroom_common::{ParticipantId, Transform};

/// Errors from session state operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unknown participant: {0}")]
    UnknownParticipant(ParticipantId),
    #[error("participant already joined: {0}")]
    AlreadyJoined(ParticipantId),
    #[error("player {0} has no camera entry")]
    MissingCamera(ParticipantId),
}

/// Replicated state of one player's ship.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    pub position: Vec3,
    #[serde(default = "identity")]
    pub rotation: Quat,
    /// Ship model the player picked; selects the mesh material.
    #[serde(default = "default_model")]
    pub model: String,
}

fn identity() -> Quat {
    Quat::IDENTITY
}

fn default_model() -> String {
    "scout".into()
}

impl Default for PlayerState {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            model: default_model(),
        }
    }
}

impl PlayerState {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    pub fn transform(&self) -> Transform {
        Transform {
            position: self.position,
            rotation: self.rotation,
            ..Transform::default()
        }
    }
}

/// Replicated arc-rotate camera of one participant.
///
/// `position` is the point the camera orbits around, not the eye.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraState {
    pub alpha: f32,
    pub beta: f32,
    pub radius: f32,
    pub position: Vec3,
}

impl Default for CameraState {
    fn default() -> Self {
        Self {
            alpha: -std::f32::consts::FRAC_PI_2,
            beta: std::f32::consts::FRAC_PI_3,
            radius: 20.0,
            position: Vec3::ZERO,
        }
    }
}

/// The replicated state tree of a room.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoomState {
    #[serde(default)]
    pub players: BTreeMap<ParticipantId, PlayerState>,
    #[serde(default)]
    pub cameras: BTreeMap<ParticipantId, CameraState>,
}

impl RoomState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a full state snapshot as sent by the room server.
    pub fn from_json(json: &str) -> Result<Self, SessionError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, SessionError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn camera(&self, id: &ParticipantId) -> Option<&CameraState> {
        self.cameras.get(id)
    }

    pub fn player(&self, id: &ParticipantId) -> Option<&PlayerState> {
        self.players.get(id)
    }

    /// Check that every player has a camera entry.
    pub fn validate(&self) -> Result<(), SessionError> {
        match self.players.keys().find(|id| !self.cameras.contains_key(*id)) {
            Some(id) => Err(SessionError::MissingCamera(id.clone())),
            None => Ok(()),
        }
    }
}
