//! Scene Synchronizer: maps a room session onto a scene host.
//!
//! # Invariants
//! - The session is read, never written.
//! - After every pass there is exactly one rendered participant per entry in
//!   the session's player map, keyed by ParticipantId.
//! - Scene setup happens once, before any participant is drawn, and fails
//!   without touching the host when the local camera state is missing.

pub mod config;
mod entity;
mod renderer;
mod synchronizer;

pub use config::{ConfigError, PlanetConfig, SceneConfig, ShipConfig, SyncPolicy};
pub use entity::{ParticipantEntry, derive_entity_list};
pub use renderer::{ParticipantRenderer, SHIP_NAME_PREFIX, SpaceshipRenderer};
pub use synchronizer::{RenderedParticipant, SceneSetup, SyncError, SyncReport, Synchronizer};

pub fn crate_info() -> &'static str {
    "starroom-sync v0.1.0"
}
