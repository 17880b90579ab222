//! Shared types for the starroom client: participant and scene identifiers,
//! spatial transforms and colours.

pub mod types;

pub use types::{Color3, Color4, EntityId, ParticipantId, Transform};

pub fn crate_info() -> &'static str {
    "starroom-common v0.1.0"
}
