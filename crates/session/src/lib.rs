//! Room Session: authoritative replicated state for one multiplayer room.
//!
//! # Invariants
//! - Consumers only read state through the [`Session`] trait.
//! - Every mutation bumps the revision and appends a [`RoomEvent`].
//! - Player and camera maps iterate in ParticipantId order (BTreeMap), so the
//!   order is stable across updates.

pub mod room;
pub mod state;

pub use room::{Room, RoomEvent, Session};
pub use state::{CameraState, PlayerState, RoomState, SessionError};

pub fn crate_info() -> &'static str {
    "starroom-session v0.1.0"
}
