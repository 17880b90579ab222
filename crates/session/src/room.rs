use crate::state::{CameraState, PlayerState, RoomState, SessionError};
use serde::{Deserialize, Serialize};
use starroom_common::ParticipantId;

/// Read-only view of a room session, as consumed by scene synchronization.
pub trait Session {
    /// The local participant's id.
    fn session_id(&self) -> &ParticipantId;

    /// Current replicated state.
    fn state(&self) -> &RoomState;

    /// Revision counter; changes whenever the state changes.
    fn revision(&self) -> u64;
}

/// An event record produced by every mutation of the room state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RoomEvent {
    /// Participant joined with initial player state and, if the server sent
    /// one, camera state.
    Joined {
        id: ParticipantId,
        player: PlayerState,
        camera: Option<CameraState>,
    },
    /// Participant left. Carries the data it had.
    Left {
        id: ParticipantId,
        player: PlayerState,
    },
    PlayerUpdated {
        id: ParticipantId,
        old: PlayerState,
        new: PlayerState,
    },
    CameraUpdated {
        id: ParticipantId,
        old: CameraState,
        new: CameraState,
    },
    CameraAdded {
        id: ParticipantId,
        camera: CameraState,
    },
    CameraRemoved {
        id: ParticipantId,
        camera: CameraState,
    },
}

/// In-process room session.
///
/// Network code feeds it full snapshots ([`Room::apply_snapshot`]) or
/// individual join/leave/update operations. The room owns the truth;
/// scene synchronization derives from it.
#[derive(Debug, Clone)]
pub struct Room {
    session_id: ParticipantId,
    state: RoomState,
    revision: u64,
    event_log: Vec<RoomEvent>,
}

impl Room {
    /// Create an empty room as seen by the local participant `session_id`.
    pub fn new(session_id: impl Into<ParticipantId>) -> Self {
        Self::with_state(session_id, RoomState::default())
    }

    /// Create a room from an initial snapshot. No events are logged for it.
    pub fn with_state(session_id: impl Into<ParticipantId>, state: RoomState) -> Self {
        Self {
            session_id: session_id.into(),
            state,
            revision: 0,
            event_log: Vec::new(),
        }
    }

    pub fn player_count(&self) -> usize {
        self.state.players.len()
    }

    /// Read-only access to the event log.
    pub fn events(&self) -> &[RoomEvent] {
        &self.event_log
    }

    /// Drain and return the event log.
    pub fn drain_events(&mut self) -> Vec<RoomEvent> {
        std::mem::take(&mut self.event_log)
    }

    /// Add a participant with its player and camera state.
    pub fn join(
        &mut self,
        id: impl Into<ParticipantId>,
        player: PlayerState,
        camera: CameraState,
    ) -> Result<(), SessionError> {
        let id = id.into();
        if self.state.players.contains_key(&id) {
            return Err(SessionError::AlreadyJoined(id));
        }
        tracing::debug!(participant = %id, "participant joined");
        self.state.players.insert(id.clone(), player.clone());
        self.state.cameras.insert(id.clone(), camera);
        self.record(RoomEvent::Joined {
            id,
            player,
            camera: Some(camera),
        });
        Ok(())
    }

    /// Remove a participant. Returns its last player state.
    pub fn leave(&mut self, id: &ParticipantId) -> Result<PlayerState, SessionError> {
        let player = self
            .state
            .players
            .remove(id)
            .ok_or_else(|| SessionError::UnknownParticipant(id.clone()))?;
        self.state.cameras.remove(id);
        tracing::debug!(participant = %id, "participant left");
        self.record(RoomEvent::Left {
            id: id.clone(),
            player: player.clone(),
        });
        Ok(player)
    }

    /// Replace one participant's player state.
    pub fn update_player(
        &mut self,
        id: &ParticipantId,
        new: PlayerState,
    ) -> Result<(), SessionError> {
        let slot = self
            .state
            .players
            .get_mut(id)
            .ok_or_else(|| SessionError::UnknownParticipant(id.clone()))?;
        if *slot == new {
            return Ok(());
        }
        let old = std::mem::replace(slot, new.clone());
        self.record(RoomEvent::PlayerUpdated {
            id: id.clone(),
            old,
            new,
        });
        Ok(())
    }

    /// Replace one participant's camera state.
    pub fn update_camera(
        &mut self,
        id: &ParticipantId,
        new: CameraState,
    ) -> Result<(), SessionError> {
        let slot = self
            .state
            .cameras
            .get_mut(id)
            .ok_or_else(|| SessionError::UnknownParticipant(id.clone()))?;
        if *slot == new {
            return Ok(());
        }
        let old = std::mem::replace(slot, new);
        self.record(RoomEvent::CameraUpdated {
            id: id.clone(),
            old,
            new,
        });
        Ok(())
    }

    /// Apply a full snapshot from the server, logging the difference to the
    /// current state as events. Returns the number of events produced.
    ///
    /// Replaying the produced events over the previous state yields `next`.
    pub fn apply_snapshot(&mut self, next: RoomState) -> usize {
        let mut events = Vec::new();

        for (id, player) in &self.state.players {
            if !next.players.contains_key(id) {
                events.push(RoomEvent::Left {
                    id: id.clone(),
                    player: player.clone(),
                });
            }
        }
        for (id, player) in &next.players {
            match self.state.players.get(id) {
                None => events.push(RoomEvent::Joined {
                    id: id.clone(),
                    player: player.clone(),
                    camera: next.cameras.get(id).copied(),
                }),
                Some(old) if old != player => events.push(RoomEvent::PlayerUpdated {
                    id: id.clone(),
                    old: old.clone(),
                    new: player.clone(),
                }),
                Some(_) => {}
            }
        }

        // Cameras are diffed against the state the player events lead to,
        // since joins and leaves already carry camera changes.
        let mut staged = self.state.clone();
        for event in &events {
            apply_event(&mut staged, event);
        }
        for (id, camera) in &staged.cameras {
            if !next.cameras.contains_key(id) {
                events.push(RoomEvent::CameraRemoved {
                    id: id.clone(),
                    camera: *camera,
                });
            }
        }
        for (id, camera) in &next.cameras {
            match staged.cameras.get(id) {
                None => events.push(RoomEvent::CameraAdded {
                    id: id.clone(),
                    camera: *camera,
                }),
                Some(old) if old != camera => events.push(RoomEvent::CameraUpdated {
                    id: id.clone(),
                    old: *old,
                    new: *camera,
                }),
                Some(_) => {}
            }
        }

        let produced = events.len();
        self.state = next;
        for event in events {
            self.record(event);
        }
        tracing::trace!(
            produced,
            players = self.state.players.len(),
            revision = self.revision,
            "snapshot applied"
        );
        produced
    }

    /// Reconstruct room state from a sequence of events.
    pub fn replay(session_id: impl Into<ParticipantId>, events: &[RoomEvent]) -> Self {
        let mut room = Self::new(session_id);
        for event in events {
            apply_event(&mut room.state, event);
            room.revision += 1;
        }
        room
    }

    fn record(&mut self, event: RoomEvent) {
        self.revision += 1;
        self.event_log.push(event);
    }
}

fn apply_event(state: &mut RoomState, event: &RoomEvent) {
    match event {
        RoomEvent::Joined { id, player, camera } => {
            state.players.insert(id.clone(), player.clone());
            if let Some(camera) = camera {
                state.cameras.insert(id.clone(), *camera);
            }
        }
        RoomEvent::Left { id, .. } => {
            state.players.remove(id);
            state.cameras.remove(id);
        }
        RoomEvent::PlayerUpdated { id, new, .. } => {
            state.players.insert(id.clone(), new.clone());
        }
        RoomEvent::CameraUpdated { id, new, .. } => {
            state.cameras.insert(id.clone(), *new);
        }
        RoomEvent::CameraAdded { id, camera } => {
            state.cameras.insert(id.clone(), *camera);
        }
        RoomEvent::CameraRemoved { id, .. } => {
            state.cameras.remove(id);
        }
    }
}

impl Session for Room {
    fn session_id(&self) -> &ParticipantId {
        &self.session_id
    }

    fn state(&self) -> &RoomState {
        &self.state
    }

    fn revision(&self) -> u64 {
        self.revision
    }
}

impl<S: Session + ?Sized> Session for &S {
    fn session_id(&self) -> &ParticipantId {
        (**self).session_id()
    }

    fn state(&self) -> &RoomState {
        (**self).state()
    }

    fn revision(&self) -> u64 {
        (**self).revision()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn room_with(ids: &[&str]) -> Room {
        let mut room = Room::new(ids[0]);
        for id in ids {
            room.join(*id, PlayerState::default(), CameraState::default())
                .unwrap();
        }
        room
    }

    #[test]
    fn room_starts_empty() {
        let room = Room::new("me");
        assert_eq!(room.session_id().as_str(), "me");
        assert_eq!(room.player_count(), 0);
        assert_eq!(room.revision(), 0);
    }

    #[test]
    fn join_and_leave() {
        let mut room = room_with(&["a", "b"]);
        assert_eq!(room.player_count(), 2);
        assert!(room.state().camera(&"b".into()).is_some());

        room.leave(&"b".into()).unwrap();
        assert_eq!(room.player_count(), 1);
        assert!(room.state().camera(&"b".into()).is_none());
        assert_eq!(room.events().len(), 3);
    }

    #[test]
    fn double_join_rejected() {
        let mut room = room_with(&["a"]);
        let err = room
            .join("a", PlayerState::default(), CameraState::default())
            .unwrap_err();
        assert!(matches!(err, SessionError::AlreadyJoined(_)));
    }

    #[test]
    fn leave_unknown_rejected() {
        let mut room = Room::new("me");
        assert!(matches!(
            room.leave(&"ghost".into()),
            Err(SessionError::UnknownParticipant(_))
        ));
        assert_eq!(room.revision(), 0);
    }

    #[test]
    fn unchanged_update_does_not_bump_revision() {
        let mut room = room_with(&["a"]);
        let rev = room.revision();
        room.update_player(&"a".into(), PlayerState::default()).unwrap();
        assert_eq!(room.revision(), rev);

        room.update_player(&"a".into(), PlayerState::at(Vec3::X)).unwrap();
        assert_eq!(room.revision(), rev + 1);
    }

    #[test]
    fn apply_snapshot_logs_diff() {
        let mut room = room_with(&["a", "b"]);
        room.drain_events();

        let mut next = room.state().clone();
        next.players.remove(&ParticipantId::from("b"));
        next.cameras.remove(&ParticipantId::from("b"));
        next.players.insert("c".into(), PlayerState::default());
        next.cameras.insert("c".into(), CameraState::default());
        next.players.insert("a".into(), PlayerState::at(Vec3::Z));

        assert_eq!(room.apply_snapshot(next), 3);
        let events = room.events();
        assert!(matches!(&events[0], RoomEvent::Left { id, .. } if id.as_str() == "b"));
        assert!(events
            .iter()
            .any(|e| matches!(e, RoomEvent::Joined { id, .. } if id.as_str() == "c")));
        assert!(events
            .iter()
            .any(|e| matches!(e, RoomEvent::PlayerUpdated { id, .. } if id.as_str() == "a")));
    }

    #[test]
    fn identical_snapshot_is_silent() {
        let mut room = room_with(&["a"]);
        let rev = room.revision();
        let same = room.state().clone();
        assert_eq!(room.apply_snapshot(same), 0);
        assert_eq!(room.revision(), rev);
    }

    #[test]
    fn replay_reconstructs_state() {
        let mut room = room_with(&["a", "b", "c"]);
        room.update_camera(
            &"a".into(),
            CameraState {
                radius: 42.0,
                ..CameraState::default()
            },
        )
        .unwrap();
        room.leave(&"c".into()).unwrap();

        let replayed = Room::replay("a", room.events());
        assert_eq!(replayed.state(), room.state());
        assert_eq!(replayed.revision(), room.revision());
    }

    #[test]
    fn players_iterate_in_id_order() {
        let room = room_with(&["zed", "amy", "mo"]);
        let ids: Vec<&str> = room.state().players.keys().map(|k| k.as_str()).collect();
        assert_eq!(ids, ["amy", "mo", "zed"]);
    }

    #[test]
    fn camera_only_changes_bump_revision() {
        let mut room = room_with(&["a", "b"]);
        let rev = room.revision();

        let mut next = room.state().clone();
        next.cameras.clear();
        assert_eq!(room.apply_snapshot(next.clone()), 2);
        assert_eq!(room.revision(), rev + 2);
        assert!(room.state().cameras.is_empty());

        let mut back = next;
        back.cameras.insert("a".into(), CameraState::default());
        assert_eq!(room.apply_snapshot(back), 1);
        assert!(matches!(
            room.events().last(),
            Some(RoomEvent::CameraAdded { id, .. }) if id.as_str() == "a"
        ));
    }

    #[test]
    fn snapshot_events_replay_to_the_snapshot() {
        let mut room = room_with(&["a", "b", "c"]);

        let mut next = room.state().clone();
        // b leaves but its camera entry lingers
        next.players.remove(&ParticipantId::from("b"));
        // c loses its camera
        next.cameras.remove(&ParticipantId::from("c"));
        // d joins without a camera, e joins with one
        next.players.insert("d".into(), PlayerState::default());
        next.players.insert("e".into(), PlayerState::at(Vec3::Y));
        next.cameras.insert("e".into(), CameraState::default());
        room.apply_snapshot(next.clone());

        assert_eq!(room.state(), &next);
        let replayed = Room::replay("a", room.events());
        assert_eq!(replayed.state(), &next);
        assert!(replayed.state().camera(&"d".into()).is_none());
        assert_eq!(replayed.revision(), room.revision());
    }
}
