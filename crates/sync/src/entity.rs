use starroom_common::ParticipantId;
use starroom_session::PlayerState;
use std::collections::BTreeMap;

/// One participant in the desired entity set of a pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticipantEntry<'a> {
    pub participant_id: &'a ParticipantId,
    pub player_state: &'a PlayerState,
}

/// Derive the desired entity set from the player map: one entry per player,
/// in map iteration order. Pure; ids are unique because map keys are.
pub fn derive_entity_list(players: &BTreeMap<ParticipantId, PlayerState>) -> Vec<ParticipantEntry<'_>> {
    players
        .iter()
        .map(|(participant_id, player_state)| ParticipantEntry {
            participant_id,
            player_state,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use std::collections::BTreeSet;

    fn players(n: usize) -> BTreeMap<ParticipantId, PlayerState> {
        (0..n)
            .map(|i| {
                (
                    ParticipantId::new(format!("p{i}")),
                    PlayerState::at(Vec3::new(i as f32, 0.0, 0.0)),
                )
            })
            .collect()
    }

    #[test]
    fn empty_map_gives_empty_list() {
        assert!(derive_entity_list(&BTreeMap::new()).is_empty());
    }

    #[test]
    fn one_entry_per_player_with_unique_ids() {
        for n in [1, 3, 17] {
            let map = players(n);
            let list = derive_entity_list(&map);
            assert_eq!(list.len(), n);

            let ids: BTreeSet<&ParticipantId> = list.iter().map(|e| e.participant_id).collect();
            assert_eq!(ids.len(), n);
            assert!(ids.iter().all(|id| map.contains_key(*id)));
        }
    }

    #[test]
    fn entries_carry_matching_player_state() {
        let map = players(4);
        for entry in derive_entity_list(&map) {
            assert_eq!(map.get(entry.participant_id), Some(entry.player_state));
        }
    }

    #[test]
    fn derivation_is_idempotent() {
        let map = players(5);
        let first = derive_entity_list(&map);
        let second = derive_entity_list(&map);
        assert_eq!(first, second);
    }
}
