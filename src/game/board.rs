use std::collections::{BTreeMap, BTreeSet};
use sqlx::PgPool;
use crate::{
    lib::Result,
    game::{
        ship::ShipGroup,
        structure::{Structure, StructureKind},
        system::{JumpLine, StarSystem},
    },
};

/// In-memory image of one game's board: systems, adjacency, ship groups and structures.
///
/// The order validator and the turn resolver both work on this structure rather than on the
/// store, so resolution is a pure function of the loaded state and the reads during a
/// resolution always see the in-progress mutations. Ordered maps keep iteration (and thus
/// RNG consumption during combat) deterministic.
#[derive(Debug, Clone)]
pub struct Board {
    pub systems: BTreeMap<i32, StarSystem>,
    jump_lines: BTreeSet<(i32, i32)>,
    ships: BTreeMap<(i32, i32), i32>,
    structures: BTreeMap<(i32, StructureKind), i32>,
}

impl Board {
    pub fn from_parts(
        systems: Vec<StarSystem>,
        jump_lines: Vec<JumpLine>,
        ships: Vec<ShipGroup>,
        structures: Vec<Structure>,
    ) -> Board {
        Board {
            systems: systems.into_iter().map(|s| (s.system_id, s)).collect(),
            jump_lines: jump_lines.into_iter()
                .map(|jl| normalized(jl.from_system_id, jl.to_system_id))
                .collect(),
            ships: ships.into_iter()
                .filter(|g| g.count > 0)
                .map(|g| ((g.system_id, g.player_index), g.count))
                .collect(),
            structures: structures.into_iter()
                .map(|s| ((s.system_id, s.kind), s.player_index))
                .collect(),
        }
    }

    pub async fn load(game_pool: &PgPool) -> Result<Board> {
        Ok(Board::from_parts(
            StarSystem::find_all(game_pool).await?,
            JumpLine::find_all(game_pool).await?,
            ShipGroup::find_all(game_pool).await?,
            Structure::find_all(game_pool).await?,
        ))
    }

    pub fn system(&self, system_id: i32) -> Option<&StarSystem> {
        self.systems.get(&system_id)
    }

    pub fn system_mut(&mut self, system_id: i32) -> Option<&mut StarSystem> {
        self.systems.get_mut(&system_id)
    }

    pub fn is_adjacent(&self, a: i32, b: i32) -> bool {
        self.jump_lines.contains(&normalized(a, b))
    }

    pub fn ships_of(&self, system_id: i32, player_index: i32) -> i32 {
        self.ships.get(&(system_id, player_index)).cloned().unwrap_or(0)
    }

    /// Adjusts a ship group; rows falling to zero (or below) are dropped.
    pub fn add_ships(&mut self, system_id: i32, player_index: i32, delta: i32) {
        let count = self.ships_of(system_id, player_index) + delta;
        if count > 0 {
            self.ships.insert((system_id, player_index), count);
        } else {
            self.ships.remove(&(system_id, player_index));
        }
    }

    pub fn set_ships(&mut self, system_id: i32, player_index: i32, count: i32) {
        if count > 0 {
            self.ships.insert((system_id, player_index), count);
        } else {
            self.ships.remove(&(system_id, player_index));
        }
    }

    /// Player indices with at least one ship at the system, ascending (neutral -1 first).
    pub fn players_present(&self, system_id: i32) -> Vec<i32> {
        self.ships.range((system_id, i32::MIN)..=(system_id, i32::MAX))
            .map(|((_, player_index), _)| *player_index)
            .collect()
    }

    /// Ship counts per player at the system, keyed by player index.
    pub fn ships_at(&self, system_id: i32) -> BTreeMap<i32, i32> {
        self.ships.range((system_id, i32::MIN)..=(system_id, i32::MAX))
            .map(|((_, player_index), count)| (*player_index, *count))
            .collect()
    }

    pub fn has_structure(&self, system_id: i32, kind: StructureKind) -> bool {
        self.structures.contains_key(&(system_id, kind))
    }

    pub fn structure_owner(&self, system_id: i32, kind: StructureKind) -> Option<i32> {
        self.structures.get(&(system_id, kind)).cloned()
    }

    pub fn set_structure(&mut self, system_id: i32, kind: StructureKind, player_index: i32) {
        self.structures.insert((system_id, kind), player_index);
    }

    /// Transfers every structure at the system to the new owner.
    pub fn transfer_structures(&mut self, system_id: i32, player_index: i32) {
        let kinds: Vec<StructureKind> = self.structures.keys()
            .filter(|(sid, _)| *sid == system_id)
            .map(|(_, kind)| *kind)
            .collect();
        for kind in kinds {
            self.structures.insert((system_id, kind), player_index);
        }
    }

    pub fn ship_groups(&self) -> Vec<ShipGroup> {
        self.ships.iter()
            .map(|((system_id, player_index), count)| ShipGroup {
                system_id: *system_id,
                player_index: *player_index,
                count: *count,
            })
            .collect()
    }

    pub fn structure_list(&self) -> Vec<Structure> {
        self.structures.iter()
            .map(|((system_id, kind), player_index)| Structure {
                system_id: *system_id,
                player_index: *player_index,
                kind: *kind,
            })
            .collect()
    }

    pub fn total_ships(&self) -> i32 {
        self.ships.values().sum()
    }
}

fn normalized(a: i32, b: i32) -> (i32, i32) {
    (a.min(b), a.max(b))
}

#[cfg(test)]
pub mod fixtures {
    use super::*;

    /// Small hand-built board used across the turn tests: a chain 1-2-3 plus Founder's
    /// World (0) linked to 2. Player 1 holds 1 and 2, player 2 holds 3.
    pub fn three_system_board() -> Board {
        let systems = vec![
            test_system(0, 5, 0, None, true),
            test_system(1, 5, 50, Some(1), false),
            test_system(2, 3, 0, Some(1), false),
            test_system(3, 5, 20, Some(2), false),
        ];
        let jump_lines = vec![
            JumpLine { from_system_id: 0, to_system_id: 2 },
            JumpLine { from_system_id: 1, to_system_id: 2 },
            JumpLine { from_system_id: 2, to_system_id: 3 },
        ];
        let ships = vec![
            ShipGroup { system_id: 0, player_index: -1, count: 300 },
            ShipGroup { system_id: 1, player_index: 1, count: 5 },
            ShipGroup { system_id: 3, player_index: 2, count: 5 },
        ];
        let structures = vec![
            Structure { system_id: 1, player_index: 1, kind: StructureKind::Mine },
            Structure { system_id: 1, player_index: 1, kind: StructureKind::Shipyard },
            Structure { system_id: 3, player_index: 2, kind: StructureKind::Mine },
            Structure { system_id: 3, player_index: 2, kind: StructureKind::Shipyard },
        ];
        Board::from_parts(systems, jump_lines, ships, structures)
    }

    pub fn test_system(
        system_id: i32,
        mining_value: i32,
        materials: i32,
        owner_player_index: Option<i32>,
        is_founders_world: bool,
    ) -> StarSystem {
        StarSystem {
            system_id,
            name: format!("System {}", system_id),
            x: 0.0,
            y: 0.0,
            mining_value,
            materials,
            cluster_id: if is_founders_world { -1 } else { system_id },
            is_home_system: owner_player_index.is_some(),
            is_founders_world,
            owner_player_index,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::fixtures::three_system_board;

    #[test]
    fn test_adjacency_is_undirected() {
        let board = three_system_board();
        assert_eq!(true, board.is_adjacent(1, 2));
        assert_eq!(true, board.is_adjacent(2, 1));
        assert_eq!(false, board.is_adjacent(1, 3));
    }

    #[test]
    fn test_zero_count_groups_are_dropped() {
        let mut board = three_system_board();
        board.add_ships(1, 1, -5);

        assert_eq!(0, board.ships_of(1, 1));
        assert_eq!(true, board.players_present(1).is_empty());
    }

    #[test]
    fn test_players_present_sorted_with_neutral_first() {
        let mut board = three_system_board();
        board.add_ships(0, 2, 4);
        board.add_ships(0, 1, 3);

        assert_eq!(vec![-1, 1, 2], board.players_present(0));
    }

    #[test]
    fn test_transfer_structures() {
        let mut board = three_system_board();
        board.transfer_structures(3, 1);

        assert_eq!(Some(1), board.structure_owner(3, StructureKind::Mine));
        assert_eq!(Some(1), board.structure_owner(3, StructureKind::Shipyard));
        assert_eq!(Some(1), board.structure_owner(1, StructureKind::Mine));
    }
}
