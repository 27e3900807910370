use std::collections::BTreeMap;
use serde::{Serialize, Deserialize};
use sqlx::{PgPool, PgConnection, pool::PoolConnection, postgres::{PgRow, PgQueryAs}, FromRow, Error, Transaction};
use sqlx_core::row::Row;
use crate::{
    lib::{Result, error::ServerError},
    game::rng::GameRng,
};

/// Chance for each ship to score a hit in one combat round.
pub const HIT_PROBABILITY: f64 = 0.5;

/// One side's line in a combat-log round.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Combatant {
    pub player_index: i32,
    pub ships_before: i32,
    pub hits_scored: i32,
    pub ships_after: i32,
}

/// One resolved round at one system.
#[derive(Debug, Clone, PartialEq)]
pub struct CombatRound {
    pub round_number: i32,
    pub combatants: Vec<Combatant>,
}

/// Fights out one contested system. `initial` holds the ship count of every side present
/// (the neutral garrison is side -1). Rounds run until at most one side still has ships:
/// every ship fires with [`HIT_PROBABILITY`]; with two sides each loses
/// `min(opponent hits, own count)`; with more, every hit picks a target ship uniformly from
/// all rival ships without pre-clamping, and losses are clamped per side at round end.
///
/// Returns the surviving counts and the per-round log. Sides are processed in ascending
/// player order, so the outcome is fully determined by `initial` and the RNG stream.
pub fn run_combat(
    initial: &BTreeMap<i32, i32>,
    rng: &mut GameRng,
) -> (BTreeMap<i32, i32>, Vec<CombatRound>) {
    let mut current: BTreeMap<i32, i32> = initial.iter()
        .filter(|(_, count)| **count > 0)
        .map(|(player, count)| (*player, *count))
        .collect();
    let mut rounds = vec![];
    let mut round_number = 1;

    while current.len() > 1 {
        let sides: Vec<i32> = current.keys().cloned().collect();
        let before = current.clone();

        let mut hits: BTreeMap<i32, i32> = BTreeMap::new();
        for side in sides.iter() {
            let mut scored = 0;
            for _ in 0..before[side] {
                if rng.uniform() < HIT_PROBABILITY {
                    scored += 1;
                }
            }
            hits.insert(*side, scored);
        }

        let mut losses: BTreeMap<i32, i32> = sides.iter().map(|side| (*side, 0)).collect();
        if sides.len() == 2 {
            losses.insert(sides[0], hits[&sides[1]].min(before[&sides[0]]));
            losses.insert(sides[1], hits[&sides[0]].min(before[&sides[1]]));
        } else {
            for attacker in sides.iter() {
                let rivals: Vec<i32> = sides.iter().cloned().filter(|side| side != attacker).collect();
                let weights: Vec<i32> = rivals.iter().map(|rival| before[rival]).collect();
                for _ in 0..hits[attacker] {
                    if let Some(index) = rng.weighted_choice(&weights) {
                        *losses.get_mut(&rivals[index]).unwrap() += 1;
                    }
                }
            }
        }

        for side in sides.iter() {
            let count = before[side];
            current.insert(*side, count - losses[side].min(count));
        }

        rounds.push(CombatRound {
            round_number,
            combatants: sides.iter().map(|side| Combatant {
                player_index: *side,
                ships_before: before[side],
                hits_scored: hits[side],
                ships_after: current[side],
            }).collect(),
        });

        current = current.into_iter().filter(|(_, count)| *count > 0).collect();
        round_number += 1;
    }
    (current, rounds)
}

/// Persisted combat-log entry; combatants are stored as a JSON document.
#[derive(Debug, Serialize, Clone)]
pub struct CombatLog {
    pub turn_id: i32,
    pub system_id: i32,
    pub round_number: i32,
    pub combatants_json: String,
}

impl<'a> FromRow<'a, PgRow<'a>> for CombatLog {
    fn from_row(row: &PgRow) -> std::result::Result<Self, Error> {
        Ok(CombatLog {
            turn_id: row.try_get("turn_id")?,
            system_id: row.try_get("system_id")?,
            round_number: row.try_get("round_number")?,
            combatants_json: row.try_get("combatants")?,
        })
    }
}

impl CombatLog {
    pub fn from_round(turn_id: i32, system_id: i32, round: &CombatRound) -> CombatLog {
        CombatLog {
            turn_id,
            system_id,
            round_number: round.round_number,
            combatants_json: serde_json::to_string(&round.combatants).unwrap_or_default(),
        }
    }

    pub async fn find_by_turn(turn_id: i32, game_pool: &PgPool) -> Result<Vec<CombatLog>> {
        sqlx::query_as("SELECT * FROM combat_logs WHERE turn_id = $1 ORDER BY system_id, round_number")
            .bind(turn_id)
            .fetch_all(game_pool).await.map_err(ServerError::from)
    }

    pub async fn create(log: &CombatLog, tx: &mut Transaction<PoolConnection<PgConnection>>) -> Result<u64> {
        sqlx::query("INSERT INTO combat_logs (turn_id, system_id, round_number, combatants) VALUES($1, $2, $3, $4)")
            .bind(log.turn_id)
            .bind(log.system_id)
            .bind(log.round_number)
            .bind(&log.combatants_json)
            .execute(tx).await.map_err(ServerError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(pairs: &[(i32, i32)]) -> BTreeMap<i32, i32> {
        pairs.iter().cloned().collect()
    }

    #[test]
    fn test_combat_ends_with_at_most_one_side() {
        let mut rng = GameRng::for_turn(42, 1);
        let (survivors, rounds) = run_combat(&counts(&[(1, 10), (2, 10)]), &mut rng);

        assert!(survivors.len() <= 1);
        assert!(!rounds.is_empty());
    }

    #[test]
    fn test_combat_is_deterministic_per_turn_stream() {
        let first = run_combat(&counts(&[(1, 12), (2, 9)]), &mut GameRng::for_turn(7, 3));
        let second = run_combat(&counts(&[(1, 12), (2, 9)]), &mut GameRng::for_turn(7, 3));

        assert_eq!(first.0, second.0);
        assert_eq!(first.1, second.1);
    }

    #[test]
    fn test_rounds_are_monotonic() {
        let mut rng = GameRng::for_turn(11, 2);
        let (_, rounds) = run_combat(&counts(&[(1, 20), (2, 15), (3, 10)]), &mut rng);

        for round in rounds.iter() {
            for combatant in round.combatants.iter() {
                assert!(combatant.ships_after <= combatant.ships_before);
                assert!(combatant.ships_after >= 0);
                assert!(combatant.hits_scored <= combatant.ships_before);
            }
        }
    }

    #[test]
    fn test_two_sided_losses_follow_opponent_hits() {
        let mut rng = GameRng::for_turn(5, 1);
        let (_, rounds) = run_combat(&counts(&[(1, 8), (2, 6)]), &mut rng);

        for round in rounds.iter() {
            let side_1 = round.combatants.iter().find(|c| c.player_index == 1).unwrap();
            let side_2 = round.combatants.iter().find(|c| c.player_index == 2).unwrap();
            assert_eq!(
                side_1.ships_before - side_1.ships_after,
                side_2.hits_scored.min(side_1.ships_before)
            );
            assert_eq!(
                side_2.ships_before - side_2.ships_after,
                side_1.hits_scored.min(side_2.ships_before)
            );
        }
    }

    #[test]
    fn test_multi_sided_losses_never_exceed_hits() {
        let mut rng = GameRng::for_turn(99, 4);
        let (_, rounds) = run_combat(&counts(&[(-1, 10), (1, 10), (2, 10)]), &mut rng);

        for round in rounds.iter() {
            let total_hits: i32 = round.combatants.iter().map(|c| c.hits_scored).sum();
            let total_losses: i32 = round.combatants.iter()
                .map(|c| c.ships_before - c.ships_after)
                .sum();
            assert!(total_losses <= total_hits);
        }
    }

    #[test]
    fn test_neutral_garrison_fights_as_a_side() {
        let mut rng = GameRng::for_turn(3, 1);
        let (_, rounds) = run_combat(&counts(&[(-1, 300), (1, 5)]), &mut rng);

        assert!(rounds[0].combatants.iter().any(|c| c.player_index == -1));
    }

    #[test]
    fn test_lone_side_never_fights() {
        let mut rng = GameRng::for_turn(1, 1);
        let (survivors, rounds) = run_combat(&counts(&[(1, 10)]), &mut rng);

        assert_eq!(10, survivors[&1]);
        assert!(rounds.is_empty());
    }

    #[test]
    fn test_round_log_serializes() {
        let mut rng = GameRng::for_turn(2, 2);
        let (_, rounds) = run_combat(&counts(&[(1, 4), (2, 4)]), &mut rng);
        let log = CombatLog::from_round(1, 9, &rounds[0]);

        let parsed: Vec<Combatant> = serde_json::from_str(&log.combatants_json).unwrap();
        assert_eq!(rounds[0].combatants, parsed);
    }
}
