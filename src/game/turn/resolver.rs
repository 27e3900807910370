use sqlx::{PgPool, PgConnection, pool::PoolConnection, Transaction};
use crate::{
    lib::{Result, error::InternalError, time::Time},
    game::{
        board::Board,
        game::Game,
        rng::GameRng,
        ship::{ShipGroup, NEUTRAL_PLAYER_INDEX},
        structure::{Structure, StructureKind},
        system::StarSystem,
        turn::{
            combat::{run_combat, CombatLog, CombatRound},
            order::{Order, OrderKind, SHIPYARD_COST, SHIP_COST},
            snapshot::TurnSnapshot,
            PlayerTurnStatus, Turn,
        },
    },
};

/// All combat fought at one system during a resolution.
#[derive(Debug, Clone)]
pub struct SystemCombat {
    pub system_id: i32,
    pub rounds: Vec<CombatRound>,
}

/// Result of the pure resolution pipeline over a board.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub combat: Vec<SystemCombat>,
    pub founders_world_owner: Option<i32>,
}

/// What the caller needs after the per-game transaction committed.
#[derive(Debug, Clone, Copy)]
pub struct ResolutionOutcome {
    pub next_turn: i32,
    pub founders_world_owner: Option<i32>,
}

/// The deterministic resolution pipeline. Steps run in a fixed order (mines, shipyards,
/// ships, moves, combat, ownership, production) and effects within a step commute, so the
/// next board state is a pure function of `(board, orders, rng)`.
pub fn resolve_orders(board: &mut Board, orders: &[Order], rng: &mut GameRng) -> Resolution {
    // Mines created by this resolution only start producing next turn
    let fresh_mines: std::collections::BTreeSet<i32> = orders.iter()
        .filter_map(|o| match &o.kind {
            OrderKind::BuildMine { source, .. } => Some(*source),
            _ => None,
        })
        .collect();

    // Step 1: build mines
    for order in orders.iter() {
        if let OrderKind::BuildMine { source, donors } = &order.kind {
            board.set_structure(*source, StructureKind::Mine, order.player_index);
            for donor in donors.iter() {
                if let Some(system) = board.system_mut(donor.system_id) {
                    system.materials -= donor.amount;
                }
            }
        }
    }

    // Step 2: build shipyards
    for order in orders.iter() {
        if let OrderKind::BuildShipyard { source } = &order.kind {
            board.set_structure(*source, StructureKind::Shipyard, order.player_index);
            if let Some(system) = board.system_mut(*source) {
                system.materials -= SHIPYARD_COST;
            }
        }
    }

    // Step 3: build ships
    for order in orders.iter() {
        if let OrderKind::BuildShips { source, quantity } = &order.kind {
            if let Some(system) = board.system_mut(*source) {
                system.materials -= *quantity * SHIP_COST;
            }
            board.add_ships(*source, order.player_index, *quantity);
        }
    }

    // Step 4: move ships. All sources are debited before any combat resolves, so
    // simultaneous swaps pass each other in flight.
    for order in orders.iter() {
        if let OrderKind::MoveShips { source, target, quantity } = &order.kind {
            board.add_ships(*source, order.player_index, -*quantity);
            board.add_ships(*target, order.player_index, *quantity);
        }
    }

    let system_ids: Vec<i32> = board.systems.keys().cloned().collect();

    // Step 5: combat, in ascending system order so the RNG stream is consumed
    // deterministically.
    let mut combat = vec![];
    for system_id in system_ids.iter().cloned() {
        let counts = board.ships_at(system_id);
        if counts.len() < 2 {
            continue;
        }
        let (survivors, rounds) = run_combat(&counts, rng);
        for player_index in counts.keys() {
            board.set_ships(system_id, *player_index, survivors.get(player_index).cloned().unwrap_or(0));
        }
        combat.push(SystemCombat { system_id, rounds });
    }

    // Step 6: ownership transitions: a lone occupier takes the system and its structures,
    // the neutral garrison included.
    for system_id in system_ids.iter().cloned() {
        let present = board.players_present(system_id);
        if present.len() != 1 {
            continue;
        }
        let new_owner = present[0];
        let current = board.system(system_id).and_then(|s| s.owner_player_index);
        if current == Some(new_owner) {
            continue;
        }
        if let Some(system) = board.system_mut(system_id) {
            system.owner_player_index = Some(new_owner);
        }
        board.transfer_structures(system_id, new_owner);
    }

    // Step 7: mine production. Only a pre-existing, owner-aligned mine produces.
    for system_id in system_ids.iter().cloned() {
        if fresh_mines.contains(&system_id) {
            continue;
        }
        let owner = match board.system(system_id).and_then(|s| s.owner_player_index) {
            Some(owner) => owner,
            None => continue,
        };
        if board.structure_owner(system_id, StructureKind::Mine) != Some(owner) {
            continue;
        }
        if let Some(system) = board.system_mut(system_id) {
            system.materials += system.mining_value;
        }
    }

    let founders_world_owner = board.systems.values()
        .find(|s| s.is_founders_world)
        .and_then(|s| s.owner_player_index);

    Resolution { combat, founders_world_owner }
}

/// Runs the full pipeline for one turn inside the per-game transaction: pure resolution over
/// the loaded board, then write-back, combat log, snapshot and turn advancement. Everything
/// commits or nothing does; a failure leaves the turn `active` with no partial effects.
pub async fn resolve_in_tx(
    game: &Game,
    turn_id: i32,
    game_pool: &PgPool,
    tx: &mut Transaction<PoolConnection<PgConnection>>,
) -> Result<ResolutionOutcome> {
    let seed = game.seed.ok_or(InternalError::Conflict)? as u32;
    let mut board = Board::load(game_pool).await?;
    let orders = Order::find_by_turn(turn_id, game_pool).await?;
    let mut rng = GameRng::for_turn(seed, turn_id);

    let resolution = resolve_orders(&mut board, &orders, &mut rng);

    for system in board.systems.values() {
        StarSystem::update_state(system, tx).await?;
    }
    ShipGroup::delete_all(tx).await?;
    for group in board.ship_groups() {
        ShipGroup::create(&group, tx).await?;
    }
    Structure::delete_all(tx).await?;
    for structure in board.structure_list() {
        Structure::create(&structure, tx).await?;
    }
    for system_combat in resolution.combat.iter() {
        for round in system_combat.rounds.iter() {
            CombatLog::create(&CombatLog::from_round(turn_id, system_combat.system_id, round), tx).await?;
        }
    }

    // Step 8: snapshot of the post-production state plus the resolved orders
    TurnSnapshot::create(&TurnSnapshot::capture(turn_id, &board, &orders), tx).await?;

    // Step 9: finalize, resolving this turn and opening the next one
    Turn::mark_resolved(turn_id, Time::now(), tx).await?;
    Turn::create(turn_id + 1, tx).await?;
    for player_index in 1..=game.num_players {
        PlayerTurnStatus::create(turn_id + 1, player_index, tx).await?;
    }

    log::info!(
        "game {} turn {} resolved: {} orders, combat at {} systems",
        game.game_id, turn_id, orders.len(), resolution.combat.len()
    );
    Ok(ResolutionOutcome {
        next_turn: turn_id + 1,
        founders_world_owner: resolution.founders_world_owner,
    })
}

/// Applies the admin-side effects after the per-game transaction committed: the turn clock,
/// and the victory transition when a real player holds Founder's World.
pub async fn finalize_admin(game: &Game, outcome: &ResolutionOutcome, admin_pool: &PgPool) -> Result<()> {
    Game::advance_turn(game.game_id, outcome.next_turn, admin_pool).await?;

    if let Some(winner) = outcome.founders_world_owner {
        if winner != NEUTRAL_PLAYER_INDEX {
            Game::complete(game.game_id, winner, admin_pool).await?;
            log::info!("game {} completed, winner: player {}", game.game_id, winner);
        }
    }
    Ok(())
}
