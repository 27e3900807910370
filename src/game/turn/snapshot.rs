use actix_web::{get, web, HttpResponse};
use serde::Serialize;
use sqlx::{PgPool, PgConnection, pool::PoolConnection, postgres::{PgRow, PgQueryAs}, FromRow, Error, Transaction};
use sqlx_core::row::Row;
use crate::{
    AppState,
    lib::{Result, error::ServerError},
    game::{
        board::Board,
        game::Game,
        turn::{
            combat::{CombatLog, Combatant},
            order::{Order, OrderView},
        },
    },
};

/// Immutable dump of the whole game state right after a turn resolved. `turn_id` 0 holds the
/// initial board written at map generation; snapshot k is written while resolving turn k.
#[derive(Debug, Clone)]
pub struct TurnSnapshot {
    pub turn_id: i32,
    pub systems_json: String,
    pub ships_json: String,
    pub structures_json: String,
    pub orders_json: String,
}

impl<'a> FromRow<'a, PgRow<'a>> for TurnSnapshot {
    fn from_row(row: &PgRow) -> std::result::Result<Self, Error> {
        Ok(TurnSnapshot {
            turn_id: row.try_get("turn_id")?,
            systems_json: row.try_get("systems")?,
            ships_json: row.try_get("ships")?,
            structures_json: row.try_get("structures")?,
            orders_json: row.try_get("orders")?,
        })
    }
}

impl TurnSnapshot {
    /// Serializes the board and the resolved orders. Serializing our own types cannot fail,
    /// so this stays infallible.
    pub fn capture(turn_id: i32, board: &Board, orders: &[Order]) -> TurnSnapshot {
        let systems: Vec<_> = board.systems.values().collect();
        let order_views: Vec<OrderView> = orders.iter().map(Order::view).collect();
        TurnSnapshot {
            turn_id,
            systems_json: serde_json::to_string(&systems).unwrap_or_default(),
            ships_json: serde_json::to_string(&board.ship_groups()).unwrap_or_default(),
            structures_json: serde_json::to_string(&board.structure_list()).unwrap_or_default(),
            orders_json: serde_json::to_string(&order_views).unwrap_or_default(),
        }
    }

    pub async fn find(turn_id: i32, game_pool: &PgPool) -> Result<TurnSnapshot> {
        sqlx::query_as("SELECT * FROM turn_snapshots WHERE turn_id = $1")
            .bind(turn_id)
            .fetch_one(game_pool).await.map_err(ServerError::if_row_not_found("snapshot"))
    }

    pub async fn create(snapshot: &TurnSnapshot, tx: &mut Transaction<PoolConnection<PgConnection>>) -> Result<u64> {
        sqlx::query("INSERT INTO turn_snapshots (turn_id, systems, ships, structures, orders) VALUES($1, $2, $3, $4, $5)")
            .bind(snapshot.turn_id)
            .bind(&snapshot.systems_json)
            .bind(&snapshot.ships_json)
            .bind(&snapshot.structures_json)
            .bind(&snapshot.orders_json)
            .execute(tx).await.map_err(ServerError::from)
    }
}

#[derive(Serialize)]
pub struct CombatLogView {
    pub turn_id: i32,
    pub system_id: i32,
    pub round_number: i32,
    pub combatants: Vec<Combatant>,
}

/// Snapshot plus the turn's combat log, for replay.
#[derive(Serialize)]
pub struct SnapshotView {
    pub turn_id: i32,
    pub systems: serde_json::Value,
    pub ships: serde_json::Value,
    pub structures: serde_json::Value,
    pub orders: serde_json::Value,
    pub combat_logs: Vec<CombatLogView>,
}

#[get("/{game_id}/turns/{turn_id}/snapshot")]
pub async fn get_snapshot(state: web::Data<AppState>, info: web::Path<(i32, i32)>) -> Result<HttpResponse> {
    let (game_id, turn_id) = (info.0, info.1);
    let game = Game::find(game_id, &state.db_pool).await?;
    let game_pool = state.stores.pool(game.game_id).await?;

    let snapshot = TurnSnapshot::find(turn_id, &game_pool).await?;
    let combat_logs = CombatLog::find_by_turn(turn_id, &game_pool).await?
        .into_iter()
        .map(|log| Ok(CombatLogView {
            turn_id: log.turn_id,
            system_id: log.system_id,
            round_number: log.round_number,
            combatants: serde_json::from_str(&log.combatants_json)?,
        }))
        .collect::<Result<Vec<CombatLogView>>>()?;

    Ok(HttpResponse::Ok().json(SnapshotView {
        turn_id: snapshot.turn_id,
        systems: serde_json::from_str(&snapshot.systems_json)?,
        ships: serde_json::from_str(&snapshot.ships_json)?,
        structures: serde_json::from_str(&snapshot.structures_json)?,
        orders: serde_json::from_str(&snapshot.orders_json)?,
        combat_logs,
    }))
}
