pub mod combat;
pub mod order;
pub mod resolver;
pub mod snapshot;

use actix_web::{get, post, web, HttpResponse};
use serde::{Serialize, Deserialize};
use sqlx::{PgPool, PgConnection, pool::PoolConnection, postgres::{PgRow, PgQueryAs}, FromRow, Error, Transaction};
use sqlx_core::row::Row;
use crate::{
    AppState,
    lib::{
        Result,
        auth::Claims,
        error::{ServerError, InternalError},
        time::Time,
    },
    game::{
        game::{Game, GameStatus},
        player::GamePlayer,
    },
};

#[derive(Debug, Serialize, Deserialize, Copy, Clone, PartialEq, sqlx::Type)]
#[sqlx(rename = "VARCHAR")]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all(serialize = "snake_case", deserialize = "snake_case"))]
pub enum TurnStatus {
    Active,
    Resolved,
}

/// One game turn. Exactly one turn is `active` at a time; resolution flips it to `resolved`
/// and inserts the next active turn.
#[derive(Debug, Serialize, Clone)]
pub struct Turn {
    pub turn_id: i32,
    pub status: TurnStatus,
    pub resolved_at: Option<Time>,
}

/// Per-player submission flag for one turn. `submitted` only ever goes false to true.
#[derive(Debug, Serialize, Clone)]
pub struct PlayerTurnStatus {
    pub turn_id: i32,
    pub player_index: i32,
    pub submitted: bool,
    pub submitted_at: Option<Time>,
}

impl<'a> FromRow<'a, PgRow<'a>> for Turn {
    fn from_row(row: &PgRow) -> std::result::Result<Self, Error> {
        Ok(Turn {
            turn_id: row.try_get("turn_id")?,
            status: row.try_get("status")?,
            resolved_at: row.try_get("resolved_at").ok(),
        })
    }
}

impl<'a> FromRow<'a, PgRow<'a>> for PlayerTurnStatus {
    fn from_row(row: &PgRow) -> std::result::Result<Self, Error> {
        Ok(PlayerTurnStatus {
            turn_id: row.try_get("turn_id")?,
            player_index: row.try_get("player_index")?,
            submitted: row.try_get("submitted")?,
            submitted_at: row.try_get("submitted_at").ok(),
        })
    }
}

impl Turn {
    pub async fn find(turn_id: i32, game_pool: &PgPool) -> Result<Turn> {
        sqlx::query_as("SELECT * FROM turns WHERE turn_id = $1")
            .bind(turn_id)
            .fetch_one(game_pool).await.map_err(ServerError::if_row_not_found("turn"))
    }

    /// Takes the row lock that serializes submissions and resolutions for this turn.
    pub async fn lock(turn_id: i32, tx: &mut Transaction<PoolConnection<PgConnection>>) -> Result<Turn> {
        sqlx::query_as("SELECT * FROM turns WHERE turn_id = $1 FOR UPDATE")
            .bind(turn_id)
            .fetch_one(&mut *tx).await.map_err(ServerError::if_row_not_found("turn"))
    }

    pub async fn create(turn_id: i32, tx: &mut Transaction<PoolConnection<PgConnection>>) -> Result<u64> {
        sqlx::query("INSERT INTO turns (turn_id, status) VALUES($1, $2)")
            .bind(turn_id)
            .bind(TurnStatus::Active)
            .execute(tx).await.map_err(ServerError::from)
    }

    pub async fn mark_resolved(turn_id: i32, resolved_at: Time, tx: &mut Transaction<PoolConnection<PgConnection>>) -> Result<u64> {
        sqlx::query("UPDATE turns SET status = $2, resolved_at = $3 WHERE turn_id = $1")
            .bind(turn_id)
            .bind(TurnStatus::Resolved)
            .bind(resolved_at)
            .execute(tx).await.map_err(ServerError::from)
    }
}

impl PlayerTurnStatus {
    pub async fn find_by_turn(turn_id: i32, game_pool: &PgPool) -> Result<Vec<PlayerTurnStatus>> {
        sqlx::query_as("SELECT * FROM player_turn_status WHERE turn_id = $1 ORDER BY player_index")
            .bind(turn_id)
            .fetch_all(game_pool).await.map_err(ServerError::from)
    }

    pub async fn find_in_tx(turn_id: i32, player_index: i32, tx: &mut Transaction<PoolConnection<PgConnection>>) -> Result<PlayerTurnStatus> {
        sqlx::query_as("SELECT * FROM player_turn_status WHERE turn_id = $1 AND player_index = $2")
            .bind(turn_id)
            .bind(player_index)
            .fetch_one(&mut *tx).await.map_err(ServerError::if_row_not_found("player turn status"))
    }

    pub async fn create(turn_id: i32, player_index: i32, tx: &mut Transaction<PoolConnection<PgConnection>>) -> Result<u64> {
        sqlx::query("INSERT INTO player_turn_status (turn_id, player_index, submitted) VALUES($1, $2, FALSE)")
            .bind(turn_id)
            .bind(player_index)
            .execute(tx).await.map_err(ServerError::from)
    }

    pub async fn mark_submitted(turn_id: i32, player_index: i32, submitted_at: Time, tx: &mut Transaction<PoolConnection<PgConnection>>) -> Result<u64> {
        sqlx::query("UPDATE player_turn_status SET submitted = TRUE, submitted_at = $3 WHERE turn_id = $1 AND player_index = $2 AND submitted = FALSE")
            .bind(turn_id)
            .bind(player_index)
            .bind(submitted_at)
            .execute(tx).await.map_err(ServerError::from)
    }

    pub async fn count_unsubmitted(turn_id: i32, tx: &mut Transaction<PoolConnection<PgConnection>>) -> Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM player_turn_status WHERE turn_id = $1 AND submitted = FALSE")
            .bind(turn_id)
            .fetch_one(&mut *tx).await.map_err(ServerError::from)?;
        Ok(count.0)
    }
}

#[derive(Serialize)]
pub struct TurnStatusView {
    pub player_index: i32,
    pub username: String,
    pub submitted: bool,
    pub submitted_at: Option<Time>,
}

#[derive(Serialize)]
struct SubmitResponse {
    submitted: bool,
    turn_resolved: bool,
}

/// Submission gate. Flips the caller's flag under the turn-row lock and, when the last
/// active player lands, runs the whole resolution pipeline inside the same transaction.
/// Concurrent submitters serialize on the lock so exactly one of them resolves the turn.
#[post("/{game_id}/turns/{turn_id}/submit")]
pub async fn submit_turn(state: web::Data<AppState>, info: web::Path<(i32, i32)>, claims: Claims) -> Result<HttpResponse> {
    let (game_id, turn_id) = (info.0, info.1);
    let game = Game::find(game_id, &state.db_pool).await?;
    if game.status != GameStatus::Active {
        Err(InternalError::Conflict)?
    }
    let player_index = GamePlayer::find_index(game_id, claims.uid, &state.db_pool).await?;
    let game_pool = state.stores.pool(game_id).await?;

    let mut tx = game_pool.begin().await?;
    let turn = Turn::lock(turn_id, &mut tx).await?;
    if turn.status != TurnStatus::Active {
        Err(InternalError::Conflict)?
    }
    let status = PlayerTurnStatus::find_in_tx(turn_id, player_index, &mut tx).await?;
    if status.submitted {
        Err(InternalError::AlreadySubmitted)?
    }
    PlayerTurnStatus::mark_submitted(turn_id, player_index, Time::now(), &mut tx).await?;

    let remaining = PlayerTurnStatus::count_unsubmitted(turn_id, &mut tx).await?;
    let outcome = if remaining == 0 {
        Some(resolver::resolve_in_tx(&game, turn_id, &game_pool, &mut tx).await?)
    } else {
        None
    };
    tx.commit().await?;

    if let Some(outcome) = outcome.as_ref() {
        resolver::finalize_admin(&game, outcome, &state.db_pool).await?;
    }
    Ok(HttpResponse::Ok().json(SubmitResponse {
        submitted: true,
        turn_resolved: outcome.is_some(),
    }))
}

/// Submission status of every player for one turn.
#[get("/{game_id}/turns/{turn_id}/status")]
pub async fn get_turn_status(state: web::Data<AppState>, info: web::Path<(i32, i32)>, _claims: Claims) -> Result<HttpResponse> {
    let (game_id, turn_id) = (info.0, info.1);
    let game = Game::find(game_id, &state.db_pool).await?;
    let game_pool = state.stores.pool(game.game_id).await?;

    Turn::find(turn_id, &game_pool).await?;
    let statuses = PlayerTurnStatus::find_by_turn(turn_id, &game_pool).await?;
    let roster = GamePlayer::roster(game_id, &state.db_pool).await?;

    let view: Vec<TurnStatusView> = statuses.into_iter().map(|status| {
        let username = roster.iter()
            .find(|entry| entry.player_index == status.player_index)
            .map(|entry| entry.username.clone())
            .unwrap_or_default();
        TurnStatusView {
            player_index: status.player_index,
            username,
            submitted: status.submitted,
            submitted_at: status.submitted_at,
        }
    }).collect();

    Ok(HttpResponse::Ok().json(view))
}
