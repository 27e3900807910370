use actix_web::{get, web, HttpResponse};
use serde::{Serialize, Deserialize};
use sqlx::{PgPool, PgConnection, pool::PoolConnection, postgres::{PgRow, PgQueryAs}, FromRow, Error, Transaction};
use sqlx_core::row::Row;
use crate::{
    AppState,
    lib::{
        Result,
        error::{ServerError, InternalError},
    },
    game::{
        game::{Game, GameStatus},
        player::PlayerView,
        ship::ShipGroup,
        structure::Structure,
    },
};

/// One star system of a generated map, including its live economy state.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct StarSystem {
    pub system_id: i32,
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub mining_value: i32,
    pub materials: i32,
    pub cluster_id: i32,
    pub is_home_system: bool,
    pub is_founders_world: bool,
    pub owner_player_index: Option<i32>,
}

/// Undirected jump line between two systems; ships can only move along these.
#[derive(Debug, Serialize, Deserialize, Clone, Copy)]
pub struct JumpLine {
    pub from_system_id: i32,
    pub to_system_id: i32,
}

impl<'a> FromRow<'a, PgRow<'a>> for StarSystem {
    fn from_row(row: &PgRow) -> std::result::Result<Self, Error> {
        Ok(StarSystem {
            system_id: row.try_get("system_id")?,
            name: row.try_get("name")?,
            x: row.try_get("x")?,
            y: row.try_get("y")?,
            mining_value: row.try_get("mining_value")?,
            materials: row.try_get("materials")?,
            cluster_id: row.try_get("cluster_id")?,
            is_home_system: row.try_get("is_home_system")?,
            is_founders_world: row.try_get("is_founders_world")?,
            owner_player_index: row.try_get("owner_player_index").ok(),
        })
    }
}

impl<'a> FromRow<'a, PgRow<'a>> for JumpLine {
    fn from_row(row: &PgRow) -> std::result::Result<Self, Error> {
        Ok(JumpLine {
            from_system_id: row.try_get("from_system_id")?,
            to_system_id: row.try_get("to_system_id")?,
        })
    }
}

impl StarSystem {
    pub async fn find(system_id: i32, game_pool: &PgPool) -> Result<StarSystem> {
        sqlx::query_as("SELECT * FROM star_systems WHERE system_id = $1")
            .bind(system_id)
            .fetch_one(game_pool).await.map_err(ServerError::if_row_not_found("system"))
    }

    pub async fn find_all(game_pool: &PgPool) -> Result<Vec<StarSystem>> {
        sqlx::query_as("SELECT * FROM star_systems ORDER BY system_id")
            .fetch_all(game_pool).await.map_err(ServerError::from)
    }

    pub async fn create(s: &StarSystem, tx: &mut Transaction<PoolConnection<PgConnection>>) -> Result<u64> {
        sqlx::query(
            "INSERT INTO star_systems
            (system_id, name, x, y, mining_value, materials, cluster_id, is_home_system, is_founders_world, owner_player_index)
            VALUES($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)")
            .bind(s.system_id)
            .bind(&s.name)
            .bind(s.x)
            .bind(s.y)
            .bind(s.mining_value)
            .bind(s.materials)
            .bind(s.cluster_id)
            .bind(s.is_home_system)
            .bind(s.is_founders_world)
            .bind(s.owner_player_index)
            .execute(tx).await.map_err(ServerError::from)
    }

    /// Writes back the mutable part of a system: materials and ownership.
    pub async fn update_state(s: &StarSystem, tx: &mut Transaction<PoolConnection<PgConnection>>) -> Result<u64> {
        sqlx::query("UPDATE star_systems SET materials = $2, owner_player_index = $3 WHERE system_id = $1")
            .bind(s.system_id)
            .bind(s.materials)
            .bind(s.owner_player_index)
            .execute(tx).await.map_err(ServerError::from)
    }
}

impl JumpLine {
    pub async fn find_all(game_pool: &PgPool) -> Result<Vec<JumpLine>> {
        sqlx::query_as("SELECT * FROM jump_lines ORDER BY from_system_id, to_system_id")
            .fetch_all(game_pool).await.map_err(ServerError::from)
    }

    pub async fn create(jl: &JumpLine, tx: &mut Transaction<PoolConnection<PgConnection>>) -> Result<u64> {
        sqlx::query("INSERT INTO jump_lines (from_system_id, to_system_id) VALUES($1, $2)")
            .bind(jl.from_system_id)
            .bind(jl.to_system_id)
            .execute(tx).await.map_err(ServerError::from)
    }
}

/// Current map plus the live overlay served to the front end.
#[derive(Serialize)]
pub struct MapView {
    pub systems: Vec<StarSystem>,
    pub jump_lines: Vec<JumpLine>,
    pub ships: Vec<ShipGroup>,
    pub structures: Vec<Structure>,
    pub players: Vec<PlayerView>,
    pub current_turn: i32,
    pub status: GameStatus,
}

#[get("/{game_id}/map")]
pub async fn get_map(state: web::Data<AppState>, info: web::Path<(i32,)>) -> Result<HttpResponse> {
    let game = Game::find(info.0, &state.db_pool).await?;
    let game_pool = state.stores.pool(game.game_id).await?;

    let systems = StarSystem::find_all(&game_pool).await?;
    if systems.is_empty() {
        Err(InternalError::NotFound("map"))?
    }
    let players = PlayerView::assemble(&game, &systems, &state.db_pool).await?;

    Ok(HttpResponse::Ok().json(MapView {
        jump_lines: JumpLine::find_all(&game_pool).await?,
        ships: ShipGroup::find_all(&game_pool).await?,
        structures: Structure::find_all(&game_pool).await?,
        players,
        current_turn: game.current_turn,
        status: game.status,
        systems,
    }))
}
