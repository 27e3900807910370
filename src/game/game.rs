use actix_web::{delete, get, post, web, HttpResponse};
use serde::{Serialize, Deserialize};
use sqlx::{PgPool, PgConnection, pool::PoolConnection, postgres::{PgRow, PgQueryAs}, FromRow, Error, Transaction};
use sqlx_core::row::Row;
use crate::{
    AppState, is_dev_mode,
    lib::{
        Result,
        auth::Claims,
        error::{ServerError, InternalError},
        time::Time,
    },
    game::{
        board::Board,
        map::generator::{generate_map, MIN_PLAYERS, MAX_PLAYERS},
        player::GamePlayer,
        rng::{GameRng, MAX_SEED},
        ship::{ShipGroup, NEUTRAL_PLAYER_INDEX},
        structure::{Structure, StructureKind},
        system::{JumpLine, StarSystem},
        turn::{resolver, snapshot::TurnSnapshot, PlayerTurnStatus, Turn, TurnStatus},
        user::User,
    },
};

/// Ships of the neutral garrison placed on Founder's World at game start.
pub const FOUNDERS_WORLD_GARRISON: i32 = 300;
/// Ships every player starts with on their home system.
pub const HOME_SYSTEM_SHIPS: i32 = 1;

#[derive(Debug, Serialize, Deserialize, Copy, Clone, PartialEq, sqlx::Type)]
#[sqlx(rename = "VARCHAR")]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all(serialize = "snake_case", deserialize = "snake_case"))]
pub enum GameStatus {
    Open,
    Active,
    Completed,
}

/// Admin-store record of one game. The per-game board lives in its own database, named by
/// `db_name` and reached through the store manager.
#[derive(Debug, Serialize, Clone)]
pub struct Game {
    pub game_id: i32,
    pub name: String,
    pub num_players: i32,
    pub status: GameStatus,
    pub creator_id: i32,
    pub seed: Option<i32>,
    pub db_name: Option<String>,
    pub current_turn: i32,
    pub winner_player_index: Option<i32>,
    pub created_at: Time,
}

impl<'a> FromRow<'a, PgRow<'a>> for Game {
    fn from_row(row: &PgRow) -> std::result::Result<Self, Error> {
        Ok(Game {
            game_id: row.try_get("game_id")?,
            name: row.try_get("name")?,
            num_players: row.try_get("num_players")?,
            status: row.try_get("status")?,
            creator_id: row.try_get("creator_id")?,
            seed: row.try_get("seed").ok(),
            db_name: row.try_get("db_name").ok(),
            current_turn: row.try_get("current_turn")?,
            winner_player_index: row.try_get("winner_player_index").ok(),
            created_at: row.try_get("created_at")?,
        })
    }
}

/// Game row enriched with the roster size and the caller's membership, for the list views.
#[derive(Serialize)]
pub struct GameSummary {
    #[serde(flatten)]
    pub game: Game,
    pub player_count: i64,
    pub is_member: bool,
}

impl<'a> FromRow<'a, PgRow<'a>> for GameSummary {
    fn from_row(row: &PgRow) -> std::result::Result<Self, Error> {
        Ok(GameSummary {
            game: Game::from_row(row)?,
            player_count: row.try_get("player_count")?,
            is_member: row.try_get("is_member")?,
        })
    }
}

const SUMMARY_QUERY: &str =
    "SELECT g.*,
        (SELECT COUNT(*) FROM game_players gp WHERE gp.game_id = g.game_id) AS player_count,
        EXISTS(SELECT 1 FROM game_players gp WHERE gp.game_id = g.game_id AND gp.user_id = $1) AS is_member
    FROM games g";

impl Game {
    pub async fn find(game_id: i32, db_pool: &PgPool) -> Result<Game> {
        sqlx::query_as("SELECT * FROM games WHERE game_id = $1")
            .bind(game_id)
            .fetch_one(db_pool).await.map_err(ServerError::if_row_not_found("game"))
    }

    pub async fn lock(game_id: i32, tx: &mut Transaction<PoolConnection<PgConnection>>) -> Result<Game> {
        sqlx::query_as("SELECT * FROM games WHERE game_id = $1 FOR UPDATE")
            .bind(game_id)
            .fetch_one(&mut *tx).await.map_err(ServerError::if_row_not_found("game"))
    }

    pub async fn find_summary(game_id: i32, user_id: i32, db_pool: &PgPool) -> Result<GameSummary> {
        sqlx::query_as(&format!("{} WHERE g.game_id = $2", SUMMARY_QUERY))
            .bind(user_id)
            .bind(game_id)
            .fetch_one(db_pool).await.map_err(ServerError::if_row_not_found("game"))
    }

    pub async fn find_summaries(user_id: i32, db_pool: &PgPool) -> Result<Vec<GameSummary>> {
        sqlx::query_as(&format!("{} ORDER BY g.game_id", SUMMARY_QUERY))
            .bind(user_id)
            .fetch_all(db_pool).await.map_err(ServerError::from)
    }

    pub async fn create(name: &str, num_players: i32, creator_id: i32, tx: &mut Transaction<PoolConnection<PgConnection>>) -> Result<i32> {
        let inserted: (i32,) = sqlx::query_as(
            "INSERT INTO games (name, num_players, status, creator_id, current_turn, created_at)
            VALUES($1, $2, $3, $4, 0, $5) RETURNING game_id")
            .bind(name)
            .bind(num_players)
            .bind(GameStatus::Open)
            .bind(creator_id)
            .bind(Time::now())
            .fetch_one(&mut *tx).await.map_err(ServerError::from)?;
        Ok(inserted.0)
    }

    pub async fn set_db_name(game_id: i32, db_name: &str, db_pool: &PgPool) -> Result<u64> {
        sqlx::query("UPDATE games SET db_name = $2 WHERE game_id = $1")
            .bind(game_id)
            .bind(db_name)
            .execute(db_pool).await.map_err(ServerError::from)
    }

    pub async fn activate(game_id: i32, seed: i32, db_pool: &PgPool) -> Result<u64> {
        sqlx::query("UPDATE games SET status = $2, seed = $3, current_turn = 1 WHERE game_id = $1")
            .bind(game_id)
            .bind(GameStatus::Active)
            .bind(seed)
            .execute(db_pool).await.map_err(ServerError::from)
    }

    pub async fn advance_turn(game_id: i32, current_turn: i32, db_pool: &PgPool) -> Result<u64> {
        sqlx::query("UPDATE games SET current_turn = $2 WHERE game_id = $1")
            .bind(game_id)
            .bind(current_turn)
            .execute(db_pool).await.map_err(ServerError::from)
    }

    pub async fn complete(game_id: i32, winner_player_index: i32, db_pool: &PgPool) -> Result<u64> {
        sqlx::query("UPDATE games SET status = $2, winner_player_index = $3 WHERE game_id = $1")
            .bind(game_id)
            .bind(GameStatus::Completed)
            .bind(winner_player_index)
            .execute(db_pool).await.map_err(ServerError::from)
    }

    pub async fn remove(game_id: i32, tx: &mut Transaction<PoolConnection<PgConnection>>) -> Result<u64> {
        sqlx::query("DELETE FROM game_players WHERE game_id = $1")
            .bind(game_id)
            .execute(&mut *tx).await.map_err(ServerError::from)?;
        sqlx::query("DELETE FROM games WHERE game_id = $1")
            .bind(game_id)
            .execute(&mut *tx).await.map_err(ServerError::from)
    }
}

#[derive(Deserialize)]
pub struct CreateGameRequest {
    pub name: String,
    pub num_players: i32,
}

#[derive(Deserialize)]
pub struct GenerateMapRequest {
    pub seed: Option<u32>,
}

#[derive(Serialize)]
struct JoinResponse {
    player_index: i32,
    status: GameStatus,
}

#[derive(Serialize)]
struct ResolveResponse {
    status: &'static str,
    turn_id: i32,
}

/// Creates the game, seats the creator as player 1 and provisions its own database.
#[post("")]
pub async fn create_game(state: web::Data<AppState>, data: web::Json<CreateGameRequest>, claims: Claims) -> Result<HttpResponse> {
    if data.num_players < MIN_PLAYERS || data.num_players > MAX_PLAYERS {
        Err(InternalError::InvalidPlayerCount)?
    }

    let mut tx = state.db_pool.begin().await?;
    let game_id = Game::create(&data.name, data.num_players, claims.uid, &mut tx).await?;
    GamePlayer::create(&GamePlayer { game_id, user_id: claims.uid, player_index: 1 }, &mut tx).await?;
    tx.commit().await?;

    let db_name = state.stores.create_database(game_id).await?;
    Game::set_db_name(game_id, &db_name, &state.db_pool).await?;
    log::info!("game {} created by user {} ({} players)", game_id, claims.uid, data.num_players);

    Ok(HttpResponse::Ok().json(Game::find_summary(game_id, claims.uid, &state.db_pool).await?))
}

#[get("")]
pub async fn list_games(state: web::Data<AppState>, claims: Claims) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(Game::find_summaries(claims.uid, &state.db_pool).await?))
}

#[get("/{game_id}")]
pub async fn get_game(state: web::Data<AppState>, info: web::Path<(i32,)>, claims: Claims) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(Game::find_summary(info.0, claims.uid, &state.db_pool).await?))
}

/// Creator-only teardown: the per-game database goes away with the admin rows.
#[delete("/{game_id}")]
pub async fn delete_game(state: web::Data<AppState>, info: web::Path<(i32,)>, claims: Claims) -> Result<HttpResponse> {
    let game = Game::find(info.0, &state.db_pool).await?;
    if game.creator_id != claims.uid {
        Err(InternalError::AccessDenied)?
    }

    state.stores.drop_database(game.game_id).await?;
    let mut tx = state.db_pool.begin().await?;
    Game::remove(game.game_id, &mut tx).await?;
    tx.commit().await?;
    log::info!("game {} deleted by user {}", game.game_id, claims.uid);

    Ok(HttpResponse::NoContent().finish())
}

/// Seats the caller on the next free index; filling the last seat generates the map and
/// activates the game. The game row lock serializes concurrent joins on the last seat.
#[post("/{game_id}/join")]
pub async fn join_game(state: web::Data<AppState>, info: web::Path<(i32,)>, claims: Claims) -> Result<HttpResponse> {
    let mut tx = state.db_pool.begin().await?;
    let game = Game::lock(info.0, &mut tx).await?;
    if game.status != GameStatus::Open {
        Err(InternalError::GameNotOpen)?
    }
    let members = GamePlayer::find_by_game(game.game_id, &state.db_pool).await?;
    if members.iter().any(|m| m.user_id == claims.uid) {
        Err(InternalError::AlreadyJoined)?
    }
    if members.len() as i32 >= game.num_players {
        Err(InternalError::GameNotOpen)?
    }
    let player_index = members.len() as i32 + 1;
    GamePlayer::create(&GamePlayer { game_id: game.game_id, user_id: claims.uid, player_index }, &mut tx).await?;
    tx.commit().await?;

    let status = if player_index == game.num_players {
        start_game(&game, GameRng::random_seed(), state.get_ref()).await?;
        GameStatus::Active
    } else {
        GameStatus::Open
    };
    Ok(HttpResponse::Ok().json(JoinResponse { player_index, status }))
}

/// Development shortcut: creates a game, fills the remaining seats with the pre-registered
/// `test_user<i>` accounts and starts it immediately.
#[post("/express-start")]
pub async fn express_start(state: web::Data<AppState>, data: web::Json<CreateGameRequest>, claims: Claims) -> Result<HttpResponse> {
    if !is_dev_mode() {
        Err(InternalError::AccessDenied)?
    }
    if data.num_players < MIN_PLAYERS || data.num_players > MAX_PLAYERS {
        Err(InternalError::InvalidPlayerCount)?
    }

    let mut fillers = vec![];
    for i in 1..data.num_players {
        fillers.push(User::find_by_username(&format!("test_user{}", i), &state.db_pool).await?);
    }

    let mut tx = state.db_pool.begin().await?;
    let game_id = Game::create(&data.name, data.num_players, claims.uid, &mut tx).await?;
    GamePlayer::create(&GamePlayer { game_id, user_id: claims.uid, player_index: 1 }, &mut tx).await?;
    for (i, filler) in fillers.iter().enumerate() {
        GamePlayer::create(&GamePlayer { game_id, user_id: filler.user_id, player_index: i as i32 + 2 }, &mut tx).await?;
    }
    tx.commit().await?;

    let db_name = state.stores.create_database(game_id).await?;
    Game::set_db_name(game_id, &db_name, &state.db_pool).await?;

    let game = Game::find(game_id, &state.db_pool).await?;
    start_game(&game, GameRng::random_seed(), state.get_ref()).await?;
    log::info!("game {} express-started by user {}", game_id, claims.uid);

    Ok(HttpResponse::Ok().json(Game::find_summary(game_id, claims.uid, &state.db_pool).await?))
}

/// Explicit map generation with an optional fixed seed; only the creator of a full, still
/// open game may trigger it (joining the last seat does it automatically).
#[post("/{game_id}/generate-map")]
pub async fn generate_game_map(
    state: web::Data<AppState>,
    info: web::Path<(i32,)>,
    data: web::Json<GenerateMapRequest>,
    claims: Claims,
) -> Result<HttpResponse> {
    let game = Game::find(info.0, &state.db_pool).await?;
    if game.creator_id != claims.uid {
        Err(InternalError::AccessDenied)?
    }
    if game.status != GameStatus::Open {
        Err(InternalError::GameNotOpen)?
    }
    let members = GamePlayer::find_by_game(game.game_id, &state.db_pool).await?;
    if members.len() as i32 != game.num_players {
        Err(InternalError::Conflict)?
    }

    let seed = data.seed.map(|s| s % MAX_SEED).unwrap_or_else(GameRng::random_seed);
    start_game(&game, seed, state.get_ref()).await?;

    Ok(HttpResponse::Ok().json(Game::find_summary(game.game_id, claims.uid, &state.db_pool).await?))
}

/// Development shortcut: resolves the current turn no matter who has submitted.
#[post("/{game_id}/force-resolve")]
pub async fn force_resolve(state: web::Data<AppState>, info: web::Path<(i32,)>, claims: Claims) -> Result<HttpResponse> {
    if !is_dev_mode() {
        Err(InternalError::AccessDenied)?
    }
    let game = Game::find(info.0, &state.db_pool).await?;
    GamePlayer::find_index(game.game_id, claims.uid, &state.db_pool).await?;
    if game.status != GameStatus::Active {
        Err(InternalError::Conflict)?
    }
    let turn_id = game.current_turn;
    let game_pool = state.stores.pool(game.game_id).await?;

    let mut tx = game_pool.begin().await?;
    let turn = Turn::lock(turn_id, &mut tx).await?;
    if turn.status != TurnStatus::Active {
        Err(InternalError::Conflict)?
    }
    let outcome = resolver::resolve_in_tx(&game, turn_id, &game_pool, &mut tx).await?;
    tx.commit().await?;
    resolver::finalize_admin(&game, &outcome, &state.db_pool).await?;

    Ok(HttpResponse::Ok().json(ResolveResponse { status: "resolved", turn_id }))
}

/// Generates the map for a full game and seeds the initial board: one ship, one mine and
/// one shipyard on every home system, the neutral garrison on Founder's World, turn 1 with
/// blank submissions, and the turn-0 snapshot.
pub async fn start_game(game: &Game, seed: u32, state: &AppState) -> Result<()> {
    let map = generate_map(game.num_players, seed);
    let game_pool = state.stores.pool(game.game_id).await?;

    let mut systems = vec![];
    let mut ships = vec![];
    let mut structures = vec![];
    for generated in map.systems.iter() {
        let system = StarSystem {
            system_id: generated.id,
            name: generated.name.clone(),
            x: generated.x,
            y: generated.y,
            mining_value: generated.mining_value,
            materials: 0,
            cluster_id: generated.cluster_id,
            is_home_system: generated.is_home_system,
            is_founders_world: generated.is_founders_world,
            owner_player_index: generated.owner_player_index,
        };
        if let Some(owner) = system.owner_player_index {
            ships.push(ShipGroup { system_id: system.system_id, player_index: owner, count: HOME_SYSTEM_SHIPS });
            structures.push(Structure { system_id: system.system_id, player_index: owner, kind: StructureKind::Mine });
            structures.push(Structure { system_id: system.system_id, player_index: owner, kind: StructureKind::Shipyard });
        }
        if system.is_founders_world {
            ships.push(ShipGroup { system_id: system.system_id, player_index: NEUTRAL_PLAYER_INDEX, count: FOUNDERS_WORLD_GARRISON });
        }
        systems.push(system);
    }
    let jump_lines: Vec<JumpLine> = map.jump_lines.iter()
        .map(|(a, b)| JumpLine { from_system_id: *a, to_system_id: *b })
        .collect();

    let mut tx = game_pool.begin().await?;
    for system in systems.iter() {
        StarSystem::create(system, &mut tx).await?;
    }
    for jump_line in jump_lines.iter() {
        JumpLine::create(jump_line, &mut tx).await?;
    }
    for ship in ships.iter() {
        ShipGroup::create(ship, &mut tx).await?;
    }
    for structure in structures.iter() {
        Structure::create(structure, &mut tx).await?;
    }
    Turn::create(1, &mut tx).await?;
    for player_index in 1..=game.num_players {
        PlayerTurnStatus::create(1, player_index, &mut tx).await?;
    }

    let board = Board::from_parts(systems, jump_lines, ships, structures);
    TurnSnapshot::create(&TurnSnapshot::capture(0, &board, &[]), &mut tx).await?;
    tx.commit().await?;

    Game::activate(game.game_id, seed as i32, &state.db_pool).await?;
    log::info!(
        "game {} started: seed {}, {} systems, {} jump lines",
        game.game_id, seed, board.systems.len(), map.jump_lines.len()
    );
    Ok(())
}
