use std::collections::HashMap;
use std::sync::RwLock;
use sqlx::PgPool;
use crate::lib::{Result, error::ServerError};

/// Tables of the admin store, ensured at startup.
const ADMIN_SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS users (
        user_id SERIAL PRIMARY KEY,
        username VARCHAR(50) NOT NULL UNIQUE,
        first_name VARCHAR(50) NOT NULL,
        last_name VARCHAR(50) NOT NULL,
        email VARCHAR(100) NOT NULL UNIQUE,
        password VARCHAR(255) NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS games (
        game_id SERIAL PRIMARY KEY,
        name VARCHAR(100) NOT NULL,
        num_players INTEGER NOT NULL,
        status VARCHAR(20) NOT NULL,
        creator_id INTEGER NOT NULL,
        seed INTEGER,
        db_name VARCHAR(100),
        current_turn INTEGER NOT NULL DEFAULT 0,
        winner_player_index INTEGER,
        created_at TIMESTAMPTZ NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS game_players (
        game_id INTEGER NOT NULL,
        user_id INTEGER NOT NULL,
        player_index INTEGER NOT NULL,
        PRIMARY KEY(game_id, user_id)
    )",
];

/// Tables of one per-game store, applied to every freshly provisioned game database.
const GAME_SCHEMA: &[&str] = &[
    "CREATE TABLE star_systems (
        system_id INTEGER PRIMARY KEY,
        name VARCHAR(100) NOT NULL,
        x DOUBLE PRECISION NOT NULL,
        y DOUBLE PRECISION NOT NULL,
        mining_value INTEGER NOT NULL,
        materials INTEGER NOT NULL DEFAULT 0,
        cluster_id INTEGER NOT NULL,
        is_home_system BOOLEAN NOT NULL DEFAULT FALSE,
        is_founders_world BOOLEAN NOT NULL DEFAULT FALSE,
        owner_player_index INTEGER
    )",
    "CREATE TABLE jump_lines (
        from_system_id INTEGER NOT NULL,
        to_system_id INTEGER NOT NULL,
        PRIMARY KEY(from_system_id, to_system_id)
    )",
    "CREATE TABLE ships (
        system_id INTEGER NOT NULL,
        player_index INTEGER NOT NULL,
        count INTEGER NOT NULL,
        PRIMARY KEY(system_id, player_index)
    )",
    "CREATE TABLE structures (
        system_id INTEGER NOT NULL,
        player_index INTEGER NOT NULL,
        structure_type VARCHAR(20) NOT NULL,
        PRIMARY KEY(system_id, structure_type)
    )",
    "CREATE TABLE turns (
        turn_id INTEGER PRIMARY KEY,
        status VARCHAR(20) NOT NULL,
        resolved_at TIMESTAMPTZ
    )",
    "CREATE TABLE player_turn_status (
        turn_id INTEGER NOT NULL,
        player_index INTEGER NOT NULL,
        submitted BOOLEAN NOT NULL DEFAULT FALSE,
        submitted_at TIMESTAMPTZ,
        PRIMARY KEY(turn_id, player_index)
    )",
    "CREATE TABLE orders (
        order_id SERIAL PRIMARY KEY,
        turn_id INTEGER NOT NULL,
        player_index INTEGER NOT NULL,
        order_type VARCHAR(20) NOT NULL,
        source_system_id INTEGER NOT NULL,
        target_system_id INTEGER,
        quantity INTEGER
    )",
    "CREATE TABLE order_material_sources (
        order_id INTEGER NOT NULL,
        source_system_id INTEGER NOT NULL,
        amount INTEGER NOT NULL,
        PRIMARY KEY(order_id, source_system_id)
    )",
    "CREATE TABLE combat_logs (
        log_id SERIAL PRIMARY KEY,
        turn_id INTEGER NOT NULL,
        system_id INTEGER NOT NULL,
        round_number INTEGER NOT NULL,
        combatants TEXT NOT NULL
    )",
    "CREATE TABLE turn_snapshots (
        turn_id INTEGER PRIMARY KEY,
        systems TEXT NOT NULL,
        ships TEXT NOT NULL,
        structures TEXT NOT NULL,
        orders TEXT NOT NULL
    )",
];

/// Explicit manager of the per-game databases: provisions them on game creation, caches one
/// pool per game, and tears everything down on game deletion.
pub struct GameStores {
    base_url: String,
    pools: RwLock<HashMap<i32, PgPool>>,
}

impl GameStores {
    pub fn new(base_url: String) -> Self {
        GameStores {
            base_url,
            pools: RwLock::new(HashMap::new()),
        }
    }

    pub fn game_db_name(game_id: i32) -> String {
        format!("nebula_game_{}", game_id)
    }

    /// The cached pool for a game's database, connecting on first use.
    pub async fn pool(&self, game_id: i32) -> Result<PgPool> {
        {
            let pools = self.pools.read().expect("GameStores::pool() RwLock poisoned");
            if let Some(pool) = pools.get(&game_id) {
                return Ok(pool.clone());
            }
        }
        let pool = PgPool::new(&format!("{}/{}", self.base_url, Self::game_db_name(game_id))).await
            .map_err(ServerError::from)?;
        let mut pools = self.pools.write().expect("GameStores::pool() RwLock poisoned");
        Ok(pools.entry(game_id).or_insert(pool).clone())
    }

    /// Creates the game's database and applies the per-game schema. `CREATE DATABASE`
    /// cannot run inside a transaction, so it goes through a maintenance connection.
    pub async fn create_database(&self, game_id: i32) -> Result<String> {
        let db_name = Self::game_db_name(game_id);
        let maintenance = self.maintenance_pool().await?;
        sqlx::query(&format!("CREATE DATABASE {}", db_name))
            .execute(&maintenance).await.map_err(ServerError::from)?;

        let pool = self.pool(game_id).await?;
        for statement in GAME_SCHEMA.iter() {
            sqlx::query(statement).execute(&pool).await.map_err(ServerError::from)?;
        }
        log::info!("provisioned game database {}", db_name);
        Ok(db_name)
    }

    /// Closes the cached pool, kicks any lingering backends and drops the database.
    pub async fn drop_database(&self, game_id: i32) -> Result<()> {
        let db_name = Self::game_db_name(game_id);
        let cached = self.pools.write().expect("GameStores::drop_database() RwLock poisoned").remove(&game_id);
        if let Some(pool) = cached {
            pool.close().await;
        }

        let maintenance = self.maintenance_pool().await?;
        sqlx::query(&format!(
            "SELECT pg_terminate_backend(pid) FROM pg_stat_activity WHERE datname = '{}' AND pid <> pg_backend_pid()",
            db_name
        ))
            .execute(&maintenance).await.map_err(ServerError::from)?;
        sqlx::query(&format!("DROP DATABASE IF EXISTS {}", db_name))
            .execute(&maintenance).await.map_err(ServerError::from)?;
        log::info!("dropped game database {}", db_name);
        Ok(())
    }

    async fn maintenance_pool(&self) -> Result<PgPool> {
        PgPool::new(&format!("{}/postgres", self.base_url)).await.map_err(ServerError::from)
    }
}

/// Connects to the admin database, creating it and its tables when missing.
pub async fn init_admin_pool(base_url: &str, admin_db: &str) -> Result<PgPool> {
    let maintenance = PgPool::new(&format!("{}/postgres", base_url)).await.map_err(ServerError::from)?;
    if sqlx::query(&format!("CREATE DATABASE {}", admin_db)).execute(&maintenance).await.is_err() {
        log::debug!("admin database {} already exists", admin_db);
    }

    let pool = PgPool::new(&format!("{}/{}", base_url, admin_db)).await.map_err(ServerError::from)?;
    for statement in ADMIN_SCHEMA.iter() {
        sqlx::query(statement).execute(&pool).await.map_err(ServerError::from)?;
    }
    Ok(pool)
}
