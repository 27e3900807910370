use serde::Serialize;
use sqlx::{PgPool, PgConnection, pool::PoolConnection, postgres::{PgRow, PgQueryAs}, FromRow, Error, Transaction};
use sqlx_core::row::Row;
use crate::{
    lib::{Result, error::{ServerError, InternalError}},
    game::{game::Game, system::StarSystem},
};

/// Deterministic roster palette; a player's color is `PLAYER_COLORS[player_index mod 8]`.
pub const PLAYER_COLORS: [&str; 8] = [
    "#e74c3c", "#3498db", "#2ecc71", "#f39c12",
    "#9b59b6", "#1abc9c", "#e67e22", "#34495e",
];

pub fn player_color(player_index: i32) -> &'static str {
    PLAYER_COLORS[player_index.rem_euclid(PLAYER_COLORS.len() as i32) as usize]
}

/// Membership of one user in one game, with their stable seat number (1-based).
#[derive(Debug, Serialize, Clone, Copy)]
pub struct GamePlayer {
    pub game_id: i32,
    pub user_id: i32,
    pub player_index: i32,
}

/// Seat and username, joined from the admin store for the read models.
#[derive(Debug, Serialize, Clone)]
pub struct RosterEntry {
    pub player_index: i32,
    pub username: String,
}

impl<'a> FromRow<'a, PgRow<'a>> for GamePlayer {
    fn from_row(row: &PgRow) -> std::result::Result<Self, Error> {
        Ok(GamePlayer {
            game_id: row.try_get("game_id")?,
            user_id: row.try_get("user_id")?,
            player_index: row.try_get("player_index")?,
        })
    }
}

impl<'a> FromRow<'a, PgRow<'a>> for RosterEntry {
    fn from_row(row: &PgRow) -> std::result::Result<Self, Error> {
        Ok(RosterEntry {
            player_index: row.try_get("player_index")?,
            username: row.try_get("username")?,
        })
    }
}

impl GamePlayer {
    pub async fn find_by_game(game_id: i32, db_pool: &PgPool) -> Result<Vec<GamePlayer>> {
        sqlx::query_as("SELECT * FROM game_players WHERE game_id = $1 ORDER BY player_index")
            .bind(game_id)
            .fetch_all(db_pool).await.map_err(ServerError::from)
    }

    /// The caller's seat in the game; a non-member is denied access.
    pub async fn find_index(game_id: i32, user_id: i32, db_pool: &PgPool) -> Result<i32> {
        let row: Option<(i32,)> = sqlx::query_as("SELECT player_index FROM game_players WHERE game_id = $1 AND user_id = $2")
            .bind(game_id)
            .bind(user_id)
            .fetch_optional(db_pool).await.map_err(ServerError::from)?;
        row.map(|r| r.0).ok_or_else(|| InternalError::AccessDenied.into())
    }

    pub async fn roster(game_id: i32, db_pool: &PgPool) -> Result<Vec<RosterEntry>> {
        sqlx::query_as(
            "SELECT gp.player_index, u.username FROM game_players gp
            INNER JOIN users u ON u.user_id = gp.user_id
            WHERE gp.game_id = $1
            ORDER BY gp.player_index")
            .bind(game_id)
            .fetch_all(db_pool).await.map_err(ServerError::from)
    }

    pub async fn create(gp: &GamePlayer, tx: &mut Transaction<PoolConnection<PgConnection>>) -> Result<u64> {
        sqlx::query("INSERT INTO game_players (game_id, user_id, player_index) VALUES($1, $2, $3)")
            .bind(gp.game_id)
            .bind(gp.user_id)
            .bind(gp.player_index)
            .execute(tx).await.map_err(ServerError::from)
    }
}

/// Roster line of the map view: seat, name, palette color and the home system's name.
#[derive(Debug, Serialize, Clone)]
pub struct PlayerView {
    pub player_index: i32,
    pub username: String,
    pub color: String,
    pub home_system_name: Option<String>,
}

impl PlayerView {
    pub async fn assemble(game: &Game, systems: &[StarSystem], db_pool: &PgPool) -> Result<Vec<PlayerView>> {
        let roster = GamePlayer::roster(game.game_id, db_pool).await?;
        Ok(roster.into_iter().map(|entry| {
            let home_system_name = systems.iter()
                .find(|s| s.is_home_system && s.owner_player_index == Some(entry.player_index))
                .map(|s| s.name.clone());
            PlayerView {
                color: String::from(player_color(entry.player_index)),
                home_system_name,
                player_index: entry.player_index,
                username: entry.username,
            }
        }).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_palette_is_indexed_by_player_index_mod_8() {
        assert_eq!("#3498db", player_color(1));
        assert_eq!("#34495e", player_color(7));
        assert_eq!("#e74c3c", player_color(8));
        assert_eq!("#3498db", player_color(9));
    }

    #[test]
    fn test_palette_has_eight_distinct_colors() {
        let unique: std::collections::BTreeSet<&str> = PLAYER_COLORS.iter().cloned().collect();
        assert_eq!(8, unique.len());
    }
}
