use serde::{Serialize, Deserialize};
use sqlx::{PgPool, PgConnection, pool::PoolConnection, postgres::{PgRow, PgQueryAs}, FromRow, Error, Transaction};
use sqlx_core::row::Row;
use crate::lib::{Result, error::ServerError};

/// Player index of the garrison holding Founder's World until someone takes it.
pub const NEUTRAL_PLAYER_INDEX: i32 = -1;

/// Ships of one player stationed at one system. Rows with a zero count are never persisted.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct ShipGroup {
    pub system_id: i32,
    pub player_index: i32,
    pub count: i32,
}

impl<'a> FromRow<'a, PgRow<'a>> for ShipGroup {
    fn from_row(row: &PgRow) -> std::result::Result<Self, Error> {
        Ok(ShipGroup {
            system_id: row.try_get("system_id")?,
            player_index: row.try_get("player_index")?,
            count: row.try_get("count")?,
        })
    }
}

impl ShipGroup {
    pub async fn find_all(game_pool: &PgPool) -> Result<Vec<ShipGroup>> {
        sqlx::query_as("SELECT * FROM ships WHERE count > 0 ORDER BY system_id, player_index")
            .fetch_all(game_pool).await.map_err(ServerError::from)
    }

    pub async fn create(g: &ShipGroup, tx: &mut Transaction<PoolConnection<PgConnection>>) -> Result<u64> {
        sqlx::query("INSERT INTO ships (system_id, player_index, count) VALUES($1, $2, $3)")
            .bind(g.system_id)
            .bind(g.player_index)
            .bind(g.count)
            .execute(tx).await.map_err(ServerError::from)
    }

    pub async fn delete_all(tx: &mut Transaction<PoolConnection<PgConnection>>) -> Result<u64> {
        sqlx::query("DELETE FROM ships")
            .execute(tx).await.map_err(ServerError::from)
    }
}
