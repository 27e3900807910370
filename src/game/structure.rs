use serde::{Serialize, Deserialize};
use sqlx::{PgPool, PgConnection, pool::PoolConnection, postgres::{PgRow, PgQueryAs}, FromRow, Error, Transaction};
use sqlx_core::row::Row;
use crate::lib::{Result, error::ServerError};

/// A player-built installation on a star system. At most one of each kind per system; a
/// shipyard requires a mine on the same system.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Structure {
    pub system_id: i32,
    pub player_index: i32,
    pub kind: StructureKind,
}

#[derive(Debug, Serialize, Deserialize, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, sqlx::Type)]
#[sqlx(rename = "VARCHAR")]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all(serialize = "snake_case", deserialize = "snake_case"))]
pub enum StructureKind {
    Mine,
    Shipyard,
}

impl<'a> FromRow<'a, PgRow<'a>> for Structure {
    fn from_row(row: &PgRow) -> std::result::Result<Self, Error> {
        Ok(Structure {
            system_id: row.try_get("system_id")?,
            player_index: row.try_get("player_index")?,
            kind: row.try_get("structure_type")?,
        })
    }
}

impl Structure {
    pub async fn find_all(game_pool: &PgPool) -> Result<Vec<Structure>> {
        sqlx::query_as("SELECT * FROM structures ORDER BY system_id, structure_type")
            .fetch_all(game_pool).await.map_err(ServerError::from)
    }

    pub async fn create(s: &Structure, tx: &mut Transaction<PoolConnection<PgConnection>>) -> Result<u64> {
        sqlx::query("INSERT INTO structures (system_id, player_index, structure_type) VALUES($1, $2, $3)")
            .bind(s.system_id)
            .bind(s.player_index)
            .bind(s.kind)
            .execute(tx).await.map_err(ServerError::from)
    }

    pub async fn delete_all(tx: &mut Transaction<PoolConnection<PgConnection>>) -> Result<u64> {
        sqlx::query("DELETE FROM structures")
            .execute(tx).await.map_err(ServerError::from)
    }
}
