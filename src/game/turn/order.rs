use actix_web::{delete, get, post, web, HttpResponse};
use serde::{Serialize, Deserialize};
use sqlx::{PgPool, PgConnection, pool::PoolConnection, postgres::{PgRow, PgQueryAs}, FromRow, Error, Transaction};
use sqlx_core::row::Row;
use crate::{
    AppState,
    lib::{
        Result,
        auth::Claims,
        error::{ServerError, InternalError},
    },
    game::{
        board::Board,
        game::{Game, GameStatus},
        player::GamePlayer,
        structure::StructureKind,
        turn::{PlayerTurnStatus, Turn, TurnStatus},
    },
};

/// Materials a new mine consumes, donated by other systems of the ordering player.
pub const MINE_COST: i32 = 15;
/// Materials a new shipyard consumes, taken from the build system itself.
pub const SHIPYARD_COST: i32 = 30;
/// Materials per ship built.
pub const SHIP_COST: i32 = 1;

/// A submitted order. The kind carries everything the resolver needs; validation,
/// resolution and persistence all dispatch on it.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub order_id: i32,
    pub turn_id: i32,
    pub player_index: i32,
    pub kind: OrderKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OrderKind {
    MoveShips { source: i32, target: i32, quantity: i32 },
    BuildMine { source: i32, donors: Vec<MaterialSource> },
    BuildShipyard { source: i32 },
    BuildShips { source: i32, quantity: i32 },
}

/// One donation backing a `build_mine` order.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct MaterialSource {
    pub system_id: i32,
    pub amount: i32,
}

impl OrderKind {
    pub fn source(&self) -> i32 {
        match self {
            OrderKind::MoveShips { source, .. } => *source,
            OrderKind::BuildMine { source, .. } => *source,
            OrderKind::BuildShipyard { source } => *source,
            OrderKind::BuildShips { source, .. } => *source,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            OrderKind::MoveShips { .. } => "move_ships",
            OrderKind::BuildMine { .. } => "build_mine",
            OrderKind::BuildShipyard { .. } => "build_shipyard",
            OrderKind::BuildShips { .. } => "build_ships",
        }
    }
}

/// Wire shape of an order creation request; `into_kind` checks it is structurally complete
/// before the board rules run.
#[derive(Deserialize)]
pub struct OrderRequest {
    pub order_type: String,
    pub source_system_id: i32,
    pub target_system_id: Option<i32>,
    pub quantity: Option<i32>,
    pub material_sources: Option<Vec<MaterialSource>>,
}

impl OrderRequest {
    pub fn into_kind(&self) -> std::result::Result<OrderKind, InternalError> {
        match self.order_type.as_str() {
            "move_ships" => Ok(OrderKind::MoveShips {
                source: self.source_system_id,
                target: self.target_system_id
                    .ok_or_else(|| InternalError::invalid_order("a move order requires a target system"))?,
                quantity: self.quantity
                    .ok_or_else(|| InternalError::invalid_order("a move order requires a quantity"))?,
            }),
            "build_mine" => Ok(OrderKind::BuildMine {
                source: self.source_system_id,
                donors: self.material_sources.clone()
                    .ok_or_else(|| InternalError::invalid_order("a mine order requires material sources"))?,
            }),
            "build_shipyard" => Ok(OrderKind::BuildShipyard {
                source: self.source_system_id,
            }),
            "build_ships" => Ok(OrderKind::BuildShips {
                source: self.source_system_id,
                quantity: self.quantity
                    .ok_or_else(|| InternalError::invalid_order("a ship build order requires a quantity"))?,
            }),
            other => Err(InternalError::invalid_order(format!("unknown order type '{}'", other))),
        }
    }
}

/// Serialized form used by the API and the turn snapshots.
#[derive(Serialize, Deserialize, Clone)]
pub struct OrderView {
    pub order_id: i32,
    pub turn_id: i32,
    pub player_index: i32,
    pub order_type: String,
    pub source_system_id: i32,
    pub target_system_id: Option<i32>,
    pub quantity: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub material_sources: Option<Vec<MaterialSource>>,
}

impl Order {
    pub fn view(&self) -> OrderView {
        let (target_system_id, quantity, material_sources) = match &self.kind {
            OrderKind::MoveShips { target, quantity, .. } => (Some(*target), Some(*quantity), None),
            OrderKind::BuildMine { donors, .. } => (None, None, Some(donors.clone())),
            OrderKind::BuildShipyard { .. } => (None, None, None),
            OrderKind::BuildShips { quantity, .. } => (None, Some(*quantity), None),
        };
        OrderView {
            order_id: self.order_id,
            turn_id: self.turn_id,
            player_index: self.player_index,
            order_type: String::from(self.kind.type_name()),
            source_system_id: self.kind.source(),
            target_system_id,
            quantity,
            material_sources,
        }
    }
}

struct OrderRow {
    order_id: i32,
    turn_id: i32,
    player_index: i32,
    order_type: String,
    source_system_id: i32,
    target_system_id: Option<i32>,
    quantity: Option<i32>,
}

impl<'a> FromRow<'a, PgRow<'a>> for OrderRow {
    fn from_row(row: &PgRow) -> std::result::Result<Self, Error> {
        Ok(OrderRow {
            order_id: row.try_get("order_id")?,
            turn_id: row.try_get("turn_id")?,
            player_index: row.try_get("player_index")?,
            order_type: row.try_get("order_type")?,
            source_system_id: row.try_get("source_system_id")?,
            target_system_id: row.try_get("target_system_id").ok(),
            quantity: row.try_get("quantity").ok(),
        })
    }
}

impl<'a> FromRow<'a, PgRow<'a>> for MaterialSource {
    fn from_row(row: &PgRow) -> std::result::Result<Self, Error> {
        Ok(MaterialSource {
            system_id: row.try_get("source_system_id")?,
            amount: row.try_get("amount")?,
        })
    }
}

impl OrderRow {
    fn assemble(self, donors: Vec<MaterialSource>) -> Result<Order> {
        let kind = match self.order_type.as_str() {
            "move_ships" => OrderKind::MoveShips {
                source: self.source_system_id,
                target: self.target_system_id.ok_or(InternalError::NotFound("order target"))?,
                quantity: self.quantity.ok_or(InternalError::NotFound("order quantity"))?,
            },
            "build_mine" => OrderKind::BuildMine {
                source: self.source_system_id,
                donors,
            },
            "build_shipyard" => OrderKind::BuildShipyard {
                source: self.source_system_id,
            },
            "build_ships" => OrderKind::BuildShips {
                source: self.source_system_id,
                quantity: self.quantity.ok_or(InternalError::NotFound("order quantity"))?,
            },
            other => {
                log::error!("unknown order type '{}' in store", other);
                return Err(InternalError::NotFound("order").into());
            },
        };
        Ok(Order {
            order_id: self.order_id,
            turn_id: self.turn_id,
            player_index: self.player_index,
            kind,
        })
    }
}

impl Order {
    async fn assemble_rows(rows: Vec<OrderRow>, game_pool: &PgPool) -> Result<Vec<Order>> {
        let mut orders = vec![];
        for row in rows {
            let donors = if row.order_type == "build_mine" {
                sqlx::query_as("SELECT * FROM order_material_sources WHERE order_id = $1 ORDER BY source_system_id")
                    .bind(row.order_id)
                    .fetch_all(game_pool).await.map_err(ServerError::from)?
            } else {
                vec![]
            };
            orders.push(row.assemble(donors)?);
        }
        Ok(orders)
    }

    pub async fn find_by_turn(turn_id: i32, game_pool: &PgPool) -> Result<Vec<Order>> {
        let rows: Vec<OrderRow> = sqlx::query_as("SELECT * FROM orders WHERE turn_id = $1 ORDER BY order_id")
            .bind(turn_id)
            .fetch_all(game_pool).await.map_err(ServerError::from)?;
        Order::assemble_rows(rows, game_pool).await
    }

    pub async fn find_by_turn_and_player(turn_id: i32, player_index: i32, game_pool: &PgPool) -> Result<Vec<Order>> {
        let rows: Vec<OrderRow> = sqlx::query_as("SELECT * FROM orders WHERE turn_id = $1 AND player_index = $2 ORDER BY order_id")
            .bind(turn_id)
            .bind(player_index)
            .fetch_all(game_pool).await.map_err(ServerError::from)?;
        Order::assemble_rows(rows, game_pool).await
    }

    pub async fn find(order_id: i32, game_pool: &PgPool) -> Result<Order> {
        let row: OrderRow = sqlx::query_as("SELECT * FROM orders WHERE order_id = $1")
            .bind(order_id)
            .fetch_one(game_pool).await.map_err(ServerError::if_row_not_found("order"))?;
        Ok(Order::assemble_rows(vec![row], game_pool).await?.remove(0))
    }

    pub async fn create(turn_id: i32, player_index: i32, kind: &OrderKind, game_pool: &PgPool) -> Result<Order> {
        let (target, quantity) = match kind {
            OrderKind::MoveShips { target, quantity, .. } => (Some(*target), Some(*quantity)),
            OrderKind::BuildShips { quantity, .. } => (None, Some(*quantity)),
            _ => (None, None),
        };

        let mut tx = game_pool.begin().await?;
        let inserted: (i32,) = sqlx::query_as(
            "INSERT INTO orders (turn_id, player_index, order_type, source_system_id, target_system_id, quantity)
            VALUES($1, $2, $3, $4, $5, $6) RETURNING order_id")
            .bind(turn_id)
            .bind(player_index)
            .bind(kind.type_name())
            .bind(kind.source())
            .bind(target)
            .bind(quantity)
            .fetch_one(&mut tx).await.map_err(ServerError::from)?;

        if let OrderKind::BuildMine { donors, .. } = kind {
            for donor in donors.iter() {
                sqlx::query("INSERT INTO order_material_sources (order_id, source_system_id, amount) VALUES($1, $2, $3)")
                    .bind(inserted.0)
                    .bind(donor.system_id)
                    .bind(donor.amount)
                    .execute(&mut tx).await.map_err(ServerError::from)?;
            }
        }
        tx.commit().await?;

        Ok(Order {
            order_id: inserted.0,
            turn_id,
            player_index,
            kind: kind.clone(),
        })
    }

    pub async fn delete(order_id: i32, game_pool: &PgPool) -> Result<()> {
        let mut tx = game_pool.begin().await?;
        sqlx::query("DELETE FROM order_material_sources WHERE order_id = $1")
            .bind(order_id)
            .execute(&mut tx).await.map_err(ServerError::from)?;
        sqlx::query("DELETE FROM orders WHERE order_id = $1")
            .bind(order_id)
            .execute(&mut tx).await.map_err(ServerError::from)?;
        tx.commit().await?;
        Ok(())
    }
}

/// Ships already committed to outbound moves from `source` by `player_index` this turn.
fn committed_ships(pending: &[Order], player_index: i32, source: i32) -> i32 {
    pending.iter()
        .filter(|o| o.player_index == player_index)
        .filter_map(|o| match &o.kind {
            OrderKind::MoveShips { source: s, quantity, .. } if *s == source => Some(*quantity),
            _ => None,
        })
        .sum()
}

/// Materials already committed at `system_id` by this turn's pending orders: 30 per pending
/// shipyard there, the full quantity of pending ship builds there, and every pending mine
/// donation drawn from it.
fn committed_materials(pending: &[Order], system_id: i32) -> i32 {
    pending.iter().map(|o| match &o.kind {
        OrderKind::BuildShipyard { source } if *source == system_id => SHIPYARD_COST,
        OrderKind::BuildShips { source, quantity } if *source == system_id => *quantity * SHIP_COST,
        OrderKind::BuildMine { donors, .. } => donors.iter()
            .filter(|d| d.system_id == system_id)
            .map(|d| d.amount)
            .sum(),
        _ => 0,
    }).sum()
}

fn available_materials(board: &Board, pending: &[Order], system_id: i32) -> i32 {
    let materials = board.system(system_id).map_or(0, |s| s.materials);
    materials - committed_materials(pending, system_id)
}

/// Runs every §validation rule of one order against the current board and the orders already
/// accepted for the turn. Pure so each rule is testable without a store.
pub fn validate_order(
    board: &Board,
    pending: &[Order],
    player_index: i32,
    kind: &OrderKind,
) -> std::result::Result<(), InternalError> {
    let source = board.system(kind.source())
        .ok_or_else(|| InternalError::invalid_order("source system does not exist"))?;
    if source.owner_player_index != Some(player_index) {
        return Err(InternalError::invalid_order("source system is not owned by the player"));
    }

    match kind {
        OrderKind::MoveShips { source, target, quantity } => {
            if board.system(*target).is_none() {
                return Err(InternalError::invalid_order("target system does not exist"));
            }
            if !board.is_adjacent(*source, *target) {
                return Err(InternalError::invalid_order("target system is not adjacent to the source"));
            }
            if *quantity < 1 {
                return Err(InternalError::invalid_order("quantity must be at least 1"));
            }
            let available = board.ships_of(*source, player_index)
                - committed_ships(pending, player_index, *source);
            if *quantity > available {
                return Err(InternalError::invalid_order("not enough ships available at the source"));
            }
        },
        OrderKind::BuildMine { source, donors } => {
            if board.has_structure(*source, StructureKind::Mine) {
                return Err(InternalError::invalid_order("source system already has a mine"));
            }
            let duplicate = pending.iter().any(|o| match &o.kind {
                OrderKind::BuildMine { source: s, .. } => s == source,
                _ => false,
            });
            if duplicate {
                return Err(InternalError::invalid_order("a mine is already being built at this system this turn"));
            }
            if donors.is_empty() {
                return Err(InternalError::invalid_order("a mine order requires material sources"));
            }
            let total: i32 = donors.iter().map(|d| d.amount).sum();
            if total != MINE_COST {
                return Err(InternalError::invalid_order(format!("material donations must total {}", MINE_COST)));
            }
            for (i, donor) in donors.iter().enumerate() {
                if donor.system_id == *source {
                    return Err(InternalError::invalid_order("a donor system cannot be the build system"));
                }
                if donors.iter().take(i).any(|d| d.system_id == donor.system_id) {
                    return Err(InternalError::invalid_order("a donor system is listed twice"));
                }
                let donor_system = board.system(donor.system_id)
                    .ok_or_else(|| InternalError::invalid_order("donor system does not exist"))?;
                if donor_system.owner_player_index != Some(player_index) {
                    return Err(InternalError::invalid_order("donor system is not owned by the player"));
                }
                if available_materials(board, pending, donor.system_id) < donor.amount {
                    return Err(InternalError::invalid_order("not enough uncommitted materials at a donor system"));
                }
            }
        },
        OrderKind::BuildShipyard { source } => {
            if !board.has_structure(*source, StructureKind::Mine) {
                return Err(InternalError::invalid_order("a shipyard requires a mine on the system"));
            }
            if board.has_structure(*source, StructureKind::Shipyard) {
                return Err(InternalError::invalid_order("source system already has a shipyard"));
            }
            let duplicate = pending.iter().any(|o| match &o.kind {
                OrderKind::BuildShipyard { source: s } => s == source,
                _ => false,
            });
            if duplicate {
                return Err(InternalError::invalid_order("a shipyard is already being built at this system this turn"));
            }
            if available_materials(board, pending, *source) < SHIPYARD_COST {
                return Err(InternalError::invalid_order("not enough uncommitted materials for a shipyard"));
            }
        },
        OrderKind::BuildShips { source, quantity } => {
            if !board.has_structure(*source, StructureKind::Mine)
                || !board.has_structure(*source, StructureKind::Shipyard) {
                return Err(InternalError::invalid_order("building ships requires a mine and a shipyard"));
            }
            if *quantity < 1 {
                return Err(InternalError::invalid_order("quantity must be at least 1"));
            }
            if *quantity * SHIP_COST > available_materials(board, pending, *source) {
                return Err(InternalError::invalid_order("not enough uncommitted materials to build ships"));
            }
        },
    }
    Ok(())
}

/// Looks the caller up in the game, checks the turn is open for them, and returns what the
/// order endpoints share.
async fn order_context(
    state: &web::Data<AppState>,
    game_id: i32,
    turn_id: i32,
    claims: &Claims,
) -> Result<(Game, i32, PgPool)> {
    let game = Game::find(game_id, &state.db_pool).await?;
    if game.status != GameStatus::Active {
        Err(InternalError::Conflict)?
    }
    let player_index = GamePlayer::find_index(game_id, claims.uid, &state.db_pool).await?;
    let game_pool = state.stores.pool(game_id).await?;

    let turn = Turn::find(turn_id, &game_pool).await?;
    if turn.status != TurnStatus::Active {
        Err(InternalError::Conflict)?
    }
    let status = PlayerTurnStatus::find_by_turn(turn_id, &game_pool).await?
        .into_iter()
        .find(|s| s.player_index == player_index)
        .ok_or(InternalError::NotFound("player turn status"))?;
    if status.submitted {
        Err(InternalError::invalid_order("orders are locked after submission"))?
    }
    Ok((game, player_index, game_pool))
}

#[post("/{game_id}/turns/{turn_id}/orders")]
pub async fn create_order(
    state: web::Data<AppState>,
    info: web::Path<(i32, i32)>,
    data: web::Json<OrderRequest>,
    claims: Claims,
) -> Result<HttpResponse> {
    let (game_id, turn_id) = (info.0, info.1);
    let (_, player_index, game_pool) = order_context(&state, game_id, turn_id, &claims).await?;

    let kind = data.into_kind().map_err(ServerError::from)?;
    let board = Board::load(&game_pool).await?;
    let pending = Order::find_by_turn(turn_id, &game_pool).await?;
    validate_order(&board, &pending, player_index, &kind).map_err(ServerError::from)?;

    let order = Order::create(turn_id, player_index, &kind, &game_pool).await?;
    Ok(HttpResponse::Ok().json(order.view()))
}

#[get("/{game_id}/turns/{turn_id}/orders")]
pub async fn get_orders(
    state: web::Data<AppState>,
    info: web::Path<(i32, i32)>,
    claims: Claims,
) -> Result<HttpResponse> {
    let (game_id, turn_id) = (info.0, info.1);
    let game = Game::find(game_id, &state.db_pool).await?;
    let player_index = GamePlayer::find_index(game_id, claims.uid, &state.db_pool).await?;
    let game_pool = state.stores.pool(game.game_id).await?;

    let orders = Order::find_by_turn_and_player(turn_id, player_index, &game_pool).await?;
    let views: Vec<OrderView> = orders.iter().map(Order::view).collect();
    Ok(HttpResponse::Ok().json(views))
}

#[delete("/{game_id}/turns/{turn_id}/orders/{order_id}")]
pub async fn delete_order(
    state: web::Data<AppState>,
    info: web::Path<(i32, i32, i32)>,
    claims: Claims,
) -> Result<HttpResponse> {
    let (game_id, turn_id, order_id) = (info.0, info.1, info.2);
    let (_, player_index, game_pool) = order_context(&state, game_id, turn_id, &claims).await?;

    let order = Order::find(order_id, &game_pool).await?;
    if order.turn_id != turn_id || order.player_index != player_index {
        Err(InternalError::AccessDenied)?
    }
    Order::delete(order_id, &game_pool).await?;
    Ok(HttpResponse::Ok().json(order.view()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::board::fixtures::{test_system, three_system_board};

    fn order(player_index: i32, kind: OrderKind) -> Order {
        Order { order_id: 0, turn_id: 1, player_index, kind }
    }

    fn expect_rejection(result: std::result::Result<(), InternalError>, fragment: &str) {
        match result {
            Err(InternalError::InvalidOrder(detail)) => {
                assert!(detail.contains(fragment), "unexpected detail: {}", detail)
            },
            other => panic!("expected InvalidOrder, got {:?}", other),
        }
    }

    #[test]
    fn test_move_requires_owned_source() {
        let board = three_system_board();
        let kind = OrderKind::MoveShips { source: 3, target: 2, quantity: 1 };
        expect_rejection(validate_order(&board, &[], 1, &kind), "not owned");
    }

    #[test]
    fn test_move_requires_existing_systems() {
        let board = three_system_board();
        expect_rejection(
            validate_order(&board, &[], 1, &OrderKind::MoveShips { source: 99, target: 1, quantity: 1 }),
            "source system does not exist",
        );
        expect_rejection(
            validate_order(&board, &[], 1, &OrderKind::MoveShips { source: 1, target: 99, quantity: 1 }),
            "target system does not exist",
        );
    }

    #[test]
    fn test_move_requires_adjacency() {
        let board = three_system_board();
        let kind = OrderKind::MoveShips { source: 1, target: 3, quantity: 1 };
        expect_rejection(validate_order(&board, &[], 1, &kind), "not adjacent");
    }

    #[test]
    fn test_move_quantity_bounds() {
        let board = three_system_board();
        expect_rejection(
            validate_order(&board, &[], 1, &OrderKind::MoveShips { source: 1, target: 2, quantity: 0 }),
            "at least 1",
        );
        expect_rejection(
            validate_order(&board, &[], 1, &OrderKind::MoveShips { source: 1, target: 2, quantity: 6 }),
            "not enough ships",
        );
        assert!(validate_order(&board, &[], 1, &OrderKind::MoveShips { source: 1, target: 2, quantity: 5 }).is_ok());
    }

    #[test]
    fn test_move_accounts_for_committed_ships() {
        let board = three_system_board();
        let pending = vec![order(1, OrderKind::MoveShips { source: 1, target: 2, quantity: 3 })];

        assert!(validate_order(&board, &pending, 1, &OrderKind::MoveShips { source: 1, target: 2, quantity: 2 }).is_ok());
        expect_rejection(
            validate_order(&board, &pending, 1, &OrderKind::MoveShips { source: 1, target: 2, quantity: 3 }),
            "not enough ships",
        );
    }

    #[test]
    fn test_build_mine_happy_path_and_sum() {
        let board = three_system_board();
        let donors_ok = vec![MaterialSource { system_id: 1, amount: 15 }];
        assert!(validate_order(&board, &[], 1, &OrderKind::BuildMine { source: 2, donors: donors_ok }).is_ok());

        for total in [14, 16].iter() {
            let donors = vec![MaterialSource { system_id: 1, amount: *total }];
            expect_rejection(
                validate_order(&board, &[], 1, &OrderKind::BuildMine { source: 2, donors }),
                "must total 15",
            );
        }
    }

    #[test]
    fn test_build_mine_two_donors_summing_to_cost() {
        let mut board = three_system_board();
        board.system_mut(2).unwrap().materials = 10;

        let donors = vec![
            MaterialSource { system_id: 1, amount: 8 },
            MaterialSource { system_id: 2, amount: 7 },
        ];
        let kind = OrderKind::BuildMine { source: 4, donors };
        // no system 4: use system 2 as a build site instead, donating from 1 only
        assert!(matches!(validate_order(&board, &[], 1, &kind), Err(InternalError::InvalidOrder(_))));

        let mut donor_board = three_system_board();
        donor_board.systems.insert(4, test_system(4, 3, 0, Some(1), false));
        donor_board.system_mut(2).unwrap().materials = 10;
        let donors = vec![
            MaterialSource { system_id: 1, amount: 8 },
            MaterialSource { system_id: 2, amount: 7 },
        ];
        assert!(validate_order(&donor_board, &[], 1, &OrderKind::BuildMine { source: 4, donors }).is_ok());
    }

    #[test]
    fn test_build_mine_rejects_existing_or_pending_mine() {
        let board = three_system_board();
        let donors = vec![MaterialSource { system_id: 1, amount: 15 }];
        expect_rejection(
            validate_order(&board, &[], 1, &OrderKind::BuildMine { source: 1, donors: donors.clone() }),
            "already has a mine",
        );

        let pending = vec![order(1, OrderKind::BuildMine { source: 2, donors: donors.clone() })];
        expect_rejection(
            validate_order(&board, &pending, 1, &OrderKind::BuildMine { source: 2, donors }),
            "already being built",
        );
    }

    #[test]
    fn test_build_mine_donor_rules() {
        let board = three_system_board();
        expect_rejection(
            validate_order(&board, &[], 1, &OrderKind::BuildMine {
                source: 2,
                donors: vec![MaterialSource { system_id: 2, amount: 15 }],
            }),
            "cannot be the build system",
        );
        expect_rejection(
            validate_order(&board, &[], 1, &OrderKind::BuildMine {
                source: 2,
                donors: vec![MaterialSource { system_id: 3, amount: 15 }],
            }),
            "donor system is not owned",
        );
        expect_rejection(
            validate_order(&board, &[], 1, &OrderKind::BuildMine {
                source: 2,
                donors: vec![
                    MaterialSource { system_id: 1, amount: 8 },
                    MaterialSource { system_id: 1, amount: 7 },
                ],
            }),
            "listed twice",
        );
    }

    #[test]
    fn test_build_mine_donor_materials_account_for_commitments() {
        let board = three_system_board();
        // system 1 has 50 materials; a pending yard there commits 30
        let pending = vec![order(1, OrderKind::BuildShipyard { source: 1 })];
        assert!(validate_order(&board, &pending, 1, &OrderKind::BuildMine {
            source: 2,
            donors: vec![MaterialSource { system_id: 1, amount: 15 }],
        }).is_ok());

        let pending = vec![
            order(1, OrderKind::BuildShipyard { source: 1 }),
            order(1, OrderKind::BuildShips { source: 1, quantity: 10 }),
        ];
        expect_rejection(
            validate_order(&board, &pending, 1, &OrderKind::BuildMine {
                source: 2,
                donors: vec![MaterialSource { system_id: 1, amount: 15 }],
            }),
            "not enough uncommitted materials at a donor",
        );
    }

    #[test]
    fn test_build_shipyard_rules() {
        let mut board = three_system_board();
        expect_rejection(
            validate_order(&board, &[], 1, &OrderKind::BuildShipyard { source: 2 }),
            "requires a mine",
        );
        expect_rejection(
            validate_order(&board, &[], 1, &OrderKind::BuildShipyard { source: 1 }),
            "already has a shipyard",
        );

        board.set_structure(2, StructureKind::Mine, 1);
        expect_rejection(
            validate_order(&board, &[], 1, &OrderKind::BuildShipyard { source: 2 }),
            "not enough uncommitted materials",
        );
        board.system_mut(2).unwrap().materials = SHIPYARD_COST;
        assert!(validate_order(&board, &[], 1, &OrderKind::BuildShipyard { source: 2 }).is_ok());

        let pending = vec![order(1, OrderKind::BuildShipyard { source: 2 })];
        expect_rejection(
            validate_order(&board, &pending, 1, &OrderKind::BuildShipyard { source: 2 }),
            "already being built",
        );
    }

    #[test]
    fn test_build_ships_rules() {
        let board = three_system_board();
        expect_rejection(
            validate_order(&board, &[], 1, &OrderKind::BuildShips { source: 2, quantity: 1 }),
            "requires a mine and a shipyard",
        );
        expect_rejection(
            validate_order(&board, &[], 1, &OrderKind::BuildShips { source: 1, quantity: 0 }),
            "at least 1",
        );
        expect_rejection(
            validate_order(&board, &[], 1, &OrderKind::BuildShips { source: 1, quantity: 51 }),
            "not enough uncommitted materials",
        );
        assert!(validate_order(&board, &[], 1, &OrderKind::BuildShips { source: 1, quantity: 50 }).is_ok());
    }

    #[test]
    fn test_request_shape_checks() {
        let request = OrderRequest {
            order_type: String::from("move_ships"),
            source_system_id: 1,
            target_system_id: None,
            quantity: Some(1),
            material_sources: None,
        };
        assert!(matches!(request.into_kind(), Err(InternalError::InvalidOrder(_))));

        let request = OrderRequest {
            order_type: String::from("warp_jump"),
            source_system_id: 1,
            target_system_id: None,
            quantity: None,
            material_sources: None,
        };
        assert!(matches!(request.into_kind(), Err(InternalError::InvalidOrder(_))));
    }

    #[test]
    fn test_view_round_trip_carries_donors() {
        let donors = vec![MaterialSource { system_id: 1, amount: 15 }];
        let built = order(1, OrderKind::BuildMine { source: 2, donors: donors.clone() });
        let view = built.view();

        assert_eq!("build_mine", view.order_type);
        assert_eq!(Some(donors), view.material_sources);
        assert_eq!(2, view.source_system_id);
    }
}
