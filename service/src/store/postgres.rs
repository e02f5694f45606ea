// service/src/store/postgres.rs

//! PostgreSQL-backed store. Orders are kept as JSONB documents; a patch is
//! applied inside one transaction holding the row lock.

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use tracing::instrument;

use super::{OrderPatch, OrderStore, StoreError, StoreResult};
use crate::models::{PrintOrder, VendorInteraction};

pub const SCHEMA: &str = include_str!("schema.sql");

#[derive(Clone)]
pub struct PgOrderStore {
  pool: PgPool,
}

impl PgOrderStore {
  pub const fn new(pool: PgPool) -> Self {
    Self { pool }
  }

  /// Creates the tables if they do not exist yet.
  pub async fn ensure_schema(&self) -> StoreResult<()> {
    sqlx::raw_sql(SCHEMA).execute(&self.pool).await?;
    Ok(())
  }
}

#[async_trait]
impl OrderStore for PgOrderStore {
  #[instrument(name = "store::insert", skip_all, fields(order_id = %order.order_id))]
  async fn insert(&self, order: &PrintOrder) -> StoreResult<()> {
    let result = sqlx::query(
      r#"
      INSERT INTO print_orders (order_id, document, created_at, updated_at)
      VALUES ($1, $2, $3, $4)
      ON CONFLICT (order_id) DO NOTHING
      "#,
    )
    .bind(&order.order_id)
    .bind(Json(order))
    .bind(order.created_at)
    .bind(order.updated_at)
    .execute(&self.pool)
    .await?;

    if result.rows_affected() == 0 {
      return Err(StoreError::Duplicate(order.order_id.clone()));
    }
    Ok(())
  }

  async fn get(&self, order_id: &str) -> StoreResult<Option<PrintOrder>> {
    let row = sqlx::query("SELECT document FROM print_orders WHERE order_id = $1")
      .bind(order_id)
      .fetch_optional(&self.pool)
      .await?;
    row
      .map(|r| r.try_get::<Json<PrintOrder>, _>("document").map(|Json(o)| o))
      .transpose()
      .map_err(StoreError::from)
  }

  #[instrument(name = "store::apply", skip(self, patch))]
  async fn apply(&self, order_id: &str, patch: OrderPatch) -> StoreResult<PrintOrder> {
    let mut tx = self.pool.begin().await?;

    let row = sqlx::query("SELECT document FROM print_orders WHERE order_id = $1 FOR UPDATE")
      .bind(order_id)
      .fetch_optional(&mut *tx)
      .await?;
    let Some(row) = row else {
      tx.rollback().await?;
      return Err(StoreError::NotFound(order_id.to_string()));
    };
    let Json(mut order): Json<PrintOrder> = row.try_get("document")?;

    if let Err(e) = patch.apply_to(&mut order) {
      tx.rollback().await?;
      return Err(e);
    }

    sqlx::query("UPDATE print_orders SET document = $2, updated_at = $3 WHERE order_id = $1")
      .bind(order_id)
      .bind(Json(&order))
      .bind(order.updated_at)
      .execute(&mut *tx)
      .await?;
    tx.commit().await?;
    Ok(order)
  }

  async fn append_interactions(&self, interactions: &[VendorInteraction]) -> StoreResult<()> {
    if interactions.is_empty() {
      return Ok(());
    }
    let mut tx = self.pool.begin().await?;
    for interaction in interactions {
      sqlx::query(
        r#"
        INSERT INTO vendor_interactions (id, order_id, recorded_at, document)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (id) DO NOTHING
        "#,
      )
      .bind(&interaction.id)
      .bind(&interaction.order_id)
      .bind(interaction.timestamp)
      .bind(Json(interaction))
      .execute(&mut *tx)
      .await?;
    }
    tx.commit().await?;
    Ok(())
  }

  async fn interactions(&self, order_id: &str) -> StoreResult<Vec<VendorInteraction>> {
    let rows = sqlx::query(
      "SELECT document FROM vendor_interactions WHERE order_id = $1 ORDER BY recorded_at, seq",
    )
    .bind(order_id)
    .fetch_all(&self.pool)
    .await?;
    rows
      .into_iter()
      .map(|r| r.try_get::<Json<VendorInteraction>, _>("document").map(|Json(i)| i))
      .collect::<Result<Vec<_>, _>>()
      .map_err(StoreError::from)
  }
}
