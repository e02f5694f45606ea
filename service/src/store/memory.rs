// service/src/store/memory.rs

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::{OrderPatch, OrderStore, StoreError, StoreResult};
use crate::models::{PrintOrder, VendorInteraction};

/// Process-local store used in development and tests.
#[derive(Default)]
pub struct InMemoryOrderStore {
  orders: RwLock<HashMap<String, PrintOrder>>,
  interactions: RwLock<Vec<VendorInteraction>>,
}

impl InMemoryOrderStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn len(&self) -> usize {
    self.orders.read().len()
  }

  pub fn is_empty(&self) -> bool {
    self.orders.read().is_empty()
  }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
  async fn insert(&self, order: &PrintOrder) -> StoreResult<()> {
    let mut orders = self.orders.write();
    if orders.contains_key(&order.order_id) {
      return Err(StoreError::Duplicate(order.order_id.clone()));
    }
    orders.insert(order.order_id.clone(), order.clone());
    Ok(())
  }

  async fn get(&self, order_id: &str) -> StoreResult<Option<PrintOrder>> {
    Ok(self.orders.read().get(order_id).cloned())
  }

  async fn apply(&self, order_id: &str, patch: OrderPatch) -> StoreResult<PrintOrder> {
    let mut orders = self.orders.write();
    let order = orders
      .get_mut(order_id)
      .ok_or_else(|| StoreError::NotFound(order_id.to_string()))?;
    patch.apply_to(order)?;
    Ok(order.clone())
  }

  async fn append_interactions(&self, interactions: &[VendorInteraction]) -> StoreResult<()> {
    self.interactions.write().extend_from_slice(interactions);
    Ok(())
  }

  async fn interactions(&self, order_id: &str) -> StoreResult<Vec<VendorInteraction>> {
    Ok(
      self
        .interactions
        .read()
        .iter()
        .filter(|i| i.order_id == order_id)
        .cloned()
        .collect(),
    )
  }
}
