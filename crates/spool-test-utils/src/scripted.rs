//! Scripted in-memory inventory

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use spool_inventory::{Error, Inventory, InventoryApi, Result};

struct ScriptState {
    current: std::result::Result<Inventory, String>,
    fetches: usize,
}

/// An [`InventoryApi`] whose snapshot the test controls.
///
/// Clones share state, so a test can keep one handle and give the engine
/// another, then change the snapshot between sync cycles.
#[derive(Clone)]
pub struct ScriptedInventory {
    inner: Arc<Mutex<ScriptState>>,
}

impl ScriptedInventory {
    pub fn new(inventory: Inventory) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ScriptState {
                current: Ok(inventory),
                fetches: 0,
            })),
        }
    }

    /// Replace the snapshot the next fetch returns.
    pub fn set(&self, inventory: Inventory) {
        self.inner.lock().unwrap().current = Ok(inventory);
    }

    /// Make the next fetch fail with a schema error.
    pub fn fail(&self, message: &str) {
        self.inner.lock().unwrap().current = Err(message.to_string());
    }

    /// How many times the engine has fetched so far.
    pub fn fetch_count(&self) -> usize {
        self.inner.lock().unwrap().fetches
    }
}

#[async_trait]
impl InventoryApi for ScriptedInventory {
    async fn fetch_inventory(&self) -> Result<Inventory> {
        let mut state = self.inner.lock().unwrap();
        state.fetches += 1;
        match &state.current {
            Ok(inventory) => Ok(inventory.clone()),
            Err(message) => Err(Error::Schema {
                url: "scripted".to_string(),
                message: message.clone(),
            }),
        }
    }
}
