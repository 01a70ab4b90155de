//! The `TableSource` trait and the source-keyed table cache.
//!
//! The trait is implemented by storage backends (e.g.
//! `sorriso-store-sqlite`). Everything downstream depends on this
//! abstraction and on the [`BaseTables`] it yields, not on any concrete
//! backend.

use std::{
  collections::HashMap,
  future::Future,
  sync::{Arc, Mutex},
};

use tokio::sync::OnceCell;

use crate::table::BaseTables;

// ─── Trait ───────────────────────────────────────────────────────────────────

/// A read-only origin of the four base tables.
pub trait TableSource: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Stable identifier of the underlying data; the cache key.
  fn source_id(&self) -> String;

  /// Read all four tables in full.
  ///
  /// Must not hold any connection open after returning. Repeated calls
  /// against unchanged data return structurally identical tables.
  fn load_base_tables(
    &self,
  ) -> impl Future<Output = Result<BaseTables, Self::Error>> + Send + '_;
}

// ─── Cache ───────────────────────────────────────────────────────────────────

type Slot = Arc<OnceCell<Arc<BaseTables>>>;

/// Write-once, read-many memo of loaded tables, keyed by
/// [`TableSource::source_id`].
///
/// Concurrent first requests for the same source share a single load. A
/// failed load leaves the slot empty so the next request tries again.
#[derive(Debug, Default)]
pub struct TableCache {
  slots: Mutex<HashMap<String, Slot>>,
}

impl TableCache {
  pub fn new() -> Self { Self::default() }

  /// Return the cached tables for `source`, loading them on first use.
  pub async fn get_or_load<S: TableSource>(
    &self,
    source: &S,
  ) -> Result<Arc<BaseTables>, S::Error> {
    let id = source.source_id();
    let slot = self.slot(&id);

    if let Some(tables) = slot.get() {
      tracing::debug!(source = %id, "table cache hit");
      return Ok(Arc::clone(tables));
    }

    let tables = slot
      .get_or_try_init(|| async {
        tracing::info!(source = %id, "loading base tables");
        source.load_base_tables().await.map(Arc::new)
      })
      .await?;

    Ok(Arc::clone(tables))
  }

  /// The cached tables for `source_id`, if loaded.
  pub fn get(&self, source_id: &str) -> Option<Arc<BaseTables>> {
    self
      .lock()
      .get(source_id)
      .and_then(|slot| slot.get().cloned())
  }

  /// Drop the cached tables for `source_id`. Returns whether anything was
  /// cached. Holders of the old `Arc` keep their copy.
  pub fn invalidate(&self, source_id: &str) -> bool {
    self
      .lock()
      .remove(source_id)
      .is_some_and(|slot| slot.initialized())
  }

  fn slot(&self, id: &str) -> Slot {
    Arc::clone(self.lock().entry(id.to_owned()).or_default())
  }

  fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Slot>> {
    // The map is never left half-updated, so a poisoned lock is still usable.
    self.slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
  }
}
