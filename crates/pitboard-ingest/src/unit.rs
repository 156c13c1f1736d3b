//! Running a block of store writes as one unit of work.

use std::future::Future;

use pitboard_core::store::WarehouseStore;
use tracing::warn;

use crate::error::{store_err, Result};

/// Run `work` between `begin` and `commit`, rolling back when either the
/// work or the commit fails.
///
/// A failed commit can leave the unit open, and an open unit would make
/// every later `begin` on the same store fail.
pub async fn unit_of_work<S, T, F>(store: &S, work: F) -> Result<T>
where
  S: WarehouseStore,
  F: Future<Output = Result<T>>,
{
  store.begin().await.map_err(store_err)?;
  match work.await {
    Ok(value) => match store.commit().await {
      Ok(()) => Ok(value),
      Err(e) => {
        roll_back(store).await;
        Err(store_err(e))
      }
    },
    Err(e) => {
      roll_back(store).await;
      Err(e)
    }
  }
}

async fn roll_back<S: WarehouseStore>(store: &S) {
  if let Err(rb) = store.rollback().await {
    warn!(error = %rb, "rollback failed");
  }
}
