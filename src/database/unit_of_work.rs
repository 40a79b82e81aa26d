use crate::error::{Error, Result};
use sqlx::{PgConnection, PgPool, Postgres, Transaction};
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

/// A database transaction shared by every repository taking part in one
/// operation. Nothing is visible to other connections until [`commit`] is
/// called; dropping the last handle without committing rolls back.
///
/// [`commit`]: PgUnitOfWork::commit
#[derive(Clone)]
pub struct PgUnitOfWork {
    tx: Arc<Mutex<Option<Transaction<'static, Postgres>>>>,
}

impl PgUnitOfWork {
    pub async fn begin(pool: &PgPool) -> Result<Self> {
        let tx = pool.begin().await?;
        Ok(Self {
            tx: Arc::new(Mutex::new(Some(tx))),
        })
    }

    /// Exclusive access to the transaction for the duration of one
    /// repository call.
    pub async fn acquire(&self) -> Result<UnitOfWorkGuard<'_>> {
        let guard = self.tx.lock().await;
        if guard.is_none() {
            return Err(Error::Internal("unit of work already completed".to_string()));
        }
        Ok(UnitOfWorkGuard { guard })
    }

    pub async fn commit(self) -> Result<()> {
        let tx = self
            .tx
            .lock()
            .await
            .take()
            .ok_or_else(|| Error::Internal("unit of work already completed".to_string()))?;
        tx.commit().await?;
        Ok(())
    }
}

pub struct UnitOfWorkGuard<'a> {
    guard: MutexGuard<'a, Option<Transaction<'static, Postgres>>>,
}

impl UnitOfWorkGuard<'_> {
    pub fn conn(&mut self) -> &mut PgConnection {
        // `acquire` only hands out guards over a live transaction.
        let tx = self.guard.as_mut().expect("transaction present while guarded");
        &mut **tx
    }
}
