//! [`Tx`] client definitions.

use std::sync::Arc;

use tokio::sync::{RwLock, RwLockReadGuard};
use tracerr::Traced;

use crate::infra::database::{
    self,
    postgres::{connection, Connection as _},
};

use super::{checkout, get_or_init, NonTx};

/// Transactional Postgres database client.
///
/// The transaction begins on the first executed statement, and lasts until
/// [`Tx::commit()`] is called. Dropping an uncommitted [`Tx`] client rolls
/// its transaction back.
#[derive(Clone, Debug)]
pub struct Tx {
    /// [`connection::Pool`] to check out a [`connection::NonTx`] from, if
    /// the [`NonTx`] client has none.
    pool: connection::Pool,

    /// State shared between clones of this [`Tx`] client.
    shared: Arc<Shared>,
}

/// State shared between clones of a [`Tx`] client.
#[derive(Debug)]
struct Shared {
    /// [`NonTx`] client whose connection the transaction begins on, until
    /// it's taken.
    origin: RwLock<Option<NonTx>>,

    /// Transaction in progress, if any.
    tx: RwLock<Option<connection::Tx>>,
}

impl Tx {
    /// Creates a new [`Tx`] client reusing the connection of the provided
    /// [`NonTx`] client, if it has any.
    #[must_use]
    pub fn from_non_tx(client: NonTx) -> Self {
        Self {
            pool: client.pool.clone(),
            shared: Arc::new(Shared {
                origin: RwLock::new(Some(client)),
                tx: RwLock::new(None),
            }),
        }
    }

    /// Returns the transaction in progress, beginning it if there is none.
    async fn connection(
        &self,
    ) -> Result<RwLockReadGuard<'_, connection::Tx>, Traced<database::Error>>
    {
        get_or_init(&self.shared.tx, || self.begin())
            .await
            .map_err(tracerr::wrap!())
    }

    /// Begins a new transaction.
    async fn begin(&self) -> Result<connection::Tx, Traced<database::Error>> {
        let origin = self.shared.origin.write().await.take();
        let reused = match origin {
            Some(client) => client.take_connection().await,
            None => None,
        };
        let conn = match reused {
            Some(conn) => conn,
            None => checkout(&self.pool).await.map_err(tracerr::wrap!())?,
        };
        connection::Tx::from_non_tx(conn)
            .await
            .map_err(tracerr::wrap!())
    }

    /// Commits the transaction in progress, if any.
    ///
    /// A statement executed through this client afterwards begins a new
    /// transaction.
    ///
    /// # Errors
    ///
    /// If failed to commit the transaction.
    pub async fn commit(&self) -> Result<(), Traced<database::Error>> {
        let Some(tx) = self.shared.tx.write().await.take() else {
            return Ok(());
        };
        tx.commit().await.map_err(tracerr::wrap!())
    }
}

forward_connection!(Tx);
