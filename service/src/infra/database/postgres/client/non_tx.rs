//! [`NonTx`] client definitions.

use std::sync::Arc;

use tokio::sync::{RwLock, RwLockReadGuard};
use tracerr::Traced;

use crate::infra::database::{
    self,
    postgres::{connection, Connection as _},
};

use super::{checkout, get_or_init};

/// Non-transactional Postgres database client.
///
/// Cloned clients share the same [`connection::NonTx`].
#[derive(Clone, Debug)]
pub struct NonTx {
    /// [`connection::Pool`] the [`connection::NonTx`] is checked out from.
    pub(crate) pool: connection::Pool,

    /// Checked out [`connection::NonTx`], if any.
    connection: Arc<RwLock<Option<connection::NonTx>>>,
}

impl NonTx {
    /// Creates a new [`NonTx`] client checking out its connection from the
    /// provided [`connection::Pool`].
    #[must_use]
    pub(crate) fn from_pool(pool: connection::Pool) -> Self {
        Self {
            pool,
            connection: Arc::default(),
        }
    }

    /// Returns the [`connection::NonTx`] of this client, checking it out
    /// from the [`connection::Pool`] if there is none yet.
    pub(crate) async fn connection(
        &self,
    ) -> Result<RwLockReadGuard<'_, connection::NonTx>, Traced<database::Error>>
    {
        get_or_init(&self.connection, || checkout(&self.pool))
            .await
            .map_err(tracerr::wrap!())
    }

    /// Takes the [`connection::NonTx`] out of this client, so a transaction
    /// can be started on it.
    ///
    /// The next statement executed through this client checks out a new
    /// [`connection::NonTx`].
    #[must_use]
    pub(crate) async fn take_connection(&self) -> Option<connection::NonTx> {
        self.connection.write().await.take()
    }
}

forward_connection!(NonTx);
