//! Postgres [`Database`] implementation.

pub mod client;
pub mod connection;
mod impls;

use deadpool_postgres::Runtime;
use derive_more::{Deref, Display, Error as StdError, From};
use tokio_postgres::{types::ToSql, NoTls};
use tracerr::Traced;

use crate::infra::database;
#[cfg(doc)]
use crate::infra::Database;

pub use refinery::embed_migrations;

pub use self::{
    client::{NonTx, Tx},
    connection::Connection,
};

pub use deadpool_postgres::Config;

/// Postgres [`Database`] client.
///
/// Either [`NonTx`] (the default) executing every statement on its own, or
/// [`Tx`] executing them inside a single transaction.
#[derive(Clone, Debug, Deref)]
pub struct Postgres<T = NonTx>(T);

impl Postgres {
    /// Creates a new [`Postgres`] client backed by a connection pool built
    /// from the provided [`Config`].
    ///
    /// No connection is established until the first statement is executed.
    ///
    /// # Errors
    ///
    /// If the provided [`Config`] is invalid.
    pub fn new(conf: &Config) -> Result<Self, Traced<database::Error>> {
        let pool = conf
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(tracerr::from_and_wrap!(=> Error))
            .map_err(tracerr::map_from)?;
        Ok(Self(NonTx::from_pool(pool)))
    }
}

impl Postgres<Tx> {
    /// Acquires an advisory lock on the provided `key` within the provided
    /// `namespace`, waiting for a concurrent transaction holding it to end.
    ///
    /// The lock is released once this transaction ends.
    ///
    /// # Errors
    ///
    /// If failed to acquire the lock.
    pub(crate) async fn lock_key(
        &self,
        namespace: &str,
        key: &(dyn ToSql + Sync),
    ) -> Result<(), Traced<database::Error>> {
        const SQL: &str = "\
            SELECT pg_advisory_xact_lock(\
                hashtext($1::VARCHAR || ':' || $2::VARCHAR)\
            )";
        self.query(SQL, &[&namespace, key])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

/// Postgres database [`Error`].
#[derive(Debug, Display, StdError, From)]
pub enum Error {
    /// Statement failed to execute.
    #[display("Postgres statement failed: {_0}")]
    Connection(connection::Error),

    /// [`Config`] doesn't describe a valid [`connection::Pool`].
    #[display("Invalid Postgres pool configuration: {_0}")]
    PoolCreationError(connection::PoolCreationError),

    /// No connection could be checked out of the [`connection::Pool`].
    #[display("Failed to check out Postgres connection: {_0}")]
    PoolError(connection::PoolError),
}
