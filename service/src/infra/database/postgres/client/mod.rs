//! Postgres database client definitions.
//!
//! Clients acquire their [`Connection`] from the pool lazily, on the first
//! statement executed through them.

use std::future::Future;

use tokio::sync::{RwLock, RwLockReadGuard};
use tracerr::Traced;

use crate::infra::database::{
    self,
    postgres::{self, connection},
};

#[cfg(doc)]
use super::Connection;

/// Implements [`Connection`] for a client by forwarding every statement to
/// the [`Connection`] returned by its `connection()` method.
macro_rules! forward_connection {
    ($client:ty) => {
        impl $crate::infra::database::postgres::Connection for $client {
            async fn query<T>(
                &self,
                stmt: &T,
                params: &[&(dyn ::tokio_postgres::types::ToSql + Sync)],
            ) -> Result<
                Vec<::tokio_postgres::Row>,
                ::tracerr::Traced<$crate::infra::database::Error>,
            >
            where
                T: ::tokio_postgres::ToStatement + ?Sized,
            {
                let conn = self.connection().await.map_err(tracerr::wrap!())?;
                conn.query(stmt, params).await.map_err(tracerr::wrap!())
            }

            async fn query_opt<T>(
                &self,
                stmt: &T,
                params: &[&(dyn ::tokio_postgres::types::ToSql + Sync)],
            ) -> Result<
                Option<::tokio_postgres::Row>,
                ::tracerr::Traced<$crate::infra::database::Error>,
            >
            where
                T: ::tokio_postgres::ToStatement + ?Sized,
            {
                let conn = self.connection().await.map_err(tracerr::wrap!())?;
                conn.query_opt(stmt, params).await.map_err(tracerr::wrap!())
            }

            async fn query_one<T>(
                &self,
                stmt: &T,
                params: &[&(dyn ::tokio_postgres::types::ToSql + Sync)],
            ) -> Result<
                ::tokio_postgres::Row,
                ::tracerr::Traced<$crate::infra::database::Error>,
            >
            where
                T: ::tokio_postgres::ToStatement + ?Sized,
            {
                let conn = self.connection().await.map_err(tracerr::wrap!())?;
                conn.query_one(stmt, params).await.map_err(tracerr::wrap!())
            }

            async fn exec<T>(
                &self,
                stmt: &T,
                params: &[&(dyn ::tokio_postgres::types::ToSql + Sync)],
            ) -> Result<u64, ::tracerr::Traced<$crate::infra::database::Error>>
            where
                T: ::tokio_postgres::ToStatement + ?Sized,
            {
                let conn = self.connection().await.map_err(tracerr::wrap!())?;
                conn.exec(stmt, params).await.map_err(tracerr::wrap!())
            }

            async fn batch_exec(
                &self,
                query: &str,
            ) -> Result<(), ::tracerr::Traced<$crate::infra::database::Error>>
            {
                let conn = self.connection().await.map_err(tracerr::wrap!())?;
                conn.batch_exec(query).await.map_err(tracerr::wrap!())
            }
        }
    };
}

/// Checks out a [`connection::NonTx`] from the provided [`connection::Pool`].
pub(crate) async fn checkout(
    pool: &connection::Pool,
) -> Result<connection::NonTx, Traced<database::Error>> {
    pool.get()
        .await
        .map_err(tracerr::from_and_wrap!(=> postgres::Error))
        .map_err(tracerr::map_from)
}

/// Returns the value stored in the provided `slot`, initializing it with the
/// provided `init` first if the `slot` is empty.
async fn get_or_init<T, F>(
    slot: &RwLock<Option<T>>,
    init: impl FnOnce() -> F,
) -> Result<RwLockReadGuard<'_, T>, Traced<database::Error>>
where
    F: Future<Output = Result<T, Traced<database::Error>>>,
{
    match RwLockReadGuard::try_map(slot.read().await, Option::as_ref) {
        Ok(value) => return Ok(value),
        Err(empty) => drop(empty),
    }

    let mut value = slot.write().await;
    if value.is_none() {
        *value = Some(init().await.map_err(tracerr::wrap!())?);
    }
    Ok(RwLockReadGuard::map(value.downgrade(), |v| {
        v.as_ref().expect("slot cannot be emptied while guard is alive")
    }))
}

pub mod non_tx;
pub mod tx;

pub use self::{non_tx::NonTx, tx::Tx};
