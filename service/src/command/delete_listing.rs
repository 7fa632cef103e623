//! [`Command`] for deleting a [`Listing`].

use common::operations::{
    By, Commit, Delete, Lock, Select, Transact, Transacted,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{listing, Listing},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for deleting a [`Listing`] along with its [`Booking`]s and
/// [`Review`]s.
///
/// [`Booking`]: crate::domain::Booking
/// [`Review`]: crate::domain::Review
#[derive(Clone, Copy, Debug, From)]
pub struct DeleteListing {
    /// ID of the [`Listing`] to delete.
    pub listing_id: listing::Id,
}

impl<Db, Gw, M> Command<DeleteListing> for Service<Db, Gw, M>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Listing, listing::Id>>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Listing>, listing::Id>>,
            Ok = Option<Listing>,
            Err = Traced<database::Error>,
        > + Database<
            Delete<By<Listing, listing::Id>>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<Commit, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: DeleteListing,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let DeleteListing { listing_id } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Lock(By::new(listing_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        _ = tx
            .execute(Select(By::<Option<Listing>, _>::new(listing_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::ListingNotExists(listing_id))
            .map_err(tracerr::wrap!())?;

        tx.execute(Delete(By::new(listing_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
    }
}

/// Error of [`DeleteListing`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Listing`] doesn't exist.
    #[display("`Listing(id: {_0})` does not exist")]
    #[from(ignore)]
    ListingNotExists(#[error(not(source))] listing::Id),
}

#[cfg(test)]
mod spec {
    use crate::{
        command::Command as _,
        infra::gateway::mock::Scripted,
        test_util::{booking, listing, service, user},
    };

    use super::{DeleteListing, ExecutionError};

    #[tokio::test]
    async fn deletes_listing_with_bookings() {
        let (svc, db, _) = service(Scripted::default());
        let host = user(&db, "host", None).await;
        let guest = user(&db, "guest", None).await;
        let lodge = listing(&db, &host).await;
        _ = booking(&db, &lodge, &guest).await;

        svc.execute(DeleteListing {
            listing_id: lodge.id,
        })
        .await
        .unwrap();

        assert!(db.listings().is_empty());
        assert!(db.bookings().is_empty());

        let err = svc
            .execute(DeleteListing {
                listing_id: lodge.id,
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::ListingNotExists(_)));
    }
}
