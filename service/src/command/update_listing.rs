//! [`Command`] for updating a [`Listing`].

use common::{
    operations::{By, Commit, Lock, Select, Transact, Transacted, Update},
    Date,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::listing::{
    Availability, Capacity, Description, Kind, Location, Slug, Title,
};
use crate::{
    domain::{listing, Listing, Price},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for updating a [`Listing`].
///
/// Fields left as [`None`] are not changed. The [`Slug`] stays the same
/// even if the [`Title`] changes.
#[derive(Clone, Debug, Default)]
pub struct UpdateListing {
    /// ID of the [`Listing`] to update.
    pub listing_id: listing::Id,

    /// New [`Title`] of the [`Listing`].
    pub title: Option<listing::Title>,

    /// New [`Description`] of the [`Listing`].
    pub description: Option<listing::Description>,

    /// New [`Location`] of the [`Listing`].
    pub location: Option<listing::Location>,

    /// New [`Kind`] of the [`Listing`].
    pub kind: Option<listing::Kind>,

    /// New [`Price`] of the [`Listing`].
    pub price: Option<Price>,

    /// New [`Capacity`] of the [`Listing`].
    pub capacity: Option<listing::Capacity>,

    /// New first day of the [`Availability`] of the [`Listing`].
    pub available_from: Option<Date>,

    /// New last day of the [`Availability`] of the [`Listing`].
    pub available_to: Option<Date>,
}

impl<Db, Gw, M> Command<UpdateListing> for Service<Db, Gw, M>
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
        > + Database<Update<Listing>, Ok = (), Err = Traced<database::Error>>
        + Database<Commit, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = Listing;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: UpdateListing,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let UpdateListing {
            listing_id,
            title,
            description,
            location,
            kind,
            price,
            capacity,
            available_from,
            available_to,
        } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent actions upon the same `Listing`.
        tx.execute(Lock(By::new(listing_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let mut listing = tx
            .execute(Select(By::<Option<Listing>, _>::new(listing_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::ListingNotExists(listing_id))
            .map_err(tracerr::wrap!())?;

        if available_from.is_some() || available_to.is_some() {
            let from = available_from
                .unwrap_or_else(|| listing.availability.first_day());
            let to =
                available_to.unwrap_or_else(|| listing.availability.last_day());
            listing.availability = listing::Availability::new(from, to)
                .ok_or(E::InvalidAvailability { from, to })
                .map_err(tracerr::wrap!())?;
        }
        if let Some(title) = title {
            listing.title = title;
        }
        if let Some(description) = description {
            listing.description = description;
        }
        if let Some(location) = location {
            listing.location = location;
        }
        if let Some(kind) = kind {
            listing.kind = kind;
        }
        if let Some(price) = price {
            listing.price = price;
        }
        if let Some(capacity) = capacity {
            listing.capacity = capacity;
        }

        tx.execute(Update(listing.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        Ok(listing)
    }
}

/// Error of [`UpdateListing`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// Updated [`Availability`] would end before it starts.
    #[display("`available_from` ({from}) is after `available_to` ({to})")]
    #[from(ignore)]
    InvalidAvailability {
        /// First day of the rejected [`Availability`].
        from: Date,

        /// Last day of the rejected [`Availability`].
        to: Date,
    },

    /// [`Listing`] doesn't exist.
    #[display("`Listing(id: {_0})` does not exist")]
    #[from(ignore)]
    ListingNotExists(#[error(not(source))] listing::Id),
}

#[cfg(test)]
mod spec {
    use crate::{
        command::Command as _,
        domain::listing::{Capacity, Title},
        infra::gateway::mock::Scripted,
        test_util::{listing, service, user},
    };

    use super::{ExecutionError, UpdateListing};

    #[tokio::test]
    async fn keeps_slug_on_title_change() {
        let (svc, db, _) = service(Scripted::default());
        let host = user(&db, "host", None).await;
        let lodge = listing(&db, &host).await;

        let updated = svc
            .execute(UpdateListing {
                listing_id: lodge.id,
                title: Some(Title::new("Gondar Castle Inn").unwrap()),
                capacity: Some(Capacity::new(8).unwrap()),
                ..UpdateListing::default()
            })
            .await
            .unwrap();

        assert_eq!(updated.title.to_string(), "Gondar Castle Inn");
        assert_eq!(updated.slug, lodge.slug);
        assert_eq!(updated.capacity.get(), 8);
        assert_eq!(updated.price, lodge.price);
    }

    #[tokio::test]
    async fn rejects_inverted_availability() {
        let (svc, db, _) = service(Scripted::default());
        let host = user(&db, "host", None).await;
        let lodge = listing(&db, &host).await;

        let err = svc
            .execute(UpdateListing {
                listing_id: lodge.id,
                available_to: Some("2024-12-31".parse().unwrap()),
                ..UpdateListing::default()
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::InvalidAvailability { .. },
        ));
        assert_eq!(db.listings()[0].availability, lodge.availability);
    }
}
