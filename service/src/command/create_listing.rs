//! [`Command`] for creating a new [`Listing`].

use common::{
    operations::{By, Commit, Insert, Lock, Select, Transact, Transacted},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::listing::{
    Availability, Capacity, Description, Kind, Location, Slug, Title,
};
use crate::{
    domain::{listing, user, Listing, Price},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for creating a new [`Listing`].
///
/// The [`Slug`] is derived from the [`Title`]. If it's already taken by
/// another [`Listing`], the first free `-1`, `-2`, ... suffixed variant is
/// used instead.
#[derive(Clone, Debug)]
pub struct CreateListing {
    /// ID of the [`User`] hosting a new [`Listing`].
    ///
    /// [`User`]: crate::domain::User
    pub host_id: user::Id,

    /// [`Title`] of a new [`Listing`].
    pub title: listing::Title,

    /// [`Description`] of a new [`Listing`].
    pub description: listing::Description,

    /// [`Location`] of a new [`Listing`].
    pub location: listing::Location,

    /// [`Kind`] of a new [`Listing`].
    pub kind: listing::Kind,

    /// [`Price`] of a new [`Listing`].
    pub price: Price,

    /// [`Capacity`] of a new [`Listing`].
    pub capacity: listing::Capacity,

    /// [`Availability`] of a new [`Listing`].
    pub availability: listing::Availability,
}

impl<Db, Gw, M> Command<CreateListing> for Service<Db, Gw, M>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: for<'s> Database<
            Lock<By<Listing, &'s listing::Slug>>,
            Ok = (),
            Err = Traced<database::Error>,
        > + for<'s> Database<
            Select<By<Option<Listing>, &'s listing::Slug>>,
            Ok = Option<Listing>,
            Err = Traced<database::Error>,
        > + Database<Insert<Listing>, Ok = (), Err = Traced<database::Error>>
        + Database<Commit, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = Listing;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CreateListing,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateListing {
            host_id,
            title,
            description,
            location,
            kind,
            price,
            capacity,
            availability,
        } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let base = listing::Slug::from_title(&title);

        // Serialize allocation of the same `Slug` base.
        tx.execute(Lock(By::new(&base)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let mut slug = base.clone();
        let mut suffix = 0;
        while tx
            .execute(Select(By::<Option<Listing>, _>::new(&slug)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .is_some()
        {
            suffix += 1;
            slug = base.with_suffix(suffix);
        }

        let listing = Listing {
            id: listing::Id::new(),
            title,
            slug,
            description,
            host_id,
            location,
            kind,
            price,
            capacity,
            availability,
            created_at: DateTime::now().coerce(),
        };

        tx.execute(Insert(listing.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        Ok(listing)
    }
}

/// Error of [`CreateListing`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),
}

#[cfg(test)]
mod spec {
    use rust_decimal::Decimal;

    use crate::{
        command::Command as _,
        domain::{listing, Price, User},
        infra::gateway::mock::Scripted,
        test_util::{service, user},
    };

    use super::CreateListing;

    fn create_listing(host: &User, title: &str) -> CreateListing {
        CreateListing {
            host_id: host.id,
            title: listing::Title::new(title).unwrap(),
            description: listing::Description::new("Sunny rooms").unwrap(),
            location: listing::Location::new("Addis Ababa").unwrap(),
            kind: listing::Kind::Rental,
            price: Price::new(Decimal::new(99_950, 2)).unwrap(),
            capacity: listing::Capacity::new(2).unwrap(),
            availability: listing::Availability::new(
                "2025-05-01".parse().unwrap(),
                "2025-05-31".parse().unwrap(),
            )
            .unwrap(),
        }
    }

    #[tokio::test]
    async fn suffixes_colliding_slugs() {
        let (svc, db, _) = service(Scripted::default());
        let host = user(&db, "host", None).await;

        let mut slugs = vec![];
        for title in ["Bole Loft!", "bole loft", "Bole   Loft"] {
            let listing =
                svc.execute(create_listing(&host, title)).await.unwrap();
            slugs.push(listing.slug.to_string());
        }

        assert_eq!(slugs, ["bole-loft", "bole-loft-1", "bole-loft-2"]);
        assert_eq!(db.listings().len(), 3);
        assert!(db.listings().iter().all(|l| l.host_id == host.id));
    }
}
