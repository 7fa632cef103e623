//! [`Query`] definition.

pub mod booking;
pub mod bookings;
pub mod listing;
pub mod listings;
pub mod reviews;
pub mod user;
pub mod users;

use common::operations::{By, Select};
use tracerr::Traced;

use crate::{
    infra::{database, Database},
    Service,
};

/// [`Query`] of the [`Service`].
pub use common::Handler as Query;

/// [`Query`] [`Select`]ing a `T`ype from a [`Database`].
#[derive(Clone, Copy, Debug)]
#[expect(clippy::module_name_repetitions, reason = "more readable")]
pub struct DatabaseQuery<T>(T);

impl<W, B> DatabaseQuery<By<W, B>> {
    /// Creates a new [`DatabaseQuery`] selecting a `W` by the provided `B`.
    #[must_use]
    pub fn by(by: B) -> Self {
        Self(By::new(by))
    }
}

impl<Db, Gw, M, W, B> Query<DatabaseQuery<By<W, B>>> for Service<Db, Gw, M>
where
    Db: Database<Select<By<W, B>>, Ok = W, Err = Traced<database::Error>>,
{
    type Ok = W;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        DatabaseQuery(by): DatabaseQuery<By<W, B>>,
    ) -> Result<Self::Ok, Self::Err> {
        self.database()
            .execute(Select(by))
            .await
            .map_err(tracerr::wrap!())
    }
}

#[cfg(test)]
mod spec {
    use common::pagination::{Arguments, Selector};

    use crate::{
        command::{Command as _, CreateReview},
        domain::{listing, review},
        infra::gateway::mock::Scripted,
        query::{self, Query as _},
        read,
        test_util::{listing as lodge, service, user},
    };

    #[tokio::test]
    async fn summarizes_ratings_of_listings() {
        let (svc, db, _) = service(Scripted::default());
        let host = user(&db, "host", None).await;
        let reviewed = lodge(&db, &host).await;
        let unreviewed = lodge(&db, &host).await;
        for (username, stars) in [("abebe", 5), ("kebede", 4)] {
            let author = user(&db, username, None).await;
            _ = svc
                .execute(CreateReview {
                    listing_id: reviewed.id,
                    user_id: author.id,
                    rating: review::Rating::new(stars).unwrap(),
                    comment: review::Comment::default(),
                })
                .await
                .unwrap();
        }

        let ratings = svc
            .execute(query::listings::Ratings::by(vec![
                reviewed.id,
                unreviewed.id,
            ]))
            .await
            .unwrap();

        assert_eq!(
            ratings[&reviewed.id],
            read::listing::Rating {
                reviews_count: 2,
                average: Some(4.5),
            },
        );
        assert_eq!(ratings[&unreviewed.id], read::listing::Rating::default());

        let page = svc
            .execute(query::reviews::List::by(Selector {
                arguments: Arguments::new(None::<u32>, 10).unwrap(),
                filter: read::review::list::Filter {
                    listing_id: reviewed.id,
                },
            }))
            .await
            .unwrap();
        assert_eq!(page.total, 2);

        let missing = svc
            .execute(query::listing::ById::by(listing::Id::new()))
            .await
            .unwrap();
        assert!(missing.is_none());
    }
}
