//! [`Command`] for creating a new [`Review`].

use common::{
    operations::{By, Commit, Insert, Lock, Select, Transact, Transacted},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{listing, review, user, Listing, Review, User},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for creating a new [`Review`] of a [`Listing`].
///
/// A [`User`] may review the same [`Listing`] only once.
#[derive(Clone, Debug)]
pub struct CreateReview {
    /// ID of the [`Listing`] to review.
    pub listing_id: listing::Id,

    /// ID of the [`User`] leaving the [`Review`].
    pub user_id: user::Id,

    /// [`review::Rating`] of the [`Review`].
    pub rating: review::Rating,

    /// [`review::Comment`] of the [`Review`].
    pub comment: review::Comment,
}

impl<Db, Gw, M> Command<CreateReview> for Service<Db, Gw, M>
where
    Db: Database<
            Select<By<Option<Listing>, listing::Id>>,
            Ok = Option<Listing>,
            Err = Traced<database::Error>,
        > + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<User, user::Id>>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Review>, (listing::Id, user::Id)>>,
            Ok = Option<Review>,
            Err = Traced<database::Error>,
        > + Database<Insert<Review>, Ok = (), Err = Traced<database::Error>>
        + Database<Commit, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = Review;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CreateReview) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateReview {
            listing_id,
            user_id,
            rating,
            comment,
        } = cmd;

        _ = self
            .database()
            .execute(Select(By::<Option<Listing>, _>::new(listing_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::ListingNotExists(listing_id))
            .map_err(tracerr::wrap!())?;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Serializes reviews of the same `User`.
        tx.execute(Lock(By::new(user_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        let existing = tx
            .execute(Select(By::<Option<Review>, _>::new((
                listing_id, user_id,
            ))))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if existing.is_some() {
            return Err(tracerr::new!(E::AlreadyReviewed(listing_id)));
        }

        let review = Review {
            id: review::Id::new(),
            listing_id,
            user_id,
            rating,
            comment,
            created_at: DateTime::now().coerce(),
        };
        tx.execute(Insert(review.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        Ok(review)
    }
}

/// Error of [`CreateReview`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`User`] has already reviewed the [`Listing`].
    #[display("`Listing(id: {_0})` is already reviewed by this `User`")]
    #[from(ignore)]
    AlreadyReviewed(#[error(not(source))] listing::Id),

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
        domain::{listing, review, user as account},
        infra::gateway::mock::Scripted,
        test_util::{listing as lodge, service, user},
    };

    use super::{CreateReview, ExecutionError};

    fn review_of(listing_id: listing::Id, user_id: account::Id) -> CreateReview
    {
        CreateReview {
            listing_id,
            user_id,
            rating: review::Rating::new(4).unwrap(),
            comment: "Quiet place".parse().unwrap(),
        }
    }

    #[tokio::test]
    async fn rejects_second_review_of_same_listing() {
        let (svc, db, _) = service(Scripted::default());
        let host = user(&db, "host", None).await;
        let guest = user(&db, "guest", None).await;
        let listing = lodge(&db, &host).await;

        let created =
            svc.execute(review_of(listing.id, guest.id)).await.unwrap();
        assert_eq!(created.rating.get(), 4);
        assert_eq!(created.comment.to_string(), "Quiet place");

        let err = svc
            .execute(review_of(listing.id, guest.id))
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::AlreadyReviewed(_)));
        assert_eq!(db.reviews().len(), 1);

        _ = svc.execute(review_of(listing.id, host.id)).await.unwrap();
        assert_eq!(db.reviews().len(), 2);
    }

    #[tokio::test]
    async fn fails_on_unknown_listing() {
        let (svc, db, _) = service(Scripted::default());
        let guest = user(&db, "guest", None).await;

        let err = svc
            .execute(review_of(listing::Id::new(), guest.id))
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::ListingNotExists(_)));
        assert!(db.reviews().is_empty());
    }
}
