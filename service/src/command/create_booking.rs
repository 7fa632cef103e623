//! [`Command`] for creating a new [`Booking`].

use std::{collections::HashMap, convert::Infallible};

use common::{
    operations::{By, Commit, Insert, Select, Transact, Transacted},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::booking::{Guests, Stay};
use crate::{
    domain::{
        booking, listing, notification, user, Booking, Listing, Notification,
        Price, User,
    },
    infra::{database, notifier::Dispatch, Database, Notifier},
    Service,
};

use super::Command;

/// [`Command`] for creating a new [`booking::Status::Pending`] [`Booking`].
///
/// Notifies the guest about the created [`Booking`] and the host of the
/// [`Listing`] about the new guest, each only if they have an email.
#[derive(Clone, Debug)]
pub struct CreateBooking {
    /// ID of the [`Listing`] to book.
    pub listing_id: listing::Id,

    /// ID of the [`User`] making a new [`Booking`].
    pub user_id: user::Id,

    /// [`Stay`] of a new [`Booking`].
    pub stay: booking::Stay,

    /// Number of [`Guests`] of a new [`Booking`].
    pub guests: booking::Guests,

    /// Total [`Price`] of a new [`Booking`].
    pub price: Price,
}

impl<Db, Gw, M> Command<CreateBooking> for Service<Db, Gw, M>
where
    Db: Database<
            Select<By<Option<Listing>, listing::Id>>,
            Ok = Option<Listing>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<HashMap<user::Id, User>, [user::Id; 2]>>,
            Ok = HashMap<user::Id, User>,
            Err = Traced<database::Error>,
        > + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Insert<Booking>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<Commit, Ok = (), Err = Traced<database::Error>>,
    Dispatch<M>: Notifier<Notification, Ok = (), Err = Infallible>,
{
    type Ok = Booking;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CreateBooking,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateBooking {
            listing_id,
            user_id,
            stay,
            guests,
            price,
        } = cmd;

        let listing = self
            .database()
            .execute(Select(By::<Option<Listing>, _>::new(listing_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::ListingNotExists(listing_id))
            .map_err(tracerr::wrap!())?;

        let mut users = self
            .database()
            .execute(Select(By::new([user_id, listing.host_id])))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        let guest = users
            .get(&user_id)
            .cloned()
            .ok_or(E::UserNotExists(user_id))
            .map_err(tracerr::wrap!())?;
        // Deleted hosts are not notified.
        let host = users.remove(&listing.host_id);

        let booking = Booking {
            id: booking::Id::new(),
            listing_id,
            user_id,
            stay,
            guests,
            price,
            status: booking::Status::Pending,
            created_at: DateTime::now().coerce(),
        };

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        tx.execute(Insert(booking.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        if let Some(recipient) = guest.email.clone() {
            self.notify(Notification {
                recipient,
                event: notification::Event::BookingConfirmation {
                    booking_id: booking.id,
                },
            })
            .await;
        }
        if let Some(recipient) = host.and_then(|h| h.email) {
            self.notify(Notification {
                recipient,
                event: notification::Event::HostNotification {
                    booking_id: booking.id,
                    guest_name: guest.display_name(),
                },
            })
            .await;
        }

        Ok(booking)
    }
}

/// Error of [`CreateBooking`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Listing`] doesn't exist.
    #[display("`Listing(id: {_0})` does not exist")]
    #[from(ignore)]
    ListingNotExists(#[error(not(source))] listing::Id),

    /// [`User`] doesn't exist.
    #[display("`User(id: {_0})` does not exist")]
    #[from(ignore)]
    UserNotExists(#[error(not(source))] user::Id),
}

#[cfg(test)]
mod spec {
    use common::operations::Update;
    use rust_decimal::Decimal;

    use crate::{
        command::Command as _,
        domain::{booking, listing, user, Price, User},
        infra::{gateway::mock::Scripted, Database as _},
        test_util::{listing as lodge, service, user},
    };

    use super::{CreateBooking, ExecutionError};

    fn create_booking(listing_id: listing::Id, guest: &User) -> CreateBooking {
        CreateBooking {
            listing_id,
            user_id: guest.id,
            stay: booking::Stay::new(
                "2025-06-10".parse().unwrap(),
                "2025-06-12".parse().unwrap(),
            )
            .unwrap(),
            guests: booking::Guests::new(3).unwrap(),
            price: Price::new(Decimal::new(300_000, 2)).unwrap(),
        }
    }

    #[tokio::test]
    async fn notifies_guest_and_host() {
        let (svc, db, mailer) = service(Scripted::default());
        let host = user(&db, "host", Some("host@example.com")).await;
        let mut guest = user(&db, "guest", Some("guest@example.com")).await;
        guest.first_name = user::Name::new("Sara").unwrap();
        guest.last_name = user::Name::new("Tesfaye").unwrap();
        db.execute(Update(guest.clone())).await.unwrap();
        let listing = lodge(&db, &host).await;

        let booking = svc
            .execute(create_booking(listing.id, &guest))
            .await
            .unwrap();

        assert_eq!(booking.status, booking::Status::Pending);
        assert_eq!(db.bookings().len(), 1);

        let sent = mailer.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].to.to_string(), "guest@example.com");
        assert_eq!(
            sent[0].body,
            format!(
                "Your booking with ID {} has been created successfully!",
                booking.id,
            ),
        );
        assert_eq!(sent[1].to.to_string(), "host@example.com");
        assert_eq!(sent[1].subject, "New Booking on Your Listing");
        assert_eq!(
            sent[1].body,
            format!(
                "You have a new booking (ID {}) from Sara Tesfaye.",
                booking.id,
            ),
        );
    }

    #[tokio::test]
    async fn skips_recipients_without_email() {
        let (svc, db, mailer) = service(Scripted::default());
        let host = user(&db, "host", Some("host@example.com")).await;
        let guest = user(&db, "guest", None).await;
        let listing = lodge(&db, &host).await;

        let booking = svc
            .execute(create_booking(listing.id, &guest))
            .await
            .unwrap();

        let sent = mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(
            sent[0].body,
            format!("You have a new booking (ID {}) from guest.", booking.id),
        );
    }

    #[tokio::test]
    async fn fails_on_unknown_listing() {
        let (svc, db, mailer) = service(Scripted::default());
        let guest = user(&db, "guest", Some("guest@example.com")).await;

        let err = svc
            .execute(create_booking(listing::Id::new(), &guest))
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::ListingNotExists(_)));
        assert!(db.bookings().is_empty());
        assert!(mailer.sent().is_empty());
    }
}
