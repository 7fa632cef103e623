//! [`Command`] for updating a [`Booking`].

use common::{
    operations::{By, Commit, Lock, Select, Transact, Transacted, Update},
    Date,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::booking::{Guests, Stay};
use crate::{
    domain::{booking, Booking, Price},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for updating a [`Booking`].
///
/// Fields left as [`None`] are not changed.
#[derive(Clone, Debug, Default)]
pub struct UpdateBooking {
    /// ID of the [`Booking`] to update.
    pub booking_id: booking::Id,

    /// New check-in [`Date`] of the [`Stay`].
    pub check_in: Option<Date>,

    /// New check-out [`Date`] of the [`Stay`].
    pub check_out: Option<Date>,

    /// New number of [`Guests`].
    pub guests: Option<booking::Guests>,

    /// New total [`Price`].
    pub price: Option<Price>,

    /// New [`booking::Status`].
    pub status: Option<booking::Status>,
}

impl<Db, Gw, M> Command<UpdateBooking> for Service<Db, Gw, M>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Booking, booking::Id>>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Booking>, booking::Id>>,
            Ok = Option<Booking>,
            Err = Traced<database::Error>,
        > + Database<Update<Booking>, Ok = (), Err = Traced<database::Error>>
        + Database<Commit, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = Booking;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: UpdateBooking,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let UpdateBooking {
            booking_id,
            check_in,
            check_out,
            guests,
            price,
            status,
        } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent actions upon the same `Booking`.
        tx.execute(Lock(By::new(booking_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let mut booking = tx
            .execute(Select(By::<Option<Booking>, _>::new(booking_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::BookingNotExists(booking_id))
            .map_err(tracerr::wrap!())?;

        if check_in.is_some() || check_out.is_some() {
            let check_in = check_in.unwrap_or_else(|| booking.stay.check_in());
            let check_out =
                check_out.unwrap_or_else(|| booking.stay.check_out());
            booking.stay = booking::Stay::new(check_in, check_out)
                .ok_or(E::InvalidStay {
                    check_in,
                    check_out,
                })
                .map_err(tracerr::wrap!())?;
        }
        if let Some(guests) = guests {
            booking.guests = guests;
        }
        if let Some(price) = price {
            booking.price = price;
        }
        if let Some(status) = status {
            booking.status = status;
        }

        tx.execute(Update(booking.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        Ok(booking)
    }
}

/// Error of [`UpdateBooking`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Booking`] doesn't exist.
    #[display("`Booking(id: {_0})` does not exist")]
    #[from(ignore)]
    BookingNotExists(#[error(not(source))] booking::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// Updated [`Stay`] would not end after it starts.
    #[display("`check_out` ({check_out}) is not after `check_in` ({check_in})")]
    #[from(ignore)]
    InvalidStay {
        /// Rejected check-in [`Date`].
        check_in: Date,

        /// Rejected check-out [`Date`].
        check_out: Date,
    },
}

#[cfg(test)]
mod spec {
    use crate::{
        command::Command as _,
        domain::booking,
        infra::gateway::mock::Scripted,
        test_util::{booking as reserve, listing, service, user},
    };

    use super::{ExecutionError, UpdateBooking};

    #[tokio::test]
    async fn moves_check_out_and_confirms() {
        let (svc, db, _) = service(Scripted::default());
        let host = user(&db, "host", None).await;
        let guest = user(&db, "guest", None).await;
        let lodge = listing(&db, &host).await;
        let booking = reserve(&db, &lodge, &guest).await;

        let updated = svc
            .execute(UpdateBooking {
                booking_id: booking.id,
                check_out: Some("2025-03-08".parse().unwrap()),
                status: Some(booking::Status::Confirmed),
                ..UpdateBooking::default()
            })
            .await
            .unwrap();

        assert_eq!(updated.stay.check_in(), booking.stay.check_in());
        assert_eq!(updated.stay.nights(), 7);
        assert_eq!(updated.status, booking::Status::Confirmed);
        assert_eq!(db.bookings()[0].stay, updated.stay);
    }

    #[tokio::test]
    async fn rejects_check_out_before_check_in() {
        let (svc, db, _) = service(Scripted::default());
        let host = user(&db, "host", None).await;
        let guest = user(&db, "guest", None).await;
        let lodge = listing(&db, &host).await;
        let booking = reserve(&db, &lodge, &guest).await;

        let err = svc
            .execute(UpdateBooking {
                booking_id: booking.id,
                check_in: Some("2025-03-04".parse().unwrap()),
                ..UpdateBooking::default()
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::InvalidStay { .. }));
    }
}
