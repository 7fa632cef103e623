//! [`Command`] for initiating a [`Payment`] of a [`Booking`].

use common::{
    operations::{By, Commit, Insert, Select, Transact, Transacted},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

#[cfg(doc)]
use crate::infra::Gateway;
use crate::{
    domain::{booking, payment, user, Booking, Payment, User},
    infra::{database, gateway, Database},
    Service,
};

use super::Command;

/// [`Command`] for initiating a [`Payment`] of a [`Booking`] on the payment
/// [`Gateway`].
///
/// A [`payment::Status::Pending`] [`Payment`] is recorded only once the
/// [`Gateway`] accepts the transaction. If a [`Payment`] with the reported
/// [`payment::TransactionId`] already exists, it's reused.
#[derive(Clone, Copy, Debug, From)]
pub struct InitiatePayment {
    /// ID of the [`Booking`] to pay for.
    pub booking_id: booking::Id,
}

/// Output of [`InitiatePayment`] [`Command`].
#[derive(Clone, Debug)]
pub struct Output {
    /// Initiated [`Payment`].
    pub payment: Payment,

    /// URL of the hosted checkout page to redirect the payer to.
    pub checkout_url: String,
}

impl<Db, Gw, M> Command<InitiatePayment> for Service<Db, Gw, M>
where
    Db: Database<
            Select<By<Option<Booking>, booking::Id>>,
            Ok = Option<Booking>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: for<'t> Database<
            Select<By<Option<Payment>, &'t payment::TransactionId>>,
            Ok = Option<Payment>,
            Err = Traced<database::Error>,
        > + Database<Insert<Payment>, Ok = (), Err = Traced<database::Error>>
        + Database<Commit, Ok = (), Err = Traced<database::Error>>,
    Gw: gateway::Gateway<
        gateway::Initialize,
        Ok = gateway::Checkout,
        Err = Traced<gateway::Error>,
    >,
{
    type Ok = Output;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: InitiatePayment,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let InitiatePayment { booking_id } = cmd;

        let booking = self
            .database()
            .execute(Select(By::<Option<Booking>, _>::new(booking_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::BookingNotExists(booking_id))
            .map_err(tracerr::wrap!())?;
        let payer = self
            .database()
            .execute(Select(By::<Option<User>, _>::new(booking.user_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::UserNotExists(booking.user_id))
            .map_err(tracerr::wrap!())?;

        let reference = payment::TransactionId::reference(booking.id);
        let checkout = self
            .gateway()
            .execute(gateway::Initialize {
                amount: booking.price.in_currency(self.config().currency),
                email: payer.email,
                first_name: payer.first_name,
                last_name: payer.last_name,
                tx_ref: reference.to_string(),
                callback_url: format!(
                    "{}/payment/callback/",
                    self.config().frontend_url.trim_end_matches('/'),
                ),
            })
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let transaction_id = checkout
            .transaction_id
            .and_then(payment::TransactionId::new)
            .unwrap_or(reference);

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let existing = tx
            .execute(Select(By::<Option<Payment>, _>::new(&transaction_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        let payment = if let Some(payment) = existing {
            log::debug!(
                "Reusing `Payment(id: {})` for `{transaction_id}` transaction",
                payment.id,
            );
            payment
        } else {
            let now = DateTime::now();
            let payment = Payment {
                id: payment::Id::new(),
                booking_id: booking.id,
                transaction_id,
                amount: booking.price,
                status: payment::Status::Pending,
                created_at: now.coerce(),
                updated_at: now.coerce(),
            };
            tx.execute(Insert(payment.clone()))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?;
            payment
        };
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        Ok(Output {
            payment,
            checkout_url: checkout.checkout_url,
        })
    }
}

/// Error of [`InitiatePayment`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Booking`] doesn't exist.
    #[display("`Booking(id: {_0})` does not exist")]
    #[from(ignore)]
    BookingNotExists(#[error(not(source))] booking::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Gateway`] error.
    #[display("`Gateway` operation failed: {_0}")]
    Gateway(gateway::Error),

    /// [`User`] who made the [`Booking`] doesn't exist.
    #[display("`User(id: {_0})` does not exist")]
    #[from(ignore)]
    UserNotExists(#[error(not(source))] user::Id),
}

#[cfg(test)]
mod spec {
    use common::money::Currency;
    use rust_decimal::Decimal;

    use crate::{
        command::Command as _,
        domain::{booking, payment},
        infra::gateway::{self, mock::Scripted},
        test_util::{booking as reserve, listing, service, user},
    };

    use super::{ExecutionError, InitiatePayment};

    #[tokio::test]
    async fn records_pending_payment() {
        let gateway = Scripted::default()
            .accepting(Some("chapa-tx-1"), "https://checkout.chapa.co/abc");
        let (svc, db, _) = service(gateway.clone());
        let host = user(&db, "host", None).await;
        let guest = user(&db, "guest", Some("guest@example.com")).await;
        let lodge = listing(&db, &host).await;
        let booking = reserve(&db, &lodge, &guest).await;

        let out = svc
            .execute(InitiatePayment {
                booking_id: booking.id,
            })
            .await
            .unwrap();

        assert_eq!(out.checkout_url, "https://checkout.chapa.co/abc");
        assert_eq!(out.payment.transaction_id.to_string(), "chapa-tx-1");
        assert_eq!(out.payment.status, payment::Status::Pending);
        assert_eq!(out.payment.amount, booking.price);
        assert_eq!(db.payments().len(), 1);

        let sent = gateway.initialized();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].amount.amount, Decimal::new(450_000, 2));
        assert_eq!(sent[0].amount.currency, Currency::Etb);
        assert_eq!(sent[0].tx_ref, format!("booking-{}", booking.id));
        assert_eq!(
            sent[0].callback_url,
            "https://travel.example.com/payment/callback/",
        );
        assert_eq!(
            sent[0].email.as_ref().map(ToString::to_string).as_deref(),
            Some("guest@example.com"),
        );
    }

    #[tokio::test]
    async fn falls_back_to_reference_and_reuses_payment() {
        let gateway =
            Scripted::default().accepting(None, "https://checkout.chapa.co/x");
        let (svc, db, _) = service(gateway);
        let host = user(&db, "host", None).await;
        let guest = user(&db, "guest", None).await;
        let lodge = listing(&db, &host).await;
        let booking = reserve(&db, &lodge, &guest).await;

        let first = svc
            .execute(InitiatePayment {
                booking_id: booking.id,
            })
            .await
            .unwrap();
        let second = svc
            .execute(InitiatePayment {
                booking_id: booking.id,
            })
            .await
            .unwrap();

        assert_eq!(
            first.payment.transaction_id.to_string(),
            format!("booking-{}", booking.id),
        );
        assert_eq!(first.payment.id, second.payment.id);
        assert_eq!(db.payments().len(), 1);
    }

    #[tokio::test]
    async fn creates_nothing_when_rejected() {
        let (svc, db, _) = service(Scripted::default());
        let host = user(&db, "host", None).await;
        let guest = user(&db, "guest", None).await;
        let lodge = listing(&db, &host).await;
        let booking = reserve(&db, &lodge, &guest).await;

        let err = svc
            .execute(InitiatePayment {
                booking_id: booking.id,
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::Gateway(gateway::Error::Rejected(_)),
        ));
        assert!(db.payments().is_empty());
    }

    #[tokio::test]
    async fn fails_on_unknown_booking() {
        let gateway = Scripted::default().accepting(Some("tx"), "https://x");
        let (svc, _, _) = service(gateway.clone());

        let err = svc
            .execute(InitiatePayment {
                booking_id: booking::Id::new(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::BookingNotExists(_)));
        assert!(gateway.initialized().is_empty());
    }
}
