//! [`Command`] for verifying a [`Payment`] on the payment gateway.

use std::convert::Infallible;

use common::operations::{
    By, Commit, Lock, Select, Transact, Transacted, Update,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

#[cfg(doc)]
use crate::infra::Gateway;
use crate::{
    domain::{
        booking, notification, payment, user, Booking, Notification, Payment,
        User,
    },
    infra::{database, gateway, notifier::Dispatch, Database, Notifier},
    Service,
};

use super::Command;

/// [`Command`] for verifying a [`Payment`] on the payment [`Gateway`] and
/// applying the reported [`payment::Status`].
///
/// The [`payment::Status`] only moves out of [`payment::Status::Pending`].
/// Once a [`Payment`] becomes [`payment::Status::Completed`], its pending
/// [`Booking`] is confirmed and the [`User`] who made it is notified.
#[derive(Clone, Debug, From)]
pub struct VerifyPayment {
    /// [`payment::TransactionId`] of the [`Payment`] to verify.
    pub transaction_id: payment::TransactionId,
}

impl<Db, Gw, M> Command<VerifyPayment> for Service<Db, Gw, M>
where
    Db: for<'t> Database<
            Select<By<Option<Payment>, &'t payment::TransactionId>>,
            Ok = Option<Payment>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Payment, payment::Id>>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Payment>, payment::Id>>,
            Ok = Option<Payment>,
            Err = Traced<database::Error>,
        > + Database<Update<Payment>, Ok = (), Err = Traced<database::Error>>
        + Database<
            Lock<By<Booking, booking::Id>>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Booking>, booking::Id>>,
            Ok = Option<Booking>,
            Err = Traced<database::Error>,
        > + Database<Update<Booking>, Ok = (), Err = Traced<database::Error>>
        + Database<Commit, Ok = (), Err = Traced<database::Error>>,
    Gw: gateway::Gateway<
        gateway::Verify,
        Ok = gateway::Verification,
        Err = Traced<gateway::Error>,
    >,
    Dispatch<M>: Notifier<Notification, Ok = (), Err = Infallible>,
{
    type Ok = Payment;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: VerifyPayment,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let VerifyPayment { transaction_id } = cmd;

        let payment_id = self
            .database()
            .execute(Select(By::<Option<Payment>, _>::new(&transaction_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or_else(|| E::PaymentNotExists(transaction_id.clone()))
            .map_err(tracerr::wrap!())?
            .id;

        let verification = self
            .gateway()
            .execute(gateway::Verify(transaction_id.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        let reported = payment::Status::from_gateway(&verification.status);

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent verifications of the same `Payment`.
        tx.execute(Lock(By::new(payment_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        let mut payment = tx
            .execute(Select(By::<Option<Payment>, _>::new(payment_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::PaymentNotExists(transaction_id))
            .map_err(tracerr::wrap!())?;

        if !payment.transition_to(reported) {
            log::debug!(
                "`Payment(id: {})` stays `{}`, gateway reported `{}`",
                payment.id,
                payment.status,
                verification.status,
            );
            return Ok(payment);
        }
        tx.execute(Update(payment.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let mut payer = None;
        if payment.status == payment::Status::Completed {
            tx.execute(Lock(By::new(payment.booking_id)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?;
            let booking = tx
                .execute(Select(By::<Option<Booking>, _>::new(
                    payment.booking_id,
                )))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?;
            if let Some(mut booking) = booking {
                if booking.status == booking::Status::Pending {
                    booking.status = booking::Status::Confirmed;
                    tx.execute(Update(booking.clone()))
                        .await
                        .map_err(tracerr::map_from_and_wrap!(=> E))?;
                }
                payer = Some(booking.user_id);
            }
        }

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        if let Some(user_id) = payer {
            let recipient = self
                .database()
                .execute(Select(By::<Option<User>, _>::new(user_id)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?
                .and_then(|u| u.email);
            if let Some(recipient) = recipient {
                self.notify(Notification {
                    recipient,
                    event: notification::Event::PaymentConfirmation {
                        booking_id: payment.booking_id,
                    },
                })
                .await;
            }
        }

        Ok(payment)
    }
}

/// Error of [`VerifyPayment`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Gateway`] error.
    #[display("`Gateway` operation failed: {_0}")]
    Gateway(gateway::Error),

    /// [`Payment`] with the provided [`payment::TransactionId`] doesn't
    /// exist.
    #[display("`Payment(transaction_id: {_0})` does not exist")]
    #[from(ignore)]
    PaymentNotExists(#[error(not(source))] payment::TransactionId),
}

#[cfg(test)]
mod spec {
    use crate::{
        command::{Command as _, InitiatePayment},
        domain::{booking, payment},
        infra::{
            database::Memory,
            gateway::{self, mock::Scripted},
            mailer::mock::Recording,
        },
        test_util::{booking as reserve, listing, service, user, TestService},
    };

    use super::{ExecutionError, VerifyPayment};

    /// Creates a [`Scripted`] gateway and a [`TestService`] with a single
    /// pending payment, returning its transaction ID.
    async fn pending_payment(
    ) -> (Scripted, TestService, Memory, Recording, payment::TransactionId)
    {
        let gateway = Scripted::default()
            .accepting(Some("chapa-tx-7"), "https://checkout.chapa.co/7");
        let (svc, db, mailer) = service(gateway.clone());
        let host = user(&db, "host", None).await;
        let guest = user(&db, "guest", Some("guest@example.com")).await;
        let lodge = listing(&db, &host).await;
        let booking = reserve(&db, &lodge, &guest).await;
        let tx_id = svc
            .execute(InitiatePayment {
                booking_id: booking.id,
            })
            .await
            .unwrap()
            .payment
            .transaction_id;
        (gateway, svc, db, mailer, tx_id)
    }

    #[tokio::test]
    async fn completes_payment_and_confirms_booking() {
        let (gateway, svc, db, mailer, tx_id) = pending_payment().await;
        gateway.set_status("Successful");

        let payment = svc
            .execute(VerifyPayment {
                transaction_id: tx_id,
            })
            .await
            .unwrap();

        assert_eq!(payment.status, payment::Status::Completed);
        assert_eq!(db.payments()[0].status, payment::Status::Completed);
        assert_eq!(db.bookings()[0].status, booking::Status::Confirmed);

        let sent = mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to.to_string(), "guest@example.com");
        assert_eq!(sent[0].subject, "Payment Successful");
        assert_eq!(
            sent[0].body,
            format!(
                "Your payment for booking {} was successful.",
                payment.booking_id,
            ),
        );
    }

    #[tokio::test]
    async fn fails_payment_without_notification() {
        let (gateway, svc, db, mailer, tx_id) = pending_payment().await;
        gateway.set_status("failed");

        let payment = svc
            .execute(VerifyPayment {
                transaction_id: tx_id,
            })
            .await
            .unwrap();

        assert_eq!(payment.status, payment::Status::Failed);
        assert_eq!(db.bookings()[0].status, booking::Status::Pending);
        assert!(mailer.sent().is_empty());
    }

    #[tokio::test]
    async fn never_leaves_terminal_status() {
        let (gateway, svc, db, mailer, tx_id) = pending_payment().await;

        gateway.set_status("pending");
        let payment = svc
            .execute(VerifyPayment {
                transaction_id: tx_id.clone(),
            })
            .await
            .unwrap();
        assert_eq!(payment.status, payment::Status::Pending);

        gateway.set_status("failed");
        _ = svc
            .execute(VerifyPayment {
                transaction_id: tx_id.clone(),
            })
            .await
            .unwrap();

        gateway.set_status("successful");
        let payment = svc
            .execute(VerifyPayment {
                transaction_id: tx_id,
            })
            .await
            .unwrap();

        assert_eq!(payment.status, payment::Status::Failed);
        assert_eq!(db.payments()[0].status, payment::Status::Failed);
        assert_eq!(db.bookings()[0].status, booking::Status::Pending);
        assert!(mailer.sent().is_empty());
    }

    #[tokio::test]
    async fn fails_on_unknown_transaction() {
        let (gateway, svc, _, _, _) = pending_payment().await;
        gateway.set_status("successful");

        let err = svc
            .execute(VerifyPayment {
                transaction_id: "unknown".parse().unwrap(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::PaymentNotExists(_)));
        assert_eq!(gateway.verified(), 0);
    }

    #[tokio::test]
    async fn echoes_gateway_rejection() {
        let (gateway, svc, db, _, tx_id) = pending_payment().await;

        let err = svc
            .execute(VerifyPayment {
                transaction_id: tx_id,
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::Gateway(gateway::Error::Rejected(_)),
        ));
        assert_eq!(gateway.verified(), 1);
        assert_eq!(db.payments()[0].status, payment::Status::Pending);
    }
}
