//! [`DeliverNotifications`] [`Task`].

use std::convert::Infallible;

use common::operations::{By, Start};
use tracing as log;

use crate::{
    domain::Notification,
    infra::{
        notifier::{Immediate, Receiver},
        Notifier,
    },
};

use super::Task;

/// [`Task`] draining the queue of [`Notification`]s dispatched by a
/// [`Queued`] [`Notifier`] and sending each one inline.
///
/// [`Queued`]: crate::infra::notifier::Queued
#[derive(Clone, Copy, Debug)]
pub struct DeliverNotifications;

impl<M> Task<Start<By<DeliverNotifications, Receiver>>> for Immediate<M>
where
    Self: Notifier<Notification, Ok = (), Err = Infallible>,
{
    type Ok = ();
    type Err = Infallible;

    async fn execute(
        &self,
        Start(by): Start<By<DeliverNotifications, Receiver>>,
    ) -> Result<Self::Ok, Self::Err> {
        let mut queue = by.into_inner();

        log::info!("`task::DeliverNotifications` started");
        while let Some(notification) = queue.recv().await {
            self.execute(notification).await?;
        }
        log::info!("`task::DeliverNotifications` stopped: queue is closed");

        Ok(())
    }
}

#[cfg(test)]
mod spec {
    use common::operations::{By, Start};

    use crate::{
        domain::{notification::Event, user, Notification},
        infra::{
            mailer::mock::Recording,
            notifier::{self, Immediate},
            Notifier as _,
        },
        Task as _,
    };

    use super::DeliverNotifications;

    #[tokio::test]
    async fn delivers_queued_notifications() {
        let mailer = Recording::default();
        let (queued, rx) = notifier::queue();

        for to in ["a@example.com", "b@example.com"] {
            queued
                .execute(Notification {
                    recipient: user::Email::new(to).unwrap(),
                    event: Event::PaymentConfirmation {
                        booking_id: Default::default(),
                    },
                })
                .await
                .unwrap();
        }
        drop(queued);

        Immediate::new(mailer.clone())
            .execute(Start(By::<DeliverNotifications, _>::new(rx)))
            .await
            .unwrap();

        let sent = mailer.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].to.to_string(), "a@example.com");
        assert_eq!(sent[1].subject, "Payment Successful");
    }
}
