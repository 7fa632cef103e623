//! [`Notifier`] dispatching [`Notification`]s.

use std::convert::Infallible;

use serde::Deserialize;
use tokio::sync::mpsc;
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::Notification,
    infra::{mailer, Mailer},
};

/// Notification dispatch operation.
///
/// Dispatching never fails the caller: delivery errors are logged and the
/// [`Notification`] is dropped.
pub use common::Handler as Notifier;

/// Strategy of dispatching [`Notification`]s.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Mode {
    /// [`Notification`]s are sent inline, before the request completes.
    #[default]
    Immediate,

    /// [`Notification`]s are queued and sent by a background task.
    Queued,
}

/// [`Notifier`] sending [`Notification`]s inline through a [`Mailer`].
#[derive(Clone, Debug)]
pub struct Immediate<M>(M);

impl<M> Immediate<M> {
    /// Creates a new [`Immediate`] [`Notifier`] on top of the provided
    /// [`Mailer`].
    #[must_use]
    pub fn new(mailer: M) -> Self {
        Self(mailer)
    }
}

impl<M> Notifier<Notification> for Immediate<M>
where
    M: Mailer<mailer::Email, Ok = (), Err = Traced<mailer::Error>>,
{
    type Ok = ();
    type Err = Infallible;

    async fn execute(&self, n: Notification) -> Result<Self::Ok, Self::Err> {
        if let Err(e) = self.0.execute(mailer::Email::from(&n)).await {
            log::error!(
                "Failed to send `{}` notification to `{}`: {e}",
                n.subject(),
                n.recipient,
            );
        }
        Ok(())
    }
}

/// [`Notifier`] putting [`Notification`]s into an in-process queue.
#[derive(Clone, Debug)]
pub struct Queued(mpsc::UnboundedSender<Notification>);

/// Consuming end of a [`Queued`] [`Notifier`].
#[derive(Debug)]
pub struct Receiver(mpsc::UnboundedReceiver<Notification>);

impl Receiver {
    /// Waits for the next queued [`Notification`].
    ///
    /// [`None`] is returned once every [`Queued`] [`Notifier`] is dropped and
    /// the queue is drained.
    pub async fn recv(&mut self) -> Option<Notification> {
        self.0.recv().await
    }
}

/// Creates a new [`Queued`] [`Notifier`] along with its [`Receiver`].
#[must_use]
pub fn queue() -> (Queued, Receiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Queued(tx), Receiver(rx))
}

impl Notifier<Notification> for Queued {
    type Ok = ();
    type Err = Infallible;

    async fn execute(&self, n: Notification) -> Result<Self::Ok, Self::Err> {
        if let Err(mpsc::error::SendError(n)) = self.0.send(n) {
            log::error!(
                "Notification queue is closed, `{}` notification to `{}` \
                 is dropped",
                n.subject(),
                n.recipient,
            );
        }
        Ok(())
    }
}

/// [`Notifier`] chosen by a [`Mode`].
#[derive(Clone, Debug)]
pub enum Dispatch<M> {
    /// [`Immediate`] dispatch.
    Immediate(Immediate<M>),

    /// [`Queued`] dispatch.
    Queued(Queued),
}

impl<M> Notifier<Notification> for Dispatch<M>
where
    Immediate<M>: Notifier<Notification, Ok = (), Err = Infallible>,
{
    type Ok = ();
    type Err = Infallible;

    async fn execute(&self, n: Notification) -> Result<Self::Ok, Self::Err> {
        match self {
            Self::Immediate(i) => i.execute(n).await,
            Self::Queued(q) => q.execute(n).await,
        }
    }
}

#[cfg(test)]
mod spec {
    use crate::{
        domain::{notification::Event, user, Notification},
        infra::{mailer::mock::Recording, Notifier as _},
    };

    use super::{queue, Immediate};

    fn welcome(to: &str) -> Notification {
        Notification {
            recipient: user::Email::new(to).unwrap(),
            event: Event::Welcome {
                username: user::Username::new("abebe").unwrap(),
            },
        }
    }

    #[tokio::test]
    async fn immediate_sends_inline() {
        let mailer = Recording::default();
        let notifier = Immediate::new(mailer.clone());

        notifier.execute(welcome("abebe@example.com")).await.unwrap();

        let sent = mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to.to_string(), "abebe@example.com");
        assert_eq!(sent[0].subject, "Welcome to ALX Travel");
    }

    #[tokio::test]
    async fn queued_defers_until_received() {
        let (notifier, mut rx) = queue();

        notifier.execute(welcome("a@example.com")).await.unwrap();
        notifier.execute(welcome("b@example.com")).await.unwrap();
        drop(notifier);

        let received = rx.recv().await.unwrap();
        assert_eq!(received.recipient.to_string(), "a@example.com");
        let received = rx.recv().await.unwrap();
        assert_eq!(received.recipient.to_string(), "b@example.com");
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn queued_survives_closed_queue() {
        let (notifier, rx) = queue();
        drop(rx);

        assert!(notifier.execute(welcome("a@example.com")).await.is_ok());
    }
}
