//! Service contains the business logic of the application.
//!
//! List of available Cargo features:
#![doc = document_features::document_features!()]
#![deny(
    nonstandard_style,
    rust_2018_idioms,
    rustdoc::all,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code
)]
#![forbid(non_ascii_idents)]
#![warn(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    clippy::pedantic,
    clippy::wildcard_enum_match_arm,
    deprecated_in_future,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    unreachable_pub,
    unused_crate_dependencies,
    unused_import_braces,
    unused_labels,
    unused_lifetimes,
    unused_qualifications,
    unused_results
)]

pub mod command;
pub mod domain;
pub mod infra;
pub mod query;
pub mod read;
pub mod task;

use std::{convert::Infallible, time::Duration};

use common::{
    money::Currency,
    operations::{By, Start},
};
use derive_more::Debug;
use tracerr::Traced;

#[cfg(doc)]
use infra::{Database, Gateway};

use crate::{
    domain::Notification,
    infra::{
        mailer,
        notifier::{self, Dispatch, Immediate},
        Mailer, Notifier,
    },
};

pub use self::{command::Command, query::Query, task::Task};

/// [`Service`] configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// [JWT] encoding key.
    ///
    /// [JWT]: https://datatracker.ietf.org/doc/html/rfc7519
    #[debug(skip)]
    pub jwt_encoding_key: jsonwebtoken::EncodingKey,

    /// [JWT] decoding key.
    ///
    /// [JWT]: https://datatracker.ietf.org/doc/html/rfc7519
    #[debug(skip)]
    pub jwt_decoding_key: jsonwebtoken::DecodingKey,

    /// Lifetime of a newly created [`Session`].
    ///
    /// [`Session`]: domain::user::Session
    pub session_ttl: Duration,

    /// Base URL of the frontend, payers are redirected back to it after a
    /// checkout.
    pub frontend_url: String,

    /// [`Currency`] bookings are charged in.
    pub currency: Currency,

    /// How [`Notification`]s are dispatched.
    pub notifications: notifier::Mode,
}

/// Domain service.
#[derive(Clone, Debug)]
pub struct Service<Db, Gw, M> {
    /// Configuration of this [`Service`].
    config: Config,

    /// [`Database`] of this [`Service`].
    database: Db,

    /// Payment [`Gateway`] of this [`Service`].
    gateway: Gw,

    /// [`Notifier`] of this [`Service`].
    notifier: Dispatch<M>,
}

impl<Db, Gw, M> Service<Db, Gw, M> {
    /// Creates a new [`Service`] with the provided parameters.
    ///
    /// If [`notifier::Mode::Queued`] is configured, the returned
    /// [`task::Background`] runs the [`task::DeliverNotifications`] loop
    /// sending queued [`Notification`]s through the provided [`Mailer`].
    pub fn new(
        config: Config,
        database: Db,
        gateway: Gw,
        mailer: M,
    ) -> (Self, task::Background)
    where
        M: Mailer<mailer::Email, Ok = (), Err = Traced<mailer::Error>>
            + 'static,
    {
        let mut bg = task::Background::default();

        let notifier = match config.notifications {
            notifier::Mode::Immediate => {
                Dispatch::Immediate(Immediate::new(mailer))
            }
            notifier::Mode::Queued => {
                let (queued, rx) = notifier::queue();
                let delivery = Immediate::new(mailer);
                bg.spawn("deliver_notifications", async move {
                    delivery
                        .execute(Start(
                            By::<task::DeliverNotifications, _>::new(rx),
                        ))
                        .await
                });
                Dispatch::Queued(queued)
            }
        };

        let this = Service {
            config,
            database,
            gateway,
            notifier,
        };
        (this, bg)
    }

    /// Returns [`Config`] of this [`Service`].
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns [`Database`] of this [`Service`].
    #[must_use]
    pub fn database(&self) -> &Db {
        &self.database
    }

    /// Returns payment [`Gateway`] of this [`Service`].
    #[must_use]
    pub fn gateway(&self) -> &Gw {
        &self.gateway
    }

    /// Dispatches the provided [`Notification`].
    ///
    /// Never fails, as delivery errors are only logged.
    async fn notify(&self, notification: Notification)
    where
        Dispatch<M>: Notifier<Notification, Ok = (), Err = Infallible>,
    {
        self.notifier
            .execute(notification)
            .await
            .unwrap_or_else(|e| match e {});
    }
}


#[cfg(test)]
mod spec {
    use rust_decimal::Decimal;

    use crate::{
        command::{Command as _, CreateBooking},
        domain::{booking, Price},
        infra::{gateway::mock::Scripted, notifier},
        test_util::{listing, service_with, user},
    };

    #[tokio::test]
    async fn delivers_queued_notifications_in_background() {
        let (svc, bg, db, mailer) =
            service_with(Scripted::default(), notifier::Mode::Queued);
        assert_eq!(bg.len(), 1);
        let host = user(&db, "host", Some("host@example.com")).await;
        let guest = user(&db, "guest", Some("guest@example.com")).await;
        let lodge = listing(&db, &host).await;

        _ = svc
            .execute(CreateBooking {
                listing_id: lodge.id,
                user_id: guest.id,
                stay: booking::Stay::new(
                    "2025-06-10".parse().unwrap(),
                    "2025-06-12".parse().unwrap(),
                )
                .unwrap(),
                guests: booking::Guests::new(2).unwrap(),
                price: Price::new(Decimal::new(300_000, 2)).unwrap(),
            })
            .await
            .unwrap();
        assert!(mailer.sent().is_empty());

        drop(svc);
        bg.await.unwrap();

        let sent = mailer.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].to.to_string(), "guest@example.com");
        assert_eq!(sent[1].to.to_string(), "host@example.com");
    }
}
