//! [`Command`] for signing up a new [`User`].

use std::convert::Infallible;

use derive_more::{Display, Error, From};
use secrecy::SecretBox;
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::user::{Email, Name, Password, Username};
use crate::{
    command::{create_user, CreateUser},
    domain::{notification, user, Notification, User},
    infra::{notifier::Dispatch, Notifier},
    Service,
};

use super::Command;

/// [`Command`] for signing up a new [`User`] with a [`Password`].
///
/// Welcomes the [`User`] with a [`Notification`] if an [`Email`] is
/// provided.
#[derive(Clone, Debug)]
pub struct SignUpUser {
    /// [`Username`] of a new [`User`].
    pub username: user::Username,

    /// [`Email`] of a new [`User`].
    pub email: Option<user::Email>,

    /// First [`Name`] of a new [`User`].
    pub first_name: user::Name,

    /// Last [`Name`] of a new [`User`].
    pub last_name: user::Name,

    /// [`Password`] of a new [`User`].
    pub password: SecretBox<user::Password>,
}

impl<Db, Gw, M> Command<SignUpUser> for Service<Db, Gw, M>
where
    Self: Command<
        CreateUser,
        Ok = User,
        Err = Traced<create_user::ExecutionError>,
    >,
    Dispatch<M>: Notifier<Notification, Ok = (), Err = Infallible>,
{
    type Ok = User;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: SignUpUser) -> Result<Self::Ok, Self::Err> {
        let SignUpUser {
            username,
            email,
            first_name,
            last_name,
            password,
        } = cmd;

        let user = self
            .execute(CreateUser {
                username,
                email,
                first_name,
                last_name,
                password: Some(password),
            })
            .await
            .map_err(tracerr::map_from_and_wrap!())?;

        if let Some(recipient) = user.email.clone() {
            self.notify(Notification {
                recipient,
                event: notification::Event::Welcome {
                    username: user.username.clone(),
                },
            })
            .await;
        }

        Ok(user)
    }
}

/// Error of [`SignUpUser`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`CreateUser`] [`Command`] failed.
    #[display("Failed to create a `User`: {_0}")]
    CreateUser(create_user::ExecutionError),
}

#[cfg(test)]
mod spec {
    use secrecy::SecretBox;

    use crate::{
        command::Command as _, domain::user, infra::gateway::mock::Scripted,
        test_util::service,
    };

    use super::SignUpUser;

    fn sign_up(username: &str, email: Option<&str>) -> SignUpUser {
        SignUpUser {
            username: user::Username::new(username).unwrap(),
            email: email.map(|e| user::Email::new(e).unwrap()),
            first_name: user::Name::new("Almaz").unwrap(),
            last_name: user::Name::default(),
            password: SecretBox::new(Box::new(
                user::Password::new("password123").unwrap(),
            )),
        }
    }

    #[tokio::test]
    async fn welcomes_user_with_email() {
        let (svc, db, mailer) = service(Scripted::default());

        let user = svc
            .execute(sign_up("almaz", Some("almaz@example.com")))
            .await
            .unwrap();

        assert!(user.password_hash.is_usable());
        assert_eq!(db.users().len(), 1);
        let sent = mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].subject, "Welcome to ALX Travel");
        assert_eq!(
            sent[0].body,
            "Hi almaz, your account has been created successfully!",
        );
    }

    #[tokio::test]
    async fn skips_welcome_without_email() {
        let (svc, _, mailer) = service(Scripted::default());

        _ = svc.execute(sign_up("almaz", None)).await.unwrap();

        assert!(mailer.sent().is_empty());
    }
}
