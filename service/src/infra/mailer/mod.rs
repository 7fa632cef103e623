//! [`Mailer`] delivering emails.

mod console;
#[cfg(test)]
pub mod mock;
pub mod smtp;

use derive_more::{Display, Error as StdError, From};
use tracerr::Traced;

use crate::domain::{user, Notification};

pub use self::{console::Console, smtp::Smtp};

/// Email delivery operation.
pub use common::Handler as Mailer;

/// Plain text email.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Email {
    /// Recipient address.
    pub to: user::Email,

    /// Subject line.
    pub subject: String,

    /// Plain text body.
    pub body: String,
}

impl From<&Notification> for Email {
    fn from(n: &Notification) -> Self {
        Self {
            to: n.recipient.clone(),
            subject: n.subject().to_owned(),
            body: n.body(),
        }
    }
}

/// [`Mailer`] implementation selected at startup.
#[derive(Clone, Debug, From)]
pub enum Transport {
    /// Delivery over SMTP.
    Smtp(Smtp),

    /// Delivery into the log.
    Console(Console),
}

impl Mailer<Email> for Transport {
    type Ok = ();
    type Err = Traced<Error>;

    async fn execute(&self, email: Email) -> Result<Self::Ok, Self::Err> {
        match self {
            Self::Smtp(m) => m.execute(email).await,
            Self::Console(m) => m.execute(email).await,
        }
        .map_err(tracerr::wrap!())
    }
}

/// [`Mailer`] error.
#[derive(Debug, Display, From, StdError)]
pub enum Error {
    /// Email address failed to parse.
    #[display("Invalid email address: {_0}")]
    Address(lettre::address::AddressError),

    /// Email message failed to build.
    #[display("Failed to build an email: {_0}")]
    Message(lettre::error::Error),

    /// SMTP transport failed.
    #[display("SMTP delivery failed: {_0}")]
    Smtp(lettre::transport::smtp::Error),
}
