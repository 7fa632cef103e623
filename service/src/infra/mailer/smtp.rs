//! SMTP [`Mailer`] implementation.

use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport as _, Message, Tokio1Executor,
};
use secrecy::{ExposeSecret as _, SecretString};
use tracerr::Traced;
use tracing as log;

use super::{Email, Error, Mailer};

/// [`Smtp`] configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// SMTP server host.
    pub host: String,

    /// SMTP server port.
    pub port: u16,

    /// Indicator whether to upgrade the connection with `STARTTLS`.
    pub starttls: bool,

    /// Username to authenticate with, if any.
    pub username: Option<String>,

    /// Password to authenticate with.
    pub password: SecretString,

    /// `From` header of the sent emails.
    pub from: String,
}

/// [`Mailer`] sending emails over SMTP.
#[derive(Clone, Debug)]
pub struct Smtp {
    /// Pooled SMTP transport.
    transport: AsyncSmtpTransport<Tokio1Executor>,

    /// Sender [`Mailbox`].
    from: Mailbox,
}

impl Smtp {
    /// Creates a new [`Smtp`] [`Mailer`] out of the provided [`Config`].
    ///
    /// # Errors
    ///
    /// If the sender address is invalid or the TLS parameters cannot be
    /// initialized.
    pub fn new(config: Config) -> Result<Self, Traced<Error>> {
        let Config {
            host,
            port,
            starttls,
            username,
            password,
            from,
        } = config;

        let from = from
            .parse::<Mailbox>()
            .map_err(tracerr::from_and_wrap!(=> Error))?;

        let builder = if starttls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&host)
                .map_err(tracerr::from_and_wrap!(=> Error))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&host)
        }
        .port(port);
        let builder = match username {
            Some(username) => builder.credentials(Credentials::new(
                username,
                password.expose_secret().to_owned(),
            )),
            None => builder,
        };

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

impl Mailer<Email> for Smtp {
    type Ok = ();
    type Err = Traced<Error>;

    async fn execute(&self, email: Email) -> Result<Self::Ok, Self::Err> {
        let Email { to, subject, body } = email;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to
                .to_string()
                .parse::<Mailbox>()
                .map_err(tracerr::from_and_wrap!(=> Error))?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body)
            .map_err(tracerr::from_and_wrap!(=> Error))?;

        drop(
            self.transport
                .send(message)
                .await
                .map_err(tracerr::from_and_wrap!(=> Error))?,
        );
        log::debug!("Email sent to `{to}`");

        Ok(())
    }
}
