//! Console [`Mailer`] implementation.

use tracerr::Traced;
use tracing as log;

use super::{Email, Error, Mailer};

/// [`Mailer`] writing emails into the log instead of sending them.
#[derive(Clone, Copy, Debug, Default)]
pub struct Console;

impl Mailer<Email> for Console {
    type Ok = ();
    type Err = Traced<Error>;

    async fn execute(&self, email: Email) -> Result<Self::Ok, Self::Err> {
        let Email { to, subject, body } = email;
        log::info!(%to, %subject, "{body}");
        Ok(())
    }
}
