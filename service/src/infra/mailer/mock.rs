//! Recording [`Mailer`] for tests.

use std::sync::{Arc, Mutex};

use tracerr::Traced;

use super::{Email, Error, Mailer};

/// [`Mailer`] remembering every [`Email`] it was asked to send.
#[derive(Clone, Debug, Default)]
pub struct Recording {
    /// Sent [`Email`]s.
    sent: Arc<Mutex<Vec<Email>>>,
}

impl Recording {
    /// Returns all the sent [`Email`]s.
    #[must_use]
    pub fn sent(&self) -> Vec<Email> {
        self.sent.lock().unwrap().clone()
    }
}

impl Mailer<Email> for Recording {
    type Ok = ();
    type Err = Traced<Error>;

    async fn execute(&self, email: Email) -> Result<Self::Ok, Self::Err> {
        self.sent.lock().unwrap().push(email);
        Ok(())
    }
}
