//! Scripted [`Gateway`] for tests.

use std::sync::{Arc, Mutex};

use serde_json::{json, Value};
use tracerr::Traced;

use super::{Checkout, Error, Gateway, Initialize, Verification, Verify};

/// [`Gateway`] answering with preconfigured replies and recording requests.
#[derive(Clone, Debug, Default)]
pub struct Scripted {
    /// Inner shared state.
    inner: Arc<Mutex<State>>,
}

/// State of a [`Scripted`] [`Gateway`].
#[derive(Debug, Default)]
struct State {
    /// Reply to [`Initialize`] requests, rejected when [`None`].
    checkout: Option<(Option<String>, String)>,

    /// Reply to [`Verify`] requests, rejected when [`None`].
    status: Option<String>,

    /// Received [`Initialize`] requests.
    initialized: Vec<Initialize>,

    /// Number of received [`Verify`] requests.
    verified: usize,
}

impl Scripted {
    /// Makes [`Initialize`] requests succeed with the provided transaction
    /// ID and checkout URL.
    #[must_use]
    pub fn accepting(self, tx_id: Option<&str>, checkout_url: &str) -> Self {
        self.inner.lock().unwrap().checkout =
            Some((tx_id.map(Into::into), checkout_url.into()));
        self
    }

    /// Makes [`Verify`] requests report the provided transaction status.
    pub fn set_status(&self, status: &str) {
        self.inner.lock().unwrap().status = Some(status.into());
    }

    /// Returns all the received [`Initialize`] requests.
    #[must_use]
    pub fn initialized(&self) -> Vec<Initialize> {
        self.inner.lock().unwrap().initialized.clone()
    }

    /// Returns the number of received [`Verify`] requests.
    #[must_use]
    pub fn verified(&self) -> usize {
        self.inner.lock().unwrap().verified
    }
}

impl Gateway<Initialize> for Scripted {
    type Ok = Checkout;
    type Err = Traced<Error>;

    async fn execute(&self, req: Initialize) -> Result<Self::Ok, Self::Err> {
        let mut state = self.inner.lock().unwrap();
        state.initialized.push(req);
        let Some((transaction_id, checkout_url)) = state.checkout.clone()
        else {
            return Err(tracerr::new!(Error::Rejected(json!({
                "message": "Invalid API Key",
                "status": "failed",
                "data": Value::Null,
            }))));
        };
        Ok(Checkout {
            payload: json!({
                "status": "success",
                "data": {"id": transaction_id, "checkout_url": checkout_url},
            }),
            transaction_id,
            checkout_url,
        })
    }
}

impl Gateway<Verify> for Scripted {
    type Ok = Verification;
    type Err = Traced<Error>;

    async fn execute(&self, _: Verify) -> Result<Self::Ok, Self::Err> {
        let mut state = self.inner.lock().unwrap();
        state.verified += 1;
        let Some(status) = state.status.clone() else {
            return Err(tracerr::new!(Error::Rejected(json!({
                "message": "Transaction not found",
                "status": "failed",
            }))));
        };
        Ok(Verification {
            payload: json!({"status": "success", "data": {"status": status}}),
            status,
        })
    }
}
