//! [Chapa] [`Gateway`] implementation.
//!
//! [Chapa]: https://developer.chapa.co

use std::time::Duration;

use reqwest::StatusCode;
use secrecy::{ExposeSecret as _, SecretString};
use serde::Serialize;
use serde_json::Value;
use tracerr::Traced;
use tracing as log;

use super::{Checkout, Error, Gateway, Initialize, Verification, Verify};

/// [`Chapa`] client configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// Base URL of the [Chapa] API.
    ///
    /// [Chapa]: https://developer.chapa.co
    pub base_url: String,

    /// Secret key authenticating requests.
    pub secret_key: SecretString,

    /// Timeout of a single request.
    pub timeout: Duration,
}

/// [Chapa] payment [`Gateway`].
///
/// [Chapa]: https://developer.chapa.co
#[derive(Clone, Debug)]
pub struct Chapa {
    /// HTTP client performing requests.
    client: reqwest::Client,

    /// Base URL of the API, without a trailing slash.
    base_url: String,

    /// Secret key authenticating requests.
    secret_key: SecretString,
}

impl Chapa {
    /// Creates a new [`Chapa`] client out of the provided [`Config`].
    ///
    /// # Errors
    ///
    /// If the HTTP client cannot be initialized.
    pub fn new(config: Config) -> Result<Self, Traced<Error>> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(tracerr::from_and_wrap!(=> Error))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            secret_key: config.secret_key,
        })
    }

    /// Reads the JSON body of the provided `response`, returning its `data`
    /// object if the [`Gateway`] reported a success.
    async fn accepted(
        response: reqwest::Response,
    ) -> Result<(Value, Value), Traced<Error>> {
        let status = response.status();
        let payload = response
            .json::<Value>()
            .await
            .map_err(tracerr::from_and_wrap!(=> Error))?;

        if status != StatusCode::OK
            || payload.get("status").and_then(Value::as_str) != Some("success")
        {
            log::warn!("Chapa rejected the request with `{status}`: {payload}");
            return Err(tracerr::new!(Error::Rejected(payload)));
        }

        let data = payload.get("data").cloned().unwrap_or(Value::Null);
        Ok((data, payload))
    }
}

/// Body of a transaction initialization request.
#[derive(Debug, Serialize)]
struct InitializeBody<'a> {
    /// Amount to charge, as a decimal string.
    amount: String,

    /// ISO 4217 code of the currency.
    currency: String,

    /// Payer email.
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<&'a str>,

    /// Payer first name.
    first_name: &'a str,

    /// Payer last name.
    last_name: &'a str,

    /// Merchant reference.
    tx_ref: &'a str,

    /// Redirect URL.
    callback_url: &'a str,
}

impl Gateway<Initialize> for Chapa {
    type Ok = Checkout;
    type Err = Traced<Error>;

    async fn execute(
        &self,
        req: Initialize,
    ) -> Result<Self::Ok, Self::Err> {
        let body = InitializeBody {
            amount: req.amount.amount.to_string(),
            currency: req.amount.currency.to_string(),
            email: req.email.as_ref().map(AsRef::as_ref),
            first_name: req.first_name.as_ref(),
            last_name: req.last_name.as_ref(),
            tx_ref: &req.tx_ref,
            callback_url: &req.callback_url,
        };

        let response = self
            .client
            .post(format!("{}/v1/transaction/initialize", self.base_url))
            .bearer_auth(self.secret_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(tracerr::from_and_wrap!(=> Error))?;
        let (data, payload) =
            Self::accepted(response).await.map_err(tracerr::wrap!())?;

        let Some(checkout_url) =
            data.get("checkout_url").and_then(Value::as_str)
        else {
            return Err(tracerr::new!(Error::Rejected(payload)));
        };
        let transaction_id = match data.get("id") {
            Some(Value::String(id)) => Some(id.clone()),
            Some(Value::Number(id)) => Some(id.to_string()),
            _ => None,
        };

        Ok(Checkout {
            transaction_id,
            checkout_url: checkout_url.to_owned(),
            payload,
        })
    }
}

impl Gateway<Verify> for Chapa {
    type Ok = Verification;
    type Err = Traced<Error>;

    async fn execute(
        &self,
        Verify(transaction_id): Verify,
    ) -> Result<Self::Ok, Self::Err> {
        let response = self
            .client
            .get(format!(
                "{}/v1/transaction/verify/{transaction_id}",
                self.base_url,
            ))
            .bearer_auth(self.secret_key.expose_secret())
            .send()
            .await
            .map_err(tracerr::from_and_wrap!(=> Error))?;
        let (data, payload) =
            Self::accepted(response).await.map_err(tracerr::wrap!())?;

        let Some(status) = data.get("status").and_then(Value::as_str) else {
            return Err(tracerr::new!(Error::Rejected(payload)));
        };

        Ok(Verification {
            status: status.to_owned(),
            payload,
        })
    }
}
