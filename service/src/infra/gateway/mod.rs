//! [`Gateway`] of online payments.

mod chapa;
#[cfg(test)]
pub mod mock;

use common::Money;
use derive_more::{Display, Error as StdError, From};

#[cfg(doc)]
use crate::domain::Payment;
use crate::domain::{payment, user};

pub use self::chapa::{Chapa, Config};

/// Payment gateway operation.
pub use common::Handler as Gateway;

/// Request to start a hosted checkout for a transaction.
#[derive(Clone, Debug)]
pub struct Initialize {
    /// [`Money`] to be charged.
    pub amount: Money,

    /// [`user::Email`] of the payer.
    pub email: Option<user::Email>,

    /// First name of the payer.
    pub first_name: user::Name,

    /// Last name of the payer.
    pub last_name: user::Name,

    /// Merchant-side reference of the transaction.
    pub tx_ref: String,

    /// URL the payer is redirected to once the checkout completes.
    pub callback_url: String,
}

/// Hosted checkout started by the [`Gateway`].
#[derive(Clone, Debug)]
pub struct Checkout {
    /// Gateway-side ID of the transaction, if the [`Gateway`] reported one.
    pub transaction_id: Option<String>,

    /// URL of the hosted checkout page.
    pub checkout_url: String,

    /// Raw payload returned by the [`Gateway`].
    pub payload: serde_json::Value,
}

/// Request to verify the state of a transaction.
#[derive(Clone, Debug)]
pub struct Verify(pub payment::TransactionId);

/// Result of a transaction verification.
#[derive(Clone, Debug)]
pub struct Verification {
    /// Transaction status as reported by the [`Gateway`].
    ///
    /// See [`payment::Status::from_gateway()`] for how it maps onto a
    /// [`Payment`] status.
    pub status: String,

    /// Raw payload returned by the [`Gateway`].
    pub payload: serde_json::Value,
}

/// [`Gateway`] error.
#[derive(Debug, Display, From, StdError)]
pub enum Error {
    /// HTTP request to the [`Gateway`] failed or returned a malformed body.
    #[display("`Gateway` request failed: {_0}")]
    Transport(reqwest::Error),

    /// [`Gateway`] refused the request, its payload is echoed as is.
    #[display("`Gateway` rejected the request: {_0}")]
    #[from(ignore)]
    Rejected(#[error(not(source))] serde_json::Value),
}
