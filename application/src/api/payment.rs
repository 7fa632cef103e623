//! Payment-related REST API definitions.

use axum::{extract::Path, Json};
use serde::Serialize;
use service::{
    command::{self, Command as _},
    domain::payment,
    infra::gateway,
};

use crate::{api::parse_id, define_error, AsError, Context, Error};

/// Result of initiating a payment.
#[derive(Clone, Debug, Serialize)]
pub struct Initiated {
    /// Human-readable outcome.
    pub message: &'static str,

    /// ID of the recorded payment.
    pub payment_id: payment::Id,

    /// URL of the checkout page to redirect the payer to.
    pub payment_link: String,
}

/// Result of verifying a payment.
#[derive(Clone, Debug, Serialize)]
pub struct Verified {
    /// Status of the payment after the verification.
    pub payment_status: String,

    /// Gateway transaction ID of the payment.
    pub transaction_id: String,
}

/// Initiates a payment of a booking on the payment gateway.
///
/// # Errors
///
/// If the request is not authenticated, the booking doesn't exist or the
/// gateway refuses the transaction.
#[tracing::instrument(skip(ctx))]
pub async fn initiate(
    ctx: Context,
    Path(booking_id): Path<String>,
) -> Result<Json<Initiated>, Error> {
    _ = ctx.current_session().await?;

    let output = ctx
        .service()
        .execute(command::InitiatePayment {
            booking_id: parse_id(&booking_id)?,
        })
        .await
        .map_err(AsError::into_error)?;
    Ok(Json(Initiated {
        message: "Payment initiated successfully.",
        payment_id: output.payment.id,
        payment_link: output.checkout_url,
    }))
}

/// Verifies a payment by its gateway transaction ID.
///
/// # Errors
///
/// If the payment doesn't exist or the gateway refuses the verification.
#[tracing::instrument(skip(ctx))]
pub async fn verify(
    ctx: Context,
    Path(transaction_id): Path<String>,
) -> Result<Json<Verified>, Error> {
    let transaction_id = transaction_id
        .parse::<payment::TransactionId>()
        .map_err(|_| Error::from(PaymentError::NotExists))?;

    let payment = ctx
        .service()
        .execute(command::VerifyPayment { transaction_id })
        .await
        .map_err(AsError::into_error)?;
    Ok(Json(Verified {
        payment_status: payment.status.to_string(),
        transaction_id: payment.transaction_id.to_string(),
    }))
}

impl AsError for command::initiate_payment::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::BookingNotExists(_) | Self::UserNotExists(_) => {
                Some(PaymentError::BookingNotExists.into())
            }
            Self::Db(e) => e.try_as_error(),
            Self::Gateway(gateway::Error::Rejected(payload)) => Some(
                Error::from(PaymentError::InitiationFailed)
                    .with_details(payload.clone()),
            ),
            Self::Gateway(e @ gateway::Error::Transport(_)) => {
                e.try_as_error()
            }
        }
    }
}

impl AsError for command::verify_payment::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::Gateway(gateway::Error::Rejected(payload)) => Some(
                Error::from(PaymentError::VerificationFailed)
                    .with_details(payload.clone()),
            ),
            Self::Gateway(e @ gateway::Error::Transport(_)) => {
                e.try_as_error()
            }
            Self::PaymentNotExists(_) => Some(PaymentError::NotExists.into()),
        }
    }
}

define_error! {
    enum PaymentError {
        #[code = "BOOKING_NOT_FOUND"]
        #[status = NOT_FOUND]
        #[message = "Booking not found."]
        BookingNotExists,

        #[code = "PAYMENT_INITIATION_FAILED"]
        #[status = BAD_REQUEST]
        #[message = "Failed to initiate payment"]
        InitiationFailed,

        #[code = "PAYMENT_VERIFICATION_FAILED"]
        #[status = BAD_REQUEST]
        #[message = "Failed to verify payment"]
        VerificationFailed,

        #[code = "PAYMENT_NOT_FOUND"]
        #[status = NOT_FOUND]
        #[message = "Payment not found."]
        NotExists,
    }
}
