//! [`Command`] definition.

pub mod authorize_user_session;
pub mod create_booking;
pub mod create_listing;
pub mod create_review;
pub mod create_user;
pub mod create_user_session;
pub mod delete_booking;
pub mod delete_listing;
pub mod delete_user;
pub mod initiate_payment;
pub mod sign_up_user;
pub mod update_booking;
pub mod update_listing;
pub mod update_user;
pub mod verify_payment;

/// [`Command`] of the [`Service`].
///
/// [`Service`]: crate::Service
pub use common::Handler as Command;

pub use self::{
    authorize_user_session::AuthorizeUserSession,
    create_booking::CreateBooking, create_listing::CreateListing,
    create_review::CreateReview, create_user::CreateUser,
    create_user_session::CreateUserSession, delete_booking::DeleteBooking,
    delete_listing::DeleteListing, delete_user::DeleteUser,
    initiate_payment::InitiatePayment, sign_up_user::SignUpUser,
    update_booking::UpdateBooking, update_listing::UpdateListing,
    update_user::UpdateUser, verify_payment::VerifyPayment,
};
