//! Domain definitions.

pub mod booking;
pub mod listing;
pub mod notification;
pub mod payment;
pub mod price;
pub mod review;
pub mod user;

pub use self::{
    booking::Booking, listing::Listing, notification::Notification,
    payment::Payment, price::Price, review::Review, user::User,
};
