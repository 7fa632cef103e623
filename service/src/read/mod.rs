//! Read entities definitions.

pub mod booking;
pub mod listing;
pub mod review;
pub mod user;
