//! [`Booking`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{define_kind, unit, Date, DateTimeOf};
use derive_more::{Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{listing, user, Price};

/// Reservation of a [`Listing`] made by a [`User`].
///
/// [`Listing`]: crate::domain::Listing
/// [`User`]: crate::domain::User
#[derive(Clone, Debug)]
pub struct Booking {
    /// ID of this [`Booking`].
    pub id: Id,

    /// ID of the booked [`Listing`].
    ///
    /// [`Listing`]: crate::domain::Listing
    pub listing_id: listing::Id,

    /// ID of the [`User`] who made this [`Booking`].
    ///
    /// [`User`]: crate::domain::User
    pub user_id: user::Id,

    /// [`Stay`] of this [`Booking`].
    pub stay: Stay,

    /// Number of [`Guests`] of this [`Booking`].
    pub guests: Guests,

    /// Total [`Price`] of this [`Booking`].
    pub price: Price,

    /// [`Status`] of this [`Booking`].
    pub status: Status,

    /// [`DateTime`] when this [`Booking`] was created.
    pub created_at: CreationDateTime,
}

/// ID of a [`Booking`].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    PartialEq,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Check-in and check-out [`Date`]s of a [`Booking`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Stay {
    /// [`Date`] of the check-in.
    check_in: Date,

    /// [`Date`] of the check-out.
    check_out: Date,
}

impl Stay {
    /// Creates a new [`Stay`] if `check_out` is strictly after `check_in`.
    #[must_use]
    pub fn new(check_in: Date, check_out: Date) -> Option<Self> {
        (check_in < check_out).then_some(Self {
            check_in,
            check_out,
        })
    }

    /// Returns the check-in [`Date`].
    #[must_use]
    pub fn check_in(&self) -> Date {
        self.check_in
    }

    /// Returns the check-out [`Date`].
    #[must_use]
    pub fn check_out(&self) -> Date {
        self.check_out
    }

    /// Returns the number of nights of this [`Stay`].
    #[must_use]
    pub fn nights(&self) -> i64 {
        self.check_in.days_until(self.check_out)
    }
}

/// Number of guests of a [`Booking`].
#[derive(Clone, Copy, Debug, Display, Eq, Into, Ord, PartialEq, PartialOrd)]
pub struct Guests(u16);

impl Guests {
    /// Creates a new [`Guests`] number if it's positive.
    #[must_use]
    pub fn new(guests: u16) -> Option<Self> {
        (guests >= 1).then_some(Self(guests))
    }

    /// Returns the number of guests.
    #[must_use]
    pub fn get(self) -> u16 {
        self.0
    }
}

define_kind! {
    #[doc = "Status of a [`Booking`]."]
    enum Status {
        #[doc = "[`Booking`] awaits a payment."]
        Pending = 1,

        #[doc = "[`Booking`] is paid and confirmed."]
        Confirmed = 2,

        #[doc = "[`Booking`] has been cancelled."]
        Cancelled = 3,
    }
}

/// [`DateTime`] when a [`Booking`] was created.
pub type CreationDateTime = DateTimeOf<(Booking, unit::Creation)>;
